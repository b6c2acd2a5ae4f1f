//! Email renderer.
//!
//! A leading run of full-width images becomes the email header and is laid
//! out with the fluid-hybrid pattern. The rest is rendered with email-safe
//! block markup inside a skeleton chosen by the target platform. The
//! platform never changes the markup of a block.

use crate::models::{BlockBody, ContentBlock};

use super::markup::{BlockMarkup, Flavor, attr, fluid_hybrid_image};
use super::{EmailContainerConfig, EmailPlatform, RenderContext, Renderer};

#[derive(Debug, Clone, Copy, Default)]
pub struct EmailRenderer;

fn is_header_image(block: &ContentBlock) -> bool {
    matches!(&block.body, BlockBody::Image(image) if image.email.is_full_width)
}

/// Split sorted blocks into `(header, content)`.
///
/// The header is the longest prefix of full-width image blocks. Scanning
/// stops at the first block that does not qualify, so a full-width image
/// further down stays in the content.
pub fn split_email_header<'a>(
    blocks: &[&'a ContentBlock],
) -> (Vec<&'a ContentBlock>, Vec<&'a ContentBlock>) {
    let split = blocks
        .iter()
        .position(|block| !is_header_image(block))
        .unwrap_or(blocks.len());
    (blocks[..split].to_vec(), blocks[split..].to_vec())
}

fn header_markup(ctx: &RenderContext<'_>, header: &[&ContentBlock]) -> String {
    header
        .iter()
        .filter_map(|block| match &block.body {
            BlockBody::Image(image) => Some(fluid_hybrid_image(
                block,
                image,
                &ctx.styles,
                ctx.email_container.max_width,
            )),
            _ => None,
        })
        .collect()
}

fn content_markup(ctx: &RenderContext<'_>, content: &[&ContentBlock]) -> String {
    let markup = BlockMarkup::new(ctx.styles, Flavor::Email);
    content
        .iter()
        // Frontmatter is article metadata and has no place in an email body.
        .filter(|block| !matches!(block.body, BlockBody::Frontmatter(_)))
        .map(|block| markup.render(block))
        .collect()
}

fn div_skeleton(config: &EmailContainerConfig, header: &str, content: &str) -> String {
    let header = if header.is_empty() {
        String::new()
    } else {
        format!(
            "<div class=\"cs-email-header-region\" style=\"max-width: {}px; margin: 0 auto\">{header}</div>",
            config.max_width
        )
    };
    format!(
        "<div class=\"cs-email cs-email--{}\" style=\"background-color: {}; padding: {}px 0; font-family: {}\">{header}<div class=\"cs-email-content\" style=\"max-width: {}px; margin: 0 auto; background-color: {}; padding: {}px\">{content}</div></div>",
        config.platform,
        attr(&config.background_color),
        config.padding,
        attr(&config.font_family),
        config.max_width,
        attr(&config.content_background_color),
        config.padding,
    )
}

fn table_skeleton(config: &EmailContainerConfig, header: &str, content: &str) -> String {
    let (header_edit, body_edit) = match config.platform {
        EmailPlatform::Mailchimp => (" mc:edit=\"header\"", " mc:edit=\"body\""),
        EmailPlatform::SendGrid | EmailPlatform::Generic => ("", ""),
    };
    let header_row = if header.is_empty() {
        String::new()
    } else {
        format!("<tr><td{header_edit}>{header}</td></tr>")
    };
    let width = config.max_width;
    let background = attr(&config.background_color);
    let content_background = attr(&config.content_background_color);
    format!(
        "<table class=\"cs-email cs-email--{}\" role=\"presentation\" width=\"100%\" cellpadding=\"0\" cellspacing=\"0\" border=\"0\" bgcolor=\"{background}\" style=\"background-color: {background}; font-family: {}\"><tr><td align=\"center\" style=\"padding: {}px 0\">\
<!--[if mso]><table role=\"presentation\" width=\"{width}\" align=\"center\" cellpadding=\"0\" cellspacing=\"0\" border=\"0\"><tr><td><![endif]-->\
<table role=\"presentation\" width=\"100%\" cellpadding=\"0\" cellspacing=\"0\" border=\"0\" style=\"max-width: {width}px; margin: 0 auto\">{header_row}\
<tr><td bgcolor=\"{content_background}\" style=\"background-color: {content_background}; padding: {}px\"{body_edit}>{content}</td></tr></table>\
<!--[if mso]></td></tr></table><![endif]--></td></tr></table>",
        config.platform,
        attr(&config.font_family),
        config.padding,
        config.padding,
    )
}

impl Renderer for EmailRenderer {
    fn render(&self, ctx: &RenderContext<'_>, blocks: &[&ContentBlock]) -> String {
        let (header, content) = split_email_header(blocks);
        log::debug!(
            "Email layout: {} header image(s), {} content block(s), platform {}",
            header.len(),
            content.len(),
            ctx.email_container.platform
        );
        let header = header_markup(ctx, &header);
        let content = content_markup(ctx, &content);
        match ctx.email_container.platform {
            EmailPlatform::SendGrid => div_skeleton(ctx.email_container, &header, &content),
            EmailPlatform::Mailchimp | EmailPlatform::Generic => {
                table_skeleton(ctx.email_container, &header, &content)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EmailImageSettings, ImageBlock};
    use crate::render::{RenderMode, RenderRequest, render, sorted_blocks};
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::sync::Arc;

    fn full_width(id: &str) -> ContentBlock {
        ContentBlock::new(BlockBody::Image(ImageBlock {
            url: format!("https://cdn.test/{id}.jpg"),
            alt: id.to_string(),
            email: EmailImageSettings {
                is_full_width: true,
                ..EmailImageSettings::default()
            },
            ..ImageBlock::default()
        }))
        .with_id(id)
    }

    fn ids(blocks: &[&ContentBlock]) -> Vec<String> {
        blocks.iter().map(|block| block.id.to_string()).collect()
    }

    #[test]
    fn header_is_only_the_leading_run() {
        let blocks = vec![
            full_width("hero"),
            full_width("hero2"),
            ContentBlock::text("Intro").with_id("intro"),
            full_width("late"),
        ];
        let sorted = sorted_blocks(&blocks);

        let (header, content) = split_email_header(&sorted);

        assert_eq!(ids(&header), vec!["hero", "hero2"]);
        assert_eq!(ids(&content), vec!["intro", "late"]);
    }

    #[test]
    fn no_header_when_first_block_does_not_qualify() {
        let blocks = vec![ContentBlock::image("https://cdn.test/a.jpg", "a"), full_width("b")];
        let sorted = sorted_blocks(&blocks);
        let (header, content) = split_email_header(&sorted);
        assert!(header.is_empty());
        assert_eq!(content.len(), 2);
    }

    #[test]
    fn header_images_use_fluid_hybrid_markup() {
        let blocks = vec![full_width("hero"), ContentBlock::text("Body")];
        let html = render(&RenderRequest::new(RenderMode::Email, Arc::new(blocks))).html;
        assert!(html.contains("<div class=\"cs-email-header\""));
        assert_eq!(html.matches("cs-email-header\"").count(), 1);
    }

    fn render_for(platform: EmailPlatform, blocks: &[ContentBlock]) -> String {
        let request = RenderRequest::new(RenderMode::Email, Arc::new(blocks.to_vec()))
            .with_email_container(EmailContainerConfig::for_platform(platform));
        render(&request).html
    }

    #[rstest]
    #[case(EmailPlatform::SendGrid, "<div class=\"cs-email cs-email--sendgrid\"", false)]
    #[case(EmailPlatform::Mailchimp, "<table class=\"cs-email cs-email--mailchimp\"", true)]
    #[case(EmailPlatform::Generic, "<table class=\"cs-email cs-email--generic\"", false)]
    fn platform_selects_skeleton(
        #[case] platform: EmailPlatform,
        #[case] prefix: &str,
        #[case] editable: bool,
    ) {
        let html = render_for(platform, &[ContentBlock::text("Hello").with_id("p")]);
        assert!(html.starts_with(prefix), "{html}");
        assert_eq!(html.contains("mc:edit"), editable);
    }

    #[test]
    fn platform_never_changes_block_markup() {
        let blocks = vec![
            full_width("hero"),
            ContentBlock::heading(2, "News").with_id("h"),
            ContentBlock::text("Body copy").with_id("p"),
        ];
        let ctx_config = EmailContainerConfig::default();
        let resolver = crate::render::StyleResolver::default();
        let ctx = RenderContext {
            composition_name: None,
            frontmatter: None,
            styles: resolver,
            email_container: &ctx_config,
        };
        let sorted = sorted_blocks(&blocks);
        let (_, content) = split_email_header(&sorted);
        let body = content_markup(&ctx, &content);

        for platform in [
            EmailPlatform::SendGrid,
            EmailPlatform::Mailchimp,
            EmailPlatform::Generic,
        ] {
            assert!(render_for(platform, &blocks).contains(&body));
        }
    }

    #[test]
    fn frontmatter_blocks_are_left_out() {
        let blocks = vec![
            ContentBlock::new(BlockBody::Frontmatter(crate::models::Frontmatter {
                title: "Meta".into(),
                ..Default::default()
            })),
            ContentBlock::text("Body"),
        ];
        let html = render_for(EmailPlatform::Generic, &blocks);
        assert!(!html.contains("Meta"));
        assert!(html.contains(">Body</p>"));
    }
}
