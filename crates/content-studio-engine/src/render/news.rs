//! News article preview: header from the article metadata, the body, and a
//! call-to-action footer.

use std::fmt::Write;

use crate::models::{BlockBody, ContentBlock, Frontmatter};

use super::markup::{BlockMarkup, Flavor, attr, text};
use super::{RenderContext, Renderer};

#[derive(Debug, Clone, Copy, Default)]
pub struct NewsArticleRenderer;

/// Metadata for the article header. Composition-level frontmatter wins over
/// the first frontmatter block.
fn article_frontmatter<'a>(
    ctx: &RenderContext<'a>,
    blocks: &[&'a ContentBlock],
) -> Option<&'a Frontmatter> {
    ctx.frontmatter
        .filter(|frontmatter| !frontmatter.is_empty())
        .or_else(|| {
            blocks.iter().copied().find_map(|block| match &block.body {
                BlockBody::Frontmatter(frontmatter) => Some(frontmatter),
                _ => None,
            })
        })
}

fn header(frontmatter: Option<&Frontmatter>, fallback_title: Option<&str>) -> String {
    let title = frontmatter
        .map(|f| f.title.trim())
        .filter(|title| !title.is_empty())
        .or(fallback_title)
        .unwrap_or("Untitled article");

    let mut html = String::from("<header class=\"cs-news-header\" style=\"margin: 0 0 32px\">");
    if let Some(tags) = frontmatter.map(|f| &f.tags).filter(|tags| !tags.is_empty()) {
        html.push_str("<ul class=\"cs-news-tags\" style=\"list-style: none; padding: 0; margin: 0 0 12px\">");
        for tag in tags {
            let _ = write!(
                html,
                "<li style=\"display: inline-block; margin-right: 8px; font-size: 12px; text-transform: uppercase; color: #2563eb\">{}</li>",
                text(tag)
            );
        }
        html.push_str("</ul>");
    }
    let _ = write!(
        html,
        "<h1 style=\"font-size: 40px; line-height: 1.15; margin: 0 0 12px\">{}</h1>",
        text(title)
    );
    let Some(frontmatter) = frontmatter else {
        html.push_str("</header>");
        return html;
    };
    if let Some(subtitle) = frontmatter.subtitle.as_deref() {
        let _ = write!(
            html,
            "<p class=\"cs-news-subtitle\" style=\"font-size: 20px; color: #4b5563; margin: 0 0 16px\">{}</p>",
            text(subtitle)
        );
    }
    let byline: Vec<String> = [
        frontmatter.author.as_deref().map(|author| format!("By {}", text(author))),
        frontmatter
            .date
            .as_deref()
            .map(|date| format!("<time datetime=\"{}\">{}</time>", attr(date), text(date))),
    ]
    .into_iter()
    .flatten()
    .collect();
    if !byline.is_empty() {
        let _ = write!(
            html,
            "<p class=\"cs-news-byline\" style=\"font-size: 14px; color: #6b7280; margin: 0 0 24px\">{}</p>",
            byline.join(" &middot; ")
        );
    }
    if let Some(cover) = frontmatter.cover_image.as_deref().filter(|url| !url.trim().is_empty()) {
        let alt = frontmatter.cover_image_alt.as_deref().unwrap_or(title);
        let _ = write!(
            html,
            "<img class=\"cs-news-cover\" src=\"{}\" alt=\"{}\" style=\"width: 100%; height: auto; border-radius: 8px\">",
            attr(cover),
            attr(alt)
        );
    }
    html.push_str("</header>");
    html
}

fn footer(frontmatter: Option<&Frontmatter>) -> String {
    let Some(cta) = frontmatter.and_then(|f| f.call_to_action.as_ref()) else {
        return String::new();
    };
    if cta.text.trim().is_empty() || cta.url.trim().is_empty() {
        return String::new();
    }
    format!(
        "<footer class=\"cs-news-cta\" style=\"margin: 40px 0 0; padding: 24px; background-color: #f3f4f6; border-radius: 8px; text-align: center\"><a href=\"{}\" style=\"display: inline-block; padding: 12px 24px; background-color: #2563eb; color: #ffffff; text-decoration: none; border-radius: 6px; font-weight: bold\">{}</a></footer>",
        attr(cta.url.trim()),
        text(cta.text.trim())
    )
}

impl Renderer for NewsArticleRenderer {
    fn render(&self, ctx: &RenderContext<'_>, blocks: &[&ContentBlock]) -> String {
        let frontmatter = article_frontmatter(ctx, blocks);
        let markup = BlockMarkup::new(ctx.styles, Flavor::Web);

        let mut html = String::from(
            "<article class=\"cs-news\" style=\"max-width: 680px; margin: 0 auto; font-family: Georgia, 'Times New Roman', serif; color: #111827\">",
        );
        html.push_str(&header(frontmatter, ctx.composition_name));
        html.push_str("<div class=\"cs-news-body\">");
        for block in blocks {
            // Metadata is shown in the header only.
            if matches!(block.body, BlockBody::Frontmatter(_)) {
                continue;
            }
            html.push_str(&markup.render(block));
        }
        html.push_str("</div>");
        html.push_str(&footer(frontmatter));
        html.push_str("</article>");
        html
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CallToAction;
    use crate::render::{RenderMode, RenderRequest, render};
    use std::sync::Arc;

    fn article() -> Frontmatter {
        Frontmatter {
            title: "Spring lineup".into(),
            subtitle: Some("Five cars to watch".into()),
            author: Some("Sam Lee".into()),
            date: Some("2026-03-01".into()),
            tags: vec!["cars".into()],
            call_to_action: Some(CallToAction {
                text: "Book a test drive".into(),
                url: "https://example.com/book".into(),
            }),
            ..Frontmatter::default()
        }
    }

    #[test]
    fn header_from_frontmatter_block() {
        let blocks = vec![
            ContentBlock::new(BlockBody::Frontmatter(article())).with_id("fm"),
            ContentBlock::text("Body copy").with_id("p"),
        ];
        let html = render(&RenderRequest::new(RenderMode::NewsArticle, Arc::new(blocks))).html;

        assert!(html.contains(">Spring lineup</h1>"));
        assert!(html.contains("By Sam Lee &middot; <time datetime=\"2026-03-01\">"));
        assert!(html.contains(">Book a test drive</a></footer>"));
        assert!(!html.contains("cs-frontmatter"));
    }

    #[test]
    fn request_frontmatter_wins_over_block() {
        let mut block_meta = article();
        block_meta.title = "From block".into();
        let blocks = vec![ContentBlock::new(BlockBody::Frontmatter(block_meta))];
        let request = RenderRequest::new(RenderMode::NewsArticle, Arc::new(blocks))
            .with_frontmatter(Some(article()));

        let html = render(&request).html;

        assert!(html.contains(">Spring lineup</h1>"));
        assert!(!html.contains("From block"));
    }

    #[test]
    fn title_falls_back_to_composition_name() {
        let request = RenderRequest::new(
            RenderMode::NewsArticle,
            Arc::new(vec![ContentBlock::text("Body")]),
        )
        .with_name("Weekly <digest>");

        let html = render(&request).html;

        assert!(html.contains(">Weekly &lt;digest&gt;</h1>"));
        assert!(!html.contains("cs-news-cta"));
    }
}
