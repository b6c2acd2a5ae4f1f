//! MDX export: YAML frontmatter followed by a markdown body.
//!
//! Frontmatter strings are written as JSON strings, which YAML reads as
//! double-quoted scalars, so no value can break the header.

use std::fmt::Write;

use crate::models::{
    Annotation, BlockBody, ContentBlock, Frontmatter, ImageBlock, Mark, TextBlock, VideoBlock,
};
use crate::render::sorted_blocks;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MdxExportOptions {
    /// Article metadata. When absent the first frontmatter block is used.
    pub frontmatter: Option<Frontmatter>,
    pub gallery_id: Option<String>,
    pub carousel_id: Option<String>,
}

fn quoted(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("\"{}\"", value.replace('"', "\\\"")))
}

/// Escape characters that markdown or JSX would interpret.
fn escape_markdown(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' | '*' | '_' | '`' | '[' | ']' | '{' | '}' | '#' | '|' => {
                out.push('\\');
                out.push(c);
            }
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

fn escape_url(url: &str) -> String {
    url.trim().replace(' ', "%20").replace(')', "%29").replace('(', "%28")
}

/// JSX attribute value: a plain string literal when possible, otherwise a
/// JS expression, since JSX string attributes have no escapes.
fn jsx_attr(value: &str) -> String {
    if value.contains(['"', '\\', '{', '}', '\n']) {
        format!("{{{}}}", quoted(value))
    } else {
        format!("\"{value}\"")
    }
}

fn frontmatter_yaml(frontmatter: Option<&Frontmatter>, options: &MdxExportOptions) -> String {
    let mut yaml = String::from("---\n");
    if let Some(frontmatter) = frontmatter {
        let _ = writeln!(yaml, "title: {}", quoted(&frontmatter.title));
        let optional = [
            ("subtitle", &frontmatter.subtitle),
            ("author", &frontmatter.author),
            ("date", &frontmatter.date),
            ("status", &frontmatter.status),
            ("coverImage", &frontmatter.cover_image),
            ("coverImageAlt", &frontmatter.cover_image_alt),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                let _ = writeln!(yaml, "{key}: {}", quoted(value));
            }
        }
        if !frontmatter.tags.is_empty() {
            let tags: Vec<String> = frontmatter.tags.iter().map(|tag| quoted(tag)).collect();
            let _ = writeln!(yaml, "tags: [{}]", tags.join(", "));
        }
        if let Some(cta) = &frontmatter.call_to_action {
            let _ = writeln!(
                yaml,
                "callToAction:\n  text: {}\n  url: {}",
                quoted(&cta.text),
                quoted(&cta.url)
            );
        }
    }
    if let Some(gallery_id) = &options.gallery_id {
        let _ = writeln!(yaml, "galleryId: {}", quoted(gallery_id));
    }
    if let Some(carousel_id) = &options.carousel_id {
        let _ = writeln!(yaml, "carouselId: {}", quoted(carousel_id));
    }
    yaml.push_str("---\n");
    yaml
}

/// Inline markdown for text content with its marks applied.
fn inline_markdown(content: &str, annotations: &[Annotation]) -> String {
    let mut marks: Vec<&Annotation> = annotations.iter().filter(|a| a.fits(content)).collect();
    marks.sort_by_key(|a| (a.start, a.end));

    let mut out = String::with_capacity(content.len());
    let mut cursor = 0;
    for annotation in marks {
        if annotation.start < cursor {
            continue;
        }
        out.push_str(&escape_markdown(&content[cursor..annotation.start]));
        let inner = escape_markdown(&content[annotation.start..annotation.end]);
        match &annotation.mark {
            Mark::Bold => {
                let _ = write!(out, "**{inner}**");
            }
            Mark::Italic => {
                let _ = write!(out, "*{inner}*");
            }
            Mark::Link { url } => {
                let _ = write!(out, "[{inner}]({})", escape_url(url));
            }
        }
        cursor = annotation.end;
    }
    out.push_str(&escape_markdown(&content[cursor..]));
    out
}

fn text_markdown(text: &TextBlock) -> Option<String> {
    let content = text.content.trim();
    if content.is_empty() {
        return None;
    }
    // Trimming moves offsets, so marks only apply to untrimmed content.
    let inline = if content.len() == text.content.len() {
        inline_markdown(content, &text.formatting.annotations)
    } else {
        escape_markdown(content)
    };
    let inline = inline.replace('\n', "  \n");
    Some(match text.element.level() {
        Some(level) => format!("{} {inline}", "#".repeat(usize::from(level))),
        None => inline,
    })
}

fn image_markdown(image: &ImageBlock) -> Option<String> {
    if !image.has_url() {
        return None;
    }
    let title = image
        .caption
        .as_deref()
        .filter(|caption| !caption.is_empty())
        .map(|caption| format!(" {}", quoted(caption)))
        .unwrap_or_default();
    let img = format!(
        "![{}]({}{title})",
        escape_markdown(&image.alt),
        escape_url(&image.url)
    );
    Some(match image.link.as_deref().filter(|link| !link.is_empty()) {
        Some(link) => format!("[{img}]({})", escape_url(link)),
        None => img,
    })
}

fn video_markdown(video: &VideoBlock) -> Option<String> {
    match video.embed() {
        Some((platform, embed_id)) => {
            let mut component = format!(
                "<VideoEmbed platform={} id={} aspectRatio={}",
                jsx_attr(platform.name()),
                jsx_attr(embed_id),
                jsx_attr(video.aspect_ratio.label()),
            );
            if let Some(title) = video.title.as_deref() {
                let _ = write!(component, " title={}", jsx_attr(title));
            }
            component.push_str(" />");
            Some(component)
        }
        None if !video.url.trim().is_empty() => {
            Some(format!("[{}]({})", escape_markdown(video.url.trim()), escape_url(&video.url)))
        }
        None => None,
    }
}

fn block_markdown(block: &ContentBlock) -> Option<String> {
    match &block.body {
        BlockBody::Text(text) => text_markdown(text),
        BlockBody::Image(image) => image_markdown(image),
        BlockBody::Video(video) => video_markdown(video),
        BlockBody::Divider(_) => Some("---".to_string()),
        BlockBody::Button(button) => {
            let url = if button.url.trim().is_empty() {
                "#"
            } else {
                button.url.trim()
            };
            Some(format!("[{}]({})", escape_markdown(&button.text), escape_url(url)))
        }
        BlockBody::Spacer(spacer) => Some(format!(
            "<div style={{{{ height: \"{}px\" }}}} aria-hidden=\"true\" />",
            spacer.height
        )),
        BlockBody::List(list) => {
            let items: Vec<String> = list
                .items
                .iter()
                .map(|item| item.trim())
                .filter(|item| !item.is_empty())
                .map(|item| format!("- {}", escape_markdown(item)))
                .collect();
            (!items.is_empty()).then(|| items.join("\n"))
        }
        BlockBody::Html(html) => {
            let content = html.content.trim();
            (!content.is_empty()).then(|| content.to_string())
        }
        // Carried in the YAML header.
        BlockBody::Frontmatter(_) => None,
        BlockBody::Unsupported { type_name, .. } => {
            Some(format!("{{/* unsupported block type: {} */}}", type_name.replace("*/", "")))
        }
    }
}

/// Export `blocks` as an MDX document.
pub fn export_mdx(blocks: &[ContentBlock], options: &MdxExportOptions) -> String {
    let sorted = sorted_blocks(blocks);
    let frontmatter = options.frontmatter.as_ref().or_else(|| {
        sorted.iter().copied().find_map(|block| match &block.body {
            BlockBody::Frontmatter(frontmatter) => Some(frontmatter),
            _ => None,
        })
    });

    let mut mdx = frontmatter_yaml(frontmatter, options);
    let body: Vec<String> = sorted.iter().filter_map(|block| block_markdown(block)).collect();
    if !body.is_empty() {
        mdx.push('\n');
        mdx.push_str(&body.join("\n\n"));
        mdx.push('\n');
    }
    mdx
}
