//! Per-block markup shared by all renderers.
//!
//! Web markup may use CSS layout and iframes; email markup sticks to tables,
//! attributes and inline styles that survive common mail clients.

use std::fmt::Write;

use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::models::{
    Annotation, BlockBody, ButtonBlock, ContentBlock, DividerBlock, Frontmatter, HtmlBlock,
    ImageBlock, ImageCrop, ListBlock, Mark, SpacerBlock, TextBlock, TextElement, VideoBlock,
    VideoPlatform,
};

use super::style::{InlineStyle, StyleResolver};

/// Target family of the generated markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    Web,
    Email,
}

pub(crate) fn style_attr(style: &InlineStyle) -> String {
    if style.is_empty() {
        String::new()
    } else {
        format!(" style=\"{}\"", encode_double_quoted_attribute(&style.to_css()))
    }
}

pub(crate) fn attr(value: &str) -> String {
    encode_double_quoted_attribute(value).into_owned()
}

pub(crate) fn text(value: &str) -> String {
    encode_text(value).into_owned()
}

/// Placeholder used for blocks a renderer cannot show.
pub fn placeholder(modifier: &str, message: &str) -> String {
    format!(
        "<div class=\"cs-placeholder cs-placeholder--{}\" role=\"note\">{}</div>",
        attr(modifier),
        text(message)
    )
}

/// Neutral rendering of a block whose type this build does not know.
pub fn unsupported_placeholder(type_name: &str) -> String {
    format!(
        "<div class=\"cs-placeholder cs-placeholder--unsupported\" data-block-type=\"{}\" role=\"note\">Unsupported block type: {}</div>",
        attr(type_name),
        text(type_name)
    )
}

/// Escaped HTML for text content with inline marks applied. Overlapping or
/// out-of-range marks are skipped; newlines become `<br>`.
pub fn inline_html(content: &str, annotations: &[Annotation]) -> String {
    let mut marks: Vec<&Annotation> = annotations.iter().filter(|a| a.fits(content)).collect();
    marks.sort_by_key(|a| (a.start, a.end));

    let mut out = String::with_capacity(content.len());
    let mut cursor = 0;
    for annotation in marks {
        if annotation.start < cursor {
            continue;
        }
        out.push_str(&text(&content[cursor..annotation.start]));
        let inner = text(&content[annotation.start..annotation.end]);
        match &annotation.mark {
            Mark::Bold => {
                let _ = write!(out, "<strong>{inner}</strong>");
            }
            Mark::Italic => {
                let _ = write!(out, "<em>{inner}</em>");
            }
            Mark::Link { url } => {
                let _ = write!(out, "<a href=\"{}\">{inner}</a>", attr(url));
            }
        }
        cursor = annotation.end;
    }
    out.push_str(&text(&content[cursor..]));
    out.replace('\n', "<br>")
}

fn text_defaults(element: TextElement, flavor: Flavor) -> &'static [(&'static str, &'static str)] {
    match (element, flavor) {
        (TextElement::P, Flavor::Web) => &[("margin", "0 0 16px"), ("line-height", "1.6")],
        (TextElement::P, Flavor::Email) => &[
            ("margin", "0 0 16px"),
            ("line-height", "1.5"),
            ("font-size", "16px"),
        ],
        (TextElement::H1, _) => &[("margin", "0 0 16px"), ("font-size", "32px"), ("line-height", "1.2")],
        (TextElement::H2, _) => &[("margin", "0 0 14px"), ("font-size", "26px"), ("line-height", "1.25")],
        (TextElement::H3, _) => &[("margin", "0 0 12px"), ("font-size", "22px"), ("line-height", "1.3")],
        (TextElement::H4, _) => &[("margin", "0 0 10px"), ("font-size", "18px"), ("line-height", "1.35")],
        (TextElement::H5, _) => &[("margin", "0 0 8px"), ("font-size", "16px"), ("line-height", "1.4")],
        (TextElement::H6, _) => &[("margin", "0 0 8px"), ("font-size", "14px"), ("line-height", "1.4")],
    }
}

/// Generates markup for single blocks.
#[derive(Debug, Clone, Copy)]
pub struct BlockMarkup<'a> {
    styles: StyleResolver<'a>,
    flavor: Flavor,
}

impl<'a> BlockMarkup<'a> {
    pub fn new(styles: StyleResolver<'a>, flavor: Flavor) -> Self {
        Self { styles, flavor }
    }

    pub fn flavor(&self) -> Flavor {
        self.flavor
    }

    pub fn styles(&self) -> &StyleResolver<'a> {
        &self.styles
    }

    pub fn render(&self, block: &ContentBlock) -> String {
        match &block.body {
            BlockBody::Text(text) => self.text(block, text),
            BlockBody::Image(image) => self.image(block, image),
            BlockBody::Video(video) => self.video(block, video),
            BlockBody::Divider(divider) => self.divider(block, divider),
            BlockBody::Button(button) => self.button(block, button),
            BlockBody::Spacer(spacer) => self.spacer(block, spacer),
            BlockBody::List(list) => self.list(block, list),
            BlockBody::Html(html) => self.html(html),
            BlockBody::Frontmatter(frontmatter) => self.frontmatter_card(block, frontmatter),
            BlockBody::Unsupported { type_name, .. } => unsupported_placeholder(type_name),
        }
    }

    fn text(&self, block: &ContentBlock, body: &TextBlock) -> String {
        let tag = body.element.tag();
        let style = self
            .styles
            .resolve(block, text_defaults(body.element, self.flavor));
        format!(
            "<{tag}{}>{}</{tag}>",
            style_attr(&style),
            inline_html(&body.content, &body.formatting.annotations)
        )
    }

    fn image(&self, block: &ContentBlock, image: &ImageBlock) -> String {
        if !image.has_url() {
            return placeholder("image", "No image selected");
        }
        match self.flavor {
            Flavor::Web => self.web_image(block, image),
            Flavor::Email => self.email_image(block, image),
        }
    }

    fn web_image(&self, block: &ContentBlock, image: &ImageBlock) -> String {
        let figure_style = self.styles.resolve(
            block,
            &[("margin", "0 0 16px"), ("text-align", image.alignment.as_css())],
        );
        let mut img_style = InlineStyle::from_pairs(&[("max-width", "100%"), ("height", "auto")]);
        if let Some(width) = &image.width {
            img_style.set("width", width.clone());
        }
        let mut img = format!(
            "<img src=\"{}\" alt=\"{}\"{}>",
            attr(&image.url),
            attr(&image.alt),
            style_attr(&img_style)
        );
        if let Some(link) = image.link.as_deref().filter(|link| !link.is_empty()) {
            img = format!("<a href=\"{}\">{img}</a>", attr(link));
        }
        let caption = image
            .caption
            .as_deref()
            .filter(|caption| !caption.is_empty())
            .map(|caption| {
                format!(
                    "<figcaption style=\"font-size: 14px; color: #6b7280; margin-top: 8px\">{}</figcaption>",
                    text(caption)
                )
            })
            .unwrap_or_default();
        format!("<figure{}>{img}{caption}</figure>", style_attr(&figure_style))
    }

    fn email_image(&self, block: &ContentBlock, image: &ImageBlock) -> String {
        let settings = &image.email;
        let width = image
            .width
            .as_deref()
            .and_then(|w| w.trim_end_matches("px").parse::<u32>().ok())
            .unwrap_or(settings.max_width)
            .min(settings.max_width);
        let mut img_style = InlineStyle::from_pairs(&[
            ("display", "block"),
            ("border", "0"),
            ("height", "auto"),
            ("width", "100%"),
        ]);
        img_style.set("max-width", format!("{width}px"));
        apply_crop(&mut img_style, image);
        let mut img = format!(
            "<img src=\"{}\" alt=\"{}\" width=\"{width}\"{}>",
            attr(&image.url),
            attr(&image.alt),
            style_attr(&img_style)
        );
        if let Some(link) = image.link.as_deref().filter(|link| !link.is_empty()) {
            img = format!("<a href=\"{}\" target=\"_blank\">{img}</a>", attr(link));
        }
        let cell_style = self.styles.resolve(block, &[("padding", "0 0 16px")]);
        let caption = image
            .caption
            .as_deref()
            .filter(|caption| !caption.is_empty())
            .map(|caption| {
                format!(
                    "<tr><td align=\"{}\" style=\"font-size: 13px; color: #6b7280; padding: 0 0 16px\">{}</td></tr>",
                    image.alignment.as_css(),
                    text(caption)
                )
            })
            .unwrap_or_default();
        format!(
            "<table role=\"presentation\" width=\"100%\" cellpadding=\"0\" cellspacing=\"0\" border=\"0\"><tr><td align=\"{}\"{}>{img}</td></tr>{caption}</table>",
            image.alignment.as_css(),
            style_attr(&cell_style)
        )
    }

    fn video(&self, block: &ContentBlock, video: &VideoBlock) -> String {
        let Some((platform, embed_id)) = video.embed() else {
            let message = if video.url.trim().is_empty() {
                "No video selected".to_string()
            } else {
                format!("Video unavailable: {}", video.url.trim())
            };
            return placeholder("video", &message);
        };
        let title = video.title.as_deref().unwrap_or("Embedded video");
        match self.flavor {
            Flavor::Web => {
                let wrapper = self.styles.resolve(
                    block,
                    &[
                        ("position", "relative"),
                        ("padding-bottom", video.aspect_ratio.padding_percent()),
                        ("height", "0"),
                        ("overflow", "hidden"),
                        ("margin", "0 0 16px"),
                    ],
                );
                format!(
                    "<div{}><iframe src=\"{}\" title=\"{}\" style=\"position: absolute; top: 0; left: 0; width: 100%; height: 100%; border: 0\" allow=\"accelerometer; autoplay; encrypted-media; gyroscope; picture-in-picture\" allowfullscreen></iframe></div>",
                    style_attr(&wrapper),
                    attr(&platform.embed_url(embed_id)),
                    attr(title)
                )
            }
            Flavor::Email => {
                // Mail clients do not run iframes; link out instead.
                let watch_url = platform.watch_url(embed_id);
                let inner = match platform {
                    VideoPlatform::Youtube => format!(
                        "<img src=\"https://img.youtube.com/vi/{}/hqdefault.jpg\" alt=\"{}\" width=\"600\" style=\"display: block; width: 100%; max-width: 600px; height: auto; border: 0\">",
                        attr(embed_id),
                        attr(title)
                    ),
                    VideoPlatform::Vimeo => format!("&#9654; {}", text(title)),
                };
                let cell = self.styles.resolve(block, &[("padding", "0 0 16px")]);
                format!(
                    "<table role=\"presentation\" width=\"100%\" cellpadding=\"0\" cellspacing=\"0\" border=\"0\"><tr><td align=\"{}\"{}><a href=\"{}\" target=\"_blank\">{inner}</a></td></tr></table>",
                    video.alignment.as_css(),
                    style_attr(&cell),
                    attr(&watch_url)
                )
            }
        }
    }

    fn divider(&self, block: &ContentBlock, divider: &DividerBlock) -> String {
        let border = format!(
            "{}px {} {}",
            divider.thickness,
            divider.line_style.as_css(),
            divider.color
        );
        let margin = format!("{}px 0", divider.margin);
        match self.flavor {
            Flavor::Web => {
                let style = self.styles.resolve(
                    block,
                    &[("border", "none"), ("border-top", border.as_str()), ("margin", margin.as_str())],
                );
                format!("<hr{}>", style_attr(&style))
            }
            Flavor::Email => {
                let style = self.styles.resolve(
                    block,
                    &[
                        ("border-top", border.as_str()),
                        ("font-size", "0"),
                        ("line-height", "0"),
                    ],
                );
                format!(
                    "<table role=\"presentation\" width=\"100%\" cellpadding=\"0\" cellspacing=\"0\" border=\"0\" style=\"margin: {margin}\"><tr><td{}>&nbsp;</td></tr></table>",
                    style_attr(&style)
                )
            }
        }
    }

    fn button(&self, block: &ContentBlock, button: &ButtonBlock) -> String {
        let href = if button.url.trim().is_empty() {
            "#"
        } else {
            button.url.trim()
        };
        let link_style = self.styles.resolve(
            block,
            &[
                ("display", "inline-block"),
                ("text-decoration", "none"),
                ("font-weight", "bold"),
            ],
        );
        let link = format!(
            "<a href=\"{}\"{}>{}</a>",
            attr(href),
            style_attr(&link_style),
            text(&button.text)
        );
        match self.flavor {
            Flavor::Web => format!(
                "<div style=\"text-align: {}; margin: 0 0 16px\">{link}</div>",
                button.alignment.as_css()
            ),
            Flavor::Email => {
                let background = link_style
                    .get("background-color")
                    .unwrap_or(button.background_color.as_str())
                    .to_string();
                format!(
                    "<table role=\"presentation\" width=\"100%\" cellpadding=\"0\" cellspacing=\"0\" border=\"0\"><tr><td align=\"{}\" style=\"padding: 0 0 16px\"><table role=\"presentation\" cellpadding=\"0\" cellspacing=\"0\" border=\"0\"><tr><td bgcolor=\"{}\" style=\"border-radius: {}px\">{link}</td></tr></table></td></tr></table>",
                    button.alignment.as_css(),
                    attr(&background),
                    button.border_radius
                )
            }
        }
    }

    fn spacer(&self, block: &ContentBlock, spacer: &SpacerBlock) -> String {
        let height = format!("{}px", spacer.height);
        match self.flavor {
            Flavor::Web => {
                let style = self.styles.resolve(block, &[("height", height.as_str())]);
                format!("<div{} aria-hidden=\"true\"></div>", style_attr(&style))
            }
            Flavor::Email => {
                let style = self.styles.resolve(
                    block,
                    &[("height", height.as_str()), ("font-size", "0"), ("line-height", "0")],
                );
                format!(
                    "<table role=\"presentation\" width=\"100%\" cellpadding=\"0\" cellspacing=\"0\" border=\"0\"><tr><td height=\"{}\"{}>&nbsp;</td></tr></table>",
                    spacer.height,
                    style_attr(&style)
                )
            }
        }
    }

    fn list(&self, block: &ContentBlock, list: &ListBlock) -> String {
        let style = self
            .styles
            .resolve(block, &[("margin", "0 0 16px"), ("padding-left", "24px")]);
        let items: String = list
            .items
            .iter()
            .filter(|item| !item.trim().is_empty())
            .map(|item| format!("<li style=\"margin: 0 0 4px\">{}</li>", text(item.trim())))
            .collect();
        format!("<ul{}>{items}</ul>", style_attr(&style))
    }

    fn html(&self, html: &HtmlBlock) -> String {
        // Raw HTML blocks are trusted author content and pass through.
        html.content.clone()
    }

    /// Metadata card shown for frontmatter blocks in the clean preview.
    pub fn frontmatter_card(&self, block: &ContentBlock, frontmatter: &Frontmatter) -> String {
        let style = self.styles.resolve(
            block,
            &[
                ("border", "1px dashed #d1d5db"),
                ("padding", "12px 16px"),
                ("margin", "0 0 16px"),
                ("font-size", "14px"),
                ("color", "#374151"),
            ],
        );
        let mut rows = String::new();
        let mut row = |label: &str, value: &str| {
            if !value.is_empty() {
                let _ = write!(rows, "<dt>{}</dt><dd>{}</dd>", text(label), text(value));
            }
        };
        row("Title", &frontmatter.title);
        row("Subtitle", frontmatter.subtitle.as_deref().unwrap_or(""));
        row("Author", frontmatter.author.as_deref().unwrap_or(""));
        row("Date", frontmatter.date.as_deref().unwrap_or(""));
        row("Status", frontmatter.status.as_deref().unwrap_or(""));
        row("Tags", &frontmatter.tags.join(", "));
        format!(
            "<aside class=\"cs-frontmatter\"{}><dl>{rows}</dl></aside>",
            style_attr(&style)
        )
    }
}

fn apply_crop(style: &mut InlineStyle, image: &ImageBlock) {
    let settings = &image.email;
    if let Some(height) = settings.height {
        style.set("height", format!("{height}px"));
    }
    match settings.crop {
        ImageCrop::None => {}
        ImageCrop::Cover => style.set("object-fit", "cover"),
        ImageCrop::Contain => style.set("object-fit", "contain"),
    }
    if let Some(focal) = settings.focal_point.as_deref()
        && settings.crop != ImageCrop::None
    {
        style.set("object-position", focal.to_string());
    }
}

/// Fluid-hybrid header image: edge to edge in modern clients, wrapped in a
/// fixed-width conditional table for Outlook.
pub fn fluid_hybrid_image(
    block: &ContentBlock,
    image: &ImageBlock,
    styles: &StyleResolver<'_>,
    container_width: u32,
) -> String {
    if !image.has_url() {
        return placeholder("image", "No image selected");
    }
    let outlook_width = image.email.outlook_width.unwrap_or(container_width);
    let mut img_style = InlineStyle::from_pairs(&[
        ("display", "block"),
        ("width", "100%"),
        ("height", "auto"),
        ("border", "0"),
    ]);
    apply_crop(&mut img_style, image);
    let wrapper = styles.resolve(block, &[("margin", "0 auto"), ("width", "100%")]);
    let mut img = format!(
        "<img src=\"{}\" alt=\"{}\" width=\"{outlook_width}\"{}>",
        attr(&image.url),
        attr(&image.alt),
        style_attr(&img_style)
    );
    if let Some(link) = image.link.as_deref().filter(|link| !link.is_empty()) {
        img = format!("<a href=\"{}\" target=\"_blank\">{img}</a>", attr(link));
    }
    format!(
        "<!--[if mso]><table role=\"presentation\" width=\"{outlook_width}\" align=\"center\" cellpadding=\"0\" cellspacing=\"0\" border=\"0\"><tr><td><![endif]--><div class=\"cs-email-header\"{}>{img}</div><!--[if mso]></td></tr></table><![endif]-->",
        style_attr(&wrapper)
    )
}
