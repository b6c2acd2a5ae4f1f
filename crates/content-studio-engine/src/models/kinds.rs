//! Payloads of the individual block types.

use serde::{Deserialize, Serialize};

/// Horizontal placement of images, videos and buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    #[default]
    Center,
    Right,
}

impl Alignment {
    pub fn as_css(&self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
        }
    }
}

/// Semantic element a text block renders as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextElement {
    #[default]
    P,
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
}

impl TextElement {
    /// Heading element for a level; levels outside 1..=6 are clamped.
    pub fn heading(level: u8) -> Self {
        match level {
            0 | 1 => TextElement::H1,
            2 => TextElement::H2,
            3 => TextElement::H3,
            4 => TextElement::H4,
            5 => TextElement::H5,
            _ => TextElement::H6,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            TextElement::P => "p",
            TextElement::H1 => "h1",
            TextElement::H2 => "h2",
            TextElement::H3 => "h3",
            TextElement::H4 => "h4",
            TextElement::H5 => "h5",
            TextElement::H6 => "h6",
        }
    }

    /// Heading level, or `None` for paragraphs.
    pub fn level(&self) -> Option<u8> {
        match self {
            TextElement::P => None,
            TextElement::H1 => Some(1),
            TextElement::H2 => Some(2),
            TextElement::H3 => Some(3),
            TextElement::H4 => Some(4),
            TextElement::H5 => Some(5),
            TextElement::H6 => Some(6),
        }
    }

    pub fn is_heading(&self) -> bool {
        self.level().is_some()
    }
}

/// Inline mark applied to a byte range of a text block's content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Mark {
    Bold,
    Italic,
    Link { url: String },
}

/// A mark over `content[start..end]` (byte offsets).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub start: usize,
    pub end: usize,
    #[serde(flatten)]
    pub mark: Mark,
}

impl Annotation {
    pub fn new(start: usize, end: usize, mark: Mark) -> Self {
        Self { start, end, mark }
    }

    /// Whether the range is non-empty and lies on char boundaries of `content`.
    pub fn fits(&self, content: &str) -> bool {
        self.start < self.end
            && self.end <= content.len()
            && content.is_char_boundary(self.start)
            && content.is_char_boundary(self.end)
    }
}

/// Block-level formatting fields set from the text editor toolbar.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextFormatting {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_align: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_height: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub bold: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub italic: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub underline: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
}

impl TextFormatting {
    pub fn is_empty(&self) -> bool {
        *self == TextFormatting::default()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextBlock {
    pub content: String,
    pub element: TextElement,
    #[serde(skip_serializing_if = "TextFormatting::is_empty")]
    pub formatting: TextFormatting,
}

impl TextBlock {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }
}

/// How a header image is cropped into its box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageCrop {
    #[default]
    None,
    Cover,
    Contain,
}

/// Email-specific image knobs for the fluid-hybrid header pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmailImageSettings {
    /// Expand edge to edge in modern clients. Only a leading run of such
    /// images is promoted into the email header.
    pub is_full_width: bool,
    /// Width cap in pixels for clients that honour CSS.
    pub max_width: u32,
    /// Fixed width used by Outlook, which ignores percentage widths.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outlook_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    pub crop: ImageCrop,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focal_point: Option<String>,
}

impl Default for EmailImageSettings {
    fn default() -> Self {
        Self {
            is_full_width: false,
            max_width: 600,
            outlook_width: None,
            height: None,
            crop: ImageCrop::None,
            focal_point: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageBlock {
    pub url: String,
    pub alt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    pub alignment: Alignment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<String>,
    pub email: EmailImageSettings,
}

impl ImageBlock {
    pub fn new(url: impl Into<String>, alt: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            alt: alt.into(),
            ..Self::default()
        }
    }

    pub fn has_url(&self) -> bool {
        !self.url.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoPlatform {
    Youtube,
    Vimeo,
}

impl VideoPlatform {
    pub fn name(&self) -> &'static str {
        match self {
            VideoPlatform::Youtube => "youtube",
            VideoPlatform::Vimeo => "vimeo",
        }
    }

    pub fn embed_url(&self, embed_id: &str) -> String {
        match self {
            VideoPlatform::Youtube => format!("https://www.youtube.com/embed/{embed_id}"),
            VideoPlatform::Vimeo => format!("https://player.vimeo.com/video/{embed_id}"),
        }
    }

    pub fn watch_url(&self, embed_id: &str) -> String {
        match self {
            VideoPlatform::Youtube => format!("https://www.youtube.com/watch?v={embed_id}"),
            VideoPlatform::Vimeo => format!("https://vimeo.com/{embed_id}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "16:9")]
    Widescreen,
    #[serde(rename = "4:3")]
    Standard,
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "9:16")]
    Vertical,
}

impl AspectRatio {
    pub fn label(&self) -> &'static str {
        match self {
            AspectRatio::Widescreen => "16:9",
            AspectRatio::Standard => "4:3",
            AspectRatio::Square => "1:1",
            AspectRatio::Vertical => "9:16",
        }
    }

    /// Padding-bottom percentage for the responsive embed wrapper.
    pub fn padding_percent(&self) -> &'static str {
        match self {
            AspectRatio::Widescreen => "56.25%",
            AspectRatio::Standard => "75%",
            AspectRatio::Square => "100%",
            AspectRatio::Vertical => "177.78%",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoBlock {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<VideoPlatform>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embed_id: Option<String>,
    pub aspect_ratio: AspectRatio,
    pub alignment: Alignment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl VideoBlock {
    /// Platform and id when both are known and the id is non-empty.
    pub fn embed(&self) -> Option<(VideoPlatform, &str)> {
        let id = self.embed_id.as_deref().filter(|id| !id.trim().is_empty())?;
        Some((self.platform?, id))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

impl LineStyle {
    pub fn as_css(&self) -> &'static str {
        match self {
            LineStyle::Solid => "solid",
            LineStyle::Dashed => "dashed",
            LineStyle::Dotted => "dotted",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DividerBlock {
    pub thickness: u32,
    pub color: String,
    pub margin: u32,
    pub line_style: LineStyle,
}

impl Default for DividerBlock {
    fn default() -> Self {
        Self {
            thickness: 1,
            color: "#e5e7eb".to_string(),
            margin: 24,
            line_style: LineStyle::Solid,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ButtonBlock {
    pub text: String,
    pub url: String,
    pub background_color: String,
    pub text_color: String,
    pub padding: String,
    pub border_radius: u32,
    pub alignment: Alignment,
}

impl Default for ButtonBlock {
    fn default() -> Self {
        Self {
            text: "Read more".to_string(),
            url: String::new(),
            background_color: "#2563eb".to_string(),
            text_color: "#ffffff".to_string(),
            padding: "12px 24px".to_string(),
            border_radius: 6,
            alignment: Alignment::Center,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpacerBlock {
    pub height: u32,
}

impl Default for SpacerBlock {
    fn default() -> Self {
        Self { height: 24 }
    }
}

/// Lists are always rendered unordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListStyle {
    #[default]
    Unordered,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListBlock {
    pub items: Vec<String>,
    #[serde(skip_deserializing)]
    pub list_style: ListStyle,
}

impl ListBlock {
    pub fn new<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            items: items.into_iter().map(Into::into).collect(),
            list_style: ListStyle::Unordered,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HtmlBlock {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CallToAction {
    pub text: String,
    pub url: String,
}

/// Structured article metadata. Used both as a block payload and as the
/// composition-level frontmatter.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Frontmatter {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image_alt: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_to_action: Option<CallToAction>,
}

impl Frontmatter {
    pub fn is_empty(&self) -> bool {
        *self == Frontmatter::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(0, TextElement::H1)]
    #[case(1, TextElement::H1)]
    #[case(3, TextElement::H3)]
    #[case(6, TextElement::H6)]
    #[case(9, TextElement::H6)]
    fn heading_levels_are_clamped(#[case] level: u8, #[case] expected: TextElement) {
        assert_eq!(TextElement::heading(level), expected);
    }

    #[test]
    fn list_style_is_always_unordered() {
        let list: ListBlock =
            serde_json::from_value(json!({"items": ["a", "b"], "listStyle": "ordered"})).unwrap();
        assert_eq!(list.list_style, ListStyle::Unordered);
        assert_eq!(list.items, vec!["a", "b"]);
    }

    #[test]
    fn aspect_ratio_uses_ratio_strings() {
        let video: VideoBlock = serde_json::from_value(json!({"aspectRatio": "4:3"})).unwrap();
        assert_eq!(video.aspect_ratio, AspectRatio::Standard);
        assert_eq!(
            serde_json::to_value(AspectRatio::Widescreen).unwrap(),
            json!("16:9")
        );
    }

    #[test]
    fn video_without_id_has_no_embed() {
        let video = VideoBlock {
            platform: Some(VideoPlatform::Youtube),
            embed_id: Some("  ".into()),
            ..VideoBlock::default()
        };
        assert!(video.embed().is_none());
    }

    #[test]
    fn annotation_fit_respects_char_boundaries() {
        let content = "héllo";
        assert!(Annotation::new(0, 1, Mark::Bold).fits(content));
        assert!(!Annotation::new(0, 2, Mark::Bold).fits(content));
        assert!(!Annotation::new(3, 3, Mark::Bold).fits(content));
        assert!(!Annotation::new(0, 99, Mark::Bold).fits(content));
    }

    #[test]
    fn annotations_serialize_with_flat_mark() {
        let annotation = Annotation::new(
            0,
            4,
            Mark::Link {
                url: "https://example.com".into(),
            },
        );
        assert_eq!(
            serde_json::to_value(&annotation).unwrap(),
            json!({"start": 0, "end": 4, "kind": "link", "url": "https://example.com"})
        );
    }
}
