//! Inline style resolution.
//!
//! For every property independently, the later layer wins:
//! renderer defaults, then the block's own `styles` map and formatting
//! fields, then the declarations of its stylesheet class.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::models::{BlockBody, ContentBlock};
use crate::stylesheet::StylesheetData;

/// `fontSize` and `font_size` become `font-size`; kebab-case is untouched.
pub fn kebab_case(property: &str) -> String {
    let mut out = String::with_capacity(property.len() + 4);
    for c in property.trim().chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else if c == '_' {
            out.push('-');
        } else {
            out.push(c);
        }
    }
    out
}

const UNITLESS: &[&str] = &[
    "font-weight",
    "line-height",
    "opacity",
    "z-index",
    "flex",
    "flex-grow",
    "flex-shrink",
    "order",
];

/// CSS text for a free-form style value; bare numbers get `px` unless the
/// property is unitless.
fn css_value(property: &str, value: &Value) -> Option<String> {
    match value {
        Value::String(text) => {
            let text = text.trim();
            (!text.is_empty()).then(|| text.to_string())
        }
        Value::Number(number) if UNITLESS.contains(&property) => Some(number.to_string()),
        Value::Number(number) => Some(format!("{number}px")),
        Value::Bool(_) | Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Ordered set of CSS declarations for a `style` attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineStyle {
    declarations: BTreeMap<String, String>,
}

impl InlineStyle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        let mut style = Self::new();
        for (property, value) in pairs {
            style.set(property, *value);
        }
        style
    }

    pub fn set(&mut self, property: &str, value: impl Into<String>) {
        let value = value.into();
        if value.trim().is_empty() {
            return;
        }
        self.declarations.insert(kebab_case(property), value);
    }

    pub fn get(&self, property: &str) -> Option<&str> {
        self.declarations
            .get(&kebab_case(property))
            .map(String::as_str)
    }

    pub fn remove(&mut self, property: &str) -> Option<String> {
        self.declarations.remove(&kebab_case(property))
    }

    /// Layer `other` on top of `self`.
    pub fn merge(&mut self, other: &InlineStyle) {
        for (property, value) in &other.declarations {
            self.declarations.insert(property.clone(), value.clone());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// `color: red; font-size: 16px` in property order.
    pub fn to_css(&self) -> String {
        self.declarations
            .iter()
            .map(|(property, value)| format!("{property}: {value}"))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Style layer from typed block fields (text formatting, button colours).
fn formatting_layer(body: &BlockBody) -> InlineStyle {
    let mut style = InlineStyle::new();
    match body {
        BlockBody::Text(text) => {
            let formatting = &text.formatting;
            if formatting.bold {
                style.set("font-weight", "bold");
            }
            if formatting.italic {
                style.set("font-style", "italic");
            }
            if formatting.underline {
                style.set("text-decoration", "underline");
            }
            let typed = [
                ("font-size", &formatting.font_size),
                ("font-family", &formatting.font_family),
                ("font-weight", &formatting.font_weight),
                ("color", &formatting.color),
                ("text-align", &formatting.text_align),
                ("line-height", &formatting.line_height),
            ];
            for (property, value) in typed {
                if let Some(value) = value {
                    style.set(property, value.clone());
                }
            }
        }
        BlockBody::Button(button) => {
            style.set("background-color", button.background_color.clone());
            style.set("color", button.text_color.clone());
            style.set("padding", button.padding.clone());
            style.set("border-radius", format!("{}px", button.border_radius));
        }
        BlockBody::Image(_)
        | BlockBody::Video(_)
        | BlockBody::Divider(_)
        | BlockBody::Spacer(_)
        | BlockBody::List(_)
        | BlockBody::Html(_)
        | BlockBody::Frontmatter(_)
        | BlockBody::Unsupported { .. } => {}
    }
    style
}

/// Resolves block styles against an optional stylesheet.
#[derive(Debug, Clone, Copy, Default)]
pub struct StyleResolver<'a> {
    stylesheet: Option<&'a StylesheetData>,
}

impl<'a> StyleResolver<'a> {
    pub fn new(stylesheet: Option<&'a StylesheetData>) -> Self {
        Self { stylesheet }
    }

    pub fn stylesheet(&self) -> Option<&'a StylesheetData> {
        self.stylesheet
    }

    /// Declarations of the block's stylesheet class(es). Several classes may
    /// be given separated by whitespace; later ones win.
    pub fn class_layer(&self, block: &ContentBlock) -> InlineStyle {
        let mut style = InlineStyle::new();
        let (Some(stylesheet), Some(class_names)) =
            (self.stylesheet, block.css_class_name.as_deref())
        else {
            return style;
        };
        for class_name in class_names.split_whitespace() {
            match stylesheet.class(class_name) {
                Some(rule) => {
                    for (property, value) in rule {
                        style.set(property, value.clone());
                    }
                }
                None => log::debug!(
                    "Class '{class_name}' of block {} not in stylesheet {}",
                    block.id,
                    stylesheet.id
                ),
            }
        }
        style
    }

    /// Full inline style for `block` over the renderer `defaults`.
    pub fn resolve(&self, block: &ContentBlock, defaults: &[(&str, &str)]) -> InlineStyle {
        let mut style = InlineStyle::from_pairs(defaults);
        for (property, value) in &block.styles {
            let property = kebab_case(property);
            if let Some(value) = css_value(&property, value) {
                style.set(&property, value);
            }
        }
        style.merge(&formatting_layer(&block.body));
        style.merge(&self.class_layer(block));
        style
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TextBlock, TextFormatting};
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    fn stylesheet() -> StylesheetData {
        StylesheetData::from_css(
            "house",
            "House",
            ".headline { color: red; letter-spacing: 1px; } .big { font-size: 40px; }",
        )
    }

    fn formatted_text(formatting: TextFormatting) -> ContentBlock {
        let mut text = TextBlock::new("Hello");
        text.formatting = formatting;
        ContentBlock::new(BlockBody::Text(text))
    }

    #[rstest]
    #[case("fontSize", "font-size")]
    #[case("font_size", "font-size")]
    #[case("font-size", "font-size")]
    #[case("backgroundColor", "background-color")]
    #[case("color", "color")]
    fn property_names_become_kebab_case(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(kebab_case(input), expected);
    }

    #[test]
    fn class_beats_formatting_beats_defaults() {
        let sheet = stylesheet();
        let resolver = StyleResolver::new(Some(&sheet));
        let block = formatted_text(TextFormatting {
            color: Some("blue".into()),
            font_size: Some("18px".into()),
            ..TextFormatting::default()
        })
        .with_css_class("headline");

        let style = resolver.resolve(
            &block,
            &[("color", "black"), ("font-size", "16px"), ("margin", "0")],
        );

        assert_eq!(style.get("color"), Some("red"));
        assert_eq!(style.get("font-size"), Some("18px"));
        assert_eq!(style.get("margin"), Some("0"));
        assert_eq!(style.get("letter-spacing"), Some("1px"));
    }

    #[test]
    fn styles_map_values_are_normalised() {
        let block = ContentBlock::text("x")
            .with_style("fontSize", json!(14))
            .with_style("lineHeight", json!(1.5))
            .with_style("ignored", json!(true));
        let style = StyleResolver::default().resolve(&block, &[]);

        assert_eq!(style.to_css(), "font-size: 14px; line-height: 1.5");
    }

    #[test]
    fn formatting_wins_over_styles_map() {
        let block = formatted_text(TextFormatting {
            color: Some("green".into()),
            ..TextFormatting::default()
        })
        .with_style("color", "purple");
        let style = StyleResolver::default().resolve(&block, &[]);
        assert_eq!(style.get("color"), Some("green"));
    }

    #[test]
    fn multiple_classes_layer_in_order() {
        let sheet = stylesheet();
        let block = ContentBlock::text("x").with_css_class("headline big");
        let style = StyleResolver::new(Some(&sheet)).resolve(&block, &[]);
        assert_eq!(style.get("font-size"), Some("40px"));
        assert_eq!(style.get("color"), Some("red"));
    }

    #[test]
    fn unknown_class_without_stylesheet_is_ignored() {
        let block = ContentBlock::text("x").with_css_class("headline");
        let style = StyleResolver::new(None).resolve(&block, &[("color", "black")]);
        assert_eq!(style.to_css(), "color: black");
    }
}
