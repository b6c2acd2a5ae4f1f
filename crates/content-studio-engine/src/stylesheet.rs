//! Externally maintained stylesheet catalog.
//!
//! Renderers look up a block's `cssClassName` here and inline the matching
//! declarations, since email clients drop `<style>` blocks.

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Declarations of one class, property name to value.
pub type ClassRule = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StylesheetData {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub classes: BTreeMap<String, ClassRule>,
}

impl StylesheetData {
    pub fn from_css(id: impl Into<String>, name: impl Into<String>, css: &str) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            classes: parse_css(css),
        }
    }

    /// Rule for a class name, with or without the leading dot.
    pub fn class(&self, name: &str) -> Option<&ClassRule> {
        self.classes.get(name.trim().trim_start_matches('.'))
    }
}

/// Availability of the stylesheet a composition selected.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum StylesheetState {
    /// The composition uses no stylesheet; render with defaults.
    #[default]
    NotSelected,
    /// Selected but the fetch is still in flight.
    Loading,
    Ready(Arc<StylesheetData>),
    /// Selected but the fetch failed; treated like loading by renderers.
    Failed(String),
}

impl StylesheetState {
    pub fn ready(data: StylesheetData) -> Self {
        StylesheetState::Ready(Arc::new(data))
    }

    /// Whether renderers may produce markup in this state.
    pub fn is_renderable(&self) -> bool {
        matches!(self, StylesheetState::NotSelected | StylesheetState::Ready(_))
    }

    pub fn data(&self) -> Option<&StylesheetData> {
        match self {
            StylesheetState::Ready(data) => Some(data),
            _ => None,
        }
    }
}

fn comment_regex() -> &'static Regex {
    static COMMENT_REGEX: OnceLock<Regex> = OnceLock::new();
    COMMENT_REGEX.get_or_init(|| Regex::new(r"(?s)/\*.*?\*/").expect("Invalid comment regex"))
}

fn class_selector_regex() -> &'static Regex {
    static CLASS_REGEX: OnceLock<Regex> = OnceLock::new();
    CLASS_REGEX.get_or_init(|| {
        Regex::new(r"^\.(-?[A-Za-z_][A-Za-z0-9_-]*)$").expect("Invalid class selector regex")
    })
}

/// Index of the brace closing a block whose opening brace precedes `body`.
fn matching_close(body: &str) -> Option<usize> {
    let mut depth = 1usize;
    for (index, c) in body.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(index);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split a rule body on `;`, ignoring separators inside quotes or
/// parentheses such as `url("data:image/png;base64,...")`.
fn split_declarations(body: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut quote: Option<char> = None;
    let mut depth = 0usize;
    let mut start = 0;
    for (index, c) in body.char_indices() {
        match (quote, c) {
            (Some(open), c) if c == open => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, ';') if depth == 0 => {
                parts.push(&body[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    parts.push(&body[start..]);
    parts
}

/// Read plain `.class { prop: value; }` rules from CSS text.
///
/// Grouped selectors apply to each class; anything that is not a bare class
/// selector is skipped, as are at-rules and their nested blocks. When a
/// property is declared more than once for a class the last one wins.
pub fn parse_css(css: &str) -> BTreeMap<String, ClassRule> {
    let css = comment_regex().replace_all(css, "");
    let mut classes: BTreeMap<String, ClassRule> = BTreeMap::new();
    let mut rest: &str = &css;

    while let Some(open) = rest.find('{') {
        let selector = rest[..open].trim();
        let after = &rest[open + 1..];
        let Some(close) = matching_close(after) else {
            log::warn!("Unterminated CSS rule for selector '{selector}'");
            break;
        };
        let body = &after[..close];
        rest = &after[close + 1..];

        if selector.starts_with('@') {
            continue;
        }

        let declarations: Vec<(String, String)> = split_declarations(body)
            .into_iter()
            .filter_map(|declaration| declaration.split_once(':'))
            .map(|(property, value)| {
                (
                    property.trim().to_ascii_lowercase(),
                    value.trim().to_string(),
                )
            })
            .filter(|(property, value)| !property.is_empty() && !value.is_empty())
            .collect();

        for selector in selector.split(',') {
            let Some(captures) = class_selector_regex().captures(selector.trim()) else {
                continue;
            };
            let rule = classes.entry(captures[1].to_string()).or_default();
            for (property, value) in &declarations {
                rule.insert(property.clone(), value.clone());
            }
        }
    }

    classes
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_simple_and_grouped_rules() {
        let css = r#"
            /* brand colours */
            .headline { color: #111; font-size: 32px; }
            .lede, .kicker { font-style: italic }
            .headline { color: red; }
        "#;
        let classes = parse_css(css);

        let headline = &classes["headline"];
        assert_eq!(headline["color"], "red");
        assert_eq!(headline["font-size"], "32px");
        assert_eq!(classes["lede"]["font-style"], "italic");
        assert_eq!(classes["kicker"]["font-style"], "italic");
    }

    #[test]
    fn skips_at_rules_and_complex_selectors() {
        let css = r#"
            @media (max-width: 600px) { .headline { font-size: 20px; } }
            div.card > p { margin: 0; }
            .card { padding: 8px; }
        "#;
        let classes = parse_css(css);

        assert_eq!(classes.len(), 1);
        assert_eq!(classes["card"]["padding"], "8px");
    }

    #[test]
    fn values_with_colons_are_kept_whole() {
        let classes = parse_css(".hero { background-image: url(https://cdn.test/a.png); }");
        assert_eq!(
            classes["hero"]["background-image"],
            "url(https://cdn.test/a.png)"
        );
    }

    #[test]
    fn semicolons_inside_quotes_and_urls_do_not_split() {
        let classes = parse_css(
            r#".badge { background: url("data:image/png;base64,xx"); content: "a;b"; color: red }"#,
        );
        let badge = &classes["badge"];
        assert_eq!(badge["background"], r#"url("data:image/png;base64,xx")"#);
        assert_eq!(badge["content"], r#""a;b""#);
        assert_eq!(badge["color"], "red");
        assert_eq!(badge.len(), 3);
    }

    #[test]
    fn unterminated_rule_stops_parsing() {
        let classes = parse_css(".ok { color: blue; } .broken { color: red;");
        assert_eq!(classes.len(), 1);
    }

    #[test]
    fn class_lookup_accepts_leading_dot() {
        let data = StylesheetData::from_css("s1", "House", ".cta { color: white; }");
        assert!(data.class(".cta").is_some());
        assert!(data.class("cta").is_some());
        assert!(data.class("missing").is_none());
    }

    #[test]
    fn only_not_selected_and_ready_render() {
        assert!(StylesheetState::NotSelected.is_renderable());
        assert!(StylesheetState::ready(StylesheetData::default()).is_renderable());
        assert!(!StylesheetState::Loading.is_renderable());
        assert!(!StylesheetState::Failed("timeout".into()).is_renderable());
    }
}
