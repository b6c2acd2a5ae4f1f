//! Renderer factory and the three preview renderers.
//!
//! [`render`] is a pure function of its [`RenderRequest`]: it sorts the
//! blocks, picks the renderer for the mode and returns markup. Nothing is
//! retained between calls; see [`RenderCache`] for memoisation.

pub mod cache;
pub mod clean;
pub mod email;
pub mod markup;
pub mod news;
pub mod style;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{ContentBlock, Frontmatter};
use crate::stylesheet::StylesheetState;

pub use cache::RenderCache;
pub use clean::CleanRenderer;
pub use email::{EmailRenderer, split_email_header};
pub use markup::{BlockMarkup, Flavor};
pub use news::NewsArticleRenderer;
pub use style::{InlineStyle, StyleResolver};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RenderMode {
    #[default]
    Clean,
    NewsArticle,
    Email,
}

impl RenderMode {
    pub const ALL: [RenderMode; 3] = [RenderMode::Clean, RenderMode::NewsArticle, RenderMode::Email];

    pub fn as_str(&self) -> &'static str {
        match self {
            RenderMode::Clean => "clean",
            RenderMode::NewsArticle => "news-article",
            RenderMode::Email => "email",
        }
    }

    /// The next mode in display order, wrapping around.
    pub fn next(&self) -> Self {
        match self {
            RenderMode::Clean => RenderMode::NewsArticle,
            RenderMode::NewsArticle => RenderMode::Email,
            RenderMode::Email => RenderMode::Clean,
        }
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    kind: &'static str,
    value: String,
}

impl FromStr for RenderMode {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "clean" => Ok(RenderMode::Clean),
            "news-article" | "news" | "newsarticle" => Ok(RenderMode::NewsArticle),
            "email" => Ok(RenderMode::Email),
            _ => Err(UnknownVariant {
                kind: "render mode",
                value: s.to_string(),
            }),
        }
    }
}

/// Email service the markup is destined for. Only affects the container
/// skeleton around the blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailPlatform {
    SendGrid,
    Mailchimp,
    #[default]
    Generic,
}

impl EmailPlatform {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmailPlatform::SendGrid => "sendgrid",
            EmailPlatform::Mailchimp => "mailchimp",
            EmailPlatform::Generic => "generic",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            EmailPlatform::SendGrid => EmailPlatform::Mailchimp,
            EmailPlatform::Mailchimp => EmailPlatform::Generic,
            EmailPlatform::Generic => EmailPlatform::SendGrid,
        }
    }
}

impl fmt::Display for EmailPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmailPlatform {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sendgrid" => Ok(EmailPlatform::SendGrid),
            "mailchimp" => Ok(EmailPlatform::Mailchimp),
            "generic" => Ok(EmailPlatform::Generic),
            _ => Err(UnknownVariant {
                kind: "email platform",
                value: s.to_string(),
            }),
        }
    }
}

/// Outer layout of an email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmailContainerConfig {
    pub platform: EmailPlatform,
    pub max_width: u32,
    pub background_color: String,
    pub content_background_color: String,
    pub padding: u32,
    pub font_family: String,
}

impl Default for EmailContainerConfig {
    fn default() -> Self {
        Self {
            platform: EmailPlatform::Generic,
            max_width: 600,
            background_color: "#f3f4f6".to_string(),
            content_background_color: "#ffffff".to_string(),
            padding: 24,
            font_family: "Arial, Helvetica, sans-serif".to_string(),
        }
    }
}

impl EmailContainerConfig {
    pub fn for_platform(platform: EmailPlatform) -> Self {
        Self {
            platform,
            ..Self::default()
        }
    }
}

/// Everything a render depends on.
#[derive(Debug, Clone, Default)]
pub struct RenderRequest {
    pub mode: RenderMode,
    pub blocks: Arc<Vec<ContentBlock>>,
    pub composition_name: Option<String>,
    pub frontmatter: Option<Frontmatter>,
    pub stylesheet: StylesheetState,
    pub email_container: EmailContainerConfig,
}

impl RenderRequest {
    pub fn new(mode: RenderMode, blocks: Arc<Vec<ContentBlock>>) -> Self {
        Self {
            mode,
            blocks,
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.composition_name = Some(name.into());
        self
    }

    pub fn with_frontmatter(mut self, frontmatter: Option<Frontmatter>) -> Self {
        self.frontmatter = frontmatter;
        self
    }

    pub fn with_stylesheet(mut self, stylesheet: StylesheetState) -> Self {
        self.stylesheet = stylesheet;
        self
    }

    pub fn with_email_container(mut self, config: EmailContainerConfig) -> Self {
        self.email_container = config;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStatus {
    Ready,
    Empty,
    /// Stylesheet data is not available yet; the html is a placeholder.
    Loading,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOutput {
    pub mode: RenderMode,
    pub status: RenderStatus,
    pub html: String,
}

/// Per-call inputs shared by every renderer.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub composition_name: Option<&'a str>,
    pub frontmatter: Option<&'a Frontmatter>,
    pub styles: StyleResolver<'a>,
    pub email_container: &'a EmailContainerConfig,
}

impl<'a> RenderContext<'a> {
    pub fn from_request(request: &'a RenderRequest) -> Self {
        Self {
            composition_name: request.composition_name.as_deref(),
            frontmatter: request.frontmatter.as_ref(),
            styles: StyleResolver::new(request.stylesheet.data()),
            email_container: &request.email_container,
        }
    }
}

pub trait Renderer {
    /// Markup for blocks already sorted by [`sorted_blocks`]; never empty.
    fn render(&self, ctx: &RenderContext<'_>, blocks: &[&ContentBlock]) -> String;

    fn empty_state(&self) -> String {
        markup::placeholder("empty", "No blocks yet. Add a block to get started.")
    }
}

/// Blocks by `order`, ties kept in their original position.
pub fn sorted_blocks(blocks: &[ContentBlock]) -> Vec<&ContentBlock> {
    let mut sorted: Vec<&ContentBlock> = blocks.iter().collect();
    sorted.sort_by_key(|block| block.order);
    sorted
}

pub fn renderer_for(mode: RenderMode) -> &'static dyn Renderer {
    match mode {
        RenderMode::Clean => &CleanRenderer,
        RenderMode::NewsArticle => &NewsArticleRenderer,
        RenderMode::Email => &EmailRenderer,
    }
}

pub fn loading_placeholder() -> String {
    "<div class=\"cs-placeholder cs-placeholder--loading\" role=\"status\">Loading stylesheet...</div>"
        .to_string()
}

/// Render `request` with the renderer for its mode.
pub fn render(request: &RenderRequest) -> RenderOutput {
    let renderer = renderer_for(request.mode);
    if !request.stylesheet.is_renderable() {
        if let StylesheetState::Failed(reason) = &request.stylesheet {
            log::warn!("Stylesheet unavailable, holding {} preview: {reason}", request.mode);
        }
        return RenderOutput {
            mode: request.mode,
            status: RenderStatus::Loading,
            html: loading_placeholder(),
        };
    }
    if request.blocks.is_empty() {
        return RenderOutput {
            mode: request.mode,
            status: RenderStatus::Empty,
            html: renderer.empty_state(),
        };
    }

    let ctx = RenderContext::from_request(request);
    let blocks = sorted_blocks(&request.blocks);
    log::debug!("Rendering {} blocks as {}", blocks.len(), request.mode);
    RenderOutput {
        mode: request.mode,
        status: RenderStatus::Ready,
        html: renderer.render(&ctx, &blocks),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContentBlock;
    use crate::stylesheet::StylesheetData;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn blocks() -> Arc<Vec<ContentBlock>> {
        let mut second = ContentBlock::text("second").with_id("b");
        second.order = 1;
        let mut first = ContentBlock::text("first").with_id("a");
        first.order = 0;
        Arc::new(vec![second, first])
    }

    #[rstest]
    #[case("clean", RenderMode::Clean)]
    #[case("news-article", RenderMode::NewsArticle)]
    #[case("News", RenderMode::NewsArticle)]
    #[case(" EMAIL ", RenderMode::Email)]
    fn parses_modes(#[case] input: &str, #[case] expected: RenderMode) {
        assert_eq!(input.parse::<RenderMode>().unwrap(), expected);
    }

    #[test]
    fn unknown_mode_is_an_error() {
        let err = "print".parse::<RenderMode>().unwrap_err();
        assert_eq!(err.to_string(), "unknown render mode 'print'");
    }

    #[test]
    fn platform_round_trips_through_display() {
        for platform in [
            EmailPlatform::SendGrid,
            EmailPlatform::Mailchimp,
            EmailPlatform::Generic,
        ] {
            assert_eq!(platform.to_string().parse::<EmailPlatform>().unwrap(), platform);
        }
    }

    #[test]
    fn sort_is_stable_for_equal_orders() {
        let a = ContentBlock::text("a").with_id("a");
        let b = ContentBlock::text("b").with_id("b");
        let blocks = vec![a, b];
        let ids: Vec<&str> = sorted_blocks(&blocks).iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[rstest]
    fn every_mode_handles_empty_blocks(
        #[values(RenderMode::Clean, RenderMode::NewsArticle, RenderMode::Email)] mode: RenderMode,
    ) {
        let output = render(&RenderRequest::new(mode, Arc::new(Vec::new())));
        assert_eq!(output.status, RenderStatus::Empty);
        assert!(output.html.contains("cs-placeholder--empty"));
    }

    #[rstest]
    #[case(StylesheetState::Loading)]
    #[case(StylesheetState::Failed("404".into()))]
    fn unavailable_stylesheet_suppresses_rendering(#[case] state: StylesheetState) {
        let output = render(&RenderRequest::new(RenderMode::Email, blocks()).with_stylesheet(state));
        assert_eq!(output.status, RenderStatus::Loading);
        assert_eq!(output.html, loading_placeholder());
    }

    #[test]
    fn ready_stylesheet_renders_sorted_blocks() {
        let sheet = StylesheetState::ready(StylesheetData::default());
        let output = render(&RenderRequest::new(RenderMode::Clean, blocks()).with_stylesheet(sheet));

        assert_eq!(output.status, RenderStatus::Ready);
        let first = output.html.find("first").unwrap();
        let second = output.html.find("second").unwrap();
        assert!(first < second);
    }

    #[rstest]
    fn rendering_is_deterministic(
        #[values(RenderMode::Clean, RenderMode::NewsArticle, RenderMode::Email)] mode: RenderMode,
    ) {
        let request = RenderRequest::new(mode, blocks()).with_name("Weekly");
        assert_eq!(render(&request), render(&request));
    }
}
