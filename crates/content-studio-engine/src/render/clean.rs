//! Plain preview: every block in order, frontmatter as a metadata card.

use crate::models::ContentBlock;

use super::markup::{BlockMarkup, Flavor, attr};
use super::{RenderContext, Renderer};

#[derive(Debug, Clone, Copy, Default)]
pub struct CleanRenderer;

impl Renderer for CleanRenderer {
    fn render(&self, ctx: &RenderContext<'_>, blocks: &[&ContentBlock]) -> String {
        let markup = BlockMarkup::new(ctx.styles, Flavor::Web);
        let mut html = String::from(
            "<article class=\"cs-clean\" style=\"max-width: 720px; margin: 0 auto; font-family: system-ui, sans-serif; color: #111827\">",
        );
        for block in blocks {
            html.push_str(&format!(
                "<div class=\"cs-block\" data-block-id=\"{}\">{}</div>",
                attr(block.id.as_str()),
                markup.render(block)
            ));
        }
        html.push_str("</article>");
        html
    }
}
