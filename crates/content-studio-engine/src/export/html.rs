use crate::models::{ContentBlock, Frontmatter};
use crate::render::markup::{attr, text};
use crate::render::{
    CleanRenderer, EmailContainerConfig, EmailRenderer, NewsArticleRenderer, RenderContext,
    Renderer, StyleResolver, sorted_blocks,
};
use crate::stylesheet::StylesheetData;

/// Kind of document to produce.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ExportTarget {
    #[default]
    Web,
    Article,
    Email(EmailContainerConfig),
}

#[derive(Debug, Clone, Default)]
pub struct HtmlExportOptions {
    pub target: ExportTarget,
    /// Emit only the body markup instead of a full document.
    pub minimal: bool,
    pub title: Option<String>,
    pub stylesheet: Option<StylesheetData>,
    pub frontmatter: Option<Frontmatter>,
}

impl HtmlExportOptions {
    pub fn web() -> Self {
        Self::default()
    }

    pub fn email(config: EmailContainerConfig) -> Self {
        Self {
            target: ExportTarget::Email(config),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn minimal(mut self) -> Self {
        self.minimal = true;
        self
    }
}

const MSO_SETTINGS: &str = "<!--[if mso]><noscript><xml><o:OfficeDocumentSettings><o:PixelsPerInch>96</o:PixelsPerInch></o:OfficeDocumentSettings></xml></noscript><![endif]-->";

const EMAIL_RESET: &str = "<style>body { margin: 0; padding: 0; } table, td { border-collapse: collapse; mso-table-lspace: 0pt; mso-table-rspace: 0pt; } img { -ms-interpolation-mode: bicubic; }</style>";

fn body_markup(blocks: &[ContentBlock], options: &HtmlExportOptions) -> String {
    if blocks.is_empty() {
        return String::new();
    }
    let default_container = EmailContainerConfig::default();
    let email_container = match &options.target {
        ExportTarget::Email(config) => config,
        ExportTarget::Web | ExportTarget::Article => &default_container,
    };
    let ctx = RenderContext {
        composition_name: options.title.as_deref(),
        frontmatter: options.frontmatter.as_ref(),
        styles: StyleResolver::new(options.stylesheet.as_ref()),
        email_container,
    };
    let sorted = sorted_blocks(blocks);
    match options.target {
        ExportTarget::Web => CleanRenderer.render(&ctx, &sorted),
        ExportTarget::Article => NewsArticleRenderer.render(&ctx, &sorted),
        ExportTarget::Email(_) => EmailRenderer.render(&ctx, &sorted),
    }
}

/// Export `blocks` as HTML for `options.target`.
///
/// Without blocks the document body is empty.
pub fn export_html(blocks: &[ContentBlock], options: &HtmlExportOptions) -> String {
    let body = body_markup(blocks, options);
    if options.minimal {
        return body;
    }
    let title = text(options.title.as_deref().unwrap_or("Untitled"));

    match &options.target {
        ExportTarget::Web | ExportTarget::Article => format!(
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n<title>{title}</title>\n</head>\n<body>\n{body}\n</body>\n</html>\n"
        ),
        ExportTarget::Email(config) => format!(
            "<!DOCTYPE html PUBLIC \"-//W3C//DTD XHTML 1.0 Transitional//EN\" \"http://www.w3.org/TR/xhtml1/DTD/xhtml1-transitional.dtd\">\n\
<html xmlns=\"http://www.w3.org/1999/xhtml\" xmlns:v=\"urn:schemas-microsoft-com:vml\" xmlns:o=\"urn:schemas-microsoft-com:office:office\" lang=\"en\">\n\
<head>\n\
<meta http-equiv=\"Content-Type\" content=\"text/html; charset=UTF-8\">\n\
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
<meta http-equiv=\"X-UA-Compatible\" content=\"IE=edge\">\n\
<meta name=\"x-apple-disable-message-reformatting\">\n\
<title>{title}</title>\n\
{MSO_SETTINGS}\n\
{EMAIL_RESET}\n\
</head>\n\
<body style=\"margin: 0; padding: 0; background-color: {}\">\n{body}\n</body>\n</html>\n",
            attr(&config.background_color)
        ),
    }
}
