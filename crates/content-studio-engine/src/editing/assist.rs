//! Machine-generated alt text and captions for image blocks.

use thiserror::Error;

use crate::models::{BlockBody, ContentBlock};
use crate::notify::Notifier;

use super::BlockUpdate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssistField {
    AltText,
    Caption,
}

impl AssistField {
    fn label(&self) -> &'static str {
        match self {
            AssistField::AltText => "alt text",
            AssistField::Caption => "caption",
        }
    }
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("image analysis unavailable: {0}")]
    Unavailable(String),
    #[error("image has no URL to analyse")]
    MissingImage,
    #[error("image analysis returned an empty result")]
    Empty,
}

/// External image-analysis collaborator.
pub trait ImageAnalyzer {
    fn describe(&self, image_url: &str, field: AssistField) -> Result<String, AnalysisError>;
}

/// Ask `analyzer` for a value for `field` of the image block `block`.
///
/// Returns the update to apply on success. On any failure the block stays as
/// it is, an error notification is posted and `None` is returned.
pub fn assist_image_field(
    block: &ContentBlock,
    field: AssistField,
    analyzer: &dyn ImageAnalyzer,
    notifier: &Notifier,
) -> Option<BlockUpdate> {
    let BlockBody::Image(image) = &block.body else {
        notifier.error(format!(
            "Cannot generate {} for a {} block",
            field.label(),
            block.kind()
        ));
        return None;
    };

    let result = if image.has_url() {
        analyzer.describe(&image.url, field)
    } else {
        Err(AnalysisError::MissingImage)
    };
    let text = match result {
        Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
        Ok(_) => {
            notifier.error(format!("Failed to generate {}: {}", field.label(), AnalysisError::Empty));
            return None;
        }
        Err(err) => {
            notifier.error(format!("Failed to generate {}: {err}", field.label()));
            return None;
        }
    };

    let mut updated = image.clone();
    match field {
        AssistField::AltText => updated.alt = text,
        AssistField::Caption => updated.caption = Some(text),
    }
    notifier.success(format!("Generated {}", field.label()));
    Some(BlockUpdate::body(BlockBody::Image(updated)))
}
