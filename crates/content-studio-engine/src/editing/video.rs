use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::models::{VideoBlock, VideoPlatform};

/// Platform and embed id extracted from a pasted video URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedVideo {
    pub platform: VideoPlatform,
    pub embed_id: String,
}

/// Inline hint shown next to a field that failed validation. Editing is
/// never blocked by it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationHint {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ValidationHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn youtube_regex() -> &'static Regex {
    static YOUTUBE_REGEX: OnceLock<Regex> = OnceLock::new();
    YOUTUBE_REGEX.get_or_init(|| {
        Regex::new(
            r"(?:youtube(?:-nocookie)?\.com/(?:watch\?(?:[^#\s]*&)?v=|embed/|shorts/|v/|live/)|youtu\.be/)([A-Za-z0-9_-]{11})",
        )
        .expect("Invalid YouTube regex")
    })
}

fn vimeo_regex() -> &'static Regex {
    static VIMEO_REGEX: OnceLock<Regex> = OnceLock::new();
    VIMEO_REGEX.get_or_init(|| {
        Regex::new(r"vimeo\.com/(?:video/|channels/[^/\s]+/|groups/[^/\s]+/videos/)?(\d+)")
            .expect("Invalid Vimeo regex")
    })
}

/// Detect the platform and embed id in free text containing a video URL.
pub fn parse_video_url(input: &str) -> Result<ParsedVideo, ValidationHint> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ValidationHint {
            field: "url",
            message: "Enter a YouTube or Vimeo URL".to_string(),
        });
    }

    if let Some(captures) = youtube_regex().captures(input) {
        return Ok(ParsedVideo {
            platform: VideoPlatform::Youtube,
            embed_id: captures[1].to_string(),
        });
    }
    if let Some(captures) = vimeo_regex().captures(input) {
        return Ok(ParsedVideo {
            platform: VideoPlatform::Vimeo,
            embed_id: captures[1].to_string(),
        });
    }

    Err(ValidationHint {
        field: "url",
        message: "Only YouTube and Vimeo links are supported".to_string(),
    })
}

/// New video payload for a URL typed into the video editor.
///
/// Unrecognised URLs are kept as typed with an empty embed id, plus a hint.
pub fn apply_video_url(video: &VideoBlock, url: &str) -> (VideoBlock, Option<ValidationHint>) {
    let mut updated = video.clone();
    updated.url = url.trim().to_string();
    match parse_video_url(url) {
        Ok(parsed) => {
            updated.platform = Some(parsed.platform);
            updated.embed_id = Some(parsed.embed_id);
            (updated, None)
        }
        Err(hint) => {
            updated.platform = None;
            updated.embed_id = None;
            (updated, Some(hint))
        }
    }
}
