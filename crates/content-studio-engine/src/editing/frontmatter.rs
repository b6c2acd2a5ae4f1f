//! Detect article metadata pasted at the top of a text block and split it
//! out into a frontmatter block.

use crate::models::{BlockBody, BlockId, BlockKind, CallToAction, ContentBlock, Frontmatter};

use super::{BlockList, EditError};

const FENCE: &str = "---";

fn unquote(value: &str) -> &str {
    let value = value.trim();
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

fn parse_tags(value: &str) -> Vec<String> {
    let value = value.trim();
    let inner = value
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .unwrap_or(value);
    inner
        .split(',')
        .map(unquote)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

fn non_empty(value: &str) -> Option<String> {
    let value = unquote(value);
    (!value.is_empty()).then(|| value.to_string())
}

/// Parse a leading `---` fenced `key: value` section.
///
/// Returns the metadata and the text after the closing fence, or `None` when
/// the text does not start with a fence, the fence is never closed, or no
/// known key is present.
pub fn detect_frontmatter(text: &str) -> Option<(Frontmatter, String)> {
    let text = text.trim_start();
    let mut lines = text.lines();
    if lines.next()?.trim() != FENCE {
        return None;
    }

    let mut frontmatter = Frontmatter::default();
    let mut cta_text = None;
    let mut cta_url = None;
    let mut recognised = false;
    let mut consumed = 1;
    let mut closed = false;

    for line in lines.by_ref() {
        consumed += 1;
        if line.trim() == FENCE {
            closed = true;
            break;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim().to_ascii_lowercase().replace(['_', '-'], "");
        recognised |= match key.as_str() {
            "title" => {
                frontmatter.title = unquote(value).to_string();
                true
            }
            "subtitle" => {
                frontmatter.subtitle = non_empty(value);
                true
            }
            "author" => {
                frontmatter.author = non_empty(value);
                true
            }
            "date" => {
                frontmatter.date = non_empty(value);
                true
            }
            "status" => {
                frontmatter.status = non_empty(value);
                true
            }
            "coverimage" | "cover" => {
                frontmatter.cover_image = non_empty(value);
                true
            }
            "coverimagealt" => {
                frontmatter.cover_image_alt = non_empty(value);
                true
            }
            "tags" => {
                frontmatter.tags = parse_tags(value);
                true
            }
            "ctatext" => {
                cta_text = non_empty(value);
                true
            }
            "ctaurl" => {
                cta_url = non_empty(value);
                true
            }
            _ => false,
        };
    }

    if !closed || !recognised {
        return None;
    }
    if let (Some(text), Some(url)) = (cta_text, cta_url) {
        frontmatter.call_to_action = Some(CallToAction { text, url });
    }

    let rest = text.lines().skip(consumed).collect::<Vec<_>>().join("\n");
    Some((frontmatter, rest.trim().to_string()))
}

/// Convert a text block that starts with a frontmatter section into a
/// frontmatter block, followed by a text block holding the remainder.
///
/// Returns the id of the new frontmatter block, or `None` when the text has
/// no frontmatter.
pub fn split_frontmatter(list: &mut BlockList, id: &BlockId) -> Result<Option<BlockId>, EditError> {
    let block = list
        .get(id)
        .ok_or_else(|| EditError::BlockNotFound(id.clone()))?;
    let BlockBody::Text(text) = &block.body else {
        return Err(EditError::KindMismatch {
            id: id.clone(),
            expected: BlockKind::Text,
            found: block.kind(),
        });
    };
    let Some((frontmatter, rest)) = detect_frontmatter(&text.content) else {
        return Ok(None);
    };

    // `rest` is the trimmed tail of the content, so marks over it move back
    // by the consumed prefix and marks over the fence section are dropped.
    let offset = text.content.trim_end().len().saturating_sub(rest.len());
    let mut remainder = text.clone();
    remainder.formatting.annotations = text
        .formatting
        .annotations
        .iter()
        .filter(|annotation| annotation.start >= offset)
        .map(|annotation| {
            let mut shifted = annotation.clone();
            shifted.start -= offset;
            shifted.end -= offset;
            shifted
        })
        .filter(|annotation| annotation.fits(&rest))
        .collect();
    remainder.content = rest;
    let frontmatter_id = list.replace(id, BlockBody::Frontmatter(frontmatter))?;
    if !remainder.content.is_empty() {
        list.insert_after(
            &frontmatter_id,
            vec![ContentBlock::new(BlockBody::Text(remainder))],
        )?;
    }
    Ok(Some(frontmatter_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Annotation, Mark, TextBlock};
    use pretty_assertions::assert_eq;

    const ARTICLE: &str = "---\ntitle: \"Road test: the new GT\"\nauthor: Sam Lee\ntags: [cars, reviews]\ncta_text: Book a drive\ncta_url: https://example.com/book\n---\nThe GT arrives this spring.";

    #[test]
    fn detects_known_keys() {
        let (frontmatter, rest) = detect_frontmatter(ARTICLE).unwrap();
        assert_eq!(frontmatter.title, "Road test: the new GT");
        assert_eq!(frontmatter.author.as_deref(), Some("Sam Lee"));
        assert_eq!(frontmatter.tags, vec!["cars", "reviews"]);
        assert_eq!(
            frontmatter.call_to_action,
            Some(CallToAction {
                text: "Book a drive".into(),
                url: "https://example.com/book".into()
            })
        );
        assert_eq!(rest, "The GT arrives this spring.");
    }

    #[test]
    fn ignores_text_without_fence_or_keys() {
        assert!(detect_frontmatter("title: no fence").is_none());
        assert!(detect_frontmatter("---\nfoo: bar\n---\nbody").is_none());
        assert!(detect_frontmatter("---\ntitle: never closed").is_none());
    }

    #[test]
    fn split_replaces_block_and_keeps_remainder() {
        let mut list = BlockList::new();
        list.push(ContentBlock::text("intro paragraph").with_id("a"))
            .unwrap();
        list.push(ContentBlock::text(ARTICLE).with_id("b")).unwrap();

        let new_id = split_frontmatter(&mut list, &BlockId::new("b"))
            .unwrap()
            .unwrap();

        assert_eq!(list.len(), 3);
        assert_eq!(list.position(&new_id), Some(1));
        assert_eq!(list.blocks()[1].kind(), BlockKind::Frontmatter);
        match &list.blocks()[2].body {
            BlockBody::Text(text) => assert_eq!(text.content, "The GT arrives this spring."),
            other => panic!("expected remainder text, got {other:?}"),
        }
        assert!(list.get(&BlockId::new("b")).is_none());
    }

    #[test]
    fn split_moves_annotations_onto_the_remainder() {
        let source = "---\ntitle: X\n---\nBody text here";
        let body_start = source.find("Body").unwrap();
        let mut text = TextBlock::new(source);
        text.formatting.annotations = vec![
            Annotation::new(4, 9, Mark::Bold),
            Annotation::new(body_start + 5, body_start + 9, Mark::Italic),
        ];
        let mut list = BlockList::new();
        list.push(ContentBlock::new(BlockBody::Text(text)).with_id("a"))
            .unwrap();

        split_frontmatter(&mut list, &BlockId::new("a")).unwrap();

        let BlockBody::Text(remainder) = &list.blocks()[1].body else {
            panic!("expected remainder text");
        };
        assert_eq!(remainder.content, "Body text here");
        assert_eq!(
            remainder.formatting.annotations,
            vec![Annotation::new(5, 9, Mark::Italic)]
        );
        assert_eq!(&remainder.content[5..9], "text");
    }

    #[test]
    fn split_without_frontmatter_is_a_no_op() {
        let mut list = BlockList::new();
        list.push(ContentBlock::text("plain").with_id("a")).unwrap();
        assert_eq!(split_frontmatter(&mut list, &BlockId::new("a")).unwrap(), None);
        assert_eq!(list.len(), 1);
    }
}
