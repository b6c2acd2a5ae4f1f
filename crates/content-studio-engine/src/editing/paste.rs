//! Paste interception for the text and heading editors.
//!
//! Pasting copy that contains markdown `##` headers fans out into one block
//! per header and one paragraph per remaining substantial line, inserted
//! right after the block being edited.

use crate::models::{BlockBody, BlockId, BlockKind, ContentBlock};

use super::{BlockList, EditError};

/// Lines shorter than this (in chars, after trimming) are dropped as noise.
const MIN_PARAGRAPH_CHARS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasteOutcome {
    /// The paste was split into new blocks with these ids, in order.
    Intercepted { inserted: Vec<BlockId> },
    /// No header lines; the editor should handle the paste itself.
    NotIntercepted,
}

fn header_level(line: &str) -> Option<(u8, &str)> {
    let hashes = line.chars().take_while(|&c| c == '#').count();
    if hashes < 2 {
        return None;
    }
    let level = u8::try_from(hashes.min(6)).unwrap_or(6);
    Some((level, line[hashes..].trim()))
}

/// Split pasted text into blocks, or `None` when it has no `##` lines.
pub fn split_markdown_paste(text: &str) -> Option<Vec<ContentBlock>> {
    let lines: Vec<&str> = text.lines().map(str::trim).collect();
    if !lines.iter().any(|line| header_level(line).is_some()) {
        return None;
    }

    let blocks = lines
        .into_iter()
        .filter_map(|line| match header_level(line) {
            Some((_, "")) => None,
            Some((level, title)) => Some(ContentBlock::heading(level, title)),
            None if line.chars().count() > MIN_PARAGRAPH_CHARS => Some(ContentBlock::text(line)),
            None => None,
        })
        .collect();
    Some(blocks)
}

/// Intercept a paste into the text block `target`.
///
/// On interception the new blocks are inserted right after `target`, which
/// itself is left as it was, and the whole list is renumbered.
pub fn apply_paste(
    list: &mut BlockList,
    target: &BlockId,
    text: &str,
) -> Result<PasteOutcome, EditError> {
    let block = list
        .get(target)
        .ok_or_else(|| EditError::BlockNotFound(target.clone()))?;
    if !matches!(block.body, BlockBody::Text(_)) {
        return Err(EditError::KindMismatch {
            id: target.clone(),
            expected: BlockKind::Text,
            found: block.kind(),
        });
    }

    let Some(blocks) = split_markdown_paste(text) else {
        return Ok(PasteOutcome::NotIntercepted);
    };
    log::debug!(
        "Paste into {target} split into {} blocks",
        blocks.len()
    );
    let inserted = list.insert_after(target, blocks)?;
    Ok(PasteOutcome::Intercepted { inserted })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::models::{TextBlock, TextElement};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn summary(blocks: &[ContentBlock]) -> Vec<(String, String)> {
        blocks
            .iter()
            .map(|block| match &block.body {
                BlockBody::Text(TextBlock {
                    content, element, ..
                }) => (element.tag().to_string(), content.clone()),
                other => (other.type_name().to_string(), String::new()),
            })
            .collect()
    }

    #[test]
    fn splits_headers_and_long_lines() {
        let blocks = split_markdown_paste("## A\ntext line here\n## B").unwrap();
        assert_eq!(
            summary(&blocks),
            vec![
                ("h2".to_string(), "A".to_string()),
                ("p".to_string(), "text line here".to_string()),
                ("h2".to_string(), "B".to_string()),
            ]
        );
    }

    #[rstest]
    #[case("just a normal paste without headers")]
    #[case("# Single hash is not a header for this purpose")]
    #[case("")]
    fn plain_text_is_not_intercepted(#[case] text: &str) {
        assert!(split_markdown_paste(text).is_none());
    }

    #[test]
    fn short_lines_and_empty_headers_are_dropped() {
        let blocks = split_markdown_paste("##\n## Title\nshort\n\nexactly10!\nthis one is long enough")
            .unwrap();
        assert_eq!(
            summary(&blocks),
            vec![
                ("h2".to_string(), "Title".to_string()),
                ("p".to_string(), "this one is long enough".to_string()),
            ]
        );
    }

    #[test]
    fn deeper_headers_keep_their_level() {
        let blocks = split_markdown_paste("### Sub\n######## Deep").unwrap();
        let elements: Vec<TextElement> = blocks
            .iter()
            .map(|b| match &b.body {
                BlockBody::Text(text) => text.element,
                _ => TextElement::P,
            })
            .collect();
        assert_eq!(elements, vec![TextElement::H3, TextElement::H6]);
    }

    #[test]
    fn fresh_ids_for_every_block() {
        let blocks = split_markdown_paste("## A\n## A\n## A").unwrap();
        let ids: BTreeSet<&BlockId> = blocks.iter().map(|b| &b.id).collect();
        assert_eq!(blocks.len(), 3);
        assert_eq!(ids.len(), blocks.len());
    }

    #[test]
    fn apply_paste_inserts_after_target_and_renumbers() {
        let mut list = BlockList::new();
        for id in ["first", "target", "last"] {
            list.push(ContentBlock::text(id).with_id(id)).unwrap();
        }

        let outcome = apply_paste(
            &mut list,
            &BlockId::new("target"),
            "## A\ntext line here\n## B",
        )
        .unwrap();

        let PasteOutcome::Intercepted { inserted } = outcome else {
            panic!("paste should be intercepted");
        };
        assert_eq!(inserted.len(), 3);
        let order: Vec<&BlockId> = list.blocks().iter().map(|b| &b.id).collect();
        assert_eq!(order[0].as_str(), "first");
        assert_eq!(order[1].as_str(), "target");
        assert_eq!(order[2..5].to_vec(), inserted.iter().collect::<Vec<_>>());
        assert_eq!(order[5].as_str(), "last");
        for (index, block) in list.blocks().iter().enumerate() {
            assert_eq!(block.order, index);
        }
        assert_eq!(
            list.blocks()
                .iter()
                .filter(|b| b.id.as_str() == "target")
                .count(),
            1
        );
    }

    #[test]
    fn apply_paste_without_headers_leaves_list_alone() {
        let mut list = BlockList::new();
        list.push(ContentBlock::text("x").with_id("t")).unwrap();
        let before = list.clone();

        let outcome = apply_paste(&mut list, &BlockId::new("t"), "plain paste").unwrap();

        assert_eq!(outcome, PasteOutcome::NotIntercepted);
        assert_eq!(list, before);
    }

    #[test]
    fn apply_paste_rejects_non_text_target() {
        let mut list = BlockList::new();
        list.push(ContentBlock::image("a.png", "").with_id("img"))
            .unwrap();
        let result = apply_paste(&mut list, &BlockId::new("img"), "## A");
        assert!(matches!(result, Err(EditError::KindMismatch { .. })));
    }
}
