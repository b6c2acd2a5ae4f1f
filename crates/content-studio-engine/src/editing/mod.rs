//! Block editing operations.
//!
//! Every editor surface funnels its changes through [`BlockList`], which owns
//! the ordered block array and renumbers `order` after each mutation so it
//! always equals the array index. Editors never touch `id`, `order` or the
//! body kind; a kind change is a [`BlockList::replace`].

pub mod assist;
pub mod frontmatter;
pub mod paste;
pub mod video;

use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;

use crate::models::{BlockBody, BlockId, BlockKind, ContentBlock};

pub use assist::{AnalysisError, AssistField, ImageAnalyzer, assist_image_field};
pub use frontmatter::{detect_frontmatter, split_frontmatter};
pub use paste::{PasteOutcome, apply_paste, split_markdown_paste};
pub use video::{ParsedVideo, ValidationHint, apply_video_url, parse_video_url};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("Block not found: {0}")]
    BlockNotFound(BlockId),
    #[error("Block id already present: {0}")]
    DuplicateId(BlockId),
    #[error("Block {id} is a {found} block, update was for {expected}")]
    KindMismatch {
        id: BlockId,
        expected: BlockKind,
        found: BlockKind,
    },
}

/// Partial update of a single block, the `Partial<Block>` an editor emits.
///
/// Applying the same update twice leaves the block as after the first
/// application: bodies and styles are replaced, metadata entries are merged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockUpdate {
    pub body: Option<BlockBody>,
    pub styles: Option<BTreeMap<String, Value>>,
    pub metadata: Option<BTreeMap<String, Value>>,
    pub css_class_name: Option<Option<String>>,
}

impl BlockUpdate {
    pub fn body(body: BlockBody) -> Self {
        Self {
            body: Some(body),
            ..Self::default()
        }
    }

    pub fn css_class(class_name: Option<String>) -> Self {
        Self {
            css_class_name: Some(class_name),
            ..Self::default()
        }
    }

    pub fn with_styles(mut self, styles: BTreeMap<String, Value>) -> Self {
        self.styles = Some(styles);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Apply to `block`. Nothing is changed if the body kind does not match.
    pub fn apply_to(&self, block: &mut ContentBlock) -> Result<(), EditError> {
        if let Some(body) = &self.body
            && !body.same_kind(&block.body)
        {
            return Err(EditError::KindMismatch {
                id: block.id.clone(),
                expected: body.kind(),
                found: block.kind(),
            });
        }

        if let Some(body) = &self.body {
            block.body = body.clone();
        }
        if let Some(styles) = &self.styles {
            block.styles = styles.clone();
        }
        if let Some(metadata) = &self.metadata {
            block
                .metadata
                .extend(metadata.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        if let Some(class_name) = &self.css_class_name {
            block.css_class_name = class_name.clone();
        }
        Ok(())
    }
}

/// Ordered block array with dense `order` values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockList {
    blocks: Vec<ContentBlock>,
}

impl BlockList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take blocks in any order; they are stably sorted by `order` (ties keep
    /// their array position) and renumbered.
    pub fn from_blocks(mut blocks: Vec<ContentBlock>) -> Self {
        blocks.sort_by_key(|block| block.order);
        let mut list = Self { blocks };
        list.renumber();
        list
    }

    pub fn blocks(&self) -> &[ContentBlock] {
        &self.blocks
    }

    pub fn into_vec(self) -> Vec<ContentBlock> {
        self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn position(&self, id: &BlockId) -> Option<usize> {
        self.blocks.iter().position(|block| &block.id == id)
    }

    pub fn get(&self, id: &BlockId) -> Option<&ContentBlock> {
        self.blocks.iter().find(|block| &block.id == id)
    }

    fn require(&self, id: &BlockId) -> Result<usize, EditError> {
        self.position(id)
            .ok_or_else(|| EditError::BlockNotFound(id.clone()))
    }

    fn ensure_unique(&self, id: &BlockId) -> Result<(), EditError> {
        match self.position(id) {
            Some(_) => Err(EditError::DuplicateId(id.clone())),
            None => Ok(()),
        }
    }

    /// Insert at `index`, clamped to the end of the list.
    pub fn insert_at(&mut self, index: usize, block: ContentBlock) -> Result<BlockId, EditError> {
        self.ensure_unique(&block.id)?;
        let id = block.id.clone();
        let index = index.min(self.blocks.len());
        self.blocks.insert(index, block);
        self.renumber();
        Ok(id)
    }

    /// Insert immediately above `anchor`, or at the end when there is no
    /// anchor or it is not in the list.
    pub fn insert_before(
        &mut self,
        anchor: Option<&BlockId>,
        block: ContentBlock,
    ) -> Result<BlockId, EditError> {
        let index = anchor
            .and_then(|id| self.position(id))
            .unwrap_or(self.blocks.len());
        self.insert_at(index, block)
    }

    pub fn push(&mut self, block: ContentBlock) -> Result<BlockId, EditError> {
        self.insert_at(self.blocks.len(), block)
    }

    /// Insert `blocks` in sequence right after `id`.
    pub fn insert_after(
        &mut self,
        id: &BlockId,
        blocks: Vec<ContentBlock>,
    ) -> Result<Vec<BlockId>, EditError> {
        let position = self.require(id)?;
        for block in &blocks {
            self.ensure_unique(&block.id)?;
        }
        let ids = blocks.iter().map(|block| block.id.clone()).collect();
        let tail = self.blocks.split_off(position + 1);
        self.blocks.extend(blocks);
        self.blocks.extend(tail);
        self.renumber();
        Ok(ids)
    }

    pub fn remove(&mut self, id: &BlockId) -> Result<ContentBlock, EditError> {
        let position = self.require(id)?;
        let removed = self.blocks.remove(position);
        self.renumber();
        Ok(removed)
    }

    /// Move a block so it ends up at `to_index` in the resulting array.
    pub fn move_block(&mut self, id: &BlockId, to_index: usize) -> Result<(), EditError> {
        let from = self.require(id)?;
        let block = self.blocks.remove(from);
        let to_index = to_index.min(self.blocks.len());
        self.blocks.insert(to_index, block);
        self.renumber();
        Ok(())
    }

    /// Replace a block with a new block of (usually) another type at the same
    /// position. The replacement gets a fresh id; its id is returned.
    pub fn replace(&mut self, id: &BlockId, body: BlockBody) -> Result<BlockId, EditError> {
        let position = self.require(id)?;
        let replacement = ContentBlock::new(body);
        let new_id = replacement.id.clone();
        self.blocks[position] = replacement;
        self.renumber();
        Ok(new_id)
    }

    pub fn update(&mut self, id: &BlockId, update: &BlockUpdate) -> Result<(), EditError> {
        let position = self.require(id)?;
        update.apply_to(&mut self.blocks[position])
    }

    fn renumber(&mut self) {
        for (index, block) in self.blocks.iter_mut().enumerate() {
            block.order = index;
        }
    }
}

impl From<Vec<ContentBlock>> for BlockList {
    fn from(blocks: Vec<ContentBlock>) -> Self {
        Self::from_blocks(blocks)
    }
}
