//! Composer shell: the editing session for one composition.
//!
//! The committed block array is shared as `Arc<Vec<ContentBlock>>` and
//! replaced wholesale on every change, which is what lets [`RenderCache`]
//! skip re-rendering by pointer comparison. A drag in progress is kept as a
//! separate draft array and only committed on drop.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::editing::{
    self, AssistField, BlockList, BlockUpdate, EditError, ImageAnalyzer, PasteOutcome,
    ValidationHint,
};
use crate::export::{ExportTarget, HtmlExportOptions, MdxExportOptions, export_html, export_mdx};
use crate::import;
use crate::models::{
    BlockBody, BlockId, BlockKind, Composition, CompositionId, CompositionKind, CompositionMetadata,
    ContentBlock, Frontmatter, ImageBlock,
};
use crate::net::{LatestRequest, ProgressCallback, RequestTicket, RetryPolicy};
use crate::notify::Notifier;
use crate::render::{
    EmailContainerConfig, EmailPlatform, RenderCache, RenderMode, RenderOutput, RenderRequest,
};
use crate::store::{self, CompositionStore, ImageStore, StoreError, StylesheetStore};
use crate::stylesheet::{StylesheetData, StylesheetState};

/// Which composer is editing; decides the initial preview mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ComposerKind {
    #[default]
    Block,
    Email,
    News,
}

impl ComposerKind {
    pub fn default_mode(&self) -> RenderMode {
        match self {
            ComposerKind::Block => RenderMode::Clean,
            ComposerKind::Email => RenderMode::Email,
            ComposerKind::News => RenderMode::NewsArticle,
        }
    }
}

impl From<CompositionKind> for ComposerKind {
    fn from(kind: CompositionKind) -> Self {
        match kind {
            CompositionKind::Block => ComposerKind::Block,
            CompositionKind::Email => ComposerKind::Email,
            CompositionKind::News => ComposerKind::News,
        }
    }
}

impl From<ComposerKind> for CompositionKind {
    fn from(kind: ComposerKind) -> Self {
        match kind {
            ComposerKind::Block => CompositionKind::Block,
            ComposerKind::Email => CompositionKind::Email,
            ComposerKind::News => CompositionKind::News,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging { id: BlockId, over_index: usize },
}

#[derive(Debug, Error)]
pub enum ComposerError {
    #[error(transparent)]
    Edit(#[from] EditError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("No drag in progress")]
    NotDragging,
    #[error("Stylesheet '{0}' is not loaded")]
    StylesheetNotReady(String),
}

#[derive(Debug)]
pub struct Composer {
    kind: ComposerKind,
    composition_id: Option<CompositionId>,
    name: String,
    template: Option<String>,
    metadata: CompositionMetadata,
    blocks: Arc<Vec<ContentBlock>>,
    active_block_id: Option<BlockId>,
    drag: DragState,
    draft: Option<Arc<Vec<ContentBlock>>>,
    preview_mode: RenderMode,
    email_container: EmailContainerConfig,
    stylesheet: LatestRequest<StylesheetState>,
    stylesheet_error: Option<String>,
    cache: RenderCache,
    notifier: Notifier,
    dirty: bool,
}

impl Composer {
    pub fn new(kind: ComposerKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            composition_id: None,
            name: name.into(),
            template: None,
            metadata: CompositionMetadata::default(),
            blocks: Arc::new(Vec::new()),
            active_block_id: None,
            drag: DragState::Idle,
            draft: None,
            preview_mode: kind.default_mode(),
            email_container: EmailContainerConfig::default(),
            stylesheet: LatestRequest::new(),
            stylesheet_error: None,
            cache: RenderCache::new(),
            notifier: Notifier::new(),
            dirty: false,
        }
    }

    /// Open an existing (or duplicated) composition.
    pub fn from_composition(composition: Composition) -> Self {
        let kind = ComposerKind::from(composition.kind);
        let mut composer = Self::new(kind, composition.name);
        composer.composition_id = composition.id;
        composer.template = composition.template;
        composer.metadata = composition.metadata;
        composer.blocks = Arc::new(BlockList::from_blocks(composition.blocks).into_vec());
        composer
    }

    /// Load composition `id` from `store`. Failures are posted to the
    /// notifier as well as returned.
    pub fn load(
        store: &dyn CompositionStore,
        id: &CompositionId,
        notifier: &Notifier,
    ) -> Result<Self, StoreError> {
        match store.get(id) {
            Ok(composition) => {
                let mut composer = Self::from_composition(composition);
                composer.notifier = notifier.clone();
                Ok(composer)
            }
            Err(err) => {
                notifier.error(format!("Failed to load composition: {err}"));
                Err(err)
            }
        }
    }

    /// Snapshot of the session as a composition record.
    pub fn to_composition(&self) -> Composition {
        Composition {
            id: self.composition_id.clone(),
            name: self.name.clone(),
            kind: self.kind.into(),
            blocks: self.blocks.as_ref().clone(),
            template: self.template.clone(),
            metadata: self.metadata.clone(),
        }
    }

    pub fn kind(&self) -> ComposerKind {
        self.kind
    }

    pub fn composition_id(&self) -> Option<&CompositionId> {
        self.composition_id.as_ref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.dirty = true;
    }

    pub fn metadata(&self) -> &CompositionMetadata {
        &self.metadata
    }

    pub fn set_frontmatter(&mut self, frontmatter: Option<Frontmatter>) {
        self.metadata.frontmatter = frontmatter;
        self.dirty = true;
    }

    pub fn set_gallery(&mut self, gallery_id: Option<String>, carousel_id: Option<String>) {
        self.metadata.gallery_id = gallery_id;
        self.metadata.carousel_id = carousel_id;
        self.dirty = true;
    }

    pub fn blocks(&self) -> &Arc<Vec<ContentBlock>> {
        &self.blocks
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn with_notifier(mut self, notifier: Notifier) -> Self {
        self.notifier = notifier;
        self
    }

    /// Whether there are changes since the last save or load.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn active_block_id(&self) -> Option<&BlockId> {
        self.active_block_id.as_ref()
    }

    /// Select the block new blocks are inserted above. Unknown ids clear
    /// the selection.
    pub fn set_active(&mut self, id: Option<BlockId>) {
        self.active_block_id = id.filter(|id| self.blocks.iter().any(|block| &block.id == id));
    }

    fn edit<T>(
        &mut self,
        change: impl FnOnce(&mut BlockList) -> Result<T, EditError>,
    ) -> Result<T, EditError> {
        let mut list = BlockList::from_blocks(self.blocks.as_ref().clone());
        let result = change(&mut list)?;
        self.blocks = Arc::new(list.into_vec());
        self.dirty = true;
        Ok(result)
    }

    /// Insert a block above the active block, or at the end without one.
    /// The new block becomes active.
    pub fn add_block(&mut self, body: BlockBody) -> Result<BlockId, EditError> {
        let anchor = self.active_block_id.clone();
        let id = self.edit(|list| list.insert_before(anchor.as_ref(), ContentBlock::new(body)))?;
        self.active_block_id = Some(id.clone());
        Ok(id)
    }

    fn add_blocks(&mut self, blocks: Vec<ContentBlock>) -> Result<Vec<BlockId>, EditError> {
        let anchor = self.active_block_id.clone();
        self.edit(|list| {
            let mut ids = Vec::with_capacity(blocks.len());
            for block in blocks {
                ids.push(list.insert_before(anchor.as_ref(), block)?);
            }
            Ok(ids)
        })
    }

    pub fn remove_block(&mut self, id: &BlockId) -> Result<ContentBlock, EditError> {
        let removed = self.edit(|list| list.remove(id))?;
        if self.active_block_id.as_ref() == Some(id) {
            self.active_block_id = None;
        }
        Ok(removed)
    }

    pub fn update_block(&mut self, id: &BlockId, update: &BlockUpdate) -> Result<(), EditError> {
        self.edit(|list| list.update(id, update))
    }

    /// Replace a block with one of another type at the same position.
    pub fn convert_block(&mut self, id: &BlockId, body: BlockBody) -> Result<BlockId, EditError> {
        let new_id = self.edit(|list| list.replace(id, body))?;
        if self.active_block_id.as_ref() == Some(id) {
            self.active_block_id = Some(new_id.clone());
        }
        Ok(new_id)
    }

    pub fn move_block(&mut self, id: &BlockId, to_index: usize) -> Result<(), EditError> {
        self.edit(|list| list.move_block(id, to_index))
    }

    /// Paste `text` into the text block `target`.
    ///
    /// The committed array is only replaced when the paste is intercepted.
    pub fn paste(&mut self, target: &BlockId, text: &str) -> Result<PasteOutcome, EditError> {
        let mut list = BlockList::from_blocks(self.blocks.as_ref().clone());
        let outcome = editing::apply_paste(&mut list, target, text)?;
        if matches!(outcome, PasteOutcome::Intercepted { .. }) {
            self.blocks = Arc::new(list.into_vec());
            self.dirty = true;
        }
        Ok(outcome)
    }

    /// Set the URL of a video block. The URL is kept even when it cannot be
    /// parsed; the hint says why.
    pub fn set_video_url(
        &mut self,
        id: &BlockId,
        url: &str,
    ) -> Result<Option<ValidationHint>, EditError> {
        let video = match self.blocks.iter().find(|block| &block.id == id) {
            Some(ContentBlock {
                body: BlockBody::Video(video),
                ..
            }) => video.clone(),
            Some(block) => {
                return Err(EditError::KindMismatch {
                    id: id.clone(),
                    expected: BlockKind::Video,
                    found: block.kind(),
                });
            }
            None => return Err(EditError::BlockNotFound(id.clone())),
        };
        let (updated, hint) = editing::apply_video_url(&video, url);
        self.update_block(id, &BlockUpdate::body(BlockBody::Video(updated)))?;
        Ok(hint)
    }

    /// Fill alt text or caption of an image block from `analyzer`. Returns
    /// whether the block changed.
    pub fn assist_image(
        &mut self,
        id: &BlockId,
        field: AssistField,
        analyzer: &dyn ImageAnalyzer,
    ) -> Result<bool, EditError> {
        let block = self
            .blocks
            .iter()
            .find(|block| &block.id == id)
            .ok_or_else(|| EditError::BlockNotFound(id.clone()))?;
        match editing::assist_image_field(block, field, analyzer, &self.notifier) {
            Some(update) => {
                self.update_block(id, &update)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Turn a text block that starts with `---` metadata into a frontmatter
    /// block. Returns the new block id, if any.
    pub fn extract_frontmatter(&mut self, id: &BlockId) -> Result<Option<BlockId>, EditError> {
        let has_frontmatter = match self.blocks.iter().find(|block| &block.id == id) {
            Some(ContentBlock {
                body: BlockBody::Text(text),
                ..
            }) => editing::detect_frontmatter(&text.content).is_some(),
            _ => true,
        };
        if !has_frontmatter {
            return Ok(None);
        }
        let new_id = self.edit(|list| editing::split_frontmatter(list, id))?;
        if new_id.is_some() && self.active_block_id.as_ref() == Some(id) {
            self.active_block_id = new_id.clone();
        }
        Ok(new_id)
    }

    /// Insert blocks parsed from markdown at the insertion point.
    pub fn import_markdown(&mut self, markdown: &str) -> Result<Vec<BlockId>, EditError> {
        self.add_blocks(import::blocks_from_markdown(markdown))
    }

    /// Insert blocks split from plain copy at the insertion point.
    pub fn import_copy(&mut self, text: &str) -> Result<Vec<BlockId>, EditError> {
        self.add_blocks(import::split_source_text(text))
    }

    /// Upload an image and insert an image block pointing at it.
    pub fn insert_image(
        &mut self,
        images: &mut dyn ImageStore,
        file_name: &str,
        bytes: &[u8],
        progress: &mut ProgressCallback<'_>,
    ) -> Result<BlockId, ComposerError> {
        let stored = match images.upload(file_name, bytes, progress) {
            Ok(stored) => stored,
            Err(err) => {
                self.notifier
                    .error(format!("Failed to upload {file_name}: {err}"));
                return Err(err.into());
            }
        };
        let alt = file_name.rsplit_once('.').map_or(file_name, |(stem, _)| stem);
        Ok(self.add_block(BlockBody::Image(ImageBlock::new(stored.url, alt)))?)
    }

    pub fn drag_state(&self) -> &DragState {
        &self.drag
    }

    pub fn begin_drag(&mut self, id: &BlockId) -> Result<(), EditError> {
        let index = self
            .blocks
            .iter()
            .position(|block| &block.id == id)
            .ok_or_else(|| EditError::BlockNotFound(id.clone()))?;
        self.drag = DragState::Dragging {
            id: id.clone(),
            over_index: index,
        };
        self.draft = None;
        Ok(())
    }

    /// Move the dragged block over `index` in the draft only.
    pub fn drag_over(&mut self, index: usize) -> Result<(), ComposerError> {
        let DragState::Dragging { id, over_index } = &mut self.drag else {
            return Err(ComposerError::NotDragging);
        };
        let index = index.min(self.blocks.len().saturating_sub(1));
        if *over_index == index && self.draft.is_some() {
            return Ok(());
        }
        *over_index = index;
        let mut list = BlockList::from_blocks(self.blocks.as_ref().clone());
        list.move_block(id, index)?;
        self.draft = Some(Arc::new(list.into_vec()));
        Ok(())
    }

    /// The order being previewed: the draft while dragging, the committed
    /// array otherwise.
    pub fn preview_order(&self) -> Arc<Vec<ContentBlock>> {
        match (&self.drag, &self.draft) {
            (DragState::Dragging { .. }, Some(draft)) => Arc::clone(draft),
            _ => Arc::clone(&self.blocks),
        }
    }

    /// Commit the draft order. Returns whether the order changed.
    pub fn drop_drag(&mut self) -> Result<bool, ComposerError> {
        let DragState::Dragging { id, over_index } = std::mem::take(&mut self.drag) else {
            return Err(ComposerError::NotDragging);
        };
        self.draft = None;
        let from = self.blocks.iter().position(|block| block.id == id);
        if from == Some(over_index) {
            return Ok(false);
        }
        self.move_block(&id, over_index)?;
        Ok(true)
    }

    pub fn cancel_drag(&mut self) {
        self.drag = DragState::Idle;
        self.draft = None;
    }

    pub fn preview_mode(&self) -> RenderMode {
        self.preview_mode
    }

    pub fn set_preview_mode(&mut self, mode: RenderMode) {
        self.preview_mode = mode;
    }

    pub fn email_container(&self) -> &EmailContainerConfig {
        &self.email_container
    }

    pub fn set_email_container(&mut self, config: EmailContainerConfig) {
        self.email_container = config;
    }

    pub fn set_email_platform(&mut self, platform: EmailPlatform) {
        self.email_container.platform = platform;
    }

    /// Choose the stylesheet for this composition. The data must then be
    /// supplied through [`load_stylesheet`](Self::load_stylesheet) or the
    /// ticketed pair [`begin_stylesheet_load`](Self::begin_stylesheet_load)
    /// and [`finish_stylesheet_load`](Self::finish_stylesheet_load).
    pub fn select_stylesheet(&mut self, id: Option<String>) {
        if self.metadata.selected_stylesheet_id != id {
            self.metadata.selected_stylesheet_id = id;
            self.stylesheet = LatestRequest::new();
            self.stylesheet_error = None;
            self.dirty = true;
        }
    }

    pub fn stylesheet_state(&self) -> StylesheetState {
        if self.metadata.selected_stylesheet_id.is_none() {
            return StylesheetState::NotSelected;
        }
        if self.stylesheet.is_loading() {
            return StylesheetState::Loading;
        }
        match (self.stylesheet.value(), &self.stylesheet_error) {
            (Some(state), _) => state.clone(),
            (None, Some(reason)) => StylesheetState::Failed(reason.clone()),
            (None, None) => StylesheetState::Loading,
        }
    }

    pub fn begin_stylesheet_load(&mut self) -> RequestTicket {
        self.stylesheet_error = None;
        self.stylesheet.begin()
    }

    /// Apply a fetched stylesheet unless a newer fetch was started since.
    ///
    /// A failed reload keeps the previously loaded data.
    pub fn finish_stylesheet_load(
        &mut self,
        ticket: RequestTicket,
        result: Result<StylesheetData, StoreError>,
    ) -> bool {
        match result {
            Ok(data) => self.stylesheet.complete(ticket, StylesheetState::ready(data)),
            Err(err) => {
                let applied = self.stylesheet.fail(ticket);
                if applied {
                    self.stylesheet_error = Some(err.to_string());
                    self.notifier.error(format!("Failed to load stylesheet: {err}"));
                }
                applied
            }
        }
    }

    pub fn load_stylesheet(&mut self, store: &dyn StylesheetStore) -> bool {
        let Some(id) = self.metadata.selected_stylesheet_id.clone() else {
            return false;
        };
        let ticket = self.begin_stylesheet_load();
        self.finish_stylesheet_load(ticket, store.get(&id))
    }

    pub fn render_request(&self) -> RenderRequest {
        RenderRequest::new(self.preview_mode, self.preview_order())
            .with_name(self.name.clone())
            .with_frontmatter(self.metadata.frontmatter.clone())
            .with_stylesheet(self.stylesheet_state())
            .with_email_container(self.email_container.clone())
    }

    /// Preview of the current (or draft) order in the current mode.
    pub fn preview(&mut self) -> &RenderOutput {
        let request = self.render_request();
        self.cache.render(&request)
    }

    pub fn render_cache(&self) -> &RenderCache {
        &self.cache
    }

    /// Create the composition when it has no identity yet, update it
    /// otherwise. On failure the session is left untouched.
    pub fn save(&mut self, store: &mut dyn CompositionStore) -> Result<CompositionId, StoreError> {
        let mut composition = self.to_composition();
        let result = match &composition.id {
            None => store.create(&mut composition),
            Some(id) => {
                let id = id.clone();
                store.update(&mut composition).map(|()| id)
            }
        };
        match result {
            Ok(id) => {
                self.composition_id = Some(id.clone());
                self.metadata.created_at = composition.metadata.created_at;
                self.metadata.updated_at = composition.metadata.updated_at;
                self.dirty = false;
                self.notifier.success(format!("Saved '{}'", self.name));
                Ok(id)
            }
            Err(err) => {
                self.notifier.error(format!("Failed to save '{}': {err}", self.name));
                Err(err)
            }
        }
    }

    /// A new unsaved session holding a copy of this one.
    pub fn duplicate(&self) -> Composer {
        Composer::from_composition(self.to_composition().duplicate())
            .with_notifier(self.notifier.clone())
    }

    /// Delete the saved composition, retrying transient failures.
    pub fn delete(
        &mut self,
        store: &mut dyn CompositionStore,
        policy: &RetryPolicy,
        sleep: impl FnMut(Duration),
    ) -> Result<(), StoreError> {
        let Some(id) = self.composition_id.clone() else {
            return Err(StoreError::MissingId);
        };
        match store::delete_with_retry(store, &id, policy, sleep) {
            Ok(()) => {
                self.composition_id = None;
                self.notifier.success(format!("Deleted '{}'", self.name));
                Ok(())
            }
            Err(err) => {
                self.notifier
                    .error(format!("Failed to delete '{}': {err}", self.name));
                Err(err)
            }
        }
    }

    /// The stylesheet to export with. Exports are refused while a selected
    /// stylesheet is not ready, rather than written without its classes.
    fn committed_stylesheet(&self) -> Result<Option<StylesheetData>, ComposerError> {
        let state = self.stylesheet_state();
        if !state.is_renderable() {
            let id = self.metadata.selected_stylesheet_id.clone().unwrap_or_default();
            return Err(ComposerError::StylesheetNotReady(id));
        }
        Ok(state.data().cloned())
    }

    pub fn export_web_html(&self) -> Result<String, ComposerError> {
        let options = HtmlExportOptions {
            target: match self.kind {
                ComposerKind::News => ExportTarget::Article,
                ComposerKind::Block | ComposerKind::Email => ExportTarget::Web,
            },
            title: Some(self.name.clone()),
            stylesheet: self.committed_stylesheet()?,
            frontmatter: self.metadata.frontmatter.clone(),
            ..HtmlExportOptions::default()
        };
        Ok(export_html(&self.blocks, &options))
    }

    pub fn export_email_html(&self) -> Result<String, ComposerError> {
        let options = HtmlExportOptions {
            title: Some(self.name.clone()),
            stylesheet: self.committed_stylesheet()?,
            ..HtmlExportOptions::email(self.email_container.clone())
        };
        Ok(export_html(&self.blocks, &options))
    }

    pub fn export_mdx(&self) -> String {
        export_mdx(
            &self.blocks,
            &MdxExportOptions {
                frontmatter: self.metadata.frontmatter.clone(),
                gallery_id: self.metadata.gallery_id.clone(),
                carousel_id: self.metadata.carousel_id.clone(),
            },
        )
    }
}
