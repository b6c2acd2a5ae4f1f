use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::models::{Composition, CompositionId};

use super::{CompositionStore, CompositionSummary, StoreError, sort_summaries};

const EXTENSION: &str = "json";

/// Compositions stored as pretty JSON, one `<id>.json` file each.
#[derive(Debug, Clone)]
pub struct FileCompositionStore {
    root: PathBuf,
}

/// Ids become file names, so only a conservative character set is allowed.
pub(crate) fn validate_id(id: &str) -> Result<(), StoreError> {
    let valid = !id.is_empty()
        && id.len() <= 128
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidId(id.to_string()))
    }
}

impl FileCompositionStore {
    /// Store rooted at `root`; the directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, id: &CompositionId) -> Result<PathBuf, StoreError> {
        validate_id(id.as_str())?;
        Ok(self.root.join(format!("{}.{EXTENSION}", id.as_str())))
    }

    fn read(&self, path: &Path) -> Result<Composition, StoreError> {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|source| StoreError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn write(&self, id: &CompositionId, composition: &Composition) -> Result<(), StoreError> {
        let path = self.path_for(id)?;
        fs::create_dir_all(&self.root)?;
        let json = serde_json::to_string_pretty(composition)?;
        // Write then rename so a crash never leaves a half-written record.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;
        log::debug!("Saved composition {id} to {}", path.display());
        Ok(())
    }
}

impl CompositionStore for FileCompositionStore {
    fn list(&self) -> Result<Vec<CompositionSummary>, StoreError> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut summaries = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().is_none_or(|ext| ext != EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            let id = CompositionId::new(stem);
            match self.read(&path) {
                Ok(composition) => summaries.push(CompositionSummary::of(id, &composition)),
                Err(err) => log::warn!("Skipping unreadable composition: {err}"),
            }
        }
        sort_summaries(&mut summaries);
        Ok(summaries)
    }

    fn get(&self, id: &CompositionId) -> Result<Composition, StoreError> {
        let path = self.path_for(id)?;
        if !path.exists() {
            return Err(StoreError::NotFound(id.to_string()));
        }
        let mut composition = self.read(&path)?;
        // The file name is authoritative.
        composition.id = Some(id.clone());
        Ok(composition)
    }

    fn create(&mut self, composition: &mut Composition) -> Result<CompositionId, StoreError> {
        if let Some(id) = &composition.id {
            return Err(StoreError::AlreadyPersisted(id.clone()));
        }
        let id = CompositionId::generate();
        composition.id = Some(id.clone());
        composition.touch(Utc::now());
        if let Err(err) = self.write(&id, composition) {
            composition.id = None;
            return Err(err);
        }
        log::info!("Created composition '{}' ({id})", composition.name);
        Ok(id)
    }

    fn update(&mut self, composition: &mut Composition) -> Result<(), StoreError> {
        let id = composition.id.clone().ok_or(StoreError::MissingId)?;
        if !self.path_for(&id)?.exists() {
            return Err(StoreError::NotFound(id.to_string()));
        }
        composition.touch(Utc::now());
        self.write(&id, composition)
    }

    fn delete(&mut self, id: &CompositionId) -> Result<(), StoreError> {
        let path = self.path_for(id)?;
        if !path.exists() {
            return Err(StoreError::NotFound(id.to_string()));
        }
        fs::remove_file(&path)?;
        log::info!("Deleted composition {id}");
        Ok(())
    }
}
