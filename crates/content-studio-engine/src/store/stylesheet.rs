use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::stylesheet::StylesheetData;

use super::StoreError;
use super::file::validate_id;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StylesheetSummary {
    pub id: String,
    pub name: String,
}

pub trait StylesheetStore {
    fn list(&self) -> Result<Vec<StylesheetSummary>, StoreError>;

    fn get(&self, id: &str) -> Result<StylesheetData, StoreError>;
}

/// Stylesheets in a directory: `<id>.json` records, or plain `<id>.css`
/// files whose class rules are parsed on load. JSON wins when both exist.
#[derive(Debug, Clone)]
pub struct FileStylesheetStore {
    root: PathBuf,
}

impl FileStylesheetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn load(&self, id: &str, path: &Path) -> Result<StylesheetData, StoreError> {
        let content = fs::read_to_string(path)?;
        if path.extension().is_some_and(|ext| ext == "css") {
            return Ok(StylesheetData::from_css(id, id, &content));
        }
        let mut data: StylesheetData =
            serde_json::from_str(&content).map_err(|source| StoreError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        if data.id.is_empty() {
            data.id = id.to_string();
        }
        if data.name.is_empty() {
            data.name = data.id.clone();
        }
        Ok(data)
    }
}

impl StylesheetStore for FileStylesheetStore {
    fn list(&self) -> Result<Vec<StylesheetSummary>, StoreError> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut ids: Vec<String> = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if !path
                .extension()
                .is_some_and(|ext| ext == "json" || ext == "css")
            {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str())
                && !ids.iter().any(|id| id == stem)
            {
                ids.push(stem.to_string());
            }
        }
        ids.sort();

        let mut summaries = Vec::new();
        for id in ids {
            match self.get(&id) {
                Ok(data) => summaries.push(StylesheetSummary {
                    id: data.id,
                    name: data.name,
                }),
                Err(err) => log::warn!("Skipping stylesheet {id}: {err}"),
            }
        }
        Ok(summaries)
    }

    fn get(&self, id: &str) -> Result<StylesheetData, StoreError> {
        validate_id(id)?;
        for extension in ["json", "css"] {
            let path = self.root.join(format!("{id}.{extension}"));
            if path.exists() {
                return self.load(id, &path);
            }
        }
        Err(StoreError::NotFound(format!("stylesheet {id}")))
    }
}
