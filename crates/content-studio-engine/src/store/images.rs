use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::net::{ProgressCallback, UploadProgress};

use super::StoreError;

const CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub id: String,
    pub file_name: String,
    /// Address to put into an image block.
    pub url: String,
    pub size: u64,
}

/// Upload collaborator. Implementations call `progress` as bytes are
/// written, ending with `sent == total`.
pub trait ImageStore {
    fn upload(
        &mut self,
        file_name: &str,
        bytes: &[u8],
        progress: &mut ProgressCallback<'_>,
    ) -> Result<StoredImage, StoreError>;
}

/// Keeps uploads in a local directory and serves them under `base_url`.
#[derive(Debug, Clone)]
pub struct FileImageStore {
    root: PathBuf,
    base_url: String,
}

fn sanitize_file_name(name: &str) -> String {
    let name = Path::new(name)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("image");
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect();
    if cleaned.trim_matches('.').is_empty() {
        "image".to_string()
    } else {
        cleaned
    }
}

/// Write `bytes` in chunks, reporting progress after each one.
fn write_chunks(
    writer: &mut impl Write,
    bytes: &[u8],
    progress: &mut ProgressCallback<'_>,
) -> io::Result<()> {
    let total = bytes.len() as u64;
    let mut sent = 0u64;
    progress(UploadProgress { sent, total });
    for chunk in bytes.chunks(CHUNK_SIZE) {
        writer.write_all(chunk)?;
        sent += chunk.len() as u64;
        progress(UploadProgress { sent, total });
    }
    writer.flush()
}

/// Remove the partially written file at `path` when `result` failed.
fn discard_on_error<T>(path: &Path, result: io::Result<T>) -> io::Result<T> {
    if let Err(err) = &result {
        log::warn!("Upload to {} failed: {err}", path.display());
        if let Err(remove_err) = fs::remove_file(path) {
            log::debug!("Could not remove {}: {remove_err}", path.display());
        }
    }
    result
}

impl FileImageStore {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into(),
        }
    }
}

impl ImageStore for FileImageStore {
    fn upload(
        &mut self,
        file_name: &str,
        bytes: &[u8],
        progress: &mut ProgressCallback<'_>,
    ) -> Result<StoredImage, StoreError> {
        fs::create_dir_all(&self.root)?;
        let id = uuid::Uuid::new_v4().to_string();
        let stored_name = format!("{id}-{}", sanitize_file_name(file_name));
        let path = self.root.join(&stored_name);

        let total = bytes.len() as u64;
        let mut file = File::create(&path)?;
        discard_on_error(&path, write_chunks(&mut file, bytes, progress))?;
        log::info!("Stored image {stored_name} ({total} bytes)");

        Ok(StoredImage {
            id,
            url: format!("{}/{stored_name}", self.base_url.trim_end_matches('/')),
            file_name: stored_name,
            size: total,
        })
    }
}
