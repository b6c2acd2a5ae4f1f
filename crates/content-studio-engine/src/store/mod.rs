//! Persistence collaborators for compositions, stylesheets and images.

pub mod file;
pub mod images;
pub mod memory;
pub mod stylesheet;

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Composition, CompositionId, CompositionKind};
use crate::net::{RetryPolicy, retry_with_backoff};

pub use file::FileCompositionStore;
pub use images::{FileImageStore, ImageStore, StoredImage};
pub use memory::MemoryCompositionStore;
pub use stylesheet::{FileStylesheetStore, StylesheetStore, StylesheetSummary};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Composition {0} is already saved; update it instead")]
    AlreadyPersisted(CompositionId),
    #[error("Composition has no id; create it first")]
    MissingId,
    #[error("Invalid id '{0}'")]
    InvalidId(String),
    #[error("Invalid record {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Whether retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Unavailable(_) => true,
            StoreError::Io(err) => matches!(
                err.kind(),
                std::io::ErrorKind::Interrupted
                    | std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::WouldBlock
            ),
            _ => false,
        }
    }
}

/// Listing entry; blocks are not loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositionSummary {
    pub id: CompositionId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CompositionKind,
    pub block_count: usize,
    pub updated_at: Option<DateTime<Utc>>,
}

impl CompositionSummary {
    pub fn of(id: CompositionId, composition: &Composition) -> Self {
        Self {
            id,
            name: composition.name.clone(),
            kind: composition.kind,
            block_count: composition.blocks.len(),
            updated_at: composition.metadata.updated_at,
        }
    }
}

pub trait CompositionStore {
    /// All compositions, most recently updated first.
    fn list(&self) -> Result<Vec<CompositionSummary>, StoreError>;

    fn get(&self, id: &CompositionId) -> Result<Composition, StoreError>;

    /// Persist a new composition, assigning its id and timestamps.
    fn create(&mut self, composition: &mut Composition) -> Result<CompositionId, StoreError>;

    /// Overwrite an existing composition, refreshing `updated_at`.
    fn update(&mut self, composition: &mut Composition) -> Result<(), StoreError>;

    fn delete(&mut self, id: &CompositionId) -> Result<(), StoreError>;
}

/// Newest first, then by name for a stable listing.
pub(crate) fn sort_summaries(summaries: &mut [CompositionSummary]) {
    summaries.sort_by(|a, b| {
        b.updated_at
            .cmp(&a.updated_at)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// Delete with bounded retry on transient failures.
pub fn delete_with_retry(
    store: &mut dyn CompositionStore,
    id: &CompositionId,
    policy: &RetryPolicy,
    sleep: impl FnMut(Duration),
) -> Result<(), StoreError> {
    retry_with_backoff(
        policy,
        sleep,
        |_| store.delete(id),
        StoreError::is_transient,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Flaky {
        failures_left: u32,
        deleted: bool,
    }

    impl CompositionStore for Flaky {
        fn list(&self) -> Result<Vec<CompositionSummary>, StoreError> {
            Ok(Vec::new())
        }

        fn get(&self, id: &CompositionId) -> Result<Composition, StoreError> {
            Err(StoreError::NotFound(id.to_string()))
        }

        fn create(&mut self, _: &mut Composition) -> Result<CompositionId, StoreError> {
            Err(StoreError::Unavailable("read only".into()))
        }

        fn update(&mut self, _: &mut Composition) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("read only".into()))
        }

        fn delete(&mut self, _: &CompositionId) -> Result<(), StoreError> {
            if self.failures_left > 0 {
                self.failures_left -= 1;
                return Err(StoreError::Unavailable("503".into()));
            }
            self.deleted = true;
            Ok(())
        }
    }

    #[test]
    fn transient_delete_failures_are_retried() {
        let mut store = Flaky {
            failures_left: 2,
            deleted: false,
        };
        let mut sleeps = 0;

        delete_with_retry(
            &mut store,
            &CompositionId::new("c"),
            &RetryPolicy::default(),
            |_| sleeps += 1,
        )
        .unwrap();

        assert!(store.deleted);
        assert_eq!(sleeps, 2);
    }

    #[test]
    fn delete_reports_permanent_failure_after_cap() {
        let mut store = Flaky {
            failures_left: 10,
            deleted: false,
        };
        let err = delete_with_retry(
            &mut store,
            &CompositionId::new("c"),
            &RetryPolicy::default(),
            |_| {},
        )
        .unwrap_err();

        assert!(matches!(err, StoreError::Unavailable(_)));
        assert_eq!(store.failures_left, 7);
    }

    #[test]
    fn not_found_is_not_transient() {
        assert!(!StoreError::NotFound("x".into()).is_transient());
        assert!(StoreError::Unavailable("x".into()).is_transient());
    }
}
