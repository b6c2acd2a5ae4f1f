use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::block::ContentBlock;
use super::kinds::Frontmatter;

/// Identity assigned by the persistence collaborator on first save.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompositionId(String);

impl CompositionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CompositionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CompositionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Which composer produced the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompositionKind {
    #[default]
    Block,
    Email,
    News,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompositionMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_stylesheet_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frontmatter: Option<Frontmatter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub car_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub selected_copies: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gallery_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carousel_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A named, persisted ordered collection of blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Composition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<CompositionId>,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: CompositionKind,
    #[serde(default)]
    pub blocks: Vec<ContentBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(default)]
    pub metadata: CompositionMetadata,
}

impl Composition {
    pub fn new(name: impl Into<String>, kind: CompositionKind) -> Self {
        Self {
            id: None,
            name: name.into(),
            kind,
            blocks: Vec::new(),
            template: None,
            metadata: CompositionMetadata::default(),
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Copy with the identity stripped and ` (Copy)` appended to the name.
    /// Saving the copy creates a new record; the original is untouched.
    pub fn duplicate(&self) -> Self {
        let mut copy = self.clone();
        copy.id = None;
        copy.name = format!("{} (Copy)", self.name);
        copy.metadata.created_at = None;
        copy.metadata.updated_at = None;
        copy
    }

    /// Stamp timestamps for a save at `now`. `created_at` is only set once.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        if self.metadata.created_at.is_none() {
            self.metadata.created_at = Some(now);
        }
        self.metadata.updated_at = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn duplicate_strips_identity_and_renames() {
        let mut original = Composition::new("Spring launch", CompositionKind::Email);
        original.id = Some(CompositionId::new("c-1"));
        original.blocks.push(ContentBlock::text("Hello"));
        original.touch(Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap());

        let copy = original.duplicate();

        assert_eq!(copy.id, None);
        assert_eq!(copy.name, "Spring launch (Copy)");
        assert_eq!(copy.blocks, original.blocks);
        assert_eq!(copy.metadata.created_at, None);
        assert_eq!(original.id, Some(CompositionId::new("c-1")));
        assert_eq!(original.name, "Spring launch");
    }

    #[test]
    fn touch_keeps_creation_time() {
        let first = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let second = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
        let mut composition = Composition::new("News", CompositionKind::News);

        composition.touch(first);
        composition.touch(second);

        assert_eq!(composition.metadata.created_at, Some(first));
        assert_eq!(composition.metadata.updated_at, Some(second));
    }

    #[test]
    fn record_shape_uses_type_and_camel_case_metadata() {
        let mut composition = Composition::new("Weekly", CompositionKind::News);
        composition.id = Some(CompositionId::new("abc"));
        composition.metadata.selected_stylesheet_id = Some("house".into());

        let value = serde_json::to_value(&composition).unwrap();

        assert_eq!(
            value,
            json!({
                "id": "abc",
                "name": "Weekly",
                "type": "news",
                "blocks": [],
                "metadata": {"selectedStylesheetId": "house"}
            })
        );
    }
}
