use std::collections::BTreeMap;

use chrono::Utc;

use crate::models::{Composition, CompositionId};

use super::{CompositionStore, CompositionSummary, StoreError, sort_summaries};

/// In-memory store for tests and demos.
#[derive(Debug, Default, Clone)]
pub struct MemoryCompositionStore {
    records: BTreeMap<CompositionId, Composition>,
}

impl MemoryCompositionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl CompositionStore for MemoryCompositionStore {
    fn list(&self) -> Result<Vec<CompositionSummary>, StoreError> {
        let mut summaries: Vec<CompositionSummary> = self
            .records
            .iter()
            .map(|(id, composition)| CompositionSummary::of(id.clone(), composition))
            .collect();
        sort_summaries(&mut summaries);
        Ok(summaries)
    }

    fn get(&self, id: &CompositionId) -> Result<Composition, StoreError> {
        self.records
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn create(&mut self, composition: &mut Composition) -> Result<CompositionId, StoreError> {
        if let Some(id) = &composition.id {
            return Err(StoreError::AlreadyPersisted(id.clone()));
        }
        let id = CompositionId::generate();
        composition.id = Some(id.clone());
        composition.touch(Utc::now());
        self.records.insert(id.clone(), composition.clone());
        Ok(id)
    }

    fn update(&mut self, composition: &mut Composition) -> Result<(), StoreError> {
        let id = composition.id.clone().ok_or(StoreError::MissingId)?;
        if !self.records.contains_key(&id) {
            return Err(StoreError::NotFound(id.to_string()));
        }
        composition.touch(Utc::now());
        self.records.insert(id, composition.clone());
        Ok(())
    }

    fn delete(&mut self, id: &CompositionId) -> Result<(), StoreError> {
        self.records
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CompositionKind;

    #[test]
    fn behaves_like_a_store() {
        let mut store = MemoryCompositionStore::new();
        let mut composition = Composition::new("Promo", CompositionKind::Email);
        let id = store.create(&mut composition).unwrap();

        assert_eq!(store.get(&id).unwrap().name, "Promo");
        assert_eq!(store.list().unwrap()[0].id, id);

        store.delete(&id).unwrap();
        assert!(store.is_empty());
        assert!(matches!(store.delete(&id), Err(StoreError::NotFound(_))));
    }
}
