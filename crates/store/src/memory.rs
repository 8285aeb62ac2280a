// LabWired - Device Catalog Sync
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! In-memory [`CatalogStore`] used by tests and dry runs.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::{CatalogStore, FieldValue, Filter, Record, RecordId, StoreError, StoreResult};

/// Store backed by per-collection vectors. Ids are handed out sequentially
/// starting at 1, across all collections.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: RecordId,
    tables: BTreeMap<String, Vec<Record>>,
}

impl MemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn locked(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Inserts a record directly, bypassing `create`. Later created records
    /// get ids above the highest seeded one.
    pub fn seed(&self, collection: &str, id: RecordId, values: &[(&str, FieldValue)]) {
        let mut inner = self.locked();
        inner.next_id = inner.next_id.max(id);
        let fields = values
            .iter()
            .map(|(column, value)| (column.to_string(), value.clone()))
            .collect();
        inner
            .tables
            .entry(collection.to_string())
            .or_default()
            .push(Record { id, fields });
    }

    /// Snapshot of a collection, in insertion order.
    pub fn records(&self, collection: &str) -> Vec<Record> {
        self.locked()
            .tables
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of records in a collection.
    pub fn count(&self, collection: &str) -> usize {
        self.locked().tables.get(collection).map_or(0, Vec::len)
    }
}

impl CatalogStore for MemoryStore {
    fn fetch(&self, collection: &str, filter: &Filter) -> StoreResult<Vec<Record>> {
        let inner = self.locked();
        let rows = inner
            .tables
            .get(collection)
            .map(|records| {
                records
                    .iter()
                    .filter(|record| filter.matches(record))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(rows)
    }

    fn create(&self, collection: &str, values: &[(String, FieldValue)]) -> StoreResult<RecordId> {
        let mut inner = self.locked();
        inner.next_id += 1;
        let id = inner.next_id;
        let fields = values.iter().cloned().collect();
        inner
            .tables
            .entry(collection.to_string())
            .or_default()
            .push(Record { id, fields });
        Ok(id)
    }

    fn update(
        &self,
        collection: &str,
        id: RecordId,
        values: &[(String, FieldValue)],
    ) -> StoreResult<()> {
        let mut inner = self.locked();
        let record = inner
            .tables
            .get_mut(collection)
            .and_then(|records| records.iter_mut().find(|record| record.id == id));
        let Some(record) = record else {
            return Err(StoreError::NotFound {
                collection: collection.to_string(),
                id,
            });
        };
        for (column, value) in values {
            record.fields.insert(column.clone(), value.clone());
        }
        Ok(())
    }
}
