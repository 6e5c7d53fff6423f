//! In-memory [`RecordStore`] implementation for tests.
//!
//! Seeded collections behind `std::sync::RwLock`. The department-hint
//! filter mirrors the REST backend's substring semantics so pipeline
//! tests exercise the same narrowing behavior. Collections can be marked
//! as failing to prove fetch-failure isolation.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use anyhow::Result;
use async_trait::async_trait;

use crate::intent::DeptHint;
use crate::models::{Collection, Record};
use crate::normalize::normalize;
use crate::score::hint_matches_department;

use super::RecordStore;

/// In-memory store for tests.
pub struct MemoryStore {
    collections: RwLock<HashMap<Collection, Vec<Record>>>,
    failing: RwLock<HashSet<Collection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            failing: RwLock::new(HashSet::new()),
        }
    }

    /// Replace the contents of a collection.
    pub fn seed(&self, collection: Collection, records: Vec<Record>) {
        self.collections.write().unwrap().insert(collection, records);
    }

    /// Make every fetch from a collection fail.
    pub fn fail_on(&self, collection: Collection) {
        self.failing.write().unwrap().insert(collection);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn fetch(
        &self,
        collection: Collection,
        hint: Option<&DeptHint>,
        limit: usize,
    ) -> Result<Vec<Record>> {
        if self.failing.read().unwrap().contains(&collection) {
            anyhow::bail!("collection {} is unavailable", collection.table());
        }
        let collections = self.collections.read().unwrap();
        let records = collections.get(&collection).cloned().unwrap_or_default();
        let mut out: Vec<Record> = match hint {
            Some(h) => records
                .into_iter()
                .filter(|r| {
                    let dept = r.department.as_deref().map(normalize).unwrap_or_default();
                    hint_matches_department(h, &dept)
                })
                .collect(),
            None => records,
        };
        out.truncate(limit);
        Ok(out)
    }

    fn is_configured(&self) -> bool {
        true
    }

    fn describe(&self) -> String {
        "in-memory record store".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawRecord;

    #[tokio::test]
    async fn test_limit_is_enforced() {
        let store = MemoryStore::new();
        let records: Vec<Record> = (0..10)
            .map(|i| {
                Record::from_raw(
                    RawRecord {
                        name: Some(format!("P{}", i)),
                        ..Default::default()
                    },
                    Collection::Students,
                )
            })
            .collect();
        store.seed(Collection::Students, records);
        let got = store.fetch(Collection::Students, None, 3).await.unwrap();
        assert_eq!(got.len(), 3);
    }

    #[tokio::test]
    async fn test_unseeded_collection_is_empty() {
        let store = MemoryStore::new();
        let got = store.fetch(Collection::Branches, None, 10).await.unwrap();
        assert!(got.is_empty());
    }
}
