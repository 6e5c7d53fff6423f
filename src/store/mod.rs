//! Record store abstraction.
//!
//! The [`RecordStore`] trait is the boundary to the external data store:
//! one bounded fetch per collection, optionally narrowed by a department
//! hint. Backends are pluggable; [`rest::RestStore`] talks to the real
//! REST store and [`memory::MemoryStore`] backs tests.
//!
//! Implementations must be `Send + Sync` to be shared across handlers.

pub mod memory;
pub mod rest;

use anyhow::Result;
use async_trait::async_trait;

use crate::intent::DeptHint;
use crate::models::{Collection, Record};

/// Abstract record-store backend.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch up to `limit` records from one collection. A department hint
    /// narrows the fetch on the store side; hint semantics are substring
    /// match on the department field.
    async fn fetch(
        &self,
        collection: Collection,
        hint: Option<&DeptHint>,
        limit: usize,
    ) -> Result<Vec<Record>>;

    /// Whether the backend has everything it needs to serve fetches.
    fn is_configured(&self) -> bool;

    /// One-line status for `desk check`.
    fn describe(&self) -> String;
}

/// Fetch with the hint-fallback rule: when a department filter yields
/// zero rows, the filter is dropped and the unfiltered set is fetched,
/// so an over-specific hint never silently empties a collection.
pub async fn fetch_with_hint(
    store: &dyn RecordStore,
    collection: Collection,
    hint: Option<&DeptHint>,
    limit: usize,
) -> Result<Vec<Record>> {
    if let Some(h) = hint {
        let filtered = store.fetch(collection, Some(h), limit).await?;
        if !filtered.is_empty() {
            return Ok(filtered);
        }
        tracing::debug!(
            collection = collection.table(),
            hint = %h.phrase,
            "department filter matched nothing, refetching unfiltered"
        );
    }
    store.fetch(collection, None, limit).await
}

#[cfg(test)]
mod tests {
    use super::memory::MemoryStore;
    use super::*;
    use crate::models::RawRecord;

    fn record(name: &str, dept: &str) -> Record {
        Record::from_raw(
            RawRecord {
                name: Some(name.into()),
                department: Some(dept.into()),
                ..Default::default()
            },
            Collection::Faculty,
        )
    }

    fn hint() -> DeptHint {
        DeptHint {
            token: "cse".into(),
            phrase: "computer science".into(),
        }
    }

    #[tokio::test]
    async fn test_hint_narrows_fetch() {
        let store = MemoryStore::new();
        store.seed(
            Collection::Faculty,
            vec![record("A. Rao", "Computer Science"), record("B. Singh", "Civil")],
        );
        let got = fetch_with_hint(&store, Collection::Faculty, Some(&hint()), 10)
            .await
            .unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].name.as_deref(), Some("A. Rao"));
    }

    #[tokio::test]
    async fn test_empty_filter_falls_back_to_unfiltered() {
        let store = MemoryStore::new();
        store.seed(
            Collection::Faculty,
            vec![record("B. Singh", "Civil"), record("C. Das", "Mechanical")],
        );
        let got = fetch_with_hint(&store, Collection::Faculty, Some(&hint()), 10)
            .await
            .unwrap();
        assert_eq!(got.len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_error_propagates() {
        let store = MemoryStore::new();
        store.fail_on(Collection::Faculty);
        let got = fetch_with_hint(&store, Collection::Faculty, None, 10).await;
        assert!(got.is_err());
    }
}
