//! In-memory document store
//!
//! Collections are ordered maps of identifier to document behind a single
//! async `RwLock`; writes serialize, reads share. Good enough for the whole
//! test suite and for development, and the reference implementation of the
//! [`DocumentStore`] contract.

use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::error::{StoreError, StoreErrorKind};
use super::query::ListQuery;
use super::{Document, DocumentStore, StoreResult, CREATED_AT_FIELD, ID_FIELD, REVISION_FIELD};

/// In-memory, lock-guarded document collections
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, BTreeMap<String, Document>>>,
}

impl MemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently held in a collection
    pub async fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, BTreeMap::len)
    }

    /// Check whether a collection holds no documents
    pub async fn is_empty(&self, collection: &str) -> bool {
        self.len(collection).await == 0
    }
}

impl DocumentStore for MemoryStore {
    async fn find(&self, collection: &str, query: &ListQuery) -> StoreResult<Vec<Document>> {
        let guard = self.collections.read().await;
        let Some(collection) = guard.get(collection) else {
            return Ok(Vec::new());
        };

        let mut matched: Vec<&Document> = collection
            .values()
            .filter(|doc| query.matches(doc))
            .collect();
        if !query.sort.is_empty() {
            // sort_by is stable, so ties keep their store order
            matched.sort_by(|a, b| query.compare(a, b));
        }

        let (skip, limit) = query
            .pagination
            .map_or((0, usize::MAX), |p| (p.skip as usize, p.limit as usize));

        Ok(matched
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(|doc| query.projection.apply(doc))
            .collect())
    }

    async fn find_by_id(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let guard = self.collections.read().await;
        Ok(guard
            .get(collection)
            .and_then(|collection| collection.get(id))
            .cloned())
    }

    async fn insert(&self, collection: &str, mut doc: Document) -> StoreResult<Document> {
        let id = match doc.get(ID_FIELD).and_then(Value::as_str) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => Uuid::new_v4().to_string(),
        };
        doc.insert(ID_FIELD.to_string(), Value::String(id.clone()));
        if !doc.contains_key(CREATED_AT_FIELD) {
            doc.insert(
                CREATED_AT_FIELD.to_string(),
                Value::String(Utc::now().to_rfc3339()),
            );
        }
        doc.insert(REVISION_FIELD.to_string(), Value::from(0_u64));

        let mut guard = self.collections.write().await;
        let collection = guard.entry(collection.to_string()).or_default();
        if collection.contains_key(&id) {
            return Err(StoreError::new(
                StoreErrorKind::Other,
                format!("document {id} already exists"),
            ));
        }
        collection.insert(id, doc.clone());
        Ok(doc)
    }

    async fn update<F>(
        &self,
        collection: &str,
        id: &str,
        patch: Document,
        validate: F,
    ) -> StoreResult<Option<Document>>
    where
        F: FnOnce(&Document) -> StoreResult<()> + Send,
    {
        let mut guard = self.collections.write().await;
        let Some(current) = guard
            .get_mut(collection)
            .and_then(|collection| collection.get_mut(id))
        else {
            return Ok(None);
        };

        let mut merged = current.clone();
        for (field, value) in patch {
            // Server-assigned fields cannot be patched
            if field == ID_FIELD || field == CREATED_AT_FIELD || field == REVISION_FIELD {
                continue;
            }
            if value.is_null() {
                merged.remove(&field);
            } else {
                merged.insert(field, value);
            }
        }

        validate(&merged)?;

        let revision = current
            .get(REVISION_FIELD)
            .and_then(Value::as_u64)
            .unwrap_or(0);
        merged.insert(REVISION_FIELD.to_string(), Value::from(revision + 1));
        *current = merged.clone();
        Ok(Some(merged))
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<bool> {
        let mut guard = self.collections.write().await;
        Ok(guard
            .get_mut(collection)
            .and_then(|collection| collection.remove(id))
            .is_some())
    }
}
