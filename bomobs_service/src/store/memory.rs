//! In-process store.
//!
//! Behaves like the remote backends from the pipeline's point of view:
//! lookups return serialized documents and every accepted bulk request is
//! recorded, which lets tests assert on exactly what would have been sent.

use std::collections::HashMap;

use crate::error::{IngestError, Result};
use crate::model::CanonicalEvent;
use crate::store::{BulkRequest, ObservationStore, SearchResult};

#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: HashMap<String, Vec<CanonicalEvent>>,
    submitted: Vec<BulkRequest>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a collection with already-persisted documents.
    pub fn with_documents(mut self, collection: &str, events: Vec<CanonicalEvent>) -> Self {
        self.collections
            .entry(collection.to_string())
            .or_default()
            .extend(events);
        self
    }

    /// Everything currently stored in `collection`, in insertion order.
    pub fn documents(&self, collection: &str) -> &[CanonicalEvent] {
        self.collections
            .get(collection)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Bulk requests accepted so far, in submission order.
    pub fn submitted(&self) -> &[BulkRequest] {
        &self.submitted
    }
}

impl ObservationStore for MemoryStore {
    fn latest_for_station(&mut self, collection: &str, wmo: i32) -> Result<SearchResult> {
        let matching: Vec<&CanonicalEvent> = self
            .documents(collection)
            .iter()
            .filter(|event| event.wmo == wmo)
            .collect();

        let latest = matching.iter().max_by_key(|event| event.timestamp);

        let hits = match latest {
            Some(event) => vec![serde_json::to_value(event).map_err(|e| {
                IngestError::StoreQuery {
                    wmo,
                    message: e.to_string(),
                }
            })?],
            None => Vec::new(),
        };

        Ok(SearchResult {
            total_hits: matching.len() as u64,
            hits,
        })
    }

    fn bulk_insert(&mut self, request: &BulkRequest) -> Result<usize> {
        self.collections
            .entry(request.collection.clone())
            .or_default()
            .extend(request.documents.iter().cloned());
        self.submitted.push(request.clone());
        Ok(request.operation_count())
    }
}
