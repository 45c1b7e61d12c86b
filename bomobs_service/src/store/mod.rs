//! Persistent store for canonical events.
//!
//! The pipeline needs exactly two things from a store: the most recent
//! document for a station, and a way to insert a batch of new documents.
//! Backends:
//! - `elastic`  — Elasticsearch over HTTP (default).
//! - `pg`       — a jsonb document table in PostgreSQL.
//! - `memory`   — in-process store for tests and dry runs.

pub mod elastic;
pub mod memory;
pub mod pg;

use crate::config::{StoreBackend, StoreConfig};
use crate::error::Result;
use crate::model::CanonicalEvent;

pub use elastic::ElasticStore;
pub use memory::MemoryStore;
pub use pg::PgStore;

// ---------------------------------------------------------------------------
// Requests and responses
// ---------------------------------------------------------------------------

/// Result of a latest-document lookup.
///
/// `hits` holds at most one raw document source; `total_hits` is the number
/// of documents the store holds for the station.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResult {
    pub total_hits: u64,
    pub hits: Vec<serde_json::Value>,
}

/// Insert-only bulk request for one station.
///
/// One operation per document; document ids are left to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkRequest {
    pub collection: String,
    pub wmo: i32,
    pub documents: Vec<CanonicalEvent>,
}

impl BulkRequest {
    pub fn operation_count(&self) -> usize {
        self.documents.len()
    }
}

// ---------------------------------------------------------------------------
// Store trait
// ---------------------------------------------------------------------------

pub trait ObservationStore {
    /// Documents in `collection` with `wmo` equal to the station id, sorted
    /// by `timestamp` descending, limited to one.
    fn latest_for_station(&mut self, collection: &str, wmo: i32) -> Result<SearchResult>;

    /// Inserts the documents of the request and returns how many the store
    /// accepted. A request refused outright is an error; backends that can
    /// reject single documents report the remainder.
    fn bulk_insert(&mut self, request: &BulkRequest) -> Result<usize>;
}

impl<S: ObservationStore + ?Sized> ObservationStore for Box<S> {
    fn latest_for_station(&mut self, collection: &str, wmo: i32) -> Result<SearchResult> {
        (**self).latest_for_station(collection, wmo)
    }

    fn bulk_insert(&mut self, request: &BulkRequest) -> Result<usize> {
        (**self).bulk_insert(request)
    }
}

/// Opens the backend selected by configuration.
pub fn connect(config: &StoreConfig) -> Result<Box<dyn ObservationStore>> {
    match config.backend {
        StoreBackend::Elasticsearch => Ok(Box::new(ElasticStore::new(
            &config.elasticsearch_url,
            config.request_timeout_secs,
        )?)),
        StoreBackend::Postgres => {
            let url = config.database_url.as_deref().ok_or_else(|| {
                crate::error::IngestError::Config(
                    "postgres store selected but no database_url configured".to_string(),
                )
            })?;
            Ok(Box::new(PgStore::connect(url)?))
        }
    }
}
