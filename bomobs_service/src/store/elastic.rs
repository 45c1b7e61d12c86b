//! Elasticsearch store backend
//!
//! Talks to the search and bulk REST endpoints directly over blocking HTTP.
//!
//! API Documentation:
//! - https://www.elastic.co/guide/en/elasticsearch/reference/current/search-search.html
//! - https://www.elastic.co/guide/en/elasticsearch/reference/current/docs-bulk.html

use std::collections::HashMap;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::error::{IngestError, Result};
use crate::store::{BulkRequest, ObservationStore, SearchResult};

// ============================================================================
// Response Structures
// ============================================================================

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: HitsEnvelope,
}

#[derive(Debug, Deserialize)]
struct HitsEnvelope {
    total: TotalHits,
    #[serde(default)]
    hits: Vec<Hit>,
}

/// Elasticsearch 7+ reports `{"value": n, "relation": "eq"}`, older
/// clusters a bare number.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TotalHits {
    Count(u64),
    Object { value: u64 },
}

impl TotalHits {
    fn value(&self) -> u64 {
        match self {
            TotalHits::Count(n) => *n,
            TotalHits::Object { value } => *value,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "_source")]
    source: serde_json::Value,
}

/// `_bulk` answers 200 even when single documents fail; the per-item
/// status tells them apart.
#[derive(Debug, Deserialize)]
struct BulkResponse {
    #[serde(default)]
    errors: bool,
    #[serde(default)]
    items: Vec<HashMap<String, BulkItem>>,
}

#[derive(Debug, Deserialize)]
struct BulkItem {
    status: u16,
}

impl BulkResponse {
    fn rejected(&self) -> usize {
        self.items
            .iter()
            .flat_map(|item| item.values())
            .filter(|result| !(200..300).contains(&result.status))
            .count()
    }
}

// ============================================================================
// Client
// ============================================================================

pub struct ElasticStore {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl ElasticStore {
    pub fn new(base_url: &str, request_timeout_secs: u64) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(request_timeout_secs))
            .build()
            .map_err(|e| IngestError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn search_url(&self, collection: &str) -> String {
        // A missing index reads as zero hits rather than a 404.
        format!("{}/{}/_search?ignore_unavailable=true", self.base_url, collection)
    }

    fn bulk_url(&self) -> String {
        format!("{}/_bulk", self.base_url)
    }
}

/// Query body: term on `wmo`, newest `timestamp` first, one hit.
pub fn latest_query(wmo: i32) -> serde_json::Value {
    json!({
        "query": { "term": { "wmo": wmo } },
        "sort": [ { "timestamp": { "order": "desc", "unmapped_type": "date" } } ],
        "size": 1
    })
}

/// NDJSON body with one `index` action per document.
pub fn bulk_body(request: &BulkRequest) -> std::result::Result<String, serde_json::Error> {
    let action = serde_json::to_string(&json!({ "index": { "_index": request.collection } }))?;

    let mut body = String::new();
    for document in &request.documents {
        body.push_str(&action);
        body.push('\n');
        body.push_str(&serde_json::to_string(document)?);
        body.push('\n');
    }
    Ok(body)
}

impl ObservationStore for ElasticStore {
    fn latest_for_station(&mut self, collection: &str, wmo: i32) -> Result<SearchResult> {
        let query_error = |message: String| IngestError::StoreQuery { wmo, message };

        let response = self
            .client
            .post(self.search_url(collection))
            .json(&latest_query(wmo))
            .send()
            .map_err(|e| query_error(e.to_string()))?;

        if !response.status().is_success() {
            return Err(query_error(format!("HTTP {}", response.status())));
        }

        let parsed: SearchResponse = response
            .json()
            .map_err(|e| query_error(format!("unreadable search response: {}", e)))?;

        debug!(wmo, total_hits = parsed.hits.total.value(), "latest document lookup");

        Ok(SearchResult {
            total_hits: parsed.hits.total.value(),
            hits: parsed.hits.hits.into_iter().take(1).map(|hit| hit.source).collect(),
        })
    }

    fn bulk_insert(&mut self, request: &BulkRequest) -> Result<usize> {
        let write_error = |message: String| IngestError::StoreWrite {
            wmo: request.wmo,
            message,
        };

        let body = bulk_body(request).map_err(|e| write_error(e.to_string()))?;

        let response = self
            .client
            .post(self.bulk_url())
            .header(CONTENT_TYPE, "application/x-ndjson")
            .body(body)
            .send()
            .map_err(|e| write_error(e.to_string()))?;

        if !response.status().is_success() {
            return Err(write_error(format!("HTTP {}", response.status())));
        }

        let parsed: BulkResponse = response
            .json()
            .map_err(|e| write_error(format!("unreadable bulk response: {}", e)))?;

        let submitted = request.operation_count();
        if !parsed.errors {
            return Ok(submitted);
        }

        let rejected = parsed.rejected().min(submitted);
        warn!(wmo = request.wmo, rejected, submitted, "bulk response reported item errors");
        Ok(submitted - rejected)
    }
}

// ============================================================================
// Tests
// ============================================================================
