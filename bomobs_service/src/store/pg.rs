//! PostgreSQL store backend
//!
//! Documents live in a single jsonb table keyed by collection name, with the
//! station id and observation instant broken out into indexed columns.

use postgres::{Client, NoTls};
use tracing::info;

use crate::error::{IngestError, Result};
use crate::store::{BulkRequest, ObservationStore, SearchResult};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS bom_observations (
        id          BIGSERIAL PRIMARY KEY,
        collection  TEXT        NOT NULL,
        wmo         INTEGER     NOT NULL,
        observed_at TIMESTAMPTZ NOT NULL,
        document    JSONB       NOT NULL
    );
    CREATE INDEX IF NOT EXISTS bom_observations_latest_idx
        ON bom_observations (collection, wmo, observed_at DESC);
";

// The window count is evaluated before LIMIT, so it covers every match.
const LATEST_QUERY: &str = "
    SELECT document, COUNT(*) OVER () AS total
    FROM bom_observations
    WHERE collection = $1 AND wmo = $2
    ORDER BY observed_at DESC
    LIMIT 1
";

const INSERT: &str = "
    INSERT INTO bom_observations (collection, wmo, observed_at, document)
    VALUES ($1, $2, $3, $4)
";

pub struct PgStore {
    client: Client,
}

impl PgStore {
    /// Connects and creates the document table if it does not exist.
    pub fn connect(database_url: &str) -> Result<Self> {
        let mut client = Client::connect(database_url, NoTls)
            .map_err(|e| IngestError::Config(format!("failed to connect to database: {}", e)))?;

        client
            .batch_execute(SCHEMA)
            .map_err(|e| IngestError::Config(format!("failed to prepare schema: {}", e)))?;

        info!("connected to PostgreSQL store");
        Ok(Self { client })
    }
}

impl ObservationStore for PgStore {
    fn latest_for_station(&mut self, collection: &str, wmo: i32) -> Result<SearchResult> {
        let row = self
            .client
            .query_opt(LATEST_QUERY, &[&collection, &wmo])
            .map_err(|e| IngestError::StoreQuery {
                wmo,
                message: e.to_string(),
            })?;

        Ok(match row {
            Some(row) => {
                let document: serde_json::Value = row.get(0);
                let total: i64 = row.get(1);
                SearchResult {
                    total_hits: total as u64,
                    hits: vec![document],
                }
            }
            None => SearchResult::default(),
        })
    }

    fn bulk_insert(&mut self, request: &BulkRequest) -> Result<usize> {
        let write_error = |e: &dyn std::fmt::Display| IngestError::StoreWrite {
            wmo: request.wmo,
            message: e.to_string(),
        };

        let mut transaction = self.client.transaction().map_err(|e| write_error(&e))?;
        let statement = transaction.prepare(INSERT).map_err(|e| write_error(&e))?;

        for event in &request.documents {
            let document = serde_json::to_value(event).map_err(|e| write_error(&e))?;
            transaction
                .execute(
                    &statement,
                    &[&request.collection, &event.wmo, &event.timestamp, &document],
                )
                .map_err(|e| write_error(&e))?;
        }

        transaction.commit().map_err(|e| write_error(&e))?;
        Ok(request.operation_count())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
