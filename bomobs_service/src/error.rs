//! Error type for a single ingest run.
//!
//! Every variant is fatal: the orchestrator stops at the first one and
//! reports it as the outcome of the run. The one recoverable condition in
//! the pipeline (an unreadable rainfall-trace value) never reaches this type.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    /// Listing or fetching a bundle from the remote file server failed.
    #[error("retrieval failed for {bundle}: {message}")]
    Retrieval { bundle: String, message: String },

    /// A bundle could not be opened, read, or unpacked.
    #[error("extraction failed for {bundle}: {message}")]
    Extraction { bundle: String, message: String },

    /// An extracted document is not a valid observation document.
    #[error("parse error in {document}: {source}")]
    Parse {
        document: String,
        #[source]
        source: serde_json::Error,
    },

    /// Local time and offset do not form an absolute instant.
    #[error("malformed timestamp {value:?} for station {wmo}: {source}")]
    MalformedTimestamp {
        wmo: i32,
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    /// The store rejected or failed the latest-document lookup.
    #[error("store query failed for station {wmo}: {message}")]
    StoreQuery { wmo: i32, message: String },

    /// The latest stored document could not be read back as an event.
    #[error("stored document for station {wmo} could not be decoded: {source}")]
    StoreDecode {
        wmo: i32,
        #[source]
        source: serde_json::Error,
    },

    /// A bulk write was not accepted by the store.
    #[error("store write failed for station {wmo}: {message}")]
    StoreWrite { wmo: i32, message: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl IngestError {
    /// Short name of the pipeline stage that produced the error.
    pub fn stage(&self) -> &'static str {
        match self {
            IngestError::Retrieval { .. } => "fetching",
            IngestError::Extraction { .. } => "extracting",
            IngestError::Parse { .. } | IngestError::MalformedTimestamp { .. } => "canonicalizing",
            IngestError::StoreQuery { .. } | IngestError::StoreDecode { .. } => "filtering",
            IngestError::StoreWrite { .. } => "writing",
            IngestError::Config(_) | IngestError::Io(_) => "setup",
        }
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;
