//! BOM observation ingest service.
//!
//! Fetches the Bureau of Meteorology state observation bundles, turns every
//! station reading into a canonical event, and writes the events that are
//! newer than what the store already holds.

pub mod analysis;
pub mod bundles;
pub mod canonical;
pub mod config;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod store;
pub mod sync;
