//! Incremental sync of one run's events against the store.
//!
//! - `filter` — keeps only events newer than the station's latest stored one.
//! - `writer` — turns the kept events into bulk insert requests.

pub mod filter;
pub mod writer;
