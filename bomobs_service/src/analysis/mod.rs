//! Data organization for one ingest run.
//!
//! Submodules:
//! - `groupings` — organizes the flat canonicalizer output into per-station
//!   partitions.

pub mod groupings;
