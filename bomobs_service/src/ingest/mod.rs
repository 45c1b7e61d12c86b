//! Getting raw observations out of the BOM bundles.
//!
//! - `ftp`     — retrieval of named bundles from the remote file server.
//! - `archive` — extraction of `.json` members from a `.tgz` bundle.
//! - `bom`     — decoding of observation documents into raw records.

pub mod archive;
pub mod bom;
pub mod ftp;
