//! Extraction of observation documents from `.tgz` bundles.

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tar::Archive;
use tracing::debug;

use crate::error::{IngestError, Result};

/// Extension of the members the pipeline cares about. Case-sensitive.
pub const DOCUMENT_EXTENSION: &str = "json";

fn is_document(path: &Path) -> bool {
    path.extension() == Some(OsStr::new(DOCUMENT_EXTENSION))
}

/// Unpacks every `.json` member of a gzipped tarball into `dest`.
///
/// Directory prefixes inside the archive are dropped, so all documents land
/// directly in `dest`. Returns the written paths in archive order.
pub fn extract_documents(bundle: &str, bytes: &[u8], dest: &Path) -> Result<Vec<PathBuf>> {
    let extraction_error = |message: String| IngestError::Extraction {
        bundle: bundle.to_string(),
        message,
    };

    fs::create_dir_all(dest).map_err(|e| extraction_error(e.to_string()))?;

    let mut archive = Archive::new(GzDecoder::new(bytes));
    let entries = archive
        .entries()
        .map_err(|e| extraction_error(format!("cannot open archive: {}", e)))?;

    let mut written = Vec::new();
    for entry in entries {
        let mut entry = entry.map_err(|e| extraction_error(format!("corrupt entry: {}", e)))?;

        if !entry.header().entry_type().is_file() {
            continue;
        }

        let member = entry
            .path()
            .map_err(|e| extraction_error(format!("bad member name: {}", e)))?
            .into_owned();

        if !is_document(&member) {
            continue;
        }

        let Some(file_name) = member.file_name() else {
            continue;
        };

        let target = dest.join(file_name);
        entry
            .unpack(&target)
            .map_err(|e| extraction_error(format!("cannot unpack {}: {}", member.display(), e)))?;

        debug!(bundle, member = %member.display(), "extracted document");
        written.push(target);
    }

    Ok(written)
}

/// Lists the documents in `dir`, sorted by file name.
pub fn list_documents(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut documents = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_document(&path) {
            documents.push(path);
        }
    }
    documents.sort();
    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;

    fn build_bundle(members: &[(&str, &str)]) -> Vec<u8> {
        let encoder = GzEncoder::new(Vec::new(), Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (name, body) in members {
            let mut header = tar::Header::new_gnu();
            header.set_size(body.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, name, body.as_bytes()).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap()
    }

    #[test]
    fn test_extracts_only_json_members() {
        let bundle = build_bundle(&[
            ("IDV60910/IDV60910.95936.json", r#"{"observations":{"data":[]}}"#),
            ("IDV60910/IDV60910.95936.axf", "[data]"),
            ("IDV60910/README.JSON", "{}"),
            ("IDV60910.94868.json", r#"{"observations":{"data":[]}}"#),
        ]);
        let dir = tempfile::tempdir().unwrap();

        let written = extract_documents("IDV60910.tgz", &bundle, dir.path()).unwrap();

        assert_eq!(
            written,
            vec![
                dir.path().join("IDV60910.95936.json"),
                dir.path().join("IDV60910.94868.json"),
            ]
        );
        assert_eq!(
            fs::read_to_string(&written[0]).unwrap(),
            r#"{"observations":{"data":[]}}"#
        );
        assert_eq!(list_documents(dir.path()).unwrap().len(), 2);
    }

    #[test]
    fn test_bundle_without_documents_extracts_nothing() {
        let bundle = build_bundle(&[("notes.txt", "nothing here")]);
        let dir = tempfile::tempdir().unwrap();

        let written = extract_documents("IDD60910.tgz", &bundle, dir.path()).unwrap();
        assert!(written.is_empty());
    }

    #[test]
    fn test_corrupt_bundle_is_extraction_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = extract_documents("IDQ60910.tgz", b"definitely not gzip", dir.path());
        match result {
            Err(IngestError::Extraction { bundle, .. }) => assert_eq!(bundle, "IDQ60910.tgz"),
            other => panic!("expected Extraction error, got {:?}", other),
        }
    }

    #[test]
    fn test_list_documents_is_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.json"), "{}").unwrap();
        fs::write(dir.path().join("a.json"), "{}").unwrap();
        fs::write(dir.path().join("c.txt"), "").unwrap();

        let listed = list_documents(dir.path()).unwrap();
        assert_eq!(listed, vec![dir.path().join("a.json"), dir.path().join("b.json")]);
    }
}
