//! Source bundle registry.
//!
//! Defines the observation bundles fetched on every run, one per state or
//! territory. Each bundle is a gzipped tarball holding one JSON document per
//! station with that station's recent half-hourly observations. This is the
//! single source of truth for bundle names; configuration may narrow the
//! list but defaults to all of them.

// ---------------------------------------------------------------------------
// Remote location
// ---------------------------------------------------------------------------

/// Anonymous FTP host publishing the bundles.
pub const FTP_HOST: &str = "ftp.bom.gov.au";

pub const FTP_PORT: u16 = 21;

/// Remote directory holding the bundles.
pub const FTP_DIRECTORY: &str = "/anon/gen/fwo/";

// ---------------------------------------------------------------------------
// Bundle metadata
// ---------------------------------------------------------------------------

/// Metadata for a single observation bundle.
pub struct Bundle {
    /// Remote file name, e.g. `IDV60910.tgz`.
    pub file_name: &'static str,
    /// State or territory covered by the bundle.
    pub region: &'static str,
}

/// All bundles fetched per run, in fetch order.
pub static BUNDLE_REGISTRY: &[Bundle] = &[
    Bundle {
        file_name: "IDD60910.tgz",
        region: "Northern Territory",
    },
    Bundle {
        file_name: "IDQ60910.tgz",
        region: "Queensland",
    },
    Bundle {
        file_name: "IDT60910.tgz",
        region: "Tasmania",
    },
    Bundle {
        file_name: "IDW60910.tgz",
        region: "Western Australia",
    },
    Bundle {
        file_name: "IDN60910.tgz",
        region: "New South Wales and Australian Capital Territory",
    },
    Bundle {
        file_name: "IDS60910.tgz",
        region: "South Australia",
    },
    Bundle {
        file_name: "IDV60910.tgz",
        region: "Victoria",
    },
];

/// File names of every registered bundle, suitable as the default bundle
/// list in configuration.
pub fn all_bundle_names() -> Vec<String> {
    BUNDLE_REGISTRY
        .iter()
        .map(|b| b.file_name.to_string())
        .collect()
}

/// Looks up a bundle by file name. Returns `None` if not registered.
pub fn find_bundle(file_name: &str) -> Option<&'static Bundle> {
    BUNDLE_REGISTRY.iter().find(|b| b.file_name == file_name)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
