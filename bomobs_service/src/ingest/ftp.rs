//! Bundle retrieval from the BOM anonymous FTP server
//!
//! Bundles are fetched whole into memory; the largest state bundle is a few
//! hundred kilobytes.
//!
//! Server: ftp://ftp.bom.gov.au/anon/gen/fwo/

use std::fmt;
use std::net::{SocketAddr, ToSocketAddrs};
use std::time::Duration;

use suppaftp::types::FileType;
use suppaftp::{FtpError, FtpStream, Status};
use tracing::{debug, info, warn};

use crate::config::SourceConfig;
use crate::error::{IngestError, Result};

/// Something that can hand over bundle bytes by name.
///
/// `Ok(None)` means the bundle does not exist on the remote side; the
/// pipeline skips it. Transport failures are errors.
pub trait BundleSource {
    fn fetch_bundle(&mut self, name: &str) -> Result<Option<Vec<u8>>>;
}

/// Joins the configured remote directory and a bundle file name.
pub fn remote_path(directory: &str, name: &str) -> String {
    if directory.ends_with('/') {
        format!("{}{}", directory, name)
    } else {
        format!("{}/{}", directory, name)
    }
}

/// A 550 reply means the file is not there.
fn is_not_found(err: &FtpError) -> bool {
    matches!(
        err,
        FtpError::UnexpectedResponse(response) if matches!(response.status, Status::FileUnavailable)
    )
}

/// Whether a directory listing shows the bundle. A 550 reply and an empty
/// listing both mean it is absent; any other failure is passed on.
fn listing_shows_bundle(
    listing: std::result::Result<Vec<String>, FtpError>,
) -> std::result::Result<bool, FtpError> {
    match listing {
        Ok(entries) => Ok(!entries.is_empty()),
        Err(e) if is_not_found(&e) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Tries each resolved address in order. `None` when there were no
/// addresses, otherwise the first success or the last error.
fn first_reachable<T, E, F>(
    addresses: impl IntoIterator<Item = SocketAddr>,
    mut attempt: F,
) -> Option<std::result::Result<T, E>>
where
    E: fmt::Display,
    F: FnMut(SocketAddr) -> std::result::Result<T, E>,
{
    let mut last = None;
    for socket in addresses {
        match attempt(socket) {
            Ok(connected) => return Some(Ok(connected)),
            Err(e) => {
                debug!(%socket, error = %e, "FTP connect attempt failed");
                last = Some(Err(e));
            }
        }
    }
    last
}

// ============================================================================
// FTP client
// ============================================================================

pub struct FtpBundleSource {
    stream: FtpStream,
    directory: String,
}

impl FtpBundleSource {
    /// Connects, logs in and switches to binary transfers.
    pub fn connect(config: &SourceConfig) -> Result<Self> {
        let address = format!("{}:{}", config.host, config.port);
        let connect_error = |message: String| IngestError::Retrieval {
            bundle: address.clone(),
            message,
        };

        let addresses = address
            .to_socket_addrs()
            .map_err(|e| connect_error(format!("cannot resolve host: {}", e)))?;

        let timeout = Duration::from_secs(config.connect_timeout_secs);
        let mut stream = first_reachable(addresses, |socket| FtpStream::connect_timeout(socket, timeout))
            .ok_or_else(|| connect_error("host resolved to no addresses".to_string()))?
            .map_err(|e| connect_error(e.to_string()))?;

        stream
            .login(config.username.as_str(), config.password.as_str())
            .map_err(|e| connect_error(format!("login failed: {}", e)))?;

        stream
            .transfer_type(FileType::Binary)
            .map_err(|e| connect_error(e.to_string()))?;

        info!(host = %address, "connected to FTP server");

        Ok(Self {
            stream,
            directory: config.directory.clone(),
        })
    }

    /// Ends the session. A failed goodbye is logged, not returned: every
    /// bundle has already been read by the time this is called.
    pub fn quit(mut self) {
        if let Err(e) = self.stream.quit() {
            warn!(error = %e, "FTP quit failed");
        }
    }
}

impl BundleSource for FtpBundleSource {
    fn fetch_bundle(&mut self, name: &str) -> Result<Option<Vec<u8>>> {
        let path = remote_path(&self.directory, name);
        let retrieval_error = |message: String| IngestError::Retrieval {
            bundle: name.to_string(),
            message,
        };

        let present = listing_shows_bundle(self.stream.list(Some(path.as_str())))
            .map_err(|e| retrieval_error(format!("listing failed: {}", e)))?;

        if !present {
            return Ok(None);
        }

        let buffer = self
            .stream
            .retr_as_buffer(&path)
            .map_err(|e| retrieval_error(format!("download failed: {}", e)))?;

        let bytes = buffer.into_inner();
        debug!(bundle = name, bytes = bytes.len(), "downloaded bundle");
        Ok(Some(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use suppaftp::types::Response;

    fn reply(status: Status) -> FtpError {
        FtpError::UnexpectedResponse(Response::new(status, b"reply".to_vec()))
    }

    #[test]
    fn test_remote_path_joins_with_single_slash() {
        assert_eq!(remote_path("/anon/gen/fwo/", "IDV60910.tgz"), "/anon/gen/fwo/IDV60910.tgz");
        assert_eq!(remote_path("/anon/gen/fwo", "IDV60910.tgz"), "/anon/gen/fwo/IDV60910.tgz");
    }

    #[test]
    fn test_file_unavailable_reply_means_not_found() {
        assert!(is_not_found(&reply(Status::FileUnavailable)));
        assert!(!is_not_found(&reply(Status::NotLoggedIn)));
    }

    #[test]
    fn test_listing_decides_between_skip_and_failure() {
        assert!(listing_shows_bundle(Ok(vec!["-rw-r--r-- 1 ftp ftp 48213 Jun 15 14:30 IDV60910.tgz".to_string()])).unwrap());
        assert!(!listing_shows_bundle(Ok(Vec::new())).unwrap());
        assert!(!listing_shows_bundle(Err(reply(Status::FileUnavailable))).unwrap());

        let failure = listing_shows_bundle(Err(reply(Status::NotLoggedIn)));
        assert!(failure.is_err(), "other replies must fail the run, not skip the bundle");
    }

    #[test]
    fn test_connect_falls_through_to_next_address() {
        let v6: SocketAddr = "[2001:db8::1]:21".parse().unwrap();
        let v4: SocketAddr = "192.0.2.10:21".parse().unwrap();

        let mut tried = Vec::new();
        let outcome = first_reachable(vec![v6, v4], |socket| {
            tried.push(socket);
            if socket.is_ipv6() { Err("network unreachable") } else { Ok(socket) }
        });

        assert_eq!(outcome, Some(Ok(v4)));
        assert_eq!(tried, vec![v6, v4]);
    }

    #[test]
    fn test_connect_reports_last_error_when_all_fail() {
        let addresses: Vec<SocketAddr> = vec!["192.0.2.10:21".parse().unwrap(), "192.0.2.11:21".parse().unwrap()];

        let outcome: Option<std::result::Result<(), String>> =
            first_reachable(addresses, |socket| Err(format!("timed out: {}", socket)));
        assert_eq!(outcome, Some(Err("timed out: 192.0.2.11:21".to_string())));

        let none: Option<std::result::Result<(), String>> = first_reachable(Vec::new(), |_| Ok(()));
        assert_eq!(none, None);
    }
}
