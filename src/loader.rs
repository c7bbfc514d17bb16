//! Document loading from files and HTTP URLs.
//!
//! Documents are returned as text: the equivalence check works on the
//! serialized form, so the original bytes are kept alongside the parsed tree.

use std::path::Path;

use crate::error::HoistError;

#[cfg(feature = "remote")]
use std::time::Duration;

/// Default timeout for HTTP requests (10 seconds).
#[cfg(feature = "remote")]
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Load a document from a file path.
///
/// # Errors
///
/// Returns `HoistError::FileNotFound` if the file doesn't exist, or
/// `HoistError::ReadError` if it cannot be read as UTF-8 text.
pub fn load_document(path: &Path) -> Result<String, HoistError> {
    if !path.exists() {
        return Err(HoistError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    std::fs::read_to_string(path).map_err(|source| HoistError::ReadError {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a document from an HTTP/HTTPS URL.
///
/// Requires the `remote` feature (enabled by default).
#[cfg(feature = "remote")]
pub fn load_document_url(url: &str) -> Result<String, HoistError> {
    let network_error = |source: reqwest::Error| HoistError::NetworkError {
        url: url.to_string(),
        source,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(network_error)?;

    client
        .get(url)
        .send()
        .and_then(|response| response.error_for_status())
        .and_then(|response| response.text())
        .map_err(network_error)
}

/// Check if a string looks like a URL (starts with http:// or https://).
pub fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Load from a URL or a file path, whichever `source` looks like.
pub fn load_document_auto(source: &str) -> Result<String, HoistError> {
    if is_url(source) {
        #[cfg(feature = "remote")]
        {
            load_document_url(source)
        }
        #[cfg(not(feature = "remote"))]
        {
            Err(HoistError::FileNotFound {
                path: std::path::PathBuf::from(source),
            })
        }
    } else {
        load_document(Path::new(source))
    }
}
