//! Probe Location Construction
//!
//! Builds the two candidate status-probe locations for a server base address:
//! - Primary: `base + /status.php`
//! - Fallback: `base + /kwdav + /status.php` (legacy DAV layout)

use url::Url;

/// Conventional status script path appended to a server base address
pub const STATUS_PATH: &str = "/status.php";

/// Legacy DAV segment inserted before the status script on the fallback probe
pub const FALLBACK_DAV_PATH: &str = "/kwdav";

/// Scheme prefix treated as a secure transport
pub const HTTPS_SCHEME: &str = "https";

#[derive(Debug, thiserror::Error)]
pub enum UrlError {
    #[error("Invalid URL format: {0}")]
    ParseError(#[from] url::ParseError),
    #[error("Missing host in URL")]
    MissingHost,
}

/// Primary and fallback probe locations derived from one base address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeCandidates {
    pub primary: String,
    pub fallback: String,
}

/// Build the primary and fallback status probe locations
///
/// Pure concatenation: no normalization and no validation. A malformed base
/// produces malformed locations that surface later as transport failures.
///
/// # Examples
/// - `https://cloud.example.com` → `https://cloud.example.com/status.php`
///   and `https://cloud.example.com/kwdav/status.php`
pub fn build_candidates(base_url: &str) -> ProbeCandidates {
    ProbeCandidates {
        primary: format!("{}{}", base_url, STATUS_PATH),
        fallback: format!("{}{}{}", base_url, FALLBACK_DAV_PATH, STATUS_PATH),
    }
}

/// Normalize base URL by trimming trailing slashes
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// Whether a URL string starts with the secure scheme (case-insensitive)
pub fn is_secure(url: &str) -> bool {
    url.get(..HTTPS_SCHEME.len())
        .map(|prefix| prefix.eq_ignore_ascii_case(HTTPS_SCHEME))
        .unwrap_or(false)
}

/// Render `scheme://host[:port]` for a parsed URL
///
/// The port is only included when it differs from the scheme default,
/// matching what `Url::port()` reports.
pub fn origin_of(url: &Url) -> Result<String, UrlError> {
    let host = url.host_str().ok_or(UrlError::MissingHost)?;

    let mut origin = format!("{}://{}", url.scheme(), host);
    if let Some(port) = url.port() {
        origin.push_str(&format!(":{}", port));
    }
    Ok(origin)
}
