//! Redirect Rebasing and Downgrade Tracking
//!
//! Pure helpers for callers that follow status-probe redirects hop by hop.
//! Neither function performs I/O.

use crate::core::discovery::location::{is_secure, origin_of, UrlError, STATUS_PATH};
use url::Url;

/// Fold one redirect hop into the downgrade flag
///
/// Returns `true` when the flag was already set, or when this hop moves from
/// a secure base to an insecure target. A chain that is insecure from the
/// start is never flagged.
///
/// # Examples
/// - `(false, "https://a", "http://b")` → `true`
/// - `(false, "http://a", "http://b")` → `false`
/// - `(true, "http://a", "http://b")` → `true`
pub fn is_downgraded(downgraded_before: bool, base_url: &str, redirected_url: &str) -> bool {
    downgraded_before || (is_secure(base_url) && !is_secure(redirected_url))
}

/// Compute the next location to probe after a redirect
///
/// Three shapes of `Location` target are handled:
/// - Ends with `/`: a new server root. Trailing slashes are trimmed and the
///   status path is appended, e.g. `https://other.one/` → `https://other.one/status.php`.
/// - Not path-rooted: already absolute, returned unchanged.
/// - Path-rooted (`/newpath/status.php`): kept on the origin of `old_location`.
///
/// # Returns
/// * `Err(UrlError)` - only for the path-rooted case, when `old_location`
///   cannot be parsed or has no host
pub fn rebase(old_location: &str, redirected_location: &str) -> Result<String, UrlError> {
    if redirected_location.ends_with('/') {
        return Ok(format!(
            "{}{}",
            redirected_location.trim_end_matches('/'),
            STATUS_PATH
        ));
    }

    if !redirected_location.starts_with('/') {
        return Ok(redirected_location.to_string());
    }

    let old = Url::parse(old_location)?;
    Ok(format!("{}{}", origin_of(&old)?, redirected_location))
}

/// Whether a status code carries a redirect target worth following
pub fn is_redirect_status(status_code: u16) -> bool {
    matches!(status_code, 301 | 302 | 303 | 307 | 308)
}

/// Whether a status code is a permanent redirect (followed by the transport)
pub fn is_permanent_redirect(status_code: u16) -> bool {
    matches!(status_code, 301 | 308)
}
