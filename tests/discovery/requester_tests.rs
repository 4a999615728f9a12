/*!
Tests for status probe execution.

Covers the primary/fallback substitution, the fixed timeout policy, transport
redirect delegation and the manual hop-by-hop redirect loop.
*/

use std::time::Duration;

use ocstatus::core::debug_logger::DebugLogger;
use ocstatus::core::discovery::requester::{
    request, request_following_redirects, RequestError, TRY_CONNECTION_TIMEOUT_MS,
};
use ocstatus::core::discovery::{ProbeMethod, TransportError};

use crate::common::{MockTransport, OWNCLOUD_STATUS};

fn logger() -> DebugLogger {
    DebugLogger::disabled()
}

#[test]
fn test_primary_success_skips_fallback() {
    let transport = MockTransport::new().respond("https://cloud.com/status.php", 200, OWNCLOUD_STATUS);

    let result = request("https://cloud.com", &transport, &logger());

    assert_eq!(result.status, Some(200));
    assert_eq!(result.outcome.method, ProbeMethod::Primary);
    assert_eq!(result.last_location, "https://cloud.com/status.php");
    assert!(!result.redirected_to_insecure);
    assert!(result.detail.fallback_url.is_none());
    assert_eq!(transport.requested_urls(), vec!["https://cloud.com/status.php"]);
}

#[test]
fn test_fixed_timeouts_and_permanent_redirects() {
    let transport = MockTransport::new().respond("https://cloud.com/status.php", 200, OWNCLOUD_STATUS);

    request("https://cloud.com", &transport, &logger());

    let sent = &transport.requests()[0];
    assert_eq!(sent.connect_timeout, Duration::from_millis(TRY_CONNECTION_TIMEOUT_MS));
    assert_eq!(sent.read_timeout, Duration::from_secs(5));
    assert!(sent.follow_permanent_redirects);
}

#[test]
fn test_fallback_on_non_ok_primary() {
    let transport = MockTransport::new()
        .respond("https://cloud.com/status.php", 404, "Not Found")
        .respond("https://cloud.com/kwdav/status.php", 200, OWNCLOUD_STATUS);

    let result = request("https://cloud.com", &transport, &logger());

    assert_eq!(result.status, Some(200));
    assert_eq!(result.outcome.method, ProbeMethod::Fallback);
    assert_eq!(result.last_location, "https://cloud.com/kwdav/status.php");
    assert_eq!(
        result.detail.fallback_url.as_deref(),
        Some("https://cloud.com/kwdav/status.php")
    );
    assert!(transport.requests().iter().all(|r| r.follow_permanent_redirects));
}

#[test]
fn test_fallback_on_transport_error() {
    let transport = MockTransport::new()
        .fail(
            "https://cloud.com/status.php",
            TransportError::Timeout("5000ms".to_string()),
        )
        .respond("https://cloud.com/kwdav/status.php", 200, OWNCLOUD_STATUS);

    let result = request("https://cloud.com", &transport, &logger());
    assert_eq!(result.status, Some(200));
    assert_eq!(result.outcome.method, ProbeMethod::Fallback);
}

#[test]
fn test_last_attempt_returned_when_both_fail() {
    let transport = MockTransport::new()
        .respond("https://cloud.com/status.php", 500, "")
        .respond("https://cloud.com/kwdav/status.php", 503, "down");

    let result = request("https://cloud.com", &transport, &logger());

    assert_eq!(result.status, Some(503));
    assert_eq!(result.outcome.method, ProbeMethod::Fallback);
    assert_eq!(result.outcome.body(), "down");
    // Exactly two attempts, no further retries
    assert_eq!(transport.requests().len(), 2);
}

#[test]
fn test_no_response_status_is_none() {
    let transport = MockTransport::new();

    let result = request("https://cloud.com", &transport, &logger());
    assert_eq!(result.status, None);
    assert!(result.outcome.response.is_err());
    assert_eq!(result.last_location, "https://cloud.com/kwdav/status.php");
}

#[test]
fn test_transport_redirect_final_url_reported() {
    let transport = MockTransport::new().respond_via(
        "https://cloud.com/status.php",
        "https://files.cloud.com/owncloud/status.php",
        200,
        OWNCLOUD_STATUS,
    );

    let result = request("https://cloud.com", &transport, &logger());
    assert_eq!(result.last_location, "https://files.cloud.com/owncloud/status.php");
    assert!(!result.redirected_to_insecure);
}

#[test]
fn test_transport_redirect_to_http_flags_downgrade() {
    let transport = MockTransport::new().respond_via(
        "https://cloud.com/status.php",
        "http://cloud.com/status.php",
        200,
        OWNCLOUD_STATUS,
    );

    let result = request("https://cloud.com", &transport, &logger());
    assert!(result.redirected_to_insecure);
}

#[test]
fn test_manual_mode_disables_transport_redirects() {
    let transport = MockTransport::new().respond("https://cloud.com/status.php", 200, OWNCLOUD_STATUS);

    let result = request_following_redirects("https://cloud.com", &transport, 10, &logger()).unwrap();

    assert_eq!(result.status, Some(200));
    assert!(transport.requests().iter().all(|r| !r.follow_permanent_redirects));
}

#[test]
fn test_manual_mode_follows_each_hop() {
    let transport = MockTransport::new()
        .redirect("https://cloud.com/status.php", 302, "https://other.one/")
        .redirect("https://other.one/status.php", 301, "/owncloud/status.php")
        .respond("https://other.one/owncloud/status.php", 200, OWNCLOUD_STATUS);

    let result = request_following_redirects("https://cloud.com", &transport, 10, &logger()).unwrap();

    assert_eq!(result.status, Some(200));
    assert_eq!(result.last_location, "https://other.one/owncloud/status.php");
    assert_eq!(
        result.detail.redirect_hops,
        vec![
            "https://other.one/status.php".to_string(),
            "https://other.one/owncloud/status.php".to_string(),
        ]
    );
    assert!(!result.redirected_to_insecure);
}

#[test]
fn test_manual_mode_downgrade_anywhere_in_chain() {
    let transport = MockTransport::new()
        .redirect("https://cloud.com/status.php", 302, "http://plain.cloud.com/status.php")
        .redirect("http://plain.cloud.com/status.php", 302, "https://cloud.com/final/status.php")
        .respond("https://cloud.com/final/status.php", 200, OWNCLOUD_STATUS);

    let result = request_following_redirects("https://cloud.com", &transport, 10, &logger()).unwrap();

    assert_eq!(result.last_location, "https://cloud.com/final/status.php");
    assert!(result.redirected_to_insecure);
}

#[test]
fn test_manual_mode_insecure_only_chain_not_flagged() {
    let transport = MockTransport::new()
        .redirect("http://cloud.lan/status.php", 302, "http://cloud.lan:8080/")
        .respond("http://cloud.lan:8080/status.php", 200, OWNCLOUD_STATUS);

    let result = request_following_redirects("http://cloud.lan", &transport, 10, &logger()).unwrap();
    assert_eq!(result.status, Some(200));
    assert!(!result.redirected_to_insecure);
}

#[test]
fn test_manual_mode_falls_back_and_carries_flag() {
    let transport = MockTransport::new()
        .redirect("https://cloud.com/status.php", 307, "http://cloud.com/missing.php")
        .respond("http://cloud.com/missing.php", 404, "")
        .respond("https://cloud.com/kwdav/status.php", 200, OWNCLOUD_STATUS);

    let result = request_following_redirects("https://cloud.com", &transport, 10, &logger()).unwrap();

    assert_eq!(result.outcome.method, ProbeMethod::Fallback);
    assert_eq!(result.last_location, "https://cloud.com/kwdav/status.php");
    assert!(result.redirected_to_insecure);
}

#[test]
fn test_manual_mode_redirect_without_location_is_terminal() {
    let transport = MockTransport::new()
        .respond("https://cloud.com/status.php", 302, "")
        .respond("https://cloud.com/kwdav/status.php", 302, "");

    let result = request_following_redirects("https://cloud.com", &transport, 10, &logger()).unwrap();
    assert_eq!(result.status, Some(302));
    assert_eq!(transport.requests().len(), 2);
}

#[test]
fn test_manual_mode_hop_bound() {
    let transport = MockTransport::new()
        .redirect("https://cloud.com/status.php", 302, "/loop/status.php")
        .redirect("https://cloud.com/loop/status.php", 302, "/status.php");

    let error = request_following_redirects("https://cloud.com", &transport, 3, &logger()).unwrap_err();

    match error {
        RequestError::TooManyRedirects { hops, method, .. } => {
            assert_eq!(hops, 3);
            assert_eq!(method, ProbeMethod::Primary);
        }
        other => panic!("unexpected error: {}", other),
    }
    // Initial probe plus three followed hops, then the unanswered fallback
    assert_eq!(transport.requests().len(), 5);
    assert_eq!(
        transport.requested_urls().last().map(String::as_str),
        Some("https://cloud.com/kwdav/status.php")
    );
}

#[test]
fn test_manual_mode_looping_primary_falls_back() {
    let transport = MockTransport::new()
        .redirect("https://cloud.com/status.php", 302, "/status.php")
        .respond("https://cloud.com/kwdav/status.php", 200, OWNCLOUD_STATUS);

    let result = request_following_redirects("https://cloud.com", &transport, 3, &logger()).unwrap();

    assert_eq!(result.status, Some(200));
    assert_eq!(result.outcome.method, ProbeMethod::Fallback);
    assert_eq!(result.last_location, "https://cloud.com/kwdav/status.php");
    assert_eq!(
        result.detail.fallback_url.as_deref(),
        Some("https://cloud.com/kwdav/status.php")
    );
    assert!(!result.redirected_to_insecure);
}

#[test]
fn test_manual_mode_looping_primary_keeps_downgrade_for_fallback() {
    let transport = MockTransport::new()
        .redirect("https://cloud.com/status.php", 302, "http://cloud.com/status.php")
        .redirect("http://cloud.com/status.php", 302, "/status.php")
        .respond("https://cloud.com/kwdav/status.php", 200, OWNCLOUD_STATUS);

    let result = request_following_redirects("https://cloud.com", &transport, 3, &logger()).unwrap();

    assert_eq!(result.outcome.method, ProbeMethod::Fallback);
    assert!(result.redirected_to_insecure);
}

#[test]
fn test_manual_mode_invalid_redirect_base() {
    // Path-rooted redirect cannot be rebased onto a base without a host
    let transport = MockTransport::new().redirect("file:///srv/status.php", 302, "/other/status.php");

    let error = request_following_redirects("file:///srv", &transport, 10, &logger()).unwrap_err();
    assert!(matches!(error, RequestError::InvalidRedirect { .. }));
}
