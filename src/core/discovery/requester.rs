//! Status Probe Execution
//!
//! Runs the status probe against the primary and fallback candidate locations:
//! - Transport mode: the transport follows permanent redirects on its own
//! - Manual mode: every redirect hop is rebased and checked for a downgrade here
//! - Single fallback substitution when the primary does not answer HTTP 200

use std::time::{Duration, Instant};

use crate::core::debug_logger::DebugLogger;
use crate::core::discovery::client::{ProbeRequest, StatusTransport};
use crate::core::discovery::location::{build_candidates, UrlError};
use crate::core::discovery::redirect::{is_downgraded, is_redirect_status, rebase};
use crate::core::discovery::types::{
    ProbeDetail, ProbeMethod, ProbeOutcome, RequestResult, HTTP_OK,
};

/// Maximum time to wait while the connection is being tested, per attempt
pub const TRY_CONNECTION_TIMEOUT_MS: u64 = 5_000;

/// Default hop bound for manual redirect following
pub const DEFAULT_MAX_REDIRECT_HOPS: u32 = 10;

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("Invalid redirect from {location}: {source}")]
    InvalidRedirect {
        location: String,
        method: ProbeMethod,
        #[source]
        source: UrlError,
    },
    #[error("Too many redirects ({hops}) starting at {location}")]
    TooManyRedirects {
        location: String,
        method: ProbeMethod,
        hops: u32,
    },
}

fn probe_request(url: &str, follow_permanent_redirects: bool) -> ProbeRequest {
    ProbeRequest {
        url: url.to_string(),
        connect_timeout: Duration::from_millis(TRY_CONNECTION_TIMEOUT_MS),
        read_timeout: Duration::from_millis(TRY_CONNECTION_TIMEOUT_MS),
        follow_permanent_redirects,
    }
}

fn execute(
    transport: &dyn StatusTransport,
    logger: &DebugLogger,
    correlation_id: &str,
    url: &str,
    method: ProbeMethod,
    follow_permanent_redirects: bool,
) -> ProbeOutcome {
    let start = Instant::now();
    logger.probe_start(method.as_str(), url, TRY_CONNECTION_TIMEOUT_MS, correlation_id);

    let response = transport.get(&probe_request(url, follow_permanent_redirects));

    let status = response.as_ref().ok().map(|r| r.status_code);
    logger.probe_end(
        method.as_str(),
        status,
        start.elapsed().as_millis() as u64,
        correlation_id,
    );
    if let Err(e) = &response {
        logger.error_sync("StatusRequester", "transport_error", &e.to_string());
    }

    ProbeOutcome {
        attempted_url: url.to_string(),
        method,
        response,
    }
}

fn new_detail(primary_url: &str) -> ProbeDetail {
    ProbeDetail {
        primary_url: primary_url.to_string(),
        fallback_url: None,
        redirect_hops: Vec::new(),
        checked_at: chrono::Local::now().to_rfc3339(),
        response_time_ms: 0,
    }
}

/// Probe `base_location` letting the transport follow permanent redirects
///
/// # Behavior
/// 1. GET `base + /status.php`, permanent redirects followed by the transport
/// 2. If the status is not HTTP 200, GET `base + /kwdav/status.php` instead
/// 3. Return the last attempt, whatever its status
///
/// The downgrade flag compares the attempted location with the final URL the
/// transport reports, so only the endpoints of the hidden chain are checked.
pub fn request(
    base_location: &str,
    transport: &dyn StatusTransport,
    logger: &DebugLogger,
) -> RequestResult {
    let correlation_id = logger.new_correlation_id();
    let start_time = Instant::now();
    let candidates = build_candidates(base_location);
    let mut detail = new_detail(&candidates.primary);

    let mut outcome = execute(
        transport,
        logger,
        &correlation_id,
        &candidates.primary,
        ProbeMethod::Primary,
        true,
    );

    if outcome.status_code() != Some(HTTP_OK) {
        detail.fallback_url = Some(candidates.fallback.clone());
        outcome = execute(
            transport,
            logger,
            &correlation_id,
            &candidates.fallback,
            ProbeMethod::Fallback,
            true,
        );
    }

    let last_location = outcome
        .response
        .as_ref()
        .map(|r| r.final_url.clone())
        .unwrap_or_else(|_| outcome.attempted_url.clone());

    let redirected_to_insecure = is_downgraded(false, &outcome.attempted_url, &last_location);
    if redirected_to_insecure {
        logger.downgrade_detected(&outcome.attempted_url, &last_location, &correlation_id);
    }

    detail.response_time_ms = start_time.elapsed().as_millis() as u64;

    RequestResult {
        status: outcome.status_code(),
        outcome,
        last_location,
        redirected_to_insecure,
        detail,
    }
}

/// Result of walking one redirect chain by hand
struct ChainEnd {
    outcome: ProbeOutcome,
    last_location: String,
}

impl ChainEnd {
    fn is_ok(&self) -> bool {
        self.outcome.status_code() == Some(HTTP_OK)
    }
}

/// Walk one redirect chain, folding every hop into `downgraded`
///
/// The flag is updated in place so it survives a chain that stops early.
#[allow(clippy::too_many_arguments)]
fn follow_chain(
    start_location: &str,
    method: ProbeMethod,
    downgraded: &mut bool,
    max_hops: u32,
    transport: &dyn StatusTransport,
    logger: &DebugLogger,
    correlation_id: &str,
    detail: &mut ProbeDetail,
) -> Result<ChainEnd, RequestError> {
    let mut current = start_location.to_string();
    let mut hops = 0;

    loop {
        let outcome = execute(transport, logger, correlation_id, &current, method, false);

        let redirect_target = match &outcome.response {
            Ok(response) if response.status_code != HTTP_OK && is_redirect_status(response.status_code) => {
                response.location.clone().filter(|location| !location.is_empty())
            }
            _ => None,
        };

        let Some(target) = redirect_target else {
            return Ok(ChainEnd {
                outcome,
                last_location: current,
            });
        };

        if hops >= max_hops {
            return Err(RequestError::TooManyRedirects {
                location: start_location.to_string(),
                method,
                hops,
            });
        }

        let next = rebase(&current, &target).map_err(|source| RequestError::InvalidRedirect {
            location: current.clone(),
            method,
            source,
        })?;

        let was_downgraded = *downgraded;
        *downgraded = is_downgraded(was_downgraded, &current, &next);
        if *downgraded && !was_downgraded {
            logger.downgrade_detected(&current, &next, correlation_id);
        }

        hops += 1;
        logger.redirect_hop(&current, &next, hops, correlation_id);
        detail.redirect_hops.push(next.clone());
        current = next;
    }
}

/// Probe `base_location` following every redirect hop manually
///
/// The transport is told not to follow redirects. Each 3xx with a `Location`
/// header is rebased onto the previous location and folded into the
/// downgrade flag. If the primary chain does not end in HTTP 200, including
/// a chain stopped by the hop bound or an unusable redirect, the fallback
/// chain is walked the same way, carrying the flag forward.
///
/// # Returns
/// * `Ok(RequestResult)` - last attempt of the last chain walked
/// * `Err(RequestError)` - the primary chain stopped early and the fallback
///   did not answer HTTP 200, or the fallback chain itself stopped early
pub fn request_following_redirects(
    base_location: &str,
    transport: &dyn StatusTransport,
    max_hops: u32,
    logger: &DebugLogger,
) -> Result<RequestResult, RequestError> {
    let correlation_id = logger.new_correlation_id();
    let start_time = Instant::now();
    let candidates = build_candidates(base_location);
    let mut detail = new_detail(&candidates.primary);
    let mut downgraded = false;

    let primary = follow_chain(
        &candidates.primary,
        ProbeMethod::Primary,
        &mut downgraded,
        max_hops,
        transport,
        logger,
        &correlation_id,
        &mut detail,
    );

    let end = match primary {
        Ok(end) if end.is_ok() => end,
        primary => {
            if let Err(e) = &primary {
                logger.error_sync("StatusRequester", "primary_chain_stopped", &e.to_string());
            }
            detail.fallback_url = Some(candidates.fallback.clone());
            let fallback = follow_chain(
                &candidates.fallback,
                ProbeMethod::Fallback,
                &mut downgraded,
                max_hops,
                transport,
                logger,
                &correlation_id,
                &mut detail,
            )?;

            match primary {
                Err(e) if !fallback.is_ok() => return Err(e),
                _ => fallback,
            }
        }
    };

    detail.response_time_ms = start_time.elapsed().as_millis() as u64;

    Ok(RequestResult {
        status: end.outcome.status_code(),
        outcome: end.outcome,
        last_location: end.last_location,
        redirected_to_insecure: downgraded,
        detail,
    })
}
