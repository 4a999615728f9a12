//! Status Probe Transport
//!
//! Provides the blocking HTTP client abstraction used by the probe executor:
//! GET only, response body access, final URL after redirects and the raw
//! `Location` header for callers that follow redirects themselves.

use std::time::Duration;

#[cfg(feature = "network")]
use crate::core::discovery::redirect::is_permanent_redirect;
#[cfg(feature = "network")]
use isahc::config::{Configurable, RedirectPolicy};
#[cfg(feature = "network")]
use isahc::{HttpClient, Request};
#[cfg(feature = "network")]
use std::io::Read;
#[cfg(feature = "network")]
use std::time::Instant;

/// Upper bound on permanent redirects followed inside one transport call
pub const TRANSPORT_MAX_REDIRECTS: u32 = 10;

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),
    #[error("Request timed out: {0}")]
    Timeout(String),
    #[error("Connection failed: {0}")]
    Connect(String),
    #[error("Request failed: {0}")]
    Request(String),
    #[error("Failed to read response body: {0}")]
    Body(String),
}

/// One GET issued against a probe location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeRequest {
    pub url: String,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    /// Let the transport follow 301/308 responses on its own
    pub follow_permanent_redirects: bool,
}

/// Response data reported back by the transport
#[derive(Debug, Clone)]
pub struct ProbeResponse {
    /// HTTP status code of the last response received
    pub status_code: u16,
    /// Response body as text (expected to be JSON)
    pub body: String,
    /// URL of the last request issued, after any redirects the transport followed
    pub final_url: String,
    /// Raw `Location` header of the last response, if any
    pub location: Option<String>,
    /// Wall-clock time spent in the transport
    pub duration: Duration,
}

/// Blocking HTTP client for status probes
///
/// # Implementation Requirements
/// * Must use GET method with no request body
/// * Must honor both timeouts on every request it issues
/// * Must only follow 301/308 and only when `follow_permanent_redirects` is set
/// * Must report the URL actually reached in `final_url`
pub trait StatusTransport: Send + Sync {
    fn get(&self, request: &ProbeRequest) -> Result<ProbeResponse, TransportError>;
}

impl<T: StatusTransport + ?Sized> StatusTransport for &T {
    fn get(&self, request: &ProbeRequest) -> Result<ProbeResponse, TransportError> {
        (**self).get(request)
    }
}

impl<T: StatusTransport + ?Sized> StatusTransport for Box<T> {
    fn get(&self, request: &ProbeRequest) -> Result<ProbeResponse, TransportError> {
        (**self).get(request)
    }
}

/// Production transport using isahc with the blocking API
#[cfg(feature = "network")]
pub struct IsahcTransport {
    client: HttpClient,
    user_agent: String,
}

#[cfg(feature = "network")]
impl IsahcTransport {
    pub fn new(user_agent: impl Into<String>) -> Result<Self, TransportError> {
        let client = HttpClient::builder()
            .redirect_policy(RedirectPolicy::None) // Redirects are handled below
            .build()
            .map_err(|e| TransportError::Request(format!("Failed to create status client: {}", e)))?;
        Ok(Self {
            client,
            user_agent: user_agent.into(),
        })
    }

    fn send_once(
        &self,
        url: &str,
        request: &ProbeRequest,
    ) -> Result<(u16, String, Option<String>), TransportError> {
        let http_request = Request::get(url)
            .connect_timeout(request.connect_timeout)
            .low_speed_timeout(1, request.read_timeout)
            .redirect_policy(RedirectPolicy::None)
            .header("User-Agent", self.user_agent.as_str())
            .header("Accept", "application/json")
            .body(Vec::new())
            .map_err(|e| TransportError::InvalidUrl(format!("{}: {}", url, e)))?;

        let mut response = self.client.send(http_request).map_err(classify_error)?;

        let status_code = response.status().as_u16();
        let location = response
            .headers()
            .get(isahc::http::header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        let mut raw_body = Vec::new();
        response
            .body_mut()
            .read_to_end(&mut raw_body)
            .map_err(|e| TransportError::Body(e.to_string()))?;
        let body = String::from_utf8_lossy(&raw_body).into_owned();

        Ok((status_code, body, location))
    }
}

#[cfg(feature = "network")]
impl StatusTransport for IsahcTransport {
    fn get(&self, request: &ProbeRequest) -> Result<ProbeResponse, TransportError> {
        let start = Instant::now();
        let mut current = request.url.clone();
        let mut hops = 0;

        loop {
            let (status_code, body, location) = self.send_once(&current, request)?;

            let next = match (&location, request.follow_permanent_redirects) {
                (Some(target), true)
                    if is_permanent_redirect(status_code) && hops < TRANSPORT_MAX_REDIRECTS =>
                {
                    resolve_location(&current, target)
                }
                _ => None,
            };

            match next {
                Some(next) => {
                    hops += 1;
                    current = next;
                }
                None => {
                    return Ok(ProbeResponse {
                        status_code,
                        body,
                        final_url: current,
                        location,
                        duration: start.elapsed(),
                    });
                }
            }
        }
    }
}

/// Resolve a `Location` header against the URL that produced it
#[cfg(feature = "network")]
fn resolve_location(current: &str, location: &str) -> Option<String> {
    url::Url::parse(current)
        .and_then(|base| base.join(location))
        .map(|resolved| resolved.to_string())
        .ok()
}

#[cfg(feature = "network")]
fn classify_error(error: isahc::Error) -> TransportError {
    use isahc::error::ErrorKind;

    match error.kind() {
        ErrorKind::Timeout => TransportError::Timeout(error.to_string()),
        ErrorKind::ConnectionFailed | ErrorKind::NameResolution => {
            TransportError::Connect(error.to_string())
        }
        ErrorKind::InvalidRequest => TransportError::InvalidUrl(error.to_string()),
        _ => TransportError::Request(error.to_string()),
    }
}
