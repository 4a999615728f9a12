// Core types for server discovery
use crate::core::discovery::client::{ProbeResponse, TransportError};
use crate::core::discovery::version::ServerVersion;
use serde::Serialize;

/// Which candidate location produced an outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeMethod {
    Primary,
    Fallback,
}

impl ProbeMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            ProbeMethod::Primary => "primary",
            ProbeMethod::Fallback => "fallback",
        }
    }
}

/// Result of one executed probe attempt
#[derive(Debug, Clone)]
pub struct ProbeOutcome {
    /// Location the GET was issued against
    pub attempted_url: String,
    pub method: ProbeMethod,
    pub response: Result<ProbeResponse, TransportError>,
}

impl ProbeOutcome {
    pub fn status_code(&self) -> Option<u16> {
        self.response.as_ref().ok().map(|r| r.status_code)
    }

    pub fn body(&self) -> &str {
        self.response.as_ref().map(|r| r.body.as_str()).unwrap_or("")
    }
}

/// Diagnostics recorded over one probe sequence
#[derive(Debug, Clone, Serialize)]
pub struct ProbeDetail {
    pub primary_url: String,
    /// Set only when the fallback location was actually probed
    pub fallback_url: Option<String>,
    /// Locations visited through manual redirect following, in order
    pub redirect_hops: Vec<String>,
    /// Timestamp when the sequence started (RFC 3339, local time)
    pub checked_at: String,
    pub response_time_ms: u64,
}

/// Everything the interpreter needs from the executor
#[derive(Debug, Clone)]
pub struct RequestResult {
    /// Last attempt made, successful or not
    pub outcome: ProbeOutcome,
    /// Status of the last attempt; `None` when no response was received
    pub status: Option<u16>,
    /// Final location reached by the last attempt
    pub last_location: String,
    /// A secure-to-insecure hop was seen somewhere in the chain
    pub redirected_to_insecure: bool,
    pub detail: ProbeDetail,
}

impl RequestResult {
    pub fn is_success(&self) -> bool {
        self.status == Some(HTTP_OK)
    }
}

pub const HTTP_OK: u16 = 200;

/// Transport security classification of a successful discovery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionSecurity {
    /// Requested base address used https
    Secure,
    /// Requested base address used plain http
    Insecure,
    /// An https chain was redirected to plain http along the way
    RedirectedToInsecure,
}

/// Server information returned on success
#[derive(Debug, Clone, Serialize)]
pub struct ServerInfo {
    pub version: ServerVersion,
    /// Final base address for subsequent API calls, without the status path
    pub base_url: String,
    pub is_secure_connection: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// No response: timeout, connect or socket error
    Transport,
    /// Response received with a non-OK status
    Http,
    /// Body could not be parsed as a status descriptor
    MalformedBody,
    /// A URL in the chain could not be parsed
    InvalidUrl,
    /// Manual redirect following hit the hop bound
    TooManyRedirects,
}

/// Diagnostics carried by a failed discovery
#[derive(Debug, Clone, Serialize)]
pub struct FailureDetail {
    pub kind: FailureKind,
    pub method: Option<ProbeMethod>,
    /// Location of the failing attempt
    pub location: String,
    pub status_code: Option<u16>,
    pub message: String,
}

/// Terminal outcome of one discovery sequence
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum DiscoveryResult {
    Success {
        info: ServerInfo,
        security: ConnectionSecurity,
    },
    NotConfigured,
    Failure(FailureDetail),
}

impl DiscoveryResult {
    pub fn is_success(&self) -> bool {
        matches!(self, DiscoveryResult::Success { .. })
    }

    pub fn server_info(&self) -> Option<&ServerInfo> {
        match self {
            DiscoveryResult::Success { info, .. } => Some(info),
            _ => None,
        }
    }

    /// Short label used in logs and CLI output
    pub fn label(&self) -> &'static str {
        match self {
            DiscoveryResult::Success {
                security: ConnectionSecurity::Secure,
                ..
            } => "ok_ssl",
            DiscoveryResult::Success {
                security: ConnectionSecurity::Insecure,
                ..
            } => "ok_no_ssl",
            DiscoveryResult::Success {
                security: ConnectionSecurity::RedirectedToInsecure,
                ..
            } => "ok_redirect_to_non_secure",
            DiscoveryResult::NotConfigured => "not_configured",
            DiscoveryResult::Failure(_) => "failure",
        }
    }
}
