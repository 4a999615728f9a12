//! Status Result Interpretation
//!
//! Maps an executed probe sequence to a `DiscoveryResult`. Pure: the server
//! family is handed back to the caller instead of being written anywhere.

use url::Url;

use crate::core::discovery::client::TransportError;
use crate::core::discovery::descriptor::{parse_status_descriptor, ServerFamily};
use crate::core::discovery::location::{is_secure, origin_of};
use crate::core::discovery::requester::RequestError;
use crate::core::discovery::types::{
    ConnectionSecurity, DiscoveryResult, FailureDetail, FailureKind, ProbeOutcome, RequestResult,
    ServerInfo,
};
use crate::core::discovery::version::ServerVersion;

/// Interpreter output: the result plus the classification the session applies
#[derive(Debug, Clone)]
pub struct Interpretation {
    pub result: DiscoveryResult,
    /// Set only when a status descriptor of an installed server was read
    pub family: Option<ServerFamily>,
}

impl Interpretation {
    fn terminal(result: DiscoveryResult) -> Self {
        Self {
            result,
            family: None,
        }
    }
}

fn failure(kind: FailureKind, outcome: &ProbeOutcome, message: String) -> DiscoveryResult {
    DiscoveryResult::Failure(FailureDetail {
        kind,
        method: Some(outcome.method),
        location: outcome.attempted_url.clone(),
        status_code: outcome.status_code(),
        message,
    })
}

fn transport_failure(outcome: &ProbeOutcome, error: &TransportError) -> DiscoveryResult {
    let kind = match error {
        TransportError::InvalidUrl(_) => FailureKind::InvalidUrl,
        _ => FailureKind::Transport,
    };
    failure(kind, outcome, error.to_string())
}

/// Interpret one request result against the base address originally requested
///
/// # Behavior
/// 1. Transport failure → `Failure`
/// 2. Parse the body; malformed → `Failure`
/// 3. Non-200 status → `Failure` carrying the failed attempt
/// 4. `installed == false` → `NotConfigured`
/// 5. Otherwise `Success`; security is judged from `original_base_url`
///    (or `RedirectedToInsecure` if the chain was downgraded), while
///    `is_secure_connection` is judged from the final base address
pub fn interpret(request_result: &RequestResult, original_base_url: &str) -> Interpretation {
    let outcome = &request_result.outcome;

    if let Err(error) = &outcome.response {
        return Interpretation::terminal(transport_failure(outcome, error));
    }

    let descriptor = match parse_status_descriptor(outcome.body()) {
        Ok(descriptor) => descriptor,
        Err(e) => {
            return Interpretation::terminal(failure(FailureKind::MalformedBody, outcome, e.to_string()))
        }
    };

    if !request_result.is_success() {
        let message = format!(
            "Status probe returned HTTP {}",
            request_result
                .status
                .map(|code| code.to_string())
                .unwrap_or_else(|| "none".to_string())
        );
        return Interpretation::terminal(failure(FailureKind::Http, outcome, message));
    }

    if !descriptor.installed {
        return Interpretation::terminal(DiscoveryResult::NotConfigured);
    }

    let version = match descriptor.require_version() {
        Ok(raw) => ServerVersion::parse(raw),
        Err(e) => {
            return Interpretation::terminal(failure(FailureKind::MalformedBody, outcome, e.to_string()))
        }
    };

    let security = if request_result.redirected_to_insecure {
        ConnectionSecurity::RedirectedToInsecure
    } else if is_secure(original_base_url) {
        ConnectionSecurity::Secure
    } else {
        ConnectionSecurity::Insecure
    };

    let family = ServerFamily::classify(&descriptor);

    let base_url = match final_base_url(&request_result.last_location, family) {
        Ok(base_url) => base_url,
        Err(message) => {
            return Interpretation {
                result: failure(FailureKind::InvalidUrl, outcome, message),
                family: Some(family),
            }
        }
    };

    let is_secure_connection = is_secure(&base_url);
    Interpretation {
        result: DiscoveryResult::Success {
            info: ServerInfo {
                version,
                base_url,
                is_secure_connection,
            },
            security,
        },
        family: Some(family),
    }
}

/// Derive the base address for subsequent API calls from the final location
///
/// Conventional servers keep the directory holding the status script
/// (`https://host/owncloud/status.php` → `https://host/owncloud`). Kiteworks
/// servers always use the root path.
pub fn final_base_url(last_location: &str, family: ServerFamily) -> Result<String, String> {
    let final_url =
        Url::parse(last_location).map_err(|e| format!("Invalid final location {}: {}", last_location, e))?;

    let file = if family.uses_root_base() {
        ""
    } else {
        let path = final_url.path();
        let directory = match path.rfind('/') {
            Some(index) => &path[..=index],
            None => "",
        };
        directory.trim_end_matches('/')
    };

    let origin = origin_of(&final_url).map_err(|e| format!("Invalid final location {}: {}", last_location, e))?;
    Ok(format!("{}{}", origin, file))
}

/// Map an executor error to the failure it terminates in
pub fn interpret_request_error(error: &RequestError) -> DiscoveryResult {
    let (kind, location, method) = match error {
        RequestError::InvalidRedirect {
            location, method, ..
        } => (FailureKind::InvalidUrl, location, method),
        RequestError::TooManyRedirects {
            location, method, ..
        } => (FailureKind::TooManyRedirects, location, method),
    };

    DiscoveryResult::Failure(FailureDetail {
        kind,
        method: Some(*method),
        location: location.clone(),
        status_code: None,
        message: error.to_string(),
    })
}
