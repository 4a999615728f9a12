//! Discovery session: one logical client talking to one server.
//!
//! The session is the only place discovery state lives. It owns the
//! downgrade flag (monotonic for the life of the session, never fed back
//! into later results) and the special-vendor flag consumed by the rest of
//! the client.

use crate::core::debug_logger::{get_debug_logger, DebugLogger};
use crate::core::discovery::client::StatusTransport;
use crate::core::discovery::descriptor::ServerFamily;
use crate::core::discovery::interpreter::{interpret, interpret_request_error};
use crate::core::discovery::requester::{
    request, request_following_redirects, DEFAULT_MAX_REDIRECT_HOPS,
};
use crate::core::discovery::types::DiscoveryResult;
use serde::{Deserialize, Serialize};

/// Who follows redirects on the status probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RedirectMode {
    /// Transport follows permanent redirects itself
    #[default]
    Transport,
    /// Every hop is rebased and downgrade-checked by the requester
    Manual,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryOptions {
    pub redirect_mode: RedirectMode,
    /// Hop bound for manual mode
    pub max_redirect_hops: u32,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            redirect_mode: RedirectMode::Transport,
            max_redirect_hops: DEFAULT_MAX_REDIRECT_HOPS,
        }
    }
}

pub struct DiscoverySession<T: StatusTransport> {
    transport: T,
    options: DiscoveryOptions,
    logger: DebugLogger,
    redirected_to_insecure: bool,
    is_kiteworks_server: bool,
}

impl<T: StatusTransport> DiscoverySession<T> {
    pub fn new(transport: T) -> Self {
        Self::with_options(transport, DiscoveryOptions::default())
    }

    pub fn with_options(transport: T, options: DiscoveryOptions) -> Self {
        Self {
            transport,
            options,
            logger: get_debug_logger(),
            redirected_to_insecure: false,
            is_kiteworks_server: false,
        }
    }

    pub fn with_logger(mut self, logger: DebugLogger) -> Self {
        self.logger = logger;
        self
    }

    /// Run one discovery sequence against `base_url`
    ///
    /// Always terminates in a `DiscoveryResult`. Its security verdict reflects
    /// only this sequence. The session downgrade flag and the special-vendor
    /// flag are updated from what this sequence observed.
    pub fn discover(&mut self, base_url: &str) -> DiscoveryResult {
        let correlation_id = self.logger.new_correlation_id();

        let request_result = match self.options.redirect_mode {
            RedirectMode::Transport => Ok(request(base_url, &self.transport, &self.logger)),
            RedirectMode::Manual => request_following_redirects(
                base_url,
                &self.transport,
                self.options.max_redirect_hops,
                &self.logger,
            ),
        };

        let result = match request_result {
            Ok(request_result) => {
                // The verdict is per sequence; only the session accessor stays sticky
                self.redirected_to_insecure |= request_result.redirected_to_insecure;

                let interpretation = interpret(&request_result, base_url);
                if let Some(family) = interpretation.family {
                    self.apply_family(family);
                }
                interpretation.result
            }
            Err(e) => {
                self.logger
                    .error_sync("DiscoverySession", "request_error", &e.to_string());
                interpret_request_error(&e)
            }
        };

        self.logger.discovery_result(
            result.label(),
            result.server_info().map(|info| info.base_url.as_str()),
            &correlation_id,
        );
        result
    }

    fn apply_family(&mut self, family: ServerFamily) {
        self.is_kiteworks_server = family == ServerFamily::Kiteworks;
    }

    pub fn is_kiteworks_server(&self) -> bool {
        self.is_kiteworks_server
    }

    /// Whether any sequence in this session saw a secure-to-insecure hop
    pub fn redirected_to_insecure(&self) -> bool {
        self.redirected_to_insecure
    }

    pub fn options(&self) -> &DiscoveryOptions {
        &self.options
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}
