use super::types::{Config, OutputFormat};
use crate::core::discovery::requester::DEFAULT_MAX_REDIRECT_HOPS;
use crate::core::discovery::session::RedirectMode;

impl Default for Config {
    fn default() -> Self {
        Config {
            redirect_mode: RedirectMode::Transport,
            max_redirect_hops: DEFAULT_MAX_REDIRECT_HOPS,
            user_agent: format!("ocstatus/{}", env!("CARGO_PKG_VERSION")),
            output: OutputFormat::Text,
        }
    }
}
