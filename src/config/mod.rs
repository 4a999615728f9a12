pub mod defaults;
pub mod types;

pub use types::{Config, ConfigError, OutputFormat, CONFIG_ENV_VAR, MAX_REDIRECT_HOPS_LIMIT};
