//! Status Descriptor Parsing
//!
//! Parses the JSON body returned by `status.php` and classifies the server
//! family from its product name.
//!
//! Only three fields are read; everything else in the payload is ignored:
//! - `installed` (required boolean)
//! - `version` (string, required once installed)
//! - `productname` (string, optional)

use serde::{Deserialize, Serialize};

/// Product name reported by the one vendor that serves from its root path
pub const KITEWORKS_PRODUCT_NAME: &str = "kiteworks";

#[derive(Debug, thiserror::Error)]
pub enum DescriptorError {
    #[error("Empty status response body")]
    EmptyBody,
    #[error("Invalid status JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("Status JSON is missing field '{0}'")]
    MissingField(&'static str),
}

/// Parsed `status.php` payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusDescriptor {
    pub installed: bool,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub productname: Option<String>,
}

impl StatusDescriptor {
    /// Version string, required by callers that reached the installed branch
    pub fn require_version(&self) -> Result<&str, DescriptorError> {
        self.version
            .as_deref()
            .ok_or(DescriptorError::MissingField("version"))
    }
}

/// Server layout families distinguished during discovery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServerFamily {
    /// Status script lives under the server base path
    Conventional,
    /// Kiteworks: base address is always the server root
    Kiteworks,
}

impl ServerFamily {
    /// Classify a descriptor by its exact `productname`
    pub fn classify(descriptor: &StatusDescriptor) -> Self {
        match descriptor.productname.as_deref() {
            Some(KITEWORKS_PRODUCT_NAME) => ServerFamily::Kiteworks,
            _ => ServerFamily::Conventional,
        }
    }

    /// Whether the base address must be the root path instead of the
    /// directory that contains the status script
    pub fn uses_root_base(self) -> bool {
        matches!(self, ServerFamily::Kiteworks)
    }
}

/// Parse a status response body
///
/// # Returns
/// * `Ok(StatusDescriptor)` - JSON object with a boolean `installed`
/// * `Err(DescriptorError)` - empty body, invalid JSON, or wrong shape
pub fn parse_status_descriptor(body: &str) -> Result<StatusDescriptor, DescriptorError> {
    if body.trim().is_empty() {
        return Err(DescriptorError::EmptyBody);
    }
    Ok(serde_json::from_str(body)?)
}
