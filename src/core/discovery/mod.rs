//! Server Discovery Module
//!
//! Locates and reads a server's `status.php` descriptor:
//! - Primary and fallback probe locations built from a base address
//! - Transport-level or manual hop-by-hop redirect following
//! - Secure-to-insecure downgrade tracking across the redirect chain
//! - Typed result with the final base address for subsequent API calls

pub mod client;
pub mod descriptor;
pub mod interpreter;
pub mod location;
pub mod redirect;
pub mod requester;
pub mod session;
pub mod types;
pub mod version;

// Re-export public API
pub use client::{ProbeRequest, ProbeResponse, StatusTransport, TransportError};
pub use descriptor::{parse_status_descriptor, ServerFamily, StatusDescriptor};
pub use interpreter::{final_base_url, interpret, Interpretation};
pub use location::{build_candidates, normalize_base_url, ProbeCandidates, UrlError};
pub use redirect::{is_downgraded, rebase};
pub use requester::{request, request_following_redirects, RequestError};
pub use session::{DiscoveryOptions, DiscoverySession, RedirectMode};
pub use types::*;
pub use version::ServerVersion;

#[cfg(feature = "network")]
pub use client::IsahcTransport;
