//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **redis_store**: credential reads through a `bb8` Redis pool
//! - **zenodo**: record search over HTTP, throttled by a shared rate gate
//! - **orcid**: peer-review reads and writes against the ORCID member API
//! - **rate_gate**: `governor`-backed throughput gate
//!
//! Adapters translate between wire formats and domain types. They contain no
//! reconciliation logic.

mod http_status;
pub mod orcid;
pub mod rate_gate;
pub mod redis_store;
pub mod zenodo;

/// Errors raised while constructing an HTTP adapter.
#[derive(Debug, thiserror::Error)]
pub enum AdapterBuildError {
    /// The reqwest client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
    /// The configured base URL cannot carry the API path.
    #[error("invalid API base URL: {0}")]
    Endpoint(#[from] url::ParseError),
}
