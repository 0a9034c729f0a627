//! Single-request plumbing for the ANS API
//!
//! Everything needed to turn one request key into one decoded JSON value:
//! the [`Transport`] seam, the reqwest-backed implementation, request key
//! construction, the run-scoped response cache and the pagination loop.

use async_trait::async_trait;
use serde_json::Value;

pub mod cache;
pub mod http;
pub mod page_fetcher;
pub mod pagination;
pub mod request_key;

pub use cache::ResponseCache;
pub use http::ReqwestTransport;
pub use page_fetcher::PageFetcher;
pub use request_key::{PageRequest, PagedResource};

/// Fetcher errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetcherError {
    /// No authorization material is configured
    #[error("no ANS token configured: set ANS_TOKEN or pass --token")]
    MissingCredential,

    /// Non-2xx response, or a 2xx response whose body is not JSON
    #[error("HTTP error {status}: {message}")]
    HttpError {
        /// HTTP status code of the response
        status: u16,
        /// Response body or decode failure description
        message: String,
    },

    /// Connection, timeout or other transport-level failure
    #[error("network error: {0}")]
    NetworkError(String),
}

impl FetcherError {
    /// HTTP status attached to the failure, if the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpError { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type for fetcher operations
pub type FetcherResult<T> = Result<T, FetcherError>;

/// Issues one authenticated GET and decodes the JSON body.
///
/// Implementations are shared between concurrently running workers and must
/// not hold per-request state.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch `url` with the given `Authorization` header value.
    ///
    /// # Errors
    /// [`FetcherError::HttpError`] for non-2xx or non-JSON responses,
    /// [`FetcherError::NetworkError`] when no response was received.
    async fn get_json(&self, url: &str, authorization: &str) -> FetcherResult<Value>;
}
