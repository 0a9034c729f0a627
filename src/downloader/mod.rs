//! Batch orchestration and rate limiting
//!
//! # Overview
//!
//! 1. **Job Creation**: describe what to fetch with [`job::Job`]
//! 2. **Execution**: run ordered batches through [`executor::DownloadExecutor`]
//! 3. **Rate Limiting**: every network request is registered with [`rate_limit::RateLimiter`]
//! 4. **Progress**: notices and save requests flow through [`progress::Notifier`]
//!
//! # Quick Start
//!
//! ```no_run
//! use ans_fetch::downloader::{DownloadExecutor, Job, RateLimiter};
//! use ans_fetch::fetcher::{PageFetcher, ReqwestTransport, ResponseCache};
//! use secrecy::SecretString;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher = PageFetcher::new(
//!     "https://ans.app/api/v2/",
//!     Arc::new(ReqwestTransport::new()?),
//!     Some(SecretString::from("Token token=secret".to_string())),
//!     ResponseCache::new(),
//! );
//! let limiter = Arc::new(RateLimiter::per_minute(495)?);
//! let executor = DownloadExecutor::new(fetcher, limiter, 20);
//!
//! let results = executor
//!     .run(vec![
//!         Job::single("https://ans.app/api/v2/courses/1"),
//!         Job::single("https://ans.app/api/v2/courses/2"),
//!     ])
//!     .await?;
//! assert_eq!(results.len(), 2);
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! All operations return `Result<T, DownloadError>`:
//! - missing credentials fail before any request is made
//! - a single failed request aborts its whole batch
//! - empty or repeated pages are not errors; they end pagination

pub mod config;
pub mod executor;
pub mod job;
pub mod progress;
pub mod rate_limit;

pub use config::FetchConfig;
pub use executor::DownloadExecutor;
pub use job::{Job, JobRequest};
pub use progress::Notifier;
pub use rate_limit::RateLimiter;

use crate::fetcher::FetcherError;

/// Download errors
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// Request failure, including a missing credential
    #[error(transparent)]
    Fetch(#[from] FetcherError),

    /// A worker panicked or was cancelled
    #[error("worker failed: {0}")]
    WorkerFailed(String),

    /// A batch position had no result after the final drain
    #[error("internal error: no result recorded for job {0}")]
    MissingResult(usize),

    /// Invalid configuration
    #[error("configuration error: {0}")]
    InvalidConfig(String),
}

impl DownloadError {
    /// Whether this is the pre-flight missing-credential failure
    pub fn is_missing_credential(&self) -> bool {
        matches!(self, Self::Fetch(FetcherError::MissingCredential))
    }
}

/// Result type for download operations
pub type DownloadResult<T> = Result<T, DownloadError>;
