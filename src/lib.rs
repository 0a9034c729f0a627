//! # ANS Fetch Library
//!
//! A quota-aware client for the paginated JSON API of the ANS assessment
//! platform. It fetches many resources per run while:
//!
//! - **Respecting the request quota**: a rolling 60-second window shared by every request
//! - **Never fetching twice**: a run-scoped cache deduplicates identical requests
//! - **Fetching in parallel**: a bounded worker pool whose output keeps the caller's order
//! - **Exhausting paginated resources**: pages are accumulated until an empty,
//!   repeated or short page ends the resource
//!
//! ## Quick Start
//!
//! ```no_run
//! use ans_fetch::{AnsClient, EnvToken};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = AnsClient::builder()
//!     .with_credentials(&EnvToken::default())
//!     .build()?;
//!
//! let courses = client.courses(&[101, 102, 103]).await?;
//! let results = client.assignment_results(&[7, 8]).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`fetcher`] - Transport seam, request keys, response cache, pagination
//! - [`downloader`] - Rate limiter, jobs and the ordered batch executor
//! - [`api`] - The explicitly constructed client facade
//! - [`resources`] - Batches for specific ANS resource kinds
//! - [`credentials`] - Where the API token comes from
//! - [`metrics`] - Counters and the optional Prometheus exporter

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Client facade
pub mod api;

/// CLI command implementations
pub mod cli;

/// Credential providers
pub mod credentials;

/// Batch orchestration and rate limiting
pub mod downloader;

/// Single-request plumbing
pub mod fetcher;

/// Observability metrics
pub mod metrics;

/// Resource-level operations
pub mod resources;

// Re-export commonly used types
pub use api::{AnsClient, AnsClientBuilder};
pub use credentials::{CredentialProvider, EnvToken, NoToken, StaticToken};
pub use downloader::{
    DownloadError, DownloadExecutor, DownloadResult, FetchConfig, Job, JobRequest, Notifier,
    RateLimiter,
};
pub use fetcher::{FetcherError, PageRequest, PagedResource, ResponseCache, Transport};
