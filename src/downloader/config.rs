//! Configuration constants and the validated client configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::downloader::DownloadError;

/// ANS REST API base; every request key starts with it.
pub const API_BASE_URL: &str = "https://ans.app/api/v2/";

/// Requests permitted per rolling window.
/// ANS allows 500 per minute; 495 leaves headroom for clock skew.
pub const DEFAULT_REQUESTS_PER_MINUTE: usize = 495;

/// Length of the rolling rate-limit window.
pub const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(60);

/// Default number of concurrent workers.
pub const DEFAULT_WORKERS: usize = 20;

/// Default page size for paginated resources.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Page size for exercise questions; one page is always enough.
pub const QUESTIONS_PAGE_SIZE: u32 = 50;

/// Jobs per sub-batch when the facade chunks large request sets.
pub const DEFAULT_CHUNK_SIZE: usize = 100;

/// HTTP connect timeout - time to establish TCP connection
pub const HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP request timeout - overall time for the entire request
pub const HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchConfig {
    /// API base URL
    pub base_url: String,
    /// Rate-limit capacity per window
    pub requests_per_minute: usize,
    /// Concurrency bound; below 2 runs strictly sequentially
    pub workers: usize,
    /// Page size for paginated resources
    pub page_size: u32,
    /// Sub-batch size used by the chunked facade operations
    pub chunk_size: usize,
    /// HTTP connect timeout
    pub connect_timeout: Duration,
    /// HTTP request timeout
    pub request_timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: API_BASE_URL.to_string(),
            requests_per_minute: DEFAULT_REQUESTS_PER_MINUTE,
            workers: DEFAULT_WORKERS,
            page_size: DEFAULT_PAGE_SIZE,
            chunk_size: DEFAULT_CHUNK_SIZE,
            connect_timeout: HTTP_CONNECT_TIMEOUT,
            request_timeout: HTTP_REQUEST_TIMEOUT,
        }
    }
}

impl FetchConfig {
    /// Override the API base URL.
    ///
    /// Request keys are built by appending paths, so a missing trailing `/`
    /// is added.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = normalize_base_url(&base_url.into());
        self
    }

    /// Override the rate-limit capacity
    pub fn with_requests_per_minute(mut self, requests_per_minute: usize) -> Self {
        self.requests_per_minute = requests_per_minute;
        self
    }

    /// Set the number of workers (values below 1 are clamped to 1)
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Override the page size
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Override the chunk size
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Override HTTP timeouts
    pub fn with_timeouts(mut self, connect: Duration, request: Duration) -> Self {
        self.connect_timeout = connect;
        self.request_timeout = request;
        self
    }

    /// Check the configuration before any client is built
    pub fn validate(&self) -> Result<(), DownloadError> {
        if self.base_url.trim().is_empty() {
            return Err(DownloadError::InvalidConfig(
                "base URL must not be empty".to_string(),
            ));
        }
        if !self.base_url.ends_with('/') {
            return Err(DownloadError::InvalidConfig(format!(
                "base URL must end with '/': {}",
                self.base_url
            )));
        }
        if self.requests_per_minute == 0 {
            return Err(DownloadError::InvalidConfig(
                "requests per minute must be at least 1".to_string(),
            ));
        }
        if self.page_size == 0 {
            return Err(DownloadError::InvalidConfig(
                "page size must be at least 1".to_string(),
            ));
        }
        if self.chunk_size == 0 {
            return Err(DownloadError::InvalidConfig(
                "chunk size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Trim and terminate with `/`; blank input stays blank
fn normalize_base_url(base_url: &str) -> String {
    let trimmed = base_url.trim();
    if trimmed.is_empty() || trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    }
}
