//! Fetch jobs submitted to the executor

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::fetcher::request_key::PagedResource;
use crate::fetcher::{FetcherResult, PageFetcher};

/// What a job fetches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobRequest {
    /// One network call for a fully resolved request key
    Single(String),
    /// Every page of a paginated resource, flattened into one array
    Paginated(PagedResource),
}

impl JobRequest {
    /// Key used to deduplicate this request against the cache and the
    /// other jobs of a batch
    pub fn cache_key(&self, base_url: &str) -> String {
        match self {
            Self::Single(key) => key.clone(),
            Self::Paginated(resource) => resource.resource_key(base_url),
        }
    }

    /// Execute inside a worker: no rate-limit registration, and the
    /// top-level result is not written to the cache here.
    pub(crate) async fn execute(&self, fetcher: &PageFetcher) -> FetcherResult<Value> {
        match self {
            Self::Single(key) => fetcher.fetch(key).await,
            Self::Paginated(resource) => fetcher.fetch_all_pages(resource).await.map(Value::Array),
        }
    }
}

/// One unit of work in a batch; its position in the batch is its identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// Request descriptor
    pub request: JobRequest,
    /// Progress text emitted once the job's result is recorded
    pub progress: Option<String>,
}

impl Job {
    /// Job fetching a single request key
    pub fn single(key: impl Into<String>) -> Self {
        Self {
            request: JobRequest::Single(key.into()),
            progress: None,
        }
    }

    /// Job fetching a whole paginated resource
    pub fn paginated(resource: PagedResource) -> Self {
        Self {
            request: JobRequest::Paginated(resource),
            progress: None,
        }
    }

    /// Attach progress text
    pub fn with_progress(mut self, text: impl Into<String>) -> Self {
        self.progress = Some(text.into());
        self
    }
}
