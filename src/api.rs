//! ANS API client
//!
//! [`AnsClient`] is constructed explicitly by the caller and owns the cache,
//! rate limiter and executor for one run. Create one per run and pass it
//! around; nothing is shared through globals.

use secrecy::SecretString;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::credentials::CredentialProvider;
use crate::downloader::{
    DownloadExecutor, DownloadResult, FetchConfig, Job, Notifier, RateLimiter,
};
use crate::fetcher::request_key::{self, PageRequest, PagedResource};
use crate::fetcher::{PageFetcher, ReqwestTransport, ResponseCache, Transport};

/// Builder for [`AnsClient`]
#[derive(Default)]
pub struct AnsClientBuilder {
    config: FetchConfig,
    transport: Option<Arc<dyn Transport>>,
    authorization: Option<SecretString>,
    notifier: Notifier,
    cache: Option<ResponseCache>,
}

impl AnsClientBuilder {
    /// Use a custom configuration
    pub fn with_config(mut self, config: FetchConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the reqwest transport
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Resolve the authorization header from a credential provider
    pub fn with_credentials(mut self, provider: &dyn CredentialProvider) -> Self {
        self.authorization = provider.authorization();
        self
    }

    /// Attach the progress/save listener
    pub fn with_notifier(mut self, notifier: Notifier) -> Self {
        self.notifier = notifier;
        self
    }

    /// Share an existing cache instead of starting empty
    pub fn with_cache(mut self, cache: ResponseCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Build the client.
    ///
    /// A missing token is not an error here; it is reported by the first
    /// operation that would need the network.
    ///
    /// # Errors
    /// Invalid configuration or HTTP client construction failure
    pub fn build(self) -> DownloadResult<AnsClient> {
        self.config.validate()?;

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::with_timeouts(
                self.config.connect_timeout,
                self.config.request_timeout,
            )?),
        };

        let limiter = Arc::new(
            RateLimiter::per_minute(self.config.requests_per_minute)?
                .with_notifier(self.notifier.clone()),
        );
        let fetcher = PageFetcher::new(
            self.config.base_url.as_str(),
            transport,
            self.authorization,
            self.cache.unwrap_or_default(),
        );
        let executor = DownloadExecutor::new(fetcher, limiter, self.config.workers)
            .with_notifier(self.notifier.clone());

        debug!(config = ?self.config, "client built");
        Ok(AnsClient {
            config: self.config,
            executor,
            notifier: self.notifier,
        })
    }
}

/// Client for one run against the ANS API
#[derive(Debug)]
pub struct AnsClient {
    config: FetchConfig,
    executor: DownloadExecutor,
    notifier: Notifier,
}

impl AnsClient {
    /// Start building a client
    pub fn builder() -> AnsClientBuilder {
        AnsClientBuilder::default()
    }

    /// Active configuration
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// The batch executor
    pub fn executor(&self) -> &DownloadExecutor {
        &self.executor
    }

    /// The run-scoped response cache
    pub fn cache(&self) -> &ResponseCache {
        self.executor.cache()
    }

    /// The progress/save listener
    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Whether a token is configured
    pub fn has_token(&self) -> bool {
        self.executor.ensure_credential().is_ok()
    }

    /// Build a request key below the configured base URL
    pub fn request_key(&self, path: &str, query: Option<&str>, page: Option<PageRequest>) -> String {
        request_key::request_key(&self.config.base_url, path, query, page)
    }

    /// Paginated resource using the configured page size
    pub fn paged(&self, path: impl Into<String>) -> PagedResource {
        PagedResource::new(path, self.config.page_size)
    }

    /// Fetch one request key, cache first
    pub async fn get(&self, key: &str) -> DownloadResult<Value> {
        self.executor.get(key).await
    }

    /// Fetch all pages of a resource sequentially, cache first per page
    pub async fn get_multiple_pages(&self, resource: &PagedResource) -> DownloadResult<Vec<Value>> {
        self.executor.get_multiple_pages(resource).await
    }

    /// Run one batch through the executor
    pub async fn run(&self, jobs: Vec<Job>) -> DownloadResult<Vec<Value>> {
        self.executor.run(jobs).await
    }

    /// Run a large job list in sub-batches of `chunk_size`, asking the caller
    /// to save after every sub-batch.
    ///
    /// Results of completed sub-batches stay in the cache when a later
    /// sub-batch fails, so a retry only refetches the failed part.
    pub async fn run_chunked(&self, jobs: Vec<Job>, chunk_size: usize) -> DownloadResult<Vec<Value>> {
        self.executor.ensure_credential()?;
        let chunk_size = chunk_size.max(1);
        let mut results = Vec::with_capacity(jobs.len());
        let mut remaining = jobs.into_iter().peekable();

        while remaining.peek().is_some() {
            let chunk: Vec<Job> = remaining.by_ref().take(chunk_size).collect();
            debug!(chunk = chunk.len(), done = results.len(), "running sub-batch");
            results.extend(self.executor.run(chunk).await?);
            self.notifier.save();
        }
        Ok(results)
    }
}
