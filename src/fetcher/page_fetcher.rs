//! Authenticated single-request fetching
//!
//! [`PageFetcher`] bundles everything a worker needs to resolve a request
//! key: the transport, the authorization header and the shared cache. It is
//! cheap to clone and never touches the rate limiter; the coordinating path
//! registers requests before handing work to it.

use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::fetcher::cache::ResponseCache;
use crate::fetcher::pagination::paginate;
use crate::fetcher::request_key::PagedResource;
use crate::fetcher::{FetcherError, FetcherResult, Transport};
use crate::metrics;

/// Cloneable handle for issuing authenticated requests
#[derive(Clone)]
pub struct PageFetcher {
    base_url: Arc<str>,
    transport: Arc<dyn Transport>,
    authorization: Option<Arc<SecretString>>,
    cache: ResponseCache,
}

impl PageFetcher {
    /// Create a fetcher
    ///
    /// # Arguments
    /// * `base_url` - API base every request key starts with
    /// * `transport` - Shared transport
    /// * `authorization` - `Authorization` header value, `None` if no token is configured
    /// * `cache` - Run-scoped response cache
    pub fn new(
        base_url: impl Into<Arc<str>>,
        transport: Arc<dyn Transport>,
        authorization: Option<SecretString>,
        cache: ResponseCache,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            transport,
            authorization: authorization.map(Arc::new),
            cache,
        }
    }

    /// API base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Shared response cache
    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// Fail fast when no token is configured
    pub fn ensure_credential(&self) -> FetcherResult<()> {
        self.authorization().map(|_| ())
    }

    fn authorization(&self) -> FetcherResult<&str> {
        self.authorization
            .as_deref()
            .map(|secret| secret.expose_secret())
            .ok_or(FetcherError::MissingCredential)
    }

    /// Issue one network request for `key`, bypassing the cache
    pub async fn fetch(&self, key: &str) -> FetcherResult<Value> {
        let authorization = self.authorization()?;
        self.transport.get_json(key, authorization).await
    }

    /// Serve `key` from the cache, or fetch and cache it.
    ///
    /// Used for the pages of a paginated resource inside a worker.
    pub async fn fetch_cached(&self, key: &str) -> FetcherResult<Value> {
        if let Some(hit) = self.cache.get(key) {
            debug!(key, "page served from cache");
            metrics::record_cache_hit();
            return Ok(hit);
        }
        let value = self.fetch(key).await?;
        self.cache.put(key, &value);
        Ok(value)
    }

    /// Fetch every page of `resource` and flatten the items
    pub async fn fetch_all_pages(&self, resource: &PagedResource) -> FetcherResult<Vec<Value>> {
        paginate(resource, |page| {
            let key = resource.page_key(&self.base_url, page);
            async move { self.fetch_cached(&key).await }
        })
        .await
    }
}

impl std::fmt::Debug for PageFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageFetcher")
            .field("base_url", &self.base_url)
            .field("has_token", &self.authorization.is_some())
            .field("cached", &self.cache.len())
            .finish()
    }
}
