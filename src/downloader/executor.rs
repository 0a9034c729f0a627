//! Batch executor
//!
//! Runs an ordered batch of [`Job`]s and returns one result per job, in input
//! order, whatever order the workers finish in.
//!
//! With two or more workers the coordinating path walks the batch once:
//! 1. a job whose key is cached is resolved on the spot, without touching
//!    the rate limiter or a worker slot;
//! 2. a job whose key is already in flight in this batch waits for that job's
//!    result instead of issuing its own request;
//! 3. anything else waits for a free slot, registers with the rate limiter
//!    and is spawned on the pool.
//!
//! After each job, finished workers are drained without blocking; once the
//! batch is exhausted the pool is drained until empty. A worker error aborts
//! the whole batch and drops (aborts) the workers still running.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, info};

use crate::downloader::job::{Job, JobRequest};
use crate::downloader::progress::Notifier;
use crate::downloader::rate_limit::RateLimiter;
use crate::downloader::{DownloadError, DownloadResult};
use crate::fetcher::pagination::paginate;
use crate::fetcher::request_key::PagedResource;
use crate::fetcher::{FetcherResult, PageFetcher, ResponseCache};
use crate::metrics;

type WorkerOutput = (usize, FetcherResult<Value>);

/// Executes job batches against the shared cache and rate limiter
#[derive(Debug)]
pub struct DownloadExecutor {
    fetcher: PageFetcher,
    limiter: Arc<RateLimiter>,
    notifier: Notifier,
    workers: usize,
}

impl DownloadExecutor {
    /// Create an executor
    ///
    /// # Arguments
    /// * `fetcher` - Request handle cloned into every worker
    /// * `limiter` - Shared quota; only this executor's coordinating path registers
    /// * `workers` - Concurrency bound; below 2 runs strictly sequentially
    pub fn new(fetcher: PageFetcher, limiter: Arc<RateLimiter>, workers: usize) -> Self {
        Self {
            fetcher,
            limiter,
            notifier: Notifier::default(),
            workers,
        }
    }

    /// Attach the listener receiving per-job progress text
    pub fn with_notifier(mut self, notifier: Notifier) -> Self {
        self.notifier = notifier;
        self
    }

    /// Concurrency bound
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Shared response cache
    pub fn cache(&self) -> &ResponseCache {
        self.fetcher.cache()
    }

    /// Shared rate limiter
    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Fail with a missing-credential error if no token is configured
    pub fn ensure_credential(&self) -> DownloadResult<()> {
        Ok(self.fetcher.ensure_credential()?)
    }

    /// Run a batch; `results[i]` belongs to `jobs[i]`.
    ///
    /// Must not be called concurrently on the same executor.
    ///
    /// # Errors
    /// [`DownloadError::Fetch`] with `MissingCredential` before any request is
    /// made, or the first transport failure of any job.
    #[tracing::instrument(skip_all, fields(jobs = jobs.len(), workers = self.workers))]
    pub async fn run(&self, jobs: Vec<Job>) -> DownloadResult<Vec<Value>> {
        self.fetcher.ensure_credential()?;
        if jobs.is_empty() {
            return Ok(Vec::new());
        }
        metrics::record_batch(jobs.len());

        let results = if self.workers < 2 {
            self.run_sequential(jobs).await?
        } else {
            self.run_pooled(jobs).await?
        };
        info!(results = results.len(), "batch complete");
        Ok(results)
    }

    /// Fetch one request key on the coordinating path, cache first
    pub async fn get(&self, key: &str) -> DownloadResult<Value> {
        self.fetcher.ensure_credential()?;
        Ok(self.fetch_registered(key).await?)
    }

    /// Fetch all pages of `resource` on the coordinating path.
    ///
    /// Each uncached page registers with the rate limiter before it is
    /// requested.
    pub async fn get_multiple_pages(&self, resource: &PagedResource) -> DownloadResult<Vec<Value>> {
        self.fetcher.ensure_credential()?;
        Ok(self.paginate_registered(resource).await?)
    }

    async fn fetch_registered(&self, key: &str) -> FetcherResult<Value> {
        if let Some(hit) = self.cache().get(key) {
            metrics::record_cache_hit();
            return Ok(hit);
        }
        self.limiter.register().await;
        let value = self.fetcher.fetch(key).await?;
        self.cache().put(key, &value);
        Ok(value)
    }

    async fn paginate_registered(&self, resource: &PagedResource) -> FetcherResult<Vec<Value>> {
        let base_url = self.fetcher.base_url();
        paginate(resource, |page| {
            let key = resource.page_key(base_url, page);
            async move { self.fetch_registered(&key).await }
        })
        .await
    }

    async fn run_sequential(&self, jobs: Vec<Job>) -> DownloadResult<Vec<Value>> {
        debug!("running batch sequentially");
        let mut results = Vec::with_capacity(jobs.len());
        for job in jobs {
            let value = match &job.request {
                JobRequest::Single(key) => self.fetch_registered(key).await?,
                JobRequest::Paginated(resource) => {
                    let key = resource.resource_key(self.fetcher.base_url());
                    match self.cache().get(&key) {
                        Some(hit) => {
                            metrics::record_cache_hit();
                            hit
                        }
                        None => {
                            let value = Value::Array(self.paginate_registered(resource).await?);
                            self.cache().put(&key, &value);
                            value
                        }
                    }
                }
            };
            if let Some(text) = job.progress {
                self.notifier.notify(text);
            }
            results.push(value);
        }
        Ok(results)
    }

    async fn run_pooled(&self, jobs: Vec<Job>) -> DownloadResult<Vec<Value>> {
        let total = jobs.len();
        let mut batch = BatchSlots::default();
        let mut pool: JoinSet<WorkerOutput> = JoinSet::new();

        for (index, Job { request, progress }) in jobs.into_iter().enumerate() {
            let key = request.cache_key(self.fetcher.base_url());

            if let Some(hit) = self.cache().get(&key) {
                debug!(index, "resolved from cache");
                metrics::record_cache_hit();
                batch.record(index, hit, progress, &self.notifier);
            } else if let Some(&origin) = batch.pending_keys.get(&key) {
                debug!(index, origin, "sharing in-flight request");
                metrics::record_cache_hit();
                batch.follow(origin, index, progress);
            } else {
                while pool.len() >= self.workers {
                    match pool.join_next().await {
                        Some(joined) => batch.complete(joined, self.cache(), &self.notifier)?,
                        None => break,
                    }
                }
                self.limiter.register().await;
                batch.start(index, key, progress);
                let fetcher = self.fetcher.clone();
                pool.spawn(async move {
                    let result = request.execute(&fetcher).await;
                    (index, result)
                });
            }

            while let Some(joined) = pool.try_join_next() {
                batch.complete(joined, self.cache(), &self.notifier)?;
            }
        }

        while let Some(joined) = pool.join_next().await {
            batch.complete(joined, self.cache(), &self.notifier)?;
        }

        batch.into_results(total)
    }
}

/// A job handed to the pool, plus later jobs of the batch with the same key
#[derive(Debug)]
struct InFlight {
    key: String,
    progress: Option<String>,
    followers: Vec<(usize, Option<String>)>,
}

/// Position-indexed results of one batch
#[derive(Debug, Default)]
struct BatchSlots {
    slots: HashMap<usize, Value>,
    in_flight: HashMap<usize, InFlight>,
    pending_keys: HashMap<String, usize>,
}

impl BatchSlots {
    fn record(&mut self, index: usize, value: Value, progress: Option<String>, notifier: &Notifier) {
        self.slots.insert(index, value);
        if let Some(text) = progress {
            notifier.notify(text);
        }
    }

    fn start(&mut self, index: usize, key: String, progress: Option<String>) {
        self.pending_keys.insert(key.clone(), index);
        self.in_flight.insert(
            index,
            InFlight {
                key,
                progress,
                followers: Vec::new(),
            },
        );
    }

    fn follow(&mut self, origin: usize, index: usize, progress: Option<String>) {
        if let Some(flight) = self.in_flight.get_mut(&origin) {
            flight.followers.push((index, progress));
        }
    }

    fn complete(
        &mut self,
        joined: Result<WorkerOutput, JoinError>,
        cache: &ResponseCache,
        notifier: &Notifier,
    ) -> DownloadResult<()> {
        let (index, result) = joined.map_err(|e| DownloadError::WorkerFailed(e.to_string()))?;
        let value = result?;
        let Some(flight) = self.in_flight.remove(&index) else {
            return Err(DownloadError::MissingResult(index));
        };
        self.pending_keys.remove(&flight.key);
        cache.put(&flight.key, &value);

        for (follower, progress) in flight.followers {
            self.record(follower, value.clone(), progress, notifier);
        }
        self.record(index, value, flight.progress, notifier);
        Ok(())
    }

    fn into_results(mut self, total: usize) -> DownloadResult<Vec<Value>> {
        (0..total)
            .map(|index| {
                self.slots
                    .remove(&index)
                    .ok_or(DownloadError::MissingResult(index))
            })
            .collect()
    }
}
