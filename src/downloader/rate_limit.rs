//! Rolling-window request quota
//!
//! Keeps the start instants of the most recent requests. When the history is
//! full and its oldest entry is still inside the window, the caller sleeps
//! until that entry has aged out (plus one second), and the whole history is
//! cleared before the new request is recorded.
//!
//! Only the coordinating path calls [`RateLimiter::register`]; workers never
//! touch the limiter.

use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::downloader::config::RATE_LIMIT_WINDOW;
use crate::downloader::progress::Notifier;
use crate::downloader::DownloadError;
use crate::metrics;

/// Request-count limiter over a rolling window
#[derive(Debug)]
pub struct RateLimiter {
    capacity: usize,
    window: Duration,
    history: Mutex<VecDeque<Instant>>,
    notifier: Notifier,
}

impl RateLimiter {
    /// Create a limiter allowing `capacity` requests per `window`
    ///
    /// # Errors
    /// [`DownloadError::InvalidConfig`] if `capacity` is zero
    pub fn new(capacity: usize, window: Duration) -> Result<Self, DownloadError> {
        if capacity == 0 {
            return Err(DownloadError::InvalidConfig(
                "rate limit capacity must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            capacity,
            window,
            history: Mutex::new(VecDeque::with_capacity(capacity)),
            notifier: Notifier::default(),
        })
    }

    /// Per-minute limiter
    pub fn per_minute(capacity: usize) -> Result<Self, DownloadError> {
        Self::new(capacity, RATE_LIMIT_WINDOW)
    }

    /// Attach the listener that receives wait notices and save requests
    pub fn with_notifier(mut self, notifier: Notifier) -> Self {
        self.notifier = notifier;
        self
    }

    /// Maximum requests per window
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of timestamps currently recorded
    pub async fn recorded(&self) -> usize {
        self.history.lock().await.len()
    }

    /// Register a request that is about to be issued, sleeping first if the
    /// quota is exhausted.
    ///
    /// # Returns
    /// The delay that was applied, if any
    pub async fn register(&self) -> Option<Duration> {
        let mut history = self.history.lock().await;

        let delay = wait_time(&history, self.capacity, self.window, Instant::now());
        if let Some(delay) = delay {
            self.notifier.save();
            history.clear();
            self.notifier.notify(format!(
                "Request limit of {} reached. Waiting {} seconds...",
                self.capacity,
                delay.as_secs()
            ));
            metrics::record_rate_limit_wait(delay);
            sleep(delay).await;
        } else if history.len() >= self.capacity {
            history.pop_front();
        }

        history.push_back(Instant::now());
        debug!(recorded = history.len(), "request registered");
        delay
    }
}

/// Delay required before the next request, rounded down to whole seconds
/// plus one.
fn wait_time(
    history: &VecDeque<Instant>,
    capacity: usize,
    window: Duration,
    now: Instant,
) -> Option<Duration> {
    if history.len() < capacity {
        return None;
    }
    let oldest = *history.front()?;
    let age = now.saturating_duration_since(oldest);
    if age > window {
        return None;
    }
    Some(Duration::from_secs((window - age).as_secs() + 1))
}
