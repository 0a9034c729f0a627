//! Observability metrics
//!
//! Counters and histograms are recorded through the `metrics` facade and
//! cost nothing when no recorder is installed. [`init_metrics`] installs a
//! Prometheus exporter serving a scrape endpoint.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use once_cell::sync::OnceCell;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::{debug, info};

static METRICS_INITIALIZED: OnceCell<SocketAddr> = OnceCell::new();

/// Install the Prometheus exporter and describe all metrics.
///
/// Idempotent: later calls return `Ok` without reinstalling.
///
/// # Errors
/// Fails when the exporter cannot bind `addr` or a recorder is already installed.
pub fn init_metrics(addr: SocketAddr) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    if let Some(existing) = METRICS_INITIALIZED.get() {
        debug!(%existing, "Metrics already initialized, skipping");
        return Ok(());
    }

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {e}"))?;

    describe_counter!(
        "http_requests_total",
        Unit::Count,
        "Total number of HTTP requests made to the ANS API"
    );
    describe_counter!(
        "http_errors_total",
        Unit::Count,
        "Total number of failed HTTP requests"
    );
    describe_histogram!(
        "http_request_duration_seconds",
        Unit::Seconds,
        "HTTP request duration in seconds"
    );
    describe_counter!(
        "cache_hits_total",
        Unit::Count,
        "Requests resolved from the response cache"
    );
    describe_counter!(
        "rate_limit_waits_total",
        Unit::Count,
        "Times the request quota forced a wait"
    );
    describe_histogram!(
        "rate_limit_wait_seconds",
        Unit::Seconds,
        "Time spent waiting for the request quota"
    );
    describe_counter!(
        "batch_jobs_total",
        Unit::Count,
        "Jobs submitted to the executor"
    );

    let _ = METRICS_INITIALIZED.set(addr);
    info!("Metrics system initialized successfully on {}", addr);
    Ok(())
}

/// Whether [`init_metrics`] has completed
pub fn is_initialized() -> bool {
    METRICS_INITIALIZED.get().is_some()
}

/// Record a completed HTTP request
pub fn record_http_request(status: u16, duration: Duration) {
    counter!("http_requests_total", "status" => status.to_string()).increment(1);
    histogram!("http_request_duration_seconds").record(duration.as_secs_f64());
}

/// Record a failed HTTP request; `None` for network errors
pub fn record_http_error(status: Option<u16>) {
    let status = status.map_or_else(|| "network_error".to_string(), |s| s.to_string());
    counter!("http_errors_total", "status" => status).increment(1);
}

/// Record a request resolved without touching the network
pub fn record_cache_hit() {
    counter!("cache_hits_total").increment(1);
}

/// Record a quota-induced wait
pub fn record_rate_limit_wait(delay: Duration) {
    counter!("rate_limit_waits_total").increment(1);
    histogram!("rate_limit_wait_seconds").record(delay.as_secs_f64());
}

/// Record a submitted batch
pub fn record_batch(jobs: usize) {
    counter!("batch_jobs_total").increment(jobs as u64);
}
