//! reqwest-backed [`Transport`]
//!
//! One shared `reqwest::Client` per transport so connection pooling works
//! across all workers. No retries happen here: a failed request surfaces as
//! an error and the caller decides what to do with the batch.

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::downloader::config::{HTTP_CONNECT_TIMEOUT, HTTP_REQUEST_TIMEOUT};
use crate::fetcher::{FetcherError, FetcherResult, Transport};
use crate::metrics;

/// Build the HTTP client used by [`ReqwestTransport::new`]
///
/// Configured with explicit timeouts to prevent indefinite hangs.
pub fn build_http_client(
    connect_timeout: Duration,
    request_timeout: Duration,
) -> FetcherResult<Client> {
    Client::builder()
        .connect_timeout(connect_timeout)
        .timeout(request_timeout)
        .user_agent(concat!("ans-fetch/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| FetcherError::NetworkError(format!("failed to build HTTP client: {e}")))
}

/// Production transport talking to the ANS API over HTTPS
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Arc<Client>,
}

impl ReqwestTransport {
    /// Create a transport with the default timeouts
    pub fn new() -> FetcherResult<Self> {
        Self::with_timeouts(HTTP_CONNECT_TIMEOUT, HTTP_REQUEST_TIMEOUT)
    }

    /// Create a transport with custom connect and request timeouts
    pub fn with_timeouts(connect_timeout: Duration, request_timeout: Duration) -> FetcherResult<Self> {
        Ok(Self::from_client(build_http_client(
            connect_timeout,
            request_timeout,
        )?))
    }

    /// Wrap an already configured client
    pub fn from_client(client: Client) -> Self {
        Self {
            client: Arc::new(client),
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get_json(&self, url: &str, authorization: &str) -> FetcherResult<Value> {
        debug!(url, "GET");
        let started = Instant::now();

        let response = self
            .client
            .get(url)
            .header(AUTHORIZATION, authorization)
            .send()
            .await
            .map_err(|e| {
                warn!(url, error = %e, "request failed");
                metrics::record_http_error(None);
                FetcherError::NetworkError(e.to_string())
            })?;

        let status = response.status();
        metrics::record_http_request(status.as_u16(), started.elapsed());

        let body = response
            .text()
            .await
            .map_err(|e| FetcherError::NetworkError(format!("failed to read body: {e}")))?;

        if !status.is_success() {
            warn!(url, status = status.as_u16(), "non-success response");
            metrics::record_http_error(Some(status.as_u16()));
            return Err(FetcherError::HttpError {
                status: status.as_u16(),
                message: body,
            });
        }

        // The API never answers a successful request with anything but JSON,
        // so a decode failure means an error page slipped through.
        serde_json::from_str(&body).map_err(|e| {
            metrics::record_http_error(Some(status.as_u16()));
            FetcherError::HttpError {
                status: status.as_u16(),
                message: format!("response body is not valid JSON: {e}"),
            }
        })
    }
}
