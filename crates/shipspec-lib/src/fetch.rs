//! Single rate-limited requests against the encyclopedia API.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use tracing::debug;
use url::Url;

use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::rate_limit::RateLimiter;

/// Raw answer from a [`Transport`].
#[derive(Debug, Clone, PartialEq)]
pub enum TransportResponse {
    /// 2xx status with the undecoded body text.
    Success(String),
    /// Any other status; the body is discarded.
    Status(u16),
}

/// Performs one HTTP GET and returns the body text.
pub trait Transport {
    fn get(&self, url: &Url) -> Result<TransportResponse>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn get(&self, url: &Url) -> Result<TransportResponse> {
        (**self).get(url)
    }
}

/// Blocking `reqwest` transport with a per-request deadline.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent())
            .build()
            .map_err(Error::Http)?;
        Ok(Self { client })
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        Self::new(config.request_timeout)
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &Url) -> Result<TransportResponse> {
        let response = self
            .client
            .get(url.clone())
            .header(ACCEPT, "application/json")
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Ok(TransportResponse::Status(status.as_u16()));
        }
        Ok(TransportResponse::Success(response.text()?))
    }
}

fn user_agent() -> String {
    format!("shipspec-lib/{version}", version = env!("CARGO_PKG_VERSION"))
}

/// Outcome of one paced fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// Raw response body, decoded by the caller.
    Body(String),
    /// Non-success status: nothing to merge for this request.
    Unavailable { status: u16 },
}

/// Issues requests through a [`Transport`], paced by a [`RateLimiter`].
#[derive(Debug, Clone)]
pub struct RateLimitedFetcher<T, L> {
    transport: T,
    limiter: L,
}

impl<T: Transport, L: RateLimiter> RateLimitedFetcher<T, L> {
    pub fn new(transport: T, limiter: L) -> Self {
        Self { transport, limiter }
    }

    /// Fetch `url` once. Transport errors propagate; a non-success status
    /// comes back as [`FetchOutcome::Unavailable`]. Never retries.
    pub fn fetch(&self, url: &Url) -> Result<FetchOutcome> {
        let response = self.limiter.throttle(|| self.transport.get(url))?;
        Ok(match response {
            TransportResponse::Success(body) => FetchOutcome::Body(body),
            TransportResponse::Status(status) => {
                debug!(status, path = url.path(), "non-success response");
                FetchOutcome::Unavailable { status }
            }
        })
    }
}
