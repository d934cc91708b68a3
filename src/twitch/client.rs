//! Authenticated access to the Twitch Kraken API.
//!
//! [`Upstream`] is the seam between resolvers and the network. The
//! production implementation is [`KrakenClient`]; tests substitute stubs.

use crate::{
    config::Config,
    error::{FacadeError, Result},
    metrics,
};
use async_trait::async_trait;
use reqwest::{
    Client,
    header::{ACCEPT, HeaderMap, HeaderName, HeaderValue},
};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Media type requesting the Kraken v5 API
pub const KRAKEN_ACCEPT: &str = "application/vnd.twitchtv.v5+json";

/// Largest upstream body accepted; Kraken lookups are a few KiB
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

const CLIENT_ID_HEADER: HeaderName = HeaderName::from_static("client-id");

/// Source of raw upstream response bodies
#[async_trait]
pub trait Upstream: Send + Sync {
    /// GET `path` relative to the API root and return the body.
    ///
    /// # Errors
    /// Transport failures, timeouts and non-2xx statuses. An error body is
    /// never returned as data.
    async fn fetch(&self, path: &str) -> Result<Vec<u8>>;
}

/// reqwest-backed [`Upstream`] sending the Accept and Client-ID headers
#[derive(Clone, Debug)]
pub struct KrakenClient {
    http: Client,
    api_base: String,
    timeout: Duration,
    max_body_bytes: usize,
}

impl KrakenClient {
    /// Build a client from startup configuration.
    ///
    /// # Errors
    /// Returns [`FacadeError::Internal`] if the Client-ID is not a valid
    /// header value or the HTTP client cannot be constructed.
    pub fn new(config: &Config) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(KRAKEN_ACCEPT));
        let mut client_id = HeaderValue::from_str(&config.client_id)
            .map_err(|e| FacadeError::Internal(format!("Invalid Client ID: {e}")))?;
        client_id.set_sensitive(true);
        headers.insert(CLIENT_ID_HEADER, client_id);

        let http = Client::builder()
            .default_headers(headers)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| FacadeError::Internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            timeout: config.upstream_timeout,
            max_body_bytes: MAX_BODY_BYTES,
        })
    }

    /// Override the body size cap.
    pub fn with_max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path)
    }
}

#[async_trait]
impl Upstream for KrakenClient {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>> {
        let url = self.url_for(path);
        info!("GET {}", url);

        let start = Instant::now();
        let mut response = match self.http.get(&url).timeout(self.timeout).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("Upstream request to {} failed: {}", url, e);
                metrics::record_upstream(None, start);
                return Err(e.into());
            }
        };

        let status = response.status();
        metrics::record_upstream(Some(status.as_u16()), start);

        if !status.is_success() {
            warn!("Upstream returned {} for {}", status, url);
            return Err(FacadeError::UpstreamStatus {
                status: status.as_u16(),
                url,
            });
        }

        let too_large = || {
            warn!("Upstream body from {} exceeds {} bytes", url, self.max_body_bytes);
            FacadeError::UpstreamTooLarge {
                url: url.clone(),
                limit: self.max_body_bytes,
            }
        };

        if response
            .content_length()
            .is_some_and(|len| len > self.max_body_bytes as u64)
        {
            return Err(too_large());
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if body.len() + chunk.len() > self.max_body_bytes {
                return Err(too_large());
            }
            body.extend_from_slice(&chunk);
        }
        info!(
            "Upstream {} for {}: {} bytes in {:?}",
            status,
            url,
            body.len(),
            start.elapsed()
        );
        Ok(body)
    }
}
