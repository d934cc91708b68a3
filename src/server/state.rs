use crate::{
    config::Config,
    error::Result,
    twitch::{KrakenClient, Resolver, TtlPolicy, Upstream},
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Instant;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<Config>,
    /// Cache-fronted Twitch lookups
    pub resolver: Resolver,
    /// Prometheus handle, present when the global recorder is installed
    pub metrics: Option<PrometheusHandle>,
    /// Process start, for uptime reporting
    pub started_at: Instant,
}

impl AppState {
    /// Create state backed by the real Kraken API
    pub fn new(config: Config) -> Result<Self> {
        let upstream = Arc::new(KrakenClient::new(&config)?);
        Ok(Self::with_upstream(config, upstream))
    }

    /// Create state over any [`Upstream`] implementation
    pub fn with_upstream(config: Config, upstream: Arc<dyn Upstream>) -> Self {
        let resolver = Resolver::new(upstream, TtlPolicy::default(), config.cache_capacity);
        Self {
            config: Arc::new(config),
            resolver,
            metrics: None,
            started_at: Instant::now(),
        }
    }

    pub fn with_metrics(mut self, metrics: Option<PrometheusHandle>) -> Self {
        self.metrics = metrics;
        self
    }
}
