pub mod handlers;
pub mod state;

use crate::{config::Config, twitch::Resolver};
use axum::{
    Router,
    http::{HeaderName, HeaderValue},
    routing::get,
};
use metrics_exporter_prometheus::PrometheusHandle;
use state::AppState;
use std::time::Duration;
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tower_http::{cors::CorsLayer, services::ServeFile, set_header::SetResponseHeaderLayer};
use tracing::{debug, error, info};

/// Header carrying the crate version on every response
pub const VERSION_HEADER: HeaderName = HeaderName::from_static("x-streamcache-version");

/// Build the application router over prepared state
pub fn build_router(state: AppState) -> Router {
    let index = ServeFile::new(&state.config.index_path);

    Router::new()
        .route_service("/", index)
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics::serve_metrics))
        .route("/api/user", get(handlers::api::serve_user))
        .route("/api/channel", get(handlers::api::serve_channel))
        .route("/api/stream", get(handlers::api::serve_stream))
        .layer(CorsLayer::permissive())
        .layer(SetResponseHeaderLayer::overriding(
            VERSION_HEADER,
            HeaderValue::from_static(env!("CARGO_PKG_VERSION")),
        ))
        .with_state(state)
}

/// Periodically drop expired cache entries until `shutdown` fires.
pub fn spawn_cache_sweeper(
    tracker: &TaskTracker,
    resolver: Resolver,
    interval: Duration,
    shutdown: CancellationToken,
) {
    tracker.spawn(async move {
        let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    let removed = resolver.purge_expired();
                    if removed > 0 {
                        debug!("Cache sweep removed {} expired entries", removed);
                    }
                }
            }
        }
    });
}

/// Start the Axum HTTP server and serve until `shutdown` is cancelled
pub async fn start(
    config: Config,
    metrics: Option<PrometheusHandle>,
    shutdown: CancellationToken,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("0.0.0.0:{}", config.port);
    let sweep_interval = config.cache_sweep_interval;

    let state = AppState::new(config)?.with_metrics(metrics);

    let tracker = TaskTracker::new();
    spawn_cache_sweeper(&tracker, state.resolver.clone(), sweep_interval, shutdown.clone());

    let app = build_router(state);

    let listener = match tokio::net::TcpListener::bind(addr.as_str()).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to address {}: {}", addr, e);
            shutdown.cancel();
            return Err(e.into());
        }
    };

    info!("Server listening on http://{}", addr);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.clone().cancelled_owned())
        .await;

    shutdown.cancel();
    tracker.close();
    tracker.wait().await;

    if let Err(e) = served {
        error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
