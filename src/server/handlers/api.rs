use crate::{
    error::{FacadeError, Result},
    metrics,
    server::state::AppState,
    twitch::{Channel, Stream, User},
};
use axum::{
    Json,
    extract::{RawQuery, State},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::time::Instant;
use tracing::info;
use url::form_urlencoded;

/// `GET /api/user?name=<login>`
pub async fn serve_user(State(state): State<AppState>, RawQuery(query): RawQuery) -> Response {
    let start = Instant::now();
    respond("user", start, request_user(&state, query.as_deref()).await)
}

/// `GET /api/channel?name=<login>`: user first, then that user's channel
pub async fn serve_channel(State(state): State<AppState>, RawQuery(query): RawQuery) -> Response {
    let start = Instant::now();
    respond("channel", start, resolve_channel(&state, query.as_deref()).await)
}

/// `GET /api/stream?name=<login>`: offline users serialize as `null`
pub async fn serve_stream(State(state): State<AppState>, RawQuery(query): RawQuery) -> Response {
    let start = Instant::now();
    respond("stream", start, resolve_stream(&state, query.as_deref()).await)
}

async fn request_user(state: &AppState, query: Option<&str>) -> Result<User> {
    let name = request_name(query)?;
    info!("Resolving user: {}", name);
    state.resolver.user_by_name(&name).await
}

async fn resolve_channel(state: &AppState, query: Option<&str>) -> Result<Channel> {
    let user = request_user(state, query).await?;
    state.resolver.channel_by_user(&user.id).await
}

async fn resolve_stream(state: &AppState, query: Option<&str>) -> Result<Option<Stream>> {
    let user = request_user(state, query).await?;
    state.resolver.stream_by_user(&user.id).await
}

fn respond<T: Serialize>(endpoint: &'static str, start: Instant, result: Result<T>) -> Response {
    let response = match result {
        Ok(value) => Json(value).into_response(),
        Err(e) => e.into_response(),
    };
    metrics::record_request(endpoint, response.status().as_u16());
    metrics::record_duration(endpoint, start);
    response
}

/// Extract the single `name` query parameter, trimmed of whitespace.
///
/// # Errors
/// [`FacadeError::Validation`] when `name` is absent, repeated, or blank.
pub fn request_name(query: Option<&str>) -> Result<String> {
    let mut names = form_urlencoded::parse(query.unwrap_or_default().as_bytes())
        .filter(|(key, _)| key == "name")
        .map(|(_, value)| value);

    let name = match (names.next(), names.next()) {
        (Some(name), None) => name,
        _ => return Err(FacadeError::Validation("Requires name parameter".to_string())),
    };

    let name = name.trim();
    if name.is_empty() {
        return Err(FacadeError::Validation("Name must not be empty".to_string()));
    }
    Ok(name.to_string())
}
