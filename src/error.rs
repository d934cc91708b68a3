use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, warn};

/// Errors surfaced by resolvers and handlers
#[derive(Debug, Error)]
pub enum FacadeError {
    /// Bad inbound request parameters; the message is shown to the caller
    #[error("{0}")]
    Validation(String),

    /// Transport failure talking to the upstream API (including timeouts)
    #[error("Upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    /// Upstream answered with a non-2xx status
    #[error("Upstream returned {status} for {url}")]
    UpstreamStatus { status: u16, url: String },

    /// Upstream body exceeded the accepted size
    #[error("Upstream body from {url} exceeds {limit} bytes")]
    UpstreamTooLarge { url: String, limit: usize },

    /// Upstream body did not match the expected envelope
    #[error("Failed to decode upstream response: {0}")]
    Decode(#[from] serde_json::Error),

    /// A login lookup matched zero or several users
    #[error("Expected exactly one user for login '{login}', found {matches}")]
    NoUniqueUser { login: String, matches: usize },

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, FacadeError>;

impl FacadeError {
    /// HTTP status this error maps to at the façade boundary
    pub fn status_code(&self) -> StatusCode {
        match self {
            FacadeError::Validation(_) => StatusCode::BAD_REQUEST,
            FacadeError::NoUniqueUser { matches: 0, .. } => StatusCode::NOT_FOUND,
            FacadeError::NoUniqueUser { .. } => StatusCode::CONFLICT,
            FacadeError::Upstream(_)
            | FacadeError::UpstreamStatus { .. }
            | FacadeError::UpstreamTooLarge { .. }
            | FacadeError::Decode(_)
            | FacadeError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for FacadeError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match self {
            FacadeError::Validation(message) => (status, message).into_response(),
            FacadeError::NoUniqueUser { .. } => {
                warn!("{}", self);
                status.into_response()
            }
            // Upstream detail stays in the server log
            other => {
                error!("{}", other);
                status.into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_400() {
        let err = FacadeError::Validation("Requires name parameter".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Requires name parameter");
    }

    #[test]
    fn missing_user_maps_to_404_and_ambiguous_to_409() {
        let missing = FacadeError::NoUniqueUser {
            login: "ghost".to_string(),
            matches: 0,
        };
        let ambiguous = FacadeError::NoUniqueUser {
            login: "twin".to_string(),
            matches: 2,
        };
        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ambiguous.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn upstream_failures_map_to_500() {
        let status = FacadeError::UpstreamStatus {
            status: 503,
            url: "https://api.twitch.tv/kraken/users?login=x".to_string(),
        };
        let decode = FacadeError::Decode(
            serde_json::from_str::<serde_json::Value>("not json").unwrap_err(),
        );
        assert_eq!(status.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(decode.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let too_large = FacadeError::UpstreamTooLarge {
            url: "https://api.twitch.tv/kraken/channels/1".to_string(),
            limit: 1024,
        };
        assert_eq!(too_large.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn upstream_response_hides_detail() {
        let resp = FacadeError::UpstreamStatus {
            status: 401,
            url: "https://api.twitch.tv/kraken/users?login=secret".to_string(),
        }
        .into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
