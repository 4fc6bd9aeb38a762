use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

pub type Result<T, E = RelayError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum RelayError {
    /// Upstream unreachable, timed out, or broke off mid-body.
    #[error("Proxy error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Login rejected by upstream with status {0}")]
    AuthFailure(StatusCode),

    #[error("Invalid upstream URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP error: {0}")]
    Http(#[from] http::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Password hash error: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{what} timed out after {secs}s")]
    Timeout { what: String, secs: u64 },

    #[error("{label} not ready after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        label: String,
        attempts: u32,
        last_error: String,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl RelayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::Transport(_) => StatusCode::BAD_GATEWAY,
            RelayError::AuthFailure(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            RelayError::Transport(_) => "PROXY_ERROR",
            RelayError::AuthFailure(_) => "AUTH_ERROR",
            RelayError::InvalidUrl(_) | RelayError::Config(_) => "CONFIG_ERROR",
            RelayError::Database(_) | RelayError::Schema(_) => "DATABASE_ERROR",
            _ => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(ErrorResponse {
            error: self.error_code().to_string(),
            message: self.to_string(),
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_failure_maps_to_bad_gateway() {
        let err = RelayError::AuthFailure(StatusCode::UNAUTHORIZED);
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.error_code(), "AUTH_ERROR");
    }

    #[test]
    fn unexpected_errors_map_to_internal() {
        let err = RelayError::Internal("boom".to_string());
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);

        let err = RelayError::InvalidUrl("no host".to_string());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn timeout_names_what_timed_out() {
        let err = RelayError::Timeout {
            what: "PostgreSQL connect".to_string(),
            secs: 5,
        };
        assert_eq!(err.to_string(), "PostgreSQL connect timed out after 5s");
        assert_eq!(err.error_code(), "INTERNAL_ERROR");
    }
}
