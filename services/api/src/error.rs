//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service and its mapping
//! onto `{ "error": "<message>" }` HTTP responses.

use crate::config::ConfigError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use jokesmith_core::{prompts::CatalogError, ports::PortError};
use serde_json::json;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Bad or missing input. Not retryable.
    #[error("{0}")]
    Validation(String),

    /// No valid caller session.
    #[error("Authentication required")]
    Authentication,

    #[error("{0}")]
    NotFound(String),

    /// A required secret or setting is missing. Fixable by the operator.
    #[error("{0}")]
    Configuration(String),

    /// The LLM gateway failed. The caller may retry.
    #[error("{0}")]
    UpstreamUnavailable(String),

    /// The backing store failed; carries the upstream message.
    #[error("{0}")]
    Store(String),

    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Prompt catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration Error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Authentication => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Configuration(_)
            | Self::Store(_)
            | Self::Config(_)
            | Self::Catalog(_)
            | Self::Database(_)
            | Self::Migration(_)
            | Self::Io(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<PortError> for ApiError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::NotFound(msg) => Self::NotFound(msg),
            PortError::Store(msg) => Self::Store(msg),
            gateway @ PortError::Gateway { .. } => Self::UpstreamUnavailable(gateway.to_string()),
            PortError::Unexpected(msg) => Self::Internal(msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "Request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
