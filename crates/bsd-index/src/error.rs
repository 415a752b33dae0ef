use crate::config::ConfigError;
use crate::index::{IndexError, ReindexError};
use crate::registry::{FilterError, RegistryError};
use crate::repository::{IndexingError, RepositoryError};
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Json(serde_json::Error),
    Filter(FilterError),
    Indexing(IndexingError),
    Registry(RegistryError),
    Reindex(ReindexError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Json(err) => write!(f, "json error: {}", err),
            AppError::Filter(err) => write!(f, "filter error: {}", err),
            AppError::Indexing(err) => write!(f, "indexing error: {}", err),
            AppError::Registry(err) => write!(f, "registry error: {}", err),
            AppError::Reindex(err) => write!(f, "reindex error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Json(err) => Some(err),
            AppError::Filter(err) => Some(err),
            AppError::Indexing(err) => Some(err),
            AppError::Registry(err) => Some(err),
            AppError::Reindex(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Filter(_) | AppError::Json(_) => StatusCode::BAD_REQUEST,
            AppError::Registry(RegistryError::Filter(_)) => StatusCode::BAD_REQUEST,
            AppError::Indexing(IndexingError::Repository(RepositoryError::NotFound(_))) => {
                StatusCode::NOT_FOUND
            }
            AppError::Indexing(IndexingError::Repository(RepositoryError::Unavailable(_))) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::Indexing(IndexingError::Index(err))
            | AppError::Registry(RegistryError::Index(err))
                if err.is_retryable() =>
            {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_)
            | AppError::Indexing(_)
            | AppError::Registry(_)
            | AppError::Reindex(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<FilterError> for AppError {
    fn from(value: FilterError) -> Self {
        Self::Filter(value)
    }
}

impl From<IndexingError> for AppError {
    fn from(value: IndexingError) -> Self {
        Self::Indexing(value)
    }
}

impl From<IndexError> for AppError {
    fn from(value: IndexError) -> Self {
        Self::Indexing(IndexingError::Index(value))
    }
}

impl From<RegistryError> for AppError {
    fn from(value: RegistryError) -> Self {
        Self::Registry(value)
    }
}

impl From<ReindexError> for AppError {
    fn from(value: ReindexError) -> Self {
        Self::Reindex(value)
    }
}
