//! Application error types.
//!
//! Every failure on the dump path ends up as an [`AppError`]. The HTTP layer
//! only ever exposes the status code; messages stay in the logs.

use axum::http::StatusCode;
use thiserror::Error;

/// Result alias used throughout the workspace.
pub type AppResult<T> = Result<T, AppError>;

/// Application error.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid startup configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The database could not be reached or rejected the credentials.
    #[error("database connection failed: {0}")]
    DatabaseConnection(String),

    /// The query could not be executed on an open connection.
    #[error("database query failed: {0}")]
    DatabaseQuery(String),

    /// A result value could not be encoded as JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl AppError {
    /// HTTP status reported for this error.
    ///
    /// Connection and query failures are deliberately indistinguishable to the
    /// caller: both map to `404 Not Found`.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::DatabaseConnection(_) | AppError::DatabaseQuery(_) => StatusCode::NOT_FOUND,
            AppError::Config(_) | AppError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short machine-readable error code, used as a log field.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::DatabaseConnection(_) => "DATABASE_CONNECTION_ERROR",
            AppError::DatabaseQuery(_) => "DATABASE_QUERY_ERROR",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}
