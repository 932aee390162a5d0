use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MutantError {
    #[error("malformed grid: {0}")]
    MalformedGrid(String),

    #[error("failed to write stats log {}: {source}", path.display())]
    PersistenceWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("stats log {} is not valid CSV: {source}", path.display())]
    PersistenceCsv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

pub type Result<T> = std::result::Result<T, MutantError>;

/// Errors surfaced to HTTP clients.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    MalformedGrid(String),

    #[error("invalid request body: {0}")]
    InvalidBody(String),

    #[error("stats log unavailable")]
    StatsLogUnavailable,

    #[error("classification failed: {0}")]
    ClassificationFailed(String),
}

impl From<MutantError> for ApiError {
    fn from(err: MutantError) -> Self {
        match err {
            MutantError::MalformedGrid(_) => ApiError::MalformedGrid(err.to_string()),
            MutantError::PersistenceWrite { .. } | MutantError::PersistenceCsv { .. } => {
                ApiError::StatsLogUnavailable
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    code: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match self {
            ApiError::MalformedGrid(_) => (StatusCode::BAD_REQUEST, "MALFORMED_GRID"),
            ApiError::InvalidBody(_) => (StatusCode::BAD_REQUEST, "INVALID_BODY"),
            ApiError::StatsLogUnavailable => {
                (StatusCode::INTERNAL_SERVER_ERROR, "STATS_LOG_UNAVAILABLE")
            }
            ApiError::ClassificationFailed(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "CLASSIFICATION_FAILED")
            }
        };

        let body = ErrorResponse {
            error: self.to_string(),
            code,
        };
        (status, Json(body)).into_response()
    }
}
