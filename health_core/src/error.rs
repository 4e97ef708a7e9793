//! Application error types and handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = match self {
            AppError::Encoding(err) => {
                tracing::error!("Encoding error: {:?}", err);
                "Failed to encode response".to_string()
            }
            AppError::Database(msg) => {
                tracing::error!("Database error: {}", msg);
                "Database error".to_string()
            }
            err => {
                tracing::error!("Unexpected error: {:?}", err);
                "Internal server error".to_string()
            }
        };

        let body = Json(json!({
            "error": message,
            "status": StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
        }));

        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.to_string())
    }
}
