use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use contextor::ContextorError;
use thiserror::Error;
use tracing::error;

use crate::routes::predict::predict_request::PredictResponse;

/// Reply sent for any failure while answering; details stay in the logs.
pub const INTERNAL_ERROR_REPLY: &str = "Erreur interne. Réessaie dans un instant.";

/// Public application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // --- IO / network / server ---
    #[error("failed to bind listener on {addr}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error")]
    Server(#[source] std::io::Error),

    // --- Request handling ---
    #[error(transparent)]
    Pipeline(#[from] ContextorError),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Bind { .. } | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Pipeline(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::Bind { .. } => "BIND_ERROR",
            AppError::Server(_) => "SERVER_ERROR",
            AppError::Pipeline(ContextorError::Timeout { .. }) => "TIMEOUT",
            AppError::Pipeline(ContextorError::Rag(_)) => "RETRIEVAL_ERROR",
            AppError::Pipeline(_) => "PIPELINE_ERROR",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        error!(code = self.error_code(), error = %self, "request failed");
        let body = PredictResponse {
            reply: INTERNAL_ERROR_REPLY.to_string(),
            tag: String::new(),
        };
        (status, Json(body)).into_response()
    }
}

/// Handy result alias used across handlers.
pub type AppResult<T> = Result<T, AppError>;
