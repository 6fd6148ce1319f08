//! Error handling for the shelf HTTP layer

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use uuid::{NoContext, Timestamp, Uuid};

/// Body returned for every failed request
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// A failed store call, answered with a fixed per-route message.
///
/// The cause is logged under a fresh error id and never reaches the client.
#[derive(Error, Debug)]
#[error("{message}: {cause}")]
pub struct AppError {
    message: &'static str,
    cause: anyhow::Error,
}

impl AppError {
    /// Wrap a persistence failure with the route's client-facing message
    pub fn persistence(message: &'static str, cause: impl Into<anyhow::Error>) -> Self {
        Self {
            message,
            cause: cause.into(),
        }
    }

    pub fn message(&self) -> &'static str {
        self.message
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let error_id = Uuid::new_v7(Timestamp::now(NoContext));
        let status = self.status();

        tracing::error!(
            error_id = %error_id,
            status_code = %status.as_u16(),
            cause = %format!("{:#}", self.cause),
            "{}",
            self.message
        );

        let body = ErrorBody {
            error: self.message.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
