//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-side errors to
//! Sentry before responding to the client. All route handlers return
//! `Result<T, AppError>`. Every response body is JSON with a `message` field;
//! 500s additionally carry an `error` string (never a stack trace).

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::email::EmailError;
use crate::services::invoice::RenderError;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or malformed request fields.
    #[error("{0}")]
    Validation(String),

    /// The cart resolved to zero valid order lines.
    #[error("No valid products in cart")]
    EmptyOrder,

    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// Operator misconfiguration: missing mailer or seller settings.
    /// Conceptually distinct from transient failure even though both map
    /// to a 500.
    #[error("{0}")]
    Configuration(String),

    /// Invoice rendering or invoice file I/O failed.
    #[error("Invoice rendering failed: {0}")]
    InvoiceRender(#[from] RenderError),

    /// Order email dispatch failed.
    #[error("Email dispatch failed: {0}")]
    Notification(#[from] EmailError),

    /// Catalog store operation failed.
    #[error("Store error: {0}")]
    Store(#[from] RepositoryError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::EmptyOrder => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Configuration(_)
            | Self::InvoiceRender(_)
            | Self::Notification(_)
            | Self::Store(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let body = match &self {
            Self::Validation(msg) => json!({ "message": msg }),
            Self::EmptyOrder => json!({ "message": "No valid products in cart" }),
            Self::NotFound(msg) => json!({ "message": msg }),
            // Configuration messages are operator-facing but not secret
            Self::Configuration(msg) => json!({ "message": msg }),
            Self::InvoiceRender(_) | Self::Notification(_) | Self::Store(_) | Self::Internal(_) => {
                json!({ "message": "Failed to process order", "error": self.to_string() })
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
