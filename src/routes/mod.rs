//! HTTP handlers
//!
//! Handlers translate between HTTP and the `DatabaseManager` contract and
//! return `Result<impl IntoResponse, ApiError>` so every failure carries a
//! JSON body.

pub mod auth;
pub mod health;
pub mod store;

use axum::{http::StatusCode, Json};

use crate::error::StoreError;

/// Error response: status plus JSON body
pub type ApiError = (StatusCode, Json<serde_json::Value>);

/// `{"errorMessage": ...}` with the given status
pub fn error_message(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(serde_json::json!({ "errorMessage": message.into() })),
    )
}

/// Map a backend failure to a generic 500, logging the cause
pub fn internal_error(context: &str, e: impl std::fmt::Display) -> ApiError {
    tracing::error!("{}: {}", context, e);
    error_message(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}

/// Map a store error: caller mistakes become 400, the rest 500
pub fn store_error(context: &str, e: StoreError) -> ApiError {
    if e.is_client_error() {
        tracing::warn!("{}: {}", context, e);
        error_message(StatusCode::BAD_REQUEST, e.to_string())
    } else {
        internal_error(context, e)
    }
}
