//! Consistent JSON error responses.
//!
//! This is the single place where typed failures from the codec, stores and
//! enforcement engine become caller-visible responses.

use std::any::Any;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use warden_infra::{EnforceError, StoreError};

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn enforce_error_to_response(err: EnforceError) -> axum::response::Response {
    match err {
        EnforceError::StoreUnavailable(msg) => {
            tracing::error!(error = %msg, "store unavailable");
            json_error(
                StatusCode::SERVICE_UNAVAILABLE,
                "store_unavailable",
                "authorization backend unavailable",
            )
        }
        EnforceError::CycleDetected { child, parent } => json_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "cycle_detected",
            format!("'{child}' inheriting '{parent}' would create a cycle"),
        ),
    }
}

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::Duplicate => json_error(
            StatusCode::BAD_REQUEST,
            "duplicate",
            "username or email already taken",
        ),
        StoreError::Unavailable(msg) => {
            tracing::error!(error = %msg, "store unavailable");
            json_error(
                StatusCode::SERVICE_UNAVAILABLE,
                "store_unavailable",
                "identity backend unavailable",
            )
        }
    }
}

/// Recovery boundary: any panic escaping a handler becomes a generic 500,
/// never a 2xx.
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> axum::response::Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "non-string panic payload".to_string()
    };
    tracing::error!(panic = %detail, "request handler panicked");

    json_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal_error",
        "internal server error",
    )
}
