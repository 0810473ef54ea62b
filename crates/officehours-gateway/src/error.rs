// SPDX-FileCopyrightText: 2026 Officehours Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mapping from domain errors to HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use officehours_core::{ErrorKind, OfficeHoursError};

/// Error body: `{"error": "...", "kind": "conflict"}`.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: &'static str,
}

#[derive(Debug)]
pub enum ApiError {
    Domain(OfficeHoursError),
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
}

impl From<OfficeHoursError> for ApiError {
    fn from(e: OfficeHoursError) -> Self {
        ApiError::Domain(e)
    }
}

pub fn status_for(kind: ErrorKind) -> (StatusCode, &'static str) {
    match kind {
        ErrorKind::Validation => (StatusCode::BAD_REQUEST, "validation"),
        ErrorKind::Conflict => (StatusCode::CONFLICT, "conflict"),
        ErrorKind::NotFound => (StatusCode::NOT_FOUND, "not_found"),
        ErrorKind::Transient => (StatusCode::SERVICE_UNAVAILABLE, "transient"),
        ErrorKind::Fatal => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, error) = match self {
            ApiError::Domain(e) => {
                let (status, kind) = status_for(e.kind());
                if status.is_server_error() {
                    tracing::error!(error = %e, "request failed");
                    // Internals stay in the log.
                    (status, kind, "internal error".to_string())
                } else {
                    (status, kind, e.to_string())
                }
            }
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "validation", msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg),
        };
        (status, Json(ErrorResponse { error, kind })).into_response()
    }
}
