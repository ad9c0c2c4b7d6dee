//! Canonical response envelope.
//!
//! Every body leaving the API is one of two shapes:
//!
//! - success: `{"success": true, "data"?, "message"?, "timestamp"}`
//! - failure: `{"success": false, "error": {"code", "message", "details"?}, "timestamp"}`
//!
//! Failures carry their [`ApiError`] in a response extension so the request
//! logging middleware can report code, path and method before the response
//! is sent.

use crate::domain::error::ApiError;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

/// RFC 3339 timestamp with millisecond precision, as carried by every
/// envelope.
pub fn envelope_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Successful response envelope.
#[derive(Debug)]
pub struct ApiSuccess<T> {
    status: StatusCode,
    data: Option<T>,
    message: Option<String>,
}

impl<T: Serialize> ApiSuccess<T> {
    /// 200 OK with a data payload.
    pub fn new(data: T) -> Self {
        Self {
            status: StatusCode::OK,
            data: Some(data),
            message: None,
        }
    }

    /// 201 Created with a data payload.
    pub fn created(data: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            data: Some(data),
            message: None,
        }
    }

    /// Attach a human-readable message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl<T: Serialize> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> Response {
        let mut body = serde_json::json!({
            "success": true,
            "timestamp": envelope_timestamp(),
        });
        if let Some(data) = self.data {
            match serde_json::to_value(data) {
                Ok(value) => {
                    body["data"] = value;
                }
                Err(e) => {
                    return ApiError::new(
                        crate::domain::error::ErrorCode::InternalError,
                        format!("Failed to serialize response: {}", e),
                    )
                    .into_response();
                }
            }
        }
        if let Some(message) = self.message {
            body["message"] = serde_json::Value::String(message);
        }
        (self.status, json_response(&body)).into_response()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "success": false,
            "error": &self,
            "timestamp": envelope_timestamp(),
        });
        let mut response = (self.status(), json_response(&body)).into_response();
        // Stashed for the request logging middleware.
        response.extensions_mut().insert(self);
        response
    }
}

fn json_response(body: &serde_json::Value) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/json")],
        body.to_string(),
    )
}
