//! Middleware stack: authentication schemes, input validation, request
//! logging.
//!
//! Both authentication schemes are stateless per request and independent:
//! a route installs at most one, and each short-circuits the pipeline with
//! a taxonomy-coded failure before the handler runs.

pub mod auth;
pub mod identity;
pub mod tracing;
pub mod validation;

pub use auth::JwtAuthLayer;
pub use identity::IdentityAuthLayer;
pub use tracing::RequestTracingLayer;
pub use validation::ValidationLayer;

use crate::domain::error::{ApiError, ErrorCode};
use axum::http::header::AUTHORIZATION;
use axum::http::Request;
use serde::Serialize;

/// Transient identity produced by successful token verification.
///
/// Attached to request extensions by both schemes, and dropped with the
/// request. Never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct Principal {
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issued_at: Option<i64>,
    pub provider: &'static str,
}

/// Pull the bearer token out of the `Authorization` header.
///
/// The header must carry a `"<scheme> <token>"` shape; a missing header
/// or missing token segment is a NO_TOKEN failure.
pub(crate) fn extract_bearer<B>(req: &Request<B>) -> Result<String, ApiError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or_else(|| ApiError::from_code(ErrorCode::NoToken))?;
    let value = header
        .to_str()
        .map_err(|_| ApiError::from_code(ErrorCode::NoToken))?;

    let mut segments = value.splitn(2, ' ');
    let _scheme = segments.next();
    match segments.next().map(str::trim) {
        Some(token) if !token.is_empty() => Ok(token.to_string()),
        _ => Err(ApiError::from_code(ErrorCode::NoToken)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request_with_auth(value: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder();
        if let Some(value) = value {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_bearer_extracted() {
        let req = request_with_auth(Some("Bearer abc.def.ghi"));
        assert_eq!(extract_bearer(&req).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_missing_header_is_no_token() {
        let req = request_with_auth(None);
        let err = extract_bearer(&req).unwrap_err();
        assert_eq!(err.code, ErrorCode::NoToken);
    }

    #[test]
    fn test_missing_token_segment_is_no_token() {
        let err = extract_bearer(&request_with_auth(Some("Bearer"))).unwrap_err();
        assert_eq!(err.code, ErrorCode::NoToken);
        let err = extract_bearer(&request_with_auth(Some("Bearer "))).unwrap_err();
        assert_eq!(err.code, ErrorCode::NoToken);
    }
}
