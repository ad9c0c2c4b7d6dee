//! API error types with the closed error-code taxonomy.
//!
//! Every failure rendered to a client carries one of these codes together
//! with its fixed HTTP status. Callers may override the message but never
//! the code-to-status mapping.

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of client-facing error codes.
///
/// Serialized in SCREAMING_SNAKE_CASE (`NO_TOKEN`, `DATABASE_ERROR`, ...).
/// Adding a variant forces every `match` over this enum to be revisited,
/// which is the point: the status and message tables below can never be
/// silently missing an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Authentication
    NoToken,
    InvalidToken,
    TokenExpired,
    TokenRevoked,
    Unauthorized,
    Forbidden,
    JwtSecretMissing,
    JwtVerificationFailed,

    // Validation
    ValidationError,
    MissingRequiredField,
    InvalidInput,

    // Data access
    DatabaseError,
    RecordNotFound,

    // Identity provider
    ProviderNotConfigured,
    ProviderAuthError,
    ProviderAdminError,

    // Generic
    InternalError,
    ServiceUnavailable,
    NotImplemented,
}

impl ErrorCode {
    /// Fixed HTTP status for this code.
    pub fn status(self) -> StatusCode {
        match self {
            ErrorCode::NoToken | ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::InvalidToken
            | ErrorCode::TokenExpired
            | ErrorCode::TokenRevoked
            | ErrorCode::Forbidden
            | ErrorCode::JwtVerificationFailed => StatusCode::FORBIDDEN,
            ErrorCode::ValidationError
            | ErrorCode::MissingRequiredField
            | ErrorCode::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorCode::RecordNotFound => StatusCode::NOT_FOUND,
            ErrorCode::NotImplemented => StatusCode::NOT_IMPLEMENTED,
            ErrorCode::ServiceUnavailable | ErrorCode::ProviderNotConfigured => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ErrorCode::JwtSecretMissing
            | ErrorCode::DatabaseError
            | ErrorCode::ProviderAuthError
            | ErrorCode::ProviderAdminError
            | ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Default human-readable message for this code.
    pub fn default_message(self) -> &'static str {
        match self {
            ErrorCode::NoToken => "No authentication token provided",
            ErrorCode::InvalidToken => "Invalid authentication token",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenRevoked => "Authentication token has been revoked",
            ErrorCode::Unauthorized => "Authentication required",
            ErrorCode::Forbidden => "Access forbidden",
            ErrorCode::JwtSecretMissing => "JWT secret not configured",
            ErrorCode::JwtVerificationFailed => "JWT token verification failed",
            ErrorCode::ValidationError => "Validation failed",
            ErrorCode::MissingRequiredField => "Missing required field",
            ErrorCode::InvalidInput => "Invalid input",
            ErrorCode::DatabaseError => "Database operation failed",
            ErrorCode::RecordNotFound => "Resource not found",
            ErrorCode::ProviderNotConfigured => "Identity provider not configured",
            ErrorCode::ProviderAuthError => "Identity provider authentication error",
            ErrorCode::ProviderAdminError => "Identity provider admin error",
            ErrorCode::InternalError => "An unexpected error occurred",
            ErrorCode::ServiceUnavailable => "Service unavailable",
            ErrorCode::NotImplemented => "Not implemented",
        }
    }
}

/// One failing field in a validation report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Client-facing API error: taxonomy code, message, optional details.
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with an explicit message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Create an error carrying the code's default message.
    pub fn from_code(code: ErrorCode) -> Self {
        Self::new(code, code.default_message())
    }

    /// Attach additional detail payload.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// HTTP status derived from the code. Never overridable.
    pub fn status(&self) -> StatusCode {
        self.code.status()
    }

    /// Validation failure enumerating every failing field.
    pub fn validation(errors: Vec<FieldError>) -> Self {
        Self::new(ErrorCode::ValidationError, "Validation failed").with_details(
            serde_json::json!({ "validationErrors": errors }),
        )
    }

    /// Storage-layer failure with a resource-specific message.
    ///
    /// Raw driver text is attached only in a development configuration;
    /// production responses carry the message alone.
    pub fn database(message: impl Into<String>, driver_error: &str, development: bool) -> Self {
        let err = Self::new(ErrorCode::DatabaseError, message);
        if development {
            err.with_details(serde_json::json!({ "dbError": driver_error }))
        } else {
            err
        }
    }

    /// Not-found failure for a named resource.
    pub fn not_found(resource: &str) -> Self {
        Self::new(ErrorCode::RecordNotFound, format!("{} not found", resource))
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}
