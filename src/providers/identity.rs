//! Identity provider collaborator.
//!
//! The provider is consumed through one call: verify a token, get claims
//! or a typed error. Provider-specific error identifiers are normalized
//! here and mapped onto the API taxonomy, so nothing else in the system
//! ever sees a provider error shape.

use crate::domain::error::{ApiError, ErrorCode};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Claims returned by a successful remote verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderClaims {
    /// Stable subject identifier.
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Typed verification failure.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    #[error("identity token has expired")]
    Expired,
    #[error("identity token has been revoked")]
    Revoked,
    #[error("identity token is invalid")]
    Invalid,
    #[error("user not found")]
    UserNotFound,
    #[error("identity provider error {code}: {message}")]
    Other { code: String, message: String },
}

impl ProviderError {
    /// Normalize a provider wire code into a typed error.
    pub fn from_wire(code: &str, message: impl Into<String>) -> Self {
        match code {
            "expired" => ProviderError::Expired,
            "revoked" => ProviderError::Revoked,
            "invalid" => ProviderError::Invalid,
            "user-not-found" => ProviderError::UserNotFound,
            _ => ProviderError::Other {
                code: code.to_string(),
                message: message.into(),
            },
        }
    }
}

impl From<&ProviderError> for ApiError {
    fn from(err: &ProviderError) -> Self {
        match err {
            ProviderError::Expired => {
                ApiError::new(ErrorCode::TokenExpired, "Identity token has expired")
            }
            ProviderError::Revoked => {
                ApiError::new(ErrorCode::TokenRevoked, "Identity token has been revoked")
            }
            ProviderError::Invalid => {
                ApiError::new(ErrorCode::InvalidToken, "Invalid identity token")
            }
            ProviderError::UserNotFound => {
                ApiError::new(ErrorCode::RecordNotFound, "User not found")
            }
            ProviderError::Other { code, message } => ApiError::from_code(
                ErrorCode::ProviderAuthError,
            )
            .with_details(serde_json::json!({
                "providerCode": code,
                "providerMessage": message,
            })),
        }
    }
}

/// Verify-token seam. One process-wide handle is created at boot and
/// passed explicitly into the middleware that needs it.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn verify_token(&self, token: &str) -> Result<ProviderClaims, ProviderError>;
}

/// HTTP-backed identity provider client.
pub struct RemoteIdentityProvider {
    http: reqwest::Client,
    verify_url: String,
    api_key: String,
    project_id: String,
}

impl RemoteIdentityProvider {
    pub fn new(verify_url: String, api_key: String, project_id: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            verify_url,
            api_key,
            project_id,
        }
    }
}

#[derive(Serialize)]
struct VerifyRequest<'a> {
    token: &'a str,
    project_id: &'a str,
}

#[derive(Deserialize)]
struct VerifyResponse {
    claims: Option<ProviderClaims>,
    error: Option<WireError>,
}

#[derive(Deserialize)]
struct WireError {
    code: String,
    #[serde(default)]
    message: String,
}

#[async_trait]
impl IdentityProvider for RemoteIdentityProvider {
    async fn verify_token(&self, token: &str) -> Result<ProviderClaims, ProviderError> {
        let response = self
            .http
            .post(&self.verify_url)
            .header("x-api-key", &self.api_key)
            .json(&VerifyRequest {
                token,
                project_id: &self.project_id,
            })
            .send()
            .await
            .map_err(|e| ProviderError::Other {
                code: "network".to_string(),
                message: e.to_string(),
            })?;

        let body: VerifyResponse =
            response.json().await.map_err(|e| ProviderError::Other {
                code: "malformed-response".to_string(),
                message: e.to_string(),
            })?;

        match (body.claims, body.error) {
            (Some(claims), _) => Ok(claims),
            (None, Some(err)) => Err(ProviderError::from_wire(&err.code, err.message)),
            (None, None) => Err(ProviderError::Other {
                code: "malformed-response".to_string(),
                message: "verification response carried neither claims nor error".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_wire_code_normalization() {
        assert!(matches!(
            ProviderError::from_wire("expired", ""),
            ProviderError::Expired
        ));
        assert!(matches!(
            ProviderError::from_wire("revoked", ""),
            ProviderError::Revoked
        ));
        assert!(matches!(
            ProviderError::from_wire("invalid", ""),
            ProviderError::Invalid
        ));
        assert!(matches!(
            ProviderError::from_wire("user-not-found", ""),
            ProviderError::UserNotFound
        ));
        assert!(matches!(
            ProviderError::from_wire("quota-exceeded", "too many requests"),
            ProviderError::Other { .. }
        ));
    }

    #[test]
    fn test_taxonomy_mapping() {
        let err = ApiError::from(&ProviderError::Expired);
        assert_eq!(err.code, ErrorCode::TokenExpired);
        assert_eq!(err.status(), StatusCode::FORBIDDEN);

        let err = ApiError::from(&ProviderError::Revoked);
        assert_eq!(err.code, ErrorCode::TokenRevoked);
        assert_eq!(err.status(), StatusCode::FORBIDDEN);

        let err = ApiError::from(&ProviderError::Invalid);
        assert_eq!(err.code, ErrorCode::InvalidToken);
        assert_eq!(err.status(), StatusCode::FORBIDDEN);

        let err = ApiError::from(&ProviderError::UserNotFound);
        assert_eq!(err.code, ErrorCode::RecordNotFound);
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_unknown_code_preserves_raw_identifier() {
        let err = ApiError::from(&ProviderError::Other {
            code: "quota-exceeded".to_string(),
            message: "too many requests".to_string(),
        });
        assert_eq!(err.code, ErrorCode::ProviderAuthError);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let details = err.details.unwrap();
        assert_eq!(details["providerCode"], "quota-exceeded");
        assert_eq!(details["providerMessage"], "too many requests");
    }
}
