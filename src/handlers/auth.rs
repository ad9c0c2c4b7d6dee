//! Token issuing and identity echo handlers.

use crate::domain::error::{ApiError, ErrorCode};
use crate::middleware::auth::LocalClaims;
use crate::middleware::Principal;
use crate::response::{envelope_timestamp, ApiSuccess};
use crate::router::AppState;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Extension,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::json;
use tracing::info;

const TEST_TOKEN_TTL_HOURS: i64 = 24;

/// Seeded identities for which test tokens are issued. Testing aid only;
/// there is no user database behind these.
fn seeded_users() -> Vec<(&'static str, &'static str, &'static str)> {
    vec![("user1", "user@test.com", "user")]
}

/// GET /auth/test-tokens. Unauthenticated by design: the tokens exist so
/// the authenticated routes can be exercised without an identity provider.
pub async fn test_tokens(State(state): State<AppState>) -> Response {
    let Some(secret) = state.config.jwt_secret.as_deref() else {
        return ApiError::from_code(ErrorCode::JwtSecretMissing).into_response();
    };

    let now = Utc::now();
    let mut tokens = Vec::new();
    for (user_id, email, role) in seeded_users() {
        let claims = LocalClaims {
            sub: user_id.to_string(),
            email: email.to_string(),
            role: role.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(TEST_TOKEN_TTL_HOURS)).timestamp(),
            provider: "local".to_string(),
        };

        let token = match encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        ) {
            Ok(token) => token,
            Err(_) => {
                return ApiError::new(
                    ErrorCode::JwtVerificationFailed,
                    "Failed to generate test tokens",
                )
                .into_response();
            }
        };

        tokens.push(json!({
            "user": claims,
            "token": token,
            "type": "Bearer",
            "expiresIn": "24h",
        }));
    }

    info!(count = tokens.len(), "Issued test tokens");
    ApiSuccess::new(json!({ "tokens": tokens }))
        .with_message("Test tokens generated successfully")
        .into_response()
}

/// GET /auth/me. Echo the identity the auth middleware verified.
pub async fn current_user(principal: Option<Extension<Principal>>) -> Response {
    let Some(Extension(principal)) = principal else {
        return ApiError::from_code(ErrorCode::Unauthorized).into_response();
    };

    ApiSuccess::new(json!({
        "user": principal,
        "authenticated": true,
        "timestamp": envelope_timestamp(),
    }))
    .with_message("User information retrieved successfully")
    .into_response()
}
