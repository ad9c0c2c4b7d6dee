//! Local-token authentication scheme.
//!
//! Extract the bearer token, verify the HS256 signature and expiry with
//! the configured secret, attach the verified [`Principal`], or
//! short-circuit with the matching taxonomy code. A missing secret is a
//! configuration fault, reported per request as JWT_SECRET_MISSING rather
//! than failing the boot, since token routes may be unused.

use crate::domain::error::{ApiError, ErrorCode};
use crate::middleware::{extract_bearer, Principal};
use axum::{body::Body, http::Request, response::IntoResponse, response::Response};
use jsonwebtoken::{decode, errors::ErrorKind, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower::{Layer, Service};
use tracing::{error, warn};

/// Claims carried by a locally signed token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalClaims {
    pub sub: String,
    pub email: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
    pub provider: String,
}

impl From<LocalClaims> for Principal {
    fn from(claims: LocalClaims) -> Self {
        Principal {
            subject: claims.sub,
            email: Some(claims.email),
            role: Some(claims.role),
            issued_at: Some(claims.iat),
            provider: "local",
        }
    }
}

/// Verify a locally signed token against the secret.
pub(crate) fn verify_local_token(token: &str, secret: &str) -> Result<LocalClaims, ApiError> {
    decode::<LocalClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => ApiError::from_code(ErrorCode::TokenExpired),
        ErrorKind::InvalidToken
        | ErrorKind::InvalidSignature
        | ErrorKind::ImmatureSignature
        | ErrorKind::InvalidAlgorithm
        | ErrorKind::Base64(_)
        | ErrorKind::Json(_)
        | ErrorKind::Utf8(_) => ApiError::from_code(ErrorCode::InvalidToken),
        _ => ApiError::from_code(ErrorCode::JwtVerificationFailed),
    })
}

/// Local-token authentication layer.
#[derive(Clone)]
pub struct JwtAuthLayer {
    secret: Arc<Option<String>>,
}

impl JwtAuthLayer {
    pub fn new(secret: Option<String>) -> Self {
        Self {
            secret: Arc::new(secret),
        }
    }
}

impl<S> Layer<S> for JwtAuthLayer {
    type Service = JwtAuthService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        JwtAuthService {
            inner,
            secret: Arc::clone(&self.secret),
        }
    }
}

/// Local-token authentication service.
#[derive(Clone)]
pub struct JwtAuthService<S> {
    inner: S,
    secret: Arc<Option<String>>,
}

impl<S> Service<Request<Body>> for JwtAuthService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let secret = Arc::clone(&self.secret);
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let token = match extract_bearer(&req) {
                Ok(token) => token,
                Err(e) => {
                    warn!(path = %req.uri().path(), "Request rejected: no bearer token");
                    return Ok(e.into_response());
                }
            };

            let Some(secret) = secret.as_deref() else {
                error!("JWT_SECRET is not configured");
                return Ok(ApiError::from_code(ErrorCode::JwtSecretMissing).into_response());
            };

            match verify_local_token(&token, secret) {
                Ok(claims) => {
                    req.extensions_mut().insert(Principal::from(claims));
                    inner.call(req).await
                }
                Err(e) => {
                    warn!(code = ?e.code, path = %req.uri().path(), "Token verification failed");
                    Ok(e.into_response())
                }
            }
        })
    }
}
