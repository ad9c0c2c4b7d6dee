//! Identity-provider authentication scheme.
//!
//! Same pipeline shape as the local scheme, but verification is delegated
//! to the configured [`IdentityProvider`]. An unconfigured provider is a
//! deployment fault and short-circuits with PROVIDER_NOT_CONFIGURED.

use crate::domain::error::{ApiError, ErrorCode};
use crate::middleware::{extract_bearer, Principal};
use crate::providers::IdentityProvider;
use axum::{body::Body, http::Request, response::IntoResponse, response::Response};
use std::sync::Arc;
use tower::{Layer, Service};
use tracing::{debug, error, warn};

/// Identity-provider authentication layer.
#[derive(Clone)]
pub struct IdentityAuthLayer {
    provider: Option<Arc<dyn IdentityProvider>>,
}

impl IdentityAuthLayer {
    pub fn new(provider: Option<Arc<dyn IdentityProvider>>) -> Self {
        Self { provider }
    }
}

impl<S> Layer<S> for IdentityAuthLayer {
    type Service = IdentityAuthService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        IdentityAuthService {
            inner,
            provider: self.provider.clone(),
        }
    }
}

/// Identity-provider authentication service.
#[derive(Clone)]
pub struct IdentityAuthService<S> {
    inner: S,
    provider: Option<Arc<dyn IdentityProvider>>,
}

impl<S> Service<Request<Body>> for IdentityAuthService<S>
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
        let provider = self.provider.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let token = match extract_bearer(&req) {
                Ok(token) => token,
                Err(e) => {
                    warn!(path = %req.uri().path(), "Request rejected: no bearer token");
                    return Ok(e.into_response());
                }
            };

            let Some(provider) = provider else {
                error!("Identity provider is not configured");
                return Ok(
                    ApiError::from_code(ErrorCode::ProviderNotConfigured).into_response()
                );
            };

            match provider.verify_token(&token).await {
                Ok(claims) => {
                    debug!(subject = %claims.subject, "Identity token verified");
                    req.extensions_mut().insert(Principal {
                        subject: claims.subject,
                        email: claims.email,
                        role: None,
                        issued_at: None,
                        provider: "identity-provider",
                    });
                    inner.call(req).await
                }
                Err(provider_err) => {
                    let e = ApiError::from(&provider_err);
                    warn!(code = ?e.code, path = %req.uri().path(), "Identity verification failed");
                    Ok(e.into_response())
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{ProviderClaims, ProviderError};
    use async_trait::async_trait;
    use axum::http::{header::AUTHORIZATION, StatusCode};
    use axum::routing::get;
    use axum::{Extension, Router};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    struct StaticProvider {
        result: Result<ProviderClaims, ProviderError>,
    }

    #[async_trait]
    impl IdentityProvider for StaticProvider {
        async fn verify_token(&self, _token: &str) -> Result<ProviderClaims, ProviderError> {
            self.result.clone()
        }
    }

    fn app(provider: Option<Arc<dyn IdentityProvider>>) -> Router {
        Router::new()
            .route(
                "/whoami",
                get(|Extension(principal): Extension<Principal>| async move {
                    principal.subject
                }),
            )
            .route_layer(IdentityAuthLayer::new(provider))
    }

    fn authed_request() -> Request<Body> {
        Request::builder()
            .uri("/whoami")
            .header(AUTHORIZATION, "Bearer provider-token")
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_verified_token_attaches_principal() {
        let provider = Arc::new(StaticProvider {
            result: Ok(ProviderClaims {
                subject: "uid-42".to_string(),
                email: Some("user@test.com".to_string()),
            }),
        });
        let response = app(Some(provider)).oneshot(authed_request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"uid-42");
    }

    #[tokio::test]
    async fn test_unconfigured_provider_is_service_unavailable() {
        let response = app(None).oneshot(authed_request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["code"], "PROVIDER_NOT_CONFIGURED");
    }

    #[tokio::test]
    async fn test_revoked_token_is_forbidden() {
        let provider = Arc::new(StaticProvider {
            result: Err(ProviderError::Revoked),
        });
        let response = app(Some(provider)).oneshot(authed_request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["code"], "TOKEN_REVOKED");
    }

    #[tokio::test]
    async fn test_missing_header_short_circuits_before_provider() {
        let provider = Arc::new(StaticProvider {
            result: Err(ProviderError::Invalid),
        });
        let request = Request::builder()
            .uri("/whoami")
            .body(Body::empty())
            .unwrap();
        let response = app(Some(provider)).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
