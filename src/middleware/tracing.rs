//! Request logging.
//!
//! Failure responses always produce a structured error log, keyed by the
//! taxonomy code the error envelope stashed in the response extensions.
//! Per-request info logs are gated behind the debug toggle.

use crate::domain::error::ApiError;
use axum::{body::Body, http::Request, response::Response};
use std::time::Instant;
use tower::{Layer, Service};
use tracing::{error, info};

/// Request logging layer, installed once around the whole router.
#[derive(Clone)]
pub struct RequestTracingLayer {
    debug_requests: bool,
}

impl RequestTracingLayer {
    pub fn new(debug_requests: bool) -> Self {
        Self { debug_requests }
    }
}

impl<S> Layer<S> for RequestTracingLayer {
    type Service = RequestTracingService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestTracingService {
            inner,
            debug_requests: self.debug_requests,
        }
    }
}

#[derive(Clone)]
pub struct RequestTracingService<S> {
    inner: S,
    debug_requests: bool,
}

impl<S> Service<Request<Body>> for RequestTracingService<S>
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

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let debug_requests = self.debug_requests;
        let method = req.method().clone();
        let path = req.uri().path().to_string();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            if debug_requests {
                info!(%method, %path, "Request received");
            }

            let started = Instant::now();
            let response = inner.call(req).await?;
            let elapsed_ms = started.elapsed().as_millis() as u64;

            if let Some(api_error) = response.extensions().get::<ApiError>() {
                error!(
                    code = ?api_error.code,
                    %method,
                    %path,
                    status = response.status().as_u16(),
                    elapsed_ms,
                    "Request failed: {}",
                    api_error.message
                );
            } else if debug_requests {
                info!(
                    %method,
                    %path,
                    status = response.status().as_u16(),
                    elapsed_ms,
                    "Request completed"
                );
            }

            Ok(response)
        })
    }
}
