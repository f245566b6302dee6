//! HTTP middleware for Axum.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};
use tower::{Layer, Service};

use super::HEALTH_PATH;

/// Exporter endpoint a request was routed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endpoint {
    Metrics,
    Health,
    Landing,
    Unknown,
}

impl Endpoint {
    /// Classifies `path` against the configured telemetry path. The telemetry
    /// path wins over the landing page when both are `/`.
    pub fn classify(path: &str, telemetry_path: &str) -> Self {
        if path == telemetry_path {
            Endpoint::Metrics
        } else if path == HEALTH_PATH {
            Endpoint::Health
        } else if path == "/" {
            Endpoint::Landing
        } else {
            Endpoint::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::Metrics => "metrics",
            Endpoint::Health => "health",
            Endpoint::Landing => "landing",
            Endpoint::Unknown => "unknown",
        }
    }
}

/// Layer that logs each request with the exporter endpoint it hit.
#[derive(Clone)]
pub struct ScrapeLogLayer {
    telemetry_path: Arc<str>,
}

impl ScrapeLogLayer {
    pub fn new(telemetry_path: Arc<str>) -> Self {
        Self { telemetry_path }
    }
}

impl<S> Layer<S> for ScrapeLogLayer {
    type Service = ScrapeLogService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ScrapeLogService {
            inner,
            telemetry_path: self.telemetry_path.clone(),
        }
    }
}

/// Service that logs served scrapes and probes.
///
/// Metrics requests are logged at debug with their duration, and at warn
/// when the exposition itself failed. Health checks are logged at trace so
/// liveness probes do not drown out scrapes.
#[derive(Clone)]
pub struct ScrapeLogService<S> {
    inner: S,
    telemetry_path: Arc<str>,
}

impl<S, ResBody> Service<Request<Body>> for ScrapeLogService<S>
where
    S: Service<Request<Body>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send,
    ResBody: Send,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let endpoint = Endpoint::classify(request.uri().path(), &self.telemetry_path);
        let method = request.method().clone();
        let scraper = request
            .headers()
            .get("user-agent")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-")
            .to_string();

        let start = Instant::now();
        let future = self.inner.call(request);

        Box::pin(async move {
            let response = future.await?;
            let status = response.status();
            let duration_ms = start.elapsed().as_millis();

            match endpoint {
                Endpoint::Metrics if status.is_server_error() => tracing::warn!(
                    status = %status.as_u16(),
                    duration_ms = %duration_ms,
                    scraper = %scraper,
                    "metrics exposition failed"
                ),
                Endpoint::Metrics => tracing::debug!(
                    status = %status.as_u16(),
                    duration_ms = %duration_ms,
                    scraper = %scraper,
                    "metrics served"
                ),
                Endpoint::Health => tracing::trace!(status = %status.as_u16(), "health checked"),
                Endpoint::Landing | Endpoint::Unknown => tracing::debug!(
                    endpoint = endpoint.as_str(),
                    method = %method,
                    status = %status.as_u16(),
                    duration_ms = %duration_ms,
                    "HTTP request completed"
                ),
            }

            Ok(response)
        })
    }
}
