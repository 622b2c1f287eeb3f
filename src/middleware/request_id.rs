//! Request ID middleware for correlating gateway and backend logs.
//!
//! # Behavior
//!
//! - Keeps an inbound `X-Request-Id` header when present
//! - Otherwise generates a UUIDv4
//! - Writes the ID onto the request before routing, so it is forwarded to
//!   the backend along with the other headers
//! - Echoes the ID on the response unless the response (usually a
//!   backend's) already carries one
//!
//! [`RequestIdMakeSpan`] opens the per-request trace span with the ID as a
//! field, so every gateway log line for a request carries it. The trace
//! layer must sit inside [`RequestIdLayer`] for the ID to be present.

use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::header::HeaderValue;
use axum::http::{Request, Response};
use tower::{Layer, Service};
use tower_http::trace::MakeSpan;
use tracing::{Span, debug, info_span};
use uuid::Uuid;

/// Header name for request ID.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request ID layer for Tower middleware stack.
#[derive(Clone, Default)]
pub struct RequestIdLayer;

impl RequestIdLayer {
    /// Create a new request ID layer.
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for RequestIdLayer {
    type Service = RequestIdService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestIdService { inner }
    }
}

/// Request ID service wrapper.
#[derive(Clone)]
pub struct RequestIdService<S> {
    inner: S,
}

impl<S> Service<Request<Body>> for RequestIdService<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let request_id = extract_or_generate_request_id(&req);

        debug!(request_id = ?request_id, "Assigned request id");

        req.headers_mut().insert(REQUEST_ID_HEADER, request_id.clone());

        // Take the service that was driven to readiness, leave a fresh clone behind
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let mut response = inner.call(req).await?;
            response
                .headers_mut()
                .entry(REQUEST_ID_HEADER)
                .or_insert(request_id);
            Ok(response)
        })
    }
}

/// Reuse a usable inbound request ID or generate a new one.
fn extract_or_generate_request_id<B>(req: &Request<B>) -> HeaderValue {
    if let Some(value) = req.headers().get(REQUEST_ID_HEADER)
        && !value.is_empty()
    {
        return value.clone();
    }

    // A hyphenated UUID is always a valid header value
    HeaderValue::from_str(&Uuid::new_v4().to_string())
        .unwrap_or_else(|_| HeaderValue::from_static("unknown"))
}

/// Extension trait to extract request ID from requests.
pub trait RequestIdExt {
    /// Get the request ID from the request headers.
    fn request_id(&self) -> Option<&str>;
}

impl<B> RequestIdExt for Request<B> {
    fn request_id(&self) -> Option<&str> {
        self.headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
    }
}

/// Request span carrying the request ID for `TraceLayer::make_span_with`.
#[derive(Clone, Debug, Default)]
pub struct RequestIdMakeSpan;

impl<B> MakeSpan<B> for RequestIdMakeSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = request.request_id().unwrap_or("-"),
        )
    }
}
