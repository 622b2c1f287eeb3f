//! Single entry point for every request that reaches routing.
//!
//! Each request is classified against the route table and then either
//! answered locally (root page, 404) or rewritten, assigned a target and
//! forwarded. Every failure is contained here: a dead backend becomes a
//! `503` for this request only.

use std::time::Instant;

use axum::extract::State;
use axum::http::{HeaderMap, Method, Uri};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use tracing::{debug, error, info, instrument};

use super::fallback;
use crate::metrics;
use crate::proxy::{ProxyRequest, RouteClass};
use crate::state::AppState;

/// Classify, rewrite and forward (or answer) one request.
///
/// The body is buffered in full by the `Bytes` extractor, which enforces
/// the configured body limit with `413 Payload Too Large`.
#[instrument(skip_all, fields(method = %method, path = %uri.path()))]
pub async fn gateway(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let class = state.routes.classify(&method, uri.path());

    info!(method = %method, uri = %uri, route = %class, "Incoming request");
    debug!(headers = ?headers, body_bytes = body.len(), "Incoming request details");

    let mut response = match class {
        RouteClass::Root => fallback::welcome().await.into_response(),
        RouteClass::CatchAll => fallback::not_found(method, uri).await,
        RouteClass::PrefixProxy | RouteClass::DirectProxy => {
            proxy(&state, class, method, uri, headers, body).await
        }
    };

    // Picked up by the request counter in `middleware::request_metrics`
    response.extensions_mut().insert(class);
    response
}

/// Forward a request of a proxied route class to the next target.
async fn proxy(
    state: &AppState,
    class: RouteClass,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(forward_path) = state.routes.rewrite(class, uri.path(), uri.query()) else {
        return fallback::not_found(method, uri).await;
    };

    let target = state.selector.select();
    let body_len = body.len();
    let original = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());
    let request = ProxyRequest::new(method, original.as_str(), forward_path, headers, body);

    let started = Instant::now();
    let result = state.forwarder.forward(request, target).await;
    metrics::record_upstream_duration(class.as_str(), started.elapsed().as_secs_f64());

    match result {
        Ok(response) => {
            metrics::record_forwarded_bytes(body_len);
            info!(
                route = %class,
                path = %original,
                status = response.status().as_u16(),
                "Proxy response"
            );
            response
        }
        Err(e) => {
            if e.is_upstream() {
                metrics::record_upstream_error(e.kind());
            }
            error!(
                route = %class,
                target_url = %target,
                path = %original,
                error = %e,
                "Proxy error"
            );
            e.into_response()
        }
    }
}
