//! Application routing configuration with middleware stack.
//!
//! # Middleware Stack (applied in order)
//!
//! ```text
//! Request
//!    │
//!    ▼
//! ┌──────────────────┐
//! │  Request Metrics │ ← Counts every response, by route and status
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │ Security Headers │ ← Added to every response if absent
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │       CORS       │ ← 200 for any OPTIONS, headers on everything else
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │   Request ID     │ ← Adds X-Request-Id header
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │     Tracing      │ ← Request span with request_id field
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │    Body Limit    │ ← 413 if exceeded
//! └────────┬─────────┘
//!          │
//!          ▼
//!   Gateway handler
//! ```
//!
//! # Routes
//!
//! There is no static route table in axum: every request lands in
//! [`handlers::gateway`], which classifies it with
//! [`RouteTable`](crate::proxy::RouteTable). Classification order is
//! `/c2` prefix, direct endpoints, `GET /`, then 404.

use axum::Router;
use axum::extract::DefaultBodyLimit;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::handlers;
use crate::middleware::{
    RequestIdLayer, RequestIdMakeSpan, permissive_cors, track_requests, with_security_headers,
};
use crate::state::AppState;

/// Build the application router with the gateway handler and middleware.
///
/// # Arguments
///
/// * `state` - Application state containing config, targets and forwarder
///
/// # Returns
///
/// Fully configured Axum router ready to be served.
pub fn build_router(state: AppState) -> Router {
    let config = &state.config;

    let mut router = Router::new().fallback(handlers::gateway);

    // =========================================================================
    // Apply Middleware Stack (order matters - applied bottom to top)
    // =========================================================================

    // 1. Request body size limit
    info!(
        max_size_mb = config.max_request_body_size / (1024 * 1024),
        "Request body size limit configured"
    );
    router = router.layer(DefaultBodyLimit::max(config.max_request_body_size));

    // 2. Tracing, one span per request carrying its request ID
    router = router.layer(TraceLayer::new_for_http().make_span_with(RequestIdMakeSpan));

    // 3. Request ID
    router = router.layer(RequestIdLayer::new());

    // 4. CORS, including the OPTIONS short-circuit
    router = router.layer(axum::middleware::from_fn(permissive_cors));

    // 5. Security headers, outside CORS so short-circuited responses get them too
    router = with_security_headers(router);

    // 6. Request counter, outermost so short-circuited responses are counted
    router = router.layer(axum::middleware::from_fn(track_requests));

    router.with_state(state)
}
