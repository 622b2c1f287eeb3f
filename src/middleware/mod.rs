//! HTTP middleware wrapped around the gateway handler.
//!
//! - **Security headers**: fixed protective headers on every response
//! - **CORS**: wildcard cross-origin headers, `OPTIONS` answered directly
//! - **Request ID**: generated or propagated `X-Request-Id`, forwarded upstream
//! - **Request metrics**: one `gateway_requests_total` count per response
//!
//! # Architecture
//!
//! ```text
//! Request → Metrics → Security Headers → CORS → Request ID → Trace → Gateway
//!                                          ↓          ↓
//!                                  200 for OPTIONS   X-Request-Id header
//! ```

pub mod cors;
pub mod request_id;
pub mod request_metrics;
pub mod security;

pub use cors::permissive_cors;
pub use request_id::{REQUEST_ID_HEADER, RequestIdExt, RequestIdLayer, RequestIdMakeSpan};
pub use request_metrics::track_requests;
pub use security::{SECURITY_HEADERS, with_security_headers};
