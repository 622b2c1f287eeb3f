//! Per-request counter covering every response the gateway produces.
//!
//! The gateway handler tags its responses with the [`RouteClass`] it
//! matched. Responses that never reached the handler (an `OPTIONS`
//! short-circuit, a body-limit rejection) carry no tag and are counted
//! under [`UNROUTED`].

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::metrics;
use crate::proxy::RouteClass;

/// `route` label for responses produced before routing.
pub const UNROUTED: &str = "unrouted";

/// Middleware recording `gateway_requests_total` for each response.
pub async fn track_requests(request: Request, next: Next) -> Response {
    let response = next.run(request).await;

    let route = response
        .extensions()
        .get::<RouteClass>()
        .map_or(UNROUTED, |class| class.as_str());
    metrics::record_request(route, response.status().as_u16());

    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::sync::{Arc, Mutex};

    use ::metrics::{
        Counter, Gauge, Histogram, Key, KeyName, Metadata, Recorder, SharedString, Unit,
    };
    use axum::body::Body;
    use axum::http::{Method, StatusCode};
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::metrics::names;
    use crate::routes::build_router;
    use crate::state::AppState;

    /// Remembers the `(name, route, status)` of every counter registration.
    #[derive(Default)]
    struct CapturingRecorder {
        seen: Arc<Mutex<Vec<(String, String, String)>>>,
    }

    impl Recorder for CapturingRecorder {
        fn describe_counter(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
        fn describe_gauge(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
        fn describe_histogram(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

        fn register_counter(&self, key: &Key, _: &Metadata<'_>) -> Counter {
            let label = |name: &str| {
                key.labels()
                    .find(|l| l.key() == name)
                    .map(|l| l.value().to_string())
                    .unwrap_or_default()
            };
            self.seen.lock().unwrap().push((
                key.name().to_string(),
                label("route"),
                label("status"),
            ));
            Counter::noop()
        }

        fn register_gauge(&self, _: &Key, _: &Metadata<'_>) -> Gauge {
            Gauge::noop()
        }

        fn register_histogram(&self, _: &Key, _: &Metadata<'_>) -> Histogram {
            Histogram::noop()
        }
    }

    /// Send one request through the full router and return the recorded
    /// request counters as `(route, status)`.
    fn counted(config: Config, method: Method, uri: &str, body: Vec<u8>) -> Vec<(String, String)> {
        let recorder = CapturingRecorder::default();
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        ::metrics::with_local_recorder(&recorder, || {
            runtime.block_on(async {
                let app = build_router(AppState::new(config));
                app.oneshot(
                    axum::http::Request::builder()
                        .method(method)
                        .uri(uri)
                        .body(Body::from(body))
                        .unwrap(),
                )
                .await
                .unwrap();
            })
        });

        let seen = recorder.seen.lock().unwrap();
        seen.iter()
            .filter(|(name, _, _)| name == names::REQUESTS_TOTAL)
            .map(|(_, route, status)| (route.clone(), status.clone()))
            .collect()
    }

    #[test]
    fn test_options_short_circuit_is_counted() {
        let counts = counted(Config::default(), Method::OPTIONS, "/c2/beacon", Vec::new());

        assert_eq!(counts, [(UNROUTED.to_string(), "200".to_string())]);
    }

    #[test]
    fn test_body_limit_rejection_is_counted() {
        let config = Config {
            max_request_body_size: 8,
            ..Config::default()
        };
        let counts = counted(config, Method::POST, "/c2/upload", vec![0u8; 64]);

        let status = StatusCode::PAYLOAD_TOO_LARGE.as_u16().to_string();
        assert_eq!(counts, [(UNROUTED.to_string(), status)]);
    }

    #[test]
    fn test_handled_request_counted_once_with_route() {
        let counts = counted(Config::default(), Method::GET, "/missing", Vec::new());

        assert_eq!(counts, [("catch_all".to_string(), "404".to_string())]);
    }
}
