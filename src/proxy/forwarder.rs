//! Outbound request construction and dispatch.
//!
//! The forwarder owns a pooled HTTP/1.1 client (plain HTTP and HTTPS) shared
//! by all handlers. One inbound request produces one [`ProxyRequest`], which
//! is sent exactly once to the selected target. Transport failures of any
//! kind are turned into [`AppError`] upstream variants here; callers never
//! see a raw client error.

use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::header::{CONTENT_LENGTH, CONNECTION, HOST, HeaderName};
use axum::http::{HeaderMap, HeaderValue, Method, Request, Response, Version};
use bytes::Bytes;
use http_body_util::Full;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::targets::BackendTarget;

/// Headers that only apply to a single connection and are never forwarded.
const HOP_BY_HOP_HEADERS: [&str; 7] = [
    "connection",
    "keep-alive",
    "proxy-connection",
    "transfer-encoding",
    "te",
    "trailer",
    "upgrade",
];

/// Pooled client used for all upstream traffic.
pub type UpstreamClient = Client<HttpsConnector<HttpConnector>, Full<Bytes>>;

/// The outbound form of one inbound request.
#[derive(Debug)]
pub struct ProxyRequest {
    method: Method,
    original_path: String,
    forward_path: String,
    headers: HeaderMap,
    body: Bytes,
}

impl ProxyRequest {
    /// Capture an inbound request together with its rewritten path-and-query.
    pub fn new(
        method: Method,
        original_path: impl Into<String>,
        forward_path: impl Into<String>,
        headers: HeaderMap,
        body: Bytes,
    ) -> Self {
        Self {
            method,
            original_path: original_path.into(),
            forward_path: forward_path.into(),
            headers,
            body,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn original_path(&self) -> &str {
        &self.original_path
    }

    pub fn forward_path(&self) -> &str {
        &self.forward_path
    }

    pub fn body_len(&self) -> usize {
        self.body.len()
    }

    /// Build the HTTP request sent to `target`.
    ///
    /// The `Host` header is replaced with the target's authority.
    /// Hop-by-hop headers, any header named in `Connection`, and the inbound
    /// `Content-Length` are dropped; the length is recomputed from the
    /// buffered body.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Internal` if the resulting URI is not valid.
    pub fn into_outbound(self, target: &BackendTarget) -> AppResult<Request<Full<Bytes>>> {
        let uri = target.url_for(&self.forward_path);
        let headers = forwardable_headers(&self.headers);

        let mut builder = Request::builder()
            .method(self.method)
            .version(Version::HTTP_11)
            .uri(uri);

        if let Some(outbound) = builder.headers_mut() {
            outbound.extend(headers);
            let host = HeaderValue::from_str(target.authority().as_str())
                .map_err(|e| AppError::Internal(format!("invalid host header: {e}")))?;
            outbound.insert(HOST, host);
        }

        builder
            .body(Full::new(self.body))
            .map_err(|e| AppError::Internal(format!("failed to build upstream request: {e}")))
    }
}

/// Copy every end-to-end header from an inbound request.
fn forwardable_headers(headers: &HeaderMap) -> HeaderMap {
    let connection_listed: Vec<HeaderName> = headers
        .get_all(CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    let mut forwarded = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let skip = name == HOST
            || name == CONTENT_LENGTH
            || HOP_BY_HOP_HEADERS.contains(&name.as_str())
            || connection_listed.contains(name);
        if !skip {
            forwarded.append(name.clone(), value.clone());
        }
    }
    forwarded
}

/// Sends [`ProxyRequest`]s upstream and relays the responses.
#[derive(Clone)]
pub struct Forwarder {
    client: UpstreamClient,
    timeout: Option<Duration>,
}

impl Forwarder {
    /// Create a forwarder with its own connection pool.
    ///
    /// # Arguments
    ///
    /// * `connect_timeout` - TCP connect timeout per attempt
    /// * `timeout` - Deadline for the whole exchange, or `None` for no deadline
    pub fn new(connect_timeout: Duration, timeout: Option<Duration>) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_nodelay(true);
        connector.enforce_http(false);
        connector.set_keepalive(Some(Duration::from_secs(60)));
        connector.set_connect_timeout(Some(connect_timeout));
        connector.set_reuse_address(true);

        let https = HttpsConnectorBuilder::new()
            .with_webpki_roots()
            .https_or_http()
            .enable_http1()
            .wrap_connector(connector);

        let client = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(Duration::from_secs(60))
            .pool_max_idle_per_host(32)
            .build(https);

        Self::with_client(client, timeout)
    }

    /// Create a forwarder around a pre-configured client.
    pub fn with_client(client: UpstreamClient, timeout: Option<Duration>) -> Self {
        Self { client, timeout }
    }

    /// Send `request` to `target` once and return the backend's response
    /// unchanged.
    ///
    /// # Errors
    ///
    /// - `AppError::UpstreamTimeout` if the configured deadline elapses
    /// - `AppError::UpstreamUnavailable` for any other transport failure
    pub async fn forward(
        &self,
        request: ProxyRequest,
        target: &BackendTarget,
    ) -> AppResult<Response<Body>> {
        info!(
            method = %request.method(),
            path = request.original_path(),
            forwarded_path = request.forward_path(),
            target_host = %target.authority(),
            body_bytes = request.body_len(),
            "Forwarding request"
        );

        let outbound = request.into_outbound(target)?;
        debug!(uri = %outbound.uri(), headers = ?outbound.headers(), "Upstream request built");

        let started = Instant::now();
        let exchange = self.client.request(outbound);
        let result = match self.timeout {
            Some(deadline) => match tokio::time::timeout(deadline, exchange).await {
                Ok(result) => result,
                Err(_) => {
                    return Err(AppError::UpstreamTimeout {
                        target: target.to_string(),
                        elapsed_ms: started.elapsed().as_millis(),
                    });
                }
            },
            None => exchange.await,
        };

        let response = result.map_err(|e| AppError::UpstreamUnavailable {
            target: target.to_string(),
            reason: error_chain(&e),
        })?;

        info!(
            status = response.status().as_u16(),
            target_host = %target.authority(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Upstream response received"
        );
        debug!(headers = ?response.headers(), "Upstream response headers");

        let (parts, body) = response.into_parts();
        Ok(Response::from_parts(parts, Body::new(body)))
    }
}

/// Flatten an error and its sources into one line for logging.
fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
