//! Request forwarding pipeline.
//!
//! This module implements the proxying core: route classification with
//! path rewriting, and dispatch of the rewritten request to a backend.

pub mod forwarder;
pub mod rewrite;

pub use forwarder::{Forwarder, ProxyRequest, UpstreamClient};
pub use rewrite::{DIRECT_ENDPOINTS, PROXY_PREFIX, RouteClass, RouteTable};
