//! Shared application state for Axum handlers.
//!
//! Everything here is built once at startup and shared by all handlers:
//!
//! - **Configuration**: runtime configuration access
//! - **Selector**: the target registry and the rotation cursor
//! - **Routes**: the fixed route table
//! - **Forwarder**: the pooled upstream client
//!
//! # Thread Safety
//!
//! The only mutable piece is the rotation cursor inside the selector, which
//! is an atomic. Everything else is immutable behind `Arc`, and the client
//! pool synchronizes internally.

use std::sync::Arc;

use tracing::info;

use crate::config::Config;
use crate::proxy::{Forwarder, RouteTable};
use crate::targets::{TargetRegistry, TargetSelector};

/// Shared application state for Axum handlers.
///
/// Cloned for each request; all fields are cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<Config>,
    /// Round-robin selector over the configured targets
    pub selector: Arc<TargetSelector>,
    /// Fixed route table
    pub routes: Arc<RouteTable>,
    /// Upstream request dispatcher
    pub forwarder: Forwarder,
}

impl AppState {
    /// Build state from configuration using the default route table.
    pub fn new(config: Config) -> Self {
        let forwarder = Forwarder::new(config.upstream_connect_timeout, config.upstream_timeout);
        Self::with_parts(config, RouteTable::default(), forwarder)
    }

    /// Build state from explicit parts.
    pub fn with_parts(config: Config, routes: RouteTable, forwarder: Forwarder) -> Self {
        let registry = TargetRegistry::from_urls(&config.target_urls);
        info!(
            configured = registry.len(),
            valid = registry.valid_count(),
            fallback = %registry.fallback(),
            "Backend targets loaded"
        );

        Self {
            config: Arc::new(config),
            selector: Arc::new(TargetSelector::new(registry)),
            routes: Arc::new(routes),
            forwarder,
        }
    }

    /// Raw target entries in rotation order, for the startup banner.
    pub fn target_list(&self) -> Vec<String> {
        self.selector
            .registry()
            .targets()
            .iter()
            .map(|entry| entry.raw.clone())
            .collect()
    }
}
