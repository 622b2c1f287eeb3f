//! # Relay Gateway
//!
//! A small reverse-proxy gateway built on Axum that fans requests out to a
//! pool of backends, featuring:
//!
//! - **Round-robin targets**: lock-free rotation with a built-in fallback
//! - **Path rewriting**: `/c2/*` prefix stripping and case-insensitive
//!   direct endpoints normalized to lower case
//! - **Containment**: a dead backend costs one request a `503`, nothing more
//! - **Hardened responses**: protective headers, permissive CORS, decoy root
//! - **Observability**: request IDs, structured logging, Prometheus metrics
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Axum HTTP Server                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Middleware (Security → CORS → Request ID → Trace → Limit)  │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Gateway handler (classify: /c2, direct, root, 404)         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  RouteTable (rewrite)        TargetSelector (round-robin)   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Forwarder (hyper client, HTTP/HTTPS)                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Backend targets                                            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use relay_gateway::{AppState, Config, build_router};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let listener = tokio::net::TcpListener::bind(config.server_addr()).await?;
//!
//!     let app = build_router(AppState::new(config));
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! ```bash
//! TARGET_URLS="http://10.0.0.5:8080,https://backup.example.net" PORT=10000 cargo run
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod proxy;
pub mod routes;
pub mod state;
pub mod targets;
pub mod utils;

// Re-exports for convenience
pub use config::{Config, LogFormat};
pub use error::{AppError, AppResult};
pub use proxy::{Forwarder, RouteClass, RouteTable};
pub use routes::build_router;
pub use state::AppState;
pub use targets::{BackendTarget, TargetRegistry, TargetSelector};
