//! Application configuration loaded from environment variables.
//!
//! # Configuration Hierarchy
//!
//! All configuration is loaded from environment variables with defaults
//! suitable for a single-host deployment. A `.env` file in the working
//! directory is read first when present.
//!
//! # Backend Targets
//!
//! - `TARGET_URLS`: Comma-separated list of backend base URLs. When unset or
//!   empty the gateway forwards everything to [`DEFAULT_TARGET`].
//!
//! # Upstream Tuning
//!
//! - `UPSTREAM_CONNECT_TIMEOUT_SECS`: TCP connect timeout (default: 10)
//! - `UPSTREAM_TIMEOUT_SECS`: Deadline for a whole upstream exchange
//!   (default: 30, `0` disables the deadline)
//! - `MAX_REQUEST_BODY_SIZE`: Inbound body ceiling in bytes (default: 10MB)

use std::env;
use std::time::Duration;

use crate::error::{AppError, AppResult};

/// Backend used when no usable target is configured.
pub const DEFAULT_TARGET: &str = "http://127.0.0.1:8080";

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable single-line output
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" | "" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{other}' (expected 'text' or 'json')")),
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Text => f.write_str("text"),
            LogFormat::Json => f.write_str("json"),
        }
    }
}

/// Application configuration loaded from environment variables.
///
/// # Example
///
/// ```rust,ignore
/// let config = Config::from_env()?;
/// println!("Gateway will listen on {}", config.server_addr());
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Server host address (default: "0.0.0.0")
    pub host: String,

    /// Server port (default: 10000)
    pub port: u16,

    // =========================================================================
    // Backend Configuration
    // =========================================================================
    /// Raw backend entries in configured order.
    ///
    /// Entries are trimmed but otherwise kept verbatim, including malformed
    /// ones, so that rotation positions line up with the configured list.
    /// Empty means "use the built-in default target".
    pub target_urls: Vec<String>,

    /// Timeout for establishing a TCP connection to a backend
    pub upstream_connect_timeout: Duration,

    /// Deadline for a complete upstream exchange (request sent, response
    /// head received). `None` leaves only the connect timeout in force.
    pub upstream_timeout: Option<Duration>,

    // =========================================================================
    // Request Limits
    // =========================================================================
    /// Maximum inbound request body size in bytes (default: 10MB).
    /// Bodies are buffered in full before forwarding.
    pub max_request_body_size: usize,

    // =========================================================================
    // Observability Configuration
    // =========================================================================
    /// Log level (e.g., "info", "debug", "trace")
    pub log_level: String,

    /// Log output format
    pub log_format: LogFormat,

    /// Port for Prometheus metrics endpoint (default: 0 = disabled)
    pub metrics_port: u16,
}

impl Config {
    /// Load configuration from environment variables with defaults.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if a value cannot be parsed
    /// (e.g., non-numeric PORT) or fails validation.
    pub fn from_env() -> AppResult<Self> {
        // Load an .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let upstream_timeout_secs: u64 = Self::parse_env("UPSTREAM_TIMEOUT_SECS", 30)?;

        let config = Self {
            // Server
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: Self::parse_env("PORT", 10000)?,

            // Backends
            target_urls: Self::parse_target_urls(env::var("TARGET_URLS").ok().as_deref()),
            upstream_connect_timeout: Duration::from_secs(Self::parse_env(
                "UPSTREAM_CONNECT_TIMEOUT_SECS",
                10,
            )?),
            upstream_timeout: (upstream_timeout_secs > 0)
                .then(|| Duration::from_secs(upstream_timeout_secs)),

            // Limits
            max_request_body_size: Self::parse_env("MAX_REQUEST_BODY_SIZE", 10 * 1024 * 1024)?, // 10MB

            // Observability
            log_level: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            log_format: Self::parse_env("LOG_FORMAT", LogFormat::Text)?,
            metrics_port: Self::parse_env("METRICS_PORT", 0)?,
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values for consistency and correctness.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if validation fails.
    fn validate(&self) -> AppResult<()> {
        if self.max_request_body_size == 0 {
            return Err(AppError::ConfigError(
                "MAX_REQUEST_BODY_SIZE must be greater than 0".to_string(),
            ));
        }

        if self.upstream_connect_timeout.is_zero() {
            return Err(AppError::ConfigError(
                "UPSTREAM_CONNECT_TIMEOUT_SECS must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Get the full server address for binding.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if Prometheus metrics export is enabled.
    pub fn metrics_enabled(&self) -> bool {
        self.metrics_port > 0
    }

    /// Get the metrics endpoint address.
    ///
    /// Returns `None` if metrics are disabled (port = 0).
    pub fn metrics_addr(&self) -> Option<std::net::SocketAddr> {
        if self.metrics_enabled() {
            Some(std::net::SocketAddr::from((
                [0, 0, 0, 0],
                self.metrics_port,
            )))
        } else {
            None
        }
    }

    /// Parse an environment variable into the specified type with a default value.
    fn parse_env<T>(name: &str, default: T) -> AppResult<T>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        match env::var(name) {
            Ok(val) => val
                .parse()
                .map_err(|e| AppError::ConfigError(format!("Invalid {name}: {e}"))),
            Err(_) => Ok(default),
        }
    }

    /// Split a comma-separated target list.
    ///
    /// An unset or all-whitespace value yields no entries. Otherwise every
    /// comma-separated item is kept (trimmed), blanks included; validation
    /// happens later in the target registry.
    pub fn parse_target_urls(raw: Option<&str>) -> Vec<String> {
        match raw {
            Some(list) if !list.trim().is_empty() => {
                list.split(',').map(|s| s.trim().to_string()).collect()
            }
            _ => Vec::new(),
        }
    }
}

/// Default configuration for testing and development.
///
/// Production deployments should use `Config::from_env()` instead.
impl Default for Config {
    fn default() -> Self {
        Self {
            // Server
            host: "0.0.0.0".to_string(),
            port: 10000,
            // Backends
            target_urls: Vec::new(),
            upstream_connect_timeout: Duration::from_secs(10),
            upstream_timeout: Some(Duration::from_secs(30)),
            // Limits
            max_request_body_size: 10 * 1024 * 1024, // 10MB
            // Observability
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            metrics_port: 0,
        }
    }
}
