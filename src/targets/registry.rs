//! Backend target parsing and the startup target list.
//!
//! The registry is built once from configuration and is read-only
//! afterwards. Each configured entry is validated up front, but invalid
//! entries are kept in place so the rotation order matches the configured
//! order exactly; the selector decides what to do when it lands on one.

use axum::http::uri::{Authority, Scheme, Uri};
use tracing::{info, warn};

use crate::config::DEFAULT_TARGET;
use crate::error::{AppError, AppResult};

/// A validated backend base URL.
///
/// Holds the scheme and authority the request is sent to, plus an optional
/// base path that is prepended to every forwarded path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendTarget {
    scheme: Scheme,
    authority: Authority,
    base_path: String,
}

impl BackendTarget {
    /// Parse and validate a backend base URL.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidTarget` if the value is empty, does not use
    /// the `http` or `https` scheme, has no host, carries credentials
    /// (`user:pass@`), or carries a query string.
    pub fn parse(raw: &str) -> AppResult<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(AppError::InvalidTarget("empty target URL".to_string()));
        }

        let uri: Uri = raw
            .parse()
            .map_err(|e| AppError::InvalidTarget(format!("{raw}: {e}")))?;

        let scheme = match uri.scheme_str().map(str::to_ascii_lowercase).as_deref() {
            Some("http") => Scheme::HTTP,
            Some("https") => Scheme::HTTPS,
            Some(other) => {
                return Err(AppError::InvalidTarget(format!(
                    "{raw}: unsupported scheme '{other}'"
                )));
            }
            None => {
                return Err(AppError::InvalidTarget(format!("{raw}: missing scheme")));
            }
        };

        let authority = uri
            .authority()
            .cloned()
            .ok_or_else(|| AppError::InvalidTarget(format!("{raw}: missing host")))?;

        if authority.host().is_empty() {
            return Err(AppError::InvalidTarget(format!("{raw}: missing host")));
        }

        // The authority doubles as the outbound Host header
        if authority.as_str().contains('@') {
            return Err(AppError::InvalidTarget(format!(
                "{}: credentials are not allowed in a target URL",
                authority.host()
            )));
        }

        if uri.query().is_some() {
            return Err(AppError::InvalidTarget(format!(
                "{raw}: query strings are not allowed in a target URL"
            )));
        }

        Ok(Self {
            scheme,
            authority,
            base_path: uri.path().trim_end_matches('/').to_string(),
        })
    }

    /// The built-in target used when nothing usable is configured.
    pub fn fallback() -> Self {
        Self {
            scheme: Scheme::HTTP,
            authority: Authority::from_static("127.0.0.1:8080"),
            base_path: String::new(),
        }
    }

    /// Host and optional port, as sent in the outbound `Host` header.
    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    /// Host name without the port.
    pub fn host(&self) -> &str {
        self.authority.host()
    }

    pub fn scheme(&self) -> &Scheme {
        &self.scheme
    }

    /// Build the absolute outbound URL for an already rewritten
    /// path-and-query. `path_and_query` must start with `/`.
    pub fn url_for(&self, path_and_query: &str) -> String {
        format!(
            "{}://{}{}{}",
            self.scheme, self.authority, self.base_path, path_and_query
        )
    }
}

impl std::fmt::Display for BackendTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}://{}{}", self.scheme, self.authority, self.base_path)
    }
}

/// One configured backend entry.
#[derive(Debug, Clone)]
pub struct TargetEntry {
    /// The entry exactly as configured (after trimming)
    pub raw: String,
    /// The validated target, or `None` if the entry is malformed
    pub target: Option<BackendTarget>,
}

impl TargetEntry {
    fn new(raw: &str) -> Self {
        let target = match BackendTarget::parse(raw) {
            Ok(target) => Some(target),
            Err(e) => {
                warn!(entry = raw, error = %e, "Configured backend target is invalid");
                None
            }
        };

        Self {
            raw: raw.to_string(),
            target,
        }
    }
}

/// Ordered, non-empty list of backend entries plus the fallback target.
#[derive(Debug, Clone)]
pub struct TargetRegistry {
    entries: Vec<TargetEntry>,
    fallback: BackendTarget,
}

impl TargetRegistry {
    /// Build the registry from configured URLs.
    ///
    /// An empty list is replaced by the single built-in default target.
    pub fn from_urls(urls: &[String]) -> Self {
        if urls.is_empty() {
            info!(target_url = DEFAULT_TARGET, "No TARGET_URLS configured, using default target");
            return Self::single(BackendTarget::fallback());
        }

        Self {
            entries: urls.iter().map(|raw| TargetEntry::new(raw)).collect(),
            fallback: BackendTarget::fallback(),
        }
    }

    /// A registry holding exactly one target; selection never rotates.
    pub fn single(target: BackendTarget) -> Self {
        Self {
            entries: vec![TargetEntry {
                raw: target.to_string(),
                target: Some(target),
            }],
            fallback: BackendTarget::fallback(),
        }
    }

    /// All configured entries in rotation order.
    pub fn targets(&self) -> &[TargetEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn fallback(&self) -> &BackendTarget {
        &self.fallback
    }

    /// Number of entries that passed validation.
    pub fn valid_count(&self) -> usize {
        self.entries.iter().filter(|e| e.target.is_some()).count()
    }
}
