//! Route classification and path rewriting.
//!
//! The route table is fixed at startup. Every inbound request is assigned
//! one [`RouteClass`]; the two proxied classes each have their own rewrite:
//!
//! | Class | Matches | Forwarded path |
//! |---|---|---|
//! | `PrefixProxy` | `/c2`, `/c2/...` | prefix stripped |
//! | `DirectProxy` | first segment is a known endpoint, any case | lower-cased |
//! | `Root` | `GET /`, `HEAD /` | not forwarded |
//! | `CatchAll` | anything else | not forwarded |
//!
//! The query string is carried over untouched in both rewrites.

use axum::http::Method;

/// Mount point for the prefix-stripping route.
pub const PROXY_PREFIX: &str = "/c2";

/// Endpoint names forwarded with their path lower-cased.
pub const DIRECT_ENDPOINTS: [&str; 7] = [
    "uploadexe",
    "uploaddll",
    "uploadpayload",
    "uploadloader",
    "getexe",
    "getdll",
    "getpayload",
];

/// Which route an inbound request matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteClass {
    PrefixProxy,
    DirectProxy,
    Root,
    CatchAll,
}

impl RouteClass {
    /// Stable label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteClass::PrefixProxy => "prefix_proxy",
            RouteClass::DirectProxy => "direct_proxy",
            RouteClass::Root => "root",
            RouteClass::CatchAll => "catch_all",
        }
    }

    /// Whether requests of this class are sent to a backend.
    pub fn is_proxied(&self) -> bool {
        matches!(self, RouteClass::PrefixProxy | RouteClass::DirectProxy)
    }
}

impl std::fmt::Display for RouteClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed route table built once at startup.
#[derive(Debug, Clone)]
pub struct RouteTable {
    prefix: String,
    direct_endpoints: Vec<String>,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new(PROXY_PREFIX, &DIRECT_ENDPOINTS)
    }
}

impl RouteTable {
    /// Build a table from a mount prefix and a set of direct endpoint names.
    ///
    /// The prefix is normalized to start with `/` and have no trailing `/`.
    /// Endpoint names are stored lower-cased.
    pub fn new(prefix: &str, direct_endpoints: &[&str]) -> Self {
        let trimmed = prefix.trim_matches('/');
        Self {
            prefix: format!("/{trimmed}"),
            direct_endpoints: direct_endpoints
                .iter()
                .map(|name| name.trim_matches('/').to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn direct_endpoints(&self) -> &[String] {
        &self.direct_endpoints
    }

    /// Assign a route class to a request.
    ///
    /// Specific routes are tried first; `CatchAll` is the result only when
    /// nothing else matched.
    pub fn classify(&self, method: &Method, path: &str) -> RouteClass {
        if self.matches_prefix(path) {
            RouteClass::PrefixProxy
        } else if self.matches_direct(path) {
            RouteClass::DirectProxy
        } else if path == "/" && (method == Method::GET || method == Method::HEAD) {
            RouteClass::Root
        } else {
            RouteClass::CatchAll
        }
    }

    /// Produce the outbound path-and-query for a proxied class.
    ///
    /// Returns `None` for classes that are not forwarded. The result always
    /// starts with `/`.
    pub fn rewrite(&self, class: RouteClass, path: &str, query: Option<&str>) -> Option<String> {
        let path = match class {
            RouteClass::PrefixProxy => self.strip_prefix(path),
            RouteClass::DirectProxy => path.to_ascii_lowercase(),
            RouteClass::Root | RouteClass::CatchAll => return None,
        };

        Some(match query {
            Some(q) => format!("{path}?{q}"),
            None => path,
        })
    }

    fn matches_prefix(&self, path: &str) -> bool {
        match path.strip_prefix(self.prefix.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }

    fn matches_direct(&self, path: &str) -> bool {
        let Some(rest) = path.strip_prefix('/') else {
            return false;
        };
        let segment = rest.split('/').next().unwrap_or_default();

        !segment.is_empty()
            && self
                .direct_endpoints
                .iter()
                .any(|name| name.eq_ignore_ascii_case(segment))
    }

    fn strip_prefix(&self, path: &str) -> String {
        match path.strip_prefix(self.prefix.as_str()) {
            Some("") | None => "/".to_string(),
            Some(rest) => rest.to_string(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn table() -> RouteTable {
        RouteTable::default()
    }

    #[test]
    fn test_prefix_classification() {
        let t = table();

        assert_eq!(t.classify(&Method::GET, "/c2"), RouteClass::PrefixProxy);
        assert_eq!(t.classify(&Method::POST, "/c2/"), RouteClass::PrefixProxy);
        assert_eq!(
            t.classify(&Method::PUT, "/c2/beacon/42"),
            RouteClass::PrefixProxy
        );
    }

    #[test]
    fn test_prefix_requires_segment_boundary() {
        let t = table();

        assert_eq!(t.classify(&Method::GET, "/c2x"), RouteClass::CatchAll);
        assert_eq!(t.classify(&Method::GET, "/c22/a"), RouteClass::CatchAll);
    }

    #[test]
    fn test_prefix_is_case_sensitive() {
        assert_eq!(table().classify(&Method::GET, "/C2/a"), RouteClass::CatchAll);
    }

    #[test]
    fn test_prefix_rewrite_strips_mount() {
        let t = table();

        assert_eq!(
            t.rewrite(RouteClass::PrefixProxy, "/c2/tasks/7", None).unwrap(),
            "/tasks/7"
        );
        assert_eq!(
            t.rewrite(RouteClass::PrefixProxy, "/c2/Tasks", Some("id=A&x=1"))
                .unwrap(),
            "/Tasks?id=A&x=1"
        );
    }

    #[test]
    fn test_prefix_rewrite_bare_mount_is_root() {
        let t = table();

        assert_eq!(t.rewrite(RouteClass::PrefixProxy, "/c2", None).unwrap(), "/");
        assert_eq!(t.rewrite(RouteClass::PrefixProxy, "/c2/", None).unwrap(), "/");
        assert_eq!(
            t.rewrite(RouteClass::PrefixProxy, "/c2", Some("q=1")).unwrap(),
            "/?q=1"
        );
    }

    #[test]
    fn test_direct_endpoints_any_case() {
        let t = table();

        for name in DIRECT_ENDPOINTS {
            let upper = format!("/{}", name.to_ascii_uppercase());
            let mut title = name.to_string();
            title[..1].make_ascii_uppercase();
            let title = format!("/{title}");
            let mixed: String = name
                .chars()
                .enumerate()
                .map(|(i, c)| if i % 2 == 0 { c.to_ascii_uppercase() } else { c })
                .collect();
            let mixed = format!("/{mixed}");

            for path in [format!("/{name}"), upper, title, mixed] {
                assert_eq!(
                    t.classify(&Method::POST, &path),
                    RouteClass::DirectProxy,
                    "{path} should be a direct endpoint"
                );
                assert_eq!(
                    t.rewrite(RouteClass::DirectProxy, &path, None).unwrap(),
                    format!("/{name}")
                );
            }
        }
    }

    #[test]
    fn test_direct_subpath_is_matched_and_lowercased() {
        let t = table();

        assert_eq!(
            t.classify(&Method::GET, "/GetPayload/Stage2.BIN"),
            RouteClass::DirectProxy
        );
        assert_eq!(
            t.rewrite(RouteClass::DirectProxy, "/GetPayload/Stage2.BIN", None)
                .unwrap(),
            "/getpayload/stage2.bin"
        );
    }

    #[test]
    fn test_direct_rewrite_keeps_query_case() {
        let t = table();

        assert_eq!(
            t.rewrite(RouteClass::DirectProxy, "/UPLOADDLL", Some("Name=Lib.DLL"))
                .unwrap(),
            "/uploaddll?Name=Lib.DLL"
        );
    }

    #[test]
    fn test_unknown_endpoints_fall_through() {
        let t = table();

        assert_eq!(t.classify(&Method::GET, "/uploadexe2"), RouteClass::CatchAll);
        assert_eq!(t.classify(&Method::GET, "/upload"), RouteClass::CatchAll);
        assert_eq!(t.classify(&Method::GET, "/nonexistent"), RouteClass::CatchAll);
        assert_eq!(t.classify(&Method::GET, "//getexe"), RouteClass::CatchAll);
    }

    #[test]
    fn test_root_only_for_safe_methods() {
        let t = table();

        assert_eq!(t.classify(&Method::GET, "/"), RouteClass::Root);
        assert_eq!(t.classify(&Method::HEAD, "/"), RouteClass::Root);
        assert_eq!(t.classify(&Method::POST, "/"), RouteClass::CatchAll);
        assert_eq!(t.classify(&Method::DELETE, "/"), RouteClass::CatchAll);
    }

    #[test]
    fn test_non_proxied_classes_have_no_rewrite() {
        let t = table();

        assert!(t.rewrite(RouteClass::Root, "/", None).is_none());
        assert!(t.rewrite(RouteClass::CatchAll, "/x", Some("a=b")).is_none());
    }

    #[test]
    fn test_custom_table_normalizes_prefix() {
        let t = RouteTable::new("api/", &["Ping"]);

        assert_eq!(t.prefix(), "/api");
        assert_eq!(t.direct_endpoints(), ["ping"]);
        assert_eq!(t.classify(&Method::GET, "/api/v1"), RouteClass::PrefixProxy);
        assert_eq!(t.classify(&Method::GET, "/PING"), RouteClass::DirectProxy);
    }
}
