//! Tests for routing and target selection through the public API.
//!
//! Run with: `cargo test --test routing_tests`
#![allow(clippy::unwrap_used, clippy::expect_used)]

mod route_table_tests {
    use axum::http::Method;
    use relay_gateway::proxy::{DIRECT_ENDPOINTS, PROXY_PREFIX};
    use relay_gateway::{RouteClass, RouteTable};

    fn forward(table: &RouteTable, method: Method, path: &str, query: Option<&str>) -> Option<String> {
        let class = table.classify(&method, path);
        table.rewrite(class, path, query)
    }

    #[test]
    fn test_every_direct_endpoint_in_any_case() {
        let table = RouteTable::default();

        for name in DIRECT_ENDPOINTS {
            let upper = format!("/{}", name.to_ascii_uppercase());
            assert_eq!(
                forward(&table, Method::POST, &upper, None),
                Some(format!("/{name}"))
            );
        }
    }

    #[test]
    fn test_prefix_route_keeps_rest_verbatim() {
        let table = RouteTable::default();

        assert_eq!(
            forward(&table, Method::GET, "/c2/Tasks/Next", Some("Agent=7")),
            Some("/Tasks/Next?Agent=7".to_string())
        );
        assert_eq!(table.prefix(), PROXY_PREFIX);
    }

    #[test]
    fn test_prefix_wins_over_direct_endpoint() {
        let table = RouteTable::default();

        assert_eq!(
            table.classify(&Method::GET, "/c2/UploadExe"),
            RouteClass::PrefixProxy
        );
        assert_eq!(
            forward(&table, Method::GET, "/c2/UploadExe", None),
            Some("/UploadExe".to_string())
        );
    }

    #[test]
    fn test_local_classes_not_forwarded() {
        let table = RouteTable::default();

        for (method, path) in [
            (Method::GET, "/"),
            (Method::POST, "/"),
            (Method::GET, "/favicon.ico"),
            (Method::DELETE, "/c2x/y"),
        ] {
            assert_eq!(forward(&table, method, path, None), None, "{path}");
        }
    }

    #[test]
    fn test_custom_table() {
        let table = RouteTable::new("/relay/", &["Beacon"]);

        assert_eq!(table.prefix(), "/relay");
        assert_eq!(
            forward(&table, Method::GET, "/relay/a", None),
            Some("/a".to_string())
        );
        assert_eq!(
            forward(&table, Method::GET, "/BEACON", None),
            Some("/beacon".to_string())
        );
        assert_eq!(table.classify(&Method::GET, "/c2/a"), RouteClass::CatchAll);
    }
}

mod target_tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use relay_gateway::{BackendTarget, Config, TargetRegistry, TargetSelector};

    fn selector(urls: &[&str]) -> TargetSelector {
        let urls: Vec<String> = urls.iter().map(|s| s.to_string()).collect();
        TargetSelector::new(TargetRegistry::from_urls(&urls))
    }

    #[test]
    fn test_rotation_from_env_style_list() {
        let urls = Config::parse_target_urls(Some(" http://a:1 , http://b:2,http://c:3 "));
        let selector = TargetSelector::new(TargetRegistry::from_urls(&urls));

        let hosts: Vec<String> = (0..6).map(|_| selector.select().host().to_string()).collect();
        assert_eq!(hosts, ["a", "b", "c", "a", "b", "c"]);
    }

    #[test]
    fn test_empty_list_uses_default_target() {
        let selector = selector(&[]);

        for _ in 0..3 {
            assert_eq!(selector.select(), &BackendTarget::fallback());
        }
    }

    #[test]
    fn test_blank_entry_falls_back_in_place() {
        let selector = selector(&["http://a:1", "", "http://c:3"]);

        assert_eq!(selector.select().host(), "a");
        assert_eq!(selector.select(), &BackendTarget::fallback());
        assert_eq!(selector.select().host(), "c");
        assert_eq!(selector.select().host(), "a");
    }

    #[test]
    fn test_target_urls_keep_base_path() {
        let target = BackendTarget::parse("https://backend.example.net/api/").unwrap();

        assert_eq!(
            target.url_for("/uploadexe?x=1"),
            "https://backend.example.net/api/uploadexe?x=1"
        );
        assert_eq!(target.authority().as_str(), "backend.example.net");
    }

    #[test]
    fn test_rejected_target_urls() {
        for raw in [
            "", "   ", "not a url", "ftp://host", "/relative", "http://h:1/?q=1",
            "http://u:p@h:1",
        ] {
            assert!(BackendTarget::parse(raw).is_err(), "{raw:?}");
        }
    }

    #[test]
    fn test_concurrent_selection_is_fair() {
        let selector = Arc::new(selector(&["http://a:1", "http://b:2", "http://c:3"]));

        let handles: Vec<_> = (0..6)
            .map(|_| {
                let selector = Arc::clone(&selector);
                std::thread::spawn(move || {
                    (0..300)
                        .map(|_| selector.select().host().to_string())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut counts: HashMap<String, usize> = HashMap::new();
        for handle in handles {
            for host in handle.join().unwrap() {
                *counts.entry(host).or_default() += 1;
            }
        }

        assert_eq!(counts.len(), 3);
        assert!(counts.values().all(|&n| n == 600), "{counts:?}");
    }
}
