//! Fuzz testing for route classification, path rewriting and target parsing.
//!
//! # Running the Fuzz Tests
//!
//! ```bash
//! # Install cargo-fuzz (requires nightly)
//! cargo +nightly install cargo-fuzz
//!
//! # Run the routing fuzz target
//! cargo +nightly fuzz run fuzz_routing
//!
//! # Run with a time limit (e.g., 60 seconds)
//! cargo +nightly fuzz run fuzz_routing -- -max_total_time=60
//! ```
//!
//! # What This Tests
//!
//! - `RouteTable::classify` and `RouteTable::rewrite` never panic, and a
//!   rewritten path always starts with `/`
//! - `BackendTarget::parse` never panics, and an accepted target always
//!   produces a URL with an `http` or `https` scheme
//! - `Config::parse_target_urls` yields one entry per comma

#![no_main]

use arbitrary::Arbitrary;
use axum::http::Method;
use libfuzzer_sys::fuzz_target;
use relay_gateway::{BackendTarget, Config, RouteTable};

#[derive(Arbitrary, Debug)]
struct RoutingInput<'a> {
    method_index: u8,
    path: &'a str,
    query: Option<&'a str>,
    target: &'a str,
}

const METHODS: [Method; 5] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::HEAD,
    Method::OPTIONS,
];

fuzz_target!(|input: RoutingInput<'_>| {
    let table = RouteTable::default();
    let method = &METHODS[usize::from(input.method_index) % METHODS.len()];

    // Paths reaching the gateway always start with '/'
    let path = format!("/{}", input.path.trim_start_matches('/'));
    let class = table.classify(method, &path);
    if let Some(rewritten) = table.rewrite(class, &path, input.query) {
        assert!(class.is_proxied());
        assert!(rewritten.starts_with('/'));
    }

    if let Ok(target) = BackendTarget::parse(input.target) {
        let url = target.url_for("/");
        assert!(url.starts_with("http://") || url.starts_with("https://"));
    }

    let entries = Config::parse_target_urls(Some(input.target));
    if !input.target.trim().is_empty() {
        assert_eq!(entries.len(), input.target.matches(',').count() + 1);
    }
});
