//! Fuzz target: HTTP request-line parsing and routing.
//!
//! Arbitrary bytes off the socket must never panic the parser, and any
//! accepted request must route to exactly one handler.
//!
//! cargo fuzz run fuzz_http_request

#![no_main]

use battmon::adapters::http_server::{Route, parse_request_line, query_param, route};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    let line = text.split("\r\n").next().unwrap_or("");

    if let Ok(req) = parse_request_line(line) {
        assert!(req.path.starts_with('/'), "accepted path must be absolute");
        assert!(!req.path.contains('?'), "query must be split off the path");
        if let Some(q) = req.query {
            let _ = query_param(q, "state");
        }

        if let Route::Relay(Some(_)) = route(&req) {
            assert_eq!(req.method, "GET");
            assert_eq!(req.path, "/relay");
        }
    }
});
