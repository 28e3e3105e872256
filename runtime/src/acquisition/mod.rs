//! HTTP-only acquisition: fetching pages and guessing where the PDF is.
//!
//! Everything here works without a browser. The scanners are synchronous
//! and pure; only `http_client` touches the network.

pub mod candidates;
pub mod forms;
pub mod http_client;
pub mod js_analyzer;
pub mod page_scan;
pub mod site_patterns;
