//! Site knowledge embedded at compile time: trusted book sites and the
//! selectors tried when the browser has to click its way to a file.

use serde::Deserialize;
use std::sync::OnceLock;

/// Raw JSON content of the site patterns, embedded at compile time.
const SITE_PATTERNS_JSON: &str = include_str!("site_patterns.json");

#[derive(Debug, Default, Deserialize)]
pub struct SitePatterns {
    /// Domains the search is restricted to.
    pub trusted_domains: Vec<String>,
    /// CSS selectors for download buttons, most specific first.
    pub click_selectors: Vec<String>,
}

/// Parse and cache the embedded site patterns.
pub fn site_patterns() -> &'static SitePatterns {
    static PATTERNS: OnceLock<SitePatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| serde_json::from_str(SITE_PATTERNS_JSON).unwrap_or_default())
}
