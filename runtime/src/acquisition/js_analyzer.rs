//! Regex scanning of JavaScript and raw page text for download URLs.
//!
//! Many book sites hide the real file behind a redirect set up in an inline
//! script or an `onclick` handler. This is a best-effort layer: it never
//! executes anything, it only pattern-matches string literals.

use crate::acquisition::candidates::{dedup_preserving_order, resolve_url};
use regex::Regex;
use std::sync::OnceLock;

/// Literal-assignment patterns whose first capture group is a URL.
const JS_REDIRECT_PATTERNS: &[&str] = &[
    r#"(?i)window\.location(?:\.href)?\s*=\s*['"]([^'"]+)['"]"#,
    r#"(?i)location\.href\s*=\s*['"]([^'"]+)['"]"#,
    r#"(?i)window\.open\s*\(\s*['"]([^'"]+)['"]"#,
    r#"(?i)["'](https?://[^"']+\.pdf[^"']*)["']"#,
];

fn js_redirect_regexes() -> &'static [Regex] {
    static RES: OnceLock<Vec<Regex>> = OnceLock::new();
    RES.get_or_init(|| {
        JS_REDIRECT_PATTERNS
            .iter()
            .map(|p| Regex::new(p).expect("valid js pattern"))
            .collect()
    })
}

/// Bare `https://….pdf` URLs, optionally followed by a query string.
pub fn pdf_like_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)(https?://[^\s"']+\.pdf(\?[^"']*)?)"#).expect("valid pdf pattern")
    })
}

fn known_host_regexes() -> &'static [Regex] {
    static RES: OnceLock<Vec<Regex>> = OnceLock::new();
    RES.get_or_init(|| {
        [
            r#"(?i)(https?://(?:drive\.google\.com|docs\.google\.com)[^\s"'<>]*)"#,
            r#"(?i)(https?://(?:www\.)?dropbox\.com[^\s"'<>]*)"#,
            r#"(?i)(https?://(?:archive\.org|ia801)[^\s"'<>]*)"#,
        ]
        .iter()
        .map(|p| Regex::new(p).expect("valid host pattern"))
        .collect()
    })
}

/// Pull candidate URLs out of a script body or an inline event handler.
///
/// Relative targets are resolved against `base_url`. Order of first
/// appearance is kept and repeats are removed.
pub fn extract_urls_from_js(js: &str, base_url: &str) -> Vec<String> {
    let mut urls = Vec::new();

    for re in js_redirect_regexes() {
        for cap in re.captures_iter(js) {
            if let Some(m) = cap.get(1) {
                urls.push(resolve_url(base_url, m.as_str()));
            }
        }
    }

    urls.extend(find_pdf_like(js));

    dedup_preserving_order(urls)
}

/// Every absolute PDF-looking URL in the text.
pub fn find_pdf_like(text: &str) -> Vec<String> {
    pdf_like_regex()
        .captures_iter(text)
        .filter_map(|cap| cap.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

/// Whole-page sweep for PDF URLs and file-host links (Drive, Dropbox, archive.org).
///
/// This catches links hidden in JSON blobs, comments or attributes the
/// structured scan does not look at.
pub fn sweep_known_hosts(text: &str, base_url: &str) -> Vec<String> {
    let mut urls: Vec<String> = find_pdf_like(text)
        .into_iter()
        .map(|u| resolve_url(base_url, &u))
        .collect();

    for re in known_host_regexes() {
        for cap in re.captures_iter(text) {
            if let Some(m) = cap.get(1) {
                urls.push(resolve_url(base_url, m.as_str()));
            }
        }
    }

    dedup_preserving_order(urls)
}
