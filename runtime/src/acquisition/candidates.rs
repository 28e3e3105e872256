//! Shared helpers for judging whether a URL or response looks like a PDF.

use std::collections::HashSet;

/// Hosts that serve files directly, no page scraping needed.
const DIRECT_HOST_MARKERS: &[&str] = &["drive.google.com", "docs.google.com", "dropbox.com"];

/// Resolve a potentially relative URL against a base URL.
///
/// Returns the input unchanged when either side cannot be parsed.
pub fn resolve_url(base_url: &str, link: &str) -> String {
    let link = link.trim();
    if link.is_empty() {
        return base_url.to_string();
    }
    if link.starts_with("http://") || link.starts_with("https://") {
        return link.to_string();
    }
    if let Ok(base) = url::Url::parse(base_url) {
        if let Ok(resolved) = base.join(link) {
            return resolved.to_string();
        }
    }
    link.to_string()
}

/// Whether the path of a URL ends in `.pdf` (query string ignored).
pub fn has_pdf_extension(url: &str) -> bool {
    let lower = url.to_lowercase();
    let path = lower.split(['?', '#']).next().unwrap_or("");
    path.ends_with(".pdf")
}

/// Whether a URL can be handed to the downloader without scraping first.
pub fn is_direct_link(url: &str) -> bool {
    let lower = url.to_lowercase();
    has_pdf_extension(&lower)
        || DIRECT_HOST_MARKERS.iter().any(|m| lower.contains(m))
        || lower.contains("archive.org")
}

/// Whether an anchor target points at a file host or a PDF.
pub fn is_file_host_link(url: &str) -> bool {
    let lower = url.to_lowercase();
    has_pdf_extension(&lower)
        || DIRECT_HOST_MARKERS.iter().any(|m| lower.contains(m))
        || lower.contains("archive.org/download")
        || lower.contains("archive.org/stream")
}

/// Whether an anchor looks like an intermediate download endpoint.
pub fn is_download_endpoint(url: &str) -> bool {
    let lower = url.to_lowercase();
    lower.contains("download")
        && (lower.contains("/file") || lower.ends_with("/download") || lower.contains("dl="))
}

/// Whether a Content-Type header value names a PDF or a generic binary.
pub fn is_pdf_content_type(content_type: &str) -> bool {
    let lower = content_type.to_lowercase();
    lower.contains("pdf") || lower.contains("octet-stream")
}

/// Accept a probed candidate: PDF-like type, and size unknown or at least `min_size`.
pub fn is_acceptable(content_type: Option<&str>, content_length: Option<u64>, min_size: u64) -> bool {
    match content_type {
        Some(ct) if is_pdf_content_type(ct) => content_length.map_or(true, |len| len >= min_size),
        _ => false,
    }
}

/// Drop empty entries and repeats, keeping first-seen order.
pub fn dedup_preserving_order(urls: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    urls.into_iter()
        .filter(|u| !u.is_empty() && seen.insert(u.clone()))
        .collect()
}
