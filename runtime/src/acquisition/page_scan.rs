//! Candidate extraction from raw page HTML, no browser involved.
//!
//! Passes run in a fixed order and their results are concatenated, so the
//! caller validates the most explicit links (plain anchors) before the
//! guesses (URLs fished out of scripts).
//!
//! Entry points are synchronous: `scraper::Html` is `!Send`, so async callers
//! must finish scanning before their next `.await`.

use crate::acquisition::candidates::{
    dedup_preserving_order, is_download_endpoint, is_file_host_link, resolve_url,
};
use crate::acquisition::js_analyzer;
use scraper::{Html, Selector};
use std::sync::OnceLock;

/// Attributes some templates use to stash the real link on a button.
const DATA_LINK_ATTRS: &[&str] = &["data-href", "data-url", "data-download", "data-link"];

struct Selectors {
    anchors: Selector,
    with_attrs: Selector,
    onclick: Selector,
    meta_refresh: Selector,
    scripts: Selector,
    embeds: Selector,
}

fn selectors() -> &'static Selectors {
    static SELECTORS: OnceLock<Selectors> = OnceLock::new();
    SELECTORS.get_or_init(|| Selectors {
        anchors: Selector::parse("a[href]").expect("anchor selector is valid"),
        with_attrs: Selector::parse("[data-href], [data-url], [data-download], [data-link]")
            .expect("data attribute selector is valid"),
        onclick: Selector::parse("[onclick]").expect("onclick selector is valid"),
        meta_refresh: Selector::parse("meta[http-equiv]").expect("meta selector is valid"),
        scripts: Selector::parse("script").expect("script selector is valid"),
        embeds: Selector::parse("iframe[src], embed[src]").expect("embed selector is valid"),
    })
}

/// Scan a page for URLs that probably lead to the PDF.
pub fn scan_html(html: &str, base_url: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let sel = selectors();
    let mut candidates = Vec::new();

    // Plain anchors to files or file hosts, plus intermediate download endpoints.
    for a in document.select(&sel.anchors) {
        let Some(href) = a.value().attr("href") else {
            continue;
        };
        let full = resolve_url(base_url, href);
        if is_file_host_link(&full) || is_download_endpoint(&full) {
            candidates.push(full);
        }
    }

    for el in document.select(&sel.with_attrs) {
        for attr in DATA_LINK_ATTRS {
            if let Some(value) = el.value().attr(attr) {
                candidates.push(resolve_url(base_url, value));
            }
        }
    }

    for el in document.select(&sel.onclick) {
        if let Some(js) = el.value().attr("onclick") {
            candidates.extend(js_analyzer::extract_urls_from_js(js, base_url));
        }
    }

    for meta in document.select(&sel.meta_refresh) {
        let is_refresh = meta
            .value()
            .attr("http-equiv")
            .is_some_and(|v| v.eq_ignore_ascii_case("refresh"));
        if !is_refresh {
            continue;
        }
        if let Some(target) = meta.value().attr("content").and_then(meta_refresh_target) {
            candidates.push(resolve_url(base_url, &target));
        }
    }

    for script in document.select(&sel.scripts) {
        let body: String = script.text().collect();
        if body.trim().is_empty() {
            continue;
        }
        candidates.extend(js_analyzer::extract_urls_from_js(&body, base_url));
    }

    for el in document.select(&sel.embeds) {
        if let Some(src) = el.value().attr("src") {
            if src.to_lowercase().contains(".pdf") {
                candidates.push(resolve_url(base_url, src));
            }
        }
    }

    dedup_preserving_order(candidates)
}

/// Parse the target of `<meta http-equiv="refresh" content="5; url=/file">`.
fn meta_refresh_target(content: &str) -> Option<String> {
    let (_, rest) = content.split_once(';')?;
    let rest = rest.trim();
    let (key, value) = rest.split_once('=')?;
    if !key.trim().eq_ignore_ascii_case("url") {
        return None;
    }
    let target = value.trim().trim_matches(|c| c == '"' || c == '\'' || c == ' ');
    (!target.is_empty()).then(|| target.to_string())
}
