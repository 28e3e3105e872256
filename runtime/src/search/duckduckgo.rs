//! DuckDuckGo HTML search, no API key needed.

use super::{finalize_hits, plain_text, trusted_site_query, SearchHit, SearchProvider};
use crate::acquisition::http_client::HttpClient;
use anyhow::{bail, Result};
use async_trait::async_trait;
use scraper::{Html, Selector};
use std::time::Duration;

const DEFAULT_ENDPOINT: &str = "https://html.duckduckgo.com/html/";

/// Raw results read from one page before deduplication.
const MAX_RAW_RESULTS: usize = 10;

pub struct DuckDuckGoSearch {
    http: HttpClient,
    endpoint: String,
}

impl DuckDuckGoSearch {
    pub fn new(http: HttpClient) -> Self {
        Self {
            http,
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }

    /// Point at another endpoint (tests use a mock server).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGoSearch {
    fn name(&self) -> &'static str {
        "duckduckgo"
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        let full_query = trusted_site_query(query);
        let resp = self
            .http
            .post_form(
                &self.endpoint,
                &[("q".to_string(), full_query)],
                Duration::from_secs(10),
            )
            .await?;

        if resp.status != 200 {
            bail!("DuckDuckGo returned HTTP {}", resp.status);
        }

        let hits = parse_results(&resp.body);
        tracing::debug!(count = hits.len(), "duckduckgo results parsed");
        Ok(finalize_hits(hits))
    }
}

/// Extract hits from a DuckDuckGo HTML results page, skipping ads.
pub fn parse_results(html: &str) -> Vec<SearchHit> {
    let document = Html::parse_document(html);
    let block_sel = Selector::parse("div.result").expect("result selector is valid");
    let link_sel = Selector::parse("a.result__a").expect("link selector is valid");
    let snippet_sel = Selector::parse(".result__snippet").expect("snippet selector is valid");

    let mut hits = Vec::new();
    for block in document.select(&block_sel) {
        if block.value().classes().any(|c| c == "result--ad") {
            continue;
        }
        let Some(anchor) = block.select(&link_sel).next() else {
            continue;
        };
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let Some(link) = decode_result_link(href) else {
            continue;
        };
        let title = plain_text(&anchor.inner_html());
        let snippet = block
            .select(&snippet_sel)
            .next()
            .map(|s| plain_text(&s.inner_html()))
            .unwrap_or_default();

        hits.push(SearchHit {
            title,
            link,
            snippet,
        });
        if hits.len() >= MAX_RAW_RESULTS {
            break;
        }
    }
    hits
}

/// Unwrap `//duckduckgo.com/l/?uddg=<encoded>` redirect links.
pub fn decode_result_link(href: &str) -> Option<String> {
    let absolute = if href.starts_with("//") {
        format!("https:{href}")
    } else {
        href.to_string()
    };
    let parsed = url::Url::parse(&absolute).ok()?;

    let is_redirect = parsed
        .host_str()
        .is_some_and(|h| h.ends_with("duckduckgo.com"))
        && parsed.path().starts_with("/l/");
    if is_redirect {
        return parsed
            .query_pairs()
            .find(|(k, _)| k == "uddg")
            .map(|(_, v)| v.into_owned());
    }

    matches!(parsed.scheme(), "http" | "https").then_some(absolute)
}
