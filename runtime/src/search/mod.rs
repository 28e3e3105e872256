//! Book search restricted to a fixed list of trusted sites.
//!
//! Two backends sit behind [`SearchProvider`]: the Google Custom Search JSON
//! API when credentials are configured, otherwise DuckDuckGo's HTML endpoint.

pub mod duckduckgo;
pub mod google;

use crate::acquisition::http_client::HttpClient;
use crate::acquisition::site_patterns::site_patterns;
use crate::config::{BotConfig, SearchBackend, SEARCH_RESULT_LIMIT};
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// One search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub link: String,
    pub snippet: String,
}

/// A search backend.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;
    /// Run a query. At most [`SEARCH_RESULT_LIMIT`] unique hits come back.
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>>;
}

/// Build the provider selected by the configuration.
pub fn provider_for(config: &BotConfig, http: HttpClient) -> Arc<dyn SearchProvider> {
    match &config.search {
        SearchBackend::Google { api_key, cse_id } => Arc::new(google::GoogleSearch::new(
            http,
            api_key.clone(),
            cse_id.clone(),
        )),
        SearchBackend::DuckDuckGo => Arc::new(duckduckgo::DuckDuckGoSearch::new(http)),
    }
}

/// `"<query> filetype:pdf OR site:a OR site:b …"` over the trusted domains.
pub fn trusted_site_query(query: &str) -> String {
    let sites = site_patterns()
        .trusted_domains
        .iter()
        .map(|d| format!("site:{d}"))
        .collect::<Vec<_>>()
        .join(" OR ");
    format!("{} filetype:pdf OR {sites}", query.trim())
}

/// Drop hits without a link, repeats by link, and cap the count.
pub fn finalize_hits(hits: Vec<SearchHit>) -> Vec<SearchHit> {
    let mut seen = HashSet::new();
    hits.into_iter()
        .filter(|h| !h.link.is_empty())
        .filter(|h| seen.insert(h.link.clone()))
        .map(|mut h| {
            if h.title.trim().is_empty() {
                h.title = h.link.clone();
            }
            h
        })
        .take(SEARCH_RESULT_LIMIT)
        .collect()
}

/// Decode HTML entities and strip inline markup (`&amp;`, `<b>…</b>`).
pub fn plain_text(fragment: &str) -> String {
    let parsed = scraper::Html::parse_fragment(fragment);
    let text: String = parsed.root_element().text().collect();
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
