//! Google Custom Search JSON API.

use super::{finalize_hits, plain_text, SearchHit, SearchProvider};
use crate::acquisition::http_client::HttpClient;
use crate::config::SEARCH_RESULT_LIMIT;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";

#[derive(Debug, Deserialize)]
struct CseResponse {
    #[serde(default)]
    items: Vec<CseItem>,
}

#[derive(Debug, Deserialize)]
struct CseItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
}

/// Searches a Programmable Search Engine whose site list holds the book sites.
pub struct GoogleSearch {
    http: HttpClient,
    api_key: String,
    cse_id: String,
    endpoint: String,
}

impl GoogleSearch {
    pub fn new(http: HttpClient, api_key: String, cse_id: String) -> Self {
        Self {
            http,
            api_key,
            cse_id,
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
impl SearchProvider for GoogleSearch {
    fn name(&self) -> &'static str {
        "google-cse"
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        let num = SEARCH_RESULT_LIMIT.to_string();
        let params = [
            ("key", self.api_key.as_str()),
            ("cx", self.cse_id.as_str()),
            ("q", query.trim()),
            ("num", num.as_str()),
        ];

        let data: CseResponse = self
            .http
            .get_json(&self.endpoint, &params, Duration::from_secs(15))
            .await
            .context("Google API error")?;

        let hits = data
            .items
            .into_iter()
            .map(|it| SearchHit {
                title: plain_text(&it.title),
                link: it.link,
                snippet: plain_text(&it.snippet),
            })
            .collect();

        Ok(finalize_hits(hits))
    }
}
