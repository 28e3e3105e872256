//! Async HTTP client wrapping reqwest.
//!
//! Not a browser, just HTTP requests with a desktop user agent. Handles
//! redirects, per-request timeouts, an optional `Referer`, retry on 5xx and
//! backoff on 429 for page fetches.

use crate::acquisition::forms::{DownloadForm, FormMethod};
use anyhow::{Context, Result};
use futures::StreamExt;
use reqwest::header::{HeaderMap, CONTENT_LENGTH, CONTENT_TYPE, REFERER};
use serde::de::DeserializeOwned;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;

/// Desktop Chrome user agent; several book sites refuse anything else.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
                              AppleWebKit/537.36 (KHTML, like Gecko) \
                              Chrome/120.0.0.0 Safari/537.36";

/// Response from an HTTP GET or form submission.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Original requested URL.
    pub url: String,
    /// Final URL after redirects.
    pub final_url: String,
    /// HTTP status code.
    pub status: u16,
    /// Response headers (selected subset).
    pub headers: Vec<(String, String)>,
    /// Response body as text, invalid UTF-8 replaced.
    pub body: String,
}

impl HttpResponse {
    /// Look up a captured header by lower-case name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Result of probing a candidate URL without downloading it.
#[derive(Debug, Clone)]
pub struct ProbeResponse {
    /// Final URL after redirects.
    pub final_url: String,
    /// HTTP status code.
    pub status: u16,
    /// Lower-cased Content-Type header.
    pub content_type: Option<String>,
    /// Declared Content-Length, when present and numeric.
    pub content_length: Option<u64>,
}

/// What happened when a body was streamed to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamOutcome {
    /// Body written in full.
    Written {
        bytes: u64,
        content_type: Option<String>,
    },
    /// Server answered with something other than 200; nothing written.
    BadStatus(u16),
    /// Body grew past the limit; the partial file is left for the caller to remove.
    TooLarge { limit: u64 },
}

/// HTTP client for page fetches, probes and downloads.
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    /// HTTP/1.1-only fallback client for sites that reject HTTP/2.
    h1_client: reqwest::Client,
}

impl HttpClient {
    /// Create a new HTTP client with the desktop user agent.
    pub fn new(timeout_ms: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .redirect(reqwest::redirect::Policy::limited(10))
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_default();

        let h1_client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .redirect(reqwest::redirect::Policy::limited(10))
            .user_agent(USER_AGENT)
            .http1_only()
            .build()
            .unwrap_or_default();

        Self { client, h1_client }
    }

    /// Fetch a page as text, with retry on 5xx and backoff on 429.
    ///
    /// Falls back to HTTP/1.1 on protocol errors (some CDNs reject HTTP/2).
    pub async fn fetch_text(
        &self,
        url: &str,
        referer: Option<&str>,
        timeout: Duration,
    ) -> Result<HttpResponse> {
        match self.get_inner(&self.client, url, referer, timeout).await {
            Ok(resp) => Ok(resp),
            Err(e) => {
                let err_str = format!("{e:#}");
                if err_str.contains("http2")
                    || err_str.contains("protocol")
                    || err_str.contains("connection closed")
                {
                    self.get_inner(&self.h1_client, url, referer, timeout).await
                } else {
                    Err(e)
                }
            }
        }
    }

    async fn get_inner(
        &self,
        client: &reqwest::Client,
        url: &str,
        referer: Option<&str>,
        timeout: Duration,
    ) -> Result<HttpResponse> {
        let mut retries = 0u32;
        let max_retries = 2;

        loop {
            let mut builder = client.get(url).timeout(timeout);
            if let Some(r) = referer {
                builder = builder.header(REFERER, r);
            }

            match builder.send().await {
                Ok(r) => {
                    let status = r.status().as_u16();

                    if status >= 500 && retries < max_retries {
                        retries += 1;
                        let delay = Duration::from_millis(500 * 2u64.pow(retries - 1));
                        tokio::time::sleep(delay).await;
                        continue;
                    }

                    if status == 429 && retries < max_retries {
                        retries += 1;
                        let retry_after = r
                            .headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|s| s.parse::<u64>().ok())
                            .unwrap_or(2);
                        tokio::time::sleep(Duration::from_secs(retry_after.min(10))).await;
                        continue;
                    }

                    return Ok(into_text_response(url, r).await);
                }
                Err(e) => {
                    if retries < max_retries && !e.is_timeout() {
                        retries += 1;
                        let delay = Duration::from_millis(500 * 2u64.pow(retries - 1));
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Err(anyhow::Error::new(e).context(format!("GET {url} failed")));
                }
            }
        }
    }

    /// Probe a URL for its content type and declared length.
    ///
    /// HEAD first; many file hosts reject HEAD, so a failed or 4xx/5xx HEAD
    /// is retried as a GET whose body is never read.
    pub async fn head_check(
        &self,
        url: &str,
        referer: Option<&str>,
        timeout: Duration,
    ) -> Result<ProbeResponse> {
        let mut head = self.client.head(url).timeout(timeout);
        if let Some(r) = referer {
            head = head.header(REFERER, r);
        }

        match head.send().await {
            Ok(resp) if resp.status().as_u16() < 400 => return Ok(probe_from(&resp)),
            Ok(resp) => {
                tracing::debug!(url, status = resp.status().as_u16(), "HEAD rejected, retrying as GET");
            }
            Err(e) => {
                tracing::debug!(url, error = %e, "HEAD failed, retrying as GET");
            }
        }

        self.get_headers(url, referer, timeout).await
    }

    /// GET a URL, following redirects, and report where it ended up.
    ///
    /// Only the status line and headers are read.
    pub async fn get_headers(
        &self,
        url: &str,
        referer: Option<&str>,
        timeout: Duration,
    ) -> Result<ProbeResponse> {
        let mut get = self.client.get(url).timeout(timeout);
        if let Some(r) = referer {
            get = get.header(REFERER, r);
        }
        let resp = get
            .send()
            .await
            .with_context(|| format!("probe of {url} failed"))?;
        Ok(probe_from(&resp))
    }

    /// Replay a discovered form: POST url-encoded, or GET with query params.
    pub async fn submit_form(
        &self,
        form: &DownloadForm,
        referer: Option<&str>,
        timeout: Duration,
    ) -> Result<HttpResponse> {
        let mut builder = match form.method {
            FormMethod::Post => self.client.post(&form.action_url).form(&form.fields),
            FormMethod::Get => self.client.get(&form.action_url).query(&form.fields),
        }
        .timeout(timeout);

        if let Some(r) = referer {
            builder = builder.header(REFERER, r);
        }

        let r = builder
            .send()
            .await
            .with_context(|| format!("form submit to {} failed", form.action_url))?;
        Ok(into_text_response(&form.action_url, r).await)
    }

    /// POST form data (url-encoded) and return the text response.
    pub async fn post_form(
        &self,
        url: &str,
        form_fields: &[(String, String)],
        timeout: Duration,
    ) -> Result<HttpResponse> {
        let r = self
            .client
            .post(url)
            .timeout(timeout)
            .form(form_fields)
            .send()
            .await
            .with_context(|| format!("POST {url} failed"))?;
        Ok(into_text_response(url, r).await)
    }

    /// GET a JSON document. Non-2xx answers become errors carrying a body prefix.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
        timeout: Duration,
    ) -> Result<T> {
        let r = self
            .client
            .get(url)
            .query(query)
            .timeout(timeout)
            .send()
            .await
            .with_context(|| format!("GET {url} failed"))?;

        let status = r.status();
        if !status.is_success() {
            let text = r.text().await.unwrap_or_default();
            let prefix: String = text.chars().take(200).collect();
            anyhow::bail!("HTTP {} from {url}: {prefix}", status.as_u16());
        }

        r.json::<T>()
            .await
            .with_context(|| format!("invalid JSON from {url}"))
    }

    /// Stream a response body to `path`, stopping once it exceeds `max_bytes`.
    pub async fn stream_to_file(
        &self,
        url: &str,
        referer: Option<&str>,
        path: &Path,
        max_bytes: u64,
        timeout: Duration,
    ) -> Result<StreamOutcome> {
        let mut builder = self.client.get(url).timeout(timeout);
        if let Some(r) = referer {
            builder = builder.header(REFERER, r);
        }
        let resp = builder
            .send()
            .await
            .with_context(|| format!("download of {url} failed"))?;

        let status = resp.status().as_u16();
        if status != 200 {
            return Ok(StreamOutcome::BadStatus(status));
        }
        let content_type = header_string(resp.headers(), CONTENT_TYPE.as_str());

        let mut file = tokio::fs::File::create(path)
            .await
            .with_context(|| format!("failed to create {}", path.display()))?;
        let mut written = 0u64;
        let mut body = resp.bytes_stream();

        while let Some(chunk) = body.next().await {
            let chunk = chunk.with_context(|| format!("download of {url} interrupted"))?;
            written += chunk.len() as u64;
            if written > max_bytes {
                return Ok(StreamOutcome::TooLarge { limit: max_bytes });
            }
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        Ok(StreamOutcome::Written {
            bytes: written,
            content_type,
        })
    }
}

async fn into_text_response(requested: &str, r: reqwest::Response) -> HttpResponse {
    let status = r.status().as_u16();
    let final_url = r.url().to_string();
    let headers: Vec<(String, String)> = r
        .headers()
        .iter()
        .filter(|(k, _)| {
            matches!(
                k.as_str(),
                "content-type" | "content-length" | "content-disposition" | "refresh" | "location"
            )
        })
        .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_string()))
        .collect();

    let body = match r.bytes().await {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(_) => String::new(),
    };

    HttpResponse {
        url: requested.to_string(),
        final_url,
        status,
        headers,
        body,
    }
}

fn probe_from(resp: &reqwest::Response) -> ProbeResponse {
    ProbeResponse {
        final_url: resp.url().to_string(),
        status: resp.status().as_u16(),
        content_type: header_string(resp.headers(), CONTENT_TYPE.as_str()),
        content_length: header_string(resp.headers(), CONTENT_LENGTH.as_str())
            .and_then(|v| v.trim().parse::<u64>().ok()),
    }
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_client_creation() {
        let client = HttpClient::new(10000);
        let _ = client;
    }

    #[test]
    fn test_response_header_lookup() {
        let resp = HttpResponse {
            url: "https://example.com".to_string(),
            final_url: "https://example.com/".to_string(),
            status: 200,
            headers: vec![("content-type".to_string(), "text/html".to_string())],
            body: String::new(),
        };
        assert_eq!(resp.header("content-type"), Some("text/html"));
        assert_eq!(resp.header("refresh"), None);
    }
}
