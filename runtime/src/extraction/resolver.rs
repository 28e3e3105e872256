//! Turns a book page URL into a validated PDF URL.
//!
//! The heuristics are independent and tried in sequence; the first candidate
//! that survives a HEAD probe wins. A failing step never aborts the run, it
//! only hands over to the next one.

use crate::acquisition::candidates::{
    dedup_preserving_order, has_pdf_extension, is_acceptable, is_direct_link, is_pdf_content_type,
};
use crate::acquisition::forms;
use crate::acquisition::http_client::HttpClient;
use crate::acquisition::js_analyzer;
use crate::acquisition::page_scan;
use crate::config::ResolverSettings;
use crate::extraction::browser::{BrowserFinding, BrowserStrategy};
use serde::Serialize;
use std::fmt;
use tracing::{debug, info, instrument, warn};

/// Which heuristic produced a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ResolveStage {
    /// The input already pointed at a file or file host.
    Direct,
    /// Found in the fetched page or a submitted form's response.
    PageScan,
    /// Appeared after waiting out a countdown.
    Polling,
    /// The start URL redirects onto a PDF.
    Redirect,
    /// Found by the headless browser.
    Browser,
}

impl fmt::Display for ResolveStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Direct => "direct",
            Self::PageScan => "page-scan",
            Self::Polling => "polling",
            Self::Redirect => "redirect",
            Self::Browser => "browser",
        };
        f.write_str(s)
    }
}

/// A PDF URL with the page to send as `Referer` when downloading it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedLink {
    pub pdf_url: String,
    pub referer: String,
    pub via: ResolveStage,
}

/// Runs the heuristic chain against one start URL.
pub struct PdfResolver {
    http: HttpClient,
    settings: ResolverSettings,
    browser: Option<BrowserStrategy>,
}

impl PdfResolver {
    pub fn new(http: HttpClient, settings: ResolverSettings) -> Self {
        Self {
            http,
            settings,
            browser: None,
        }
    }

    /// Enable the headless-browser step (skipped when the renderer is a no-op).
    pub fn with_browser(mut self, browser: BrowserStrategy) -> Self {
        if browser.is_available() {
            self.browser = Some(browser);
        }
        self
    }

    pub fn has_browser(&self) -> bool {
        self.browser.is_some()
    }

    /// Find a downloadable PDF behind `start_url`, or `None` when every step fails.
    #[instrument(skip(self))]
    pub async fn resolve(&self, start_url: &str) -> Option<ResolvedLink> {
        if is_direct_link(start_url) {
            debug!("start URL is already a direct link");
            return Some(ResolvedLink {
                pdf_url: start_url.to_string(),
                referer: start_url.to_string(),
                via: ResolveStage::Direct,
            });
        }

        if let Some(found) = self.scan_page(start_url).await {
            return Some(found);
        }

        if let Some(found) = self.poll_countdown(start_url).await {
            return Some(found);
        }

        if let Some(found) = self.follow_redirects(start_url).await {
            return Some(found);
        }

        if let Some(found) = self.try_browser(start_url).await {
            return Some(found);
        }

        info!("no PDF link found");
        None
    }

    async fn scan_page(&self, start_url: &str) -> Option<ResolvedLink> {
        let page = match self
            .http
            .fetch_text(start_url, Some(start_url), self.settings.page_timeout)
            .await
        {
            Ok(p) if !p.body.is_empty() => p,
            Ok(p) => {
                debug!(status = p.status, "empty page body");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "page fetch failed");
                return None;
            }
        };

        let mut final_url = page.final_url.clone();
        let mut candidates = page_scan::scan_html(&page.body, &final_url);

        for form in forms::discover_forms(&page.body, &final_url) {
            match self
                .http
                .submit_form(&form, Some(start_url), self.settings.page_timeout)
                .await
            {
                Ok(resp) if !resp.body.is_empty() => {
                    candidates.extend(page_scan::scan_html(&resp.body, &resp.final_url));
                    if is_pdf_content_type(resp.header("content-type").unwrap_or("")) {
                        candidates.push(resp.final_url.clone());
                    }
                    final_url = resp.final_url;
                }
                Ok(_) => {}
                Err(e) => debug!(action = %form.action_url, error = %e, "form submit failed"),
            }
        }

        candidates.extend(js_analyzer::sweep_known_hosts(&page.body, &page.final_url));
        let candidates = dedup_preserving_order(candidates);
        debug!(count = candidates.len(), "page candidates");

        self.first_valid(&candidates, &final_url, ResolveStage::PageScan)
            .await
    }

    async fn poll_countdown(&self, start_url: &str) -> Option<ResolvedLink> {
        let attempts = self.settings.poll_attempts();
        for attempt in 1..=attempts {
            tokio::time::sleep(self.settings.poll_interval).await;
            debug!(attempt, attempts, "refetching page after countdown wait");

            let page = match self
                .http
                .fetch_text(start_url, Some(start_url), self.settings.page_timeout)
                .await
            {
                Ok(p) if !p.body.is_empty() => p,
                _ => continue,
            };

            let mut candidates = page_scan::scan_html(&page.body, &page.final_url);
            candidates.extend(js_analyzer::find_pdf_like(&page.body));
            let candidates = dedup_preserving_order(candidates);

            if let Some(found) = self
                .first_valid(&candidates, &page.final_url, ResolveStage::Polling)
                .await
            {
                return Some(found);
            }
        }
        None
    }

    async fn follow_redirects(&self, start_url: &str) -> Option<ResolvedLink> {
        let probe = self
            .http
            .get_headers(start_url, None, self.settings.probe_timeout)
            .await
            .ok()?;
        if probe.status >= 400 || !has_pdf_extension(&probe.final_url) {
            return None;
        }
        let ct = probe.content_type.as_deref().unwrap_or("");
        is_pdf_content_type(ct).then(|| ResolvedLink {
            pdf_url: probe.final_url,
            referer: start_url.to_string(),
            via: ResolveStage::Redirect,
        })
    }

    async fn try_browser(&self, start_url: &str) -> Option<ResolvedLink> {
        let browser = self.browser.as_ref()?;
        let finding = match browser.discover(start_url).await {
            Ok(Some(f)) => f,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "browser strategy failed");
                return None;
            }
        };

        match finding {
            BrowserFinding::Sniffed { url, page_url } => Some(ResolvedLink {
                pdf_url: url,
                referer: page_url,
                via: ResolveStage::Browser,
            }),
            BrowserFinding::Navigated { url } => Some(ResolvedLink {
                pdf_url: url,
                referer: start_url.to_string(),
                via: ResolveStage::Browser,
            }),
            BrowserFinding::Rendered {
                candidates,
                page_url,
            } => {
                self.first_valid(&candidates, &page_url, ResolveStage::Browser)
                    .await
            }
        }
    }

    /// Probe candidates in order and return the first acceptable one.
    async fn first_valid(
        &self,
        candidates: &[String],
        referer: &str,
        via: ResolveStage,
    ) -> Option<ResolvedLink> {
        for candidate in candidates {
            let probe = match self
                .http
                .head_check(candidate, Some(referer), self.settings.probe_timeout)
                .await
            {
                Ok(p) => p,
                Err(e) => {
                    debug!(%candidate, error = %e, "probe failed");
                    continue;
                }
            };

            if is_acceptable(
                probe.content_type.as_deref(),
                probe.content_length,
                self.settings.min_pdf_size,
            ) {
                info!(%candidate, %via, "validated PDF candidate");
                return Some(ResolvedLink {
                    pdf_url: candidate.clone(),
                    referer: referer.to_string(),
                    via,
                });
            }
            debug!(
                %candidate,
                content_type = ?probe.content_type,
                content_length = ?probe.content_length,
                "candidate rejected"
            );
        }
        None
    }
}
