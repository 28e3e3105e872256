//! Headless-browser strategy: render, click, and sniff the network.
//!
//! Used last, for pages that only produce their link after JavaScript runs
//! or a button is pressed. The file itself is never saved by the browser;
//! we only record the URL of the PDF response and let the HTTP downloader
//! fetch it.

use crate::acquisition::candidates::has_pdf_extension;
use crate::acquisition::page_scan;
use crate::acquisition::site_patterns::site_patterns;
use crate::extraction::selector_model::SelectorModel;
use crate::renderer::{RenderContext, Renderer};
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// How a browser discovery ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserFinding {
    /// A PDF response was observed on the wire.
    Sniffed { url: String, page_url: String },
    /// The tab navigated straight to a `.pdf` URL.
    Navigated { url: String },
    /// No download happened; these links came from the rendered DOM.
    Rendered { candidates: Vec<String>, page_url: String },
}

/// Drives a rendered tab to reveal a download.
pub struct BrowserStrategy {
    renderer: Arc<dyn Renderer>,
    model: SelectorModel,
    nav_timeout_ms: u64,
    settle: Duration,
    click_wait: Duration,
}

impl BrowserStrategy {
    pub fn new(renderer: Arc<dyn Renderer>, model: SelectorModel) -> Self {
        Self {
            renderer,
            model,
            nav_timeout_ms: 30_000,
            settle: Duration::from_secs(2),
            click_wait: Duration::from_secs(10),
        }
    }

    /// Whether a real browser is behind this strategy.
    pub fn is_available(&self) -> bool {
        self.renderer.is_available()
    }

    /// Render `url` and try to make it produce a PDF.
    pub async fn discover(&self, url: &str) -> Result<Option<BrowserFinding>> {
        let mut ctx = self.renderer.new_context().await?;
        let result = self.drive(ctx.as_mut(), url).await;
        if let Err(e) = ctx.close().await {
            debug!(error = %e, "closing browser context failed");
        }
        result
    }

    async fn drive(&self, ctx: &mut dyn RenderContext, url: &str) -> Result<Option<BrowserFinding>> {
        let nav = ctx.navigate(url, self.nav_timeout_ms).await?;
        debug!(final_url = %nav.final_url, load_time_ms = nav.load_time_ms, "page rendered");
        tokio::time::sleep(self.settle).await;

        if let Some(hit) = ctx.sniffed_responses().await.into_iter().next() {
            return Ok(Some(BrowserFinding::Sniffed {
                url: hit.url,
                page_url: nav.final_url,
            }));
        }

        let html = ctx.get_html().await?;

        for selector in self.click_plan(&html) {
            if let Err(e) = ctx.click(&selector).await {
                debug!(%selector, error = %e, "click failed");
                continue;
            }
            info!(%selector, "clicked download element");

            if let Some(finding) = self.await_download(ctx, &nav.final_url).await {
                return Ok(Some(finding));
            }
        }

        let rendered = ctx.get_html().await.unwrap_or(html);
        let page_url = ctx.get_url().await.unwrap_or(nav.final_url);
        let candidates = page_scan::scan_html(&rendered, &page_url);
        if candidates.is_empty() {
            return Ok(None);
        }
        Ok(Some(BrowserFinding::Rendered {
            candidates,
            page_url,
        }))
    }

    /// Selectors to try, the model's confident pick first.
    fn click_plan(&self, html: &str) -> Vec<String> {
        let mut plan = Vec::new();
        if let Some(pick) = self.model.pick_best(html) {
            plan.push(pick.selector);
        }
        let document = scraper::Html::parse_document(html);
        for sel in &site_patterns().click_selectors {
            let Ok(parsed) = scraper::Selector::parse(sel) else {
                continue;
            };
            if document.select(&parsed).next().is_some() && !plan.contains(sel) {
                plan.push(sel.clone());
            }
        }
        plan
    }

    /// Poll for a sniffed PDF response or a navigation onto a `.pdf` URL.
    async fn await_download(&self, ctx: &dyn RenderContext, page_url: &str) -> Option<BrowserFinding> {
        let step = Duration::from_millis(500);
        let mut waited = Duration::ZERO;

        while waited < self.click_wait {
            tokio::time::sleep(step).await;
            waited += step;

            if let Some(hit) = ctx.sniffed_responses().await.into_iter().next() {
                return Some(BrowserFinding::Sniffed {
                    url: hit.url,
                    page_url: page_url.to_string(),
                });
            }
            if let Ok(current) = ctx.get_url().await {
                if has_pdf_extension(&current) {
                    return Some(BrowserFinding::Navigated { url: current });
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::{NavigationResult, NoopRenderer, SniffedResponse};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    /// Scripted tab: clicking any selector "downloads" the given URL.
    struct FakeContext {
        html: String,
        download_on_click: Option<String>,
        sniffed: Mutex<Vec<SniffedResponse>>,
        clicks: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl RenderContext for FakeContext {
        async fn navigate(&mut self, url: &str, _timeout_ms: u64) -> Result<NavigationResult> {
            Ok(NavigationResult {
                final_url: url.to_string(),
                load_time_ms: 1,
            })
        }
        async fn get_html(&self) -> Result<String> {
            Ok(self.html.clone())
        }
        async fn get_url(&self) -> Result<String> {
            Ok("https://books.example/page".to_string())
        }
        async fn click(&self, selector: &str) -> Result<()> {
            self.clicks.lock().await.push(selector.to_string());
            if let Some(url) = &self.download_on_click {
                self.sniffed.lock().await.push(SniffedResponse {
                    url: url.clone(),
                    mime_type: "application/pdf".into(),
                });
            }
            Ok(())
        }
        async fn sniffed_responses(&self) -> Vec<SniffedResponse> {
            self.sniffed.lock().await.clone()
        }
        async fn close(self: Box<Self>) -> Result<()> {
            Ok(())
        }
    }

    struct FakeRenderer {
        html: String,
        download_on_click: Option<String>,
        clicks: Arc<Mutex<Vec<String>>>,
        opened: AtomicUsize,
    }

    #[async_trait]
    impl Renderer for FakeRenderer {
        async fn new_context(&self) -> Result<Box<dyn RenderContext>> {
            self.opened.fetch_add(1, Ordering::Relaxed);
            Ok(Box::new(FakeContext {
                html: self.html.clone(),
                download_on_click: self.download_on_click.clone(),
                sniffed: Mutex::new(Vec::new()),
                clicks: Arc::clone(&self.clicks),
            }))
        }
        async fn shutdown(&self) -> Result<()> {
            Ok(())
        }
        fn active_contexts(&self) -> usize {
            0
        }
    }

    fn strategy(html: &str, download: Option<&str>) -> (BrowserStrategy, Arc<Mutex<Vec<String>>>) {
        let clicks = Arc::new(Mutex::new(Vec::new()));
        let renderer = Arc::new(FakeRenderer {
            html: html.to_string(),
            download_on_click: download.map(str::to_string),
            clicks: Arc::clone(&clicks),
            opened: AtomicUsize::new(0),
        });
        let mut s = BrowserStrategy::new(renderer, SelectorModel::default());
        s.settle = Duration::ZERO;
        s.click_wait = Duration::from_millis(1000);
        (s, clicks)
    }

    #[tokio::test]
    async fn test_click_model_pick_and_sniff() {
        let html = r#"<main><a class="btn" href="/get/9">تحميل PDF</a></main>"#;
        let (s, clicks) = strategy(html, Some("https://cdn.example/9.pdf"));
        let found = s.discover("https://books.example/page").await.unwrap();
        assert_eq!(
            found,
            Some(BrowserFinding::Sniffed {
                url: "https://cdn.example/9.pdf".into(),
                page_url: "https://books.example/page".into(),
            })
        );
        assert_eq!(clicks.lock().await[0], "a[href='/get/9']");
    }

    #[tokio::test]
    async fn test_rendered_dom_fallback() {
        let html = r#"<a href="/about">About</a><script>var f='https://cdn.example/r.pdf'</script>"#;
        let (s, _) = strategy(html, None);
        let found = s.discover("https://books.example/page").await.unwrap();
        match found {
            Some(BrowserFinding::Rendered { candidates, .. }) => {
                assert_eq!(candidates, vec!["https://cdn.example/r.pdf"]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_noop_renderer_errors() {
        let s = BrowserStrategy::new(Arc::new(NoopRenderer), SelectorModel::default());
        assert!(!s.is_available());
        assert!(s.discover("https://books.example").await.is_err());
    }
}
