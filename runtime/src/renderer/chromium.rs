//! Chromium-based renderer using chromiumoxide.

use super::{NavigationResult, RenderContext, Renderer, SniffedResponse};
use crate::acquisition::candidates::is_pdf_content_type;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::EventResponseReceived;
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Find the Chromium binary path.
///
/// Checks, in order: the explicit path, `BOOKHOUND_CHROMIUM_PATH`,
/// `~/.bookhound/chromium/`, then the system `PATH`.
pub fn find_chromium(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = explicit {
        if p.exists() {
            return Some(p.to_path_buf());
        }
    }

    if let Ok(p) = std::env::var("BOOKHOUND_CHROMIUM_PATH") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    if let Some(home) = dirs::home_dir() {
        let candidates = if cfg!(target_os = "macos") {
            vec![
                home.join(".bookhound/chromium/chrome-mac-arm64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".bookhound/chromium/chrome-mac-x64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".bookhound/chromium/chrome"),
            ]
        } else {
            vec![
                home.join(".bookhound/chromium/chrome-linux64/chrome"),
                home.join(".bookhound/chromium/chrome"),
            ]
        };
        for c in candidates {
            if c.exists() {
                return Some(c);
            }
        }
    }

    ["google-chrome", "chromium", "chromium-browser"]
        .iter()
        .find_map(|name| which::which(name).ok())
}

/// Chromium-based renderer.
pub struct ChromiumRenderer {
    browser: Browser,
    handler_task: JoinHandle<()>,
    active_count: Arc<AtomicUsize>,
}

impl ChromiumRenderer {
    /// Launch a headless Chromium instance.
    pub async fn new(explicit_path: Option<&Path>) -> Result<Self> {
        let chrome_path = find_chromium(explicit_path)
            .context("Chromium not found. Set BOOKHOUND_CHROMIUM_PATH or install Chrome.")?;

        let config = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-background-networking")
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build browser config: {e}"))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("failed to launch Chromium")?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        Ok(Self {
            browser,
            handler_task,
            active_count: Arc::new(AtomicUsize::new(0)),
        })
    }
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn new_context(&self) -> Result<Box<dyn RenderContext>> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .context("failed to create new page")?;

        let sniffed = Arc::new(Mutex::new(Vec::new()));
        let mut responses = page
            .event_listener::<EventResponseReceived>()
            .await
            .context("failed to subscribe to network responses")?;

        let sink = Arc::clone(&sniffed);
        let sniffer = tokio::spawn(async move {
            while let Some(event) = responses.next().await {
                let mime_type = event.response.mime_type.to_lowercase();
                if is_pdf_content_type(&mime_type) {
                    tracing::debug!(url = %event.response.url, %mime_type, "sniffed document response");
                    sink.lock().await.push(SniffedResponse {
                        url: event.response.url.clone(),
                        mime_type,
                    });
                }
            }
        });

        self.active_count.fetch_add(1, Ordering::Relaxed);

        Ok(Box::new(ChromiumContext {
            page,
            sniffed,
            sniffer,
            active_count: Arc::clone(&self.active_count),
        }))
    }

    async fn shutdown(&self) -> Result<()> {
        self.handler_task.abort();
        Ok(())
    }

    fn active_contexts(&self) -> usize {
        self.active_count.load(Ordering::Relaxed)
    }
}

/// A single Chromium page context.
pub struct ChromiumContext {
    page: Page,
    sniffed: Arc<Mutex<Vec<SniffedResponse>>>,
    sniffer: JoinHandle<()>,
    active_count: Arc<AtomicUsize>,
}

#[async_trait]
impl RenderContext for ChromiumContext {
    async fn navigate(&mut self, url: &str, timeout_ms: u64) -> Result<NavigationResult> {
        let start = Instant::now();

        let result = tokio::time::timeout(
            std::time::Duration::from_millis(timeout_ms),
            self.page.goto(url),
        )
        .await;

        let load_time_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(Ok(_)) => {
                let final_url = self
                    .page
                    .url()
                    .await
                    .unwrap_or_default()
                    .unwrap_or_else(|| url.to_string());

                Ok(NavigationResult {
                    final_url,
                    load_time_ms,
                })
            }
            Ok(Err(e)) => bail!("navigation failed: {e}"),
            Err(_) => bail!("navigation timed out after {timeout_ms}ms"),
        }
    }

    async fn get_html(&self) -> Result<String> {
        self.page.content().await.context("failed to get HTML")
    }

    async fn get_url(&self) -> Result<String> {
        let url = self
            .page
            .url()
            .await
            .context("failed to get URL")?
            .unwrap_or_default();
        Ok(url)
    }

    async fn click(&self, selector: &str) -> Result<()> {
        let element = self
            .page
            .find_element(selector)
            .await
            .with_context(|| format!("no element matches {selector}"))?;
        element
            .click()
            .await
            .with_context(|| format!("click on {selector} failed"))?;
        Ok(())
    }

    async fn sniffed_responses(&self) -> Vec<SniffedResponse> {
        self.sniffed.lock().await.clone()
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.active_count.fetch_sub(1, Ordering::Relaxed);
        self.sniffer.abort();
        let _ = self.page.close().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_path_must_exist() {
        let missing = Path::new("/definitely/not/here/chrome");
        let found = find_chromium(Some(missing));
        assert_ne!(found.as_deref(), Some(missing));
    }

    #[tokio::test]
    #[ignore] // Requires Chromium to be installed
    async fn test_chromium_navigate_click_and_sniff() {
        let renderer = ChromiumRenderer::new(None)
            .await
            .expect("failed to create renderer");
        let mut ctx = renderer
            .new_context()
            .await
            .expect("failed to create context");

        let nav = ctx
            .navigate(
                "data:text/html,<h1>Hello</h1><a id='go' href='#'>go</a>",
                10000,
            )
            .await
            .expect("navigation failed");
        assert!(nav.load_time_ms < 10000);

        let html = ctx.get_html().await.expect("get_html failed");
        assert!(html.contains("<h1>Hello</h1>"));

        ctx.click("#go").await.expect("click failed");
        assert!(ctx.sniffed_responses().await.is_empty());

        ctx.close().await.expect("close failed");
        assert_eq!(renderer.active_contexts(), 0);

        renderer.shutdown().await.expect("shutdown failed");
    }
}
