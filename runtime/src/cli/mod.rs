//! CLI subcommand implementations for the bookhound binary.

pub mod doctor;
pub mod fetch_cmd;
pub mod resolve_cmd;
pub mod run;
pub mod search_cmd;

use crate::acquisition::http_client::HttpClient;
use crate::config::BotConfig;
use crate::extraction::browser::BrowserStrategy;
use crate::extraction::resolver::PdfResolver;
use crate::extraction::selector_model::SelectorModel;
use crate::renderer::chromium::ChromiumRenderer;
use crate::renderer::Renderer;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Default request timeout for the shared HTTP client.
pub const HTTP_TIMEOUT_MS: u64 = 30_000;

/// The resolver plus the browser it may own.
pub struct Pipeline {
    pub resolver: Arc<PdfResolver>,
    renderer: Option<Arc<dyn Renderer>>,
}

impl Pipeline {
    /// Build the resolver, launching Chromium when the config asks for it.
    ///
    /// A browser that fails to start leaves the resolver in HTTP-only mode.
    pub async fn build(config: &BotConfig, http: HttpClient) -> Self {
        let mut resolver = PdfResolver::new(http, config.resolver.clone());
        let mut renderer: Option<Arc<dyn Renderer>> = None;

        if config.use_browser {
            match ChromiumRenderer::new(config.chromium_path.as_deref()).await {
                Ok(r) => {
                    info!("Chromium renderer initialized");
                    let r: Arc<dyn Renderer> = Arc::new(r);
                    let model = load_selector_model(config);
                    resolver = resolver.with_browser(BrowserStrategy::new(Arc::clone(&r), model));
                    renderer = Some(r);
                }
                Err(e) => {
                    warn!("Failed to initialize Chromium: {e:#}");
                    warn!("Running in HTTP-only mode (no browser fallback)");
                }
            }
        }

        Self {
            resolver: Arc::new(resolver),
            renderer,
        }
    }

    pub async fn shutdown(&self) {
        if let Some(r) = &self.renderer {
            debug!(open_tabs = r.active_contexts(), "shutting down renderer");
            if let Err(e) = r.shutdown().await {
                warn!(error = %e, "renderer shutdown failed");
            }
        }
    }
}

fn load_selector_model(config: &BotConfig) -> SelectorModel {
    match SelectorModel::load(config.selector_model_path.as_deref()) {
        Ok(m) => m,
        Err(e) => {
            warn!("Selector model unavailable, using built-in weights: {e:#}");
            SelectorModel::default()
        }
    }
}
