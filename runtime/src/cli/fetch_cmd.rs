//! Resolve and download a PDF to a local file.

use super::{Pipeline, HTTP_TIMEOUT_MS};
use crate::acquisition::http_client::HttpClient;
use crate::config::BotConfig;
use crate::delivery::Delivery;
use anyhow::{bail, Context, Result};
use std::path::PathBuf;

pub async fn run(url: &str, out: Option<PathBuf>) -> Result<()> {
    let config = BotConfig::from_env()?;
    let http = HttpClient::new(HTTP_TIMEOUT_MS);
    let pipeline = Pipeline::build(&config, http.clone()).await;
    let found = pipeline.resolver.resolve(url).await;
    pipeline.shutdown().await;

    let Some(link) = found else {
        bail!("no PDF link found behind {url}");
    };
    eprintln!("  Found {} (via {})", link.pdf_url, link.via);

    let title = out
        .as_ref()
        .and_then(|p| p.file_stem())
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "book".to_string());

    let pdf = Delivery::new(http)
        .download(&link.pdf_url, Some(&link.referer), &title)
        .await
        .context("download failed")?;

    let dest = out.unwrap_or_else(|| PathBuf::from(pdf.file_name()));
    let size = pdf.size();
    pdf.persist(&dest)
        .await
        .with_context(|| format!("failed to write {}", dest.display()))?;

    println!("{} ({size} bytes)", dest.display());
    Ok(())
}
