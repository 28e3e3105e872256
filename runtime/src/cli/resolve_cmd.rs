//! Resolve a page URL to a PDF link without downloading it.

use super::{Pipeline, HTTP_TIMEOUT_MS};
use crate::acquisition::http_client::HttpClient;
use crate::config::BotConfig;
use anyhow::{bail, Result};

pub async fn run(url: &str, json: bool) -> Result<()> {
    let config = BotConfig::from_env()?;
    let pipeline = Pipeline::build(&config, HttpClient::new(HTTP_TIMEOUT_MS)).await;
    let found = pipeline.resolver.resolve(url).await;
    pipeline.shutdown().await;

    let Some(link) = found else {
        bail!("no PDF link found behind {url}");
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&link)?);
    } else {
        println!("PDF:     {}", link.pdf_url);
        println!("Referer: {}", link.referer);
        println!("Via:     {}", link.via);
    }
    Ok(())
}
