//! Run a search from the terminal.

use super::HTTP_TIMEOUT_MS;
use crate::acquisition::http_client::HttpClient;
use crate::config::BotConfig;
use crate::search::provider_for;
use anyhow::Result;

pub async fn run(query: &str, json: bool) -> Result<()> {
    let config = BotConfig::from_env()?;
    let provider = provider_for(&config, HttpClient::new(HTTP_TIMEOUT_MS));
    let hits = provider.search(query).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&hits)?);
        return Ok(());
    }

    if hits.is_empty() {
        println!("No results ({}).", provider.name());
        return Ok(());
    }
    for (i, hit) in hits.iter().enumerate() {
        println!("{:>2}. {}", i + 1, hit.title);
        println!("    {}", hit.link);
        if !hit.snippet.is_empty() {
            println!("    {}", hit.snippet);
        }
    }
    Ok(())
}
