//! Start the bot and poll until interrupted.

use super::{Pipeline, HTTP_TIMEOUT_MS};
use crate::acquisition::http_client::HttpClient;
use crate::bot::{run_polling, Bot};
use crate::config::BotConfig;
use crate::delivery::Delivery;
use crate::search::provider_for;
use crate::telegram::{Messenger, TelegramClient};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

pub async fn run() -> Result<()> {
    let config = BotConfig::from_env()?;
    let token = config.require_token()?;

    info!("starting bookhound v{}", env!("CARGO_PKG_VERSION"));

    let telegram = TelegramClient::new(&config.telegram_api_url, token);
    let username = telegram
        .get_me()
        .await
        .context("Telegram rejected the bot token")?;
    info!(%username, "connected to Telegram");

    let http = HttpClient::new(HTTP_TIMEOUT_MS);
    let search = provider_for(&config, http.clone());
    info!(backend = search.name(), "search backend selected");

    let pipeline = Pipeline::build(&config, http.clone()).await;
    if !pipeline.resolver.has_browser() {
        info!("browser strategy disabled");
    }

    let messenger: Arc<dyn Messenger> = Arc::new(telegram.clone());
    let bot = Arc::new(Bot::new(
        messenger,
        search,
        Arc::clone(&pipeline.resolver),
        Delivery::new(http),
    ));

    eprintln!("  ✅ bookhound is running as @{username}. Press Ctrl-C to stop.");
    run_polling(&telegram, bot).await;

    pipeline.shutdown().await;
    eprintln!("  bookhound stopped.");
    Ok(())
}
