//! Long-polling loop.

use super::handlers::Bot;
use crate::config::POLL_INTERVAL;
use crate::telegram::TelegramClient;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Seconds Telegram holds a `getUpdates` call open.
const LONG_POLL_SECS: u64 = 30;

/// How often expired search sessions are swept.
const SESSION_SWEEP: Duration = Duration::from_secs(5 * 60);

/// Poll for updates until Ctrl-C, handling each update on its own task.
pub async fn run_polling(client: &TelegramClient, bot: Arc<Bot>) {
    let mut offset: i64 = 0;
    let mut sweep = tokio::time::interval(SESSION_SWEEP);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!("polling for updates");
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("received shutdown signal");
                break;
            }
            _ = sweep.tick() => {
                let removed = bot.sessions().cleanup_expired();
                if removed > 0 {
                    debug!(removed, "expired search sessions dropped");
                }
                let forgotten = bot.rate_limiter().cleanup();
                if forgotten > 0 {
                    debug!(forgotten, "idle rate-limit entries dropped");
                }
            }
            res = client.get_updates(offset, LONG_POLL_SECS) => match res {
                Ok(updates) => {
                    for update in updates {
                        offset = offset.max(update.update_id + 1);
                        let bot = Arc::clone(&bot);
                        tokio::spawn(async move {
                            let id = update.update_id;
                            if let Err(e) = bot.handle_update(update).await {
                                warn!(update_id = id, error = %e, "update handler failed");
                            }
                        });
                    }
                }
                Err(e) => {
                    warn!(error = %e, "getUpdates failed");
                    tokio::time::sleep(POLL_INTERVAL).await;
                }
            }
        }
    }
}
