//! Environment readiness check.

use crate::config::{BotConfig, SearchBackend};
use crate::extraction::selector_model::SelectorModel;
use crate::renderer::chromium::find_chromium;
use anyhow::Result;

/// Check the token, search backend, Chromium, temp dir and selector model.
pub async fn run() -> Result<()> {
    println!("Bookhound Doctor");
    println!("================");
    println!();

    println!("OS:   {}", std::env::consts::OS);
    println!("Arch: {}", std::env::consts::ARCH);
    println!();

    let config = match BotConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            println!("[!!] Configuration error: {e}");
            println!();
            println!("Status: NOT READY");
            return Ok(());
        }
    };

    let has_token = config.bot_token.is_some();
    if has_token {
        println!("[OK] BOT_TOKEN is set");
    } else {
        println!("[!!] BOT_TOKEN is NOT set");
    }

    match &config.search {
        SearchBackend::Google { .. } => println!("[OK] Search: Google Custom Search"),
        SearchBackend::DuckDuckGo => {
            println!("[OK] Search: DuckDuckGo (set GOOGLE_API_KEY and CSE_ID for Google)")
        }
    }

    let chromium = find_chromium(config.chromium_path.as_deref());
    match (&chromium, config.use_browser) {
        (Some(path), true) => println!("[OK] Chromium found: {}", path.display()),
        (Some(path), false) => println!(
            "[--] Chromium found but browser strategy is off (BOOKHOUND_USE_BROWSER): {}",
            path.display()
        ),
        (None, true) => println!("[!!] Chromium NOT found; the browser strategy will be skipped"),
        (None, false) => println!("[--] Browser strategy disabled"),
    }

    let tmp_ok = temp_dir_writable().await;
    let tmp = std::env::temp_dir();
    if tmp_ok {
        println!("[OK] Temp dir {} is writable", tmp.display());
    } else {
        println!("[!!] Temp dir {} is NOT writable", tmp.display());
    }

    match SelectorModel::load(config.selector_model_path.as_deref()) {
        Ok(m) => println!("[OK] Selector model loaded (threshold {:.2})", m.threshold()),
        Err(e) => println!("[??] Selector model invalid, built-in weights will be used: {e:#}"),
    }

    println!(
        "[OK] Countdown polling budget: {}s",
        config.resolver.max_wait.as_secs()
    );

    println!();
    if has_token && tmp_ok {
        println!("Status: READY");
    } else {
        println!("Status: NOT READY");
    }
    Ok(())
}

async fn temp_dir_writable() -> bool {
    let probe = std::env::temp_dir().join(format!("bookhound-{}.probe", uuid::Uuid::new_v4()));
    let ok = tokio::fs::write(&probe, b"ok").await.is_ok();
    let _ = tokio::fs::remove_file(&probe).await;
    ok
}
