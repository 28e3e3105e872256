//! Runtime configuration, read once from the environment.

use std::path::PathBuf;
use std::time::Duration;

/// Smallest body accepted as a real book (50 KiB).
pub const MIN_PDF_SIZE_BYTES: u64 = 50 * 1024;

/// Largest document the Bot API accepts for upload (50 MiB).
pub const MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

/// Number of hits shown for one `/search`.
pub const SEARCH_RESULT_LIMIT: usize = 6;

/// Minimum spacing between two searches from the same user.
pub const SEARCH_RATE_LIMIT: Duration = Duration::from_secs(2);

/// Interval between refetches while a page counts down to its link.
pub const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Default countdown polling budget in seconds.
pub const DEFAULT_MAX_WAIT_SECS: u64 = 30;

const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Errors raised while reading configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("BOT_TOKEN مفقود في المتغيرات البيئية (BOT_TOKEN is not set)")]
    MissingToken,

    #[error("invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

/// Which search backend answers `/search`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchBackend {
    /// Google Custom Search JSON API.
    Google { api_key: String, cse_id: String },
    /// DuckDuckGo HTML endpoint, no credentials.
    DuckDuckGo,
}

/// Knobs for the link resolver.
#[derive(Debug, Clone)]
pub struct ResolverSettings {
    /// Total countdown polling budget. Zero disables polling.
    pub max_wait: Duration,
    /// Sleep between polling attempts.
    pub poll_interval: Duration,
    /// Timeout for page fetches.
    pub page_timeout: Duration,
    /// Timeout for HEAD/GET validation probes.
    pub probe_timeout: Duration,
    /// Minimum declared size for a candidate to be accepted.
    pub min_pdf_size: u64,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            max_wait: Duration::from_secs(DEFAULT_MAX_WAIT_SECS),
            poll_interval: POLL_INTERVAL,
            page_timeout: Duration::from_secs(15),
            probe_timeout: Duration::from_secs(10),
            min_pdf_size: MIN_PDF_SIZE_BYTES,
        }
    }
}

impl ResolverSettings {
    /// Number of refetches performed while waiting for a countdown.
    ///
    /// At least one attempt whenever waiting is enabled at all.
    pub fn poll_attempts(&self) -> u32 {
        if self.max_wait.is_zero() || self.poll_interval.is_zero() {
            return 0;
        }
        let attempts = self.max_wait.as_millis() / self.poll_interval.as_millis();
        attempts.clamp(1, u32::MAX as u128) as u32
    }
}

/// Everything the bot reads from its environment.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Telegram bot token. `None` is fine for the offline CLI commands.
    pub bot_token: Option<String>,
    /// Base URL of the Bot API.
    pub telegram_api_url: String,
    pub search: SearchBackend,
    /// Whether the headless-browser strategy may be used.
    pub use_browser: bool,
    /// Explicit Chromium binary.
    pub chromium_path: Option<PathBuf>,
    /// Optional weights file for the selector classifier.
    pub selector_model_path: Option<PathBuf>,
    pub resolver: ResolverSettings,
}

impl BotConfig {
    /// Read configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through an arbitrary lookup (tests pass a map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let search = match (non_empty("GOOGLE_API_KEY"), non_empty("CSE_ID")) {
            (Some(api_key), Some(cse_id)) => SearchBackend::Google { api_key, cse_id },
            _ => SearchBackend::DuckDuckGo,
        };

        let use_browser = match non_empty("BOOKHOUND_USE_BROWSER") {
            Some(v) => parse_flag("BOOKHOUND_USE_BROWSER", &v)?,
            None => false,
        };

        let mut resolver = ResolverSettings::default();
        if let Some(v) = non_empty("BOOKHOUND_MAX_WAIT_SECS") {
            let secs: u64 = v.trim().parse().map_err(|_| ConfigError::InvalidValue {
                name: "BOOKHOUND_MAX_WAIT_SECS",
                value: v.clone(),
            })?;
            resolver.max_wait = Duration::from_secs(secs);
        }

        Ok(Self {
            bot_token: non_empty("BOT_TOKEN"),
            telegram_api_url: non_empty("TELEGRAM_API_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_TELEGRAM_API_URL.to_string()),
            search,
            use_browser,
            chromium_path: non_empty("BOOKHOUND_CHROMIUM_PATH").map(PathBuf::from),
            selector_model_path: non_empty("BOOKHOUND_SELECTOR_MODEL").map(PathBuf::from),
            resolver,
        })
    }

    /// The bot token, or the error the bot reports when it is missing.
    pub fn require_token(&self) -> Result<&str, ConfigError> {
        self.bot_token.as_deref().ok_or(ConfigError::MissingToken)
    }
}

fn parse_flag(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            name,
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<BotConfig, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        BotConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn test_defaults_without_env() {
        let cfg = config_from(&[]).unwrap();
        assert!(cfg.bot_token.is_none());
        assert_eq!(cfg.search, SearchBackend::DuckDuckGo);
        assert!(!cfg.use_browser);
        assert_eq!(cfg.telegram_api_url, "https://api.telegram.org");
        assert_eq!(cfg.resolver.max_wait, Duration::from_secs(30));
        assert!(matches!(cfg.require_token(), Err(ConfigError::MissingToken)));
    }

    #[test]
    fn test_google_needs_both_credentials() {
        let cfg = config_from(&[("GOOGLE_API_KEY", "k")]).unwrap();
        assert_eq!(cfg.search, SearchBackend::DuckDuckGo);

        let cfg = config_from(&[("GOOGLE_API_KEY", "k"), ("CSE_ID", "cx")]).unwrap();
        assert_eq!(
            cfg.search,
            SearchBackend::Google {
                api_key: "k".into(),
                cse_id: "cx".into()
            }
        );
    }

    #[test]
    fn test_browser_flag_parsing() {
        assert!(config_from(&[("BOOKHOUND_USE_BROWSER", "yes")]).unwrap().use_browser);
        assert!(!config_from(&[("BOOKHOUND_USE_BROWSER", "0")]).unwrap().use_browser);
        assert!(config_from(&[("BOOKHOUND_USE_BROWSER", "maybe")]).is_err());
    }

    #[test]
    fn test_api_url_trailing_slash_trimmed() {
        let cfg = config_from(&[("TELEGRAM_API_URL", "http://localhost:8081/")]).unwrap();
        assert_eq!(cfg.telegram_api_url, "http://localhost:8081");
    }

    #[test]
    fn test_poll_attempts() {
        let mut s = ResolverSettings::default();
        assert_eq!(s.poll_attempts(), 6);
        s.max_wait = Duration::from_secs(3);
        assert_eq!(s.poll_attempts(), 1);
        s.max_wait = Duration::ZERO;
        assert_eq!(s.poll_attempts(), 0);
    }

    #[test]
    fn test_invalid_wait_rejected() {
        let err = config_from(&[("BOOKHOUND_MAX_WAIT_SECS", "soon")]).unwrap_err();
        assert!(err.to_string().contains("BOOKHOUND_MAX_WAIT_SECS"));
    }
}
