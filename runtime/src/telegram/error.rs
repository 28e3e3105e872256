/// Failures talking to the Bot API.
#[derive(thiserror::Error, Debug)]
pub enum TelegramError {
    #[error("Telegram HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Telegram API error {code:?}: {description}")]
    Api {
        code: Option<i64>,
        description: String,
    },

    #[error("Telegram upload failed: {0}")]
    Io(#[from] std::io::Error),
}
