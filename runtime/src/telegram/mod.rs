//! Minimal Telegram Bot API client: long polling, messages, documents.

pub mod client;
pub mod error;
pub mod types;

pub use client::TelegramClient;
pub use error::TelegramError;
pub use types::{InlineKeyboardButton, InlineKeyboardMarkup, Message, Update};

use async_trait::async_trait;
use std::path::Path;

/// Outgoing chat operations used by the bot handlers.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Send a text message, returning the id of the new message.
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<i64, TelegramError>;

    /// Replace the text (and keyboard) of an earlier message.
    async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<(), TelegramError>;

    /// Stop the spinner on a pressed inline button.
    async fn answer_callback_query(&self, callback_id: &str) -> Result<(), TelegramError>;

    /// Upload a file from disk as a document.
    async fn send_document(
        &self,
        chat_id: i64,
        path: &Path,
        file_name: &str,
    ) -> Result<(), TelegramError>;
}
