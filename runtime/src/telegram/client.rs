//! Bot API over plain HTTPS with `reqwest`.

use super::error::TelegramError;
use super::types::{ApiResponse, InlineKeyboardMarkup, Message, Update};
use super::Messenger;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Talks to `<base_url>/bot<token>/<method>`.
#[derive(Clone)]
pub struct TelegramClient {
    http: reqwest::Client,
    base: String,
}

impl TelegramClient {
    pub fn new(base_url: &str, token: &str) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .unwrap_or_default();
        Self {
            http,
            base: format!("{}/bot{token}", base_url.trim_end_matches('/')),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{method}", self.base)
    }

    async fn call<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: &str,
        body: &B,
        timeout: Option<Duration>,
    ) -> Result<T, TelegramError> {
        let mut req = self.http.post(self.method_url(method)).json(body);
        if let Some(t) = timeout {
            req = req.timeout(t);
        }
        let resp = req.send().await?;
        unwrap_envelope(resp.json::<ApiResponse<T>>().await?)
    }

    /// Long-poll for updates after `offset`.
    pub async fn get_updates(
        &self,
        offset: i64,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, TelegramError> {
        let body = json!({
            "offset": offset,
            "timeout": timeout_secs,
            "allowed_updates": ["message", "callback_query"],
        });
        self.call(
            "getUpdates",
            &body,
            Some(Duration::from_secs(timeout_secs + 10)),
        )
        .await
    }

    /// Check the token; returns the bot's username.
    pub async fn get_me(&self) -> Result<String, TelegramError> {
        #[derive(serde::Deserialize)]
        struct Me {
            username: Option<String>,
        }
        let me: Me = self.call("getMe", &json!({}), None).await?;
        Ok(me.username.unwrap_or_default())
    }
}

fn unwrap_envelope<T>(envelope: ApiResponse<T>) -> Result<T, TelegramError> {
    match envelope {
        ApiResponse {
            ok: true,
            result: Some(result),
            ..
        } => Ok(result),
        ApiResponse {
            description,
            error_code,
            ..
        } => Err(TelegramError::Api {
            code: error_code,
            description: description.unwrap_or_else(|| "empty result".to_string()),
        }),
    }
}

#[async_trait]
impl Messenger for TelegramClient {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<i64, TelegramError> {
        let mut body = json!({ "chat_id": chat_id, "text": text });
        if let Some(kb) = keyboard {
            body["reply_markup"] = json!(kb);
        }
        let sent: Message = self.call("sendMessage", &body, None).await?;
        Ok(sent.message_id)
    }

    async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<(), TelegramError> {
        let mut body = json!({
            "chat_id": chat_id,
            "message_id": message_id,
            "text": text,
        });
        if let Some(kb) = keyboard {
            body["reply_markup"] = json!(kb);
        }
        let _: serde_json::Value = self.call("editMessageText", &body, None).await?;
        Ok(())
    }

    async fn answer_callback_query(&self, callback_id: &str) -> Result<(), TelegramError> {
        let _: bool = self
            .call(
                "answerCallbackQuery",
                &json!({ "callback_query_id": callback_id }),
                None,
            )
            .await?;
        Ok(())
    }

    async fn send_document(
        &self,
        chat_id: i64,
        path: &Path,
        file_name: &str,
    ) -> Result<(), TelegramError> {
        let file = tokio::fs::File::open(path).await?;
        let len = file.metadata().await?.len();
        debug!(chat_id, len, file_name, "uploading document");

        let part = Part::stream_with_length(reqwest::Body::from(file), len)
            .file_name(file_name.to_string())
            .mime_str("application/pdf")?;
        let form = Form::new()
            .text("chat_id", chat_id.to_string())
            .part("document", part);

        let resp = self
            .http
            .post(self.method_url("sendDocument"))
            .timeout(Duration::from_secs(300))
            .multipart(form)
            .send()
            .await?;
        let _: Message = unwrap_envelope(resp.json::<ApiResponse<Message>>().await?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_url() {
        let c = TelegramClient::new("https://api.telegram.org/", "123:abc");
        assert_eq!(
            c.method_url("getUpdates"),
            "https://api.telegram.org/bot123:abc/getUpdates"
        );
    }

    #[test]
    fn test_envelope_error() {
        let env: ApiResponse<bool> = serde_json::from_str(
            r#"{"ok":false,"error_code":400,"description":"Bad Request: message is not modified"}"#,
        )
        .unwrap();
        match unwrap_envelope(env) {
            Err(TelegramError::Api { code, description }) => {
                assert_eq!(code, Some(400));
                assert!(description.contains("not modified"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
