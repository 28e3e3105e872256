//! Bot API payloads. Only the fields the bot reads are modelled.

use serde::{Deserialize, Serialize};

/// Envelope around every Bot API answer.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
    pub error_code: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    pub from: Option<User>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    pub message: Option<Message>,
    pub data: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

impl InlineKeyboardMarkup {
    /// One button per row.
    pub fn single_column(buttons: Vec<InlineKeyboardButton>) -> Self {
        Self {
            inline_keyboard: buttons.into_iter().map(|b| vec![b]).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_data: Option<String>,
}

impl InlineKeyboardButton {
    pub fn callback(text: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: Some(data.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_message_update() {
        let raw = r#"{"update_id":7,"message":{"message_id":3,"date":0,
            "chat":{"id":42,"type":"private"},
            "from":{"id":42,"is_bot":false,"first_name":"Sara"},
            "text":"/search ابن تيمية"}}"#;
        let u: Update = serde_json::from_str(raw).unwrap();
        let m = u.message.unwrap();
        assert_eq!(m.chat.id, 42);
        assert_eq!(m.from.unwrap().id, 42);
        assert_eq!(m.text.as_deref(), Some("/search ابن تيمية"));
        assert!(u.callback_query.is_none());
    }

    #[test]
    fn test_parse_callback_update() {
        let raw = r#"{"update_id":8,"callback_query":{"id":"cb1",
            "from":{"id":5,"is_bot":false,"first_name":"A"},
            "message":{"message_id":9,"date":0,"chat":{"id":5,"type":"private"}},
            "chat_instance":"x","data":"dl|2"}}"#;
        let u: Update = serde_json::from_str(raw).unwrap();
        let cb = u.callback_query.unwrap();
        assert_eq!(cb.data.as_deref(), Some("dl|2"));
        assert_eq!(cb.message.unwrap().message_id, 9);
    }

    #[test]
    fn test_keyboard_serialization() {
        let kb = InlineKeyboardMarkup::single_column(vec![
            InlineKeyboardButton::callback("📥 تحميل 1", "dl|0"),
            InlineKeyboardButton::callback("📥 تحميل 2", "dl|1"),
        ]);
        let v = serde_json::to_value(&kb).unwrap();
        assert_eq!(v["inline_keyboard"][1][0]["callback_data"], "dl|1");
        assert_eq!(v["inline_keyboard"].as_array().unwrap().len(), 2);
    }
}
