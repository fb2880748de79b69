use chrono::Utc;
use serde::{ Serialize, Deserialize };

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Message {
    User {
        text: String,
    },
    Bot {
        html: String,
        id: i64,
    },
    Typing,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Message::User { text: text.into() }
    }

    pub fn bot(html: impl Into<String>) -> Self {
        Message::Bot {
            html: html.into(),
            id: Utc::now().timestamp_millis(),
        }
    }

    pub fn is_typing(&self) -> bool {
        matches!(self, Message::Typing)
    }
}
