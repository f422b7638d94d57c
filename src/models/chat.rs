use serde::{ Serialize, Deserialize };
use serde_json::Value as JsonValue;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// A conversation as accepted by `Session::load_chat`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Conversation {
    pub chat_id: String,
    pub messages: Vec<ChatMessage>,
}

impl Conversation {
    /// Validates loosely-typed conversation data. Either the whole object is
    /// well formed or nothing is returned.
    pub fn from_value(value: &JsonValue) -> Result<Self, String> {
        let obj = value.as_object().ok_or_else(|| "conversation is not an object".to_string())?;

        let chat_id = obj
            .get("chat_id")
            .and_then(|v| v.as_str())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| "missing chat_id".to_string())?;

        let raw_messages = obj
            .get("messages")
            .and_then(|v| v.as_array())
            .ok_or_else(|| "missing messages".to_string())?;

        let mut messages = Vec::with_capacity(raw_messages.len());
        for (i, raw) in raw_messages.iter().enumerate() {
            let msg: ChatMessage = serde_json
                ::from_value(raw.clone())
                .map_err(|e| format!("message {} is malformed: {}", i, e))?;
            messages.push(msg);
        }

        Ok(Conversation {
            chat_id: chat_id.to_string(),
            messages,
        })
    }
}
