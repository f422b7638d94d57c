use serde::{ Serialize, Deserialize };
use serde_json::Value as JsonValue;
use crate::models::chat::ChatMessage;

#[derive(Serialize, Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Debug, Clone)]
pub struct ChatRequest {
    pub message: String,
    pub history: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

#[derive(Serialize, Debug, Clone)]
pub struct SaveChatRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<String>,
    pub history: Vec<ChatMessage>,
}

#[derive(Serialize, Debug, Clone)]
pub struct NewChatRequest {
    pub user_id: String,
}

#[derive(Deserialize, Debug)]
pub struct TokenResponse {
    pub token: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct ReplyResponse {
    pub reply: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct MessageResponse {
    pub message: Option<String>,
}

/// Entries are kept as raw JSON; validation happens when one is loaded.
#[derive(Deserialize, Debug)]
pub struct ConversationsResponse {
    #[serde(default)]
    pub conversations: Vec<JsonValue>,
}

/// Error body shape shared by every endpoint.
#[derive(Deserialize, Debug, Default)]
pub struct ErrorBody {
    pub error: Option<String>,
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn into_text(self) -> Option<String> {
        self.error.or(self.message)
    }

    /// `/save-chat` reports its failures in `message`.
    pub fn into_message_text(self) -> Option<String> {
        self.message.or(self.error)
    }
}
