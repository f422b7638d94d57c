pub mod http;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use thiserror::Error;
use crate::config::ClientConfig;
use crate::models::api::{ ChatRequest, Credentials, SaveChatRequest };
use crate::storage::LocalStore;
use self::http::HttpChatApi;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unauthorized{}", detail(.0))]
    Unauthorized(Option<String>),

    #[error("Server returned {status}{}", detail(.message))]
    Server {
        status: u16,
        message: Option<String>,
    },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

fn detail(message: &Option<String>) -> String {
    message.as_deref().map(|m| format!(": {}", m)).unwrap_or_default()
}

impl ApiError {
    /// Text the server put in the error body, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Unauthorized(message) | ApiError::Server { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_))
    }
}

/// The chatbot server's REST surface.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// `POST /register`, returns the server's confirmation message.
    async fn register(&self, credentials: &Credentials) -> Result<String, ApiError>;

    /// `POST /login`, returns the auth token.
    async fn login(&self, credentials: &Credentials) -> Result<String, ApiError>;

    /// `POST /chat`, returns the assistant reply verbatim.
    async fn chat(&self, request: &ChatRequest) -> Result<String, ApiError>;

    async fn save_chat(&self, request: &SaveChatRequest) -> Result<String, ApiError>;

    async fn get_conversations(&self, user_id: Option<&str>) -> Result<Vec<JsonValue>, ApiError>;

    /// `POST /new-chat`, deletes every saved conversation of `user_id`.
    async fn new_chat(&self, user_id: &str) -> Result<String, ApiError>;
}

pub fn new_client(
    config: &ClientConfig,
    store: Arc<dyn LocalStore>
) -> Result<Arc<dyn ChatApi>, ApiError> {
    let client = HttpChatApi::from_config(config, store)?;
    Ok(Arc::new(client))
}
