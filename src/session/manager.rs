use log::{ error, info, warn };
use serde_json::Value as JsonValue;
use std::sync::Arc;
use crate::api::ChatApi;
use crate::auth;
use crate::config::ClientConfig;
use crate::session::view::SavedConversation;
use crate::session::{ SendOutcome, Session, SessionError };
use crate::storage::LocalStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetOutcome {
    pub message: Option<String>,
    /// Set when the server-side delete failed; the local reset happened anyway.
    pub warning: Option<String>,
}

/// Owns the session and drives it against the server.
pub struct SessionManager {
    api: Arc<dyn ChatApi>,
    store: Arc<dyn LocalStore>,
    session: Session,
    saved: Vec<SavedConversation>,
}

impl SessionManager {
    pub fn new(
        api: Arc<dyn ChatApi>,
        store: Arc<dyn LocalStore>,
        config: &ClientConfig
    ) -> Result<Self, SessionError> {
        let user_id = auth::ensure_user_id(store.as_ref())?;
        let session = Session::new(user_id, config.greeting.clone(), config.fallback_reply.clone());
        Ok(Self {
            api,
            store,
            session,
            saved: Vec::new(),
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn start_new_chat(&mut self) {
        self.session.start_new_chat();
    }

    pub async fn send_message(&mut self, text: &str) -> SendOutcome {
        let Some(pending) = self.session.begin_send(text) else {
            return SendOutcome::Empty;
        };
        let result = self.api.chat(&pending.request).await;
        let outcome = self.session.finish_send(pending, result);

        if let SendOutcome::Unauthorized = outcome {
            warn!("Authentication expired; clearing stored token");
            if let Err(e) = auth::logout(self.store.as_ref()) {
                error!("Failed to clear auth token: {}", e);
            }
        }
        outcome
    }

    pub fn load_chat(&mut self, data: Option<&JsonValue>) -> Result<(), SessionError> {
        self.session.load_chat(data)
    }

    /// Loads entry `index` of the last `list_saved_conversations` result.
    pub fn select_saved(&mut self, index: usize) -> Result<(), SessionError> {
        let raw = self.saved
            .get(index)
            .map(|c| c.raw.clone())
            .ok_or(SessionError::UnknownConversation(index))?;
        self.session.load_chat(Some(&raw))
    }

    pub fn close_history(&mut self) {
        self.session.close_history();
    }

    pub async fn save_chat(&mut self) -> Result<String, SessionError> {
        let request = self.session.save_request()?;
        let message = self.api.save_chat(&request).await.map_err(|e| {
            error!("Failed to save chat {}: {}", self.session.chat_id(), e);
            e
        })?;
        info!("Saved chat {} ({} messages)", self.session.chat_id(), request.history.len());
        Ok(message)
    }

    pub async fn list_saved_conversations(&mut self) -> Result<&[SavedConversation], SessionError> {
        let user_id = self.session.user_id().to_string();
        let conversations = self.api.get_conversations(Some(&user_id)).await.map_err(|e| {
            error!("Failed to load saved conversations: {}", e);
            e
        })?;

        self.saved = conversations.into_iter().map(SavedConversation::new).collect();
        self.session.open_history();
        Ok(&self.saved)
    }

    /// Deletes every saved conversation on the server, then starts a new
    /// chat no matter how the delete went.
    pub async fn reset_all_history(&mut self) -> ResetOutcome {
        let user_id = self.session.user_id().to_string();
        let outcome = match self.api.new_chat(&user_id).await {
            Ok(message) => {
                info!("Deleted saved conversations for user {}", user_id);
                ResetOutcome { message: Some(message), warning: None }
            }
            Err(e) => {
                warn!("Failed to delete saved conversations for {}: {}", user_id, e);
                ResetOutcome { message: None, warning: Some(e.to_string()) }
            }
        };
        self.saved.clear();
        self.session.start_new_chat();
        outcome
    }
}
