mod manager;
pub mod view;

pub use manager::{ ResetOutcome, SessionManager };

use log::{ debug, error, info };
use serde_json::Value as JsonValue;
use thiserror::Error;
use uuid::Uuid;
use crate::api::ApiError;
use crate::models::api::{ ChatRequest, SaveChatRequest };
use crate::models::chat::{ ChatMessage, Conversation };
use crate::storage::StorageError;
use self::view::{ render_transcript, ViewEntry };

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("There is no conversation to save.")]
    NothingToSave,

    #[error("Invalid chat data: {0}")]
    MalformedConversation(String),

    #[error("Not logged in")]
    NotLoggedIn,

    #[error("No saved conversation #{0}")]
    UnknownConversation(usize),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// A `/chat` request that has been started but not yet applied.
#[derive(Debug, Clone)]
pub struct PendingSend {
    pub seq: u64,
    pub request: ChatRequest,
}

#[derive(Debug)]
pub enum SendOutcome {
    /// Blank input; nothing happened.
    Empty,
    Replied(String),
    /// The fallback apology was rendered.
    Failed(ApiError),
    /// The fallback apology was rendered and the user must log in again.
    Unauthorized,
    /// Superseded by a newer send, a new chat or a loaded chat; discarded.
    Stale,
}

/// Client-side state of the active conversation.
#[derive(Debug, Clone)]
pub struct Session {
    user_id: String,
    chat_id: String,
    transcript: Vec<ChatMessage>,
    view: Vec<ViewEntry>,
    view_generation: u64,
    history_open: bool,
    latest_seq: u64,
    greeting: String,
    fallback_reply: String,
}

impl Session {
    pub fn new(
        user_id: impl Into<String>,
        greeting: impl Into<String>,
        fallback_reply: impl Into<String>
    ) -> Self {
        let mut session = Self {
            user_id: user_id.into(),
            chat_id: String::new(),
            transcript: Vec::new(),
            view: Vec::new(),
            view_generation: 0,
            history_open: false,
            latest_seq: 0,
            greeting: greeting.into(),
            fallback_reply: fallback_reply.into(),
        };
        session.start_new_chat();
        session
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn view(&self) -> &[ViewEntry] {
        &self.view
    }

    /// Bumped whenever the view is replaced rather than appended to.
    pub fn view_generation(&self) -> u64 {
        self.view_generation
    }

    pub fn is_history_open(&self) -> bool {
        self.history_open
    }

    pub fn open_history(&mut self) {
        self.history_open = true;
    }

    pub fn close_history(&mut self) {
        self.history_open = false;
    }

    pub fn start_new_chat(&mut self) {
        self.chat_id = Uuid::new_v4().to_string();
        self.transcript.clear();
        self.replace_view(vec![ViewEntry::bot(self.greeting.clone())]);
        self.history_open = false;
        self.latest_seq += 1;
        info!("Started new chat with ID: {}", self.chat_id);
    }

    /// Appends the user message and returns the request to send. `None` for
    /// blank input, in which case nothing changed.
    pub fn begin_send(&mut self, text: &str) -> Option<PendingSend> {
        if text.trim().is_empty() {
            return None;
        }

        let history = self.transcript.clone();
        self.transcript.push(ChatMessage::user(text));
        self.remove_typing();
        self.view.push(ViewEntry::user(text));
        self.view.push(ViewEntry::typing());

        self.latest_seq += 1;
        Some(PendingSend {
            seq: self.latest_seq,
            request: ChatRequest {
                message: text.to_string(),
                history,
                user_id: Some(self.user_id.clone()),
            },
        })
    }

    /// Applies the server's answer to `pending`, unless something newer has
    /// happened since it was started.
    pub fn finish_send(&mut self, pending: PendingSend, result: Result<String, ApiError>) -> SendOutcome {
        if pending.seq != self.latest_seq {
            debug!(
                "Discarding stale reply (seq {}, latest {}) for chat {}",
                pending.seq,
                self.latest_seq,
                self.chat_id
            );
            return SendOutcome::Stale;
        }

        self.remove_typing();
        match result {
            Ok(reply) => {
                self.transcript.push(ChatMessage::assistant(reply.clone()));
                self.view.push(ViewEntry::bot(reply.clone()));
                SendOutcome::Replied(reply)
            }
            Err(e) => {
                error!("Chat request failed for chat {}: {}", self.chat_id, e);
                self.view.push(ViewEntry::bot(self.fallback_reply.clone()));
                if e.is_unauthorized() {
                    SendOutcome::Unauthorized
                } else {
                    SendOutcome::Failed(e)
                }
            }
        }
    }

    /// Replaces the transcript and chat id wholesale. Malformed data is
    /// rejected without touching the session.
    pub fn load_chat(&mut self, data: Option<&JsonValue>) -> Result<(), SessionError> {
        let conversation = data
            .ok_or_else(|| "no chat data".to_string())
            .and_then(Conversation::from_value)
            .map_err(|reason| {
                error!("Invalid chat data provided to load_chat: {}", reason);
                SessionError::MalformedConversation(reason)
            })?;

        self.chat_id = conversation.chat_id;
        self.transcript = conversation.messages;
        let view = render_transcript(&self.transcript);
        self.replace_view(view);
        self.history_open = false;
        self.latest_seq += 1;
        info!("Loaded chat with ID: {}", self.chat_id);
        Ok(())
    }

    pub fn save_request(&self) -> Result<SaveChatRequest, SessionError> {
        if self.transcript.is_empty() {
            return Err(SessionError::NothingToSave);
        }
        Ok(SaveChatRequest {
            user_id: Some(self.user_id.clone()),
            chat_id: Some(self.chat_id.clone()),
            history: self.transcript.clone(),
        })
    }

    fn replace_view(&mut self, view: Vec<ViewEntry>) {
        self.view = view;
        self.view_generation += 1;
    }

    fn remove_typing(&mut self) {
        self.view.retain(|entry| !entry.pending);
    }
}
