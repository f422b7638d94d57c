use chrono::{ DateTime, Local, NaiveDateTime, Utc };
use serde_json::Value as JsonValue;
use std::fmt;
use crate::config::SUMMARY_TITLE_CHARS;
use crate::models::chat::{ ChatMessage, Role };

pub const TYPING_INDICATOR: &str = "...";
const UNTITLED: &str = "(untitled)";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Speaker {
    User,
    Bot,
}

/// One line of the rendered message list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewEntry {
    pub speaker: Speaker,
    pub text: String,
    /// Set on the typing indicator while a reply is outstanding.
    pub pending: bool,
}

impl ViewEntry {
    pub fn user(text: impl Into<String>) -> Self {
        Self { speaker: Speaker::User, text: text.into(), pending: false }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self { speaker: Speaker::Bot, text: text.into(), pending: false }
    }

    pub fn typing() -> Self {
        Self { speaker: Speaker::Bot, text: TYPING_INDICATOR.to_string(), pending: true }
    }
}

impl fmt::Display for ViewEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.speaker {
            Speaker::User => write!(f, "user: {}", self.text),
            Speaker::Bot => write!(f, "bot: {}", self.text),
        }
    }
}

impl From<&ChatMessage> for ViewEntry {
    fn from(msg: &ChatMessage) -> Self {
        match msg.role {
            Role::User => ViewEntry::user(msg.content.clone()),
            Role::Assistant => ViewEntry::bot(msg.content.clone()),
        }
    }
}

pub fn render_transcript(messages: &[ChatMessage]) -> Vec<ViewEntry> {
    messages.iter().map(ViewEntry::from).collect()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConversationSummary {
    pub title: String,
    pub saved_at: String,
}

impl fmt::Display for ConversationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Saved: {})", self.title, self.saved_at)
    }
}

/// A `/get-conversations` entry. `raw` is what gets handed to `load_chat`.
#[derive(Clone, Debug)]
pub struct SavedConversation {
    pub raw: JsonValue,
    pub summary: ConversationSummary,
}

impl SavedConversation {
    pub fn new(raw: JsonValue) -> Self {
        let summary = summarize(&raw);
        Self { raw, summary }
    }
}

/// Lenient: never fails, whatever shape the entry has.
pub fn summarize(conversation: &JsonValue) -> ConversationSummary {
    let first_user = conversation
        .get("messages")
        .and_then(|m| m.as_array())
        .and_then(|messages| {
            messages
                .iter()
                .find(|m| m.get("role").and_then(|r| r.as_str()) == Some("user"))
                .and_then(|m| m.get("content"))
                .and_then(|c| c.as_str())
        });

    ConversationSummary {
        title: truncate_title(first_user.unwrap_or(UNTITLED), SUMMARY_TITLE_CHARS),
        saved_at: format_saved_at(conversation.get("saved_at")),
    }
}

pub fn truncate_title(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

fn parse_saved_at(raw: &JsonValue) -> Option<DateTime<Utc>> {
    match raw {
        JsonValue::String(s) => {
            DateTime::parse_from_rfc3339(s)
                .or_else(|_| DateTime::parse_from_rfc2822(s))
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
                .or_else(|| {
                    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                        .ok()
                        .map(|naive| naive.and_utc())
                })
        }
        // JavaScript-style epoch milliseconds
        JsonValue::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

/// Renders `saved_at` in local time. Unparseable strings are shown as sent.
pub fn format_saved_at(raw: Option<&JsonValue>) -> String {
    let Some(raw) = raw else {
        return "unknown".to_string();
    };
    match parse_saved_at(raw) {
        Some(dt) => dt.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string(),
        None =>
            match raw.as_str() {
                Some(s) => s.to_string(),
                None => "unknown".to_string(),
            }
    }
}
