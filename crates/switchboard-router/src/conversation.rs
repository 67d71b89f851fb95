//! Conversation state for the active chat session

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Which side of the conversation produced an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Agent,
}

/// One recorded turn.
#[derive(Debug, Clone, Serialize)]
pub struct TurnEntry {
    pub speaker: Speaker,
    pub text: String,
    pub at: DateTime<Utc>,
}

/// In-memory history of the single active session.
///
/// The session id is minted once and reused for every task sent during
/// the router's lifetime, so remote agents can correlate turns. History
/// is append-only until [`ConversationState::clear`] wipes it at
/// shutdown.
#[derive(Debug)]
pub struct ConversationState {
    session_id: String,
    entries: Vec<TurnEntry>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            entries: Vec::new(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn record_user(&mut self, text: &str) {
        self.push(Speaker::User, text);
    }

    pub fn record_agent(&mut self, text: &str) {
        self.push(Speaker::Agent, text);
    }

    fn push(&mut self, speaker: Speaker, text: &str) {
        self.entries.push(TurnEntry {
            speaker,
            text: text.to_string(),
            at: Utc::now(),
        });
    }

    pub fn entries(&self) -> &[TurnEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::new()
    }
}
