//! One caller's conversation

use super::history::ConversationHistory;
use crate::types::Turn;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Conversation state owned by the caller. A query borrows it mutably, so a
/// session has at most one query in flight.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub history: ConversationHistory,
    pub started_at: DateTime<Utc>,
}

impl Session {
    pub fn new(history_turns: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            history: ConversationHistory::new(history_turns),
            started_at: Utc::now(),
        }
    }

    pub fn record(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        self.history.push(Turn::new(user, assistant));
    }

    pub fn short_id(&self) -> String {
        self.id.to_string()[..8].to_string()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(super::history::DEFAULT_HISTORY_TURNS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sessions_are_distinct() {
        let a = Session::default();
        let b = Session::default();
        assert_ne!(a.id, b.id);
        assert_eq!(a.short_id().len(), 8);
    }

    #[test]
    fn test_record_respects_window() {
        let mut session = Session::new(1);
        session.record("q1", "a1");
        session.record("q2", "a2");
        assert_eq!(session.history.len(), 1);
        assert_eq!(session.history.last().unwrap().user, "q2");
    }
}
