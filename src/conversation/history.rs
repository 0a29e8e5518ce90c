//! Bounded conversation history

use crate::types::Turn;
use std::collections::VecDeque;

/// Default number of turns replayed into a prompt
pub const DEFAULT_HISTORY_TURNS: usize = 5;

/// FIFO of the most recent turns, never longer than its capacity
#[derive(Debug, Clone)]
pub struct ConversationHistory {
    turns: VecDeque<Turn>,
    capacity: usize,
}

impl Default for ConversationHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_TURNS)
    }
}

impl ConversationHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            turns: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a turn, evicting the oldest when full
    pub fn push(&mut self, turn: Turn) {
        if self.turns.len() >= self.capacity {
            self.turns.pop_front();
        }
        self.turns.push_back(turn);
    }

    /// Oldest first
    pub fn iter(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.back()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    #[test]
    fn test_evicts_oldest() {
        let mut history = ConversationHistory::new(2);
        history.push(Turn::new("q1", "a1"));
        history.push(Turn::new("q2", "a2"));
        history.push(Turn::new("q3", "a3"));

        let users: Vec<&str> = history.iter().map(|t| t.user.as_str()).collect();
        assert_eq!(users, vec!["q2", "q3"]);
        assert_eq!(history.last().unwrap().assistant, "a3");
    }

    #[test]
    fn test_clear() {
        let mut history = ConversationHistory::default();
        history.push(Turn::new("q", "a"));
        history.clear();
        assert!(history.is_empty());
        assert_eq!(history.capacity(), DEFAULT_HISTORY_TURNS);
    }

    #[quickcheck]
    fn prop_history_never_exceeds_capacity(capacity: u8, pushes: u8) -> bool {
        let capacity = (capacity % 10) as usize + 1;
        let mut history = ConversationHistory::new(capacity);

        for i in 0..pushes {
            history.push(Turn::new(format!("q{}", i), format!("a{}", i)));
            if history.len() > capacity {
                return false;
            }
        }

        // the newest turn is always the last one pushed
        pushes == 0 || history.last().map(|t| t.user.clone()) == Some(format!("q{}", pushes - 1))
    }
}
