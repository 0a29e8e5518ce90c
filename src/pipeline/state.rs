//! Per-query state machine
//!
//! Valid transitions:
//! 1.  Received        → QueryTranslated  (on: TranslateQuery)
//! 2.  Received        → Embedded         (on: Embed)
//! 3.  QueryTranslated → Embedded         (on: Embed)
//! 4.  Embedded        → Retrieved        (on: Retrieve)
//! 5.  Retrieved       → Grounded         (on: Relevant)
//! 6.  Retrieved       → Refused          (on: Irrelevant)
//! 7.  Grounded        → Generated        (on: Generate)
//! 8.  Generated       → AnswerTranslated (on: TranslateAnswer)
//! 9.  Refused         → AnswerTranslated (on: TranslateAnswer)
//! 10. Generated | Refused | AnswerTranslated → Delivered (on: Deliver)
//! 11. Received | QueryTranslated | Embedded  → Unavailable (on: NoKnowledge)
//! 12. any non-terminal → Failed (on: Fail)
//!
//! Delivered, Failed and Unavailable are terminal and accept no events.

use crate::errors::{RagError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueryState {
    Received,
    QueryTranslated,
    Embedded,
    Retrieved,
    Grounded,
    Refused,
    Generated,
    AnswerTranslated,
    Delivered,
    Failed,
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryEvent {
    TranslateQuery,
    Embed,
    Retrieve,
    Relevant,
    Irrelevant,
    Generate,
    TranslateAnswer,
    Deliver,
    NoKnowledge,
    Fail,
}

impl QueryState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            QueryState::Delivered | QueryState::Failed | QueryState::Unavailable
        )
    }

    pub fn transition(&self, event: QueryEvent) -> Result<QueryState> {
        use QueryEvent::*;
        use QueryState::*;

        let next = match (*self, event) {
            (Received, TranslateQuery) => QueryTranslated,
            (Received | QueryTranslated, Embed) => Embedded,
            (Embedded, Retrieve) => Retrieved,
            (Retrieved, Relevant) => Grounded,
            (Retrieved, Irrelevant) => Refused,
            (Grounded, Generate) => Generated,
            (Generated | Refused, TranslateAnswer) => AnswerTranslated,
            (Generated | Refused | AnswerTranslated, Deliver) => Delivered,
            (Received | QueryTranslated | Embedded, NoKnowledge) => Unavailable,
            (state, Fail) if !state.is_terminal() => Failed,
            (from, event) => {
                return Err(RagError::InvalidTransition {
                    from: format!("{:?}", from),
                    event: format!("{:?}", event),
                })
            }
        };

        Ok(next)
    }
}

/// Current state plus every state visited, oldest first
#[derive(Debug, Clone, PartialEq)]
pub struct QueryTrace {
    trail: Vec<QueryState>,
}

impl Default for QueryTrace {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryTrace {
    pub fn new() -> Self {
        Self {
            trail: vec![QueryState::Received],
        }
    }

    pub fn state(&self) -> QueryState {
        self.trail
            .last()
            .copied()
            .unwrap_or(QueryState::Received)
    }

    pub fn advance(&mut self, event: QueryEvent) -> Result<QueryState> {
        let next = self.state().transition(event)?;
        self.trail.push(next);
        Ok(next)
    }

    pub fn trail(&self) -> &[QueryState] {
        &self.trail
    }

    pub fn into_trail(self) -> Vec<QueryState> {
        self.trail
    }
}
