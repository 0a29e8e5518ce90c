//! Type definitions module
//!
//! Core types shared by ingestion, retrieval and conversation.

pub mod messages;
pub mod passage;

// Re-export commonly used types
pub use messages::{ChatMessage, Role, Turn};
pub use passage::{Passage, ScoredPassage, SourceSpan, Vector};
