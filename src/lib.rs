//! docbuddy - ask grounded questions about a document, in your own language
//!
//! Ingestion splits a document into heading-aware, token-bounded passages,
//! embeds them and saves a versioned knowledge base. Queries are answered by
//! retrieving the closest passages, refusing when nothing is relevant, and
//! asking a chat model to answer from that context, with translation on the
//! way in and out.

pub mod chunking;
pub mod cli;
pub mod config;
pub mod conversation;
pub mod embedding;
pub mod errors;
pub mod index;
pub mod logging;
pub mod pipeline;
pub mod providers;
pub mod repl;
pub mod retry;
pub mod types;

pub use config::Config;
pub use errors::{RagError, Result};
