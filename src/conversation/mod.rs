//! Conversation state and prompt construction

pub mod history;
pub mod prompt;
pub mod session;
pub mod transcript;

pub use history::ConversationHistory;
pub use prompt::PromptAssembler;
pub use session::Session;
pub use transcript::TranscriptLog;
