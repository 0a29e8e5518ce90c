//! Query answering and document ingestion

pub mod assistant;
pub mod ingest;
pub mod language;
pub mod refusal;
pub mod state;

pub use assistant::{AnswerSettings, Assistant, Input, Outcome, Reply};
pub use ingest::{IngestReport, Ingestor};
pub use language::{is_code_mixed, Language, LanguageClassifier, TranslationPlan};
pub use state::{QueryEvent, QueryState, QueryTrace};
