//! Vector index, passage store and the knowledge base built from them

pub mod handle;
pub mod knowledge;
pub mod retriever;
pub mod store;
pub mod vectors;

pub use handle::KnowledgeHandle;
pub use knowledge::KnowledgeBase;
pub use retriever::{apply_gate, Retrieval, Retriever};
pub use store::PassageStore;
pub use vectors::VectorIndex;
