//! Shared, atomically replaceable knowledge base

use super::knowledge::KnowledgeBase;
use crate::errors::{RagError, Result};
use std::path::Path;
use std::sync::{Arc, RwLock};

/// The knowledge base queries read from.
///
/// Publishing swaps the whole `Arc`; a query holding the previous one keeps
/// using it undisturbed.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeHandle {
    current: Arc<RwLock<Option<Arc<KnowledgeBase>>>>,
}

impl KnowledgeHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(knowledge: KnowledgeBase) -> Self {
        let handle = Self::new();
        handle.publish(knowledge);
        handle
    }

    /// Make `knowledge` the one every later query sees
    pub fn publish(&self, knowledge: KnowledgeBase) {
        let next = Arc::new(knowledge);
        let mut slot = self.current.write().unwrap_or_else(|p| p.into_inner());
        *slot = Some(next);
    }

    /// Load from disk and publish only if the file is valid
    pub fn load_from(&self, path: &Path) -> Result<()> {
        let knowledge = KnowledgeBase::load(path)?;
        self.publish(knowledge);
        Ok(())
    }

    pub fn current(&self) -> Result<Arc<KnowledgeBase>> {
        self.current
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
            .ok_or(RagError::KnowledgeBaseUnavailable)
    }

    pub fn is_available(&self) -> bool {
        self.current().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Passage;
    use tempfile::TempDir;

    fn kb(text: &str) -> KnowledgeBase {
        KnowledgeBase::new(vec![Passage::new(0, text)], &[vec![1.0, 0.0]], None).unwrap()
    }

    #[test]
    fn test_empty_handle_is_unavailable() {
        let handle = KnowledgeHandle::new();
        assert!(!handle.is_available());
        assert!(matches!(handle.current(), Err(RagError::KnowledgeBaseUnavailable)));
    }

    #[test]
    fn test_publish_swaps_without_disturbing_readers() {
        let handle = KnowledgeHandle::with(kb("first"));
        let held = handle.current().unwrap();

        handle.publish(kb("second"));
        assert_eq!(held.passages().get(0).unwrap().text, "first");
        assert_eq!(handle.current().unwrap().passages().get(0).unwrap().text, "second");
    }

    #[test]
    fn test_failed_load_keeps_previous() {
        let dir = TempDir::new().unwrap();
        let bad = dir.path().join("broken.json");
        std::fs::write(&bad, "{}").unwrap();

        let handle = KnowledgeHandle::with(kb("kept"));
        assert!(handle.load_from(&bad).is_err());
        assert_eq!(handle.current().unwrap().passages().get(0).unwrap().text, "kept");
    }
}
