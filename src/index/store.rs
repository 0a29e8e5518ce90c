//! Ordered passage storage

use crate::types::Passage;

/// Passages in index order; `passages[i].id == i`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PassageStore {
    passages: Vec<Passage>,
}

impl PassageStore {
    /// Take ownership of passages, renumbering ids to their positions
    pub fn new(mut passages: Vec<Passage>) -> Self {
        for (i, passage) in passages.iter_mut().enumerate() {
            passage.id = i;
        }
        Self { passages }
    }

    pub fn get(&self, id: usize) -> Option<&Passage> {
        self.passages.get(id)
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Passage> {
        self.passages.iter()
    }

    pub fn as_slice(&self) -> &[Passage] {
        &self.passages
    }
}
