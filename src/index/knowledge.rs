//! Knowledge base: vector index and passage store, saved as one file
//!
//! On disk the knowledge base is a single JSON container:
//!
//! ```json
//! { "format": "docbuddy-knowledge", "version": 1, "dimension": 768, "count": 42,
//!   "checksum": "<sha256 hex>", "created_at": "...", "source": "book.pdf",
//!   "passages": [...], "vectors": [[...], ...] }
//! ```
//!
//! Saves go through a temp file in the target directory and an atomic rename,
//! so readers never see half a file. Loads validate everything before
//! returning.

use super::store::PassageStore;
use super::vectors::VectorIndex;
use crate::errors::{RagError, Result};
use crate::types::{Passage, ScoredPassage, Vector};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Write;
use std::path::Path;

pub const FORMAT: &str = "docbuddy-knowledge";
pub const VERSION: u32 = 1;

/// Searchable knowledge over one document
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    index: VectorIndex,
    store: PassageStore,
    created_at: DateTime<Utc>,
    source: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct KnowledgeFile {
    format: String,
    version: u32,
    dimension: usize,
    count: usize,
    checksum: String,
    created_at: DateTime<Utc>,
    #[serde(default)]
    source: Option<String>,
    passages: Vec<Passage>,
    vectors: Vec<Vector>,
}

impl KnowledgeBase {
    /// Pair passages with their vectors. Passage ids become row numbers.
    pub fn new(passages: Vec<Passage>, vectors: &[Vector], source: Option<String>) -> Result<Self> {
        if passages.len() != vectors.len() {
            return Err(RagError::Persistence(format!(
                "{} passages but {} vectors",
                passages.len(),
                vectors.len()
            )));
        }

        let index = VectorIndex::build(vectors)?;
        let store = PassageStore::new(passages);

        Ok(Self {
            index,
            store,
            created_at: Utc::now(),
            source,
        })
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.index.dimension()
    }

    pub fn passages(&self) -> &PassageStore {
        &self.store
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Nearest passages to `query`, ascending by distance
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredPassage>> {
        let hits = self.index.search(query, k)?;
        hits.into_iter()
            .map(|(row, distance)| {
                self.store
                    .get(row)
                    .map(|passage| ScoredPassage {
                        passage: passage.clone(),
                        distance,
                    })
                    .ok_or_else(|| RagError::Persistence(format!("index row {} has no passage", row)))
            })
            .collect()
    }

    /// SHA-256 over dimension, count, passage texts and vector bytes
    pub fn checksum(&self) -> String {
        let vectors: Vec<&[f32]> = self.index.rows().collect();
        compute_checksum(self.dimension(), self.store.as_slice(), &vectors)
    }

    /// Write atomically to `path`
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = KnowledgeFile {
            format: FORMAT.to_string(),
            version: VERSION,
            dimension: self.dimension(),
            count: self.len(),
            checksum: self.checksum(),
            created_at: self.created_at,
            source: self.source.clone(),
            passages: self.store.as_slice().to_vec(),
            vectors: self.index.rows().map(<[f32]>::to_vec).collect(),
        };
        let json = serde_json::to_vec(&file)
            .map_err(|e| RagError::Persistence(format!("Failed to encode knowledge base: {}", e)))?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let write_err =
            |e: std::io::Error| RagError::Persistence(format!("Failed to write {}: {}", path.display(), e));

        fs::create_dir_all(dir).map_err(write_err)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
        tmp.write_all(&json).map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;
        tmp.persist(path)
            .map_err(|e| RagError::Persistence(format!("Failed to replace {}: {}", path.display(), e)))?;

        tracing::info!(
            "saved knowledge base ({} passages, dim {}) to {}",
            self.len(),
            self.dimension(),
            path.display()
        );
        Ok(())
    }

    /// Read and fully validate a saved knowledge base
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)
            .map_err(|e| RagError::Persistence(format!("Failed to read {}: {}", path.display(), e)))?;
        let file: KnowledgeFile = serde_json::from_slice(&bytes)
            .map_err(|e| RagError::Persistence(format!("Failed to parse {}: {}", path.display(), e)))?;

        if file.format != FORMAT {
            return Err(RagError::Persistence(format!("unknown format '{}'", file.format)));
        }
        if file.version != VERSION {
            return Err(RagError::Persistence(format!(
                "unsupported version {} (expected {})",
                file.version, VERSION
            )));
        }
        if file.passages.len() != file.count || file.vectors.len() != file.count {
            return Err(RagError::Persistence(format!(
                "count {} disagrees with {} passages and {} vectors",
                file.count,
                file.passages.len(),
                file.vectors.len()
            )));
        }
        if let Some(bad) = file.vectors.iter().find(|v| v.len() != file.dimension) {
            return Err(RagError::Persistence(format!(
                "vector of length {} in a dimension {} knowledge base",
                bad.len(),
                file.dimension
            )));
        }
        if file.passages.iter().enumerate().any(|(i, p)| p.id != i) {
            return Err(RagError::Persistence("passage ids out of order".to_string()));
        }

        let rows: Vec<&[f32]> = file.vectors.iter().map(Vec::as_slice).collect();
        let checksum = compute_checksum(file.dimension, &file.passages, &rows);
        if checksum != file.checksum {
            return Err(RagError::Persistence("checksum mismatch".to_string()));
        }

        let index = VectorIndex::build(&file.vectors)
            .map_err(|e| RagError::Persistence(e.to_string()))?;

        tracing::debug!("loaded knowledge base with {} passages from {}", file.count, path.display());

        Ok(Self {
            index,
            store: PassageStore::new(file.passages),
            created_at: file.created_at,
            source: file.source,
        })
    }
}

fn compute_checksum(dimension: usize, passages: &[Passage], vectors: &[&[f32]]) -> String {
    let mut hasher = Sha256::new();
    hasher.update((dimension as u64).to_le_bytes());
    hasher.update((passages.len() as u64).to_le_bytes());
    for passage in passages {
        hasher.update((passage.text.len() as u64).to_le_bytes());
        hasher.update(passage.text.as_bytes());
    }
    for row in vectors {
        for x in row.iter() {
            hasher.update(x.to_le_bytes());
        }
    }
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> KnowledgeBase {
        let passages = vec![
            Passage::new(0, "Photosynthesis converts light into chemical energy."),
            Passage::new(1, "Mitochondria are the powerhouse of the cell."),
            Passage::new(2, "The water cycle moves water through the biosphere."),
        ];
        let vectors = vec![vec![0.1, 0.2, 0.3], vec![0.9, 0.8, 0.7], vec![0.4, 0.4, 0.4]];
        KnowledgeBase::new(passages, &vectors, Some("biology.txt".to_string())).unwrap()
    }

    #[test]
    fn test_alignment_enforced() {
        let result = KnowledgeBase::new(vec![Passage::new(0, "only one")], &[vec![1.0], vec![2.0]], None);
        assert!(matches!(result, Err(RagError::Persistence(_))));
    }

    #[test]
    fn test_search_returns_passages() {
        let kb = sample();
        let hits = kb.search(&[0.9, 0.8, 0.7], 2).unwrap();
        assert_eq!(hits[0].passage.id, 1);
        assert_eq!(hits[0].distance, 0.0);
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn test_save_and_reload_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kb").join("knowledge.json");
        let kb = sample();
        kb.save(&path).unwrap();

        let loaded = KnowledgeBase::load(&path).unwrap();
        assert_eq!(loaded.len(), kb.len());
        assert_eq!(loaded.dimension(), 3);
        assert_eq!(loaded.checksum(), kb.checksum());
        assert_eq!(loaded.source(), Some("biology.txt"));

        let query = [0.3, 0.3, 0.35];
        assert_eq!(loaded.search(&query, 3).unwrap(), kb.search(&query, 3).unwrap());
    }

    #[test]
    fn test_tampered_file_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("knowledge.json");
        sample().save(&path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        fs::write(&path, content.replace("powerhouse", "warehouse")).unwrap();

        assert!(matches!(KnowledgeBase::load(&path), Err(RagError::Persistence(_))));
    }

    #[test]
    fn test_count_mismatch_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("knowledge.json");
        sample().save(&path).unwrap();

        let mut value: serde_json::Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        value["count"] = serde_json::json!(5);
        fs::write(&path, serde_json::to_vec(&value).unwrap()).unwrap();

        assert!(matches!(KnowledgeBase::load(&path), Err(RagError::Persistence(_))));
    }

    #[test]
    fn test_missing_and_garbage_files() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            KnowledgeBase::load(&dir.path().join("absent.json")),
            Err(RagError::Persistence(_))
        ));

        let path = dir.path().join("garbage.json");
        fs::write(&path, b"\x00\x01 not json").unwrap();
        assert!(matches!(KnowledgeBase::load(&path), Err(RagError::Persistence(_))));
    }

    #[test]
    fn test_save_replaces_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("knowledge.json");
        fs::write(&path, "old").unwrap();

        sample().save(&path).unwrap();
        assert_eq!(KnowledgeBase::load(&path).unwrap().len(), 3);
        // no temp files left behind
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_save_failure_is_persistence_error() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "a file, not a directory").unwrap();

        let result = sample().save(&blocker.join("knowledge.json"));
        assert!(matches!(result, Err(RagError::Persistence(_))));
    }
}
