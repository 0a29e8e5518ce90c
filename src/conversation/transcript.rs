//! Plain-text transcripts of what was asked and answered
//!
//! Layout under the transcript directory:
//! - `input/<session>_<timestamp>.txt`
//! - `output/<session>_<timestamp>.txt`

use crate::errors::Result;
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct TranscriptLog {
    dir: PathBuf,
}

impl TranscriptLog {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(dir.join("input"))?;
        fs::create_dir_all(dir.join("output"))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn record_input(&self, session: &str, text: &str) -> Result<PathBuf> {
        self.write("input", session, text)
    }

    pub fn record_output(&self, session: &str, text: &str) -> Result<PathBuf> {
        self.write("output", session, text)
    }

    fn write(&self, kind: &str, session: &str, text: &str) -> Result<PathBuf> {
        let stamp = Utc::now().format("%Y%m%d_%H%M%S%.3f");
        let path = self.dir.join(kind).join(format!("{}_{}.txt", session, stamp));
        fs::write(&path, text)?;
        tracing::debug!("wrote {} transcript {}", kind, path.display());
        Ok(path)
    }
}
