//! Small on-disk store that remembers reading progress per document.
//!
//! Entries live under the configured cache directory using a hash of the
//! document URL as the directory name, so arbitrary URLs never leak into
//! filesystem paths. Each entry is a tiny TOML file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const PROGRESS_FILE: &str = "progress.toml";

/// Last known position and bookmark for a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedProgress {
    pub last_page: u32,
    pub is_bookmarked: bool,
    pub bookmark_page: u32,
}

#[derive(Debug, Clone)]
pub struct ProgressStore {
    root: PathBuf,
}

impl ProgressStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn hash_dir(&self, document_url: &str) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(document_url.as_bytes());
        let hash = format!("{:x}", hasher.finalize());
        self.root.join(hash)
    }

    /// Load the saved progress for a document, if present and readable.
    pub fn load(&self, document_url: &str) -> Option<SavedProgress> {
        let path = self.hash_dir(document_url).join(PROGRESS_FILE);
        let data = fs::read_to_string(&path).ok()?;
        match toml::from_str(&data) {
            Ok(progress) => Some(progress),
            Err(err) => {
                debug!(path = %path.display(), "Ignoring unreadable progress entry: {err}");
                None
            }
        }
    }

    pub fn save(&self, document_url: &str, progress: &SavedProgress) -> Result<()> {
        let dir = self.hash_dir(document_url);
        fs::create_dir_all(&dir)
            .with_context(|| format!("creating cache dir {}", dir.display()))?;
        let contents = toml::to_string(progress).context("serializing progress entry")?;
        let path = dir.join(PROGRESS_FILE);
        fs::write(&path, contents).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    pub fn clear(&self, document_url: &str) -> Result<()> {
        let path = self.hash_dir(document_url).join(PROGRESS_FILE);
        if path.exists() {
            fs::remove_file(&path).with_context(|| format!("removing {}", path.display()))?;
        }
        Ok(())
    }
}
