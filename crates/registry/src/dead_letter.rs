//! Dead-letter log — dispatches that failed and were dropped.
//!
//! Nothing replays these automatically; the log exists so an operator can
//! see what was lost and why.

use std::path::{Path, PathBuf};
use suiforge_core::deployment::DeadLetter;
use suiforge_core::error::RegistryError;
use tokio::sync::Mutex;
use tracing::debug;

use crate::jsonl::JsonlFile;

/// Append-only JSONL file of [`DeadLetter`] entries.
pub struct DeadLetterLog {
    path: PathBuf,
    file: Mutex<JsonlFile>,
}

impl DeadLetterLog {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, RegistryError> {
        let path = path.into();
        let (file, loaded) = JsonlFile::open::<DeadLetter>(&path, "dead letter")?;
        debug!(path = %path.display(), count = loaded.len(), "Dead-letter log opened");
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn append(&self, letter: &DeadLetter) -> Result<(), RegistryError> {
        self.file.lock().await.append(letter).await
    }

    /// Every entry currently on disk, oldest first.
    pub async fn entries(&self) -> Result<Vec<DeadLetter>, RegistryError> {
        self.file.lock().await.entries("dead letter")
    }
}
