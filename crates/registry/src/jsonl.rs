//! JSON-lines helpers shared by the registry and the dead-letter log.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use suiforge_core::error::RegistryError;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::warn;

/// An append-only JSONL file and the state of its last line.
pub(crate) struct JsonlFile {
    path: PathBuf,
    /// The file may end mid-line (an interrupted write); the next append
    /// must start on a fresh line.
    torn_tail: bool,
}

impl JsonlFile {
    /// Open `path` and load every parseable line. A missing file is empty.
    pub fn open<T: DeserializeOwned>(
        path: impl Into<PathBuf>,
        what: &str,
    ) -> Result<(Self, Vec<T>), RegistryError> {
        let path = path.into();
        let content = read(&path)?;
        let entries = parse(&path, &content, what);
        let file = Self {
            torn_tail: !content.is_empty() && !content.ends_with('\n'),
            path,
        };
        Ok((file, entries))
    }

    /// Every parseable line currently on disk.
    pub fn entries<T: DeserializeOwned>(&self, what: &str) -> Result<Vec<T>, RegistryError> {
        Ok(parse(&self.path, &read(&self.path)?, what))
    }

    /// Append one JSON line and flush it to stable storage.
    pub async fn append<T: Serialize>(&mut self, entry: &T) -> Result<(), RegistryError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| RegistryError::Storage(format!("Failed to create {}: {e}", parent.display())))?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| self.storage(e))?;
        self.append_to(&mut file, entry).await?;

        if let Err(e) = file.sync_data().await {
            self.torn_tail = true;
            return Err(self.storage(e));
        }
        Ok(())
    }

    /// Write one line to `writer`. Any write error leaves the tail marked
    /// torn, since part of the line may already be on disk.
    async fn append_to<W, T>(&mut self, writer: &mut W, entry: &T) -> Result<(), RegistryError>
    where
        W: AsyncWrite + Unpin,
        T: Serialize,
    {
        let mut line = serde_json::to_string(entry).map_err(|e| RegistryError::Serialization(e.to_string()))?;
        line.push('\n');
        if self.torn_tail {
            line.insert(0, '\n');
        }

        let written = match writer.write_all(line.as_bytes()).await {
            Ok(()) => writer.flush().await,
            Err(e) => Err(e),
        };
        match written {
            Ok(()) => {
                self.torn_tail = false;
                Ok(())
            }
            Err(e) => {
                self.torn_tail = true;
                Err(self.storage(e))
            }
        }
    }

    fn storage(&self, e: std::io::Error) -> RegistryError {
        RegistryError::Storage(format!("Failed to write {}: {e}", self.path.display()))
    }
}

fn read(path: &Path) -> Result<String, RegistryError> {
    match std::fs::read_to_string(path) {
        Ok(c) => Ok(c),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(RegistryError::Storage(format!(
            "Failed to read {}: {e}",
            path.display()
        ))),
    }
}

fn parse<T: DeserializeOwned>(path: &Path, content: &str, what: &str) -> Vec<T> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .filter_map(|(number, line)| match serde_json::from_str::<T>(line) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(path = %path.display(), line = number + 1, error = %e, "Skipping corrupted {what}");
                None
            }
        })
        .collect()
}
