//! File-based registry — append-only JSON-lines log with an in-memory index.
//!
//! Each line is one JSON-encoded `DeploymentRecord`. The log is loaded once
//! on open; afterwards every append writes a single line and syncs it before
//! the index is updated. The duplicate check and the write happen under one
//! lock, so two concurrent appends for the same token can never both land.
//! `reserve` checks the index and the pending claims under that same lock.
//!
//! Storage location: `~/.suiforge/data/tokens.jsonl`

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use suiforge_core::deployment::{DeploymentRecord, TokenKey};
use suiforge_core::error::RegistryError;
use suiforge_core::registry::{PendingClaims, RecordFilter, Reservation, TokenRegistry};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::jsonl::JsonlFile;

struct Log {
    file: JsonlFile,
    records: Vec<DeploymentRecord>,
    index: HashMap<TokenKey, usize>,
}

impl Log {
    fn insert(&mut self, record: DeploymentRecord) {
        self.index.insert(record.token_key(), self.records.len());
        self.records.push(record);
    }
}

/// A durable [`TokenRegistry`] backed by a JSONL file.
pub struct FileRegistry {
    path: PathBuf,
    log: Mutex<Log>,
    pending: Arc<PendingClaims>,
}

impl FileRegistry {
    /// Open the registry at `path`, loading existing records.
    ///
    /// A missing file starts empty; it is created on first append. Corrupted
    /// lines are skipped, and if the file somehow holds two records for one
    /// token the first one wins.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, RegistryError> {
        let path = path.into();
        let (file, loaded) = JsonlFile::open::<DeploymentRecord>(&path, "deployment record")?;

        let mut log = Log {
            file,
            records: Vec::with_capacity(loaded.len()),
            index: HashMap::with_capacity(loaded.len()),
        };
        for record in loaded {
            let key = record.token_key();
            if log.index.contains_key(&key) {
                warn!(token = %key, "Ignoring repeated deployment record");
                continue;
            }
            log.insert(record);
        }

        debug!(path = %path.display(), count = log.records.len(), "File registry loaded");
        Ok(Self {
            path,
            log: Mutex::new(log),
            pending: PendingClaims::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TokenRegistry for FileRegistry {
    fn name(&self) -> &str {
        "file"
    }

    async fn find(&self, key: &TokenKey) -> Result<Option<DeploymentRecord>, RegistryError> {
        let log = self.log.lock().await;
        Ok(log.index.get(key).map(|&i| log.records[i].clone()))
    }

    async fn reserve(&self, key: &TokenKey) -> Result<Reservation, RegistryError> {
        let log = self.log.lock().await;
        if log.index.contains_key(key) {
            return Err(RegistryError::duplicate(key));
        }
        self.pending
            .claim(key)
            .ok_or_else(|| RegistryError::in_flight(key))
    }

    async fn append(&self, record: DeploymentRecord) -> Result<(), RegistryError> {
        let key = record.token_key();
        let mut log = self.log.lock().await;

        if log.index.contains_key(&key) {
            return Err(RegistryError::duplicate(&key));
        }

        log.file.append(&record).await?;
        log.insert(record);

        debug!(token = %key, "Deployment record appended");
        Ok(())
    }

    async fn query(&self, filter: &RecordFilter) -> Result<Vec<DeploymentRecord>, RegistryError> {
        let log = self.log.lock().await;
        Ok(log
            .records
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect())
    }

    async fn count(&self) -> Result<usize, RegistryError> {
        Ok(self.log.lock().await.records.len())
    }
}
