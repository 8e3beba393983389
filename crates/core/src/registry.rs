//! Registry trait — durable, queryable store of completed deployments.
//!
//! The registry is the cross-restart duplicate guard: `append` must perform
//! its duplicate check and its write as one atomic unit with respect to every
//! other writer. Within a process, `reserve` claims a key before any work is
//! done for it, so a second dispatch for the same token stops before it
//! publishes anything.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use crate::deployment::{DeploymentRecord, TokenKey};
use crate::error::RegistryError;

/// Which records a query returns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", content = "address", rename_all = "snake_case")]
pub enum RecordFilter {
    #[default]
    All,
    Creator(String),
    Deployer(String),
}

impl RecordFilter {
    pub fn matches(&self, record: &DeploymentRecord) -> bool {
        match self {
            RecordFilter::All => true,
            RecordFilter::Creator(addr) => &record.creator == addr,
            RecordFilter::Deployer(addr) => &record.deployer == addr,
        }
    }
}

/// Keys with a deployment in flight.
#[derive(Debug, Default)]
pub struct PendingClaims {
    keys: Mutex<HashSet<TokenKey>>,
}

impl PendingClaims {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Claim `key`, or `None` if a claim for it is already held.
    ///
    /// Registries call this while holding the lock that guards their index,
    /// so the recorded and pending checks form one step.
    pub fn claim(self: &Arc<Self>, key: &TokenKey) -> Option<Reservation> {
        let mut keys = self.keys.lock().unwrap_or_else(PoisonError::into_inner);
        if !keys.insert(key.clone()) {
            return None;
        }
        Some(Reservation {
            key: key.clone(),
            claims: Arc::clone(self),
        })
    }

    pub fn is_pending(&self, key: &TokenKey) -> bool {
        self.keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(key)
    }
}

/// An exclusive claim on a token key, released on drop.
///
/// Hold it until the record is appended: the registry index then covers the
/// key before the claim goes away.
#[derive(Debug)]
pub struct Reservation {
    key: TokenKey,
    claims: Arc<PendingClaims>,
}

impl Reservation {
    pub fn key(&self) -> &TokenKey {
        &self.key
    }
}

impl Drop for Reservation {
    fn drop(&mut self) {
        self.claims
            .keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

/// The core TokenRegistry trait.
///
/// Implementations: JSONL file log, in-memory (for testing).
#[async_trait]
pub trait TokenRegistry: Send + Sync {
    /// The backend name (e.g., "file", "in_memory").
    fn name(&self) -> &str;

    /// Look up the deployment for a token key.
    async fn find(&self, key: &TokenKey) -> std::result::Result<Option<DeploymentRecord>, RegistryError>;

    /// Claim `key` for a deployment about to start.
    ///
    /// Fails with [`RegistryError::Duplicate`] if the key is recorded, and
    /// with [`RegistryError::InFlight`] if another claim on it is held.
    async fn reserve(&self, key: &TokenKey) -> std::result::Result<Reservation, RegistryError>;

    /// Append a record; fails with [`RegistryError::Duplicate`] if its key exists.
    async fn append(&self, record: DeploymentRecord) -> std::result::Result<(), RegistryError>;

    /// Records matching `filter`, in append order.
    async fn query(&self, filter: &RecordFilter) -> std::result::Result<Vec<DeploymentRecord>, RegistryError>;

    /// Total record count.
    async fn count(&self) -> std::result::Result<usize, RegistryError>;
}
