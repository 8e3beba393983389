//! In-memory registry — useful for testing and dry runs.

use async_trait::async_trait;
use std::sync::Arc;
use suiforge_core::deployment::{DeploymentRecord, TokenKey};
use suiforge_core::error::RegistryError;
use suiforge_core::registry::{PendingClaims, RecordFilter, Reservation, TokenRegistry};
use tokio::sync::RwLock;

/// A registry that keeps records in a Vec. Nothing survives the process.
pub struct InMemoryRegistry {
    records: Arc<RwLock<Vec<DeploymentRecord>>>,
    pending: Arc<PendingClaims>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(Vec::new())),
            pending: PendingClaims::new(),
        }
    }
}

impl Default for InMemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenRegistry for InMemoryRegistry {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn find(&self, key: &TokenKey) -> Result<Option<DeploymentRecord>, RegistryError> {
        let records = self.records.read().await;
        Ok(records.iter().find(|r| &r.token_key() == key).cloned())
    }

    async fn reserve(&self, key: &TokenKey) -> Result<Reservation, RegistryError> {
        let records = self.records.write().await;
        if records.iter().any(|r| &r.token_key() == key) {
            return Err(RegistryError::duplicate(key));
        }
        self.pending
            .claim(key)
            .ok_or_else(|| RegistryError::in_flight(key))
    }

    async fn append(&self, record: DeploymentRecord) -> Result<(), RegistryError> {
        let key = record.token_key();
        let mut records = self.records.write().await;
        if records.iter().any(|r| r.token_key() == key) {
            return Err(RegistryError::duplicate(&key));
        }
        records.push(record);
        Ok(())
    }

    async fn query(&self, filter: &RecordFilter) -> Result<Vec<DeploymentRecord>, RegistryError> {
        let records = self.records.read().await;
        Ok(records.iter().filter(|r| filter.matches(r)).cloned().collect())
    }

    async fn count(&self) -> Result<usize, RegistryError> {
        Ok(self.records.read().await.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::record;

    #[tokio::test]
    async fn append_find_and_reject_duplicate() {
        let registry = InMemoryRegistry::new();
        registry.append(record("0xa", "AAA", "Alpha")).await.unwrap();

        assert!(registry
            .find(&TokenKey::new("0xa", "AAA", "Alpha"))
            .await
            .unwrap()
            .is_some());
        assert!(matches!(
            registry.append(record("0xa", "AAA", "Alpha")).await,
            Err(RegistryError::Duplicate { .. })
        ));
        assert_eq!(registry.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn reservation_blocks_second_claim() {
        let registry = InMemoryRegistry::new();
        let key = TokenKey::new("0xa", "AAA", "Alpha");

        let claim = registry.reserve(&key).await.unwrap();
        assert!(matches!(
            registry.reserve(&key).await,
            Err(RegistryError::InFlight { .. })
        ));
        drop(claim);
        assert!(registry.reserve(&key).await.is_ok());
    }

    #[tokio::test]
    async fn same_symbol_different_creator_is_distinct() {
        let registry = InMemoryRegistry::new();
        registry.append(record("0xa", "AAA", "Alpha")).await.unwrap();
        registry.append(record("0xb", "AAA", "Alpha")).await.unwrap();
        assert_eq!(registry.query(&RecordFilter::All).await.unwrap().len(), 2);
    }
}
