//! Per-event workflow: decode → claim the token key → render → deploy → record.
//!
//! A failure at any step drops the event. It is logged, announced on the
//! event bus and written to the dead-letter log; nothing is retried.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use suiforge_core::chain::ChainEvent;
use suiforge_core::deployment::{DeadLetter, DeploymentRecord, TokenKey};
use suiforge_core::error::{Error, RegistryError};
use suiforge_core::event::{DomainEvent, EventBus};
use suiforge_core::registry::TokenRegistry;
use suiforge_core::toolchain::Credentials;
use suiforge_registry::DeadLetterLog;
use suiforge_template::ContractRenderer;
use suiforge_watcher::EventHandler;
use tracing::{debug, error, info, warn};

use crate::decode::TokenCreationEvent;
use crate::deployer::{DeployReceipt, Deployer, stage_of};

/// The account that signs and pays for publishes.
#[derive(Debug, Clone)]
pub struct DeployerIdentity {
    pub address: String,
    pub credentials: Credentials,
}

/// How one dispatch ended.
#[derive(Debug)]
pub enum DispatchOutcome {
    Deployed(Box<DeploymentRecord>),
    /// The registry already holds this token; nothing was done.
    Duplicate(TokenKey),
    Dropped { stage: &'static str, error: String },
}

impl DispatchOutcome {
    pub fn is_deployed(&self) -> bool {
        matches!(self, DispatchOutcome::Deployed(_))
    }
}

pub struct Dispatcher {
    renderer: ContractRenderer,
    deployer: Deployer,
    registry: Arc<dyn TokenRegistry>,
    identity: DeployerIdentity,
    dead_letters: Option<Arc<DeadLetterLog>>,
    bus: Option<Arc<EventBus>>,
    transfer_capabilities: bool,
}

impl Dispatcher {
    pub fn new(
        renderer: ContractRenderer,
        deployer: Deployer,
        registry: Arc<dyn TokenRegistry>,
        identity: DeployerIdentity,
    ) -> Self {
        Self {
            renderer,
            deployer,
            registry,
            identity,
            dead_letters: None,
            bus: None,
            transfer_capabilities: false,
        }
    }

    pub fn with_dead_letters(mut self, log: Arc<DeadLetterLog>) -> Self {
        self.dead_letters = Some(log);
        self
    }

    pub fn with_event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Hand the treasury cap to the token creator after each publish.
    pub fn with_capability_transfer(mut self, enabled: bool) -> Self {
        self.transfer_capabilities = enabled;
        self
    }

    pub async fn dispatch(&self, event: &ChainEvent) -> DispatchOutcome {
        let token = match TokenCreationEvent::decode(event) {
            Ok(token) => token,
            Err(e) => return self.drop_event(event, None, e.into()).await,
        };
        let key = token.token_key();

        // Held until the record is appended; dropping it early frees the key.
        let _claim = match self.registry.reserve(&key).await {
            Ok(claim) => claim,
            Err(RegistryError::Duplicate { .. }) => return self.skip(event, key),
            Err(RegistryError::InFlight { .. }) => {
                info!(
                    network = %event.network,
                    token = %key,
                    "Token deployment already in progress, skipping"
                );
                return self.skip(event, key);
            }
            Err(e) => return self.drop_event(event, Some(key), e.into()).await,
        };

        match self.deploy(event, &token).await {
            Ok(record) => DispatchOutcome::Deployed(Box::new(record)),
            Err(e) => self.drop_event(event, Some(key), e).await,
        }
    }

    async fn deploy(
        &self,
        event: &ChainEvent,
        token: &TokenCreationEvent,
    ) -> Result<DeploymentRecord, Error> {
        let params = token.to_parameters();
        let rendered = self.renderer.render(&params)?;
        info!(
            network = %event.network,
            tx_digest = %event.tx_digest,
            module = %rendered.module_name,
            symbol = %params.symbol,
            "Deploying token"
        );

        let receipt = self
            .deployer
            .deploy(
                &rendered.source,
                &rendered.module_name,
                &self.identity.address,
                &self.identity.credentials,
            )
            .await?;

        let capabilities_transferred = if self.transfer_capabilities {
            self.transfer_treasury(&receipt, &token.creator).await
        } else {
            false
        };

        let record = receipt.into_record(
            rendered.module_name,
            token.creator.clone(),
            event.network.clone(),
            params,
            capabilities_transferred,
        );
        self.registry.append(record.clone()).await?;

        info!(
            network = %record.network,
            module = %record.module_name,
            package_id = %record.package_id,
            "Deployment recorded"
        );
        self.publish(DomainEvent::DeploymentRecorded {
            network: record.network.clone(),
            module_name: record.module_name.clone(),
            package_id: record.package_id.clone(),
            tx_hash: record.tx_hash.clone(),
            timestamp: Utc::now(),
        });
        Ok(record)
    }

    /// A failed transfer leaves the cap with the deployer; the deployment
    /// itself still stands.
    async fn transfer_treasury(&self, receipt: &DeployReceipt, creator: &str) -> bool {
        let Some(cap) = receipt.treasury_cap() else {
            warn!(package_id = %receipt.package_id, "Publish created no treasury cap to transfer");
            return false;
        };
        match self
            .deployer
            .transfer(&cap.object_id, creator, &self.identity.credentials)
            .await
        {
            Ok(digest) => {
                info!(object_id = %cap.object_id, recipient = %creator, tx_hash = %digest, "Treasury cap transferred");
                true
            }
            Err(e) => {
                warn!(object_id = %cap.object_id, recipient = %creator, error = %e, "Treasury cap transfer failed");
                false
            }
        }
    }

    fn skip(&self, event: &ChainEvent, key: TokenKey) -> DispatchOutcome {
        info!(network = %event.network, token = %key, "Token already deployed, skipping");
        self.publish(DomainEvent::DeploymentSkipped {
            network: event.network.clone(),
            creator: key.creator.clone(),
            symbol: key.symbol.clone(),
            timestamp: Utc::now(),
        });
        DispatchOutcome::Duplicate(key)
    }

    async fn drop_event(
        &self,
        event: &ChainEvent,
        token: Option<TokenKey>,
        err: Error,
    ) -> DispatchOutcome {
        let stage = stage_of(&err);
        let message = err.to_string();
        error!(
            network = %event.network,
            tx_digest = %event.tx_digest,
            event_seq = event.event_seq,
            stage,
            error = %message,
            "Dispatch failed, dropping event"
        );
        self.publish(DomainEvent::DeploymentFailed {
            network: event.network.clone(),
            stage: stage.to_string(),
            error_message: message.clone(),
            timestamp: Utc::now(),
        });

        if let Some(log) = &self.dead_letters {
            let letter = DeadLetter {
                event: event.dedup_key(),
                token,
                stage: stage.to_string(),
                error: message.clone(),
                failed_at: Utc::now(),
            };
            if let Err(e) = log.append(&letter).await {
                warn!(path = %log.path().display(), error = %e, "Failed to write dead letter");
            }
        }

        DispatchOutcome::Dropped {
            stage,
            error: message,
        }
    }

    fn publish(&self, event: DomainEvent) {
        if let Some(bus) = &self.bus {
            bus.publish(event);
        }
    }
}

#[async_trait]
impl EventHandler for Dispatcher {
    async fn handle(&self, event: ChainEvent) {
        let outcome = self.dispatch(&event).await;
        debug!(network = %event.network, tx_digest = %event.tx_digest, outcome = ?outcome, "Dispatch finished");
    }
}
