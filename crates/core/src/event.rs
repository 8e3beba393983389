//! Domain event system — decoupled notification of pipeline outcomes.
//!
//! The watcher and the dispatch pipeline publish events as they work; the
//! daemon (or a future API layer) can subscribe without tight coupling.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// All domain events in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    /// A new, previously unseen chain event was forwarded for dispatch
    EventObserved {
        network: String,
        tx_digest: String,
        event_seq: u64,
        timestamp: DateTime<Utc>,
    },

    /// A deployment was published and recorded
    DeploymentRecorded {
        network: String,
        module_name: String,
        package_id: String,
        tx_hash: String,
        timestamp: DateTime<Utc>,
    },

    /// The registry already held a deployment for this token
    DeploymentSkipped {
        network: String,
        creator: String,
        symbol: String,
        timestamp: DateTime<Utc>,
    },

    /// A dispatch failed and the event was dropped
    DeploymentFailed {
        network: String,
        stage: String,
        error_message: String,
        timestamp: DateTime<Utc>,
    },

    /// A poll cycle failed; the watcher is backing off
    PollFailed {
        network: String,
        consecutive_failures: u32,
        error_message: String,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus for domain events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub.
pub struct EventBus {
    sender: broadcast::Sender<Arc<DomainEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: DomainEvent) {
        // No subscribers is fine
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
