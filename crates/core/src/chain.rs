//! Chain event model — what the watcher observes and forwards.

use serde::{Deserialize, Serialize};

/// Continuation token for event pagination; the id of the last consumed event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventCursor {
    pub tx_digest: String,
    /// Sui encodes the sequence as a decimal string.
    pub event_seq: String,
}

/// Globally unique identity of one observed event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DedupKey {
    pub network: String,
    pub tx_digest: String,
    pub event_seq: u64,
}

impl std::fmt::Display for DedupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}/{}", self.network, self.tx_digest, self.event_seq)
    }
}

/// A single event as returned by the event source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainEvent {
    pub network: String,
    pub tx_digest: String,
    pub event_seq: u64,
    /// Decoded event fields (`parsedJson` on Sui).
    pub fields: serde_json::Map<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_ms: Option<u64>,
}

impl ChainEvent {
    pub fn dedup_key(&self) -> DedupKey {
        DedupKey {
            network: self.network.clone(),
            tx_digest: self.tx_digest.clone(),
            event_seq: self.event_seq,
        }
    }

    /// The cursor that points at this event.
    pub fn cursor(&self) -> EventCursor {
        EventCursor {
            tx_digest: self.tx_digest.clone(),
            event_seq: self.event_seq.to_string(),
        }
    }
}

/// One page request against the event source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQuery {
    /// Fully qualified event type, e.g. `0xPKG::factory::TokenCreationEvent`.
    pub event_type: String,
    pub cursor: Option<EventCursor>,
    pub limit: usize,
    /// `false` = oldest first.
    pub descending: bool,
}

/// One page of results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventPage {
    pub events: Vec<ChainEvent>,
    pub next_cursor: Option<EventCursor>,
    pub has_next_page: bool,
}
