//! Event source trait — paginated queries for one event type on one network.

use async_trait::async_trait;

use crate::chain::{EventPage, EventQuery};
use crate::error::SourceError;

/// A queryable stream of chain events.
///
/// Implementations: `SuiRpcSource` (JSON-RPC over HTTP), scripted sources in
/// tests.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Network tag stamped on every returned event.
    fn network(&self) -> &str;

    /// Fetch one page of events.
    async fn query(&self, query: &EventQuery) -> std::result::Result<EventPage, SourceError>;
}
