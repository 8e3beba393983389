//! The per-network watch loop.
//!
//! One [`NetworkWatcher`] polls one network for one event type and forwards
//! every new event, in arrival order, to its [`EventHandler`]. Delivery is
//! at-least-once across restarts (the cursor is not persisted) and
//! exactly-once within a process (the seen set).

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use suiforge_core::chain::{ChainEvent, EventPage, EventQuery};
use suiforge_core::error::SourceError;
use suiforge_core::event::{DomainEvent, EventBus};
use suiforge_core::source::EventSource;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::state::{WatcherPhase, WatcherState};

/// Receives each new event. Called sequentially; the next poll waits for it.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: ChainEvent);
}

/// Timing and query shape for one watcher.
#[derive(Debug, Clone)]
pub struct WatcherSettings {
    /// Fully qualified Move event type.
    pub event_type: String,
    pub batch_size: usize,
    pub poll_interval: Duration,
    pub error_backoff: Duration,
}

pub struct NetworkWatcher {
    source: Arc<dyn EventSource>,
    handler: Arc<dyn EventHandler>,
    settings: WatcherSettings,
    state: WatcherState,
    bus: Option<Arc<EventBus>>,
}

impl NetworkWatcher {
    pub fn new(
        source: Arc<dyn EventSource>,
        handler: Arc<dyn EventHandler>,
        settings: WatcherSettings,
    ) -> Self {
        let state = WatcherState::new(source.network());
        Self {
            source,
            handler,
            settings,
            state,
            bus: None,
        }
    }

    /// Publish poll failures and observed events on `bus`.
    pub fn with_event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn network(&self) -> &str {
        &self.state.network
    }

    pub fn state(&self) -> &WatcherState {
        &self.state
    }

    /// Seed the cursor with the newest existing event so the backlog is
    /// skipped. An empty network leaves the cursor unset.
    pub async fn bootstrap(&mut self) -> Result<(), SourceError> {
        self.state.phase = WatcherPhase::CursorBootstrap;
        let page = self
            .source
            .query(&EventQuery {
                event_type: self.settings.event_type.clone(),
                cursor: None,
                limit: 1,
                descending: true,
            })
            .await?;

        self.state.cursor = page.events.first().map(ChainEvent::cursor);
        self.state.bootstrapped = true;
        self.state.phase = WatcherPhase::Polling;
        info!(network = %self.state.network, cursor = ?self.state.cursor, "Cursor bootstrapped");
        Ok(())
    }

    /// Fetch the next page after the cursor, oldest first.
    pub async fn fetch(&self) -> Result<EventPage, SourceError> {
        self.source
            .query(&EventQuery {
                event_type: self.settings.event_type.clone(),
                cursor: self.state.cursor.clone(),
                limit: self.settings.batch_size,
                descending: false,
            })
            .await
    }

    /// Forward unseen events from `page`, then advance the cursor.
    /// Returns how many events were forwarded.
    pub async fn process(&mut self, page: EventPage) -> usize {
        let mut forwarded = 0;
        for event in &page.events {
            if !self.state.mark_seen(event.dedup_key()) {
                debug!(key = %event.dedup_key(), "Skipping already-seen event");
                continue;
            }

            info!(
                network = %event.network,
                tx_digest = %event.tx_digest,
                event_seq = event.event_seq,
                "New event"
            );
            if let Some(bus) = &self.bus {
                bus.publish(DomainEvent::EventObserved {
                    network: event.network.clone(),
                    tx_digest: event.tx_digest.clone(),
                    event_seq: event.event_seq,
                    timestamp: Utc::now(),
                });
            }
            self.handler.handle(event.clone()).await;
            forwarded += 1;
        }

        self.state.advance(&page);
        forwarded
    }

    /// One fetch-and-forward cycle.
    pub async fn poll_once(&mut self) -> Result<usize, SourceError> {
        let page = self.fetch().await?;
        self.state.consecutive_failures = 0;
        Ok(self.process(page).await)
    }

    fn record_failure(&mut self, error: &SourceError) {
        self.state.consecutive_failures += 1;
        self.state.phase = WatcherPhase::ErrorBackoff;
        warn!(
            network = %self.state.network,
            consecutive_failures = self.state.consecutive_failures,
            error = %error,
            "Event poll failed, backing off"
        );
        if let Some(bus) = &self.bus {
            bus.publish(DomainEvent::PollFailed {
                network: self.state.network.clone(),
                consecutive_failures: self.state.consecutive_failures,
                error_message: error.to_string(),
                timestamp: Utc::now(),
            });
        }
    }

    /// Run until `token` is cancelled. Returns the final state.
    ///
    /// Cancellation is observed while waiting on the source and while
    /// sleeping. A handler call already in progress runs to completion.
    pub async fn run(mut self, token: CancellationToken) -> WatcherState {
        info!(network = %self.state.network, event_type = %self.settings.event_type, "Watcher started");

        loop {
            let delay = match self.state.phase {
                WatcherPhase::Init | WatcherPhase::CursorBootstrap => {
                    let result = tokio::select! {
                        _ = token.cancelled() => break,
                        result = self.bootstrap() => result,
                    };
                    match result {
                        Ok(()) => {
                            self.state.consecutive_failures = 0;
                            None
                        }
                        Err(e) => {
                            self.record_failure(&e);
                            Some(self.settings.error_backoff)
                        }
                    }
                }
                WatcherPhase::Polling => {
                    let result = tokio::select! {
                        _ = token.cancelled() => break,
                        result = self.fetch() => result,
                    };
                    match result {
                        Ok(page) => {
                            self.state.consecutive_failures = 0;
                            if self.process(page).await == 0 {
                                Some(self.settings.poll_interval)
                            } else {
                                None
                            }
                        }
                        Err(e) => {
                            self.record_failure(&e);
                            Some(self.settings.error_backoff)
                        }
                    }
                }
                WatcherPhase::ErrorBackoff => {
                    self.state.phase = self.state.resume_phase();
                    None
                }
            };

            if let Some(delay) = delay {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }

        info!(network = %self.state.network, "Watcher stopped");
        self.state
    }
}
