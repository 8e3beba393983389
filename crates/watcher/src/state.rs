//! Per-network watcher state.

use std::collections::HashSet;
use suiforge_core::chain::{DedupKey, EventCursor, EventPage};

/// Where a watcher is in its lifecycle.
///
/// ```text
/// Init ──▶ CursorBootstrap ──▶ Polling ◀──▶ ErrorBackoff
///                 ▲                              │
///                 └──────── (not yet seeded) ────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherPhase {
    Init,
    CursorBootstrap,
    Polling,
    ErrorBackoff,
}

impl std::fmt::Display for WatcherPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WatcherPhase::Init => f.write_str("init"),
            WatcherPhase::CursorBootstrap => f.write_str("cursor_bootstrap"),
            WatcherPhase::Polling => f.write_str("polling"),
            WatcherPhase::ErrorBackoff => f.write_str("error_backoff"),
        }
    }
}

/// Everything one network's watcher owns. Never shared between tasks.
#[derive(Debug, Clone)]
pub struct WatcherState {
    pub network: String,
    pub phase: WatcherPhase,
    /// Id of the last consumed event; `None` until something is consumed.
    pub cursor: Option<EventCursor>,
    /// Events forwarded during this process lifetime.
    pub seen: HashSet<DedupKey>,
    pub consecutive_failures: u32,
    /// Set once bootstrap succeeds; backoff then resumes polling.
    pub bootstrapped: bool,
}

impl WatcherState {
    pub fn new(network: impl Into<String>) -> Self {
        Self {
            network: network.into(),
            phase: WatcherPhase::Init,
            cursor: None,
            seen: HashSet::new(),
            consecutive_failures: 0,
            bootstrapped: false,
        }
    }

    /// Record `key` as seen. Returns `true` the first time only.
    pub fn mark_seen(&mut self, key: DedupKey) -> bool {
        self.seen.insert(key)
    }

    /// Move the cursor past `page`.
    ///
    /// Prefers the page's `next_cursor`; without one, the id of the last
    /// event in the page. An empty page without a cursor leaves it alone.
    pub fn advance(&mut self, page: &EventPage) {
        if let Some(next) = &page.next_cursor {
            self.cursor = Some(next.clone());
        } else if let Some(last) = page.events.last() {
            self.cursor = Some(last.cursor());
        }
    }

    /// The phase to resume after a backoff sleep.
    pub fn resume_phase(&self) -> WatcherPhase {
        if self.bootstrapped {
            WatcherPhase::Polling
        } else {
            WatcherPhase::CursorBootstrap
        }
    }
}
