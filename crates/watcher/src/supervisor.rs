//! Runs one watcher task per network under a shared cancellation token.

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::network::NetworkWatcher;
use crate::state::WatcherState;

/// Owns the watcher tasks. Each network polls independently; a failing
/// network only ever delays itself.
pub struct WatcherSupervisor {
    token: CancellationToken,
    tasks: Vec<(String, JoinHandle<WatcherState>)>,
}

impl WatcherSupervisor {
    pub fn new(token: CancellationToken) -> Self {
        Self {
            token,
            tasks: Vec::new(),
        }
    }

    /// Start `watcher` on its own task.
    pub fn spawn(&mut self, watcher: NetworkWatcher) {
        let network = watcher.network().to_string();
        let handle = tokio::spawn(watcher.run(self.token.child_token()));
        info!(network = %network, "Spawned watcher");
        self.tasks.push((network, handle));
    }

    pub fn networks(&self) -> Vec<&str> {
        self.tasks.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Signal every watcher to stop.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Wait for every watcher to finish and collect their final states.
    pub async fn join(self) -> Vec<WatcherState> {
        let mut states = Vec::with_capacity(self.tasks.len());
        for (network, handle) in self.tasks {
            match handle.await {
                Ok(state) => states.push(state),
                Err(e) => error!(network = %network, error = %e, "Watcher task panicked"),
            }
        }
        states
    }

    /// Cancel, then join.
    pub async fn shutdown(self) -> Vec<WatcherState> {
        self.cancel();
        self.join().await
    }
}
