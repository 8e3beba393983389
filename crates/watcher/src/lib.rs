//! Chain event watching for suiforge.
//!
//! Each enabled network gets a [`NetworkWatcher`] running the state machine
//! `Init → CursorBootstrap → Polling ⇄ ErrorBackoff` on its own task. The
//! [`WatcherSupervisor`] owns those tasks and their shared cancellation
//! token. [`SuiRpcSource`] is the production
//! [`EventSource`](suiforge_core::EventSource).

pub mod network;
pub mod rpc;
pub mod state;
pub mod supervisor;

pub use network::{EventHandler, NetworkWatcher, WatcherSettings};
pub use rpc::{SuiRpcSource, parse_query_response};
pub use state::{WatcherPhase, WatcherState};
pub use supervisor::WatcherSupervisor;
