//! The dispatch pipeline.
//!
//! A [`Dispatcher`] is the [`EventHandler`](suiforge_watcher::EventHandler)
//! every network watcher feeds. For each event it decodes the factory
//! payload, consults the registry, renders the coin module, deploys it
//! through a [`Deployer`] and records the result.

pub mod decode;
pub mod deployer;
pub mod dispatcher;

pub use decode::TokenCreationEvent;
pub use deployer::{DeployReceipt, Deployer, stage_of};
pub use dispatcher::{DeployerIdentity, DispatchOutcome, Dispatcher};
pub use suiforge_template::render_contract;
