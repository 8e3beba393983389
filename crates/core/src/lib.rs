//! # suiforge core
//!
//! Domain types, traits, and error definitions for the suiforge token
//! deployment service. This crate has **no I/O of its own**: it defines the
//! model that the watcher, pipeline, registry and toolchain crates implement
//! against.
//!
//! ## Layout
//!
//! Every external collaborator is a trait here with its implementation in a
//! dedicated crate:
//! - [`EventSource`] — paginated chain event queries (`suiforge-watcher`)
//! - [`Toolchain`] — build and publish of Move packages (`suiforge-toolchain`)
//! - [`TokenRegistry`] — durable deployment records (`suiforge-registry`)

pub mod error;
pub mod contract;
pub mod chain;
pub mod deployment;
pub mod source;
pub mod toolchain;
pub mod registry;
pub mod event;

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result};
pub use contract::{Capabilities, ContractParameters, RenderedContract};
pub use chain::{ChainEvent, DedupKey, EventCursor, EventPage, EventQuery};
pub use deployment::{CapabilityObject, DeadLetter, DeploymentRecord, TokenKey};
pub use source::EventSource;
pub use toolchain::{BuildOutput, Credentials, PublishReceipt, Toolchain};
pub use registry::{RecordFilter, TokenRegistry};
pub use event::{DomainEvent, EventBus};
