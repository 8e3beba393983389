//! Move source templating for generated coin packages.
//!
//! A template is plain Move source with `{{key}}` placeholders and
//! `{{#flag}} ... {{/flag}}` conditional sections. [`ContractRenderer`]
//! binds [`ContractParameters`](suiforge_core::ContractParameters) to the
//! built-in coin template (or a custom one loaded from disk) and produces a
//! [`RenderedContract`](suiforge_core::RenderedContract).
//!
//! # Example Template
//!
//! ```text
//! module {{module_name}}::{{module_name}} {
//!     public struct {{witness_name}} has drop {}
//!     {{#burn}}
//!     public entry fun burn(...) { ... }
//!     {{/burn}}
//! }
//! ```

mod engine;
mod naming;
mod renderer;

pub use engine::{Bindings, render};
pub use naming::sanitize_module_name;
pub use renderer::{BUILTIN_COIN_TEMPLATE, ContractRenderer, render_contract};
