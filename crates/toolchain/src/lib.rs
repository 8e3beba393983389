//! Move package assembly and the `sui` CLI toolchain.
//!
//! - [`PackageAssembler`] writes one isolated package directory per attempt
//! - [`SuiCli`] implements [`Toolchain`](suiforge_core::Toolchain) over the
//!   `sui` binary, with attempt-scoped key files

pub mod keystore;
pub mod package;
pub mod sui;

pub use keystore::{KeyFile, keystore_entry};
pub use package::{FrameworkDependency, PackageAssembler, PackageManifest};
pub use sui::{SuiCli, SuiCliConfig, parse_publish_output};
