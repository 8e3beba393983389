//! Toolchain trait — the abstraction over the external Move compiler and publisher.
//!
//! Every call blocks its caller for the full duration of the subprocess.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::deployment::CapabilityObject;
use crate::error::ToolchainError;

/// Private key material used to sign publish transactions.
///
/// `Debug` never prints the key.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    private_key: String,
}

impl Credentials {
    pub fn new(private_key: impl Into<String>) -> Self {
        Self {
            private_key: private_key.into(),
        }
    }

    pub fn expose(&self) -> &str {
        &self.private_key
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

/// Captured output of a successful build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildOutput {
    pub stdout: String,
    pub stderr: String,
}

/// What a successful publish produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishReceipt {
    pub tx_digest: String,
    pub package_id: String,
    /// Objects created by the publish transaction (treasury cap, upgrade cap, ...).
    #[serde(default)]
    pub created_objects: Vec<CapabilityObject>,
}

impl PublishReceipt {
    pub fn treasury_cap(&self) -> Option<&CapabilityObject> {
        self.created_objects.iter().find(|o| o.is_treasury_cap())
    }

    pub fn upgrade_cap(&self) -> Option<&CapabilityObject> {
        self.created_objects.iter().find(|o| o.is_upgrade_cap())
    }

    pub fn coin_metadata(&self) -> Option<&CapabilityObject> {
        self.created_objects.iter().find(|o| o.is_coin_metadata())
    }
}

/// The core Toolchain trait.
///
/// Implementations: `SuiCli` (the `sui` binary), scripted fakes in tests.
#[async_trait]
pub trait Toolchain: Send + Sync {
    /// The toolchain name (e.g., "sui-cli").
    fn name(&self) -> &str;

    /// Compile the package at `package_dir`.
    async fn build(&self, package_dir: &Path) -> std::result::Result<BuildOutput, ToolchainError>;

    /// Publish the package at `package_dir`, signing with `credentials`.
    async fn publish(
        &self,
        package_dir: &Path,
        credentials: &Credentials,
    ) -> std::result::Result<PublishReceipt, ToolchainError>;

    /// Transfer an owned object to `recipient`. Returns the transaction digest.
    async fn transfer_object(
        &self,
        object_id: &str,
        recipient: &str,
        credentials: &Credentials,
    ) -> std::result::Result<String, ToolchainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_debug_is_redacted() {
        let creds = Credentials::new("deadbeef");
        let printed = format!("{creds:?}");
        assert!(!printed.contains("deadbeef"));
        assert!(printed.contains("REDACTED"));
        assert_eq!(creds.expose(), "deadbeef");
    }

    #[test]
    fn receipt_finds_capabilities() {
        let receipt = PublishReceipt {
            tx_digest: "Tx".into(),
            package_id: "0xpkg".into(),
            created_objects: vec![
                CapabilityObject {
                    object_type: "0x2::package::UpgradeCap".into(),
                    object_id: "0xup".into(),
                },
                CapabilityObject {
                    object_type: "0x2::coin::TreasuryCap<0xpkg::demo::DEMO>".into(),
                    object_id: "0xtc".into(),
                },
            ],
        };
        assert_eq!(receipt.treasury_cap().unwrap().object_id, "0xtc");
        assert_eq!(receipt.upgrade_cap().unwrap().object_id, "0xup");
        assert!(receipt.coin_metadata().is_none());
    }
}
