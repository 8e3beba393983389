//! Assemble → build → publish for one rendered contract.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use suiforge_core::contract::ContractParameters;
use suiforge_core::deployment::{CapabilityObject, DeploymentRecord};
use suiforge_core::error::{Error, Phase, ToolchainError};
use suiforge_core::toolchain::{Credentials, Toolchain};
use suiforge_toolchain::PackageAssembler;
use tracing::{debug, info, warn};

/// What a successful deployment produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployReceipt {
    pub tx_hash: String,
    pub package_id: String,
    pub deployer: String,
    pub created_objects: Vec<CapabilityObject>,
}

impl DeployReceipt {
    pub fn treasury_cap(&self) -> Option<&CapabilityObject> {
        self.created_objects.iter().find(|o| o.is_treasury_cap())
    }

    pub fn upgrade_cap(&self) -> Option<&CapabilityObject> {
        self.created_objects.iter().find(|o| o.is_upgrade_cap())
    }

    pub fn coin_metadata(&self) -> Option<&CapabilityObject> {
        self.created_objects.iter().find(|o| o.is_coin_metadata())
    }

    /// The registry record for this deployment, stamped now.
    pub fn into_record(
        self,
        module_name: String,
        creator: String,
        network: String,
        params: ContractParameters,
        capabilities_transferred: bool,
    ) -> DeploymentRecord {
        DeploymentRecord {
            module_name,
            creator,
            treasury_cap_id: self.treasury_cap().map(|o| o.object_id.clone()),
            upgrade_cap_id: self.upgrade_cap().map(|o| o.object_id.clone()),
            coin_metadata_id: self.coin_metadata().map(|o| o.object_id.clone()),
            deployer: self.deployer,
            tx_hash: self.tx_hash,
            package_id: self.package_id,
            created_objects: self.created_objects,
            network,
            params,
            capabilities_transferred,
            created_at: Utc::now(),
        }
    }
}

pub struct Deployer {
    assembler: PackageAssembler,
    toolchain: Arc<dyn Toolchain>,
}

impl Deployer {
    pub fn new(assembler: PackageAssembler, toolchain: Arc<dyn Toolchain>) -> Self {
        Self {
            assembler,
            toolchain,
        }
    }

    /// Publish `source` as module `module_name`, signed by `credentials`.
    ///
    /// The package directory is removed before this returns, on success and
    /// on failure alike.
    pub async fn deploy(
        &self,
        source: &str,
        module_name: &str,
        deployer_address: &str,
        credentials: &Credentials,
    ) -> Result<DeployReceipt, Error> {
        let package = self.assembler.create(module_name, source).await?;
        let guard = PackageGuard::new(&package.dir);

        let result = self.build_and_publish(&package.dir, credentials).await;
        guard.release().await;

        let receipt = result?;
        info!(
            module = %module_name,
            package_id = %receipt.package_id,
            tx_hash = %receipt.tx_digest,
            toolchain = self.toolchain.name(),
            "Published package"
        );
        Ok(DeployReceipt {
            tx_hash: receipt.tx_digest,
            package_id: receipt.package_id,
            deployer: deployer_address.to_string(),
            created_objects: receipt.created_objects,
        })
    }

    async fn build_and_publish(
        &self,
        dir: &Path,
        credentials: &Credentials,
    ) -> Result<suiforge_core::toolchain::PublishReceipt, ToolchainError> {
        let build = self.toolchain.build(dir).await?;
        debug!(dir = %dir.display(), stdout_len = build.stdout.len(), "Build finished");
        self.toolchain.publish(dir, credentials).await
    }

    /// Hand `object_id` to `recipient`. Returns the transfer digest.
    pub async fn transfer(
        &self,
        object_id: &str,
        recipient: &str,
        credentials: &Credentials,
    ) -> Result<String, Error> {
        Ok(self
            .toolchain
            .transfer_object(object_id, recipient, credentials)
            .await?)
    }
}

/// Removes a package directory when dropped, unless it was already released.
struct PackageGuard {
    dir: Option<PathBuf>,
}

impl PackageGuard {
    fn new(dir: &Path) -> Self {
        Self {
            dir: Some(dir.to_path_buf()),
        }
    }

    async fn release(mut self) {
        if let Some(dir) = self.dir.take() {
            if let Err(e) = PackageAssembler::cleanup(&dir).await {
                warn!(error = %e, "Failed to remove package directory");
            }
        }
    }
}

impl Drop for PackageGuard {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            match std::fs::remove_dir_all(&dir) {
                Ok(()) => debug!(dir = %dir.display(), "Removed abandoned package"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!(dir = %dir.display(), error = %e, "Failed to remove package directory"),
            }
        }
    }
}

/// Pipeline stage an error belongs to, as recorded in dead letters.
pub fn stage_of(error: &Error) -> &'static str {
    match error {
        Error::Decode(_) => "decode",
        Error::Template(_) => "render",
        Error::Package(_) => "assemble",
        Error::Toolchain(e) => match e.phase() {
            Some(Phase::Build) => "build",
            Some(Phase::Publish) | None => "publish",
            Some(Phase::Transfer) => "transfer",
        },
        Error::Registry(_) => "record",
        Error::Source(_) => "source",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use suiforge_core::error::{DecodeError, PackageError, RegistryError, TemplateError};

    #[test]
    fn stages_follow_the_failing_step() {
        let build = Error::Toolchain(ToolchainError::Failed {
            phase: Phase::Build,
            exit_code: Some(1),
            diagnostic: "error[E01002]".into(),
        });
        let timeout = Error::Toolchain(ToolchainError::Timeout {
            phase: Phase::Publish,
            timeout_secs: 120,
        });
        let credential = Error::Toolchain(ToolchainError::Credential("disk full".into()));

        assert_eq!(stage_of(&build), "build");
        assert_eq!(stage_of(&timeout), "publish");
        assert_eq!(stage_of(&credential), "publish");
        assert_eq!(stage_of(&Error::Decode(DecodeError::MissingField("name".into()))), "decode");
        assert_eq!(
            stage_of(&Error::Template(TemplateError::Malformed {
                section: "mint".into(),
                reason: "unclosed".into(),
            })),
            "render"
        );
        assert_eq!(stage_of(&Error::Package(PackageError::Manifest("x".into()))), "assemble");
        assert_eq!(stage_of(&Error::Registry(RegistryError::Storage("x".into()))), "record");
    }

    #[test]
    fn guard_removes_directory_on_drop() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("demo-1234abcd");
        std::fs::create_dir_all(dir.join("sources")).unwrap();

        drop(PackageGuard::new(&dir));
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn guard_release_tolerates_missing_directory() {
        let tmp = tempfile::tempdir().unwrap();
        PackageGuard::new(&tmp.path().join("gone")).release().await;
    }
}
