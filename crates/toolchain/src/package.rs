//! Package assembler — lays out one isolated Move package per attempt.
//!
//! ```text
//! <work root>/<module>-<suffix>/
//! ├── Move.toml
//! └── sources/<module>.move
//! ```

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use suiforge_core::error::PackageError;
use tracing::{debug, warn};

const SUI_FRAMEWORK_GIT: &str = "https://github.com/MystenLabs/sui.git";
const SUI_FRAMEWORK_SUBDIR: &str = "crates/sui-framework/packages/sui-framework";
const PACKAGE_VERSION: &str = "0.0.1";
const MOVE_EDITION: &str = "2024.beta";

/// The pinned framework dependency written into `Move.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrameworkDependency {
    pub git: String,
    pub subdir: String,
    pub rev: String,
}

impl FrameworkDependency {
    /// The Sui framework at git revision `rev` (e.g. `framework/testnet`).
    pub fn sui(rev: impl Into<String>) -> Self {
        Self {
            git: SUI_FRAMEWORK_GIT.into(),
            subdir: SUI_FRAMEWORK_SUBDIR.into(),
            rev: rev.into(),
        }
    }
}

/// A package laid out on disk. Owned by exactly one deployment attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageManifest {
    pub dir: PathBuf,
    pub module_name: String,
    pub manifest_path: PathBuf,
    pub source_path: PathBuf,
}

#[derive(Serialize)]
struct MoveToml<'a> {
    package: PackageSection<'a>,
    dependencies: BTreeMap<&'a str, &'a FrameworkDependency>,
    addresses: BTreeMap<&'a str, &'a str>,
}

#[derive(Serialize)]
struct PackageSection<'a> {
    name: &'a str,
    version: &'a str,
    edition: &'a str,
}

/// Creates and removes package directories under a work root.
#[derive(Debug, Clone)]
pub struct PackageAssembler {
    work_root: PathBuf,
    framework: FrameworkDependency,
}

impl PackageAssembler {
    pub fn new(work_root: impl Into<PathBuf>, framework: FrameworkDependency) -> Self {
        Self {
            work_root: work_root.into(),
            framework,
        }
    }

    pub fn work_root(&self) -> &Path {
        &self.work_root
    }

    /// Render the `Move.toml` for `module_name`.
    pub fn manifest_toml(&self, module_name: &str) -> Result<String, PackageError> {
        let manifest = MoveToml {
            package: PackageSection {
                name: module_name,
                version: PACKAGE_VERSION,
                edition: MOVE_EDITION,
            },
            dependencies: BTreeMap::from([("Sui", &self.framework)]),
            addresses: BTreeMap::from([(module_name, "0x0")]),
        };
        toml::to_string(&manifest).map_err(|e| PackageError::Manifest(e.to_string()))
    }

    /// Write a fresh package for `module_name` containing `source`.
    ///
    /// The directory name carries a random suffix, so concurrent attempts for
    /// the same module never share a directory. A partially written package
    /// is removed before the error is returned.
    pub async fn create(
        &self,
        module_name: &str,
        source: &str,
    ) -> Result<PackageManifest, PackageError> {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        let dir = self.work_root.join(format!("{module_name}-{}", &suffix[..8]));

        if !is_identifier(module_name) {
            return Err(PackageError::Assembly {
                path: dir,
                reason: format!("'{module_name}' is not a valid Move module name"),
            });
        }

        let manifest = self.manifest_toml(module_name)?;
        let package = PackageManifest {
            manifest_path: dir.join("Move.toml"),
            source_path: dir.join("sources").join(format!("{module_name}.move")),
            module_name: module_name.to_string(),
            dir,
        };

        if let Err(e) = write_package(&package, &manifest, source).await {
            if let Err(cleanup) = Self::cleanup(&package.dir).await {
                warn!(error = %cleanup, "Failed to remove partial package");
            }
            return Err(PackageError::Assembly {
                path: package.dir,
                reason: e.to_string(),
            });
        }

        debug!(dir = %package.dir.display(), module = %module_name, "Assembled package");
        Ok(package)
    }

    /// Recursively remove a package directory. Missing directories are fine.
    pub async fn cleanup(dir: &Path) -> Result<(), PackageError> {
        match tokio::fs::remove_dir_all(dir).await {
            Ok(()) => {
                debug!(dir = %dir.display(), "Removed package");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PackageError::Assembly {
                path: dir.to_path_buf(),
                reason: e.to_string(),
            }),
        }
    }
}

async fn write_package(
    package: &PackageManifest,
    manifest: &str,
    source: &str,
) -> std::io::Result<()> {
    let sources = package.dir.join("sources");
    tokio::fs::create_dir_all(&sources).await?;
    tokio::fs::write(&package.manifest_path, manifest).await?;
    tokio::fs::write(&package.source_path, source).await?;
    Ok(())
}

fn is_identifier(name: &str) -> bool {
    name.starts_with(|c: char| c.is_ascii_alphabetic())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assembler(root: &Path) -> PackageAssembler {
        PackageAssembler::new(root, FrameworkDependency::sui("framework/testnet"))
    }

    #[test]
    fn manifest_pins_framework_and_placeholder_address() {
        let dir = tempfile::tempdir().unwrap();
        let text = assembler(dir.path()).manifest_toml("demo").unwrap();
        let parsed: toml::Value = toml::from_str(&text).unwrap();

        assert_eq!(parsed["package"]["name"].as_str(), Some("demo"));
        assert_eq!(parsed["dependencies"]["Sui"]["rev"].as_str(), Some("framework/testnet"));
        assert_eq!(
            parsed["dependencies"]["Sui"]["subdir"].as_str(),
            Some(SUI_FRAMEWORK_SUBDIR)
        );
        assert_eq!(parsed["addresses"]["demo"].as_str(), Some("0x0"));
    }

    #[tokio::test]
    async fn create_lays_out_package() {
        let dir = tempfile::tempdir().unwrap();
        let package = assembler(dir.path())
            .create("demo", "module demo::demo {}")
            .await
            .unwrap();

        assert!(package.dir.starts_with(dir.path()));
        assert!(package.manifest_path.is_file());
        assert_eq!(
            std::fs::read_to_string(&package.source_path).unwrap(),
            "module demo::demo {}"
        );
        assert!(package.source_path.ends_with("sources/demo.move"));
    }

    #[tokio::test]
    async fn same_module_name_gets_distinct_directories() {
        let dir = tempfile::tempdir().unwrap();
        let assembler = assembler(dir.path());
        let a = assembler.create("demo", "a").await.unwrap();
        let b = assembler.create("demo", "b").await.unwrap();
        assert_ne!(a.dir, b.dir);
        assert_eq!(std::fs::read_to_string(&a.source_path).unwrap(), "a");
    }

    #[tokio::test]
    async fn cleanup_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let package = assembler(dir.path()).create("demo", "x").await.unwrap();

        PackageAssembler::cleanup(&package.dir).await.unwrap();
        assert!(!package.dir.exists());
        PackageAssembler::cleanup(&package.dir).await.unwrap();
    }

    #[tokio::test]
    async fn invalid_module_name_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = assembler(dir.path())
            .create("../escape", "x")
            .await
            .unwrap_err();
        assert!(matches!(err, PackageError::Assembly { .. }));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn unwritable_root_is_assembly_failure() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("locked");
        std::fs::create_dir(&root).unwrap();
        std::fs::set_permissions(&root, std::fs::Permissions::from_mode(0o500)).unwrap();

        let result = assembler(&root).create("demo", "x").await;
        std::fs::set_permissions(&root, std::fs::Permissions::from_mode(0o700)).unwrap();

        // root bypasses permission bits
        if result.is_ok() {
            return;
        }
        let err = result.unwrap_err();
        assert!(matches!(err, PackageError::Assembly { ref path, .. } if path.starts_with(&root)));
    }
}
