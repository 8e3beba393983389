//! `sui` CLI driver — build, publish and transfer through the external binary.
//!
//! Each call spawns one subprocess and awaits it to completion, bounded by a
//! per-phase timeout. A timed-out child is killed when its handle drops.

use async_trait::async_trait;
use serde_json::Value;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::{Duration, Instant};
use suiforge_core::deployment::CapabilityObject;
use suiforge_core::error::{Phase, ToolchainError};
use suiforge_core::toolchain::{BuildOutput, Credentials, PublishReceipt, Toolchain};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::keystore::KeyFile;

/// Settings for [`SuiCli`].
#[derive(Debug, Clone)]
pub struct SuiCliConfig {
    pub binary: PathBuf,
    pub gas_budget: u64,
    pub build_timeout: Duration,
    pub publish_timeout: Duration,
    /// Where key files are written; the system temp dir when unset.
    pub scratch_dir: Option<PathBuf>,
}

impl Default for SuiCliConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("sui"),
            gas_budget: 100_000_000,
            build_timeout: Duration::from_secs(60),
            publish_timeout: Duration::from_secs(120),
            scratch_dir: None,
        }
    }
}

/// [`Toolchain`] backed by the `sui` binary.
pub struct SuiCli {
    config: SuiCliConfig,
}

impl SuiCli {
    pub fn new(config: SuiCliConfig) -> Self {
        Self { config }
    }

    fn scratch_dir(&self) -> PathBuf {
        self.config
            .scratch_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }

    /// Run the binary and return its output if it exited zero.
    async fn run(
        &self,
        phase: Phase,
        args: &[&OsStr],
        timeout: Duration,
    ) -> Result<Output, ToolchainError> {
        let program = self.config.binary.display().to_string();
        debug!(%phase, program = %program, "Spawning toolchain command");

        let child = Command::new(&self.config.binary)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ToolchainError::Spawn {
                phase,
                program,
                reason: e.to_string(),
            })?;

        let started = Instant::now();
        let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(ToolchainError::Failed {
                    phase,
                    exit_code: None,
                    diagnostic: e.to_string(),
                });
            }
            Err(_) => {
                warn!(%phase, timeout_secs = timeout.as_secs(), "Toolchain command timed out");
                return Err(ToolchainError::Timeout {
                    phase,
                    timeout_secs: timeout.as_secs(),
                });
            }
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        if !output.status.success() {
            let code = output.status.code();
            warn!(%phase, exit_code = ?code, elapsed_ms, "Toolchain command failed");
            return Err(ToolchainError::Failed {
                phase,
                exit_code: code,
                diagnostic: diagnostic(&output),
            });
        }

        debug!(%phase, elapsed_ms, "Toolchain command succeeded");
        Ok(output)
    }
}

#[async_trait]
impl Toolchain for SuiCli {
    fn name(&self) -> &str {
        "sui-cli"
    }

    async fn build(&self, package_dir: &Path) -> Result<BuildOutput, ToolchainError> {
        info!(dir = %package_dir.display(), "Building Move package");
        let output = self
            .run(
                Phase::Build,
                &[
                    OsStr::new("move"),
                    OsStr::new("build"),
                    OsStr::new("--path"),
                    package_dir.as_os_str(),
                ],
                self.config.build_timeout,
            )
            .await?;

        Ok(BuildOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    async fn publish(
        &self,
        package_dir: &Path,
        credentials: &Credentials,
    ) -> Result<PublishReceipt, ToolchainError> {
        info!(dir = %package_dir.display(), gas_budget = self.config.gas_budget, "Publishing Move package");

        // Dropped on every return path below, taking the file with it.
        let key_file = KeyFile::write(&self.scratch_dir(), credentials)?;
        let gas_budget = self.config.gas_budget.to_string();

        let output = self
            .run(
                Phase::Publish,
                &[
                    OsStr::new("client"),
                    OsStr::new("publish"),
                    OsStr::new("--gas-budget"),
                    OsStr::new(&gas_budget),
                    OsStr::new("--json"),
                    OsStr::new("--key-file"),
                    key_file.path().as_os_str(),
                    OsStr::new("--path"),
                    package_dir.as_os_str(),
                ],
                self.config.publish_timeout,
            )
            .await?;

        let receipt = parse_publish_output(&String::from_utf8_lossy(&output.stdout))?;
        info!(
            package_id = %receipt.package_id,
            tx_digest = %receipt.tx_digest,
            created = receipt.created_objects.len(),
            "Package published"
        );
        Ok(receipt)
    }

    async fn transfer_object(
        &self,
        object_id: &str,
        recipient: &str,
        credentials: &Credentials,
    ) -> Result<String, ToolchainError> {
        info!(object_id = %object_id, recipient = %recipient, "Transferring object");

        let key_file = KeyFile::write(&self.scratch_dir(), credentials)?;
        let gas_budget = self.config.gas_budget.to_string();

        let output = self
            .run(
                Phase::Transfer,
                &[
                    OsStr::new("client"),
                    OsStr::new("transfer"),
                    OsStr::new("--to"),
                    OsStr::new(recipient),
                    OsStr::new("--object-id"),
                    OsStr::new(object_id),
                    OsStr::new("--gas-budget"),
                    OsStr::new(&gas_budget),
                    OsStr::new("--json"),
                    OsStr::new("--key-file"),
                    key_file.path().as_os_str(),
                ],
                self.config.publish_timeout,
            )
            .await?;

        let value = parse_json_output(Phase::Transfer, &String::from_utf8_lossy(&output.stdout))?;
        check_effects_status(Phase::Transfer, &value)?;
        required_str(Phase::Transfer, &value, "digest")
    }
}

/// Prefer stderr, fall back to stdout.
fn diagnostic(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.trim().is_empty() {
        return stderr.trim().to_string();
    }
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// The first JSON object in `stdout`. The CLI may print a text preamble
/// (e.g. dependency fetch progress) before the JSON body.
fn parse_json_output(phase: Phase, stdout: &str) -> Result<Value, ToolchainError> {
    for (start, _) in stdout.match_indices('{') {
        let mut stream = serde_json::Deserializer::from_str(&stdout[start..]).into_iter::<Value>();
        if let Some(Ok(value @ Value::Object(_))) = stream.next() {
            return Ok(value);
        }
    }
    Err(ToolchainError::MalformedOutput {
        phase,
        reason: "no JSON object in command output".into(),
    })
}

fn check_effects_status(phase: Phase, value: &Value) -> Result<(), ToolchainError> {
    let Some(status) = value.pointer("/effects/status/status").and_then(Value::as_str) else {
        return Ok(());
    };
    if status == "success" {
        return Ok(());
    }
    let error = value
        .pointer("/effects/status/error")
        .and_then(Value::as_str)
        .unwrap_or(status);
    Err(ToolchainError::Failed {
        phase,
        exit_code: None,
        diagnostic: format!("transaction {status}: {error}"),
    })
}

fn required_str(phase: Phase, value: &Value, field: &str) -> Result<String, ToolchainError> {
    value
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ToolchainError::MalformedOutput {
            phase,
            reason: format!("missing '{field}'"),
        })
}

/// Extract the receipt from `sui client publish --json` output.
pub fn parse_publish_output(stdout: &str) -> Result<PublishReceipt, ToolchainError> {
    let value = parse_json_output(Phase::Publish, stdout)?;
    check_effects_status(Phase::Publish, &value)?;

    let tx_digest = required_str(Phase::Publish, &value, "digest")?;
    let changes = value
        .get("objectChanges")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let package_id = changes
        .iter()
        .find(|c| c.get("type").and_then(Value::as_str) == Some("published"))
        .and_then(|c| c.get("packageId"))
        .or_else(|| value.get("packageId"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ToolchainError::MalformedOutput {
            phase: Phase::Publish,
            reason: "no published package in object changes".into(),
        })?;

    let created_objects = changes
        .iter()
        .filter(|c| c.get("type").and_then(Value::as_str) == Some("created"))
        .filter_map(|c| {
            Some(CapabilityObject {
                object_type: c.get("objectType")?.as_str()?.to_string(),
                object_id: c.get("objectId")?.as_str()?.to_string(),
            })
        })
        .collect();

    Ok(PublishReceipt {
        tx_digest,
        package_id,
        created_objects,
    })
}
