//! Error types for the suiforge domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; [`Error`] aggregates them.

use std::path::PathBuf;
use thiserror::Error;

use crate::deployment::TokenKey;

/// The top-level error type for all suiforge operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Template errors ---
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    // --- Package assembly errors ---
    #[error("Package error: {0}")]
    Package(#[from] PackageError),

    // --- Toolchain errors ---
    #[error("Toolchain error: {0}")]
    Toolchain(#[from] ToolchainError),

    // --- Event source errors ---
    #[error("Event source error: {0}")]
    Source(#[from] SourceError),

    // --- Registry errors ---
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    // --- Event decoding errors ---
    #[error("Event decode error: {0}")]
    Decode(#[from] DecodeError),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// A conditional section has unbalanced open/close markers.
    #[error("Malformed template section '{section}': {reason}")]
    Malformed { section: String, reason: String },

    #[error("Invalid contract parameter '{field}': {reason}")]
    InvalidParameter { field: String, reason: String },

    #[error("Failed to load template from {path}: {reason}")]
    Io { path: PathBuf, reason: String },
}

#[derive(Debug, Error)]
pub enum PackageError {
    #[error("Failed to assemble package at {path}: {reason}")]
    Assembly { path: PathBuf, reason: String },

    #[error("Failed to encode package manifest: {0}")]
    Manifest(String),
}

/// Which external toolchain step failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Build,
    Publish,
    Transfer,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Build => f.write_str("build"),
            Phase::Publish => f.write_str("publish"),
            Phase::Transfer => f.write_str("transfer"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ToolchainError {
    /// The command exited non-zero, or its transaction was rejected on chain.
    #[error("{phase} failed (exit code: {}): {diagnostic}", .exit_code.map_or_else(|| "none".to_string(), |c| c.to_string()))]
    Failed {
        phase: Phase,
        exit_code: Option<i32>,
        diagnostic: String,
    },

    #[error("{phase} timed out after {timeout_secs}s")]
    Timeout { phase: Phase, timeout_secs: u64 },

    #[error("Failed to launch {program} for {phase}: {reason}")]
    Spawn {
        phase: Phase,
        program: String,
        reason: String,
    },

    /// The command exited zero but its output was not well-formed.
    #[error("Malformed {phase} output: {reason}")]
    MalformedOutput { phase: Phase, reason: String },

    #[error("Credential file error: {0}")]
    Credential(String),
}

impl ToolchainError {
    /// The toolchain step this error belongs to, if any.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            ToolchainError::Failed { phase, .. }
            | ToolchainError::Timeout { phase, .. }
            | ToolchainError::Spawn { phase, .. }
            | ToolchainError::MalformedOutput { phase, .. } => Some(*phase),
            ToolchainError::Credential(_) => None,
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum SourceError {
    /// Network fault, timeout, or non-success HTTP status.
    #[error("Transport failure: {0}")]
    Transport(String),

    /// The node answered with a JSON-RPC error object.
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// Well-formed transport, malformed payload.
    #[error("Failed to parse event response: {0}")]
    ResponseParse(String),
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Deployment already recorded for creator {creator}, symbol {symbol}, name {name}")]
    Duplicate {
        creator: String,
        symbol: String,
        name: String,
    },

    #[error("Deployment already in progress for creator {creator}, symbol {symbol}, name {name}")]
    InFlight {
        creator: String,
        symbol: String,
        name: String,
    },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Failed to encode record: {0}")]
    Serialization(String),
}

impl RegistryError {
    pub fn duplicate(key: &TokenKey) -> Self {
        RegistryError::Duplicate {
            creator: key.creator.clone(),
            symbol: key.symbol.clone(),
            name: key.name.clone(),
        }
    }

    pub fn in_flight(key: &TokenKey) -> Self {
        RegistryError::InFlight {
            creator: key.creator.clone(),
            symbol: key.symbol.clone(),
            name: key.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("Event is missing required field '{0}'")]
    MissingField(String),

    #[error("Event field '{field}' is invalid: {reason}")]
    InvalidField { field: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toolchain_error_displays_phase() {
        let err = Error::Toolchain(ToolchainError::Failed {
            phase: Phase::Build,
            exit_code: Some(1),
            diagnostic: "unbound module".into(),
        });
        assert!(err.to_string().contains("build failed"));
        assert!(err.to_string().contains("unbound module"));
    }

    #[test]
    fn toolchain_error_phase_is_distinguishable() {
        let build = ToolchainError::Failed {
            phase: Phase::Build,
            exit_code: Some(2),
            diagnostic: String::new(),
        };
        let parse = ToolchainError::MalformedOutput {
            phase: Phase::Publish,
            reason: "not json".into(),
        };
        assert_eq!(build.phase(), Some(Phase::Build));
        assert_eq!(parse.phase(), Some(Phase::Publish));
        assert_eq!(ToolchainError::Credential("disk full".into()).phase(), None);
    }

    #[test]
    fn duplicate_error_names_the_key() {
        let err = RegistryError::Duplicate {
            creator: "0xabc".into(),
            symbol: "DEMO".into(),
            name: "Demo".into(),
        };
        let text = err.to_string();
        assert!(text.contains("0xabc"));
        assert!(text.contains("DEMO"));
    }
}
