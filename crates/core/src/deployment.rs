//! Deployment records — the durable outcome of a successful dispatch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::chain::DedupKey;
use crate::contract::ContractParameters;

/// Registry uniqueness key: one deployment per `(creator, symbol, name)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenKey {
    pub creator: String,
    pub symbol: String,
    pub name: String,
}

impl TokenKey {
    pub fn new(
        creator: impl Into<String>,
        symbol: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            creator: creator.into(),
            symbol: symbol.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for TokenKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.creator, self.symbol, self.name)
    }
}

/// An object created by the publish transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityObject {
    pub object_type: String,
    pub object_id: String,
}

impl CapabilityObject {
    pub fn is_treasury_cap(&self) -> bool {
        self.object_type.contains("::coin::TreasuryCap<")
    }

    pub fn is_upgrade_cap(&self) -> bool {
        self.object_type.ends_with("::package::UpgradeCap")
    }

    pub fn is_coin_metadata(&self) -> bool {
        self.object_type.contains("::coin::CoinMetadata<")
    }
}

/// A completed deployment. Append-only: never mutated once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    pub module_name: String,
    pub creator: String,
    pub deployer: String,
    pub tx_hash: String,
    pub package_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub treasury_cap_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upgrade_cap_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coin_metadata_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub created_objects: Vec<CapabilityObject>,
    pub network: String,
    pub params: ContractParameters,
    /// Whether the treasury cap was handed over to the creator.
    #[serde(default)]
    pub capabilities_transferred: bool,
    pub created_at: DateTime<Utc>,
}

impl DeploymentRecord {
    pub fn token_key(&self) -> TokenKey {
        TokenKey::new(&self.creator, &self.params.symbol, &self.params.name)
    }
}

/// A dispatch that failed and was dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeadLetter {
    pub event: DedupKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<TokenKey>,
    /// Pipeline stage that failed: decode, render, assemble, build, publish, record.
    pub stage: String,
    pub error: String,
    pub failed_at: DateTime<Utc>,
}
