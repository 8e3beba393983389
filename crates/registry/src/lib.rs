//! Token registry backends for suiforge.
//!
//! - **File** — append-only JSONL with an in-memory index (default)
//! - **In-memory** — for tests and dry runs
//!
//! Also hosts the [`DeadLetterLog`] for dropped dispatches.

pub mod dead_letter;
pub mod file;
pub mod in_memory;
mod jsonl;

pub use dead_letter::DeadLetterLog;
pub use file::FileRegistry;
pub use in_memory::InMemoryRegistry;

#[cfg(test)]
pub(crate) mod testing {
    use chrono::Utc;
    use suiforge_core::contract::{Capabilities, ContractParameters};
    use suiforge_core::deployment::DeploymentRecord;

    pub fn record(creator: &str, symbol: &str, name: &str) -> DeploymentRecord {
        DeploymentRecord {
            module_name: name.to_lowercase(),
            creator: creator.into(),
            deployer: "0xd3p".into(),
            tx_hash: format!("Tx{symbol}"),
            package_id: format!("0xpkg-{symbol}"),
            treasury_cap_id: Some("0xtc".into()),
            upgrade_cap_id: None,
            coin_metadata_id: None,
            created_objects: vec![],
            network: "testnet".into(),
            params: ContractParameters {
                name: name.into(),
                symbol: symbol.into(),
                decimals: 6,
                description: String::new(),
                initial_supply: 1_000_000,
                icon_url: String::new(),
                capabilities: Capabilities::default(),
                module_name: None,
            },
            capabilities_transferred: false,
            created_at: Utc::now(),
        }
    }
}
