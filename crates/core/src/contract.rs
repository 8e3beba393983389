//! Contract parameters and the rendered Move source they produce.

use serde::{Deserialize, Serialize};

/// Optional entry points compiled into the generated coin module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    #[serde(default = "default_true")]
    pub mint: bool,
    #[serde(default = "default_true")]
    pub burn: bool,
    #[serde(default = "default_true")]
    pub transfer: bool,
}

fn default_true() -> bool {
    true
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            mint: true,
            burn: true,
            transfer: true,
        }
    }
}

impl Capabilities {
    /// `(section name, enabled)` pairs in template order.
    pub fn sections(&self) -> [(&'static str, bool); 3] {
        [
            ("mint", self.mint),
            ("burn", self.burn),
            ("transfer", self.transfer),
        ]
    }
}

/// Everything needed to render one coin module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractParameters {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    #[serde(default)]
    pub description: String,
    /// Whole tokens; scaled by `10^decimals` when minted.
    pub initial_supply: u64,
    #[serde(default)]
    pub icon_url: String,
    #[serde(flatten)]
    pub capabilities: Capabilities,
    /// Overrides the module name derived from `name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_name: Option<String>,
}

/// Final Move source for one deployment attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedContract {
    pub module_name: String,
    /// One-time witness type; the uppercased module name.
    pub witness_name: String,
    pub source: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capabilities_default_to_enabled_when_omitted() {
        let json = r#"{"name":"Demo","symbol":"DEMO","decimals":6,"initial_supply":1000000}"#;
        let params: ContractParameters = serde_json::from_str(json).unwrap();
        assert_eq!(params.capabilities, Capabilities::default());
        assert!(params.module_name.is_none());
        assert!(params.description.is_empty());
    }

    #[test]
    fn capability_flags_are_flattened() {
        let json = r#"{"name":"Demo","symbol":"DEMO","decimals":6,"initial_supply":1,"burn":false}"#;
        let params: ContractParameters = serde_json::from_str(json).unwrap();
        assert!(params.capabilities.mint);
        assert!(!params.capabilities.burn);
        assert!(params.capabilities.transfer);
    }
}
