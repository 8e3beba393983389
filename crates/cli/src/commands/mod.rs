pub mod daemon;
pub mod deploy;
pub mod onboard;
pub mod render;
pub mod status;
pub mod tokens;

use std::sync::Arc;
use std::time::Duration;
use suiforge_config::AppConfig;
use suiforge_core::contract::{Capabilities, ContractParameters};
use suiforge_core::toolchain::Credentials;
use suiforge_pipeline::{Deployer, DeployerIdentity};
use suiforge_template::ContractRenderer;
use suiforge_toolchain::{FrameworkDependency, PackageAssembler, SuiCli, SuiCliConfig};

/// Token parameters given on the command line.
#[derive(clap::Args, Debug, Clone)]
pub struct TokenArgs {
    /// Token name, e.g. "Demo Coin"
    #[arg(long)]
    pub name: String,

    /// Ticker symbol
    #[arg(long)]
    pub symbol: String,

    #[arg(long, default_value_t = 9)]
    pub decimals: u8,

    /// Initial supply in whole tokens
    #[arg(long, default_value_t = 0)]
    pub supply: u64,

    #[arg(long, default_value = "")]
    pub description: String,

    #[arg(long, default_value = "")]
    pub icon_url: String,

    /// Override the module name derived from the token name
    #[arg(long)]
    pub module: Option<String>,

    #[arg(long)]
    pub no_mint: bool,

    #[arg(long)]
    pub no_burn: bool,

    #[arg(long)]
    pub no_transfer: bool,
}

impl TokenArgs {
    pub fn to_parameters(&self) -> ContractParameters {
        ContractParameters {
            name: self.name.clone(),
            symbol: self.symbol.clone(),
            decimals: self.decimals,
            description: self.description.clone(),
            initial_supply: self.supply,
            icon_url: self.icon_url.clone(),
            capabilities: Capabilities {
                mint: !self.no_mint,
                burn: !self.no_burn,
                transfer: !self.no_transfer,
            },
            module_name: self.module.clone(),
        }
    }
}

pub fn load_config() -> Result<AppConfig, Box<dyn std::error::Error>> {
    Ok(AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?)
}

pub fn renderer(config: &AppConfig) -> Result<ContractRenderer, Box<dyn std::error::Error>> {
    Ok(ContractRenderer::load(config.template.path.as_deref())?)
}

/// The configured deployer account. Both address and key are required.
pub fn identity(config: &AppConfig) -> Result<DeployerIdentity, Box<dyn std::error::Error>> {
    let address = config
        .deployer
        .address
        .clone()
        .ok_or("No deployer address configured (set [deployer].address or SUIFORGE_DEPLOYER_ADDRESS)")?;
    let key = config
        .deployer
        .private_key
        .clone()
        .ok_or("No deployer key configured (set SUIFORGE_DEPLOYER_PRIVATE_KEY)")?;
    Ok(DeployerIdentity {
        address,
        credentials: Credentials::new(key),
    })
}

pub fn deployer(config: &AppConfig) -> Deployer {
    let toolchain = SuiCli::new(SuiCliConfig {
        binary: config.toolchain.sui_binary.clone().into(),
        gas_budget: config.toolchain.gas_budget,
        build_timeout: Duration::from_secs(config.toolchain.build_timeout_secs),
        publish_timeout: Duration::from_secs(config.toolchain.publish_timeout_secs),
        scratch_dir: Some(config.storage.work_dir()),
    });
    let assembler = PackageAssembler::new(
        config.storage.work_dir(),
        FrameworkDependency::sui(&config.toolchain.framework_rev),
    );
    Deployer::new(assembler, Arc::new(toolchain))
}
