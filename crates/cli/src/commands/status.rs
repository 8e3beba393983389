//! `suiforge status` — Show configuration and registry status.

use suiforge_config::AppConfig;
use suiforge_core::registry::TokenRegistry;
use suiforge_registry::{DeadLetterLog, FileRegistry};

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;

    println!("suiforge Status");
    println!("===============");
    println!("  Config dir:   {}", AppConfig::config_dir().display());
    println!("  Data dir:     {}", config.storage.data_dir().display());
    println!("  Work dir:     {}", config.storage.work_dir().display());
    println!("  Sui binary:   {}", config.toolchain.sui_binary);
    println!("  Gas budget:   {}", config.toolchain.gas_budget);
    println!(
        "  Template:     {}",
        config
            .template
            .path
            .as_ref()
            .map_or_else(|| "built-in".to_string(), |p| p.display().to_string())
    );
    println!(
        "  Deployer:     {}",
        config.deployer.address.as_deref().unwrap_or("(not set)")
    );
    println!(
        "  Deployer key: {}",
        if config.deployer.private_key.is_some() { "set" } else { "missing" }
    );
    println!(
        "  Cap transfer: {}",
        if config.toolchain.transfer_capabilities { "enabled" } else { "disabled" }
    );

    println!("\n  Networks:");
    if config.networks.is_empty() {
        println!("    (none configured)");
    }
    for network in &config.networks {
        println!(
            "    {} {:<10} {}  factory {}",
            if network.enabled { "●" } else { "○" },
            network.name,
            network.rpc_url,
            network.factory_package_id
        );
    }

    let registry = FileRegistry::open(config.storage.registry_path())?;
    let dead_letters = DeadLetterLog::open(config.storage.dead_letter_path())?;
    println!("\n  Deployments:  {}", registry.count().await?);
    println!("  Dead letters: {}", dead_letters.entries().await?.len());

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("\n  ✅ Config file found");
    } else {
        println!("\n  ⚠️  No config file — run `suiforge onboard` first");
    }

    Ok(())
}
