//! `suiforge deploy` — Publish one token by hand.

use suiforge_core::registry::TokenRegistry;
use suiforge_registry::FileRegistry;
use tracing::info;

use super::TokenArgs;

pub async fn run(
    token: TokenArgs,
    record_for: Option<String>,
    network: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    let identity = super::identity(&config)?;
    let params = token.to_parameters();
    let rendered = super::renderer(&config)?.render(&params)?;

    info!(module = %rendered.module_name, deployer = %identity.address, "Deploying");
    let receipt = super::deployer(&config)
        .deploy(
            &rendered.source,
            &rendered.module_name,
            &identity.address,
            &identity.credentials,
        )
        .await?;

    println!("{}", serde_json::to_string_pretty(&receipt)?);

    if let Some(creator) = record_for {
        let registry = FileRegistry::open(config.storage.registry_path())?;
        let record = receipt.into_record(rendered.module_name, creator, network, params, false);
        registry.append(record).await?;
        eprintln!("✅ Recorded in {}", registry.path().display());
    }

    Ok(())
}
