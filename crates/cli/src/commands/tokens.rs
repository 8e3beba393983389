//! `suiforge tokens` — List recorded deployments.

use suiforge_core::registry::{RecordFilter, TokenRegistry};
use suiforge_registry::FileRegistry;

pub async fn run(
    creator: Option<String>,
    deployer: Option<String>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    let registry = FileRegistry::open(config.storage.registry_path())?;
    let records = registry.query(&filter(creator, deployer)).await?;

    if json {
        for record in &records {
            println!("{}", serde_json::to_string(record)?);
        }
        return Ok(());
    }

    if records.is_empty() {
        println!("No deployments recorded in {}", registry.path().display());
        return Ok(());
    }

    println!(
        "{:<10} {:<12} {:<20} {:<68} CREATED",
        "NETWORK", "SYMBOL", "MODULE", "PACKAGE"
    );
    for record in &records {
        println!(
            "{:<10} {:<12} {:<20} {:<68} {}",
            record.network,
            record.params.symbol,
            record.module_name,
            record.package_id,
            record.created_at.format("%Y-%m-%d %H:%M:%S")
        );
    }
    println!("\n{} deployment(s)", records.len());

    Ok(())
}

fn filter(creator: Option<String>, deployer: Option<String>) -> RecordFilter {
    match (creator, deployer) {
        (Some(creator), _) => RecordFilter::Creator(creator),
        (None, Some(deployer)) => RecordFilter::Deployer(deployer),
        (None, None) => RecordFilter::All,
    }
}
