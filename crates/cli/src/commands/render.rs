//! `suiforge render` — Print a token's Move source.

use std::path::PathBuf;

use super::TokenArgs;

pub async fn run(token: TokenArgs, out: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    let rendered = super::renderer(&config)?.render(&token.to_parameters())?;

    match out {
        Some(path) => {
            std::fs::write(&path, &rendered.source)?;
            eprintln!(
                "✅ Wrote module {}::{} to {}",
                rendered.module_name,
                rendered.module_name,
                path.display()
            );
        }
        None => print!("{}", rendered.source),
    }

    Ok(())
}
