//! suiforge CLI — the main entry point.
//!
//! Commands:
//! - `onboard` — Create the config directory and a starter config
//! - `daemon`  — Watch every enabled network and deploy requested tokens
//! - `render`  — Print the Move source for a token
//! - `deploy`  — Render, build and publish one token by hand
//! - `tokens`  — List recorded deployments
//! - `status`  — Show configuration and registry status

use clap::{Parser, Subcommand};

mod commands;

use commands::TokenArgs;

#[derive(Parser)]
#[command(
    name = "suiforge",
    about = "suiforge — Sui token factory watcher and coin publisher",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration and data directories
    Onboard,

    /// Watch the configured networks and deploy every new token
    Daemon,

    /// Render the coin module for a token without deploying it
    Render {
        #[command(flatten)]
        token: TokenArgs,

        /// Write the source here instead of stdout
        #[arg(short, long)]
        out: Option<std::path::PathBuf>,
    },

    /// Build and publish one token with the configured deployer
    Deploy {
        #[command(flatten)]
        token: TokenArgs,

        /// Record the deployment in the registry under this creator address
        #[arg(long)]
        record_for: Option<String>,

        /// Network tag stored with the record
        #[arg(long, default_value = "manual")]
        network: String,
    },

    /// List recorded deployments
    Tokens {
        /// Only tokens created by this address
        #[arg(long, conflicts_with = "deployer")]
        creator: Option<String>,

        /// Only tokens published by this deployer address
        #[arg(long)]
        deployer: Option<String>,

        /// Print records as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Show system status
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Daemon => commands::daemon::run().await?,
        Commands::Render { token, out } => commands::render::run(token, out).await?,
        Commands::Deploy {
            token,
            record_for,
            network,
        } => commands::deploy::run(token, record_for, network).await?,
        Commands::Tokens {
            creator,
            deployer,
            json,
        } => commands::tokens::run(creator, deployer, json).await?,
        Commands::Status => commands::status::run().await?,
    }

    Ok(())
}
