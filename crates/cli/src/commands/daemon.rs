//! `suiforge daemon` — Watch every enabled network and deploy new tokens.

use std::sync::Arc;
use std::time::Duration;
use suiforge_core::event::{DomainEvent, EventBus};
use suiforge_core::registry::TokenRegistry;
use suiforge_pipeline::Dispatcher;
use suiforge_registry::{DeadLetterLog, FileRegistry};
use suiforge_watcher::{NetworkWatcher, SuiRpcSource, WatcherSettings, WatcherSupervisor};
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Counts of what the daemon did, gathered from the event bus.
#[derive(Debug, Default)]
struct Tally {
    observed: u64,
    deployed: u64,
    skipped: u64,
    failed: u64,
    poll_failures: u64,
}

impl Tally {
    fn count(&mut self, event: &DomainEvent) {
        match event {
            DomainEvent::EventObserved { .. } => self.observed += 1,
            DomainEvent::DeploymentRecorded { .. } => self.deployed += 1,
            DomainEvent::DeploymentSkipped { .. } => self.skipped += 1,
            DomainEvent::DeploymentFailed { .. } => self.failed += 1,
            DomainEvent::PollFailed { .. } => self.poll_failures += 1,
        }
    }
}

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    let identity = super::identity(&config)?;

    let networks: Vec<_> = config.enabled_networks().cloned().collect();
    if networks.is_empty() {
        return Err("No enabled networks in config — enable one and set its factory_package_id".into());
    }

    let registry = Arc::new(FileRegistry::open(config.storage.registry_path())?);
    let dead_letters = Arc::new(DeadLetterLog::open(config.storage.dead_letter_path())?);
    let bus = Arc::new(EventBus::default());

    println!("suiforge daemon — starting");
    println!("   Deployer:  {}", identity.address);
    println!("   Registry:  {}", registry.path().display());
    println!("   Networks:  {}", networks.len());

    let mut events = bus.subscribe();
    let tally = tokio::spawn(async move {
        let mut tally = Tally::default();
        loop {
            match events.recv().await {
                Ok(event) => tally.count(&event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Event tally fell behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
        tally
    });

    let dispatcher = Arc::new(
        Dispatcher::new(
            super::renderer(&config)?,
            super::deployer(&config),
            registry.clone(),
            identity,
        )
        .with_dead_letters(dead_letters)
        .with_event_bus(bus.clone())
        .with_capability_transfer(config.toolchain.transfer_capabilities),
    );

    let mut supervisor = WatcherSupervisor::new(CancellationToken::new());
    for network in &networks {
        let source = SuiRpcSource::new(
            &network.name,
            &network.rpc_url,
            Duration::from_secs(config.watcher.request_timeout_secs),
        )?;
        let settings = WatcherSettings {
            event_type: config.watcher.event_type(&network.factory_package_id),
            batch_size: config.watcher.batch_size,
            poll_interval: Duration::from_secs(config.watcher.poll_interval_secs),
            error_backoff: Duration::from_secs(config.watcher.error_backoff_secs),
        };
        info!(
            network = %network.name,
            rpc_url = %network.rpc_url,
            event_type = %settings.event_type,
            "Watching network"
        );
        supervisor.spawn(
            NetworkWatcher::new(Arc::new(source), dispatcher.clone(), settings)
                .with_event_bus(bus.clone()),
        );
    }
    drop(dispatcher);
    drop(bus);

    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested, waiting for in-flight dispatches");

    let states = supervisor.shutdown().await;
    for state in &states {
        info!(
            network = %state.network,
            phase = %state.phase,
            seen = state.seen.len(),
            consecutive_failures = state.consecutive_failures,
            "Watcher stopped"
        );
    }

    let tally = tally.await?;
    println!("\nsuiforge daemon — stopped");
    println!("   Events observed:  {}", tally.observed);
    println!("   Deployed:         {}", tally.deployed);
    println!("   Skipped:          {}", tally.skipped);
    println!("   Failed:           {}", tally.failed);
    println!("   Poll failures:    {}", tally.poll_failures);
    println!("   Total recorded:   {}", registry.count().await?);

    Ok(())
}
