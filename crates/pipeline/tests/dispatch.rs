//! End-to-end dispatch tests against a scripted toolchain.

use async_trait::async_trait;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use suiforge_core::chain::{ChainEvent, EventPage, EventQuery};
use suiforge_core::deployment::{CapabilityObject, TokenKey};
use suiforge_core::error::{Phase, SourceError, ToolchainError};
use suiforge_core::event::{DomainEvent, EventBus};
use suiforge_core::registry::{RecordFilter, TokenRegistry};
use suiforge_core::source::EventSource;
use suiforge_core::toolchain::{BuildOutput, Credentials, PublishReceipt, Toolchain};
use suiforge_pipeline::{DeployerIdentity, Deployer, DispatchOutcome, Dispatcher};
use suiforge_registry::{DeadLetterLog, FileRegistry, InMemoryRegistry};
use suiforge_template::ContractRenderer;
use suiforge_toolchain::{FrameworkDependency, PackageAssembler};
use suiforge_watcher::{NetworkWatcher, WatcherSettings};
use tokio_util::sync::CancellationToken;

const CREATOR: &str = "0xc0ffee";
const DEPLOYER: &str = "0xd3p";

// ── Fakes ─────────────────────────────────────────────

#[derive(Default)]
struct FakeToolchain {
    built: Mutex<Vec<(PathBuf, bool)>>,
    transfers: Mutex<Vec<(String, String)>>,
    publishes: AtomicUsize,
    fail_build: AtomicBool,
    fail_transfer: AtomicBool,
    publish_delay: Option<Duration>,
}

impl FakeToolchain {
    fn slow(delay: Duration) -> Self {
        Self {
            publish_delay: Some(delay),
            ..Self::default()
        }
    }

    fn publishes(&self) -> usize {
        self.publishes.load(Ordering::SeqCst)
    }

    /// `(package dir, whether Move.toml existed at build time)` per build.
    fn builds(&self) -> Vec<(PathBuf, bool)> {
        self.built.lock().unwrap().clone()
    }
}

#[async_trait]
impl Toolchain for FakeToolchain {
    fn name(&self) -> &str {
        "fake"
    }

    async fn build(&self, package_dir: &Path) -> Result<BuildOutput, ToolchainError> {
        let present = package_dir.join("Move.toml").is_file() && package_dir.join("sources").is_dir();
        self.built.lock().unwrap().push((package_dir.to_path_buf(), present));
        if self.fail_build.load(Ordering::SeqCst) {
            return Err(ToolchainError::Failed {
                phase: Phase::Build,
                exit_code: Some(1),
                diagnostic: "error[E03002]: unbound module".into(),
            });
        }
        Ok(BuildOutput::default())
    }

    async fn publish(
        &self,
        _package_dir: &Path,
        _credentials: &Credentials,
    ) -> Result<PublishReceipt, ToolchainError> {
        let n = self.publishes.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.publish_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(PublishReceipt {
            tx_digest: format!("Tx{n}"),
            package_id: format!("0xpkg{n}"),
            created_objects: vec![
                CapabilityObject {
                    object_type: format!("0x2::coin::TreasuryCap<0xpkg{n}::demo::DEMO>"),
                    object_id: format!("0xtreasury{n}"),
                },
                CapabilityObject {
                    object_type: "0x2::package::UpgradeCap".into(),
                    object_id: format!("0xupgrade{n}"),
                },
            ],
        })
    }

    async fn transfer_object(
        &self,
        object_id: &str,
        recipient: &str,
        _credentials: &Credentials,
    ) -> Result<String, ToolchainError> {
        self.transfers
            .lock()
            .unwrap()
            .push((object_id.to_string(), recipient.to_string()));
        if self.fail_transfer.load(Ordering::SeqCst) {
            return Err(ToolchainError::Failed {
                phase: Phase::Transfer,
                exit_code: Some(1),
                diagnostic: "insufficient gas".into(),
            });
        }
        Ok("TxTransfer".into())
    }
}

/// A network whose event log can grow while a watcher polls it.
struct BacklogSource {
    network: String,
    log: Mutex<Vec<ChainEvent>>,
    queries: AtomicUsize,
}

impl BacklogSource {
    fn new(network: &str, backlog: Vec<ChainEvent>) -> Self {
        Self {
            network: network.into(),
            log: Mutex::new(backlog),
            queries: AtomicUsize::new(0),
        }
    }

    /// Wait until the watcher has bootstrapped and polled at least once.
    async fn wait_for_polling(&self) {
        for _ in 0..500 {
            if self.queries.load(Ordering::SeqCst) >= 2 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("watcher never started polling");
    }

    fn emit(&self, event: ChainEvent) {
        self.log.lock().unwrap().push(event);
    }
}

#[async_trait]
impl EventSource for BacklogSource {
    fn network(&self) -> &str {
        &self.network
    }

    async fn query(&self, query: &EventQuery) -> Result<EventPage, SourceError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        let log = self.log.lock().unwrap();
        if query.descending {
            return Ok(EventPage {
                events: log.iter().rev().take(query.limit).cloned().collect(),
                next_cursor: None,
                has_next_page: log.len() > query.limit,
            });
        }
        let start = match &query.cursor {
            Some(cursor) => log
                .iter()
                .position(|e| &e.cursor() == cursor)
                .map_or(0, |i| i + 1),
            None => 0,
        };
        let events: Vec<ChainEvent> = log.iter().skip(start).take(query.limit).cloned().collect();
        Ok(EventPage {
            next_cursor: events.last().map(ChainEvent::cursor),
            has_next_page: start + events.len() < log.len(),
            events,
        })
    }
}

// ── Helpers ───────────────────────────────────────────

fn bytes(s: &str) -> Value {
    Value::from(s.as_bytes().to_vec())
}

fn creation_event(network: &str, digest: &str, seq: u64, name: &str, symbol: &str) -> ChainEvent {
    let fields = json!({
        "creator": CREATOR,
        "name": bytes(name),
        "symbol": bytes(symbol),
        "description": bytes("Created by the factory"),
        "metadata_uri": bytes(""),
        "decimals": 6,
        "initial_supply": "1000000"
    });
    let Value::Object(fields) = fields else {
        unreachable!()
    };
    ChainEvent {
        network: network.into(),
        tx_digest: digest.into(),
        event_seq: seq,
        fields,
        sender: Some(CREATOR.into()),
        timestamp_ms: Some(1_700_000_000_000),
    }
}

fn dispatcher(
    work: &Path,
    toolchain: Arc<FakeToolchain>,
    registry: Arc<dyn TokenRegistry>,
) -> Dispatcher {
    let assembler = PackageAssembler::new(work, FrameworkDependency::sui("framework/testnet"));
    Dispatcher::new(
        ContractRenderer::builtin(),
        Deployer::new(assembler, toolchain),
        registry,
        DeployerIdentity {
            address: DEPLOYER.into(),
            credentials: Credentials::new("11".repeat(32)),
        },
    )
}

fn entries(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}

async fn wait_for_records(registry: &dyn TokenRegistry, count: usize) {
    for _ in 0..500 {
        if registry.count().await.unwrap() >= count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("registry never reached {count} records");
}

// ── Scenarios ─────────────────────────────────────────

#[tokio::test]
async fn new_event_after_bootstrap_is_deployed_once() {
    let tmp = tempfile::tempdir().unwrap();
    let toolchain = Arc::new(FakeToolchain::default());
    let registry = Arc::new(InMemoryRegistry::new());
    let dispatcher = Arc::new(dispatcher(&tmp.path().join("work"), toolchain.clone(), registry.clone()));

    let source = Arc::new(BacklogSource::new(
        "testnet",
        vec![
            creation_event("testnet", "Old1", 0, "Old One", "OLD1"),
            creation_event("testnet", "Old2", 0, "Old Two", "OLD2"),
        ],
    ));
    let settings = WatcherSettings {
        event_type: "0x18df::factory::TokenCreationEvent".into(),
        batch_size: 20,
        poll_interval: Duration::from_millis(10),
        error_backoff: Duration::from_millis(10),
    };
    let token = CancellationToken::new();
    let watcher = NetworkWatcher::new(source.clone(), dispatcher, settings);
    let task = tokio::spawn(watcher.run(token.clone()));

    source.wait_for_polling().await;
    source.emit(creation_event("testnet", "Fresh", 0, "Demo", "DEMO"));
    wait_for_records(registry.as_ref(), 1).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    token.cancel();
    let state = task.await.unwrap();
    assert!(state.bootstrapped);

    let records = registry.query(&RecordFilter::All).await.unwrap();
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.params.symbol, "DEMO");
    assert_eq!(record.params.decimals, 6);
    assert_eq!(record.params.initial_supply, 1_000_000);
    assert_eq!(record.module_name, "demo");
    assert_eq!(record.network, "testnet");
    assert_eq!(record.deployer, DEPLOYER);
    assert_eq!(record.treasury_cap_id.as_deref(), Some("0xtreasury0"));
    assert_eq!(record.upgrade_cap_id.as_deref(), Some("0xupgrade0"));
    assert!(!record.capabilities_transferred);
    assert_eq!(toolchain.publishes(), 1);
}

#[tokio::test]
async fn repeated_event_is_deployed_once() {
    let tmp = tempfile::tempdir().unwrap();
    let toolchain = Arc::new(FakeToolchain::default());
    let registry = Arc::new(InMemoryRegistry::new());
    let bus = Arc::new(EventBus::new(16));
    let mut rx = bus.subscribe();
    let dispatcher =
        dispatcher(&tmp.path().join("work"), toolchain.clone(), registry.clone()).with_event_bus(bus);

    let event = creation_event("testnet", "Tx", 0, "Demo", "DEMO");
    assert!(dispatcher.dispatch(&event).await.is_deployed());

    // Redelivered after a restart: same token, different event id.
    let redelivered = creation_event("testnet", "Tx", 1, "Demo", "DEMO");
    let outcome = dispatcher.dispatch(&redelivered).await;
    assert!(
        matches!(outcome, DispatchOutcome::Duplicate(ref key) if *key == TokenKey::new(CREATOR, "DEMO", "Demo"))
    );

    assert_eq!(toolchain.publishes(), 1);
    assert_eq!(registry.count().await.unwrap(), 1);
    assert!(matches!(rx.recv().await.unwrap().as_ref(), DomainEvent::DeploymentRecorded { .. }));
    assert!(matches!(rx.recv().await.unwrap().as_ref(), DomainEvent::DeploymentSkipped { .. }));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_dispatches_record_one_deployment() {
    let tmp = tempfile::tempdir().unwrap();
    let toolchain = Arc::new(FakeToolchain::slow(Duration::from_millis(100)));
    let registry = Arc::new(FileRegistry::open(tmp.path().join("tokens.jsonl")).unwrap());
    let dispatcher = Arc::new(
        dispatcher(&tmp.path().join("work"), toolchain.clone(), registry.clone())
            .with_capability_transfer(true),
    );

    let a = creation_event("testnet", "TxA", 0, "Demo", "DEMO");
    let b = creation_event("devnet", "TxB", 0, "Demo", "DEMO");
    let (first, second) = tokio::join!(
        tokio::spawn({
            let d = dispatcher.clone();
            async move { d.dispatch(&a).await }
        }),
        tokio::spawn({
            let d = dispatcher.clone();
            async move { d.dispatch(&b).await }
        }),
    );
    let outcomes = [first.unwrap(), second.unwrap()];

    let deployed = outcomes.iter().filter(|o| o.is_deployed()).count();
    let duplicates = outcomes
        .iter()
        .filter(|o| matches!(o, DispatchOutcome::Duplicate(_)))
        .count();
    assert_eq!(deployed, 1);
    assert_eq!(duplicates, 1);
    assert_eq!(toolchain.publishes(), 1);
    assert_eq!(toolchain.transfers.lock().unwrap().len(), 1);
    assert_eq!(registry.count().await.unwrap(), 1);

    let reopened = FileRegistry::open(registry.path()).unwrap();
    assert_eq!(reopened.count().await.unwrap(), 1);
}

#[tokio::test]
async fn package_directory_is_removed_after_success() {
    let tmp = tempfile::tempdir().unwrap();
    let work = tmp.path().join("work");
    let toolchain = Arc::new(FakeToolchain::default());
    let dispatcher = dispatcher(&work, toolchain.clone(), Arc::new(InMemoryRegistry::new()));

    let outcome = dispatcher
        .dispatch(&creation_event("testnet", "Tx", 0, "Demo", "DEMO"))
        .await;
    assert!(outcome.is_deployed());

    let builds = toolchain.builds();
    assert_eq!(builds.len(), 1);
    assert!(builds[0].1, "package was not assembled before build");
    assert!(builds[0].0.starts_with(&work));
    assert!(!builds[0].0.exists());
    assert_eq!(entries(&work), 0);
}

#[tokio::test]
async fn build_failure_drops_event_and_cleans_up() {
    let tmp = tempfile::tempdir().unwrap();
    let work = tmp.path().join("work");
    let toolchain = Arc::new(FakeToolchain::default());
    toolchain.fail_build.store(true, Ordering::SeqCst);
    let registry = Arc::new(InMemoryRegistry::new());
    let dead_letters = Arc::new(DeadLetterLog::open(tmp.path().join("dead_letters.jsonl")).unwrap());
    let dispatcher = dispatcher(&work, toolchain.clone(), registry.clone())
        .with_dead_letters(dead_letters.clone());

    let outcome = dispatcher
        .dispatch(&creation_event("testnet", "Tx", 3, "Demo", "DEMO"))
        .await;
    match outcome {
        DispatchOutcome::Dropped { stage, error } => {
            assert_eq!(stage, "build");
            assert!(error.contains("unbound module"));
        }
        other => panic!("expected Dropped, got {other:?}"),
    }

    assert_eq!(toolchain.publishes(), 0);
    assert_eq!(registry.count().await.unwrap(), 0);
    assert_eq!(entries(&work), 0);

    let letters = dead_letters.entries().await.unwrap();
    assert_eq!(letters.len(), 1);
    assert_eq!(letters[0].stage, "build");
    assert_eq!(letters[0].event.event_seq, 3);
    assert_eq!(letters[0].token, Some(TokenKey::new(CREATOR, "DEMO", "Demo")));
}

#[tokio::test]
async fn failed_dispatch_releases_token_for_redelivery() {
    let tmp = tempfile::tempdir().unwrap();
    let toolchain = Arc::new(FakeToolchain::default());
    toolchain.fail_build.store(true, Ordering::SeqCst);
    let registry = Arc::new(InMemoryRegistry::new());
    let dispatcher = dispatcher(&tmp.path().join("work"), toolchain.clone(), registry.clone());

    let outcome = dispatcher
        .dispatch(&creation_event("testnet", "Tx", 0, "Demo", "DEMO"))
        .await;
    assert!(matches!(outcome, DispatchOutcome::Dropped { stage: "build", .. }));

    toolchain.fail_build.store(false, Ordering::SeqCst);
    let outcome = dispatcher
        .dispatch(&creation_event("testnet", "Tx", 1, "Demo", "DEMO"))
        .await;
    assert!(outcome.is_deployed());
    assert_eq!(toolchain.publishes(), 1);
    assert_eq!(registry.count().await.unwrap(), 1);
}

#[tokio::test]
async fn undecodable_event_is_dead_lettered() {
    let tmp = tempfile::tempdir().unwrap();
    let toolchain = Arc::new(FakeToolchain::default());
    let dead_letters = Arc::new(DeadLetterLog::open(tmp.path().join("dead_letters.jsonl")).unwrap());
    let dispatcher = dispatcher(
        &tmp.path().join("work"),
        toolchain.clone(),
        Arc::new(InMemoryRegistry::new()),
    )
    .with_dead_letters(dead_letters.clone());

    let mut event = creation_event("testnet", "Tx", 0, "Demo", "DEMO");
    event.fields.remove("decimals");
    let outcome = dispatcher.dispatch(&event).await;
    assert!(matches!(outcome, DispatchOutcome::Dropped { stage: "decode", .. }));
    assert!(toolchain.builds().is_empty());

    let letters = dead_letters.entries().await.unwrap();
    assert_eq!(letters.len(), 1);
    assert!(letters[0].token.is_none());
    assert!(letters[0].error.contains("decimals"));
}

#[tokio::test]
async fn treasury_cap_is_transferred_to_creator() {
    let tmp = tempfile::tempdir().unwrap();
    let toolchain = Arc::new(FakeToolchain::default());
    let dispatcher = dispatcher(
        &tmp.path().join("work"),
        toolchain.clone(),
        Arc::new(InMemoryRegistry::new()),
    )
    .with_capability_transfer(true);

    let outcome = dispatcher
        .dispatch(&creation_event("testnet", "Tx", 0, "Demo", "DEMO"))
        .await;
    let DispatchOutcome::Deployed(record) = outcome else {
        panic!("expected Deployed");
    };
    assert!(record.capabilities_transferred);
    assert_eq!(
        toolchain.transfers.lock().unwrap().clone(),
        vec![("0xtreasury0".to_string(), CREATOR.to_string())]
    );
}

#[tokio::test]
async fn failed_transfer_still_records_deployment() {
    let tmp = tempfile::tempdir().unwrap();
    let toolchain = Arc::new(FakeToolchain::default());
    toolchain.fail_transfer.store(true, Ordering::SeqCst);
    let registry = Arc::new(InMemoryRegistry::new());
    let dispatcher = dispatcher(&tmp.path().join("work"), toolchain.clone(), registry.clone())
        .with_capability_transfer(true);

    let outcome = dispatcher
        .dispatch(&creation_event("testnet", "Tx", 0, "Demo", "DEMO"))
        .await;
    assert!(outcome.is_deployed());

    let records = registry
        .query(&RecordFilter::Creator(CREATOR.into()))
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
    assert!(!records[0].capabilities_transferred);
}
