//! Versioned schema snapshots and the single in-flight import
//!
//! Readers take an `Arc` of the current snapshot and keep it as long as they
//! like. An import builds its graph privately and swaps the snapshot in one
//! step, so a reader sees either the old graph or the new one. A later
//! refresh supersedes an earlier one: the earlier task is cancelled and can no
//! longer publish.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use error_stack::Report;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::graph::SchemaGraph;
use super::importer::{ImportProgress, import_with_progress};
use crate::error::{DiscardCancelled, Error, Result};
use crate::rpc::Specification;
use crate::service::{RegistryService, RpcService, SchemaFilter};
use crate::type_path::TypePath;

/// Observable state of the schema import
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ImportStatus {
    /// Nothing requested yet
    #[default]
    Idle,
    /// Waiting for `registry.schema` and `rpc.discover`
    Requesting,
    /// Linking types
    Importing {
        /// Types linked so far
        completed: usize,
        /// Types in the registry
        total:     usize,
        /// Type linked last
        current:   TypePath,
    },
    /// Snapshot `version` was published
    Completed {
        /// Version of the published snapshot
        version: u64,
    },
    /// The import failed; the previous snapshot stays current
    Failed(String),
}

impl ImportStatus {
    /// An import is requesting or linking
    pub const fn is_running(&self) -> bool {
        matches!(self, Self::Requesting | Self::Importing { .. })
    }

    /// The last import completed or failed
    pub const fn is_finished(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Failed(_))
    }
}

impl From<ImportProgress> for ImportStatus {
    fn from(progress: ImportProgress) -> Self {
        Self::Importing {
            completed: progress.completed,
            total:     progress.total,
            current:   progress.current,
        }
    }
}

/// One published import
#[derive(Debug, Default)]
pub struct SchemaSnapshot {
    graph:         Arc<SchemaGraph>,
    specification: Option<Specification>,
    version:       u64,
}

impl SchemaSnapshot {
    /// Linked type graph
    pub const fn graph(&self) -> &Arc<SchemaGraph> {
        &self.graph
    }

    /// Discovery document fetched alongside the registry
    pub const fn specification(&self) -> Option<&Specification> {
        self.specification.as_ref()
    }

    /// Zero until the first import completes, then incremented per import
    pub const fn version(&self) -> u64 {
        self.version
    }
}

type ImportOutcome = Result<Option<Arc<SchemaSnapshot>>>;

struct ImportTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

struct StoreInner {
    registry:   RegistryService,
    rpc:        RpcService,
    filter:     SchemaFilter,
    snapshot:   RwLock<Arc<SchemaSnapshot>>,
    status:     watch::Sender<ImportStatus>,
    task:       Mutex<Option<ImportTask>>,
    generation: AtomicU64,
}

/// Holder of the current schema graph
#[derive(Clone)]
pub struct SchemaStore {
    inner: Arc<StoreInner>,
}

impl std::fmt::Debug for SchemaStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaStore")
            .field("version", &self.snapshot().version())
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

impl SchemaStore {
    /// Store importing the whole registry
    pub fn new(registry: RegistryService, rpc: RpcService) -> Self {
        Self::with_filter(registry, rpc, SchemaFilter::default())
    }

    /// Store importing only the types selected by `filter`
    pub fn with_filter(registry: RegistryService, rpc: RpcService, filter: SchemaFilter) -> Self {
        let (status, _) = watch::channel(ImportStatus::Idle);
        Self {
            inner: Arc::new(StoreInner {
                registry,
                rpc,
                filter,
                snapshot: RwLock::new(Arc::new(SchemaSnapshot::default())),
                status,
                task: Mutex::new(None),
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// The current snapshot
    pub fn snapshot(&self) -> Arc<SchemaSnapshot> {
        Arc::clone(
            &self
                .inner
                .snapshot
                .read()
                .unwrap_or_else(PoisonError::into_inner),
        )
    }

    /// Graph of the current snapshot
    pub fn graph(&self) -> Arc<SchemaGraph> {
        Arc::clone(self.snapshot().graph())
    }

    /// Status of the latest import
    pub fn status(&self) -> ImportStatus {
        self.inner.status.borrow().clone()
    }

    /// Receiver notified on every status change
    pub fn subscribe(&self) -> watch::Receiver<ImportStatus> {
        self.inner.status.subscribe()
    }

    /// Wait until the current import completes or fails
    ///
    /// Returns immediately with the last outcome when nothing is running.
    pub async fn wait(&self) -> ImportStatus {
        let mut receiver = self.subscribe();
        receiver
            .wait_for(|status| status.is_finished() || *status == ImportStatus::Idle)
            .await
            .map_or_else(|_| self.status(), |status| status.clone())
    }

    /// Start an import in the background, superseding any import in flight
    ///
    /// Must be called from within a tokio runtime.
    pub fn refresh(&self) {
        let mut task = self.lock_task();
        drop(self.spawn(&mut task));
    }

    /// Start the initial import unless one already completed or is running
    ///
    /// Returns whether an import was started.
    pub fn first_time_refresh(&self) -> bool {
        let mut task = self.lock_task();
        if self.snapshot().version() > 0 || self.status().is_running() {
            debug!("Ignoring first-time schema refresh");
            return false;
        }
        drop(self.spawn(&mut task));
        true
    }

    /// Start an import, superseding any import in flight, and wait for it
    ///
    /// The import runs on its own task: dropping the returned future stops the
    /// wait, not the import. Fails with [`Error::Cancelled`] when a later
    /// refresh supersedes it.
    pub async fn load(&self) -> Result<Arc<SchemaSnapshot>> {
        let outcome = {
            let mut task = self.lock_task();
            self.spawn(&mut task)
        };
        outcome
            .await
            .map_err(|_| Self::superseded())??
            .ok_or_else(Self::superseded)
    }

    fn spawn(&self, slot: &mut Option<ImportTask>) -> oneshot::Receiver<ImportOutcome> {
        let (generation, cancel) = self.begin(slot);
        let (sender, receiver) = oneshot::channel();
        let store = self.clone();
        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            let outcome = store.run(generation, &token).await;
            let _ = sender.send(store.finish(generation, outcome));
        });
        *slot = Some(ImportTask { cancel, handle });
        receiver
    }

    fn lock_task(&self) -> std::sync::MutexGuard<'_, Option<ImportTask>> {
        self.inner
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Cancel the task in `slot` and open a new generation
    fn begin(&self, slot: &mut Option<ImportTask>) -> (u64, CancellationToken) {
        if let Some(previous) = slot.take() {
            info!("Superseding in-flight schema import");
            previous.cancel.cancel();
            previous.handle.abort();
        }
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.status.send_replace(ImportStatus::Requesting);
        (generation, CancellationToken::new())
    }

    fn is_current(&self, generation: u64) -> bool {
        self.inner.generation.load(Ordering::SeqCst) == generation
    }

    fn superseded() -> Report<Error> {
        Report::new(Error::Cancelled).attach("Schema import was superseded")
    }

    async fn run(&self, generation: u64, cancel: &CancellationToken) -> Result<Arc<SchemaSnapshot>> {
        let inner = &self.inner;
        let (registry, specification) = futures::join!(
            inner.registry.schema_cancellable(&inner.filter, cancel),
            inner.rpc.discover_cancellable(cancel),
        );
        let registry = registry?;
        let specification = specification?;
        if cancel.is_cancelled() {
            return Err(Self::superseded());
        }

        info!("Importing {} registry types", registry.len());
        let store = self.clone();
        let graph = tokio::task::spawn_blocking(move || {
            import_with_progress(&registry, |progress| {
                if store.is_current(generation) {
                    store.inner.status.send_replace(progress.into());
                }
            })
        })
        .await
        .map_err(|e| Report::new(Error::failed_to("link registry types", e)))??;

        let mut current = inner
            .snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if cancel.is_cancelled() || !self.is_current(generation) {
            return Err(Self::superseded());
        }
        let snapshot = Arc::new(SchemaSnapshot {
            graph: Arc::new(graph),
            specification: Some(specification),
            version: current.version + 1,
        });
        *current = Arc::clone(&snapshot);
        drop(current);

        info!(
            "Published schema version {} with {} types",
            snapshot.version,
            snapshot.graph.len()
        );
        Ok(snapshot)
    }

    /// Publish the outcome of generation `generation` on the status channel
    ///
    /// Cancellation is swallowed and leaves the status to the superseding import.
    fn finish(&self, generation: u64, outcome: Result<Arc<SchemaSnapshot>>) -> ImportOutcome {
        let outcome = outcome.discard_cancelled();
        if !self.is_current(generation) {
            return outcome;
        }
        match &outcome {
            Ok(Some(snapshot)) => {
                self.inner.status.send_replace(ImportStatus::Completed {
                    version: snapshot.version,
                });
            },
            Ok(None) => {},
            Err(report) => {
                warn!("Schema import failed: {report:?}");
                self.inner
                    .status
                    .send_replace(ImportStatus::Failed(report.current_context().to_string()));
            },
        }
        outcome
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use serde_json::{Value, json};

    use super::*;
    use crate::rpc::mock::MockTransport;
    use crate::rpc::{RpcClient, RpcMethod};

    fn registry(type_path: &str) -> Value {
        json!({
            type_path: {
                "shortPath": type_path,
                "kind": "Struct",
                "properties": {"value": {"type": {"$ref": "#/$defs/f32"}}}
            }
        })
    }

    fn discovery() -> Value {
        json!({
            "openrpc": "1.3.2",
            "info": {"title": "Bevy Remote Protocol", "version": "0.17.0"},
            "methods": [{"name": "registry.schema"}]
        })
    }

    fn store(mock: &MockTransport) -> SchemaStore {
        let client = RpcClient::with_transport(mock.clone());
        SchemaStore::new(
            RegistryService::new(client.clone()),
            RpcService::new(client),
        )
    }

    #[tokio::test]
    async fn test_refresh_publishes_snapshot() {
        let mock = MockTransport::new()
            .respond(RpcMethod::RegistrySchema, registry("game::Health"))
            .respond(RpcMethod::Discover, discovery());
        let store = store(&mock);
        assert_eq!(store.status(), ImportStatus::Idle);
        assert_eq!(store.snapshot().version(), 0);

        store.refresh();
        assert_eq!(store.status(), ImportStatus::Requesting);
        assert_eq!(store.wait().await, ImportStatus::Completed { version: 1 });

        let snapshot = store.snapshot();
        assert_eq!(snapshot.version(), 1);
        assert!(snapshot.graph().get("game::Health").is_some());
        assert!(snapshot.graph().get("f32").is_some());
        assert_eq!(
            snapshot.specification().unwrap().method_names(),
            vec!["registry.schema"]
        );
    }

    #[tokio::test]
    async fn test_later_refresh_supersedes_earlier() {
        let mock = MockTransport::new()
            .respond(RpcMethod::Discover, discovery())
            .with_delay(Duration::from_millis(200))
            .respond(RpcMethod::RegistrySchema, registry("game::Old"));
        let store = store(&mock);

        store.refresh();
        tokio::time::sleep(Duration::from_millis(20)).await;
        mock.set_reply(
            RpcMethod::RegistrySchema,
            Ok(registry("game::New")),
            Duration::ZERO,
        );
        store.refresh();

        assert_eq!(store.wait().await, ImportStatus::Completed { version: 1 });
        tokio::time::sleep(Duration::from_millis(300)).await;

        let snapshot = store.snapshot();
        assert_eq!(snapshot.version(), 1);
        assert!(snapshot.graph().get("game::New").is_some());
        assert!(snapshot.graph().get("game::Old").is_none());
        assert_eq!(store.status(), ImportStatus::Completed { version: 1 });
    }

    #[tokio::test]
    async fn test_failed_import_keeps_previous_snapshot() {
        let mock = MockTransport::new()
            .respond(RpcMethod::RegistrySchema, registry("game::Health"))
            .respond(RpcMethod::Discover, discovery());
        let store = store(&mock);
        store.load().await.unwrap();

        mock.set_reply(
            RpcMethod::RegistrySchema,
            Ok(json!({"game::Alias": {"type": {"$ref": "#/$defs/f32"}}})),
            Duration::ZERO,
        );
        let error = store.load().await.unwrap_err();
        assert!(matches!(error.current_context(), Error::ContractViolation(_)));
        assert!(matches!(store.status(), ImportStatus::Failed(_)));

        let snapshot = store.snapshot();
        assert_eq!(snapshot.version(), 1);
        assert!(snapshot.graph().get("game::Health").is_some());
        assert!(snapshot.graph().get("game::Alias").is_none());
    }

    #[tokio::test]
    async fn test_dropped_load_keeps_importing() {
        let mock = MockTransport::new()
            .respond(RpcMethod::Discover, discovery())
            .with_delay(Duration::from_millis(200))
            .respond(RpcMethod::RegistrySchema, registry("game::Health"));
        let store = store(&mock);

        let timed_out = tokio::time::timeout(Duration::from_millis(20), store.load()).await;
        assert!(timed_out.is_err());
        assert!(store.status().is_running());
        assert!(!store.first_time_refresh());

        let settled = tokio::time::timeout(Duration::from_secs(2), store.wait())
            .await
            .unwrap();
        assert_eq!(settled, ImportStatus::Completed { version: 1 });
        assert!(store.snapshot().graph().get("game::Health").is_some());
    }

    #[tokio::test]
    async fn test_superseded_load_is_cancelled() {
        let mock = MockTransport::new()
            .respond(RpcMethod::Discover, discovery())
            .with_delay(Duration::from_millis(200))
            .respond(RpcMethod::RegistrySchema, registry("game::Old"));
        let store = store(&mock);

        let waiting = store.clone();
        let load = tokio::spawn(async move { waiting.load().await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        mock.set_reply(
            RpcMethod::RegistrySchema,
            Ok(registry("game::New")),
            Duration::ZERO,
        );
        store.refresh();

        let error = load.await.unwrap().unwrap_err();
        assert!(error.current_context().is_cancelled());
        assert_eq!(store.wait().await, ImportStatus::Completed { version: 1 });
        assert!(store.snapshot().graph().get("game::New").is_some());
    }

    #[tokio::test]
    async fn test_first_time_refresh_runs_once() {
        let mock = MockTransport::new()
            .respond(RpcMethod::RegistrySchema, registry("game::Health"))
            .respond(RpcMethod::Discover, discovery());
        let store = store(&mock);

        assert!(store.first_time_refresh());
        assert!(!store.first_time_refresh());
        assert_eq!(store.wait().await, ImportStatus::Completed { version: 1 });
        assert!(!store.first_time_refresh());

        store.refresh();
        assert_eq!(store.wait().await, ImportStatus::Completed { version: 2 });
        assert_eq!(mock.requests_for(RpcMethod::RegistrySchema).len(), 2);
    }

    #[tokio::test]
    async fn test_transport_failure_reports_status() {
        let mock = MockTransport::new().respond(RpcMethod::Discover, discovery());
        let store = store(&mock);

        store.refresh();
        assert!(matches!(store.wait().await, ImportStatus::Failed(_)));
        assert_eq!(store.snapshot().version(), 0);
        assert!(store.graph().is_empty());
    }
}
