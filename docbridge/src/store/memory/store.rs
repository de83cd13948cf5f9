use super::event::{ChangeListener, StoreChange};
use super::query_exec::execute;
use super::MemoryStoreConfig;
use crate::common::{atomic, Atomic, ReadExecutor, StoreEventBus, SubscriberRef, WriteExecutor, DOC_ID};
use crate::document::Document;
use crate::errors::{DbError, DbResult, ErrorKind};
use crate::reference::{CollectionRef, DocumentRef, Endpoint, QueryRef};
use crate::store::{DocumentStoreProvider, StoreTarget, WatchEvent, WatchId, WatchListener};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

type Collection = BTreeMap<String, Document>;

/// In-process document store standing in for an emulator instance.
///
/// Collections live in memory and disappear with the store. Writes are
/// copy-on-write: readers and watch notifications work on immutable
/// snapshots, so a notification never observes a half-applied batch.
///
/// The store can simulate a lost connection with [MemoryStore::simulate_outage]:
/// every operation then fails with `StoreUnavailable` and every open watch
/// receives a terminal error, until [MemoryStore::restore] is called.
///
/// ```text
/// let store = MemoryStore::new(MemoryStoreConfig::new());
/// store.set(&doc_ref(&endpoint, "p1")?, doc! { "_id": "p1", "name": "ada" }).await?;
/// ```
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<MemoryStoreInner>,
}

impl MemoryStore {
    pub fn new(store_config: MemoryStoreConfig) -> MemoryStore {
        MemoryStore {
            inner: Arc::new(MemoryStoreInner::new(store_config)),
        }
    }

    pub fn config(&self) -> &MemoryStoreConfig {
        &self.inner.store_config
    }

    /// Makes the store unreachable and ends every open watch with a
    /// `StoreUnavailable` error.
    pub fn simulate_outage(&self) {
        self.inner.simulate_outage()
    }

    /// Makes the store reachable again. Watches ended by the outage stay ended.
    pub fn restore(&self) {
        self.inner.available.store(true, Ordering::SeqCst);
        log::info!("Memory store restored");
    }

    pub fn is_available(&self) -> bool {
        self.inner.available.load(Ordering::SeqCst)
    }

    /// Number of watches currently registered.
    pub fn watch_count(&self) -> usize {
        self.inner.watches.read_with(|watches| watches.len())
    }
}

#[async_trait]
impl DocumentStoreProvider for MemoryStore {
    fn connect(&self, target: &StoreTarget) -> DbResult<()> {
        self.inner.connect(target)
    }

    fn target(&self) -> Option<StoreTarget> {
        self.inner.target.read_with(|target| target.clone())
    }

    fn max_batch_size(&self) -> usize {
        self.inner.store_config.max_batch_size()
    }

    async fn get(&self, doc: &DocumentRef) -> DbResult<Option<Document>> {
        self.inner.round_trip().await?;
        Ok(self
            .inner
            .collection(doc.endpoint())
            .and_then(|collection| collection.get(doc.id()).cloned()))
    }

    async fn get_all(&self, collection: &CollectionRef) -> DbResult<Vec<Document>> {
        self.inner.round_trip().await?;
        Ok(self
            .inner
            .collection(collection.endpoint())
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn query(&self, query: &QueryRef) -> DbResult<Vec<Document>> {
        self.inner.round_trip().await?;
        Ok(self
            .inner
            .collection(query.endpoint())
            .map(|docs| execute(&docs, query.constraints()))
            .unwrap_or_default())
    }

    async fn set(&self, doc: &DocumentRef, document: Document) -> DbResult<()> {
        self.inner.round_trip().await?;
        self.inner.check_writable(doc.endpoint())?;
        let id = doc.id().to_string();
        self.inner.commit(doc.endpoint(), move |collection| {
            collection.insert(id.clone(), with_id(document, &id));
            Ok(vec![id])
        })
    }

    async fn update(&self, doc: &DocumentRef, fields: Document) -> DbResult<()> {
        self.inner.round_trip().await?;
        let read_only = self.inner.store_config.is_read_only();
        let id = doc.id().to_string();
        let path = doc.path();
        self.inner.commit(doc.endpoint(), move |collection| {
            let existing = collection.get_mut(&id).ok_or_else(|| {
                DbError::new(&format!("Document {} does not exist", path), ErrorKind::NotFound)
            })?;
            if read_only {
                return Err(write_rejected(&path));
            }
            existing.merge(&fields.without_id());
            Ok(vec![id])
        })
    }

    async fn batch_set(&self, collection: &CollectionRef, documents: Vec<(String, Document)>) -> DbResult<()> {
        self.inner.round_trip().await?;
        let max_batch_size = self.inner.store_config.max_batch_size();
        if documents.len() > max_batch_size {
            return Err(DbError::new(
                &format!(
                    "Batch of {} writes to {} exceeds the limit of {}",
                    documents.len(),
                    collection,
                    max_batch_size
                ),
                ErrorKind::BatchTooLarge,
            ));
        }
        if documents.is_empty() {
            return Ok(());
        }
        self.inner.check_writable(collection.endpoint())?;

        self.inner.commit(collection.endpoint(), move |docs| {
            let mut ids = Vec::with_capacity(documents.len());
            for (id, document) in documents {
                docs.insert(id.clone(), with_id(document, &id));
                ids.push(id);
            }
            Ok(ids)
        })
    }

    async fn delete(&self, doc: &DocumentRef) -> DbResult<()> {
        self.inner.round_trip().await?;
        self.inner.check_writable(doc.endpoint())?;
        let id = doc.id().to_string();
        self.inner.commit(doc.endpoint(), move |collection| {
            Ok(collection.remove(&id).map(|_| vec![id]).unwrap_or_default())
        })
    }

    fn watch_document(&self, doc: &DocumentRef, listener: WatchListener) -> DbResult<WatchId> {
        self.inner.watch(WatchTarget::Document(doc.clone()), listener)
    }

    fn watch_query(&self, query: &QueryRef, listener: WatchListener) -> DbResult<WatchId> {
        self.inner.watch(WatchTarget::Query(query.clone()), listener)
    }

    fn unwatch(&self, watch_id: &WatchId) -> DbResult<()> {
        self.inner.unwatch(watch_id)
    }
}

fn with_id(mut document: Document, id: &str) -> Document {
    document.put(DOC_ID, id);
    document
}

fn write_rejected(location: &str) -> DbError {
    DbError::new(
        &format!("Write to {} rejected: store is read-only", location),
        ErrorKind::WriteRejected,
    )
}

#[derive(Default)]
struct StoreData {
    version: u64,
    collections: HashMap<Endpoint, Arc<Collection>>,
}

#[derive(Default)]
struct MemoryStoreInner {
    store_config: MemoryStoreConfig,
    target: Atomic<Option<StoreTarget>>,
    data: Atomic<StoreData>,
    event_bus: StoreEventBus<StoreChange, ChangeListener>,
    watches: Atomic<HashMap<WatchId, (SubscriberRef, Arc<WatchState>)>>,
    available: AvailableFlag,
}

impl MemoryStoreInner {
    fn new(store_config: MemoryStoreConfig) -> MemoryStoreInner {
        MemoryStoreInner {
            store_config,
            target: atomic(None),
            data: atomic(StoreData::default()),
            event_bus: StoreEventBus::new(),
            watches: atomic(HashMap::new()),
            available: AvailableFlag::default(),
        }
    }

    fn connect(&self, target: &StoreTarget) -> DbResult<()> {
        log::debug!("Memory store connected as {}", target);
        self.target.write_with(|current| *current = Some(target.clone()));
        Ok(())
    }

    fn check_available(&self) -> DbResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(DbError::new(
                "Store is unreachable",
                ErrorKind::StoreUnavailable,
            ))
        }
    }

    fn check_writable(&self, endpoint: &Endpoint) -> DbResult<()> {
        if self.store_config.is_read_only() {
            return Err(write_rejected(endpoint.name()));
        }
        Ok(())
    }

    async fn round_trip(&self) -> DbResult<()> {
        if let Some(latency) = self.store_config.latency() {
            tokio::time::sleep(latency).await;
        }
        self.check_available()
    }

    fn collection(&self, endpoint: &Endpoint) -> Option<Arc<Collection>> {
        self.data.read_with(|data| data.collections.get(endpoint).cloned())
    }

    /// Applies `apply` to one collection under a single write lock, then
    /// notifies watchers once the lock is released. `apply` returns the ids it
    /// changed; an empty list commits nothing.
    fn commit(
        &self,
        endpoint: &Endpoint,
        apply: impl FnOnce(&mut Collection) -> DbResult<Vec<String>>,
    ) -> DbResult<()> {
        let change = self.data.write_with(|data| -> DbResult<Option<StoreChange>> {
            let mut collection = data
                .collections
                .get(endpoint)
                .cloned()
                .unwrap_or_default();
            let ids = apply(Arc::make_mut(&mut collection))?;
            if ids.is_empty() {
                return Ok(None);
            }

            data.version += 1;
            data.collections.insert(endpoint.clone(), collection.clone());
            Ok(Some(StoreChange::Committed {
                endpoint: endpoint.clone(),
                ids: Arc::new(ids),
                version: data.version,
                collection,
            }))
        })?;

        if let Some(change) = change {
            if let Err(e) = self.event_bus.publish(change) {
                log::error!("Failed to notify watchers of {}: {}", endpoint, e);
            }
        }
        Ok(())
    }

    fn watch(&self, target: WatchTarget, listener: WatchListener) -> DbResult<WatchId> {
        self.check_available()?;

        let watch_id = WatchId::new();
        let state = Arc::new(WatchState::new(target, listener));
        let handler_state = state.clone();
        let subscriber = self
            .event_bus
            .register(ChangeListener::new(move |change| {
                handler_state.on_change(change);
                Ok(())
            }))?;
        self.watches
            .write_with(|watches| watches.insert(watch_id, (subscriber, state.clone())));
        log::debug!("Registered watch {} on {}", watch_id, state.target);

        // initial snapshot; changes committed meanwhile carry a newer version
        let (version, collection) = self.data.read_with(|data| {
            (data.version, data.collections.get(state.target.endpoint()).cloned())
        });
        state.deliver(version, collection.as_deref());
        Ok(watch_id)
    }

    fn unwatch(&self, watch_id: &WatchId) -> DbResult<()> {
        let removed = self.watches.write_with(|watches| watches.remove(watch_id));
        if let Some((subscriber, state)) = removed {
            state.close();
            self.event_bus.deregister(&subscriber)?;
            log::debug!("Released watch {}", watch_id);
        }
        Ok(())
    }

    fn simulate_outage(&self) {
        self.available.store(false, Ordering::SeqCst);
        log::warn!("Memory store is simulating an outage");

        let error = DbError::new("Connection to the store was lost", ErrorKind::StoreUnavailable);
        if let Err(e) = self.event_bus.publish(StoreChange::Disconnected(error)) {
            log::error!("Failed to notify watchers of the outage: {}", e);
        }

        let drained: Vec<_> = self
            .watches
            .write_with(|watches| watches.drain().collect());
        for (watch_id, (subscriber, state)) in drained {
            state.close();
            if let Err(e) = self.event_bus.deregister(&subscriber) {
                log::warn!("Failed to release watch {}: {}", watch_id, e);
            }
        }
    }
}

/// Availability switch, `true` unless an outage is being simulated.
struct AvailableFlag(AtomicBool);

impl Default for AvailableFlag {
    fn default() -> Self {
        AvailableFlag(AtomicBool::new(true))
    }
}

impl std::ops::Deref for AvailableFlag {
    type Target = AtomicBool;

    fn deref(&self) -> &AtomicBool {
        &self.0
    }
}

enum WatchTarget {
    Document(DocumentRef),
    Query(QueryRef),
}

impl WatchTarget {
    fn endpoint(&self) -> &Endpoint {
        match self {
            WatchTarget::Document(doc) => doc.endpoint(),
            WatchTarget::Query(query) => query.endpoint(),
        }
    }

    fn affected_by(&self, ids: &[String]) -> bool {
        match self {
            WatchTarget::Document(doc) => ids.iter().any(|id| id == doc.id()),
            WatchTarget::Query(_) => true,
        }
    }

    fn evaluate(&self, collection: Option<&Collection>) -> Snapshot {
        match self {
            WatchTarget::Document(doc) => {
                Snapshot::Document(collection.and_then(|docs| docs.get(doc.id()).cloned()))
            }
            WatchTarget::Query(query) => Snapshot::Query(
                collection
                    .map(|docs| execute(docs, query.constraints()))
                    .unwrap_or_default(),
            ),
        }
    }
}

impl std::fmt::Display for WatchTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WatchTarget::Document(doc) => write!(f, "{}", doc),
            WatchTarget::Query(query) => write!(f, "{}", query),
        }
    }
}

#[derive(Clone, PartialEq)]
enum Snapshot {
    Document(Option<Document>),
    Query(Vec<Document>),
}

impl From<Snapshot> for WatchEvent {
    fn from(snapshot: Snapshot) -> Self {
        match snapshot {
            Snapshot::Document(doc) => WatchEvent::DocumentSnapshot(doc),
            Snapshot::Query(docs) => WatchEvent::QuerySnapshot(docs),
        }
    }
}

#[derive(Default)]
struct WatchProgress {
    version: Option<u64>,
    last: Option<Snapshot>,
    closed: bool,
}

/// Delivery state of one watch. Notifications happen under the progress lock,
/// so a listener sees snapshots in commit order and never after [WatchState::close].
struct WatchState {
    target: WatchTarget,
    listener: WatchListener,
    progress: Mutex<WatchProgress>,
}

impl WatchState {
    fn new(target: WatchTarget, listener: WatchListener) -> Self {
        WatchState {
            target,
            listener,
            progress: Mutex::new(WatchProgress::default()),
        }
    }

    fn on_change(&self, change: StoreChange) {
        match change {
            StoreChange::Committed {
                endpoint,
                ids,
                version,
                collection,
            } => {
                if &endpoint == self.target.endpoint() && self.target.affected_by(&ids) {
                    self.deliver(version, Some(&*collection));
                }
            }
            StoreChange::Disconnected(error) => self.fail(error),
        }
    }

    fn deliver(&self, version: u64, collection: Option<&Collection>) {
        let mut progress = self.progress.lock();
        if progress.closed || progress.version.is_some_and(|seen| version <= seen) {
            return;
        }
        progress.version = Some(version);

        let snapshot = self.target.evaluate(collection);
        if progress.last.as_ref() == Some(&snapshot) {
            return;
        }
        progress.last = Some(snapshot.clone());
        if let Err(e) = self.listener.notify(snapshot.into()) {
            log::debug!("Listener of {} stopped accepting snapshots: {}", self.target, e);
            progress.closed = true;
        }
    }

    fn fail(&self, error: DbError) {
        let mut progress = self.progress.lock();
        if progress.closed {
            return;
        }
        progress.closed = true;
        if let Err(e) = self.listener.notify(WatchEvent::Error(error)) {
            log::debug!("Listener of {} already gone: {}", self.target, e);
        }
    }

    fn close(&self) {
        self.progress.lock().closed = true;
    }
}
