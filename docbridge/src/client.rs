use crate::client_builder::ClientBuilder;
use crate::client_config::ClientConfig;
use crate::document::Document;
use crate::errors::{DbError, DbResult, ErrorKind};
use crate::query::QueryOptions;
use crate::reference::{collection_ref, doc_ref, query_ref, Endpoint};
use crate::store::{DocumentStore, StoreTarget, WatchEvent, WatchListener};
use crate::subscription::Subscription;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Typed access to a document store.
///
/// Records are plain serde types carrying their identity in an `_id` field.
/// Every operation names its collection by [Endpoint]; the client resolves
/// references, normalizes queries and maps documents back to records.
///
/// Cloning is cheap and every clone shares the same store.
///
/// ```text
/// let client = DatabaseClient::builder()
///     .target(StoreTarget::for_site(&site, "community-platform"))
///     .build()?;
///
/// let profiles = Endpoint::new("profiles")?;
/// client.set_doc(&profiles, &profile).await?;
/// let verified: Vec<Profile> = client
///     .query_collection(&profiles, &QueryOptions::filtered(field("verified").eq(true)))
///     .await?;
/// ```
#[derive(Clone)]
pub struct DatabaseClient {
    inner: Arc<DatabaseClientInner>,
}

impl DatabaseClient {
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Connects the configured store to the configured target.
    pub fn new(config: ClientConfig) -> DbResult<DatabaseClient> {
        let store = config.store()?;
        store.connect(config.target())?;
        log::info!("Document store connected to {}", config.target());

        Ok(DatabaseClient {
            inner: Arc::new(DatabaseClientInner {
                store,
                target: config.target().clone(),
                operation_timeout: config.operation_timeout(),
            }),
        })
    }

    pub fn target(&self) -> &StoreTarget {
        &self.inner.target
    }

    pub fn store(&self) -> &DocumentStore {
        &self.inner.store
    }

    pub fn operation_timeout(&self) -> Option<Duration> {
        self.inner.operation_timeout
    }

    /// Fetches one record; `Ok(None)` when it does not exist.
    pub async fn get_doc<T: DeserializeOwned>(&self, endpoint: &Endpoint, id: &str) -> DbResult<Option<T>> {
        log::debug!("get_doc {}/{}", endpoint, id);
        self.inner
            .run("get_doc", endpoint, async {
                let doc = doc_ref(endpoint, id)?;
                match self.inner.store.get(&doc).await? {
                    Some(document) => Ok(Some(document.into_record()?)),
                    None => Ok(None),
                }
            })
            .await
    }

    /// Creates or fully replaces the record addressed by its `_id`.
    pub async fn set_doc<T: Serialize>(&self, endpoint: &Endpoint, record: &T) -> DbResult<()> {
        self.inner
            .run("set_doc", endpoint, async {
                let (id, document) = Document::from_identified_record(record)?;
                log::debug!("set_doc {}/{}", endpoint, id);
                let doc = doc_ref(endpoint, &id)?;
                self.inner.store.set(&doc, document).await
            })
            .await
    }

    /// Merges the record's fields, minus `_id`, into the existing document.
    ///
    /// Fields absent from `record` keep their stored value. Fails with
    /// `NotFound` if the document does not exist.
    pub async fn update_doc<T: Serialize>(&self, endpoint: &Endpoint, record: &T) -> DbResult<()> {
        self.inner
            .run("update_doc", endpoint, async {
                let (id, document) = Document::from_identified_record(record)?;
                log::debug!("update_doc {}/{}", endpoint, id);
                let doc = doc_ref(endpoint, &id)?;
                self.inner.store.update(&doc, document.without_id()).await
            })
            .await
    }

    /// Writes every record as one batch. An empty slice writes nothing.
    ///
    /// Fails with `BatchTooLarge`, writing nothing, when `records` exceeds the
    /// store's batch limit.
    pub async fn set_bulk_docs<T: Serialize>(&self, endpoint: &Endpoint, records: &[T]) -> DbResult<()> {
        log::debug!("set_bulk_docs {} ({} records)", endpoint, records.len());
        if records.is_empty() {
            return Ok(());
        }

        self.inner
            .run("set_bulk_docs", endpoint, async {
                let documents = records
                    .iter()
                    .map(Document::from_identified_record)
                    .collect::<DbResult<Vec<_>>>()?;
                for (id, _) in &documents {
                    doc_ref(endpoint, id)?;
                }
                self.inner
                    .store
                    .batch_set(&collection_ref(endpoint), documents)
                    .await
            })
            .await
    }

    /// Fetches every record of the collection, in no particular order.
    pub async fn get_collection<T: DeserializeOwned>(&self, endpoint: &Endpoint) -> DbResult<Vec<T>> {
        log::debug!("get_collection {}", endpoint);
        self.inner
            .run("get_collection", endpoint, async {
                let documents = self.inner.store.get_all(&collection_ref(endpoint)).await?;
                into_records(documents)
            })
            .await
    }

    /// Fetches the records selected by `options`.
    ///
    /// A `where` condition takes precedence over an ordering, and at most
    /// 1000 records are returned unless a limit is given.
    pub async fn query_collection<T: DeserializeOwned>(
        &self,
        endpoint: &Endpoint,
        options: &QueryOptions,
    ) -> DbResult<Vec<T>> {
        log::debug!("query_collection {}", endpoint);
        self.inner
            .run("query_collection", endpoint, async {
                let query = query_ref(endpoint, options)?;
                log::debug!("Running {}", query);
                let documents = self.inner.store.query(&query).await?;
                into_records(documents)
            })
            .await
    }

    /// Deletes one record. Deleting a missing record succeeds.
    pub async fn delete_doc(&self, endpoint: &Endpoint, id: &str) -> DbResult<()> {
        log::debug!("delete_doc {}/{}", endpoint, id);
        self.inner
            .run("delete_doc", endpoint, async {
                let doc = doc_ref(endpoint, id)?;
                self.inner.store.delete(&doc).await
            })
            .await
    }

    /// Streams the result set of `options`, re-sent whenever it changes.
    ///
    /// The first item is the current result set. An invalid query or an
    /// unreachable store arrives as the first and only item.
    pub fn stream_collection<T>(&self, endpoint: &Endpoint, options: &QueryOptions) -> Subscription<Vec<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        log::debug!("stream_collection {}", endpoint);
        let query = match query_ref(endpoint, options) {
            Ok(query) => query,
            Err(e) => {
                log::error!("stream_collection on {} failed: {}", endpoint, e);
                return Subscription::failed(e);
            }
        };

        let (sender, mut subscription) = Subscription::channel();
        let listener = WatchListener::new(move |event: WatchEvent| {
            let item = match event {
                WatchEvent::QuerySnapshot(documents) => into_records(documents),
                WatchEvent::Error(e) => Err(e),
                WatchEvent::DocumentSnapshot(_) => Err(unexpected_event("document", "query")),
            };
            sender.send(item).map_err(|_| closed())
        });

        match self.inner.store.watch_query(&query, listener) {
            Ok(watch_id) => subscription.bind(self.inner.store.clone(), watch_id),
            Err(e) => {
                log::error!("stream_collection on {} failed: {}", endpoint, e);
                return Subscription::failed(e);
            }
        }
        subscription
    }

    /// Streams one record; `None` while it is absent.
    ///
    /// The first item is the current state. Failures arrive as a terminal item.
    pub fn stream_doc<T>(&self, endpoint: &Endpoint, id: &str) -> Subscription<Option<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        log::debug!("stream_doc {}/{}", endpoint, id);
        let doc = match doc_ref(endpoint, id) {
            Ok(doc) => doc,
            Err(e) => {
                log::error!("stream_doc on {} failed: {}", endpoint, e);
                return Subscription::failed(e);
            }
        };

        let (sender, mut subscription) = Subscription::channel();
        let listener = WatchListener::new(move |event: WatchEvent| {
            let item = match event {
                WatchEvent::DocumentSnapshot(document) => document.map(Document::into_record).transpose(),
                WatchEvent::Error(e) => Err(e),
                WatchEvent::QuerySnapshot(_) => Err(unexpected_event("query", "document")),
            };
            sender.send(item).map_err(|_| closed())
        });

        match self.inner.store.watch_document(&doc, listener) {
            Ok(watch_id) => subscription.bind(self.inner.store.clone(), watch_id),
            Err(e) => {
                log::error!("stream_doc on {} failed: {}", doc, e);
                return Subscription::failed(e);
            }
        }
        subscription
    }
}

struct DatabaseClientInner {
    store: DocumentStore,
    target: StoreTarget,
    operation_timeout: Option<Duration>,
}

impl DatabaseClientInner {
    /// Runs one request/response operation under the configured timeout and
    /// logs its failure.
    async fn run<R>(
        &self,
        operation: &str,
        endpoint: &Endpoint,
        task: impl Future<Output = DbResult<R>>,
    ) -> DbResult<R> {
        let result = match self.operation_timeout {
            Some(limit) => match tokio::time::timeout(limit, task).await {
                Ok(result) => result,
                Err(elapsed) => Err(DbError::from(elapsed)),
            },
            None => task.await,
        };

        if let Err(e) = &result {
            log::error!("{} on {} failed: {}", operation, endpoint, e);
        }
        result
    }
}

fn into_records<T: DeserializeOwned>(documents: Vec<Document>) -> DbResult<Vec<T>> {
    documents.into_iter().map(Document::into_record).collect()
}

fn closed() -> DbError {
    DbError::new("Subscription receiver was dropped", ErrorKind::SubscriptionClosed)
}

fn unexpected_event(received: &str, watched: &str) -> DbError {
    DbError::new(
        &format!("Received a {} snapshot for a {} watch", received, watched),
        ErrorKind::InternalError,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::SortOrder;
    use crate::query::{field, limit_to, order_by};
    use crate::store::memory::{MemoryStore, MemoryStoreModule};
    use crate::store::StoreModule;
    use futures::StreamExt;
    use serde::Deserialize;
    use std::time::Duration;

    // Setup only one time throughout the project.
    // It will take effect during test, project wide
    #[ctor::ctor]
    fn init() {
        colog::init();
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Profile {
        #[serde(rename = "_id")]
        id: String,
        username: String,
        #[serde(default)]
        verified: bool,
    }

    fn profile(id: &str, username: &str, verified: bool) -> Profile {
        Profile {
            id: id.to_string(),
            username: username.to_string(),
            verified,
        }
    }

    fn profiles() -> Endpoint {
        Endpoint::new("profiles").unwrap()
    }

    fn client() -> DatabaseClient {
        DatabaseClient::builder().build().unwrap()
    }

    struct SharedStoreModule(DocumentStore);

    impl StoreModule for SharedStoreModule {
        fn get_store(&self) -> DbResult<DocumentStore> {
            Ok(self.0.clone())
        }
    }

    fn client_on(memory: &MemoryStore) -> DatabaseClient {
        DatabaseClient::builder()
            .load_module(SharedStoreModule(DocumentStore::new(memory.clone())))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_set_then_get_round_trip() {
        let client = client();
        let ada = profile("p1", "ada", true);
        client.set_doc(&profiles(), &ada).await.unwrap();

        let fetched: Option<Profile> = client.get_doc(&profiles(), "p1").await.unwrap();
        assert_eq!(fetched, Some(ada));
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let fetched: Option<Profile> = client().get_doc(&profiles(), "ghost").await.unwrap();
        assert!(fetched.is_none());
    }

    #[tokio::test]
    async fn test_set_requires_identity() {
        #[derive(Serialize)]
        struct Anonymous {
            username: String,
        }

        let err = client()
            .set_doc(&profiles(), &Anonymous { username: "x".to_string() })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidId);

        let err = client().set_doc(&profiles(), &42).await.unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ObjectMappingError);
    }

    #[tokio::test]
    async fn test_update_merges_and_requires_existence() {
        let client = client();
        let endpoint = Endpoint::new("counters").unwrap();
        client
            .set_doc(&endpoint, &serde_json::json!({"_id": "c1", "a": 1, "b": 2}))
            .await
            .unwrap();
        client
            .update_doc(&endpoint, &serde_json::json!({"_id": "c1", "b": 3}))
            .await
            .unwrap();

        let merged: Option<serde_json::Value> = client.get_doc(&endpoint, "c1").await.unwrap();
        assert_eq!(merged, Some(serde_json::json!({"_id": "c1", "a": 1, "b": 3})));

        let err = client
            .update_doc(&endpoint, &serde_json::json!({"_id": "c2", "b": 3}))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_bulk_then_collection() {
        let client = client();
        let batch: Vec<Profile> = (0..25)
            .map(|i| profile(&format!("p{}", i), &format!("user{}", i), i % 2 == 0))
            .collect();
        client.set_bulk_docs(&profiles(), &batch).await.unwrap();
        client.set_bulk_docs::<Profile>(&profiles(), &[]).await.unwrap();

        let all: Vec<Profile> = client.get_collection(&profiles()).await.unwrap();
        assert_eq!(all.len(), 25);
    }

    #[tokio::test]
    async fn test_oversized_bulk_writes_nothing() {
        let module = MemoryStoreModule::with_config().max_batch_size(2).build().unwrap();
        let client = DatabaseClient::builder().load_module(module).build().unwrap();
        let batch = vec![profile("a", "a", true), profile("b", "b", true), profile("c", "c", true)];

        let err = client.set_bulk_docs(&profiles(), &batch).await.unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::BatchTooLarge);
        let all: Vec<Profile> = client.get_collection(&profiles()).await.unwrap();
        assert!(all.is_empty());
    }

    #[tokio::test]
    async fn test_bulk_with_invalid_id_writes_nothing() {
        let client = client();
        let batch = vec![profile("a", "a", true), profile("", "b", true)];
        let err = client.set_bulk_docs(&profiles(), &batch).await.unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidId);
        let all: Vec<Profile> = client.get_collection(&profiles()).await.unwrap();
        assert!(all.is_empty());
    }

    #[tokio::test]
    async fn test_query_collection() {
        let client = client();
        let batch = vec![
            profile("p1", "carol", true),
            profile("p2", "alice", false),
            profile("p3", "bob", true),
        ];
        client.set_bulk_docs(&profiles(), &batch).await.unwrap();

        let verified: Vec<Profile> = client
            .query_collection(
                &profiles(),
                &order_by("username", SortOrder::Ascending).filter(field("verified").eq(true)),
            )
            .await
            .unwrap();
        let ids: Vec<&str> = verified.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p3"]);

        let sorted: Vec<Profile> = client
            .query_collection(&profiles(), &order_by("username", SortOrder::Descending).limit(2))
            .await
            .unwrap();
        let names: Vec<&str> = sorted.iter().map(|p| p.username.as_str()).collect();
        assert_eq!(names, vec!["carol", "bob"]);

        let err = client
            .query_collection::<Profile>(&profiles(), &limit_to(0))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidQuery);
    }

    #[tokio::test]
    async fn test_delete_missing_is_ok() {
        let client = client();
        client.delete_doc(&profiles(), "ghost").await.unwrap();

        client.set_doc(&profiles(), &profile("p1", "ada", true)).await.unwrap();
        client.delete_doc(&profiles(), "p1").await.unwrap();
        let fetched: Option<Profile> = client.get_doc(&profiles(), "p1").await.unwrap();
        assert!(fetched.is_none());
    }

    #[tokio::test]
    async fn test_stream_collection_reflects_writes() {
        let client = client();
        let mut stream = client.stream_collection::<Profile>(&profiles(), &QueryOptions::new());

        let initial = stream.next().await.unwrap().unwrap();
        assert!(initial.is_empty());

        client.set_doc(&profiles(), &profile("p1", "ada", true)).await.unwrap();
        let next = tokio::time::timeout(Duration::from_secs(1), stream.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(next, vec![profile("p1", "ada", true)]);
    }

    #[tokio::test]
    async fn test_stream_collection_invalid_query_is_first_item() {
        let mut stream = client().stream_collection::<Profile>(&profiles(), &limit_to(0));
        let err = stream.next().await.unwrap().unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidQuery);
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_stream_doc_follows_lifecycle() {
        let client = client();
        let mut stream = client.stream_doc::<Profile>(&profiles(), "p1");
        assert_eq!(stream.next().await.unwrap().unwrap(), None);

        client.set_doc(&profiles(), &profile("p1", "ada", false)).await.unwrap();
        assert_eq!(
            stream.next().await.unwrap().unwrap(),
            Some(profile("p1", "ada", false))
        );

        client.delete_doc(&profiles(), "p1").await.unwrap();
        assert_eq!(stream.next().await.unwrap().unwrap(), None);
    }

    #[tokio::test]
    async fn test_cancelled_stream_releases_watch() {
        let memory = MemoryStore::default();
        let client = client_on(&memory);
        let mut stream = client.stream_doc::<Profile>(&profiles(), "p1");
        assert_eq!(memory.watch_count(), 1);

        stream.cancel();
        assert_eq!(memory.watch_count(), 0);
        client.set_doc(&profiles(), &profile("p1", "ada", true)).await.unwrap();
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_outage_surfaces_as_store_unavailable() {
        let memory = MemoryStore::default();
        let client = client_on(&memory);
        let mut stream = client.stream_collection::<Profile>(&profiles(), &QueryOptions::new());
        assert!(stream.next().await.unwrap().is_ok());

        memory.simulate_outage();
        let err = stream.next().await.unwrap().unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::StoreUnavailable);
        assert!(err.kind().is_retryable());
        assert!(stream.next().await.is_none());

        let err = client.get_doc::<Profile>(&profiles(), "p1").await.unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::StoreUnavailable);

        let mut late = client.stream_doc::<Profile>(&profiles(), "p1");
        let err = late.next().await.unwrap().unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::StoreUnavailable);
    }

    #[tokio::test]
    async fn test_operation_timeout_maps_to_store_unavailable() {
        let module = MemoryStoreModule::with_config()
            .latency(Duration::from_millis(200))
            .build()
            .unwrap();
        let client = DatabaseClient::builder()
            .load_module(module)
            .operation_timeout(Duration::from_millis(10))
            .build()
            .unwrap();

        let err = client.get_doc::<Profile>(&profiles(), "p1").await.unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::StoreUnavailable);
    }

    #[tokio::test]
    async fn test_clones_share_the_store() {
        let client = client();
        let clone = client.clone();
        client.set_doc(&profiles(), &profile("p1", "ada", true)).await.unwrap();

        let fetched: Option<Profile> = clone.get_doc(&profiles(), "p1").await.unwrap();
        assert!(fetched.is_some());
        assert_eq!(clone.store().target(), Some(StoreTarget::default()));
    }
}
