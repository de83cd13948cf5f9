use crate::document::Document;
use crate::errors::DbResult;
use crate::reference::{CollectionRef, DocumentRef, QueryRef};
use crate::store::{StoreTarget, WatchId, WatchListener};
use async_trait::async_trait;
use std::ops::Deref;
use std::sync::Arc;

/// Contract a concrete document database backend satisfies.
///
/// Every async method is one round-trip to the store. Transport failures,
/// including transport timeouts, must surface as
/// [crate::errors::ErrorKind::StoreUnavailable].
///
/// Watches are registered synchronously. A registered listener receives an
/// initial snapshot followed by one event per state change, until
/// [DocumentStoreProvider::unwatch] is called or a terminal
/// [crate::store::WatchEvent::Error] is delivered.
#[async_trait]
pub trait DocumentStoreProvider: Send + Sync {
    /// Binds the store to its target. Called exactly once, before any other method.
    fn connect(&self, target: &StoreTarget) -> DbResult<()>;

    /// The target this store was connected to, if any.
    fn target(&self) -> Option<StoreTarget>;

    /// Largest number of writes accepted in one [DocumentStoreProvider::batch_set].
    fn max_batch_size(&self) -> usize;

    /// Fetches one document; `Ok(None)` if it does not exist.
    async fn get(&self, doc: &DocumentRef) -> DbResult<Option<Document>>;

    /// Fetches every document of a collection, in no particular order.
    async fn get_all(&self, collection: &CollectionRef) -> DbResult<Vec<Document>>;

    /// Fetches the documents selected by a normalized query.
    async fn query(&self, query: &QueryRef) -> DbResult<Vec<Document>>;

    /// Creates or fully overwrites a document.
    async fn set(&self, doc: &DocumentRef, document: Document) -> DbResult<()>;

    /// Merges `fields` into an existing document; fails with `NotFound` if absent.
    async fn update(&self, doc: &DocumentRef, fields: Document) -> DbResult<()>;

    /// Creates or overwrites every `(id, document)` pair as one unit.
    ///
    /// Fails with `BatchTooLarge`, writing nothing, when the batch exceeds
    /// [DocumentStoreProvider::max_batch_size]. Whether readers can observe a
    /// partially applied batch depends on the backend; atomicity is only as
    /// strong as the backend promises.
    async fn batch_set(&self, collection: &CollectionRef, documents: Vec<(String, Document)>) -> DbResult<()>;

    /// Deletes a document; deleting an absent document succeeds.
    async fn delete(&self, doc: &DocumentRef) -> DbResult<()>;

    fn watch_document(&self, doc: &DocumentRef, listener: WatchListener) -> DbResult<WatchId>;

    fn watch_query(&self, query: &QueryRef, listener: WatchListener) -> DbResult<WatchId>;

    /// Releases a watch. Releasing an unknown or already released watch succeeds.
    fn unwatch(&self, watch_id: &WatchId) -> DbResult<()>;
}

/// Shared handle to a store backend.
///
/// Cloning is cheap; all clones talk to the same backend.
#[derive(Clone)]
pub struct DocumentStore {
    inner: Arc<dyn DocumentStoreProvider>,
}

impl DocumentStore {
    pub fn new<T: DocumentStoreProvider + 'static>(inner: T) -> Self {
        DocumentStore {
            inner: Arc::new(inner),
        }
    }
}

impl Deref for DocumentStore {
    type Target = Arc<dyn DocumentStoreProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
