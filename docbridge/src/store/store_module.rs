use crate::errors::DbResult;
use crate::store::DocumentStore;

/// Supplies the store backend a client is built on.
pub trait StoreModule {
    fn get_store(&self) -> DbResult<DocumentStore>;
}
