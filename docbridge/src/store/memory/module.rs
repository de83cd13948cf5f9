use crate::errors::{DbError, DbResult, ErrorKind};
use crate::store::memory::{MemoryStore, MemoryStoreConfig};
use crate::store::{DocumentStore, StoreModule};
use std::time::Duration;

/// Supplies a fresh [MemoryStore] to a client.
///
/// Every call to [StoreModule::get_store] creates an independent, empty store.
#[derive(Default)]
pub struct MemoryStoreModule {
    store_config: MemoryStoreConfig,
}

impl MemoryStoreModule {
    pub fn new() -> MemoryStoreModule {
        MemoryStoreModule {
            store_config: MemoryStoreConfig::new(),
        }
    }

    pub fn with_config() -> MemoryStoreModuleBuilder {
        MemoryStoreModuleBuilder::new()
    }

    pub fn config(&self) -> &MemoryStoreConfig {
        &self.store_config
    }
}

impl StoreModule for MemoryStoreModule {
    fn get_store(&self) -> DbResult<DocumentStore> {
        let store = MemoryStore::new(self.store_config.clone());
        Ok(DocumentStore::new(store))
    }
}

#[derive(Default)]
pub struct MemoryStoreModuleBuilder {
    store_config: MemoryStoreConfig,
    error: Option<DbError>,
}

impl MemoryStoreModuleBuilder {
    pub fn new() -> MemoryStoreModuleBuilder {
        MemoryStoreModuleBuilder {
            store_config: MemoryStoreConfig::new(),
            error: None,
        }
    }

    pub fn max_batch_size(mut self, max_batch_size: usize) -> Self {
        if max_batch_size == 0 && self.error.is_none() {
            self.error = Some(DbError::new(
                "Max batch size must be greater than zero",
                ErrorKind::InvalidConfiguration,
            ));
        }
        self.store_config.set_max_batch_size(max_batch_size);
        self
    }

    pub fn read_only(mut self, read_only: bool) -> Self {
        self.store_config.set_read_only(read_only);
        self
    }

    pub fn latency(mut self, latency: Duration) -> Self {
        self.store_config.set_latency(Some(latency));
        self
    }

    pub fn build(self) -> DbResult<MemoryStoreModule> {
        if let Some(error) = self.error {
            return Err(error);
        }
        let mut store_module = MemoryStoreModule::new();
        store_module.store_config = self.store_config;
        Ok(store_module)
    }
}
