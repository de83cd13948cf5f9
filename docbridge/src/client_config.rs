//! Configuration captured by [crate::client_builder::ClientBuilder].

use crate::errors::{DbError, DbResult, ErrorKind};
use crate::store::memory::MemoryStoreModule;
use crate::store::{DocumentStore, StoreModule, StoreTarget};
use std::time::Duration;

/// Everything a [crate::client::DatabaseClient] needs before it connects.
///
/// Values are validated as they are set. The target defaults to the local
/// emulator and the store to a fresh [crate::store::memory::MemoryStore].
#[derive(Clone, Default)]
pub struct ClientConfig {
    target: StoreTarget,
    store: Option<DocumentStore>,
    operation_timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new() -> Self {
        ClientConfig::default()
    }

    pub fn target(&self) -> &StoreTarget {
        &self.target
    }

    pub fn operation_timeout(&self) -> Option<Duration> {
        self.operation_timeout
    }

    pub fn set_target(&mut self, target: StoreTarget) -> DbResult<()> {
        match &target {
            StoreTarget::Production { project_id } if project_id.trim().is_empty() => {
                log::error!("Production target requires a project id");
                return Err(DbError::new(
                    "Production target requires a project id",
                    ErrorKind::InvalidConfiguration,
                ));
            }
            StoreTarget::Emulator { host, port } if host.trim().is_empty() || *port == 0 => {
                log::error!("Emulator target {}:{} is not a valid address", host, port);
                return Err(DbError::new(
                    &format!("Emulator target {}:{} is not a valid address", host, port),
                    ErrorKind::InvalidConfiguration,
                ));
            }
            _ => {}
        }
        self.target = target;
        Ok(())
    }

    /// Uses the store supplied by `module`. Only one store can be loaded.
    pub fn load_module<T: StoreModule>(&mut self, module: T) -> DbResult<()> {
        if self.store.is_some() {
            log::error!("A store module is already loaded");
            return Err(DbError::new(
                "A store module is already loaded",
                ErrorKind::InvalidConfiguration,
            ));
        }
        self.store = Some(module.get_store()?);
        Ok(())
    }

    pub fn set_operation_timeout(&mut self, timeout: Duration) -> DbResult<()> {
        if timeout.is_zero() {
            log::error!("Operation timeout must be greater than zero");
            return Err(DbError::new(
                "Operation timeout must be greater than zero",
                ErrorKind::InvalidConfiguration,
            ));
        }
        self.operation_timeout = Some(timeout);
        Ok(())
    }

    /// Returns the loaded store, falling back to an in-memory one.
    pub(crate) fn store(&self) -> DbResult<DocumentStore> {
        match &self.store {
            Some(store) => Ok(store.clone()),
            None => {
                log::debug!("No store module loaded, using an in-memory store");
                MemoryStoreModule::new().get_store()
            }
        }
    }
}
