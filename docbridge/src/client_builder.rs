use crate::client::DatabaseClient;
use crate::client_config::ClientConfig;
use crate::errors::{DbError, DbResult};
use crate::store::{StoreModule, StoreTarget};
use std::time::Duration;

/// Builder for [DatabaseClient].
///
/// The first configuration error is kept and returned by [ClientBuilder::build];
/// later calls are ignored once an error has been recorded.
///
/// ```text
/// let client = DatabaseClient::builder()
///     .target(StoreTarget::for_site(&site, "community-platform"))
///     .load_module(MemoryStoreModule::new())
///     .build()?;
/// ```
#[derive(Default)]
pub struct ClientBuilder {
    error: Option<DbError>,
    config: ClientConfig,
}

impl ClientBuilder {
    pub fn new() -> Self {
        ClientBuilder {
            error: None,
            config: ClientConfig::new(),
        }
    }

    pub fn target(mut self, target: StoreTarget) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.set_target(target) {
                self.error = Some(e);
            }
        }
        self
    }

    pub fn load_module<T: StoreModule>(mut self, module: T) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.load_module(module) {
                self.error = Some(e);
            }
        }
        self
    }

    /// Bounds every request/response operation. Elapsed operations fail with
    /// `StoreUnavailable`.
    pub fn operation_timeout(mut self, timeout: Duration) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.set_operation_timeout(timeout) {
                self.error = Some(e);
            }
        }
        self
    }

    pub fn build(self) -> DbResult<DatabaseClient> {
        if let Some(error) = self.error {
            return Err(error);
        }
        DatabaseClient::new(self.config)
    }
}
