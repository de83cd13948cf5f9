use crate::document::Document;
use crate::errors::{DbError, DbResult};
use crate::reference::Endpoint;
use anyhow::Error;
use basu::error::BasuError;
use basu::event::Event;
use basu::Handle;
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::Arc;

/// A committed change inside a [super::MemoryStore].
#[derive(Clone)]
pub(crate) enum StoreChange {
    /// Documents of one collection were written or deleted.
    Committed {
        endpoint: Endpoint,
        ids: Arc<Vec<String>>,
        version: u64,
        collection: Arc<BTreeMap<String, Document>>,
    },
    /// The store became unreachable; every watch ends.
    Disconnected(DbError),
}

pub(crate) trait ChangeCallback: Send + Sync + Fn(StoreChange) -> DbResult<()> {}

impl<F> ChangeCallback for F where F: Send + Sync + Fn(StoreChange) -> DbResult<()> {}

/// Bridges store changes from the event bus to one watch.
#[derive(Clone)]
pub(crate) struct ChangeListener {
    on_change: Arc<dyn ChangeCallback>,
}

impl ChangeListener {
    pub(crate) fn new(on_change: impl ChangeCallback + 'static) -> Self {
        ChangeListener {
            on_change: Arc::new(on_change),
        }
    }
}

impl Handle<StoreChange> for ChangeListener {
    fn handle(&self, event: &Event<StoreChange>) -> Result<(), BasuError> {
        match (self.on_change)(event.data.clone()) {
            Ok(_) => Ok(()),
            Err(e) => Err(BasuError::HandlerError(Error::from(e))),
        }
    }
}

impl Debug for ChangeListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeListener").finish()
    }
}
