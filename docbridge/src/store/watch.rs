use crate::document::Document;
use crate::errors::{DbError, DbResult};
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;
use uuid::Uuid;

/// A state change pushed by a store to a watch listener.
#[derive(Debug, Clone)]
pub enum WatchEvent {
    /// Current state of a watched document; `None` once it is absent
    DocumentSnapshot(Option<Document>),
    /// Complete current result set of a watched query
    QuerySnapshot(Vec<Document>),
    /// The watch failed; no further events follow
    Error(DbError),
}

impl WatchEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, WatchEvent::Error(_))
    }
}

/// Signature of the closure behind a [WatchListener].
///
/// Returning an error tells the store the listener can no longer accept
/// events (for example because its consumer went away).
pub trait WatchCallback: Send + Sync + Fn(WatchEvent) -> DbResult<()> {}

impl<F> WatchCallback for F where F: Send + Sync + Fn(WatchEvent) -> DbResult<()> {}

/// Receives [WatchEvent]s for one watch until it is unwatched.
#[derive(Clone)]
pub struct WatchListener {
    on_event: Arc<dyn WatchCallback>,
}

impl WatchListener {
    pub fn new(on_event: impl WatchCallback + 'static) -> Self {
        WatchListener {
            on_event: Arc::new(on_event),
        }
    }

    pub fn notify(&self, event: WatchEvent) -> DbResult<()> {
        (self.on_event)(event)
    }
}

impl Debug for WatchListener {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchListener").finish_non_exhaustive()
    }
}

/// Identifies a registered watch so it can be released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchId(Uuid);

impl WatchId {
    pub fn new() -> Self {
        WatchId(Uuid::new_v4())
    }
}

impl Default for WatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for WatchId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
