use crate::common::STORE_CHANGE_EVENT;
use crate::errors::{DbError, DbResult, ErrorKind};
use basu::error::BasuError;
use basu::event::Event;
use basu::{EventBus, Handle, HandlerId};
use std::marker::PhantomData;
use std::sync::Arc;

/// Fans events out to registered listeners.
///
/// Publishing is synchronous: every listener has run by the time
/// [StoreEventBus::publish] returns. Publishers must therefore not hold any
/// lock a listener may need.
///
/// ```ignore
/// let bus: StoreEventBus<ChangeEvent, ChangeListener> = StoreEventBus::new();
/// let subscriber = bus.register(listener)?;
/// bus.publish(change)?;
/// bus.deregister(subscriber)?;
/// ```
#[derive(Clone)]
pub struct StoreEventBus<E, L> {
    inner: Arc<StoreEventBusInner<E, L>>,
}

impl<E, L> Default for StoreEventBus<E, L>
where
    L: Handle<E> + 'static,
    E: Send + Sync,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<E, L> StoreEventBus<E, L>
where
    L: Handle<E> + 'static,
    E: Send + Sync,
{
    pub fn new() -> Self {
        StoreEventBus {
            inner: Arc::new(StoreEventBusInner::new()),
        }
    }

    pub fn register(&self, listener: L) -> DbResult<SubscriberRef> {
        self.inner.register(listener)
    }

    pub fn deregister(&self, subscriber: &SubscriberRef) -> DbResult<()> {
        self.inner.deregister(subscriber)
    }

    pub fn publish(&self, event: E) -> DbResult<()> {
        self.inner.publish(event)
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listener_count()
    }
}

/// Registration token returned by [StoreEventBus::register].
pub struct SubscriberRef {
    pub(crate) inner: HandlerId,
}

impl SubscriberRef {
    pub fn new(inner: HandlerId) -> Self {
        SubscriberRef { inner }
    }
}

struct StoreEventBusInner<E, L> {
    event_bus: EventBus<E>,
    phantom_data: PhantomData<L>,
}

impl<E, L> StoreEventBusInner<E, L>
where
    L: Handle<E> + 'static,
    E: Send + Sync,
{
    fn new() -> Self {
        StoreEventBusInner {
            event_bus: EventBus::new(),
            phantom_data: PhantomData,
        }
    }

    fn register(&self, listener: L) -> DbResult<SubscriberRef> {
        self.event_bus
            .subscribe(STORE_CHANGE_EVENT, Box::new(listener))
            .map(SubscriberRef::new)
            .map_err(Self::db_error)
    }

    #[inline]
    fn deregister(&self, subscriber: &SubscriberRef) -> DbResult<()> {
        self.event_bus
            .unsubscribe(STORE_CHANGE_EVENT, &subscriber.inner)
            .map_err(Self::db_error)
    }

    #[inline]
    fn publish(&self, event: E) -> DbResult<()> {
        // no listeners: skip wrapping the event
        if self.listener_count() == 0 {
            return Ok(());
        }

        let basu_event = Event::new(event);
        self.event_bus
            .publish(STORE_CHANGE_EVENT, &basu_event)
            .map_err(Self::db_error)
    }

    #[inline]
    fn listener_count(&self) -> usize {
        match self.event_bus.get_handler_count(STORE_CHANGE_EVENT) {
            Ok(count) => count,
            Err(BasuError::EventTypeNotFOUND) => 0,
            Err(e) => {
                log::warn!("Failed to count store listeners: {}, assuming none", e);
                0
            }
        }
    }

    fn db_error(e: BasuError) -> DbError {
        match e {
            BasuError::EventTypeNotFOUND => DbError::new(
                "Event bus error: no listener is registered for store change events",
                ErrorKind::SubscriptionClosed,
            ),
            BasuError::MutexPoisoned => DbError::new(
                "Event bus error: internal mutex poisoned",
                ErrorKind::InternalError,
            ),
            BasuError::HandlerError(e) => {
                let error_message = e
                    .source()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| e.to_string());
                DbError::new(
                    &format!("Store listener error: {}", error_message),
                    ErrorKind::InternalError,
                )
            }
        }
    }
}
