use crate::errors::{DbError, DbResult};
use crate::store::{DocumentStore, WatchId};
use futures::Stream;
use std::fmt::{Debug, Formatter};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// A live stream of snapshots produced by a store watch.
///
/// Each item is either the complete current state (`Ok`) or a terminal error
/// (`Err`), after which the stream ends. The watch is released when the
/// subscription is cancelled or dropped, and nothing is yielded afterwards,
/// not even snapshots that were already buffered.
///
/// ```text
/// let mut profiles = client.stream_collection::<Profile>(&endpoint, &options);
/// while let Some(snapshot) = profiles.next().await {
///     render(snapshot?);
/// }
/// ```
pub struct Subscription<T> {
    receiver: UnboundedReceiver<DbResult<T>>,
    guard: Option<WatchGuard>,
    terminated: bool,
}

impl<T> Subscription<T> {
    /// Creates the channel a watch listener feeds; the returned subscription
    /// is not yet bound to a watch.
    pub(crate) fn channel() -> (UnboundedSender<DbResult<T>>, Subscription<T>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let subscription = Subscription {
            receiver,
            guard: None,
            terminated: false,
        };
        (sender, subscription)
    }

    /// A subscription whose only item is `error`.
    pub(crate) fn failed(error: DbError) -> Subscription<T> {
        let (sender, subscription) = Self::channel();
        // the receiver is alive, the send cannot fail
        let _ = sender.send(Err(error));
        subscription
    }

    /// Ties the lifetime of `watch_id` to this subscription.
    pub(crate) fn bind(&mut self, store: DocumentStore, watch_id: WatchId) {
        self.guard = Some(WatchGuard { store, watch_id });
    }

    /// Stops the stream and releases the underlying watch.
    ///
    /// Cancelling twice is harmless.
    pub fn cancel(&mut self) {
        if !self.terminated {
            log::debug!("Subscription cancelled");
        }
        self.terminate();
    }

    /// `true` until the subscription is cancelled or has yielded its last item.
    ///
    /// A subscription that failed on registration stays active until its
    /// error item has been taken.
    pub fn is_active(&self) -> bool {
        !self.terminated
    }

    /// Waits for the next snapshot; `None` once the stream has ended.
    pub async fn next_snapshot(&mut self) -> Option<DbResult<T>> {
        std::future::poll_fn(|cx| Pin::new(&mut *self).poll_next(cx)).await
    }

    fn terminate(&mut self) {
        self.terminated = true;
        self.guard.take();
        self.receiver.close();
    }
}

impl<T> Stream for Subscription<T> {
    type Item = DbResult<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.terminated {
            return Poll::Ready(None);
        }

        match this.receiver.poll_recv(cx) {
            Poll::Ready(Some(Ok(snapshot))) => Poll::Ready(Some(Ok(snapshot))),
            Poll::Ready(Some(Err(error))) => {
                this.terminate();
                Poll::Ready(Some(Err(error)))
            }
            Poll::Ready(None) => {
                this.terminate();
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<T> Debug for Subscription<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("watch_id", &self.guard.as_ref().map(|guard| guard.watch_id))
            .field("terminated", &self.terminated)
            .finish()
    }
}

/// Releases a store watch when dropped.
struct WatchGuard {
    store: DocumentStore,
    watch_id: WatchId,
}

impl Drop for WatchGuard {
    fn drop(&mut self) {
        if let Err(e) = self.store.unwatch(&self.watch_id) {
            log::warn!("Failed to release watch {}: {}", self.watch_id, e);
        }
    }
}
