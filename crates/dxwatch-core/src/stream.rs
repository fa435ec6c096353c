// ── Reactive store streams ──
//
// Async subscription handle for consuming snapshot changes from a Store.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

/// A subscription to a store's snapshots.
///
/// Provides both point-in-time snapshot access and change notification via
/// [`changed()`](Self::changed) or by converting to a `Stream`. Bursts of
/// writes between two polls coalesce into the newest snapshot; use
/// [`Store::subscribe`](crate::store::Store::subscribe) when every write
/// must be observed.
pub struct StoreStream<S: Clone + Send + Sync + 'static> {
    current: Arc<S>,
    receiver: watch::Receiver<Arc<S>>,
}

impl<S: Clone + Send + Sync + 'static> StoreStream<S> {
    pub(crate) fn new(mut receiver: watch::Receiver<Arc<S>>) -> Self {
        let current = receiver.borrow_and_update().clone();
        Self { current, receiver }
    }

    /// Get the snapshot captured at creation time (or at the last `changed()`).
    pub fn current(&self) -> &Arc<S> {
        &self.current
    }

    /// Get the latest snapshot (may have changed since creation).
    pub fn latest(&self) -> Arc<S> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next change, returning the new snapshot.
    /// Returns `None` if the store has been dropped.
    pub async fn changed(&mut self) -> Option<Arc<S>> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = Arc::clone(&snap);
        Some(snap)
    }

    /// Convert into a `Stream` for use with `StreamExt` combinators.
    ///
    /// The stream yields the current snapshot first, then one item per
    /// observed change.
    pub fn into_stream(self) -> StoreWatchStream<S> {
        StoreWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter backed by a `watch::Receiver`.
pub struct StoreWatchStream<S: Clone + Send + Sync + 'static> {
    inner: WatchStream<Arc<S>>,
}

impl<S: Clone + Send + Sync + 'static> Stream for StoreWatchStream<S> {
    type Item = Arc<S>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        // WatchStream<Arc<S>> is Unpin, so re-pinning the field is fine.
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
