//! The live end of a standing query.

use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use futures::stream::Stream;
use tokio::sync::mpsc;
use tracing::debug;

use crate::document::Document;

/// The full current result set of a standing query.
///
/// Every delivery carries the complete result set, not a diff; consumers
/// recompute whatever they derive from it on each delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub docs: Vec<Document>,
}

type DetachFn = Box<dyn FnOnce() + Send>;

struct CancelState {
    cancelled: AtomicBool,
    detach: Mutex<Option<DetachFn>>,
}

/// Cancellation handle for a standing query.
///
/// Safe to call [`cancel`](Unsubscribe::cancel) any number of times; every
/// call after the first is a no-op. Clones share the same underlying
/// subscription.
#[derive(Clone)]
pub struct Unsubscribe {
    state: Arc<CancelState>,
}

impl Unsubscribe {
    /// Wrap a detach action. The action runs at most once, on the first
    /// [`cancel`](Unsubscribe::cancel) across all clones.
    pub fn new(detach: impl FnOnce() + Send + 'static) -> Self {
        Self {
            state: Arc::new(CancelState {
                cancelled: AtomicBool::new(false),
                detach: Mutex::new(Some(Box::new(detach))),
            }),
        }
    }

    /// Terminate the subscription. Idempotent.
    pub fn cancel(&self) {
        if self.state.cancelled.swap(true, Ordering::SeqCst) {
            return;
        }
        let detach = self
            .state
            .detach
            .lock()
            .ok()
            .and_then(|mut guard| guard.take());
        if let Some(detach) = detach {
            debug!("subscription cancelled");
            detach();
        }
    }

    /// Whether [`cancel`](Unsubscribe::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for Unsubscribe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Unsubscribe")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// A stream of [`Snapshot`]s from a standing query.
///
/// The first delivery is the query's initial state; each subsequent one
/// reflects a committed change. Within a single watch, deliveries are
/// monotonic: each snapshot reflects a superset of the writes visible to
/// the previous one. No ordering is guaranteed across different watches.
///
/// Dropping the watch detaches the subscription, as does calling
/// [`cancel`](Watch::cancel) (or cancelling any handle obtained from
/// [`unsubscribe`](Watch::unsubscribe)).
pub struct Watch {
    rx: mpsc::UnboundedReceiver<Snapshot>,
    guard: Unsubscribe,
}

impl Watch {
    /// Assemble a watch from a snapshot channel and its detach guard.
    /// Called by store backends.
    pub fn new(rx: mpsc::UnboundedReceiver<Snapshot>, guard: Unsubscribe) -> Self {
        Self { rx, guard }
    }

    /// Wait for the next snapshot. Returns `None` once the subscription
    /// is cancelled or the backend stops delivering (interruption).
    pub async fn next(&mut self) -> Option<Snapshot> {
        self.rx.recv().await
    }

    /// A cancellation handle that can outlive borrows of the watch.
    pub fn unsubscribe(&self) -> Unsubscribe {
        self.guard.clone()
    }

    /// Terminate the subscription. Idempotent.
    pub fn cancel(&self) {
        self.guard.cancel();
    }
}

impl Drop for Watch {
    fn drop(&mut self) {
        self.guard.cancel();
    }
}

impl Stream for Watch {
    type Item = Snapshot;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_runs_detach_once() {
        let count = Arc::new(AtomicBool::new(false));
        let count2 = count.clone();
        let unsub = Unsubscribe::new(move || {
            assert!(!count2.swap(true, Ordering::SeqCst));
        });

        unsub.cancel();
        unsub.cancel();
        assert!(unsub.is_cancelled());
        assert!(count.load(Ordering::SeqCst));
    }

    #[test]
    fn test_clones_share_cancellation() {
        let unsub = Unsubscribe::new(|| {});
        let other = unsub.clone();
        other.cancel();
        assert!(unsub.is_cancelled());
    }

    #[tokio::test]
    async fn test_watch_drop_cancels() {
        let (tx, rx) = mpsc::unbounded_channel();
        let watch = Watch::new(rx, Unsubscribe::new(|| {}));
        let handle = watch.unsubscribe();
        drop(watch);
        assert!(handle.is_cancelled());
        assert!(tx.is_closed());
    }
}
