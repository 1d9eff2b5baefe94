//! Typed live query results.

use chrono::Utc;
use tracing::warn;

use store_core::{Snapshot, Unsubscribe, Watch};

use crate::models::{Message, Ticket};

fn decode_tickets(snapshot: &Snapshot) -> Vec<Ticket> {
    snapshot
        .docs
        .iter()
        .filter_map(|doc| match Ticket::from_document(doc) {
            Ok(ticket) => Some(ticket),
            Err(e) => {
                warn!(doc = %doc.id, error = %e, "skipping undecodable ticket document");
                None
            }
        })
        .collect()
}

fn decode_messages(snapshot: &Snapshot) -> Vec<Message> {
    snapshot
        .docs
        .iter()
        .filter_map(|doc| match Message::from_document(doc) {
            Ok(message) => Some(message),
            Err(e) => {
                warn!(doc = %doc.id, error = %e, "skipping undecodable message document");
                None
            }
        })
        .collect()
}

/// A live ticket list: the full current list on every delivery.
///
/// Documents that fail to decode are skipped with a warning rather than
/// ending the stream. Dropping the watch (or calling
/// [`cancel`](TicketWatch::cancel)) detaches the subscription.
pub struct TicketWatch {
    watch: Watch,
    client_sort: bool,
}

impl TicketWatch {
    pub(crate) fn new(watch: Watch, client_sort: bool) -> Self {
        Self { watch, client_sort }
    }

    /// Wait for the next list snapshot. Returns `None` once the
    /// subscription is cancelled or interrupted.
    pub async fn next(&mut self) -> Option<Vec<Ticket>> {
        let snapshot = self.watch.next().await?;
        let mut list = decode_tickets(&snapshot);
        if self.client_sort {
            // Unresolved server timestamps sort as "now": newest first
            // without tripping over a not-yet-materialized createdAt.
            let now = Utc::now();
            list.sort_by_key(|t| std::cmp::Reverse(t.created_at.unwrap_or(now)));
        }
        Some(list)
    }

    /// A cancellation handle usable independently of the watch.
    pub fn unsubscribe(&self) -> Unsubscribe {
        self.watch.unsubscribe()
    }

    /// Terminate the subscription. Idempotent.
    pub fn cancel(&self) {
        self.watch.cancel();
    }
}

/// A live message thread: the full thread, oldest first, on every
/// delivery. Same decode and cancellation behavior as [`TicketWatch`].
pub struct MessageWatch {
    watch: Watch,
}

impl MessageWatch {
    pub(crate) fn new(watch: Watch) -> Self {
        Self { watch }
    }

    /// Wait for the next thread snapshot. Returns `None` once the
    /// subscription is cancelled or interrupted.
    pub async fn next(&mut self) -> Option<Vec<Message>> {
        let snapshot = self.watch.next().await?;
        Some(decode_messages(&snapshot))
    }

    /// A cancellation handle usable independently of the watch.
    pub fn unsubscribe(&self) -> Unsubscribe {
        self.watch.unsubscribe()
    }

    /// Terminate the subscription. Idempotent.
    pub fn cancel(&self) {
        self.watch.cancel();
    }
}
