//! Typed ticket and message operations over a document store.

use std::sync::Arc;

use tracing::debug;

use store_core::{CollectionRef, DocumentStore, Query, WriteFields};

use crate::error::Result;
use crate::models::{Ticket, TicketStatus, Viewer};
use crate::watch::{MessageWatch, TicketWatch};

const TICKETS: &str = "tickets";
const MESSAGES: &str = "messages";

fn tickets_collection() -> Result<CollectionRef> {
    Ok(CollectionRef::new(TICKETS)?)
}

fn messages_collection(ticket_id: &str) -> Result<CollectionRef> {
    Ok(tickets_collection()?.child(ticket_id, MESSAGES)?)
}

/// Typed, minimal-surface access to ticket and message persistence.
///
/// Every operation takes the acting [`Viewer`] (or the fields it needs)
/// explicitly; there is no ambient current-user state. Writes either
/// commit in the store or fail. The repository never mutates local
/// state, so a failed call leaves everything as it was and the next
/// subscription push remains the sole source of truth.
#[derive(Clone)]
pub struct TicketRepository {
    store: Arc<dyn DocumentStore>,
}

impl TicketRepository {
    /// Wrap a document store handle.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Create a ticket owned by `viewer` with status `open`, server
    /// timestamps and no unread flags. Returns the store-assigned id.
    pub async fn create_ticket(
        &self,
        viewer: &Viewer,
        subject: &str,
        content: &str,
    ) -> Result<String> {
        let fields = WriteFields::new()
            .field("userId", viewer.user_id.as_str())
            .field("userEmail", viewer.email.as_str())
            .field("subject", subject)
            .field("content", content)
            .field("status", TicketStatus::Open.as_str())
            .server_time("createdAt")
            .server_time("updatedAt");

        let id = self.store.create(&tickets_collection()?, fields).await?;
        debug!(ticket = %id, user = %viewer.user_id, "created ticket");
        Ok(id)
    }

    /// Read one ticket. Returns `None` if it does not exist.
    pub async fn get_ticket(&self, ticket_id: &str) -> Result<Option<Ticket>> {
        let doc = self.store.get(&tickets_collection()?, ticket_id).await?;
        doc.as_ref().map(Ticket::from_document).transpose()
    }

    /// Establish a live ticket list query for `viewer`.
    ///
    /// Privileged viewers span all tickets, ordered by `createdAt`
    /// descending in the store. Other viewers are restricted to their
    /// own tickets; ordering is then applied client-side (descending,
    /// with unresolved timestamps sorting as "now"). Every push carries
    /// the full current list.
    pub async fn subscribe_tickets(&self, viewer: &Viewer) -> Result<TicketWatch> {
        let collection = tickets_collection()?;
        let (query, client_sort) = if viewer.privileged {
            (Query::collection(collection).order_by_desc("createdAt"), false)
        } else {
            (
                Query::collection(collection).filter_eq("userId", viewer.user_id.as_str()),
                true,
            )
        };
        let watch = self.store.subscribe(query).await?;
        Ok(TicketWatch::new(watch, client_sort))
    }

    /// Establish a live query over a ticket's message thread, ordered by
    /// `createdAt` ascending.
    pub async fn subscribe_messages(&self, ticket_id: &str) -> Result<MessageWatch> {
        let query = Query::collection(messages_collection(ticket_id)?).order_by_asc("createdAt");
        let watch = self.store.subscribe(query).await?;
        Ok(MessageWatch::new(watch))
    }

    /// Append a message to a ticket's thread, then flip the unread flag
    /// of the side opposite to the sender and refresh the parent's
    /// `updatedAt`.
    ///
    /// The two writes are sequential, not atomic; subscribers may
    /// observe the new message before the parent ticket update (or the
    /// reverse on their list watch) and must tolerate the transient gap.
    pub async fn add_message(&self, ticket_id: &str, viewer: &Viewer, text: &str) -> Result<()> {
        let message = WriteFields::new()
            .field("userId", viewer.user_id.as_str())
            .field("userEmail", viewer.email.as_str())
            .field("message", text)
            .server_time("createdAt");
        self.store
            .create(&messages_collection(ticket_id)?, message)
            .await?;

        let unread_flag = if viewer.privileged {
            "unreadForUser"
        } else {
            "unreadForAdmin"
        };
        let parent = WriteFields::new()
            .field(unread_flag, true)
            .server_time("updatedAt");
        self.store
            .set(&tickets_collection()?, ticket_id, parent, true)
            .await?;

        debug!(ticket = %ticket_id, sender = %viewer.user_id, "appended message");
        Ok(())
    }

    /// Set a ticket's status and refresh `updatedAt`. The transition
    /// graph is not validated here; withholding illegal transitions is a
    /// view concern.
    pub async fn update_status(&self, ticket_id: &str, status: TicketStatus) -> Result<()> {
        let fields = WriteFields::new()
            .field("status", status.as_str())
            .server_time("updatedAt");
        self.store
            .set(&tickets_collection()?, ticket_id, fields, true)
            .await?;
        debug!(ticket = %ticket_id, status = %status, "updated ticket status");
        Ok(())
    }

    /// Clear the unread flag for one side. Idempotent; does not touch
    /// `updatedAt`.
    pub async fn mark_read(&self, ticket_id: &str, privileged: bool) -> Result<()> {
        let flag = if privileged {
            "unreadForAdmin"
        } else {
            "unreadForUser"
        };
        let fields = WriteFields::new().field(flag, false);
        self.store
            .set(&tickets_collection()?, ticket_id, fields, true)
            .await?;
        Ok(())
    }

    /// Delete a ticket and its message thread.
    ///
    /// Messages are removed first; the store offers no multi-document
    /// transaction, so a failure mid-way leaves the ticket in place with
    /// a partial thread.
    pub async fn delete_ticket(&self, ticket_id: &str) -> Result<()> {
        let messages = messages_collection(ticket_id)?;
        let thread = self.store.query(&Query::collection(messages.clone())).await?;
        for doc in &thread {
            self.store.delete(&messages, &doc.id).await?;
        }
        self.store.delete(&tickets_collection()?, ticket_id).await?;
        debug!(ticket = %ticket_id, messages = thread.len(), "deleted ticket");
        Ok(())
    }
}
