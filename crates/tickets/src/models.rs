//! Ticket domain models.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use store_core::Document;

use crate::error::TicketError;

/// Lifecycle status of a ticket.
///
/// Tickets start `open`; an admin moves them to `resolved` or `closed`.
/// No transition back to `open` is exposed, but the store does not
/// enforce the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    Open,
    Resolved,
    Closed,
}

impl TicketStatus {
    /// The wire name of the status, as persisted in the store.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Resolved => "resolved",
            Self::Closed => "closed",
        }
    }

    /// Whether the ticket has reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Open)
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The identity an operation is performed on behalf of.
///
/// Resolved by an external auth collaborator and passed explicitly; the
/// repository trusts the `privileged` flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    pub user_id: String,
    pub email: String,
    /// Admins see all tickets and may change their status.
    pub privileged: bool,
}

impl Viewer {
    /// A regular customer identity.
    pub fn customer(user_id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email: email.into(),
            privileged: false,
        }
    }

    /// A privileged (admin) identity.
    pub fn admin(user_id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email: email.into(),
            privileged: true,
        }
    }
}

/// A customer support request with a lifecycle status and an associated
/// message thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    /// Store-assigned identifier.
    #[serde(default)]
    pub id: String,
    /// Owning customer; immutable after creation.
    pub user_id: String,
    pub user_email: String,
    /// Original request text; immutable after creation.
    pub subject: String,
    pub content: String,
    pub status: TicketStatus,
    /// Unseen activity for the admin side. Absent in the store reads as
    /// `false`.
    #[serde(default)]
    pub unread_for_admin: bool,
    /// Unseen activity for the customer side.
    #[serde(default)]
    pub unread_for_user: bool,
    /// Server-assigned; `None` while the commit timestamp has not
    /// resolved yet.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Server-assigned; refreshed on status changes and message appends.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Ticket {
    pub(crate) fn from_document(doc: &Document) -> Result<Self, TicketError> {
        let mut ticket: Ticket = serde_json::from_value(Value::Object(doc.fields.clone()))
            .map_err(|e| TicketError::Decode {
                collection: "tickets",
                id: doc.id.clone(),
                reason: e.to_string(),
            })?;
        ticket.id = doc.id.clone();
        Ok(ticket)
    }

    /// Whether the given side has unseen activity on this ticket.
    pub fn unread_for(&self, privileged: bool) -> bool {
        if privileged {
            self.unread_for_admin
        } else {
            self.unread_for_user
        }
    }
}

/// A single chat-style entry within a ticket's thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Store-assigned identifier.
    #[serde(default)]
    pub id: String,
    /// Sender identity (customer or admin acting as support).
    pub user_id: String,
    pub user_email: String,
    /// Free-text body.
    pub message: String,
    /// Server-assigned; defines thread ordering.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Message {
    pub(crate) fn from_document(doc: &Document) -> Result<Self, TicketError> {
        let mut message: Message = serde_json::from_value(Value::Object(doc.fields.clone()))
            .map_err(|e| TicketError::Decode {
                collection: "messages",
                id: doc.id.clone(),
                reason: e.to_string(),
            })?;
        message.id = doc.id.clone();
        Ok(message)
    }
}

/// Per-status and unread tallies over a ticket list snapshot, for
/// dashboard badges. Recomputed from the full snapshot on every push.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TicketCounts {
    pub open: usize,
    pub resolved: usize,
    pub closed: usize,
    /// Tickets with unseen activity for the tallying side.
    pub unread: usize,
}

impl TicketCounts {
    /// Tally a list snapshot from the perspective of one side.
    pub fn tally(tickets: &[Ticket], privileged: bool) -> Self {
        let mut counts = Self::default();
        for ticket in tickets {
            match ticket.status {
                TicketStatus::Open => counts.open += 1,
                TicketStatus::Resolved => counts.resolved += 1,
                TicketStatus::Closed => counts.closed += 1,
            }
            if ticket.unread_for(privileged) {
                counts.unread += 1;
            }
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn ticket_doc(id: &str, status: &str) -> Document {
        let mut fields = Map::new();
        fields.insert("userId".into(), Value::String("u1".into()));
        fields.insert("userEmail".into(), Value::String("u1@example.com".into()));
        fields.insert("subject".into(), Value::String("hi".into()));
        fields.insert("content".into(), Value::String("help".into()));
        fields.insert("status".into(), Value::String(status.into()));
        Document {
            id: id.to_string(),
            fields,
        }
    }

    #[test]
    fn test_ticket_decodes_with_absent_flags_and_times() {
        let ticket = Ticket::from_document(&ticket_doc("t1", "open")).unwrap();
        assert_eq!(ticket.id, "t1");
        assert_eq!(ticket.status, TicketStatus::Open);
        assert!(!ticket.unread_for_admin);
        assert!(!ticket.unread_for_user);
        assert!(ticket.created_at.is_none());
    }

    #[test]
    fn test_ticket_decode_rejects_unknown_status() {
        let err = Ticket::from_document(&ticket_doc("t1", "escalated")).unwrap_err();
        assert!(matches!(err, TicketError::Decode { id, .. } if id == "t1"));
    }

    #[test]
    fn test_status_round_trips_through_wire_names() {
        for status in [
            TicketStatus::Open,
            TicketStatus::Resolved,
            TicketStatus::Closed,
        ] {
            let value = serde_json::to_value(status).unwrap();
            assert_eq!(value, Value::String(status.as_str().to_string()));
        }
        assert!(!TicketStatus::Open.is_terminal());
        assert!(TicketStatus::Closed.is_terminal());
    }

    #[test]
    fn test_counts_tally_by_side() {
        let mut open = Ticket::from_document(&ticket_doc("t1", "open")).unwrap();
        open.unread_for_admin = true;
        let resolved = Ticket::from_document(&ticket_doc("t2", "resolved")).unwrap();
        let list = vec![open, resolved];

        let admin = TicketCounts::tally(&list, true);
        assert_eq!(admin.open, 1);
        assert_eq!(admin.resolved, 1);
        assert_eq!(admin.unread, 1);

        let customer = TicketCounts::tally(&list, false);
        assert_eq!(customer.unread, 0);
    }
}
