//! Configuration for a ticket sync session.

/// Configuration for [`TicketSync`](crate::TicketSync).
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Whether viewing a thread clears the viewer's unread flag: once
    /// on open, and again on every message push while the thread stays
    /// open. Disable for read-only peeking that should not acknowledge
    /// activity.
    pub mark_read_on_view: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            mark_read_on_view: true,
        }
    }
}

impl SyncConfig {
    /// A config that never acknowledges unread activity.
    pub fn without_mark_read() -> Self {
        Self {
            mark_read_on_view: false,
        }
    }
}
