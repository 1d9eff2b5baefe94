//! The ticket sync session: subscription lifecycle and view state.

use tracing::{debug, info, warn};

use tickets::{
    Message, MessageWatch, Ticket, TicketCounts, TicketRepository, TicketStatus, TicketWatch,
    Viewer,
};

use crate::config::SyncConfig;
use crate::error::SyncError;

/// A change surfaced by [`TicketSync::next_change`]. The view reacts by
/// re-reading the session's accessors; events carry no data of their own
/// because every snapshot replaces state wholesale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// The ticket list was replaced with a fresh snapshot.
    ListUpdated,
    /// The open thread was replaced with a fresh snapshot.
    ThreadUpdated { ticket_id: String },
    /// The list subscription was interrupted; state is stale until
    /// [`TicketSync::resubscribe_list`] is called.
    ListLost,
    /// The thread subscription was interrupted and closed; re-open the
    /// ticket to resume.
    ThreadLost { ticket_id: String },
}

enum ListState {
    Subscribed(TicketWatch),
    Lost,
}

struct ThreadView {
    ticket_id: String,
    watch: MessageWatch,
    messages: Vec<Message>,
}

enum Pumped {
    List(Option<Vec<Ticket>>),
    Thread(Option<Vec<Message>>),
}

/// A live view session over one viewer's tickets.
///
/// Owns the list subscription for its whole lifetime and a message
/// subscription while a ticket is open. All state is replaced wholesale
/// from snapshots; the session never applies local edits, so a failed
/// write leaves state untouched until the store pushes the outcome.
///
/// The consuming view drives [`next_change`](TicketSync::next_change)
/// in its single event loop and calls the action methods in between;
/// nothing here spawns tasks or takes locks.
pub struct TicketSync {
    repo: TicketRepository,
    viewer: Viewer,
    config: SyncConfig,
    tickets: Vec<Ticket>,
    list: ListState,
    thread: Option<ThreadView>,
}

impl TicketSync {
    /// Subscribe to `viewer`'s ticket list and enter the live state.
    pub async fn start(repo: TicketRepository, viewer: Viewer) -> Result<Self, SyncError> {
        Self::with_config(repo, viewer, SyncConfig::default()).await
    }

    /// Like [`start`](TicketSync::start) with an explicit [`SyncConfig`].
    pub async fn with_config(
        repo: TicketRepository,
        viewer: Viewer,
        config: SyncConfig,
    ) -> Result<Self, SyncError> {
        let watch = repo.subscribe_tickets(&viewer).await?;
        info!(user = %viewer.user_id, privileged = viewer.privileged, "ticket sync started");
        Ok(Self {
            repo,
            viewer,
            config,
            tickets: Vec::new(),
            list: ListState::Subscribed(watch),
            thread: None,
        })
    }

    /// Wait for the next change on any active subscription, apply it,
    /// and report what happened. Returns `None` when nothing is left to
    /// wait on (list lost and no thread open).
    ///
    /// Thread snapshots re-issue mark-as-read for the viewer's side, so
    /// messages arriving while the thread is open do not leave the
    /// ticket flagged unread.
    pub async fn next_change(&mut self) -> Option<SyncEvent> {
        let list_active = matches!(self.list, ListState::Subscribed(_));
        let thread_active = self.thread.is_some();
        if !list_active && !thread_active {
            return None;
        }

        let pumped = {
            let list = &mut self.list;
            let thread = &mut self.thread;
            tokio::select! {
                update = async {
                    match list {
                        ListState::Subscribed(watch) => watch.next().await,
                        ListState::Lost => None,
                    }
                }, if list_active => Pumped::List(update),
                update = async {
                    match thread {
                        Some(view) => view.watch.next().await,
                        None => None,
                    }
                }, if thread_active => Pumped::Thread(update),
            }
        };

        match pumped {
            Pumped::List(Some(list)) => {
                debug!(tickets = list.len(), "applied ticket list snapshot");
                self.tickets = list;
                Some(SyncEvent::ListUpdated)
            }
            Pumped::List(None) => {
                warn!("ticket list subscription interrupted");
                self.list = ListState::Lost;
                Some(SyncEvent::ListLost)
            }
            Pumped::Thread(Some(messages)) => {
                let view = self.thread.as_mut()?;
                debug!(ticket = %view.ticket_id, messages = messages.len(), "applied thread snapshot");
                view.messages = messages;
                let ticket_id = view.ticket_id.clone();
                if self.config.mark_read_on_view {
                    if let Err(e) = self.repo.mark_read(&ticket_id, self.viewer.privileged).await {
                        warn!(ticket = %ticket_id, error = %e, "mark-as-read failed");
                    }
                }
                Some(SyncEvent::ThreadUpdated { ticket_id })
            }
            Pumped::Thread(None) => {
                let view = self.thread.take()?;
                warn!(ticket = %view.ticket_id, "message subscription interrupted");
                Some(SyncEvent::ThreadLost {
                    ticket_id: view.ticket_id,
                })
            }
        }
    }

    /// Open a ticket's thread: tear down any previous thread
    /// subscription, subscribe to the messages, and acknowledge the
    /// viewer's unread flag.
    pub async fn open_ticket(&mut self, ticket_id: &str) -> Result<(), SyncError> {
        self.close_thread();
        let watch = self.repo.subscribe_messages(ticket_id).await?;
        self.thread = Some(ThreadView {
            ticket_id: ticket_id.to_string(),
            watch,
            messages: Vec::new(),
        });
        info!(ticket = %ticket_id, "viewing ticket thread");

        if self.config.mark_read_on_view {
            self.repo
                .mark_read(ticket_id, self.viewer.privileged)
                .await?;
        }
        Ok(())
    }

    /// Leave the thread view, detaching its subscription. Safe to call
    /// when no thread is open.
    pub fn close_thread(&mut self) {
        if let Some(view) = self.thread.take() {
            view.watch.cancel();
            debug!(ticket = %view.ticket_id, "closed ticket thread");
        }
    }

    /// Re-establish the list subscription after [`SyncEvent::ListLost`]
    /// (or to force a fresh snapshot cycle).
    pub async fn resubscribe_list(&mut self) -> Result<(), SyncError> {
        if let ListState::Subscribed(watch) = &self.list {
            watch.cancel();
        }
        let watch = self.repo.subscribe_tickets(&self.viewer).await?;
        self.list = ListState::Subscribed(watch);
        info!("ticket list resubscribed");
        Ok(())
    }

    /// Send a message on the open thread.
    ///
    /// The send is not blocked for non-`open` tickets (withholding the
    /// input is the view's job) but it is logged, since the normal path
    /// never gets here.
    pub async fn send_message(&mut self, text: &str) -> Result<(), SyncError> {
        let ticket_id = self
            .thread
            .as_ref()
            .map(|view| view.ticket_id.clone())
            .ok_or(SyncError::NotViewing)?;
        if !self.can_reply() {
            warn!(ticket = %ticket_id, "sending message to a ticket that is not open");
        }
        self.repo.add_message(&ticket_id, &self.viewer, text).await?;
        Ok(())
    }

    /// Change the status of the ticket whose thread is open.
    pub async fn set_status(&mut self, status: TicketStatus) -> Result<(), SyncError> {
        let ticket_id = self
            .thread
            .as_ref()
            .map(|view| view.ticket_id.clone())
            .ok_or(SyncError::NotViewing)?;
        if !self.can_transition() {
            warn!(ticket = %ticket_id, status = %status, "status change on a terminal ticket");
        }
        self.repo.update_status(&ticket_id, status).await?;
        Ok(())
    }

    /// Delete a ticket (and its thread), closing the detail view first
    /// if it is the one being viewed.
    pub async fn delete_ticket(&mut self, ticket_id: &str) -> Result<(), SyncError> {
        if self
            .thread
            .as_ref()
            .is_some_and(|view| view.ticket_id == ticket_id)
        {
            self.close_thread();
        }
        self.repo.delete_ticket(ticket_id).await?;
        Ok(())
    }

    /// End the session, detaching every subscription.
    pub fn shutdown(mut self) {
        self.close_thread();
        if let ListState::Subscribed(watch) = &self.list {
            watch.cancel();
        }
        info!(user = %self.viewer.user_id, "ticket sync shut down");
    }

    // ── View state accessors ──────────────────────────────────────────

    /// The latest ticket list snapshot.
    pub fn tickets(&self) -> &[Ticket] {
        &self.tickets
    }

    /// The open thread's latest snapshot, oldest message first.
    pub fn messages(&self) -> &[Message] {
        self.thread
            .as_ref()
            .map(|view| view.messages.as_slice())
            .unwrap_or_default()
    }

    /// Id of the ticket whose thread is open, if any.
    pub fn viewing(&self) -> Option<&str> {
        self.thread.as_ref().map(|view| view.ticket_id.as_str())
    }

    /// The open ticket, looked up in the latest list snapshot rather
    /// than cached, so list pushes (status, unread flags) are visible in
    /// the detail view without a second round trip.
    pub fn current_ticket(&self) -> Option<&Ticket> {
        let ticket_id = self.viewing()?;
        self.tickets.iter().find(|t| t.id == ticket_id)
    }

    /// Whether the open ticket accepts new messages (status `open`).
    pub fn can_reply(&self) -> bool {
        self.current_ticket()
            .map(|t| t.status == TicketStatus::Open)
            .unwrap_or(false)
    }

    /// Whether the open ticket accepts a status change (not terminal).
    pub fn can_transition(&self) -> bool {
        self.current_ticket()
            .map(|t| !t.status.is_terminal())
            .unwrap_or(false)
    }

    /// Whether the list subscription is live (not lost).
    pub fn is_list_live(&self) -> bool {
        matches!(self.list, ListState::Subscribed(_))
    }

    /// Status and unread tallies over the latest list snapshot, from
    /// this viewer's perspective.
    pub fn counts(&self) -> TicketCounts {
        TicketCounts::tally(&self.tickets, self.viewer.privileged)
    }
}
