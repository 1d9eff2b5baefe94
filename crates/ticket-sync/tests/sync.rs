//! Integration tests for the ticket sync controller over the in-memory
//! store.

use std::sync::Arc;
use std::time::Duration;

use memory_store::MemoryStore;
use ticket_sync::{SyncConfig, SyncError, SyncEvent, TicketSync};
use tickets::{Message, Ticket, TicketRepository, TicketStatus, Viewer};
use tokio::time::timeout;

fn setup() -> (MemoryStore, TicketRepository) {
    let store = MemoryStore::new();
    let repo = TicketRepository::new(Arc::new(store.clone()));
    (store, repo)
}

fn customer_viewer() -> Viewer {
    Viewer::customer("cust-1", "customer@example.com")
}

fn admin_viewer() -> Viewer {
    Viewer::admin("admin-1", "support@example.com")
}

async fn pump(sync: &mut TicketSync) -> SyncEvent {
    timeout(Duration::from_secs(1), sync.next_change())
        .await
        .expect("timed out waiting for a change")
        .expect("all subscriptions ended")
}

/// Pump queued changes until the list snapshot satisfies `pred`.
async fn pump_until_list(sync: &mut TicketSync, pred: impl Fn(&[Ticket]) -> bool) {
    for _ in 0..20 {
        if pred(sync.tickets()) {
            return;
        }
        pump(sync).await;
    }
    panic!("list condition not reached");
}

/// Pump queued changes until the thread snapshot satisfies `pred`.
async fn pump_until_thread(sync: &mut TicketSync, pred: impl Fn(&[Message]) -> bool) {
    for _ in 0..20 {
        if pred(sync.messages()) {
            return;
        }
        pump(sync).await;
    }
    panic!("thread condition not reached");
}

/// Consume every already-queued change without waiting for new ones.
async fn drain(sync: &mut TicketSync) -> Vec<SyncEvent> {
    let mut events = Vec::new();
    while let Ok(Some(event)) = timeout(Duration::from_millis(50), sync.next_change()).await {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn test_full_support_scenario() {
    let (_store, repo) = setup();
    let mut customer = TicketSync::start(repo.clone(), customer_viewer())
        .await
        .unwrap();
    let mut admin = TicketSync::start(repo.clone(), admin_viewer()).await.unwrap();

    // Customer files a ticket; it shows up in both lists as open.
    let id = repo
        .create_ticket(&customer_viewer(), "Billing question", "Why was I charged twice?")
        .await
        .unwrap();
    pump_until_list(&mut customer, |l| l.len() == 1).await;
    assert_eq!(customer.tickets()[0].status, TicketStatus::Open);
    pump_until_list(&mut admin, |l| l.len() == 1).await;

    // Customer writes; the admin side is flagged unread.
    repo.add_message(&id, &customer_viewer(), "hi").await.unwrap();
    pump_until_list(&mut admin, |l| l.first().is_some_and(|t| t.unread_for_admin)).await;

    // Admin opens the thread: unread clears as a side effect of viewing.
    admin.open_ticket(&id).await.unwrap();
    pump_until_thread(&mut admin, |m| m.len() == 1).await;
    pump_until_list(&mut admin, |l| l.first().is_some_and(|t| !t.unread_for_admin)).await;
    assert_eq!(admin.current_ticket().unwrap().subject, "Billing question");

    // Admin replies; the customer side is flagged unread.
    admin.send_message("Refund issued").await.unwrap();
    pump_until_list(&mut customer, |l| l.first().is_some_and(|t| t.unread_for_user)).await;

    // Customer opens the thread and receives the reply.
    customer.open_ticket(&id).await.unwrap();
    pump_until_thread(&mut customer, |m| m.len() == 2).await;
    assert_eq!(customer.messages()[1].message, "Refund issued");
    assert_eq!(customer.messages()[0].message, "hi");
    pump_until_list(&mut customer, |l| l.first().is_some_and(|t| !t.unread_for_user)).await;

    // Admin resolves; both views converge and withhold further replies.
    admin.set_status(TicketStatus::Resolved).await.unwrap();
    pump_until_list(&mut admin, |l| {
        l.first().is_some_and(|t| t.status == TicketStatus::Resolved)
    })
    .await;
    pump_until_list(&mut customer, |l| {
        l.first().is_some_and(|t| t.status == TicketStatus::Resolved)
    })
    .await;
    assert!(!admin.can_reply());
    assert!(!customer.can_reply());
    assert!(!admin.can_transition());

    customer.shutdown();
    admin.shutdown();
}

#[tokio::test]
async fn test_switching_tickets_tears_down_previous_thread() {
    let (store, repo) = setup();
    let a = repo
        .create_ticket(&customer_viewer(), "first", "a")
        .await
        .unwrap();
    let b = repo
        .create_ticket(&customer_viewer(), "second", "b")
        .await
        .unwrap();

    let mut admin = TicketSync::start(repo.clone(), admin_viewer()).await.unwrap();
    admin.open_ticket(&a).await.unwrap();
    pump_until_list(&mut admin, |l| l.len() == 2).await;
    drain(&mut admin).await;

    admin.open_ticket(&b).await.unwrap();
    assert_eq!(admin.viewing(), Some(b.as_str()));
    // List watch plus the thread watch for `b` only.
    assert_eq!(store.subscription_count(), 2);

    repo.add_message(&a, &customer_viewer(), "to the old thread")
        .await
        .unwrap();
    let events = drain(&mut admin).await;
    assert!(events
        .iter()
        .all(|e| !matches!(e, SyncEvent::ThreadUpdated { ticket_id } if *ticket_id == a)));
    assert_eq!(admin.viewing(), Some(b.as_str()));
}

#[tokio::test]
async fn test_lost_subscriptions_surface_and_resubscribe() {
    let (store, repo) = setup();
    let id = repo
        .create_ticket(&customer_viewer(), "first", "a")
        .await
        .unwrap();

    let mut admin = TicketSync::start(repo.clone(), admin_viewer()).await.unwrap();
    admin.open_ticket(&id).await.unwrap();
    pump_until_list(&mut admin, |l| l.len() == 1).await;
    drain(&mut admin).await;

    store.disconnect();
    let mut events = vec![pump(&mut admin).await, pump(&mut admin).await];
    events.sort_by_key(|e| matches!(e, SyncEvent::ThreadLost { .. }));
    assert_eq!(events[0], SyncEvent::ListLost);
    assert!(matches!(&events[1], SyncEvent::ThreadLost { ticket_id } if *ticket_id == id));
    assert!(!admin.is_list_live());
    assert_eq!(admin.viewing(), None);

    // Nothing left to wait on until the caller resubscribes.
    assert!(admin.next_change().await.is_none());

    admin.resubscribe_list().await.unwrap();
    assert!(admin.is_list_live());
    pump_until_list(&mut admin, |l| l.len() == 1).await;
}

#[tokio::test]
async fn test_thread_actions_require_viewing() {
    let (_store, repo) = setup();
    let mut admin = TicketSync::start(repo, admin_viewer()).await.unwrap();

    assert!(matches!(
        admin.send_message("hello").await,
        Err(SyncError::NotViewing)
    ));
    assert!(matches!(
        admin.set_status(TicketStatus::Resolved).await,
        Err(SyncError::NotViewing)
    ));
}

#[tokio::test]
async fn test_without_mark_read_leaves_unread_flag() {
    let (_store, repo) = setup();
    let id = repo
        .create_ticket(&customer_viewer(), "Login", "Cannot sign in")
        .await
        .unwrap();
    repo.add_message(&id, &customer_viewer(), "hi").await.unwrap();

    let mut admin = TicketSync::with_config(
        repo.clone(),
        admin_viewer(),
        SyncConfig::without_mark_read(),
    )
    .await
    .unwrap();
    admin.open_ticket(&id).await.unwrap();
    pump_until_thread(&mut admin, |m| m.len() == 1).await;
    drain(&mut admin).await;

    let ticket = repo.get_ticket(&id).await.unwrap().unwrap();
    assert!(ticket.unread_for_admin);
}

#[tokio::test]
async fn test_open_ticket_subscribe_failure_leaves_thread_closed() {
    let (store, repo) = setup();
    let id = repo
        .create_ticket(&customer_viewer(), "Login", "Cannot sign in")
        .await
        .unwrap();
    let mut admin = TicketSync::start(repo.clone(), admin_viewer()).await.unwrap();

    store.fail_subscribes(true);
    assert!(admin.open_ticket(&id).await.is_err());
    assert_eq!(admin.viewing(), None);

    store.fail_subscribes(false);
    admin.open_ticket(&id).await.unwrap();
    assert_eq!(admin.viewing(), Some(id.as_str()));
}

#[tokio::test]
async fn test_delete_closes_thread_and_updates_list() {
    let (_store, repo) = setup();
    let id = repo
        .create_ticket(&customer_viewer(), "Login", "Cannot sign in")
        .await
        .unwrap();
    let mut admin = TicketSync::start(repo.clone(), admin_viewer()).await.unwrap();
    admin.open_ticket(&id).await.unwrap();
    pump_until_list(&mut admin, |l| l.len() == 1).await;

    admin.delete_ticket(&id).await.unwrap();
    assert_eq!(admin.viewing(), None);
    pump_until_list(&mut admin, |l| l.is_empty()).await;
    assert!(admin.current_ticket().is_none());
}

#[tokio::test]
async fn test_failed_send_leaves_state_untouched() {
    let (store, repo) = setup();
    let id = repo
        .create_ticket(&customer_viewer(), "Login", "Cannot sign in")
        .await
        .unwrap();
    let mut customer = TicketSync::start(repo.clone(), customer_viewer())
        .await
        .unwrap();
    customer.open_ticket(&id).await.unwrap();
    pump_until_list(&mut customer, |l| l.len() == 1).await;
    drain(&mut customer).await;

    store.fail_writes(true);
    assert!(customer.send_message("lost?").await.is_err());
    drain(&mut customer).await;
    assert!(customer.messages().is_empty());

    store.fail_writes(false);
    customer.send_message("retry").await.unwrap();
    pump_until_thread(&mut customer, |m| m.len() == 1).await;
    assert_eq!(customer.messages()[0].message, "retry");
}

#[tokio::test]
async fn test_status_change_visible_in_detail_without_thread_push() {
    let (_store, repo) = setup();
    let id = repo
        .create_ticket(&customer_viewer(), "Login", "Cannot sign in")
        .await
        .unwrap();
    let mut customer = TicketSync::start(repo.clone(), customer_viewer())
        .await
        .unwrap();
    customer.open_ticket(&id).await.unwrap();
    pump_until_list(&mut customer, |l| l.len() == 1).await;
    assert!(customer.can_reply());

    // Another client resolves the ticket; only the list subscription
    // carries the change, yet the detail view must see it.
    repo.update_status(&id, TicketStatus::Resolved).await.unwrap();
    pump_until_list(&mut customer, |l| {
        l.first().is_some_and(|t| t.status == TicketStatus::Resolved)
    })
    .await;
    assert_eq!(
        customer.current_ticket().map(|t| t.status),
        Some(TicketStatus::Resolved)
    );
    assert!(!customer.can_reply());
}
