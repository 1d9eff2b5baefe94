//! Support desk walkthrough over the in-memory store.
//!
//! This example runs a customer session and an admin session against the
//! same store and walks a ticket from creation through reply to
//! resolution, printing what each side sees.
//!
//! Run with: cargo run -p ticket-sync --example support_desk

use std::sync::Arc;

use memory_store::MemoryStore;
use ticket_sync::{SyncEvent, TicketSync};
use tickets::{TicketRepository, TicketStatus, Viewer};

async fn show_next(label: &str, sync: &mut TicketSync) {
    if let Some(event) = sync.next_change().await {
        match event {
            SyncEvent::ListUpdated => {
                let counts = sync.counts();
                println!(
                    "[{label}] list: {} ticket(s), {} unread",
                    sync.tickets().len(),
                    counts.unread
                );
            }
            SyncEvent::ThreadUpdated { ticket_id } => {
                println!(
                    "[{label}] thread {ticket_id}: {} message(s)",
                    sync.messages().len()
                );
            }
            SyncEvent::ListLost => println!("[{label}] list subscription lost"),
            SyncEvent::ThreadLost { ticket_id } => {
                println!("[{label}] thread {ticket_id} subscription lost")
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for logging
    tracing_subscriber::fmt::init();

    let store = MemoryStore::new();
    let repo = TicketRepository::new(Arc::new(store));

    let customer_id = Viewer::customer("cust-1", "customer@example.com");
    let admin_id = Viewer::admin("admin-1", "support@example.com");

    let mut customer = TicketSync::start(repo.clone(), customer_id.clone()).await?;
    let mut admin = TicketSync::start(repo.clone(), admin_id.clone()).await?;
    show_next("customer", &mut customer).await;
    show_next("admin", &mut admin).await;

    // The customer files a ticket.
    let ticket = repo
        .create_ticket(&customer_id, "Billing question", "Why was I charged twice?")
        .await?;
    println!("created ticket {ticket}");
    show_next("customer", &mut customer).await;
    show_next("admin", &mut admin).await;

    // The customer adds detail; the admin side goes unread.
    repo.add_message(&ticket, &customer_id, "It shows up twice on my statement.")
        .await?;
    show_next("admin", &mut admin).await;

    // The admin opens the thread (clearing their unread flag) and replies.
    admin.open_ticket(&ticket).await?;
    show_next("admin", &mut admin).await;
    admin.send_message("Refund issued, sorry about that!").await?;
    show_next("admin", &mut admin).await;
    show_next("customer", &mut customer).await;

    // The customer reads the reply.
    customer.open_ticket(&ticket).await?;
    show_next("customer", &mut customer).await;
    for message in customer.messages() {
        println!("  {}: {}", message.user_email, message.message);
    }

    // The admin resolves the ticket; both sides see it and stop replying.
    admin.set_status(TicketStatus::Resolved).await?;
    show_next("admin", &mut admin).await;
    show_next("customer", &mut customer).await;
    println!(
        "customer can reply: {}, admin can transition: {}",
        customer.can_reply(),
        admin.can_transition()
    );

    customer.shutdown();
    admin.shutdown();
    Ok(())
}
