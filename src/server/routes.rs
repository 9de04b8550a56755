//! Router for the rendezvous HTTP surface

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use super::mailbox::MailboxStore;

#[derive(Debug, Serialize)]
struct MailboxSummary {
    open: usize,
}

/// Build the rendezvous router. The store is shared with every handler.
pub fn create_router(store: &MailboxStore) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/mailboxes", get(mailbox_summary))
        .with_state(store.clone())
}

async fn mailbox_summary(State(store): State<MailboxStore>) -> Json<MailboxSummary> {
    Json(MailboxSummary { open: store.len() })
}
