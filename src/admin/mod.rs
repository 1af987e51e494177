//! Admin API: routing-table snapshot plus the inbound event feed.
//!
//! # Data Flow
//! ```text
//! GET  /routes            → registry snapshot (uri → endpoint descriptors)
//! GET  /health            → liveness probe
//! POST /events/register   → bounded inbox → subscriber → Register
//! POST /events/unregister → bounded inbox → subscriber → Unregister
//! ```
//!
//! # Design Decisions
//! - The event feed publishes into the same bounded inbox any transport
//!   would; a full inbox answers 429 rather than queueing unbounded

pub mod handlers;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::mbus::InboxSender;
use crate::registry::RouteRegistry;

use self::handlers::{get_health, get_routes, post_register, post_unregister};

#[derive(Clone)]
pub struct AdminState {
    pub registry: Arc<RouteRegistry>,
    pub inbox: InboxSender,
}

pub fn admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/routes", get(get_routes))
        .route("/health", get(get_health))
        .route("/events/register", post(post_register))
        .route("/events/unregister", post(post_unregister))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the admin API until the shutdown signal fires.
pub async fn serve(
    listener: TcpListener,
    state: AdminState,
    mut shutdown: broadcast::Receiver<()>,
) -> std::io::Result<()> {
    axum::serve(listener, admin_router(state))
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await
}
