//! Route Registry Control Plane
//!
//! The service-registry core of a lightweight reverse proxy, built with
//! Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                   ┌────────────────────────────────────────────────┐
//!                   │              ROUTE REGISTRY                    │
//!                   │                                                │
//!  Register /       │  ┌─────────┐   ┌────────────┐   ┌───────────┐ │
//!  unregister ──────┼─▶│  admin  │──▶│ mbus inbox │──▶│subscriber │ │
//!  events           │  │ /events │   │ (bounded)  │   │ (decode + │ │
//!                   │  └─────────┘   └────────────┘   │  validate)│ │
//!                   │                                 └─────┬─────┘ │
//!                   │                                       ▼       │
//!  Dispatch-path    │  ┌─────────┐                  ┌─────────────┐ │
//!  lookups ─────────┼─▶│ /routes │◀─────────────────│RouteRegistry│ │
//!  & tooling        │  └─────────┘                  │ trie + pools│ │
//!                   │                               └──────┬──────┘ │
//!                   │       pruning cycle (suspendable) ◀──┘        │
//!                   │                                                │
//!                   │  config · tracing · metrics · shutdown         │
//!                   └────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use route_registry::admin::{self, AdminState};
use route_registry::config::{load_config, RegistryConfig};
use route_registry::lifecycle::Shutdown;
use route_registry::mbus::{inbox, Subscriber};
use route_registry::registry::{BusConnectivity, RouteRegistry};

#[derive(Parser)]
#[command(name = "route-registry")]
#[command(about = "Routing-table control plane for a lightweight reverse proxy")]
struct Args {
    /// Path to a TOML config file; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "route_registry=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("route-registry v{} starting", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => RegistryConfig::default(),
    };

    tracing::info!(
        prune_interval_secs = config.pruning.interval_secs,
        stale_threshold_secs = config.pruning.stale_threshold_secs,
        admin_address = %config.admin.bind_address,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            route_registry::observability::metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let shutdown = Shutdown::new();

    // The registry and its pruning cycle, suspended whenever the event
    // transport reports itself disconnected.
    let registry = Arc::new(RouteRegistry::new(
        config.pruning.interval(),
        config.pruning.stale_threshold(),
    ));
    let connectivity = Arc::new(BusConnectivity::new());
    registry.suspend_pruning(connectivity.clone());
    registry.start_pruning_cycle();

    // Event path: bounded inbox feeding the subscriber.
    let (inbox_tx, inbox_rx) = inbox::bounded(config.mbus.pending_limits());
    let (ready_tx, ready_rx) = oneshot::channel();
    let subscriber = Subscriber::new(registry.clone());
    tokio::spawn(subscriber.run(inbox_rx, ready_tx, shutdown.subscribe()));
    ready_rx.await?;

    // Admin API: snapshot reads plus the HTTP event feed.
    let listener = TcpListener::bind(&config.admin.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Admin API listening");
    let admin_state = AdminState {
        registry: registry.clone(),
        inbox: inbox_tx,
    };
    let admin_shutdown = shutdown.subscribe();
    let admin_task = tokio::spawn(admin::serve(listener, admin_state, admin_shutdown));

    tokio::signal::ctrl_c().await?;
    tracing::info!(
        tasks = shutdown.receiver_count(),
        "Termination signal received; shutting down"
    );

    connectivity.set_connected(false);
    registry.stop_pruning_cycle();
    shutdown.trigger();
    admin_task.await??;

    tracing::info!("Shutdown complete");
    Ok(())
}
