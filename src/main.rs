//! Menu Stand
//!
//! Serves the food stand menu and its admin page.

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use menu_stand::api::{self, AppState};
use menu_stand::backend::{ClientSettings, Connection};
use menu_stand::config::{self, ConfigStore};
use menu_stand::menu::BundledMenu;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "menu_stand=debug,tower_http=debug,axum::rejection=trace".into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Menu Stand v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = config::load_config()?;
    tracing::info!(?config, "Configuration loaded");

    let config_dir = config::get_config_dir();
    let store = ConfigStore::new(&config_dir, config.backend.clone());
    if store.is_configured() {
        tracing::info!("Backend configuration found at {}", store.path().display());
        if store.get_config().is_some_and(|backend| backend.is_memory()) {
            tracing::warn!("Using the in-process database, edits are lost on restart");
        }
    } else {
        tracing::warn!("No backend configured, serving the bundled menu read-only");
    }

    let connection = Arc::new(Connection::new(
        store,
        ClientSettings {
            session_path: config_dir.join("session.json"),
            local_admin: config.admin.clone(),
        },
    ));
    let source = Arc::new(BundledMenu::new(config.data_dir.clone()));
    let state = AppState::new(connection.clone(), source);

    // Static carta is rendered once up front
    {
        let mut carta = state.carta.write().await;
        state.loader.load_into(&mut carta).await;
    }

    let app = api::router(state)
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(connection))
        .await?;

    tracing::info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal(connection: Arc<Connection>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");

    // Open event streams only close once their subscriptions end
    connection.reinitialize().await;
}
