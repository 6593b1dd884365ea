mod settings;

use std::sync::Arc;

use floormap_core::{ConfigStorage, FacilityMaps, FileConfigStorage};
use floormap_web::{create_router, ServerState, ServiceInfo};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use settings::ServerSettings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Settings are read before tracing so the file can supply the filter
    let settings = ServerSettings::discover(std::env::var_os("FLOORMAP_SETTINGS").map(Into::into))?
        .with_overrides(
            std::env::var("FLOORMAP_BIND").ok(),
            std::env::var("FLOORMAP_DATA_DIR").ok(),
        )
        .resolve()?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| settings.log_filter.clone()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Floor map server starting...");

    let storage = FileConfigStorage::new(&settings.data_dir)?;
    let facilities = FacilityMaps::list_facilities(&storage)?;
    tracing::info!(
        data_dir = %settings.data_dir.display(),
        facilities = facilities.len(),
        "Map storage ready"
    );

    let storage: Arc<dyn ConfigStorage> = Arc::new(storage);
    let state = ServerState::new(
        storage,
        ServiceInfo {
            name: settings.name.clone(),
            ..ServiceInfo::default()
        },
    );
    let app = create_router(state).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(settings.bind).await?;
    tracing::info!("HTTP API listening on http://{}/api", settings.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Received Ctrl+C, shutting down...");
}
