//! # floormap-web
//!
//! REST API serving floor map configurations per facility.
//!
//! This crate provides the server side of the map configuration contract:
//! fetch and save a facility's [`MapConfig`](floormap_core::MapConfig), plus
//! the static catalog (sensor palette, zones) the editor needs.
//!
//! ## Architecture
//!
//! The web layer is built on Axum and provides these route groups:
//!
//! - `/api` - Discovery document
//! - `/api/facilities/` - Per-facility map configurations
//! - `/api/sensor-kinds`, `/api/zones` - Editor catalog
//!
//! ## Usage
//!
//! ```rust,ignore
//! use floormap_web::{create_router, ServerState};
//!
//! let state = ServerState::new(storage, ServiceInfo::default());
//! let app = create_router(state);
//!
//! let listener = TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, app).await?;
//! ```

pub mod error;
pub mod routes;

// Re-exports
pub use error::ApiError;
pub use routes::create_router;

use floormap_core::ConfigStorage;
use std::sync::Arc;

/// Name and version reported by the discovery endpoint.
#[derive(Debug, Clone)]
pub struct ServiceInfo {
    pub name: String,
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            name: "floormap-server".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Shared server state for all route handlers.
pub struct ServerState {
    pub storage: Arc<dyn ConfigStorage>,
    pub info: ServiceInfo,
}

impl ServerState {
    /// Create new server state wrapped for sharing across handlers.
    pub fn new(storage: Arc<dyn ConfigStorage>, info: ServiceInfo) -> AppState {
        Arc::new(Self { storage, info })
    }
}

/// Type alias for shared state in Axum handlers.
pub type AppState = Arc<ServerState>;
