//! HTTP route handlers for the floor map service.

pub mod catalog;
pub mod maps;

use crate::AppState;
use axum::{extract::State, response::Json, routing::get, Router};
use tower_http::cors::CorsLayer;

/// Create the main Axum router with all routes.
///
/// Routes are organized as:
/// - `/api` - Discovery
/// - `/api/facilities/...` - Map configurations
/// - `/api/sensor-kinds`, `/api/zones` - Catalog
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api", api_routes())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        // Discovery endpoint
        .route("/", get(discovery_handler))
        .merge(maps::routes())
        .merge(catalog::routes())
}

/// Handler for `/api` discovery endpoint.
async fn discovery_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "server": {
            "id": state.info.name,
            "version": state.info.version
        },
        "endpoints": {
            "facilities": "/api/facilities",
            "map": "/api/facilities/{facilityId}/map",
            "export": "/api/facilities/{facilityId}/map/export",
            "sensorKinds": "/api/sensor-kinds",
            "zones": "/api/zones"
        }
    }))
}
