//! Facility map configuration routes.
//!
//! # Endpoints
//!
//! ### `GET /api/facilities`
//! Facility ids that have a stored map, sorted.
//!
//! ### `GET /api/facilities/:facility_id/map`
//! The stored map configuration. `404` when nothing is stored.
//!
//! ### `PUT /api/facilities/:facility_id/map`
//! Replace the map configuration. The body is validated exactly like an
//! editor import; invalid documents are rejected with `400`.
//!
//! ### `DELETE /api/facilities/:facility_id/map`
//! Remove the stored map. `204` on success, `404` when absent.
//!
//! ### `GET /api/facilities/:facility_id/map/export`
//! Pretty-printed JSON served as a file download.
//!
//! Storage calls block on file I/O, so every handler hands them to
//! [`tokio::task::spawn_blocking`].

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use chrono::Utc;
use floormap_core::{codec, ConfigError, ConfigStorage, FacilityMaps, MapConfig};
use tracing::info;

use crate::{ApiError, AppState};

/// Create facility map routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/facilities", get(list_facilities))
        .route(
            "/facilities/:facility_id/map",
            get(get_map).put(put_map).delete(delete_map),
        )
        .route("/facilities/:facility_id/map/export", get(export_map))
}

/// Run a storage operation on the blocking thread pool.
async fn with_storage<T, F>(state: &AppState, op: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&dyn ConfigStorage) -> Result<T, ConfigError> + Send + 'static,
{
    let storage = state.storage.clone();
    let result = tokio::task::spawn_blocking(move || op(storage.as_ref())).await?;
    Ok(result?)
}

/// GET /api/facilities
async fn list_facilities(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    let ids = with_storage(&state, |storage| FacilityMaps::list_facilities(storage)).await?;
    Ok(Json(ids))
}

/// GET /api/facilities/:facility_id/map
async fn get_map(
    State(state): State<AppState>,
    Path(facility_id): Path<String>,
) -> Result<Json<MapConfig>, ApiError> {
    let config = with_storage(&state, move |storage| {
        FacilityMaps::fetch_config(storage, &facility_id)
    })
    .await?;
    Ok(Json(config))
}

/// PUT /api/facilities/:facility_id/map
async fn put_map(
    State(state): State<AppState>,
    Path(facility_id): Path<String>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let config = codec::import_config(&body)?;
    let sensors = config.sensors.len();
    let id = facility_id.clone();
    with_storage(&state, move |storage| {
        FacilityMaps::save_config(storage, &id, &config)
    })
    .await?;
    info!(facility = %facility_id, sensors, "Map configuration saved");
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/facilities/:facility_id/map
async fn delete_map(
    State(state): State<AppState>,
    Path(facility_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = facility_id.clone();
    with_storage(&state, move |storage| FacilityMaps::delete_config(storage, &id)).await?;
    info!(facility = %facility_id, "Map configuration deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/facilities/:facility_id/map/export
async fn export_map(
    State(state): State<AppState>,
    Path(facility_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let config = with_storage(&state, move |storage| {
        FacilityMaps::fetch_config(storage, &facility_id)
    })
    .await?;
    let bytes = codec::export_config(&config)?;
    let disposition = format!(
        "attachment; filename=\"{}\"",
        codec::export_file_name(Utc::now())
    );
    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}
