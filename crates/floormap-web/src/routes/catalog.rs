//! Static catalog consumed by the editor palette and zone filter.

use axum::{response::Json, routing::get, Router};
use floormap_core::{SensorKind, ZONES};
use serde::Serialize;

use crate::AppState;

/// A palette entry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorKindInfo {
    #[serde(rename = "type")]
    pub kind: SensorKind,
    pub label: &'static str,
    pub display_name: &'static str,
    pub unit: &'static str,
    pub min: f64,
    pub max: f64,
}

impl From<SensorKind> for SensorKindInfo {
    fn from(kind: SensorKind) -> Self {
        let range = kind.measurement_range();
        Self {
            kind,
            label: kind.label(),
            display_name: kind.display_name(),
            unit: range.unit,
            min: range.min,
            max: range.max,
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sensor-kinds", get(sensor_kinds))
        .route("/zones", get(zones))
}

/// GET /api/sensor-kinds
async fn sensor_kinds() -> Json<Vec<SensorKindInfo>> {
    Json(SensorKind::ALL.into_iter().map(SensorKindInfo::from).collect())
}

/// GET /api/zones
async fn zones() -> Json<Vec<&'static str>> {
    Json(ZONES.to_vec())
}
