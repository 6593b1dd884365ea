//! Integration tests for the floor map REST API.
//!
//! Requests are driven through the router directly with `oneshot`, no
//! listening socket involved.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use floormap_core::{
    codec, ConfigStorage, FileConfigStorage, MapConfig, MemoryConfigStorage, PlacedSensor,
    SensorKind,
};
use floormap_web::{create_router, ServerState, ServiceInfo};

fn test_router() -> Router {
    let storage: Arc<dyn ConfigStorage> = Arc::new(MemoryConfigStorage::new());
    create_router(ServerState::new(
        storage,
        ServiceInfo {
            name: "test-server".to_string(),
            version: "0.0.1".to_string(),
        },
    ))
}

fn sample_config() -> MapConfig {
    MapConfig {
        floor_plan_url: "data:image/png;base64,iVBORw0KGgo=".to_string(),
        sensors: vec![PlacedSensor {
            id: "6f1c3c0e-0000-4000-8000-000000000001".to_string(),
            kind: SensorKind::Temperature,
            x: 50.0,
            y: 50.0,
            zone: "Zone2".to_string(),
            name: "temperature_1".to_string(),
        }],
    }
}

async fn send(router: &Router, method: Method, uri: &str, body: Body) -> (StatusCode, Vec<u8>) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body)
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

async fn get_json(router: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let (status, bytes) = send(router, Method::GET, uri, Body::empty()).await;
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_discovery() {
    let router = test_router();
    let (status, json) = get_json(&router, "/api").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["server"]["id"], "test-server");
    assert_eq!(json["server"]["version"], "0.0.1");
    assert_eq!(json["endpoints"]["facilities"], "/api/facilities");
}

#[tokio::test]
async fn test_catalog() {
    let router = test_router();

    let (status, kinds) = get_json(&router, "/api/sensor-kinds").await;
    assert_eq!(status, StatusCode::OK);
    let kinds = kinds.as_array().unwrap();
    assert_eq!(kinds.len(), 4);
    assert_eq!(kinds[0]["type"], "temperature");
    assert_eq!(kinds[0]["label"], "T");
    assert_eq!(kinds[3]["type"], "led_rgb");
    assert_eq!(kinds[3]["unit"], "PWM");
    assert_eq!(kinds[2]["displayName"], "Light");

    let (_, zones) = get_json(&router, "/api/zones").await;
    assert_eq!(zones, serde_json::json!(["Zone1", "Zone2", "Zone3", "Zone4"]));
}

#[tokio::test]
async fn test_save_then_fetch() {
    let router = test_router();
    let body = codec::export_config(&sample_config()).unwrap();

    let (status, _) = send(&router, Method::PUT, "/api/facilities/plant-1/map", Body::from(body)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, bytes) = send(&router, Method::GET, "/api/facilities/plant-1/map", Body::empty()).await;
    assert_eq!(status, StatusCode::OK);
    let fetched: MapConfig = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(fetched, sample_config());

    let (_, list) = get_json(&router, "/api/facilities").await;
    assert_eq!(list, serde_json::json!(["plant-1"]));
}

#[tokio::test]
async fn test_fetch_missing_is_not_found() {
    let router = test_router();
    let (status, json) = get_json(&router, "/api/facilities/nowhere/map").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn test_invalid_bodies_are_rejected() {
    let router = test_router();
    let bodies = [
        "not json".to_string(),
        r#"{"floorPlanUrl": ""}"#.to_string(),
        r#"{"floorPlanUrl": "", "sensors": [{"id": "a", "type": "smoke", "x": 1, "y": 2, "zone": "Zone1", "name": "s"}]}"#
            .to_string(),
    ];
    for body in bodies {
        let (status, _) = send(&router, Method::PUT, "/api/facilities/plant-1/map", Body::from(body.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "accepted {}", body);
    }

    let (status, _) = get_json(&router, "/api/facilities/plant-1/map").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_facility_id() {
    let router = test_router();
    let body = codec::export_config(&sample_config()).unwrap();

    let (status, _) = send(&router, Method::PUT, "/api/facilities/bad.id/map", Body::from(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete() {
    let router = test_router();
    let body = codec::export_config(&MapConfig::default()).unwrap();
    send(&router, Method::PUT, "/api/facilities/plant-2/map", Body::from(body)).await;

    let (status, _) = send(&router, Method::DELETE, "/api/facilities/plant-2/map", Body::empty()).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&router, Method::DELETE, "/api/facilities/plant-2/map", Body::empty()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_export_download() {
    let router = test_router();
    let body = codec::export_config(&sample_config()).unwrap();
    send(&router, Method::PUT, "/api/facilities/plant-3/map", Body::from(body)).await;

    let request = Request::builder()
        .uri("/api/facilities/plant-3/map/export")
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment; filename=\"floor1_map_config_"));
    assert!(disposition.ends_with(".json\""));

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("\n  \"sensors\": ["));
    assert_eq!(codec::import_config(text.as_bytes()).unwrap(), sample_config());
}

#[tokio::test]
async fn test_file_backed_router() {
    let dir = tempfile::tempdir().unwrap();
    let storage: Arc<dyn ConfigStorage> = Arc::new(FileConfigStorage::new(dir.path()).unwrap());
    let router = create_router(ServerState::new(storage, ServiceInfo::default()));

    let body = codec::export_config(&sample_config()).unwrap();
    let (status, _) = send(&router, Method::PUT, "/api/facilities/hall-a/map", Body::from(body)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(dir.path().join("facility-map.hall-a.json").is_file());

    let (status, json) = get_json(&router, "/api/facilities/hall-a/map").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["sensors"][0]["zone"], "Zone2");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_saves_to_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let storage: Arc<dyn ConfigStorage> = Arc::new(FileConfigStorage::new(dir.path()).unwrap());
    let router = create_router(ServerState::new(storage, ServiceInfo::default()));

    let full = codec::export_config(&sample_config()).unwrap();
    let empty = codec::export_config(&MapConfig::default()).unwrap();

    let mut tasks = Vec::new();
    for i in 0..16 {
        let router = router.clone();
        let body = if i % 2 == 0 { full.clone() } else { empty.clone() };
        tasks.push(tokio::spawn(async move {
            send(&router, Method::PUT, "/api/facilities/hall-b/map", Body::from(body)).await.0
        }));
    }
    for task in tasks {
        assert_eq!(task.await.unwrap(), StatusCode::NO_CONTENT);
    }

    let (status, bytes) = send(&router, Method::GET, "/api/facilities/hall-b/map", Body::empty()).await;
    assert_eq!(status, StatusCode::OK);
    let fetched: MapConfig = serde_json::from_slice(&bytes).unwrap();
    assert!(fetched == sample_config() || fetched == MapConfig::default());
}
