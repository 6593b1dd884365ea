//! JSON export/import of map configurations.
//!
//! Exports are pretty-printed. Imports are parsed into typed structures and
//! then validated, so a document that is valid JSON but not a map
//! configuration is rejected instead of leaking into the editor.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::error::Category;
use std::collections::HashSet;
use thiserror::Error;

use crate::config::MAP_CONFIG_KEY;
use crate::model::MapConfig;

/// Errors that can occur while encoding or decoding a configuration.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Input is not JSON at all.
    #[error("Invalid JSON: {0}")]
    Syntax(serde_json::Error),

    /// Input is JSON but does not have the expected shape.
    #[error("Invalid configuration: {0}")]
    Schema(String),

    /// Serialization failed.
    #[error("Failed to serialize configuration: {0}")]
    Serialize(serde_json::Error),
}

/// Encode a configuration as pretty-printed JSON.
pub fn export_config(config: &MapConfig) -> Result<Vec<u8>, CodecError> {
    serde_json::to_vec_pretty(config).map_err(CodecError::Serialize)
}

/// Parse a typed document, separating bad JSON from a wrong shape.
pub(crate) fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    serde_json::from_slice(bytes).map_err(|e| match e.classify() {
        Category::Data => CodecError::Schema(e.to_string()),
        Category::Io | Category::Syntax | Category::Eof => CodecError::Syntax(e),
    })
}

/// Decode and validate a configuration.
pub fn import_config(bytes: &[u8]) -> Result<MapConfig, CodecError> {
    let config: MapConfig = decode(bytes)?;
    validate(&config)?;
    Ok(config)
}

/// Check invariants that typed deserialization cannot express.
pub fn validate(config: &MapConfig) -> Result<(), CodecError> {
    if !config.floor_plan_url.is_empty() && config.floor_plan_url.trim().is_empty() {
        return Err(CodecError::Schema("floorPlanUrl is blank".to_string()));
    }

    let mut seen = HashSet::with_capacity(config.sensors.len());
    for sensor in &config.sensors {
        if sensor.id.is_empty() {
            return Err(CodecError::Schema("sensor with empty id".to_string()));
        }
        if !seen.insert(sensor.id.as_str()) {
            return Err(CodecError::Schema(format!("duplicate sensor id {}", sensor.id)));
        }
        if !sensor.x.is_finite() || !sensor.y.is_finite() {
            return Err(CodecError::Schema(format!(
                "sensor {} has a non-finite position",
                sensor.id
            )));
        }
    }
    Ok(())
}

/// File name offered for an export made at `now`.
pub fn export_file_name(now: DateTime<Utc>) -> String {
    format!("{}_{}.json", MAP_CONFIG_KEY, now.timestamp_millis())
}
