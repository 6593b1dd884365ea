//! Floor map editor state controller.
//!
//! The editor owns one [`MapConfig`] plus the transient interaction state
//! around it: the zone filter, the pending drag, the selected marker and the
//! viewport. Every method is a single synchronous transition driven by one
//! input event (file chosen, drag started, drop, click).
//!
//! Persistence goes through an injected [`ConfigStorage`]; the editor never
//! reaches for ambient global state.
//!
//! Failed operations leave the state exactly as it was, queue an error
//! [`Notification`] and return the error to the caller.

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::codec::{self, CodecError};
use crate::config::{self, ConfigError, ConfigStorage, MAP_CONFIG_KEY};
use crate::floor_plan::{self, DecodeError};
use crate::model::{is_known_zone_filter, MapConfig, PlacedSensor, SensorKind, ALL_ZONES, ZONES};
use crate::notification::Notification;
use crate::viewport::{Bounds, Point, Viewport};

/// Errors surfaced by editor operations.
#[derive(Debug, Error)]
pub enum EditorError {
    /// The uploaded floor plan could not be decoded.
    #[error("Could not read floor plan: {0}")]
    Decode(#[from] DecodeError),

    /// A configuration document was malformed.
    #[error("Could not parse configuration: {0}")]
    Parse(String),

    /// Nothing has been saved under the editor's key.
    #[error("No saved configuration found under {0}")]
    NotFound(String),

    /// The storage backend failed.
    #[error("Storage error: {0}")]
    Storage(ConfigError),
}

impl From<CodecError> for EditorError {
    fn from(err: CodecError) -> Self {
        EditorError::Parse(err.to_string())
    }
}

impl From<ConfigError> for EditorError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NotFound(key) => EditorError::NotFound(key),
            ConfigError::InvalidData(msg) => EditorError::Parse(msg),
            other => EditorError::Storage(other),
        }
    }
}

/// What the next drop on the map will do.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DragIntent {
    #[default]
    None,
    /// A palette item is being dragged and will create a marker.
    PlaceNew(SensorKind),
    /// An existing marker is being repositioned.
    MoveExisting(String),
}

/// Result of [`MapEditor::drop_on_map`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    Placed(String),
    Moved(String),
    Ignored,
}

/// An export ready to be offered as a download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// The editor controller.
pub struct MapEditor<S: ConfigStorage> {
    storage: S,
    storage_key: String,
    config: MapConfig,
    selected_zone: String,
    drag: DragIntent,
    selected_sensor_id: Option<String>,
    viewport: Viewport,
    dirty: bool,
    notifications: Vec<Notification>,
}

impl<S: ConfigStorage> MapEditor<S> {
    /// Create an empty editor persisting under [`MAP_CONFIG_KEY`].
    pub fn new(storage: S) -> Self {
        Self::with_key(storage, MAP_CONFIG_KEY)
    }

    /// Create an empty editor persisting under a custom key.
    pub fn with_key(storage: S, key: impl Into<String>) -> Self {
        Self {
            storage,
            storage_key: key.into(),
            config: MapConfig::default(),
            selected_zone: ALL_ZONES.to_string(),
            drag: DragIntent::None,
            selected_sensor_id: None,
            viewport: Viewport::default(),
            dirty: false,
            notifications: Vec::new(),
        }
    }

    /// Create an editor and hydrate it from storage when a saved
    /// configuration exists. A missing record is not reported.
    pub fn restore(storage: S) -> Self {
        let mut editor = Self::new(storage);
        match editor.load() {
            Ok(()) | Err(EditorError::NotFound(_)) => {}
            Err(e) => warn!("Starting with an empty map: {}", e),
        }
        editor.notifications.clear();
        editor
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn floor_plan_url(&self) -> &str {
        &self.config.floor_plan_url
    }

    pub fn sensors(&self) -> &[PlacedSensor] {
        &self.config.sensors
    }

    pub fn selected_zone(&self) -> &str {
        &self.selected_zone
    }

    pub fn drag(&self) -> &DragIntent {
        &self.drag
    }

    pub fn selected_sensor_id(&self) -> Option<&str> {
        self.selected_sensor_id.as_deref()
    }

    /// The marker shown in the detail panel.
    pub fn selected_sensor(&self) -> Option<&PlacedSensor> {
        self.selected_sensor_id
            .as_deref()
            .and_then(|id| self.config.sensor(id))
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    /// True when the map changed since the last save or load.
    pub fn has_unsaved_changes(&self) -> bool {
        self.dirty
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Drain queued notifications, oldest first.
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    // ========================================================================
    // Floor plan
    // ========================================================================

    /// Replace the floor plan with an uploaded image file.
    pub fn upload_floor_plan(&mut self, bytes: &[u8]) -> Result<(), EditorError> {
        match floor_plan::decode_floor_plan(bytes) {
            Ok(plan) => {
                info!(
                    mime = plan.mime_type,
                    width = plan.width,
                    height = plan.height,
                    "Floor plan uploaded"
                );
                self.config.floor_plan_url = plan.data_url;
                self.dirty = true;
                self.notify(Notification::success(
                    "Uploaded",
                    format!("Floor plan loaded ({}x{})", plan.width, plan.height),
                ));
                Ok(())
            }
            Err(e) => Err(self.fail("Upload failed", e.into())),
        }
    }

    /// Remove the background image. Markers are kept.
    pub fn clear_floor_plan(&mut self) {
        if self.config.has_floor_plan() {
            self.config.floor_plan_url.clear();
            self.dirty = true;
        }
    }

    // ========================================================================
    // Drag and drop
    // ========================================================================

    /// Start dragging a palette item.
    pub fn begin_palette_drag(&mut self, kind: SensorKind) {
        debug!(%kind, "Palette drag started");
        self.drag = DragIntent::PlaceNew(kind);
    }

    /// Start dragging a palette item given by its wire name. Unknown names
    /// are ignored.
    pub fn begin_palette_drag_named(&mut self, kind: &str) -> bool {
        match kind.parse::<SensorKind>() {
            Ok(kind) => {
                self.begin_palette_drag(kind);
                true
            }
            Err(e) => {
                debug!("Ignoring palette drag: {}", e);
                false
            }
        }
    }

    /// Start repositioning an existing marker. Unknown ids are ignored.
    pub fn begin_marker_drag(&mut self, sensor_id: &str) -> bool {
        if self.config.sensor(sensor_id).is_none() {
            return false;
        }
        debug!(sensor_id, "Marker drag started");
        self.drag = DragIntent::MoveExisting(sensor_id.to_string());
        true
    }

    /// Abandon the pending drag, if any.
    pub fn cancel_drag(&mut self) {
        self.drag = DragIntent::None;
    }

    /// Handle a drop on the map area.
    ///
    /// `bounds` is the rectangle the floor plan is rendered in; see
    /// [`Viewport::rendered_bounds`]. Positions outside it are stored as-is.
    /// Unusable bounds leave the drag pending.
    pub fn drop_on_map(&mut self, cursor: Point, bounds: Bounds) -> DropOutcome {
        if self.drag == DragIntent::None {
            return DropOutcome::Ignored;
        }
        let Some((x, y)) = bounds.relative_percent(cursor) else {
            debug!(?bounds, ?cursor, "Ignoring drop with unusable geometry");
            return DropOutcome::Ignored;
        };

        match std::mem::take(&mut self.drag) {
            DragIntent::PlaceNew(kind) => {
                let zone = if self.selected_zone == ALL_ZONES {
                    ZONES[0].to_string()
                } else {
                    self.selected_zone.clone()
                };
                let sensor = PlacedSensor {
                    id: Uuid::new_v4().to_string(),
                    kind,
                    x,
                    y,
                    zone,
                    name: format!("{}_{}", kind, self.config.sensors.len() + 1),
                };
                info!(id = %sensor.id, %kind, x, y, zone = %sensor.zone, "Sensor placed");
                let id = sensor.id.clone();
                self.config.sensors.push(sensor);
                self.dirty = true;
                DropOutcome::Placed(id)
            }
            DragIntent::MoveExisting(id) => match self.config.sensor_mut(&id) {
                Some(sensor) => {
                    sensor.x = x;
                    sensor.y = y;
                    debug!(%id, x, y, "Sensor moved");
                    self.dirty = true;
                    DropOutcome::Moved(id)
                }
                // Deleted while being dragged.
                None => DropOutcome::Ignored,
            },
            DragIntent::None => DropOutcome::Ignored,
        }
    }

    // ========================================================================
    // Selection and marker edits
    // ========================================================================

    /// Show a marker in the detail panel.
    ///
    /// Ignored for unknown ids and while a marker drag is pending, since the
    /// click that ends a drag must not also select.
    pub fn select_marker(&mut self, sensor_id: &str) -> bool {
        if matches!(self.drag, DragIntent::MoveExisting(_)) {
            return false;
        }
        if self.config.sensor(sensor_id).is_none() {
            return false;
        }
        self.selected_sensor_id = Some(sensor_id.to_string());
        true
    }

    pub fn clear_selection(&mut self) {
        self.selected_sensor_id = None;
    }

    /// Remove a marker. Removing an unknown id does nothing.
    pub fn delete_marker(&mut self, sensor_id: &str) -> bool {
        let before = self.config.sensors.len();
        self.config.sensors.retain(|s| s.id != sensor_id);
        if self.config.sensors.len() == before {
            return false;
        }
        if self.selected_sensor_id.as_deref() == Some(sensor_id) {
            self.selected_sensor_id = None;
        }
        if self.drag == DragIntent::MoveExisting(sensor_id.to_string()) {
            self.drag = DragIntent::None;
        }
        info!(sensor_id, "Sensor deleted");
        self.dirty = true;
        true
    }

    /// Rename a marker. Blank names are ignored.
    pub fn rename_marker(&mut self, sensor_id: &str, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() {
            return false;
        }
        match self.config.sensor_mut(sensor_id) {
            Some(sensor) => {
                sensor.name = name.to_string();
                self.dirty = true;
                true
            }
            None => false,
        }
    }

    /// Move a marker to another zone from [`ZONES`].
    pub fn set_marker_zone(&mut self, sensor_id: &str, zone: &str) -> bool {
        if !ZONES.contains(&zone) {
            return false;
        }
        match self.config.sensor_mut(sensor_id) {
            Some(sensor) => {
                sensor.zone = zone.to_string();
                self.dirty = true;
                true
            }
            None => false,
        }
    }

    /// Remove every marker once `confirm` agrees. Returns whether anything
    /// was cleared.
    pub fn clear_all<F: FnOnce() -> bool>(&mut self, confirm: F) -> bool {
        if !confirm() {
            return false;
        }
        let removed = self.config.sensors.len();
        self.config.sensors.clear();
        self.selected_sensor_id = None;
        if matches!(self.drag, DragIntent::MoveExisting(_)) {
            self.drag = DragIntent::None;
        }
        self.dirty = true;
        info!(removed, "All sensors cleared");
        self.notify(Notification::info(
            "Cleared",
            format!("Removed {} sensors", removed),
        ));
        true
    }

    // ========================================================================
    // Zone filter
    // ========================================================================

    /// Set the active zone filter. Unknown zones are ignored.
    pub fn set_zone_filter(&mut self, zone: &str) -> bool {
        if !is_known_zone_filter(zone) {
            return false;
        }
        self.selected_zone = zone.to_string();
        true
    }

    /// Markers in `zone`, or all markers for [`ALL_ZONES`], in creation order.
    pub fn filter_by_zone(&self, zone: &str) -> Vec<&PlacedSensor> {
        self.config
            .sensors
            .iter()
            .filter(|s| zone == ALL_ZONES || s.zone == zone)
            .collect()
    }

    /// Markers matching the active filter.
    pub fn visible_sensors(&self) -> Vec<&PlacedSensor> {
        self.filter_by_zone(&self.selected_zone)
    }

    /// Distinct zones used by placed markers, in first-seen order.
    pub fn zones_in_use(&self) -> Vec<&str> {
        let mut zones: Vec<&str> = Vec::new();
        for sensor in &self.config.sensors {
            if !zones.contains(&sensor.zone.as_str()) {
                zones.push(&sensor.zone);
            }
        }
        zones
    }

    /// Marker count per kind, in palette order.
    pub fn kind_counts(&self) -> Vec<(SensorKind, usize)> {
        SensorKind::ALL
            .into_iter()
            .map(|kind| {
                let count = self.config.sensors.iter().filter(|s| s.kind == kind).count();
                (kind, count)
            })
            .collect()
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Persist the configuration, overwriting any previous save.
    pub fn save(&mut self) -> Result<(), EditorError> {
        match config::save_map_config(&self.storage, &self.storage_key, &self.config) {
            Ok(()) => {
                info!(key = %self.storage_key, sensors = self.config.sensors.len(), "Map saved");
                self.dirty = false;
                self.notify(Notification::success(
                    "Saved",
                    "Map configuration saved",
                ));
                Ok(())
            }
            Err(e) => Err(self.fail("Save failed", e.into())),
        }
    }

    /// Restore the persisted configuration. On any failure the current map
    /// is kept.
    pub fn load(&mut self) -> Result<(), EditorError> {
        match config::load_map_config(&self.storage, &self.storage_key) {
            Ok(loaded) => {
                info!(key = %self.storage_key, sensors = loaded.sensors.len(), "Map loaded");
                self.replace_config(loaded);
                self.dirty = false;
                self.notify(Notification::success(
                    "Loaded",
                    "Map configuration loaded",
                ));
                Ok(())
            }
            Err(ConfigError::NotFound(key)) => {
                self.notify(Notification::info(
                    "Nothing saved",
                    "No saved map configuration found",
                ));
                Err(EditorError::NotFound(key))
            }
            Err(e) => Err(self.fail("Load failed", e.into())),
        }
    }

    /// Pretty-printed JSON of the current configuration.
    pub fn export_config(&self) -> Result<Vec<u8>, EditorError> {
        Ok(codec::export_config(&self.config)?)
    }

    /// Export as a named file for download.
    pub fn export_download(&mut self, now: DateTime<Utc>) -> Result<ExportFile, EditorError> {
        match self.export_config() {
            Ok(bytes) => {
                let file_name = codec::export_file_name(now);
                self.notify(Notification::success("Exported", file_name.clone()));
                Ok(ExportFile { file_name, bytes })
            }
            Err(e) => Err(self.fail("Export failed", e)),
        }
    }

    /// Replace the whole map with an imported configuration.
    pub fn import_config(&mut self, bytes: &[u8]) -> Result<(), EditorError> {
        match codec::import_config(bytes) {
            Ok(imported) => {
                info!(sensors = imported.sensors.len(), "Map imported");
                self.replace_config(imported);
                self.dirty = true;
                self.notify(Notification::success(
                    "Imported",
                    "Map configuration imported",
                ));
                Ok(())
            }
            Err(e) => Err(self.fail("Import failed", e.into())),
        }
    }

    fn replace_config(&mut self, config: MapConfig) {
        self.config = config;
        self.selected_sensor_id = None;
        self.drag = DragIntent::None;
    }

    fn notify(&mut self, notification: Notification) {
        self.notifications.push(notification);
    }

    fn fail(&mut self, title: &str, err: EditorError) -> EditorError {
        warn!("{}: {}", title, err);
        self.notify(Notification::error(title, err.to_string()));
        err
    }
}
