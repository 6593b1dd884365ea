//! Editor persistence against the file-backed store.
//!
//! These tests reopen the storage directory to simulate a restart of the
//! dashboard between save and load.

use floormap_core::{
    Bounds, ConfigStorage, DropOutcome, EditorError, FileConfigStorage, MapEditor, Point,
    SensorKind, MAP_CONFIG_KEY,
};

fn bounds() -> Bounds {
    Bounds::new(0.0, 0.0, 1000.0, 500.0)
}

#[test]
fn test_saved_map_survives_restart() {
    let dir = tempfile::tempdir().unwrap();

    let mut editor = MapEditor::new(FileConfigStorage::new(dir.path()).unwrap());
    editor.set_zone_filter("Zone3");
    editor.begin_palette_drag(SensorKind::Humidity);
    let placed = editor.drop_on_map(Point::new(250.0, 125.0), bounds());
    let DropOutcome::Placed(id) = placed else {
        panic!("Expected Placed, got {:?}", placed);
    };
    editor.save().unwrap();
    drop(editor);

    let restored = MapEditor::restore(FileConfigStorage::new(dir.path()).unwrap());
    let sensors = restored.sensors();
    assert_eq!(sensors.len(), 1);
    assert_eq!(sensors[0].id, id);
    assert_eq!((sensors[0].x, sensors[0].y), (25.0, 25.0));
    assert_eq!(sensors[0].zone, "Zone3");
    assert_eq!(sensors[0].name, "humidity_1");
    assert!(!restored.has_unsaved_changes());
}

#[test]
fn test_load_from_empty_directory_reports_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let mut editor = MapEditor::new(FileConfigStorage::new(dir.path()).unwrap());

    editor.begin_palette_drag(SensorKind::Light);
    editor.drop_on_map(Point::new(10.0, 10.0), bounds());

    assert!(matches!(editor.load(), Err(EditorError::NotFound(_))));
    assert_eq!(editor.sensors().len(), 1);
}

#[test]
fn test_corrupt_file_is_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileConfigStorage::new(dir.path()).unwrap();
    storage
        .write(MAP_CONFIG_KEY, r#"{"floorPlanUrl": "", "sensors": [{"id": 1}]}"#)
        .unwrap();

    let mut editor = MapEditor::new(storage);
    assert!(matches!(editor.load(), Err(EditorError::Parse(_))));
    assert!(editor.sensors().is_empty());

    let notes = editor.take_notifications();
    assert_eq!(notes.len(), 1);
    assert!(notes[0].is_error());
}

#[test]
fn test_exported_file_imports_into_fresh_editor() {
    let dir = tempfile::tempdir().unwrap();
    let mut editor = MapEditor::new(FileConfigStorage::new(dir.path().join("a")).unwrap());
    for (kind, x) in [(SensorKind::Temperature, 100.0), (SensorKind::LedRgb, 900.0)] {
        editor.begin_palette_drag(kind);
        editor.drop_on_map(Point::new(x, 250.0), bounds());
    }

    let export = editor.export_download(chrono::Utc::now()).unwrap();
    let path = dir.path().join(&export.file_name);
    std::fs::write(&path, &export.bytes).unwrap();

    let mut other = MapEditor::new(FileConfigStorage::new(dir.path().join("b")).unwrap());
    other.import_config(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(other.config(), editor.config());
}
