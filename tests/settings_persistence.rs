// Settings persistence against a real filesystem

use mymetronome::settings::{Direction, MetronomeSettings, NoteSubdivision, SettingsError, SettingsStore};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_first_launch_writes_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("mymetronome").join("settings.json");
    let mut store = SettingsStore::with_path(&path);

    assert_eq!(store.load(), MetronomeSettings::default());
    assert!(path.exists());

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json["bpm"], 67);
    assert_eq!(json["beats"], 4);
    assert_eq!(json["note"], 1.0);
}

#[test]
fn test_saved_settings_survive_restart() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.json");

    let settings = MetronomeSettings::default()
        .with_tempo_delta(53)
        .and_then(|s| s.with_beats_delta(-1))
        .and_then(|s| s.with_subdivision_step(Direction::Down))
        .unwrap();
    {
        let mut store = SettingsStore::with_path(&path);
        store.load();
        store.save(&settings).unwrap();
    }

    let mut store = SettingsStore::with_path(&path);
    let loaded = store.load();
    assert_eq!(loaded, settings);
    assert_eq!(loaded.tempo, 120);
    assert_eq!(loaded.beats_per_measure, 3);
    assert_eq!(loaded.note_subdivision, NoteSubdivision::Half);
}

#[test]
fn test_hand_edited_values_are_clamped() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.json");
    fs::write(&path, r#"{"bpm": 999, "beats": 40, "note": 0.25}"#).unwrap();

    let mut store = SettingsStore::with_path(&path);
    let loaded = store.load();
    assert_eq!(loaded.tempo, 300);
    assert_eq!(loaded.beats_per_measure, 12);
    assert_eq!(loaded.note_subdivision, NoteSubdivision::Whole);
    assert!(!store.is_disabled());
}

/// Load a hand-written file, check it stays writable and return what was read
fn load_hand_edited(json: &str) -> MetronomeSettings {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.json");
    fs::write(&path, json).unwrap();

    let mut store = SettingsStore::with_path(&path);
    let loaded = store.load();
    assert!(!store.is_disabled(), "{} disabled the store", json);

    // Later changes still reach the disk
    let changed = loaded.with_tempo_delta(-1).unwrap_or(loaded);
    store.save(&changed).unwrap();
    assert_eq!(SettingsStore::with_path(&path).load(), changed);
    loaded
}

#[test]
fn test_unknown_subdivision_reads_as_quarter() {
    let loaded = load_hand_edited(r#"{"bpm": 100, "beats": 5, "note": 3}"#);
    assert_eq!(loaded, MetronomeSettings::new(5, NoteSubdivision::Quarter, 100));
}

#[test]
fn test_tempo_beyond_field_range_is_clamped() {
    let loaded = load_hand_edited(r#"{"bpm": 70000, "beats": 4, "note": 1}"#);
    assert_eq!(loaded.tempo, 300);
}

#[test]
fn test_negative_beats_are_clamped() {
    let loaded = load_hand_edited(r#"{"bpm": 120, "beats": -1, "note": 1}"#);
    assert_eq!(loaded.beats_per_measure, 1);
    assert_eq!(loaded.tempo, 120);
}

#[test]
fn test_fractional_tempo_is_rounded() {
    let loaded = load_hand_edited(r#"{"bpm": 120.5, "beats": 4, "note": 0.5}"#);
    assert_eq!(loaded.tempo, 121);
    assert_eq!(loaded.note_subdivision, NoteSubdivision::Half);
}

#[test]
fn test_non_json_content_disables_saves() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.json");
    fs::write(&path, "bpm=120").unwrap();

    let mut store = SettingsStore::with_path(&path);
    assert_eq!(store.load(), MetronomeSettings::default());
    assert!(store.is_disabled());

    // The broken file is left alone for the rest of the session
    let result = store.save(&MetronomeSettings::default());
    assert!(matches!(result, Err(SettingsError::WritesDisabled)));
    assert_eq!(fs::read_to_string(&path).unwrap(), "bpm=120");
}

#[test]
fn test_unwritable_location_disables_saves() {
    let dir = TempDir::new().unwrap();
    // A plain file where the parent directory should be
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, "").unwrap();
    let mut store = SettingsStore::with_path(blocker.join("settings.json"));

    assert_eq!(store.load(), MetronomeSettings::default());
    assert!(store.is_disabled());
    assert!(matches!(
        store.save(&MetronomeSettings::default()),
        Err(SettingsError::WritesDisabled)
    ));
}
