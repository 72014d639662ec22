//! File-backed store, backup and config integration tests.

use chrono::{TimeZone, Utc};
use deepoverlay_core::{AnnotationBox, PageUrl, Rect};
use deepoverlay_storage::{
    parse_backup, JsonFileStore, KeyValueStore, OverlayConfig, PageStore, StorageError,
};
use tempfile::TempDir;

fn boxes(notes: &[&str]) -> Vec<AnnotationBox> {
    notes
        .iter()
        .zip(0u64..)
        .map(|(note, id)| {
            AnnotationBox::new(id, Rect::new(10.0 * id as f64, 20.0, 40.0, 40.0)).with_note(*note)
        })
        .collect()
}

#[test]
fn test_pages_survive_reopen() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("annotations.json");
    let page = PageUrl::normalize("https://example.com/article?utm=1");

    {
        let mut store = PageStore::new(JsonFileStore::open(&path).unwrap());
        assert!(store.save_all(&page, &boxes(&["a", "b"])));
    }

    let store = PageStore::new(JsonFileStore::open(&path).unwrap());
    let loaded = store.load_all(&PageUrl::normalize("https://example.com/article?utm=2"));
    assert_eq!(loaded.len(), 2, "query-only variants should share a record");
    assert_eq!(loaded[1].note, "b");
}

#[test]
fn test_deleting_last_box_leaves_empty_record() {
    let temp = TempDir::new().unwrap();
    let mut store = PageStore::new(JsonFileStore::open(temp.path().join("a.json")).unwrap());
    let a = PageUrl::normalize("https://x/a");
    let b = PageUrl::normalize("https://x/b");

    store.save_all(&a, &boxes(&["only"]));
    store.save_all(&b, &boxes(&["other"]));
    store.save_all(&a, &[]);

    let raw = store.backend().get(a.as_str()).unwrap();
    assert_eq!(raw, Some(serde_json::json!([])));
    assert_eq!(store.load_all(&b).len(), 1, "other pages should be untouched");
}

#[test]
fn test_export_then_import_round_trip() {
    let temp = TempDir::new().unwrap();
    let mut source = PageStore::new(JsonFileStore::open(temp.path().join("src.json")).unwrap());
    source.save_all(&PageUrl::normalize("https://x/a"), &boxes(&["one", "two"]));
    source.save_all(&PageUrl::normalize("https://y/b"), &boxes(&["three"]));

    let at = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
    let written = source
        .export(at)
        .unwrap()
        .write_to_dir(&temp.path().join("backups"))
        .unwrap();
    assert!(written.ends_with("deep_overlay_backup_2024-05-01.json"));

    let content = std::fs::read_to_string(&written).unwrap();
    let mut target = PageStore::new(JsonFileStore::open(temp.path().join("dst.json")).unwrap());
    target.save_all(&PageUrl::normalize("https://z/gone"), &boxes(&["stale"]));

    let pages = target.import(parse_backup(&content).unwrap()).unwrap();
    assert_eq!(pages, 2);
    assert_eq!(
        target.page_urls().unwrap(),
        vec!["https://x/a".to_string(), "https://y/b".to_string()]
    );
    assert_eq!(target.load_all(&PageUrl::normalize("https://x/a"))[1].note, "two");
}

#[test]
fn test_removed_profile_directory_degrades_to_noop() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("profile");
    let mut store = PageStore::new(JsonFileStore::open(dir.join("annotations.json")).unwrap());
    let page = PageUrl::normalize("https://x/a");

    std::fs::remove_dir_all(&dir).unwrap();
    assert!(!store.save_all(&page, &boxes(&["lost"])));
    assert!(store.load_all(&page).is_empty());
    assert!(matches!(store.clear_all(), Err(StorageError::ContextInvalidated)));
}

#[test]
fn test_config_round_trip_json_and_toml() {
    let temp = TempDir::new().unwrap();
    let mut config = OverlayConfig::default();
    config.interaction.min_box_size = 32.0;
    config.session.start_in_edit_mode = true;

    for name in ["overlay.json", "nested/overlay.toml"] {
        let path = temp.path().join(name);
        config.save_to_file(&path).unwrap();
        let loaded = OverlayConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config, "{} should round trip", name);
    }

    let missing = OverlayConfig::load_or_default(&temp.path().join("absent.toml")).unwrap();
    assert_eq!(missing, OverlayConfig::default());
}

#[test]
fn test_invalid_config_is_rejected_on_load() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("bad.toml");
    std::fs::write(&path, "[navigation]\npoll_interval_ms = 0\n").unwrap();
    assert!(OverlayConfig::load_from_file(&path).is_err());
}
