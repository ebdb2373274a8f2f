//! redb persistence.

use cuelight_core::{Store, credentials, store::load_cue_texts};
use cuelight_server::RedbStore;

#[test]
fn values_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cuelight.redb");

    {
        let store = RedbStore::open(&path).unwrap();
        store.put("cue_texts", "cue1", "Fly In").unwrap();
        credentials::save(&store, "Studio", "secret123").unwrap();
    }

    let store = RedbStore::open(&path).unwrap();
    assert_eq!(load_cue_texts(&store, 3), vec![None, Some("Fly In".to_string()), None]);
    let saved = credentials::load(&store).unwrap().unwrap();
    assert_eq!(saved.ssid, "Studio");
    assert_eq!(saved.password, "secret123");
}

#[test]
fn namespaces_do_not_collide() {
    let dir = tempfile::tempdir().unwrap();
    let store = RedbStore::open(&dir.path().join("db.redb")).unwrap();

    store.put("wifi", "ssid", "A").unwrap();
    store.put("cue_texts", "ssid", "B").unwrap();
    store.put("wifi", "ssid", "C").unwrap();

    assert_eq!(store.get("wifi", "ssid").unwrap().as_deref(), Some("C"));
    assert_eq!(store.get("cue_texts", "ssid").unwrap().as_deref(), Some("B"));
    assert_eq!(store.get("wifi", "pass").unwrap(), None);
}

#[test]
fn creates_missing_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("state").join("cuelight.redb");
    let store = RedbStore::open(&path).unwrap();
    store.put("wifi", "ssid", "Booth").unwrap();
    assert!(path.exists());
}
