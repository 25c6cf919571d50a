use super::*;
use tempfile::TempDir;

#[test]
fn memory_store_set_get_remove() {
    let store = MemoryStore::new();
    assert!(store.get_item("k").is_none());
    store.set_item("k", "v").unwrap();
    assert_eq!(store.get_item("k").as_deref(), Some("v"));
    store.remove_item("k").unwrap();
    assert!(store.get_item("k").is_none());
}

#[test]
fn file_store_missing_file_reads_empty() {
    let dir = TempDir::new().unwrap();
    let store = FileStore::new(dir.path().join("session.json"));
    assert!(store.get_item("adminToken").is_none());
}

#[test]
fn file_store_creates_parent_and_persists() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("session.json");
    let store = FileStore::new(&path);
    store.set_item("adminToken", "tok").unwrap();

    let reopened = FileStore::new(&path);
    assert_eq!(reopened.get_item("adminToken").as_deref(), Some("tok"));
}

#[test]
fn file_store_remove_keeps_other_keys() {
    let dir = TempDir::new().unwrap();
    let store = FileStore::new(dir.path().join("session.json"));
    store.set_item("adminToken", "tok").unwrap();
    store.set_item("theme", "dark").unwrap();
    store.remove_item("adminToken").unwrap();
    assert!(store.get_item("adminToken").is_none());
    assert_eq!(store.get_item("theme").as_deref(), Some("dark"));
}

#[test]
fn file_store_remove_missing_key_does_not_create_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("session.json");
    let store = FileStore::new(&path);
    store.remove_item("adminToken").unwrap();
    assert!(!path.exists());
}

#[test]
fn file_store_corrupt_file_reads_empty() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("session.json");
    std::fs::write(&path, b"not json").unwrap();
    let store = FileStore::new(&path);
    assert!(store.get_item("adminToken").is_none());
    store.set_item("adminToken", "fresh").unwrap();
    assert_eq!(store.get_item("adminToken").as_deref(), Some("fresh"));
}
