//! Session persistence through the uploader.
//!
//! Run with: `cargo test -p imgdrop --test session_test`

mod helpers;

use std::sync::Arc;

use helpers::fixtures::{png_file, text_file};
use helpers::{names, plain_config, setup_uploader_with};
use imgdrop::{
    create_store, KeyValueStore, MemoryStore, SessionSpec, StoreConfig, Uploader, UploaderConfig,
    UploaderParts,
};

fn session_config(key: &str) -> UploaderConfig {
    UploaderConfig {
        multiple: true,
        session: Some(SessionSpec::with_key(key)),
        ..plain_config()
    }
}

#[tokio::test]
async fn test_collection_survives_a_new_uploader() {
    let store = Arc::new(MemoryStore::new());

    let mut first = setup_uploader_with(session_config("uploads"), store.clone(), None).await;
    first
        .uploader
        .add_files(vec![text_file("a.txt", 3), png_file("b.png", 4, 4)])
        .await
        .unwrap();
    let original: Vec<_> = first
        .uploader
        .get_all()
        .iter()
        .map(|r| (r.meta().clone(), r.encoded_data().to_string()))
        .collect();
    first.uploader.detach().await;

    let second = setup_uploader_with(session_config("uploads"), store.clone(), None).await;

    assert_eq!(names(&second.uploader), vec!["a.txt", "b.png"]);
    let restored: Vec<_> = second
        .uploader
        .get_all()
        .iter()
        .map(|r| (r.meta().clone(), r.encoded_data().to_string()))
        .collect();
    assert_eq!(restored, original);
    assert_eq!(
        second.observer.file_changes(),
        vec![vec!["a.txt".to_string(), "b.png".to_string()]]
    );
}

#[tokio::test]
async fn test_persisted_value_is_a_json_array() {
    let store = Arc::new(MemoryStore::new());
    let mut t = setup_uploader_with(session_config("uploads"), store.clone(), None).await;

    t.uploader
        .add_files(vec![text_file("a.txt", 3)])
        .await
        .unwrap();

    let raw = store.get("uploads").await.unwrap().unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let entries = json.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["file"]["name"], "a.txt");
    assert_eq!(entries[0]["file"]["size"], 3);
    assert_eq!(entries[0]["file"]["type"], "text/plain");
    assert!(entries[0]["file"]["lastModified"].is_i64());
    assert_eq!(entries[0]["base64"], "data:text/plain;base64,eHh4");
}

#[tokio::test]
async fn test_removing_the_last_file_forgets_the_session() {
    let store = Arc::new(MemoryStore::new());
    let mut t = setup_uploader_with(session_config("uploads"), store.clone(), None).await;

    t.uploader
        .add_files(vec![text_file("a.txt", 1), text_file("b.txt", 1)])
        .await
        .unwrap();

    t.uploader.remove_at(0).await.unwrap();
    let raw = store.get("uploads").await.unwrap().unwrap();
    assert!(raw.contains("b.txt"));
    assert!(!raw.contains("a.txt"));

    t.uploader.remove_at(0).await.unwrap();
    assert_eq!(store.get("uploads").await.unwrap(), None);
}

#[tokio::test]
async fn test_clear_all_is_idempotent() {
    let store = Arc::new(MemoryStore::new());
    let mut t = setup_uploader_with(session_config("uploads"), store.clone(), None).await;
    t.uploader
        .add_files(vec![text_file("a.txt", 1)])
        .await
        .unwrap();

    t.uploader.clear_all().await;
    t.uploader.clear_all().await;

    assert!(t.uploader.get_all().is_empty());
    assert_eq!(t.uploader.registry().live_count(), 0);
    assert_eq!(store.get("uploads").await.unwrap(), None);
    let changes = t.observer.file_changes();
    assert_eq!(changes.len(), 3);
    assert!(changes[1].is_empty() && changes[2].is_empty());
}

#[tokio::test]
async fn test_detach_clears_session_when_configured() {
    let store = Arc::new(MemoryStore::new());
    let mut config = session_config("uploads");
    if let Some(session) = config.session.as_mut() {
        session.clear_on_detach = true;
    }
    let mut t = setup_uploader_with(config, store.clone(), None).await;
    t.uploader
        .add_files(vec![text_file("a.txt", 1)])
        .await
        .unwrap();
    let registry = t.uploader.registry().clone();

    t.uploader.detach().await;

    assert_eq!(store.get("uploads").await.unwrap(), None);
    assert_eq!(registry.live_count(), 0);
}

#[tokio::test]
async fn test_corrupt_session_starts_empty() {
    let store = Arc::new(MemoryStore::new());
    store
        .set("uploads", "[{\"file\": 1}]".to_string())
        .await
        .unwrap();

    let t = setup_uploader_with(session_config("uploads"), store.clone(), None).await;

    assert!(t.uploader.get_all().is_empty());
    assert!(t.observer.file_changes().is_empty());
}

#[tokio::test]
async fn test_sessions_are_isolated_by_key() {
    let store = Arc::new(MemoryStore::new());
    let mut first = setup_uploader_with(session_config("one"), store.clone(), None).await;
    first
        .uploader
        .add_files(vec![text_file("a.txt", 1)])
        .await
        .unwrap();

    let second = setup_uploader_with(session_config("two"), store.clone(), None).await;
    assert!(second.uploader.get_all().is_empty());
}

#[tokio::test]
async fn test_full_store_does_not_fail_the_batch() {
    let store = Arc::new(MemoryStore::with_quota(16));
    let mut t = setup_uploader_with(session_config("uploads"), store.clone(), None).await;

    t.uploader
        .add_files(vec![text_file("a.txt", 64)])
        .await
        .unwrap();

    assert_eq!(names(&t.uploader), vec!["a.txt"]);
    assert_eq!(store.get("uploads").await.unwrap(), None);
    assert!(t.observer.errors().is_empty());
}

#[tokio::test]
async fn test_local_store_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let store = create_store(&StoreConfig::local(dir.path())).await.unwrap();

    let mut first = Uploader::new(
        session_config("local"),
        UploaderParts::default().with_store(store.clone()),
    )
    .await
    .unwrap();
    first
        .add_files(vec![png_file("a.png", 3, 3)])
        .await
        .unwrap();
    first.detach().await;

    let store = create_store(&StoreConfig::local(dir.path())).await.unwrap();
    let second = Uploader::new(
        session_config("local"),
        UploaderParts::default().with_store(store),
    )
    .await
    .unwrap();

    assert_eq!(names(&second), vec!["a.png"]);
    assert!(dir.path().join("local.json").exists());
}
