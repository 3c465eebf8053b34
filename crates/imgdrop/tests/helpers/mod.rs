//! Test helpers: build uploaders wired to a recording observer.
//!
//! Run from workspace root: `cargo test -p imgdrop`.

#![allow(dead_code)]

pub mod fixtures;

use std::sync::Arc;

use imgdrop::{
    CropSelector, KeyValueStore, MemoryStore, RecordingObserver, Uploader, UploaderConfig,
    UploaderParts,
};

pub struct TestUploader {
    pub uploader: Uploader,
    pub observer: Arc<RecordingObserver>,
    pub store: Arc<MemoryStore>,
}

/// Configuration without compression, so file names and payloads stay as given.
pub fn plain_config() -> UploaderConfig {
    UploaderConfig {
        compression: None,
        ..Default::default()
    }
}

pub async fn setup_uploader(config: UploaderConfig) -> TestUploader {
    setup_uploader_with(config, Arc::new(MemoryStore::new()), None).await
}

pub async fn setup_uploader_with(
    config: UploaderConfig,
    store: Arc<MemoryStore>,
    selector: Option<Arc<dyn CropSelector>>,
) -> TestUploader {
    let observer = Arc::new(RecordingObserver::new());
    let mut parts = UploaderParts::default()
        .with_observer(observer.clone())
        .with_store(store.clone() as Arc<dyn KeyValueStore>);
    if let Some(selector) = selector {
        parts = parts.with_crop_selector(selector);
    }

    let uploader = Uploader::new(config, parts)
        .await
        .expect("Failed to build uploader");

    TestUploader {
        uploader,
        observer,
        store,
    }
}

pub fn names(uploader: &Uploader) -> Vec<String> {
    uploader
        .get_all()
        .iter()
        .map(|r| r.name().to_string())
        .collect()
}
