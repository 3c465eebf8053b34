//! Ephemeral access URLs for in-memory file payloads.
//!
//! An [`ObjectUrl`] is the process-local reference a preview surface uses to
//! reach a record's bytes. URLs are minted by an [`ObjectUrlRegistry`] and
//! revoked when the owning value is consumed with [`ObjectUrl::revoke`] or
//! dropped. `ObjectUrl` is not `Clone`, so once it is revoked no code can hold
//! it any more.

use bytes::Bytes;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use crate::constants::OBJECT_URL_PREFIX;

/// Opaque binary payload of a record. Cheap to clone.
pub type BinaryHandle = Bytes;

/// Registry of live object URLs.
#[derive(Default)]
pub struct ObjectUrlRegistry {
    entries: Mutex<HashMap<String, Bytes>>,
}

impl ObjectUrlRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, Bytes>> {
        // A poisoned map is still structurally valid; keep serving it.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Mint a fresh URL for `payload`.
    pub fn mint(self: &Arc<Self>, payload: Bytes) -> ObjectUrl {
        let url = format!("{}{}", OBJECT_URL_PREFIX, Uuid::new_v4());
        self.entries().insert(url.clone(), payload);
        tracing::trace!(url = %url, "Object URL minted");
        ObjectUrl {
            url,
            registry: Arc::clone(self),
        }
    }

    /// Look up the payload behind a URL string. Revoked or unknown URLs
    /// resolve to `None`.
    pub fn resolve(&self, url: &str) -> Option<Bytes> {
        self.entries().get(url).cloned()
    }

    /// Number of URLs currently live.
    pub fn live_count(&self) -> usize {
        self.entries().len()
    }

    fn release(&self, url: &str) {
        if self.entries().remove(url).is_some() {
            tracing::trace!(url = %url, "Object URL revoked");
        }
    }
}

impl fmt::Debug for ObjectUrlRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectUrlRegistry")
            .field("live", &self.live_count())
            .finish()
    }
}

/// An exclusively owned, revocable URL for one payload.
pub struct ObjectUrl {
    url: String,
    registry: Arc<ObjectUrlRegistry>,
}

impl ObjectUrl {
    pub fn as_str(&self) -> &str {
        &self.url
    }

    /// The payload this URL points at.
    pub fn resolve(&self) -> Option<Bytes> {
        self.registry.resolve(&self.url)
    }

    /// Revoke the URL. Consumes it so it can't be dereferenced afterwards.
    pub fn revoke(self) {
        drop(self);
    }
}

impl Drop for ObjectUrl {
    fn drop(&mut self) {
        self.registry.release(&self.url);
    }
}

impl fmt::Display for ObjectUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

impl fmt::Debug for ObjectUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ObjectUrl").field(&self.url).finish()
    }
}
