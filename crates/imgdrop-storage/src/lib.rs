//! imgdrop Storage Library
//!
//! Durable key-value slots for session persistence. The [`KeyValueStore`]
//! trait is the injected capability; [`MemoryStore`] and [`LocalStore`] are
//! the bundled backends and [`SessionStore`] implements the persisted
//! collection layout on top of any of them.
//!
//! # Persisted layout
//!
//! One key holds a JSON array of `{"file": FileMeta, "base64": dataUrl}`
//! entries. Nothing else is written.

pub mod factory;
pub mod local;
pub mod memory;
pub mod session;
pub mod traits;

// Re-export commonly used types
pub use factory::create_store;
pub use imgdrop_core::StoreBackend;
pub use local::LocalStore;
pub use memory::MemoryStore;
pub use session::SessionStore;
pub use traits::{KeyValueStore, StorageError, StorageResult};
