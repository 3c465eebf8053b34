//! Data models for the uploader
//!
//! Files move through three shapes: a [`RawFile`] handed in by a picker or a
//! drop, a [`LoadedFile`] whose bytes have been read, and a [`FileRecord`]
//! that owns its encoded form and ephemeral access URL.

mod file;
mod persisted;
mod record;
mod specs;

pub use file::*;
pub use persisted::*;
pub use record::*;
pub use specs::*;
