use serde::{Deserialize, Serialize};

use super::FileMeta;

/// One entry of the persisted session array: `{"file": FileMeta, "base64": dataUrl}`.
///
/// The layout carries no version field, so readers must accept exactly this
/// shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedRecord {
    pub file: FileMeta,
    pub base64: String,
}
