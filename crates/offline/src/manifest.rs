use serde::{Deserialize, Serialize};

/// Versioned allow-list of resources to keep available offline.
///
/// The version names the backing store: bumping it invalidates everything
/// cached under an older tag on the next activation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfflineManifest {
    pub version: String,
    pub precache: Vec<String>,
}

impl OfflineManifest {
    pub fn new(version: impl Into<String>, precache: Vec<String>) -> Self {
        Self {
            version: version.into(),
            precache,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
