use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::store::ROOT_LABEL;

// ============================================================================
// DRIVE CONFIG - JSON settings file, every field optional
// ============================================================================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveCompression {
    Stored,
    #[default]
    Deflated,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveConfig {
    /// Label of the root crumb in breadcrumbs and locations.
    pub root_label: String,
    /// Prefix of archive names when more than one entry is exported.
    pub archive_prefix: String,
    pub compression: ArchiveCompression,
    /// Upload items larger than this are skipped.
    pub max_upload_bytes: Option<u64>,
    /// Default for listings: show names starting with a dot.
    pub show_hidden: bool,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            root_label: ROOT_LABEL.to_string(),
            archive_prefix: "drive-export".to_string(),
            compression: ArchiveCompression::default(),
            max_upload_bytes: None,
            show_hidden: false,
        }
    }
}

impl DriveConfig {
    /// Load a config file. Fields missing from the file keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config = serde_json::from_str(&contents)?;
        tracing::debug!("[DRIVE] Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }
}
