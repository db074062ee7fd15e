use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const STATE_VERSION: &str = "1.0";

const LINKS_FILE: &str = "links.json";
const IGNORED_FILE: &str = "ignored.json";

/// A link this engine created
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub source: PathBuf,
    pub destination: PathBuf,
}

impl LedgerEntry {
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }
}

/// Files carrying a schema version
pub(crate) trait Versioned {
    fn version(&self) -> &str;
}

/// On-disk ledger layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerFile {
    pub version: String,
    pub updated_at: DateTime<Utc>,
    pub links: Vec<LedgerEntry>,
}

impl Versioned for LedgerFile {
    fn version(&self) -> &str {
        &self.version
    }
}

/// On-disk ignore set layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IgnoreFile {
    pub version: String,
    pub updated_at: DateTime<Utc>,
    pub paths: Vec<PathBuf>,
}

impl Versioned for IgnoreFile {
    fn version(&self) -> &str {
        &self.version
    }
}

/// Where persisted state lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateConfig {
    pub links_path: PathBuf,
    pub ignored_path: PathBuf,
}

impl StateConfig {
    /// State files inside an explicit directory
    pub fn for_state_dir(dir: &Path) -> Self {
        Self {
            links_path: dir.join(LINKS_FILE),
            ignored_path: dir.join(IGNORED_FILE),
        }
    }

    /// State files in the user's data directory
    pub fn for_user_data() -> Option<Self> {
        dirs::data_dir().map(|data_dir| Self::for_state_dir(&data_dir.join("medialink")))
    }
}

/// Errors that can occur while reading or writing state files
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("State file corrupted: {0}")]
    Corrupted(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    SerializeError(#[from] serde_json::Error),

    #[error("State file version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: String, found: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_config_for_state_dir() {
        let config = StateConfig::for_state_dir(Path::new("/tmp/state"));

        assert_eq!(config.links_path, PathBuf::from("/tmp/state/links.json"));
        assert_eq!(config.ignored_path, PathBuf::from("/tmp/state/ignored.json"));
    }

    #[test]
    fn test_state_config_for_user_data() {
        // Should return Some on most systems
        if let Some(config) = StateConfig::for_user_data() {
            assert!(config.links_path.to_string_lossy().contains("medialink"));
        }
    }

    #[test]
    fn test_ledger_file_json_shape() {
        let file = LedgerFile {
            version: STATE_VERSION.to_string(),
            updated_at: Utc::now(),
            links: vec![LedgerEntry::new("/src/a.mkv", "/dest/a.mkv")],
        };

        let json = serde_json::to_value(&file).unwrap();
        assert_eq!(json["version"], "1.0");
        assert_eq!(json["links"][0]["source"], "/src/a.mkv");
        assert_eq!(json["links"][0]["destination"], "/dest/a.mkv");
        assert!(json["updated_at"].is_string());
    }

    #[test]
    fn test_store_error_display() {
        let err = StoreError::VersionMismatch {
            expected: "1.0".to_string(),
            found: "2.0".to_string(),
        };
        assert!(err.to_string().contains("1.0"));
        assert!(err.to_string().contains("2.0"));
    }
}
