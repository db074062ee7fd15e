mod plex;

pub use plex::{parse_sections, refresh_sections, LibrarySection, PlexConfig, PlexNotifier};

use std::path::Path;
use thiserror::Error;

/// Tells a media server that the library changed
pub trait Notifier {
    /// Refresh whatever covers `dest_root`; returns the number of refresh requests that succeeded
    fn refresh(&self, dest_root: &Path) -> Result<usize, NotifyError>;
}

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Media server returned HTTP {0}")]
    Status(u16),

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Cannot read destination: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<reqwest::Error> for NotifyError {
    fn from(err: reqwest::Error) -> Self {
        NotifyError::NetworkError(err.to_string())
    }
}
