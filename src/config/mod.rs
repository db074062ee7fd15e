//! Persistent settings, environment overrides and derived client configs.

use crate::api::ApiConfig;
use crate::notify::PlexConfig;
use crate::resolver::Thresholds;
use crate::sync::DEFAULT_MOVIE_BATCH_SIZE;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

pub const ENV_TMDB_API_KEY: &str = "TMDB_API_KEY";
pub const ENV_CINEMETA_URL: &str = "CINEMETA_URL";
pub const ENV_TMDB_URL: &str = "TMDB_URL";
pub const ENV_PLEX_URL: &str = "PLEX_URL";
pub const ENV_PLEX_TOKEN: &str = "PLEX_TOKEN";

pub const DEFAULT_LOOP_INTERVAL_SECS: u64 = 120;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read settings file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid settings file {path:?}: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Cannot write settings file {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No configuration directory available on this system")]
    NoConfigDir,
}

/// User settings, stored as JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub source_dir: Option<PathBuf>,
    pub destination_dir: Option<PathBuf>,
    pub tmdb_api_key: Option<String>,
    pub cinemeta_url: String,
    pub tmdb_url: String,
    pub plex_url: Option<String>,
    pub plex_token: Option<String>,
    /// Route anime series into their own section
    pub split_dirs: bool,
    /// Treat files that match no episode rule as movies
    pub movies_enabled: bool,
    pub movie_batch_size: usize,
    pub loop_interval_secs: u64,
    pub thresholds: Thresholds,
}

impl Default for Settings {
    fn default() -> Self {
        let api = ApiConfig::default();
        Self {
            source_dir: None,
            destination_dir: None,
            tmdb_api_key: None,
            cinemeta_url: api.cinemeta_url,
            tmdb_url: api.tmdb_url,
            plex_url: None,
            plex_token: None,
            split_dirs: false,
            movies_enabled: false,
            movie_batch_size: DEFAULT_MOVIE_BATCH_SIZE,
            loop_interval_secs: DEFAULT_LOOP_INTERVAL_SECS,
            thresholds: Thresholds::default(),
        }
    }
}

impl Settings {
    /// `settings.json` in the user's config directory
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("medialink").join("settings.json"))
    }

    /// Load settings; a missing file yields defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = ?path, "No settings file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        serde_json::from_reader(BufReader::new(file)).map_err(|source| ConfigError::Invalid {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        let file = File::create(path).map_err(write_err)?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)
            .map_err(|e| write_err(std::io::Error::other(e)))?;

        debug!(path = ?path, "Saved settings");
        Ok(())
    }

    /// Apply environment variable overrides
    pub fn apply_env(&mut self) {
        if let Some(key) = env_value(ENV_TMDB_API_KEY) {
            self.tmdb_api_key = Some(key);
        }
        if let Some(url) = env_value(ENV_CINEMETA_URL) {
            self.cinemeta_url = url;
        }
        if let Some(url) = env_value(ENV_TMDB_URL) {
            self.tmdb_url = url;
        }
        if let Some(url) = env_value(ENV_PLEX_URL) {
            self.plex_url = Some(url);
        }
        if let Some(token) = env_value(ENV_PLEX_TOKEN) {
            self.plex_token = Some(token);
        }
    }

    pub fn api_config(&self) -> ApiConfig {
        ApiConfig {
            cinemeta_url: self.cinemeta_url.clone(),
            tmdb_url: self.tmdb_url.clone(),
            tmdb_api_key: self.tmdb_api_key.clone(),
            ..ApiConfig::default()
        }
    }

    /// Plex settings, when both url and token are set
    pub fn plex_config(&self) -> Option<PlexConfig> {
        match (&self.plex_url, &self.plex_token) {
            (Some(url), Some(token)) if !url.is_empty() && !token.is_empty() => Some(PlexConfig {
                url: url.clone(),
                token: token.clone(),
            }),
            _ => None,
        }
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
