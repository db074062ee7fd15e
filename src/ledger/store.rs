use super::types::{
    IgnoreFile, LedgerEntry, LedgerFile, StoreError, Versioned, STATE_VERSION,
};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

fn read_state<T: DeserializeOwned + Versioned>(path: &Path) -> Result<T, StoreError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let state: T =
        serde_json::from_reader(reader).map_err(|e| StoreError::Corrupted(e.to_string()))?;

    // Version check
    if state.version() != STATE_VERSION {
        return Err(StoreError::VersionMismatch {
            expected: STATE_VERSION.to_string(),
            found: state.version().to_string(),
        });
    }

    Ok(state)
}

/// Load a state file, or `None` when there is nothing usable on disk
///
/// Unreadable files are moved aside to `<name>.corrupt` so the next save
/// does not silently destroy them.
fn load_state<T: DeserializeOwned + Versioned>(path: &Path) -> Option<T> {
    match read_state(path) {
        Ok(state) => Some(state),
        Err(StoreError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = ?path, "No state file found, starting fresh");
            None
        }
        Err(e) => {
            warn!("Failed to load {:?}: {}, starting fresh", path, e);

            let mut aside = path.as_os_str().to_owned();
            aside.push(".corrupt");
            if let Err(rename_err) = fs::rename(path, &aside) {
                warn!("Could not move aside {:?}: {}", path, rename_err);
            }
            None
        }
    }
}

/// Write JSON through a temp file and rename it into place
fn write_state<T: Serialize>(path: &Path, state: &T) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let temp_path = path.with_extension("json.tmp");

    {
        let file = File::create(&temp_path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, state)?;
    }

    fs::rename(&temp_path, path)?;
    Ok(())
}

/// Persisted set of links created by previous runs
pub struct Ledger {
    path: PathBuf,
    entries: BTreeSet<LedgerEntry>,
    sources: HashSet<PathBuf>,
}

impl Ledger {
    /// Load the ledger from disk or start empty
    pub fn load(path: &Path) -> Self {
        let entries: BTreeSet<LedgerEntry> = load_state::<LedgerFile>(path)
            .map(|file| file.links.into_iter().collect())
            .unwrap_or_default();

        if !entries.is_empty() {
            info!("Loaded ledger with {} links", entries.len());
        }

        let sources = entries.iter().map(|e| e.source.clone()).collect();

        Self {
            path: path.to_path_buf(),
            entries,
            sources,
        }
    }

    /// Whether any link was created from this source
    pub fn contains_source(&self, source: &Path) -> bool {
        self.sources.contains(source)
    }

    /// Record a link; returns false when it was already present
    pub fn insert(&mut self, entry: LedgerEntry) -> bool {
        debug!(source = ?entry.source, destination = ?entry.destination, "Recording link");
        self.sources.insert(entry.source.clone());
        self.entries.insert(entry)
    }

    /// Rewrite the full ledger on disk
    pub fn save(&self) -> Result<(), StoreError> {
        let file = LedgerFile {
            version: STATE_VERSION.to_string(),
            updated_at: Utc::now(),
            links: self.entries.iter().cloned().collect(),
        };

        write_state(&self.path, &file)?;
        debug!("Saved ledger with {} links to {:?}", self.entries.len(), self.path);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Persisted set of source paths that are never considered again
pub struct IgnoreSet {
    path: PathBuf,
    paths: BTreeSet<PathBuf>,
    dirty: bool,
}

impl IgnoreSet {
    /// Load the ignore set from disk or start empty
    pub fn load(path: &Path) -> Self {
        let paths: BTreeSet<PathBuf> = load_state::<IgnoreFile>(path)
            .map(|file| file.paths.into_iter().collect())
            .unwrap_or_default();

        if !paths.is_empty() {
            info!("Loaded ignore set with {} paths", paths.len());
        }

        Self {
            path: path.to_path_buf(),
            paths,
            dirty: false,
        }
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }

    /// Add a path; returns false when it was already ignored
    pub fn insert(&mut self, path: &Path) -> bool {
        let added = self.paths.insert(path.to_path_buf());
        if added {
            debug!(path = ?path, "Ignoring source");
            self.dirty = true;
        }
        added
    }

    /// Save to disk if modified
    pub fn save(&mut self) -> Result<(), StoreError> {
        if !self.dirty {
            debug!("Ignore set not modified, skipping save");
            return Ok(());
        }

        let file = IgnoreFile {
            version: STATE_VERSION.to_string(),
            updated_at: Utc::now(),
            paths: self.paths.iter().cloned().collect(),
        };

        write_state(&self.path, &file)?;

        self.dirty = false;
        debug!("Saved ignore set with {} paths to {:?}", self.paths.len(), self.path);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}
