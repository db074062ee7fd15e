use super::link::LinkError;
use crate::classifier::{ClassifierConfig, IgnoreReason};
use crate::ledger::StoreError;
use crate::resolver::{ResolveError, ResolverConfig};
use crate::scanner::ScannerError;
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_MOVIE_BATCH_SIZE: usize = 5;

/// Options for one sync run
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub source: PathBuf,
    pub destination: PathBuf,
    /// Movie searches issued concurrently per batch
    pub movie_batch_size: usize,
    pub classifier: ClassifierConfig,
    pub resolver: ResolverConfig,
}

impl SyncOptions {
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            movie_batch_size: DEFAULT_MOVIE_BATCH_SIZE,
            classifier: ClassifierConfig::default(),
            resolver: ResolverConfig::default(),
        }
    }
}

/// Why a single file was skipped
#[derive(Error, Debug)]
pub enum FileError {
    #[error("No naming rule matched")]
    ClassificationMiss,

    #[error("Could not resolve title: {0}")]
    ResolutionFailure(#[from] ResolveError),

    #[error("Destination exists and is not a link: {0:?}")]
    DestinationConflict(PathBuf),

    #[error(transparent)]
    Filesystem(#[from] LinkError),
}

/// Terminal state of one source file
#[derive(Debug)]
pub enum FileOutcome {
    Linked(PathBuf),
    AlreadySynced(PathBuf),
    Ignored(IgnoreReason),
    AlreadyHandled,
    Skipped(FileError),
}

/// Summary of a sync run
#[derive(Debug, Default)]
pub struct SyncReport {
    /// Destinations created during this run
    pub created: Vec<PathBuf>,
    pub already_synced: usize,
    pub ignored: usize,
    pub already_handled: usize,
    /// Unrecognized files and destination conflicts
    pub skipped: usize,
    /// Resolution and filesystem failures, retried next run
    pub failed: usize,
}

impl SyncReport {
    pub fn record(&mut self, outcome: &FileOutcome) {
        match outcome {
            FileOutcome::Linked(dest) => self.created.push(dest.clone()),
            FileOutcome::AlreadySynced(_) => self.already_synced += 1,
            FileOutcome::Ignored(_) => self.ignored += 1,
            FileOutcome::AlreadyHandled => self.already_handled += 1,
            FileOutcome::Skipped(FileError::ClassificationMiss)
            | FileOutcome::Skipped(FileError::DestinationConflict(_)) => self.skipped += 1,
            FileOutcome::Skipped(_) => self.failed += 1,
        }
    }

    pub fn linked(&self) -> usize {
        self.created.len()
    }
}

/// Errors that abort a whole run
#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Scanner(#[from] ScannerError),

    #[error("Cannot create destination directory {path:?}: {source}")]
    Destination {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot persist state: {0}")]
    State(#[from] StoreError),
}
