mod codes;

pub use codes::ExitCode;

use crate::api::ApiError;
use crate::config::ConfigError;
use crate::ledger::StoreError;
use crate::scanner::ScannerError;
use crate::sync::SyncError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Source directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Path is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Cannot create destination: {path}")]
    DestinationError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No {which} directory given")]
    MissingDirectory { which: &'static str },

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("State file error: {0}")]
    State(#[from] StoreError),

    #[error("Catalog error: {0}")]
    Api(#[from] ApiError),

    #[error("{0}")]
    Other(String),
}

impl AppError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            AppError::DirectoryNotFound { .. } => ExitCode::SourceNotFound,
            AppError::NotADirectory { .. } => ExitCode::SourceNotFound,
            AppError::PermissionDenied { .. } => ExitCode::PermissionError,
            AppError::DestinationError { .. } => ExitCode::DestinationError,
            AppError::MissingDirectory { .. } => ExitCode::InvalidArguments,
            AppError::InvalidArguments(_) => ExitCode::InvalidArguments,
            AppError::Config(_) => ExitCode::ConfigError,
            AppError::State(_) => ExitCode::StateError,
            AppError::Api(_) => ExitCode::GeneralError,
            AppError::Other(_) => ExitCode::GeneralError,
        }
    }

    pub fn detailed_message(&self) -> String {
        match self {
            AppError::DirectoryNotFound { path } => {
                format!(
                    "The source directory does not exist:\n  {}\n\n\
                     Please verify the path and try again.",
                    path.display()
                )
            }

            AppError::NotADirectory { path } => {
                format!(
                    "The specified path is not a directory:\n  {}\n\n\
                     Please provide a valid directory path.",
                    path.display()
                )
            }

            AppError::PermissionDenied { path } => {
                format!(
                    "Permission denied when accessing:\n  {}\n\n\
                     Please check file permissions or run with appropriate privileges.",
                    path.display()
                )
            }

            AppError::DestinationError { path, source } => {
                format!(
                    "Cannot create the destination directory:\n  {}\n  {}\n\n\
                     Check that the parent exists and is writable.",
                    path.display(),
                    source
                )
            }

            AppError::MissingDirectory { which } => {
                format!(
                    "No {} directory given.\n\n\
                     Pass it on the command line or store it with --save-settings.",
                    which
                )
            }

            AppError::InvalidArguments(message) => message.clone(),

            AppError::Config(err) => {
                format!(
                    "{}\n\n\
                     Fix or remove the settings file, or point --config elsewhere.",
                    err
                )
            }

            AppError::State(err) => {
                format!(
                    "Cannot persist the link ledger:\n  {}\n\n\
                     Check that the state directory is writable.",
                    err
                )
            }

            AppError::Api(err) => {
                format!(
                    "Catalog client error:\n  {}\n\n\
                     Check your network connection and catalog settings.",
                    err
                )
            }

            AppError::Other(message) => message.clone(),
        }
    }
}

impl From<ScannerError> for AppError {
    fn from(err: ScannerError) -> Self {
        match err {
            ScannerError::PathNotFound(path) => AppError::DirectoryNotFound { path },
            ScannerError::NotADirectory(path) => AppError::NotADirectory { path },
            ScannerError::PermissionDenied(path) => AppError::PermissionDenied { path },
            ScannerError::IoError(e) => AppError::Other(format!("I/O error: {}", e)),
        }
    }
}

impl From<SyncError> for AppError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::Scanner(e) => e.into(),
            SyncError::Destination { path, source } => {
                if source.kind() == std::io::ErrorKind::PermissionDenied {
                    AppError::PermissionDenied { path }
                } else {
                    AppError::DestinationError { path, source }
                }
            }
            SyncError::State(e) => AppError::State(e),
        }
    }
}
