use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, trace, warn};
use walkdir::WalkDir;

/// Directory names that mark a disc image folder, linked as one unit
const DISC_MARKERS: &[&str] = &["BDMV", "VIDEO_TS"];

#[derive(Error, Debug)]
pub enum ScannerError {
    #[error("Path does not exist: {0}")]
    PathNotFound(PathBuf),

    #[error("Path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    #[error("Failed to read directory: {0}")]
    IoError(#[from] std::io::Error),
}

/// A file (or disc folder) discovered under the source root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Absolute path
    pub path: PathBuf,
    pub file_name: String,
    /// File name without extension (the whole name for directories)
    pub stem: String,
    /// Lowercased extension
    pub extension: Option<String>,
    /// Name of the containing folder
    pub parent_name: String,
    /// Folder above the parent, when it is still inside the source root
    pub grandparent_name: Option<String>,
    /// Sits directly in the source root
    pub at_root: bool,
    pub is_dir: bool,
}

impl SourceFile {
    pub fn new(path: PathBuf, root: &Path, is_dir: bool) -> Option<Self> {
        let file_name = path.file_name()?.to_string_lossy().to_string();

        let (stem, extension) = if is_dir {
            (file_name.clone(), None)
        } else {
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| file_name.clone());
            let extension = path
                .extension()
                .map(|e| e.to_string_lossy().to_lowercase());
            (stem, extension)
        };

        let parent = path.parent()?;
        let parent_name = parent
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let grandparent_name = parent
            .parent()
            .filter(|gp| parent != root && gp.starts_with(root) && *gp != root)
            .and_then(|gp| gp.file_name())
            .map(|n| n.to_string_lossy().to_string());

        Some(Self {
            at_root: parent == root,
            grandparent_name,
            path,
            file_name,
            stem,
            extension,
            parent_name,
            is_dir,
        })
    }
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

fn is_disc_folder(path: &Path) -> bool {
    DISC_MARKERS.iter().any(|marker| path.join(marker).is_dir())
}

/// Recursively collect source files in a stable, name-sorted order
///
/// The root is canonicalized so every returned path is absolute. Disc image
/// folders are returned as a single directory entry and not descended into.
pub fn scan_sources(root: &Path) -> Result<Vec<SourceFile>, ScannerError> {
    debug!(path = ?root, "Scanning source directory");

    if !root.exists() {
        return Err(ScannerError::PathNotFound(root.to_path_buf()));
    }

    if !root.is_dir() {
        return Err(ScannerError::NotADirectory(root.to_path_buf()));
    }

    let root = fs::canonicalize(root)?;

    fs::read_dir(&root).map_err(|e| {
        if e.kind() == std::io::ErrorKind::PermissionDenied {
            ScannerError::PermissionDenied(root.clone())
        } else {
            ScannerError::IoError(e)
        }
    })?;

    let mut files = Vec::new();

    let mut walker = WalkDir::new(&root)
        .min_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(&e.file_name().to_string_lossy()));

    while let Some(entry) = walker.next() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };

        let path = entry.path().to_path_buf();
        trace!(entry = ?path, "Examining entry");

        if entry.file_type().is_dir() {
            if is_disc_folder(&path) {
                debug!(path = ?path, "Found disc folder");
                walker.skip_current_dir();
                if let Some(file) = SourceFile::new(path, &root, true) {
                    files.push(file);
                }
            }
            continue;
        }

        if let Some(file) = SourceFile::new(path, &root, false) {
            files.push(file);
        }
    }

    debug!(count = files.len(), "Scan complete");

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_scan_empty_directory() {
        let dir = tempdir().unwrap();
        let result = scan_sources(dir.path()).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_scan_is_recursive() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("Show Name (2020)/Season 1")).unwrap();
        fs::write(
            dir.path().join("Show Name (2020)/Season 1/Show.Name.S01E01.mkv"),
            "x",
        )
        .unwrap();
        fs::write(dir.path().join("Movie.2019.mkv"), "x").unwrap();

        let result = scan_sources(dir.path()).unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].file_name, "Movie.2019.mkv");
        assert!(result[0].at_root);
        assert_eq!(result[1].stem, "Show.Name.S01E01");
        assert_eq!(result[1].extension.as_deref(), Some("mkv"));
        assert_eq!(result[1].parent_name, "Season 1");
        assert_eq!(result[1].grandparent_name.as_deref(), Some("Show Name (2020)"));
        assert!(result[0].grandparent_name.is_none());
        assert!(!result[1].at_root);
        assert!(result[1].path.is_absolute());
    }

    #[test]
    fn test_extension_is_lowercased() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("Film.MKV"), "x").unwrap();

        let result = scan_sources(dir.path()).unwrap();
        assert_eq!(result[0].extension.as_deref(), Some("mkv"));
    }

    #[test]
    fn test_ignores_hidden_entries() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join(".hidden")).unwrap();
        fs::write(dir.path().join(".hidden/file.mkv"), "x").unwrap();
        fs::write(dir.path().join(".partial.mkv"), "x").unwrap();
        fs::write(dir.path().join("visible.mkv"), "x").unwrap();

        let result = scan_sources(dir.path()).unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].file_name, "visible.mkv");
    }

    #[test]
    fn test_disc_folder_is_single_entry() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("Movie (2010)/BDMV/STREAM")).unwrap();
        fs::write(dir.path().join("Movie (2010)/BDMV/STREAM/00001.m2ts"), "x").unwrap();

        let result = scan_sources(dir.path()).unwrap();

        assert_eq!(result.len(), 1);
        assert!(result[0].is_dir);
        assert_eq!(result[0].file_name, "Movie (2010)");
        assert!(result[0].extension.is_none());
    }

    #[test]
    fn test_path_not_found() {
        let result = scan_sources(Path::new("/nonexistent/path"));
        assert!(matches!(result, Err(ScannerError::PathNotFound(_))));
    }

    #[test]
    fn test_not_a_directory() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("file.txt");
        fs::write(&file_path, "content").unwrap();

        let result = scan_sources(&file_path);
        assert!(matches!(result, Err(ScannerError::NotADirectory(_))));
    }

    #[test]
    fn test_alphabetical_sorting() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("zebra.mkv"), "x").unwrap();
        fs::write(dir.path().join("alpha.mkv"), "x").unwrap();
        fs::write(dir.path().join("beta.mkv"), "x").unwrap();

        let result = scan_sources(dir.path()).unwrap();

        assert_eq!(result[0].file_name, "alpha.mkv");
        assert_eq!(result[1].file_name, "beta.mkv");
        assert_eq!(result[2].file_name, "zebra.mkv");
    }
}
