use crate::naming::name_candidates;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, trace};
use walkdir::WalkDir;

/// ENAMETOOLONG
#[cfg(any(target_os = "linux", target_os = "android"))]
const NAME_TOO_LONG: Option<i32> = Some(36);
#[cfg(any(
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd",
    target_os = "dragonfly"
))]
const NAME_TOO_LONG: Option<i32> = Some(63);
/// ERROR_FILENAME_EXCED_RANGE
#[cfg(windows)]
const NAME_TOO_LONG: Option<i32> = Some(206);
#[cfg(not(any(
    target_os = "linux",
    target_os = "android",
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd",
    target_os = "dragonfly",
    windows
)))]
const NAME_TOO_LONG: Option<i32> = None;

#[derive(Error, Debug)]
pub enum LinkError {
    #[error("Filesystem error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to walk {0}")]
    Walk(#[from] walkdir::Error),
}

impl LinkError {
    fn io(path: &Path, source: io::Error) -> Self {
        LinkError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// The filesystem rejected the name as too long
    pub fn is_name_too_long(&self) -> bool {
        match self {
            LinkError::Io { source, .. } => {
                NAME_TOO_LONG.is_some() && source.raw_os_error() == NAME_TOO_LONG
            }
            LinkError::Walk(_) => false,
        }
    }
}

/// What the destination directory holds for a wanted name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// Free path to create the link at
    Vacant(PathBuf),
    /// A link to this exact source already exists here
    Synced(PathBuf),
    /// A regular file or directory sits at the wanted name
    Occupied(PathBuf),
}

/// Decide where `source` goes in `dir` under `name`
///
/// Symlinks to other sources push the name on to `name (1).ext` and so on.
/// Anything that is not a symlink at the first name blocks the placement.
pub fn place(dir: &Path, name: &str, source: &Path) -> Placement {
    for (i, candidate) in name_candidates(name).enumerate() {
        let path = dir.join(&candidate);

        let meta = match fs::symlink_metadata(&path) {
            Ok(meta) => meta,
            Err(_) => return Placement::Vacant(path),
        };

        if !meta.file_type().is_symlink() {
            if i == 0 {
                return Placement::Occupied(path);
            }
            continue;
        }

        match fs::read_link(&path) {
            Ok(target) if target == source => return Placement::Synced(path),
            _ => trace!(path = ?path, "Name taken by another link"),
        }
    }

    // name_candidates never ends
    Placement::Occupied(dir.join(name))
}

/// Link `source` at `destination`; directories are copied instead
pub fn create_link(source: &Path, destination: &Path, is_dir: bool) -> Result<(), LinkError> {
    if is_dir {
        debug!(from = ?source, to = ?destination, "Copying directory");
        return copy_dir(source, destination);
    }

    debug!(from = ?source, to = ?destination, "Creating symlink");
    symlink_file(source, destination).map_err(|e| LinkError::io(destination, e))
}

/// Recursive copy that recreates internal symlinks instead of following them
fn copy_dir(source: &Path, destination: &Path) -> Result<(), LinkError> {
    for entry in WalkDir::new(source).follow_links(false) {
        let entry = entry?;
        let relative = entry.path().strip_prefix(source).unwrap_or(entry.path());
        let target = destination.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&target).map_err(|e| LinkError::io(&target, e))?;
        } else if file_type.is_symlink() {
            let link_target =
                fs::read_link(entry.path()).map_err(|e| LinkError::io(entry.path(), e))?;
            symlink_file(&link_target, &target).map_err(|e| LinkError::io(&target, e))?;
        } else {
            fs::copy(entry.path(), &target).map_err(|e| LinkError::io(&target, e))?;
        }
    }

    Ok(())
}

#[cfg(unix)]
fn symlink_file(original: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(original, link)
}

#[cfg(windows)]
fn symlink_file(original: &Path, link: &Path) -> io::Result<()> {
    if original.is_dir() {
        std::os::windows::fs::symlink_dir(original, link)
    } else {
        std::os::windows::fs::symlink_file(original, link)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_place_vacant() {
        let dir = tempdir().unwrap();
        assert_eq!(
            place(dir.path(), "a.mkv", Path::new("/src/a.mkv")),
            Placement::Vacant(dir.path().join("a.mkv"))
        );
    }

    #[test]
    fn test_place_synced() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("source.mkv");
        fs::write(&source, "x").unwrap();
        symlink_file(&source, &dir.path().join("a.mkv")).unwrap();

        assert_eq!(
            place(dir.path(), "a.mkv", &source),
            Placement::Synced(dir.path().join("a.mkv"))
        );
    }

    #[test]
    fn test_place_other_link_moves_on() {
        let dir = tempdir().unwrap();
        symlink_file(Path::new("/src/other.mkv"), &dir.path().join("a.mkv")).unwrap();

        assert_eq!(
            place(dir.path(), "a.mkv", Path::new("/src/a.mkv")),
            Placement::Vacant(dir.path().join("a (1).mkv"))
        );
    }

    #[test]
    fn test_place_finds_numbered_link() {
        let dir = tempdir().unwrap();
        symlink_file(Path::new("/src/other.mkv"), &dir.path().join("a.mkv")).unwrap();
        symlink_file(Path::new("/src/a.mkv"), &dir.path().join("a (1).mkv")).unwrap();

        assert_eq!(
            place(dir.path(), "a.mkv", Path::new("/src/a.mkv")),
            Placement::Synced(dir.path().join("a (1).mkv"))
        );
    }

    #[test]
    fn test_place_regular_file_blocks() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.mkv"), "x").unwrap();

        assert_eq!(
            place(dir.path(), "a.mkv", Path::new("/src/a.mkv")),
            Placement::Occupied(dir.path().join("a.mkv"))
        );
    }

    #[test]
    fn test_create_symlink() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("source.mkv");
        fs::write(&source, "x").unwrap();
        let dest = dir.path().join("link.mkv");

        create_link(&source, &dest, false).unwrap();

        assert_eq!(fs::read_link(&dest).unwrap(), source);
    }

    #[test]
    fn test_copy_dir_preserves_symlinks() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("Disc");
        fs::create_dir_all(source.join("BDMV")).unwrap();
        fs::write(source.join("BDMV").join("index.bdmv"), "data").unwrap();
        symlink_file(Path::new("BDMV/index.bdmv"), &source.join("alias")).unwrap();

        let dest = dir.path().join("out").join("Disc");
        create_link(&source, &dest, true).unwrap();

        assert_eq!(
            fs::read_to_string(dest.join("BDMV").join("index.bdmv")).unwrap(),
            "data"
        );
        assert_eq!(
            fs::read_link(dest.join("alias")).unwrap(),
            PathBuf::from("BDMV/index.bdmv")
        );
    }

    #[test]
    fn test_name_too_long_detection() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("x".repeat(300));

        let err = create_link(Path::new("/src/a.mkv"), &dest, false).unwrap_err();
        assert!(err.is_name_too_long());
    }
}
