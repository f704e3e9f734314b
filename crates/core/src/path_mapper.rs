//! Source to destination path mapping.
//!
//! A source file found under the source root is mirrored under the destination
//! root at the same relative location, with its extension swapped for the
//! target format's.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors produced while mapping a source path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathMappingError {
    /// The source file does not lie under the source root.
    #[error("{} is not inside {}", file.display(), root.display())]
    NotUnderRoot { file: PathBuf, root: PathBuf },

    /// The source path has nothing left once the root is removed.
    #[error("{} has no file name relative to the source root", path.display())]
    NoFileName { path: PathBuf },
}

/// Destination of one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedPath {
    /// Output file path.
    pub file: PathBuf,
    /// Directory that must exist before the output is written.
    pub parent: PathBuf,
}

/// Maps `source_file` under `source_root` to its counterpart under `destination_root`.
pub fn map_destination(
    source_root: &Path,
    destination_root: &Path,
    source_file: &Path,
    target_extension: &str,
) -> Result<MappedPath, PathMappingError> {
    let relative =
        source_file
            .strip_prefix(source_root)
            .map_err(|_| PathMappingError::NotUnderRoot {
                file: source_file.to_path_buf(),
                root: source_root.to_path_buf(),
            })?;

    if relative.file_name().is_none() {
        return Err(PathMappingError::NoFileName {
            path: source_file.to_path_buf(),
        });
    }

    let file = replace_extension(&destination_root.join(relative), target_extension);
    let parent = file
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| destination_root.to_path_buf());

    Ok(MappedPath { file, parent })
}

/// Replaces everything after the last `.` of the file name with `extension`.
///
/// A name without any `.` (or whose only `.` is the leading one of a dot-file)
/// gets `.extension` appended instead.
pub fn replace_extension(path: &Path, extension: &str) -> PathBuf {
    path.with_extension(extension)
}

/// Resolves `path` against the current directory if it is relative.
///
/// Enumeration and mapping must both see the same absolute root, otherwise
/// `strip_prefix` fails on every file.
pub fn absolute_root(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_nested_file() {
        let mapped = map_destination(
            Path::new("/a"),
            Path::new("/b"),
            Path::new("/a/x/y.jpg"),
            "avif",
        )
        .unwrap();
        assert_eq!(mapped.file, PathBuf::from("/b/x/y.avif"));
        assert_eq!(mapped.parent, PathBuf::from("/b/x"));
    }

    #[test]
    fn test_map_file_at_root() {
        let mapped = map_destination(
            Path::new("/photos"),
            Path::new("/out"),
            Path::new("/photos/cat.avif"),
            "jpg",
        )
        .unwrap();
        assert_eq!(mapped.file, PathBuf::from("/out/cat.jpg"));
        assert_eq!(mapped.parent, PathBuf::from("/out"));
    }

    #[test]
    fn test_name_without_extension_gets_one_appended() {
        let mapped = map_destination(
            Path::new("/a"),
            Path::new("/b"),
            Path::new("/a/x/README"),
            "avif",
        )
        .unwrap();
        assert_eq!(mapped.file, PathBuf::from("/b/x/README.avif"));
    }

    #[test]
    fn test_only_last_extension_is_replaced() {
        let mapped = map_destination(
            Path::new("/a"),
            Path::new("/b"),
            Path::new("/a/holiday.2024.01.jpeg"),
            "avif",
        )
        .unwrap();
        assert_eq!(mapped.file, PathBuf::from("/b/holiday.2024.01.avif"));
    }

    #[test]
    fn test_dotted_directory_does_not_count() {
        let mapped = map_destination(
            Path::new("/a"),
            Path::new("/b"),
            Path::new("/a/v1.2/scan"),
            "jpg",
        )
        .unwrap();
        assert_eq!(mapped.file, PathBuf::from("/b/v1.2/scan.jpg"));
        assert_eq!(mapped.parent, PathBuf::from("/b/v1.2"));
    }

    #[test]
    fn test_replace_extension_edge_cases() {
        assert_eq!(
            replace_extension(Path::new("/b/name."), "avif"),
            PathBuf::from("/b/name.avif")
        );
        assert_eq!(
            replace_extension(Path::new("/b/.hidden"), "avif"),
            PathBuf::from("/b/.hidden.avif")
        );
        assert_eq!(
            replace_extension(Path::new("/b/photo.JPG"), "avif"),
            PathBuf::from("/b/photo.avif")
        );
    }

    #[test]
    fn test_file_outside_root_is_rejected() {
        let err = map_destination(
            Path::new("/a"),
            Path::new("/b"),
            Path::new("/elsewhere/y.jpg"),
            "avif",
        )
        .unwrap_err();
        assert!(matches!(err, PathMappingError::NotUnderRoot { .. }));
    }

    #[test]
    fn test_root_prefix_is_component_wise() {
        let err = map_destination(
            Path::new("/a"),
            Path::new("/b"),
            Path::new("/ab/y.jpg"),
            "avif",
        )
        .unwrap_err();
        assert!(matches!(err, PathMappingError::NotUnderRoot { .. }));
    }

    #[test]
    fn test_root_itself_is_rejected() {
        let err = map_destination(Path::new("/a"), Path::new("/b"), Path::new("/a"), "avif")
            .unwrap_err();
        assert!(matches!(err, PathMappingError::NoFileName { .. }));
    }

    #[test]
    fn test_absolute_root() {
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(absolute_root(Path::new("photos")), cwd.join("photos"));
        assert_eq!(absolute_root(Path::new("/srv/photos")), PathBuf::from("/srv/photos"));
    }
}
