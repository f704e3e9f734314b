//! Recursive discovery of the files a job will convert.

use std::fs::File;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::converter::ConversionDirection;

/// Extension filter applied to enumerated file names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFilter {
    extensions: Vec<String>,
    case_sensitive: bool,
}

impl FileFilter {
    /// Creates a filter accepting the given extensions (without the dot).
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            extensions: extensions.into_iter().map(Into::into).collect(),
            case_sensitive: false,
        }
    }

    /// Filter selecting the source files of `direction`.
    pub fn for_direction(direction: ConversionDirection) -> Self {
        Self::new(direction.source_extensions().iter().copied())
    }

    /// Match extensions literally instead of ignoring ASCII case.
    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    /// Extensions accepted by this filter.
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Whether the file name of `path` carries an accepted extension.
    pub fn matches(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        self.extensions.iter().any(|accepted| {
            if self.case_sensitive {
                accepted == ext
            } else {
                accepted.eq_ignore_ascii_case(ext)
            }
        })
    }
}

/// Lists every readable regular file under `root` accepted by `filter`.
///
/// Symbolic links are neither followed nor returned. Entries are visited in
/// file-name order within each directory, so repeated calls over an unchanged
/// tree return the same sequence. A missing or unreadable root yields an empty
/// list.
pub fn enumerate_files(root: &Path, filter: &FileFilter) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!("Skipping unreadable entry: {}", e);
                continue;
            }
        };

        if !entry.file_type().is_file() || !filter.matches(entry.path()) {
            continue;
        }

        if let Err(e) = File::open(entry.path()) {
            tracing::debug!(path = ?entry.path(), "Skipping unreadable file: {}", e);
            continue;
        }

        files.push(entry.into_path());
    }

    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"data").unwrap();
    }

    #[test]
    fn test_filter_for_direction() {
        let filter = FileFilter::for_direction(ConversionDirection::JpegToAvif);
        assert!(filter.matches(Path::new("/a/b.jpg")));
        assert!(filter.matches(Path::new("/a/b.jpeg")));
        assert!(filter.matches(Path::new("/a/b.JPG")));
        assert!(!filter.matches(Path::new("/a/b.avif")));
        assert!(!filter.matches(Path::new("/a/jpg")));

        let filter = FileFilter::for_direction(ConversionDirection::AvifToJpeg);
        assert!(filter.matches(Path::new("b.avif")));
        assert!(!filter.matches(Path::new("b.jpg")));
    }

    #[test]
    fn test_case_sensitive_filter() {
        let filter = FileFilter::for_direction(ConversionDirection::JpegToAvif).case_sensitive(true);
        assert!(filter.matches(Path::new("b.jpg")));
        assert!(!filter.matches(Path::new("b.JPG")));
    }

    #[test]
    fn test_enumerates_matching_files_recursively() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        touch(&root.join("a.jpg"));
        touch(&root.join("b.jpeg"));
        touch(&root.join("notes.txt"));
        touch(&root.join("nested/deeper/c.jpg"));
        touch(&root.join("nested/d.avif"));
        touch(&root.join("nested/e.png"));
        fs::create_dir_all(root.join("folder.jpg")).unwrap();

        let filter = FileFilter::for_direction(ConversionDirection::JpegToAvif);
        let files = enumerate_files(root, &filter);

        assert_eq!(
            files,
            vec![
                root.join("a.jpg"),
                root.join("b.jpeg"),
                root.join("nested/deeper/c.jpg"),
            ]
        );
        assert!(files.iter().all(|f| f.is_file() && f.starts_with(root)));
    }

    #[test]
    fn test_order_is_stable() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        for name in ["z.avif", "m/a.avif", "a.avif", "m/b.avif", "k/q.avif"] {
            touch(&root.join(name));
        }

        let filter = FileFilter::for_direction(ConversionDirection::AvifToJpeg);
        let first = enumerate_files(root, &filter);
        let second = enumerate_files(root, &filter);
        assert_eq!(first.len(), 5);
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_root_yields_empty() {
        let temp = tempfile::tempdir().unwrap();
        let filter = FileFilter::for_direction(ConversionDirection::JpegToAvif);
        assert!(enumerate_files(&temp.path().join("missing"), &filter).is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_are_skipped() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path().join("root");
        let outside = temp.path().join("outside");
        touch(&root.join("real.jpg"));
        touch(&outside.join("linked.jpg"));
        std::os::unix::fs::symlink(outside.join("linked.jpg"), root.join("link.jpg")).unwrap();
        std::os::unix::fs::symlink(&outside, root.join("linkdir")).unwrap();

        let filter = FileFilter::for_direction(ConversionDirection::JpegToAvif);
        let files = enumerate_files(&root, &filter);
        assert_eq!(files, vec![root.join("real.jpg")]);
    }
}
