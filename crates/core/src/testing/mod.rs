//! Testing utilities and mock implementations.
//!
//! [`MockConverter`] stands in for ffmpeg so the worker can be exercised on
//! real directory trees without any encoder installed.
//!
//! # Example
//!
//! ```rust,ignore
//! use imgconv_core::testing::MockConverter;
//! use imgconv_core::worker::{create_worker, WorkerConfig};
//!
//! let converter = MockConverter::new();
//! let (handle, worker, events) = create_worker(converter.clone(), WorkerConfig::default());
//!
//! converter.fail_on("/photos/broken.jpg").await;
//! ```

mod mock_converter;

pub use mock_converter::{ConversionHook, MockConverter, RecordedConversion};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::io;
    use std::path::{Path, PathBuf};

    /// Writes a small placeholder file, creating parent directories.
    pub fn write_file(root: &Path, relative: &str, contents: &[u8]) -> io::Result<PathBuf> {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, contents)?;
        Ok(path)
    }

    /// Creates a tree of fake JPEG files under `root`.
    pub fn jpeg_tree(root: &Path, relatives: &[&str]) -> io::Result<Vec<PathBuf>> {
        relatives
            .iter()
            .map(|relative| write_file(root, relative, b"\xff\xd8\xff\xe0fake jpeg"))
            .collect()
    }
}
