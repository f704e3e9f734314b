//! Front-end side of a conversion job.
//!
//! The [`JobController`] validates paths before anything is queued, decides
//! whether the user must confirm writing into a non-empty destination, and
//! tracks whether a job it started is still running.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::converter::{ConversionDirection, ConversionSettings};
use crate::worker::{WorkerError, WorkerEvent, WorkerHandle};

/// Outcome of a successful preflight check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preflight {
    /// The job can start right away.
    Ready,
    /// The destination already holds files; ask before starting.
    NeedsConfirmation { destination: PathBuf },
}

/// Reasons a job cannot start.
#[derive(Debug, Error)]
pub enum PreflightError {
    #[error("A conversion job is already running")]
    AlreadyRunning,

    #[error("Source directory is missing or unreadable: {}", path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Destination exists but is not a directory: {}", path.display())]
    DestinationNotDirectory { path: PathBuf },

    #[error(transparent)]
    Worker(#[from] WorkerError),
}

/// Drives a worker on behalf of an interactive front-end.
pub struct JobController {
    handle: WorkerHandle,
    settings: ConversionSettings,
    working: bool,
}

impl JobController {
    pub fn new(handle: WorkerHandle, settings: ConversionSettings) -> Self {
        Self {
            handle,
            settings,
            working: false,
        }
    }

    /// Checks the paths of a job about to start.
    pub fn preflight(
        &self,
        source: &Path,
        destination: &Path,
    ) -> Result<Preflight, PreflightError> {
        if self.is_working() {
            return Err(PreflightError::AlreadyRunning);
        }

        let source_entries =
            fs::read_dir(source).map_err(|e| PreflightError::SourceUnavailable {
                path: source.to_path_buf(),
                source: e,
            })?;
        drop(source_entries);

        match fs::metadata(destination) {
            Ok(meta) if !meta.is_dir() => Err(PreflightError::DestinationNotDirectory {
                path: destination.to_path_buf(),
            }),
            Ok(_) => {
                if directory_has_entries(destination) {
                    Ok(Preflight::NeedsConfirmation {
                        destination: destination.to_path_buf(),
                    })
                } else {
                    Ok(Preflight::Ready)
                }
            }
            // Created by the worker as files are written
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Preflight::Ready),
            Err(e) => {
                tracing::debug!("Cannot stat destination {:?}: {}", destination, e);
                Ok(Preflight::Ready)
            }
        }
    }

    /// Configures the worker and queues the job.
    pub fn start(
        &mut self,
        direction: ConversionDirection,
        source: &Path,
        destination: &Path,
    ) -> Result<(), PreflightError> {
        if self.is_working() {
            return Err(PreflightError::AlreadyRunning);
        }

        self.handle.set_direction(direction);
        self.handle.set_settings(self.settings);
        self.handle.set_paths(source, destination);
        self.handle.start()?;

        tracing::info!(%direction, ?source, ?destination, "Conversion job queued");
        self.working = true;
        Ok(())
    }

    /// Forwards an abort to the worker if a job is running.
    ///
    /// Returns whether the request was sent.
    pub fn request_abort(&self) -> bool {
        if !self.working {
            return false;
        }
        self.handle.abort();
        true
    }

    /// Feeds a worker event back; the done event ends the job.
    pub fn observe(&mut self, event: &WorkerEvent) {
        if matches!(event, WorkerEvent::Done(_)) {
            self.working = false;
        }
    }

    /// Settings used by the next [`start`](Self::start).
    pub fn set_settings(&mut self, settings: ConversionSettings) {
        self.settings = settings;
    }

    pub fn settings(&self) -> ConversionSettings {
        self.settings
    }

    pub fn is_working(&self) -> bool {
        self.working || self.handle.is_busy()
    }

    pub fn handle(&self) -> &WorkerHandle {
        &self.handle
    }
}

fn directory_has_entries(path: &Path) -> bool {
    fs::read_dir(path)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}
