use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::converter::{ConversionDirection, ConversionSettings};

use super::state::{lock, WorkerControl};
use super::types::{WorkerCommand, WorkerState};

/// Errors returned by [`WorkerHandle`] commands.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkerError {
    /// `start` was issued before `set_paths`.
    #[error("Source and destination paths have not been set")]
    MissingPaths,

    /// A job is already queued or running.
    #[error("A conversion job is already running")]
    Busy,

    /// The worker loop has exited.
    #[error("Conversion worker has shut down")]
    Shutdown,
}

/// Handle for commanding a conversion worker.
///
/// Cheap to clone and usable from any thread; no method blocks on the worker.
/// Configuration setters only affect the next job: the worker snapshots paths,
/// direction and settings when a job starts.
#[derive(Clone)]
pub struct WorkerHandle {
    control: Arc<Mutex<WorkerControl>>,
    commands: mpsc::Sender<WorkerCommand>,
}

impl WorkerHandle {
    pub(crate) fn new(
        control: Arc<Mutex<WorkerControl>>,
        commands: mpsc::Sender<WorkerCommand>,
    ) -> Self {
        Self { control, commands }
    }

    /// Sets the source and destination roots.
    pub fn set_paths(&self, source: impl Into<PathBuf>, destination: impl Into<PathBuf>) {
        let mut control = lock(&self.control);
        control.source_root = Some(source.into());
        control.destination_root = Some(destination.into());
    }

    /// Sets the encoder parameters.
    pub fn set_settings(&self, settings: ConversionSettings) {
        lock(&self.control).settings = settings;
    }

    /// Sets the conversion direction.
    pub fn set_direction(&self, direction: ConversionDirection) {
        lock(&self.control).direction = direction;
    }

    /// Queues a new job.
    ///
    /// Clears any earlier abort request, so an `abort` issued after this call
    /// always applies to the new job.
    pub fn start(&self) -> Result<(), WorkerError> {
        let mut control = lock(&self.control);
        if control.source_root.is_none() || control.destination_root.is_none() {
            return Err(WorkerError::MissingPaths);
        }
        if control.start_pending || control.state.is_busy() {
            return Err(WorkerError::Busy);
        }

        match self.commands.try_send(WorkerCommand::Start) {
            Ok(()) => {
                control.abort_requested = false;
                control.start_pending = true;
                Ok(())
            }
            Err(TrySendError::Full(_)) => Err(WorkerError::Busy),
            Err(TrySendError::Closed(_)) => Err(WorkerError::Shutdown),
        }
    }

    /// Requests the running job to stop.
    ///
    /// Observed before the next file starts; a file already being converted
    /// runs to completion.
    pub fn abort(&self) {
        tracing::info!("User issued abort");
        lock(&self.control).abort_requested = true;
    }

    /// Current worker state.
    pub fn state(&self) -> WorkerState {
        lock(&self.control).state
    }

    /// Whether a job is queued or running.
    pub fn is_busy(&self) -> bool {
        let control = lock(&self.control);
        control.start_pending || control.state.is_busy()
    }

    /// Asks the worker loop to exit.
    ///
    /// The command is served after the running job, if any, completes; call
    /// [`abort`](Self::abort) first to stop early.
    pub fn shutdown(&self) -> Result<(), WorkerError> {
        match self.commands.try_send(WorkerCommand::Shutdown) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(WorkerError::Busy),
            Err(TrySendError::Closed(_)) => Err(WorkerError::Shutdown),
        }
    }

    /// Whether the worker loop has exited.
    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }
}
