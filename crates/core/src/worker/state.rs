//! Worker control block and per-job state.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::converter::{ConversionDirection, ConversionSettings};

use super::types::{JobSummary, WorkerState};

/// Fields shared between handles and the worker.
///
/// Every read and write goes through the one mutex wrapping this struct, and
/// the lock is never held across an await point.
#[derive(Debug)]
pub(crate) struct WorkerControl {
    pub source_root: Option<PathBuf>,
    pub destination_root: Option<PathBuf>,
    pub direction: ConversionDirection,
    pub settings: ConversionSettings,
    pub abort_requested: bool,
    pub start_pending: bool,
    pub state: WorkerState,
}

impl Default for WorkerControl {
    fn default() -> Self {
        Self {
            source_root: None,
            destination_root: None,
            direction: ConversionDirection::default(),
            settings: ConversionSettings::default(),
            abort_requested: false,
            start_pending: false,
            state: WorkerState::Idle,
        }
    }
}

/// Locks the control block, recovering the data if a holder panicked.
pub(crate) fn lock(control: &Mutex<WorkerControl>) -> MutexGuard<'_, WorkerControl> {
    control.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mutable state of one job, owned by the worker task.
#[derive(Debug)]
pub(crate) struct JobState {
    pub job_id: String,
    pub source_root: PathBuf,
    pub destination_root: PathBuf,
    pub direction: ConversionDirection,
    pub settings: ConversionSettings,
    /// Frozen once enumeration finishes.
    pub files: Vec<PathBuf>,
    /// Index of the next file; never exceeds `files.len()`.
    pub cursor: usize,
    pub converted: usize,
    pub skipped: usize,
    pub failed: usize,
    pub aborted: bool,
    pub started_at: DateTime<Utc>,
}

impl JobState {
    pub fn new(
        source_root: PathBuf,
        destination_root: PathBuf,
        direction: ConversionDirection,
        settings: ConversionSettings,
    ) -> Self {
        Self {
            job_id: uuid::Uuid::new_v4().to_string(),
            source_root,
            destination_root,
            direction,
            settings,
            files: Vec::new(),
            cursor: 0,
            converted: 0,
            skipped: 0,
            failed: 0,
            aborted: false,
            started_at: Utc::now(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.cursor >= self.files.len()
    }

    pub fn current_file(&self) -> Option<&Path> {
        self.files.get(self.cursor).map(PathBuf::as_path)
    }

    /// Moves past the current file and returns the new progress percentage.
    pub fn advance(&mut self) -> u8 {
        if self.cursor < self.files.len() {
            self.cursor += 1;
        }
        self.progress_percent()
    }

    pub fn progress_percent(&self) -> u8 {
        match self.files.len() {
            0 => 0,
            total => (self.cursor * 100 / total) as u8,
        }
    }

    pub fn summary(&self) -> JobSummary {
        JobSummary {
            job_id: self.job_id.clone(),
            direction: self.direction,
            total_files: self.files.len(),
            processed: self.cursor,
            converted: self.converted,
            skipped: self.skipped,
            failed: self.failed,
            aborted: self.aborted,
            started_at: self.started_at,
            finished_at: Utc::now(),
        }
    }
}
