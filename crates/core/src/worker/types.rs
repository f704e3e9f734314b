//! Types for the worker module.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::converter::ConversionDirection;

/// Lifecycle of the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    /// No job has run yet.
    Idle,
    /// Walking the source tree.
    Enumerating,
    /// Converting files one at a time.
    ProcessingFile,
    /// The last job finished (by exhaustion or abort).
    Done,
}

impl WorkerState {
    /// Whether a job is currently executing.
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Enumerating | Self::ProcessingFile)
    }
}

/// Per-file notice emitted while a job runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StatusMessage {
    /// A file is about to be processed.
    Converting {
        source: PathBuf,
        destination: PathBuf,
    },
    /// The destination already existed; nothing was written.
    Skipped { destination: PathBuf },
    /// The converter produced the destination.
    Succeeded { destination: PathBuf },
    /// The file could not be converted. The job goes on.
    Failed { source: PathBuf, reason: String },
}

impl fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Converting { destination, .. } => {
                write!(f, "Converting {}", destination.display())
            }
            Self::Skipped { .. } => f.write_str("File already exists, skipped"),
            Self::Succeeded { .. } => f.write_str("Success"),
            Self::Failed { reason, .. } => write!(f, "Failed: {}", reason),
        }
    }
}

/// Final report of a job, carried by the done event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSummary {
    /// Job identifier.
    pub job_id: String,
    /// Conversion performed.
    pub direction: ConversionDirection,
    /// Files found by enumeration.
    pub total_files: usize,
    /// Files handled before the job ended.
    pub processed: usize,
    /// Files converted successfully.
    pub converted: usize,
    /// Files skipped because the destination existed.
    pub skipped: usize,
    /// Files that failed.
    pub failed: usize,
    /// Whether the job ended because of an abort request.
    pub aborted: bool,
    /// When the job started.
    pub started_at: DateTime<Utc>,
    /// When the done event was emitted.
    pub finished_at: DateTime<Utc>,
}

/// Event emitted by the worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WorkerEvent {
    /// Per-file status notice.
    Status {
        job_id: String,
        message: StatusMessage,
    },
    /// Percentage of files handled, emitted after every file.
    Progress { job_id: String, percent: u8 },
    /// Emitted exactly once per job, always last.
    Done(JobSummary),
}

impl WorkerEvent {
    /// Job the event belongs to.
    pub fn job_id(&self) -> &str {
        match self {
            Self::Status { job_id, .. } | Self::Progress { job_id, .. } => job_id,
            Self::Done(summary) => &summary.job_id,
        }
    }
}

/// Commands carried from handles to the worker loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WorkerCommand {
    /// Snapshot the configuration and run a job.
    Start,
    /// Leave the command loop.
    Shutdown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display() {
        let msg = StatusMessage::Converting {
            source: PathBuf::from("/a/x.jpg"),
            destination: PathBuf::from("/b/x.avif"),
        };
        assert_eq!(msg.to_string(), "Converting /b/x.avif");

        let msg = StatusMessage::Skipped {
            destination: PathBuf::from("/b/x.avif"),
        };
        assert_eq!(msg.to_string(), "File already exists, skipped");

        let msg = StatusMessage::Failed {
            source: PathBuf::from("/a/x.jpg"),
            reason: "corrupt".to_string(),
        };
        assert_eq!(msg.to_string(), "Failed: corrupt");
    }

    #[test]
    fn test_event_serialization() {
        let event = WorkerEvent::Status {
            job_id: "j-1".to_string(),
            message: StatusMessage::Succeeded {
                destination: PathBuf::from("/b/x.avif"),
            },
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event\":\"status\""));
        assert!(json.contains("\"kind\":\"succeeded\""));

        let event = WorkerEvent::Progress {
            job_id: "j-1".to_string(),
            percent: 50,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event\":\"progress\""));
        assert!(json.contains("\"percent\":50"));
    }

    #[test]
    fn test_state_is_busy() {
        assert!(!WorkerState::Idle.is_busy());
        assert!(WorkerState::Enumerating.is_busy());
        assert!(WorkerState::ProcessingFile.is_busy());
        assert!(!WorkerState::Done.is_busy());
    }
}
