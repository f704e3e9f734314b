//! Configuration for the conversion worker.

use serde::{Deserialize, Serialize};

/// Configuration for the conversion worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Capacity of the command channel.
    #[serde(default = "default_command_buffer")]
    pub command_buffer: usize,

    /// Capacity of the event channel. The worker waits when it is full.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,

    /// Match source extensions literally (`*.jpg` but not `*.JPG`).
    #[serde(default)]
    pub case_sensitive_extensions: bool,
}

fn default_command_buffer() -> usize {
    16
}

fn default_event_buffer() -> usize {
    256
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            command_buffer: default_command_buffer(),
            event_buffer: default_event_buffer(),
            case_sensitive_extensions: false,
        }
    }
}

impl WorkerConfig {
    /// Sets the event channel capacity.
    pub fn with_event_buffer(mut self, size: usize) -> Self {
        self.event_buffer = size;
        self
    }

    /// Enables literal extension matching.
    pub fn with_case_sensitive_extensions(mut self, enabled: bool) -> Self {
        self.case_sensitive_extensions = enabled;
        self
    }
}
