//! Mock converter for testing.

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::converter::{ConversionJob, ConversionResult, Converter, ConverterError};

/// Bytes written to every output the mock produces.
const MOCK_OUTPUT: &[u8] = b"converted";

/// Callback run after each conversion with its zero-based call index.
pub type ConversionHook = Arc<dyn Fn(usize, &ConversionJob) + Send + Sync>;

/// A recorded conversion job for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedConversion {
    /// The job that was submitted.
    pub job: ConversionJob,
    /// Whether the conversion succeeded.
    pub success: bool,
}

/// Mock implementation of the Converter trait.
///
/// Provides controllable behavior for testing:
/// - Track conversion jobs for assertions
/// - Fail specific inputs, or the next call
/// - Write a small placeholder output so collisions behave like real runs
/// - Run a hook after each conversion (e.g. to abort the worker mid-job)
///
/// Clones share state, so one clone can be handed to the worker while the
/// test keeps another for assertions.
#[derive(Clone)]
pub struct MockConverter {
    /// Recorded conversions.
    conversions: Arc<RwLock<Vec<RecordedConversion>>>,
    /// Inputs that always fail.
    failing_inputs: Arc<RwLock<HashSet<PathBuf>>>,
    /// If set, the next conversion will fail with this error.
    next_error: Arc<RwLock<Option<ConverterError>>>,
    /// Simulated conversion duration in milliseconds.
    conversion_duration_ms: Arc<RwLock<u64>>,
    /// Whether to write the output file.
    write_output: Arc<RwLock<bool>>,
    on_convert: Arc<RwLock<Option<ConversionHook>>>,
}

impl Default for MockConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl MockConverter {
    /// Create a new mock converter.
    pub fn new() -> Self {
        Self {
            conversions: Arc::new(RwLock::new(Vec::new())),
            failing_inputs: Arc::new(RwLock::new(HashSet::new())),
            next_error: Arc::new(RwLock::new(None)),
            conversion_duration_ms: Arc::new(RwLock::new(0)),
            write_output: Arc::new(RwLock::new(true)),
            on_convert: Arc::new(RwLock::new(None)),
        }
    }

    /// Get all recorded conversions.
    pub async fn recorded_conversions(&self) -> Vec<RecordedConversion> {
        self.conversions.read().await.clone()
    }

    /// Get the number of conversions attempted.
    pub async fn conversion_count(&self) -> usize {
        self.conversions.read().await.len()
    }

    /// Clear recorded conversions.
    pub async fn clear_recorded(&self) {
        self.conversions.write().await.clear();
    }

    /// Make every conversion of `input` fail.
    pub async fn fail_on(&self, input: impl AsRef<Path>) {
        self.failing_inputs
            .write()
            .await
            .insert(input.as_ref().to_path_buf());
    }

    /// Configure the next conversion to fail with the given error.
    pub async fn set_next_error(&self, error: ConverterError) {
        *self.next_error.write().await = Some(error);
    }

    /// Set the simulated conversion duration.
    pub async fn set_conversion_duration(&self, duration: Duration) {
        *self.conversion_duration_ms.write().await = duration.as_millis() as u64;
    }

    /// Enable or disable writing output files.
    pub async fn set_write_output(&self, write: bool) {
        *self.write_output.write().await = write;
    }

    /// Run `hook` after every conversion, successful or not.
    pub async fn set_on_convert<F>(&self, hook: F)
    where
        F: Fn(usize, &ConversionJob) + Send + Sync + 'static,
    {
        *self.on_convert.write().await = Some(Arc::new(hook));
    }

    async fn attempt(&self, job: &ConversionJob) -> Result<ConversionResult, ConverterError> {
        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }
        if self.failing_inputs.read().await.contains(&job.input_path) {
            let stderr = format!(
                "{}: Invalid data found when processing input",
                job.input_path.display()
            );
            return Err(ConverterError::conversion_failed("mock failure", Some(stderr)));
        }
        if !job.input_path.exists() {
            return Err(ConverterError::InputNotFound {
                path: job.input_path.clone(),
            });
        }
        if job.output_path.exists() {
            return Err(ConverterError::OutputExists {
                path: job.output_path.clone(),
            });
        }

        let duration_ms = *self.conversion_duration_ms.read().await;
        if duration_ms > 0 {
            tokio::time::sleep(Duration::from_millis(duration_ms)).await;
        }

        let mut output_size_bytes = 0;
        if *self.write_output.read().await {
            tokio::fs::write(&job.output_path, MOCK_OUTPUT).await?;
            output_size_bytes = MOCK_OUTPUT.len() as u64;
        }

        Ok(ConversionResult {
            job_id: job.job_id.clone(),
            output_path: job.output_path.clone(),
            output_size_bytes,
            duration_ms,
        })
    }
}

#[async_trait]
impl Converter for MockConverter {
    fn name(&self) -> &str {
        "mock"
    }

    async fn convert(&self, job: ConversionJob) -> Result<ConversionResult, ConverterError> {
        let result = self.attempt(&job).await;

        let index = {
            let mut conversions = self.conversions.write().await;
            conversions.push(RecordedConversion {
                job: job.clone(),
                success: result.is_ok(),
            });
            conversions.len() - 1
        };

        let hook = self.on_convert.read().await.clone();
        if let Some(hook) = hook {
            hook(index, &job);
        }

        result
    }

    async fn validate(&self) -> Result<(), ConverterError> {
        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }
        Ok(())
    }
}
