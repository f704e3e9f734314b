//! The conversion worker loop.

use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use tokio::sync::mpsc;

use crate::converter::{ConversionJob, Converter};
use crate::enumerator::{enumerate_files, FileFilter};
use crate::path_mapper::{absolute_root, map_destination, MappedPath};

use super::config::WorkerConfig;
use super::handle::WorkerHandle;
use super::state::{lock, JobState, WorkerControl};
use super::types::{StatusMessage, WorkerCommand, WorkerEvent, WorkerState};

/// Background task that runs conversion jobs one file at a time.
pub struct ConversionWorker<C: Converter> {
    converter: Arc<C>,
    config: WorkerConfig,
    control: Arc<Mutex<WorkerControl>>,
    commands: mpsc::Receiver<WorkerCommand>,
    events: mpsc::Sender<WorkerEvent>,
}

/// Create a conversion worker
///
/// Returns:
/// - `WorkerHandle` - for configuring, starting and aborting jobs (clone freely)
/// - `ConversionWorker` - run with `tokio::spawn(worker.run())` or `worker.spawn_dedicated()`
/// - the receiver for status, progress and done events
pub fn create_worker<C: Converter>(
    converter: C,
    config: WorkerConfig,
) -> (WorkerHandle, ConversionWorker<C>, mpsc::Receiver<WorkerEvent>) {
    let (command_tx, command_rx) = mpsc::channel(config.command_buffer.max(1));
    let (event_tx, event_rx) = mpsc::channel(config.event_buffer.max(1));
    let control = Arc::new(Mutex::new(WorkerControl::default()));

    let handle = WorkerHandle::new(Arc::clone(&control), command_tx);
    let worker = ConversionWorker {
        converter: Arc::new(converter),
        config,
        control,
        commands: command_rx,
        events: event_tx,
    };
    (handle, worker, event_rx)
}

impl<C: Converter + 'static> ConversionWorker<C> {
    /// Runs the worker on its own OS thread with a single-threaded runtime.
    pub fn spawn_dedicated(self) -> std::io::Result<JoinHandle<()>> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        std::thread::Builder::new()
            .name("conversion-worker".to_string())
            .spawn(move || runtime.block_on(self.run()))
    }
}

impl<C: Converter> ConversionWorker<C> {
    /// Run the worker, serving commands until shutdown or until every handle is dropped.
    pub async fn run(mut self) {
        tracing::info!(converter = self.converter.name(), "Conversion worker started");

        while let Some(command) = self.commands.recv().await {
            match command {
                WorkerCommand::Start => self.run_job().await,
                WorkerCommand::Shutdown => break,
            }
        }

        tracing::info!("Conversion worker shutting down");
    }

    /// Runs one job from enumeration to the done event.
    async fn run_job(&mut self) {
        let Some(mut job) = self.begin_job() else {
            return;
        };

        tracing::info!(
            job_id = %job.job_id,
            direction = %job.direction,
            source = ?job.source_root,
            destination = ?job.destination_root,
            "Job started"
        );

        let filter = FileFilter::for_direction(job.direction)
            .case_sensitive(self.config.case_sensitive_extensions);
        let root = job.source_root.clone();
        job.files = match tokio::task::spawn_blocking(move || enumerate_files(&root, &filter)).await
        {
            Ok(files) => files,
            Err(e) => {
                tracing::error!(job_id = %job.job_id, "Enumeration task failed: {}", e);
                Vec::new()
            }
        };
        tracing::info!(job_id = %job.job_id, files = job.files.len(), "Enumeration complete");

        self.set_state(WorkerState::ProcessingFile);

        while !job.is_complete() {
            if self.abort_requested() {
                tracing::info!(job_id = %job.job_id, processed = job.cursor, "Job aborted");
                job.aborted = true;
                break;
            }

            self.process_file(&mut job).await;

            let percent = job.advance();
            self.emit(WorkerEvent::Progress {
                job_id: job.job_id.clone(),
                percent,
            })
            .await;

            // One file per iteration; let queued work run before the next
            tokio::task::yield_now().await;
        }

        self.finish_job(&job).await;
    }

    /// Snapshots the configuration and enters `Enumerating`.
    fn begin_job(&self) -> Option<JobState> {
        let mut control = lock(&self.control);
        control.start_pending = false;

        let (Some(source), Some(destination)) =
            (control.source_root.clone(), control.destination_root.clone())
        else {
            tracing::warn!("Start received without paths; ignoring");
            return None;
        };

        control.state = WorkerState::Enumerating;
        Some(JobState::new(
            absolute_root(&source),
            absolute_root(&destination),
            control.direction,
            control.settings,
        ))
    }

    /// Handles the file under the cursor. Never fails the job.
    async fn process_file(&self, job: &mut JobState) {
        let Some(source) = job.current_file().map(|p| p.to_path_buf()) else {
            return;
        };

        let mapped = match map_destination(
            &job.source_root,
            &job.destination_root,
            &source,
            job.direction.target_extension(),
        ) {
            Ok(mapped) => mapped,
            Err(e) => {
                tracing::warn!(job_id = %job.job_id, "Cannot map {:?}: {}", source, e);
                job.failed += 1;
                self.emit_status(
                    job,
                    StatusMessage::Failed {
                        source,
                        reason: e.to_string(),
                    },
                )
                .await;
                return;
            }
        };
        let MappedPath {
            file: destination,
            parent,
        } = mapped;

        let dir_result = tokio::fs::create_dir_all(&parent).await;

        self.emit_status(
            job,
            StatusMessage::Converting {
                source: source.clone(),
                destination: destination.clone(),
            },
        )
        .await;
        tracing::debug!(job_id = %job.job_id, "Converting {:?} to {:?}", source, destination);

        if let Err(e) = dir_result {
            tracing::warn!(job_id = %job.job_id, "Cannot create {:?}: {}", parent, e);
            job.failed += 1;
            self.emit_status(
                job,
                StatusMessage::Failed {
                    source,
                    reason: format!("Failed to create directory {}: {}", parent.display(), e),
                },
            )
            .await;
            return;
        }

        match tokio::fs::try_exists(&destination).await {
            Ok(true) => {
                tracing::debug!(job_id = %job.job_id, "Destination exists, skipping {:?}", destination);
                job.skipped += 1;
                self.emit_status(job, StatusMessage::Skipped { destination }).await;
                return;
            }
            Ok(false) => {}
            Err(e) => {
                job.failed += 1;
                self.emit_status(
                    job,
                    StatusMessage::Failed {
                        source,
                        reason: format!("Cannot check {}: {}", destination.display(), e),
                    },
                )
                .await;
                return;
            }
        }

        let conversion = ConversionJob {
            job_id: format!("{}-{}", job.job_id, job.cursor),
            direction: job.direction,
            input_path: source.clone(),
            output_path: destination.clone(),
            settings: job.settings,
        };

        match self.converter.convert(conversion).await {
            Ok(result) => {
                tracing::debug!(
                    job_id = %job.job_id,
                    bytes = result.output_size_bytes,
                    duration_ms = result.duration_ms,
                    "Converted {:?}",
                    source
                );
                job.converted += 1;
                self.emit_status(job, StatusMessage::Succeeded { destination }).await;
            }
            Err(e) => {
                tracing::warn!(job_id = %job.job_id, "Conversion of {:?} failed: {}", source, e);
                job.failed += 1;
                self.emit_status(
                    job,
                    StatusMessage::Failed {
                        source,
                        reason: e.summary(),
                    },
                )
                .await;
            }
        }
    }

    async fn finish_job(&self, job: &JobState) {
        self.set_state(WorkerState::Done);
        let summary = job.summary();
        tracing::info!(
            job_id = %summary.job_id,
            total = summary.total_files,
            converted = summary.converted,
            skipped = summary.skipped,
            failed = summary.failed,
            aborted = summary.aborted,
            "Job finished"
        );
        self.emit(WorkerEvent::Done(summary)).await;
    }

    fn abort_requested(&self) -> bool {
        lock(&self.control).abort_requested
    }

    fn set_state(&self, state: WorkerState) {
        lock(&self.control).state = state;
    }

    async fn emit_status(&self, job: &JobState, message: StatusMessage) {
        self.emit(WorkerEvent::Status {
            job_id: job.job_id.clone(),
            message,
        })
        .await;
    }

    /// Delivers an event; a dropped receiver is logged, not fatal.
    async fn emit(&self, event: WorkerEvent) {
        if let Err(e) = self.events.send(event).await {
            tracing::debug!("Event receiver dropped: {:?}", e.0);
        }
    }
}
