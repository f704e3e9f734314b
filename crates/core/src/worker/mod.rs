//! Background conversion worker.
//!
//! The worker walks a source tree, mirrors every matching file into the
//! destination tree with the target extension, and converts the files one at
//! a time. It is driven through a [`WorkerHandle`] and reports through a
//! stream of [`WorkerEvent`]s:
//!
//! - `Status` notices for every file (converting, skipped, succeeded, failed)
//! - `Progress` after every file, as `cursor * 100 / total`
//! - `Done` exactly once per job, always the last event
//!
//! An abort request is observed between files, never in the middle of one.
//!
//! # Example
//!
//! ```ignore
//! use imgconv_core::converter::{ConversionDirection, FfmpegConverter};
//! use imgconv_core::worker::{create_worker, WorkerConfig, WorkerEvent};
//!
//! let (handle, worker, mut events) =
//!     create_worker(FfmpegConverter::with_defaults(), WorkerConfig::default());
//! let thread = worker.spawn_dedicated()?;
//!
//! handle.set_direction(ConversionDirection::JpegToAvif);
//! handle.set_paths("/photos", "/photos-avif");
//! handle.start()?;
//!
//! while let Some(event) = events.recv().await {
//!     if let WorkerEvent::Done(summary) = event {
//!         println!("{} converted", summary.converted);
//!         break;
//!     }
//! }
//!
//! handle.shutdown()?;
//! thread.join().ok();
//! ```

mod config;
mod handle;
mod runner;
mod state;
mod types;

pub use config::WorkerConfig;
pub use handle::{WorkerError, WorkerHandle};
pub use runner::{create_worker, ConversionWorker};
pub use types::{JobSummary, StatusMessage, WorkerEvent, WorkerState};
