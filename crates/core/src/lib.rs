pub mod config;
pub mod controller;
pub mod converter;
pub mod enumerator;
pub mod path_mapper;
pub mod testing;
pub mod worker;

pub use config::{
    load_config, load_config_from_str, load_config_or_default, validate_config, Config,
    ConfigError,
};
pub use controller::{JobController, Preflight, PreflightError};
pub use converter::{
    ConversionDirection, ConversionJob, ConversionResult, ConversionSettings, Converter,
    ConverterConfig, ConverterError, EncoderCapabilities, FfmpegConverter,
};
pub use enumerator::{enumerate_files, FileFilter};
pub use path_mapper::{map_destination, MappedPath, PathMappingError};
pub use worker::{
    create_worker, ConversionWorker, JobSummary, StatusMessage, WorkerConfig, WorkerError,
    WorkerEvent, WorkerHandle, WorkerState,
};
