use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use imgconv_core::{
    create_worker, load_config_or_default, validate_config, Config, ConversionDirection,
    Converter, EncoderCapabilities, FfmpegConverter, JobController, JobSummary, Preflight,
    WorkerEvent,
};

/// Exit status when at least one file failed to convert.
const EXIT_FILES_FAILED: i32 = 2;

/// Batch JPEG/AVIF converter that mirrors a directory tree.
#[derive(Parser, Debug)]
#[command(name = "imgconv", version, about, long_about = None)]
struct Cli {
    /// Conversion to perform: jpeg-to-avif or avif-to-jpeg
    #[arg(value_name = "DIRECTION")]
    direction: ConversionDirection,

    /// Directory searched recursively for source images
    #[arg(value_name = "SOURCE")]
    source: PathBuf,

    /// Directory receiving the converted tree
    #[arg(value_name = "DESTINATION")]
    destination: PathBuf,

    /// Configuration file (defaults to $IMGCONV_CONFIG when set)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// JPEG output quality (1-100)
    #[arg(long)]
    jpeg_quality: Option<u8>,

    /// Lowest AV1 quantizer (0-63)
    #[arg(long)]
    min_quantizer: Option<u8>,

    /// Highest AV1 quantizer (0-63)
    #[arg(long)]
    max_quantizer: Option<u8>,

    /// AV1 encoder speed preset (0-8)
    #[arg(long)]
    speed: Option<u8>,

    /// Do not ask before writing into a non-empty destination
    #[arg(short, long)]
    yes: bool,

    /// Print events as JSON lines
    #[arg(long)]
    json: bool,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_json);

    match run(cli).await {
        Ok(summary) if summary.failed > 0 => std::process::exit(EXIT_FILES_FAILED),
        Ok(_) => {}
        Err(e) => {
            error!("Fatal error: {:#}", e);
            eprintln!("imgconv: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());

    // stdout carries job output; logs go to stderr
    let (plain, json) = if json {
        let layer = tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr);
        (None, Some(layer))
    } else {
        let layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
        (Some(layer), None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(plain)
        .with(json)
        .init();
}

async fn run(cli: Cli) -> Result<JobSummary> {
    let config_path = cli
        .config
        .clone()
        .or_else(|| std::env::var("IMGCONV_CONFIG").ok().map(PathBuf::from));
    let config = load_configuration(config_path.as_deref(), &cli)?;

    let converter = FfmpegConverter::new(config.converter.clone());
    let (handle, worker, mut events) = create_worker(converter, config.worker.clone());
    let mut controller = JobController::new(handle.clone(), config.conversion);

    match controller.preflight(&cli.source, &cli.destination)? {
        Preflight::Ready => {}
        Preflight::NeedsConfirmation { destination } => {
            if !cli.yes && !confirm_non_empty(&destination).await? {
                bail!("Cancelled by user");
            }
        }
    }

    check_ffmpeg(&config, cli.direction).await?;

    let worker_thread = worker
        .spawn_dedicated()
        .context("Failed to start conversion worker")?;

    controller.start(cli.direction, &cli.source, &cli.destination)?;

    let mut abort_sent = false;
    let summary = loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else {
                    bail!("Conversion worker stopped unexpectedly");
                };
                controller.observe(&event);
                print_event(&event, cli.json)?;
                if let WorkerEvent::Done(summary) = event {
                    break summary;
                }
            }
            result = signal::ctrl_c(), if !abort_sent => {
                result.context("Failed to listen for Ctrl+C")?;
                abort_sent = true;
                if controller.request_abort() && !cli.json {
                    eprintln!("Stopping after the current file...");
                }
            }
        }
    };

    handle.shutdown()?;
    tokio::task::spawn_blocking(move || worker_thread.join())
        .await
        .context("Failed to join conversion worker")?
        .map_err(|_| anyhow::anyhow!("Conversion worker panicked"))?;

    info!(
        converted = summary.converted,
        skipped = summary.skipped,
        failed = summary.failed,
        "Conversion finished"
    );
    Ok(summary)
}

/// Loads the configuration and applies command-line overrides.
fn load_configuration(path: Option<&Path>, cli: &Cli) -> Result<Config> {
    if let Some(path) = path {
        info!("Loading configuration from {:?}", path);
    }
    let mut config = load_config_or_default(path)
        .with_context(|| format!("Failed to load config from {:?}", path))?;

    let settings = &mut config.conversion;
    if let Some(quality) = cli.jpeg_quality {
        settings.jpeg_quality = quality;
    }
    if let Some(min) = cli.min_quantizer {
        settings.min_quantizer = min;
    }
    if let Some(max) = cli.max_quantizer {
        settings.max_quantizer = max;
    }
    if let Some(speed) = cli.speed {
        settings.speed = speed;
    }

    validate_config(&config).context("Configuration validation failed")?;
    Ok(config)
}

/// Probes ffmpeg; a missing binary is fatal, missing codecs only warn.
async fn check_ffmpeg(config: &Config, direction: ConversionDirection) -> Result<()> {
    FfmpegConverter::new(config.converter.clone())
        .validate()
        .await
        .context("ffmpeg is not usable")?;

    let capabilities = EncoderCapabilities::detect(&config.converter).await;
    if !capabilities.supports(direction, &config.converter) {
        warn!(
            %direction,
            encoder = %config.converter.avif_encoder,
            "ffmpeg may lack the codecs for this conversion; files will likely fail"
        );
    }
    Ok(())
}

async fn confirm_non_empty(destination: &Path) -> Result<bool> {
    print!(
        "Destination {} is not empty; existing files will be skipped. Continue? [y/N] ",
        destination.display()
    );
    std::io::stdout().flush()?;

    let answer = tokio::task::spawn_blocking(|| {
        let mut line = String::new();
        std::io::stdin().read_line(&mut line).map(|_| line)
    })
    .await
    .context("Failed to read confirmation")??;

    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

fn print_event(event: &WorkerEvent, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(event)?);
        return Ok(());
    }

    match event {
        WorkerEvent::Status { message, .. } => println!("{}", message),
        WorkerEvent::Progress { percent, .. } => println!("[{:>3}%]", percent),
        WorkerEvent::Done(summary) => {
            println!(
                "{} {} of {} files: {} converted, {} skipped, {} failed",
                if summary.aborted { "Aborted after" } else { "Done with" },
                summary.processed,
                summary.total_files,
                summary.converted,
                summary.skipped,
                summary.failed
            );
        }
    }
    Ok(())
}
