//! FFmpeg-based converter implementation.

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;
use tokio::time::{timeout, Duration};

use super::config::ConverterConfig;
use super::error::ConverterError;
use super::traits::Converter;
use super::types::{ConversionDirection, ConversionJob, ConversionResult};

/// FFmpeg-based converter implementation.
pub struct FfmpegConverter {
    config: ConverterConfig,
}

/// Maps a 1-100 JPEG quality onto ffmpeg's mjpeg `-q:v` scale (2 best, 31 worst).
pub(crate) fn jpeg_quality_to_qscale(quality: u8) -> u8 {
    let quality = u32::from(quality.clamp(1, 100));
    (31 - (quality - 1) * 29 / 99) as u8
}

impl FfmpegConverter {
    /// Creates a new FFmpeg converter with the given configuration.
    pub fn new(config: ConverterConfig) -> Self {
        Self { config }
    }

    /// Creates a converter with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(ConverterConfig::default())
    }

    /// Returns the configuration this converter runs with.
    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Builds ffmpeg arguments for JPEG to AVIF conversion.
    fn build_avif_args(&self, job: &ConversionJob) -> Vec<String> {
        let settings = &job.settings;
        let crf = (u16::from(settings.min_quantizer) + u16::from(settings.max_quantizer)) / 2;

        let mut args = vec![
            "-n".to_string(), // Never overwrite output
            "-i".to_string(),
            job.input_path.to_string_lossy().to_string(),
            "-frames:v".to_string(),
            "1".to_string(),
            "-c:v".to_string(),
            self.config.avif_encoder.clone(),
            "-still-picture".to_string(),
            "1".to_string(),
            "-qmin".to_string(),
            settings.min_quantizer.to_string(),
            "-qmax".to_string(),
            settings.max_quantizer.to_string(),
            "-crf".to_string(),
            crf.to_string(),
            "-b:v".to_string(),
            "0".to_string(),
            "-cpu-used".to_string(),
            settings.speed.to_string(),
        ];

        self.push_common_args(&mut args, job);
        args
    }

    /// Builds ffmpeg arguments for AVIF to JPEG conversion.
    fn build_jpeg_args(&self, job: &ConversionJob) -> Vec<String> {
        let mut args = vec![
            "-n".to_string(),
            "-i".to_string(),
            job.input_path.to_string_lossy().to_string(),
            "-frames:v".to_string(),
            "1".to_string(),
            "-c:v".to_string(),
            "mjpeg".to_string(),
            "-q:v".to_string(),
            jpeg_quality_to_qscale(job.settings.jpeg_quality).to_string(),
        ];

        self.push_common_args(&mut args, job);
        args
    }

    fn push_common_args(&self, args: &mut Vec<String>, job: &ConversionJob) {
        args.extend([
            "-loglevel".to_string(),
            self.config.ffmpeg_log_level.clone(),
        ]);
        args.extend(self.config.extra_ffmpeg_args.iter().cloned());
        args.push(job.output_path.to_string_lossy().to_string());
    }

    fn build_args(&self, job: &ConversionJob) -> Vec<String> {
        match job.direction {
            ConversionDirection::JpegToAvif => self.build_avif_args(job),
            ConversionDirection::AvifToJpeg => self.build_jpeg_args(job),
        }
    }

    /// Runs ffmpeg for one file and verifies the output.
    async fn run_conversion(&self, job: &ConversionJob) -> Result<ConversionResult, ConverterError> {
        let start = Instant::now();

        if !tokio::fs::try_exists(&job.input_path).await? {
            return Err(ConverterError::InputNotFound {
                path: job.input_path.clone(),
            });
        }
        if tokio::fs::try_exists(&job.output_path).await? {
            return Err(ConverterError::OutputExists {
                path: job.output_path.clone(),
            });
        }

        let args = self.build_args(job);
        tracing::debug!(job_id = %job.job_id, ?args, "Running ffmpeg");

        let child = Command::new(&self.config.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ConverterError::FfmpegNotFound {
                        path: self.config.ffmpeg_path.clone(),
                    }
                } else {
                    ConverterError::Io(e)
                }
            })?;

        let output = match self.config.timeout_secs {
            Some(timeout_secs) => {
                // Dropping the future kills the child (kill_on_drop)
                match timeout(Duration::from_secs(timeout_secs), child.wait_with_output()).await {
                    Ok(output) => output?,
                    Err(_) => {
                        self.remove_partial_output(job).await;
                        return Err(ConverterError::Timeout { timeout_secs });
                    }
                }
            }
            None => child.wait_with_output().await?,
        };

        if !output.status.success() {
            self.remove_partial_output(job).await;
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(ConverterError::conversion_failed(
                format!("FFmpeg exited with code: {:?}", output.status.code()),
                if stderr.is_empty() { None } else { Some(stderr) },
            ));
        }

        let output_meta = tokio::fs::metadata(&job.output_path)
            .await
            .map_err(|_| ConverterError::conversion_failed("Output file not created", None))?;

        Ok(ConversionResult {
            job_id: job.job_id.clone(),
            output_path: job.output_path.clone(),
            output_size_bytes: output_meta.len(),
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// Removes whatever a failed run left behind at the output path.
    ///
    /// Only called after the output was confirmed absent before the run, so
    /// the file can only be ffmpeg's own partial write.
    async fn remove_partial_output(&self, job: &ConversionJob) {
        match tokio::fs::remove_file(&job.output_path).await {
            Ok(()) => tracing::debug!(path = ?job.output_path, "Removed partial output"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = ?job.output_path, "Failed to remove partial output: {}", e),
        }
    }
}

#[async_trait]
impl Converter for FfmpegConverter {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn convert(&self, job: ConversionJob) -> Result<ConversionResult, ConverterError> {
        self.run_conversion(&job).await
    }

    async fn validate(&self) -> Result<(), ConverterError> {
        let output = Command::new(&self.config.ffmpeg_path)
            .arg("-version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ConverterError::FfmpegNotFound {
                        path: self.config.ffmpeg_path.clone(),
                    }
                } else {
                    ConverterError::Io(e)
                }
            })?;

        if !output.status.success() {
            return Err(ConverterError::conversion_failed(
                "ffmpeg -version failed",
                Some(String::from_utf8_lossy(&output.stderr).to_string()),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::ConversionSettings;
    use std::path::PathBuf;

    fn job(direction: ConversionDirection, settings: ConversionSettings) -> ConversionJob {
        let (input, output) = match direction {
            ConversionDirection::JpegToAvif => ("/in/photo.jpg", "/out/photo.avif"),
            ConversionDirection::AvifToJpeg => ("/in/photo.avif", "/out/photo.jpg"),
        };
        ConversionJob {
            job_id: "job-1".to_string(),
            direction,
            input_path: PathBuf::from(input),
            output_path: PathBuf::from(output),
            settings,
        }
    }

    fn value_after<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
        args.iter()
            .position(|a| a == flag)
            .and_then(|i| args.get(i + 1))
            .map(String::as_str)
    }

    #[test]
    fn test_jpeg_quality_mapping() {
        assert_eq!(jpeg_quality_to_qscale(100), 2);
        assert_eq!(jpeg_quality_to_qscale(1), 31);
        assert_eq!(jpeg_quality_to_qscale(0), 31);
        let mid = jpeg_quality_to_qscale(50);
        assert!(mid > 2 && mid < 31);
    }

    #[test]
    fn test_build_avif_args() {
        let converter = FfmpegConverter::with_defaults();
        let settings = ConversionSettings::default()
            .with_quantizers(12, 40)
            .with_speed(4);
        let args = converter.build_args(&job(ConversionDirection::JpegToAvif, settings));

        assert_eq!(args.first().map(String::as_str), Some("-n"));
        assert_eq!(value_after(&args, "-i"), Some("/in/photo.jpg"));
        assert_eq!(value_after(&args, "-c:v"), Some("libaom-av1"));
        assert_eq!(value_after(&args, "-qmin"), Some("12"));
        assert_eq!(value_after(&args, "-qmax"), Some("40"));
        assert_eq!(value_after(&args, "-crf"), Some("26"));
        assert_eq!(value_after(&args, "-cpu-used"), Some("4"));
        assert_eq!(args.last().map(String::as_str), Some("/out/photo.avif"));
        assert!(!args.contains(&"-y".to_string()));
    }

    #[test]
    fn test_build_avif_args_custom_encoder() {
        let converter =
            FfmpegConverter::new(ConverterConfig::default().with_avif_encoder("libsvtav1"));
        let args = converter.build_args(&job(
            ConversionDirection::JpegToAvif,
            ConversionSettings::default(),
        ));
        assert_eq!(value_after(&args, "-c:v"), Some("libsvtav1"));
    }

    #[test]
    fn test_build_jpeg_args() {
        let converter = FfmpegConverter::with_defaults();
        let settings = ConversionSettings::default().with_jpeg_quality(100);
        let args = converter.build_args(&job(ConversionDirection::AvifToJpeg, settings));

        assert_eq!(value_after(&args, "-c:v"), Some("mjpeg"));
        assert_eq!(value_after(&args, "-q:v"), Some("2"));
        assert_eq!(value_after(&args, "-frames:v"), Some("1"));
        assert_eq!(value_after(&args, "-loglevel"), Some("error"));
        assert!(!args.contains(&"-qmin".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("/out/photo.jpg"));
    }

    #[test]
    fn test_extra_args_precede_output() {
        let mut config = ConverterConfig::default();
        config.extra_ffmpeg_args = vec!["-threads".to_string(), "2".to_string()];
        let converter = FfmpegConverter::new(config);
        let args = converter.build_args(&job(
            ConversionDirection::AvifToJpeg,
            ConversionSettings::default(),
        ));

        let n = args.len();
        assert_eq!(&args[n - 3..n - 1], &["-threads".to_string(), "2".to_string()]);
    }

    #[tokio::test]
    async fn test_missing_input_is_reported() {
        let temp = tempfile::tempdir().unwrap();
        let converter = FfmpegConverter::with_defaults();
        let mut job = job(ConversionDirection::JpegToAvif, ConversionSettings::default());
        job.input_path = temp.path().join("missing.jpg");
        job.output_path = temp.path().join("missing.avif");

        let result = converter.convert(job).await;
        assert!(matches!(result, Err(ConverterError::InputNotFound { .. })));
    }

    #[tokio::test]
    async fn test_existing_output_is_not_touched() {
        let temp = tempfile::tempdir().unwrap();
        let input = temp.path().join("a.jpg");
        let output = temp.path().join("a.avif");
        std::fs::write(&input, b"jpeg").unwrap();
        std::fs::write(&output, b"keep me").unwrap();

        let converter = FfmpegConverter::with_defaults();
        let mut job = job(ConversionDirection::JpegToAvif, ConversionSettings::default());
        job.input_path = input;
        job.output_path = output.clone();

        let result = converter.convert(job).await;
        assert!(matches!(result, Err(ConverterError::OutputExists { .. })));
        assert_eq!(std::fs::read(&output).unwrap(), b"keep me");
    }

    #[tokio::test]
    async fn test_missing_binary() {
        let temp = tempfile::tempdir().unwrap();
        let input = temp.path().join("a.jpg");
        std::fs::write(&input, b"jpeg").unwrap();

        let converter = FfmpegConverter::new(ConverterConfig::with_ffmpeg_path(
            temp.path().join("no-such-ffmpeg"),
        ));
        assert!(matches!(
            converter.validate().await,
            Err(ConverterError::FfmpegNotFound { .. })
        ));

        let mut job = job(ConversionDirection::JpegToAvif, ConversionSettings::default());
        job.input_path = input;
        job.output_path = temp.path().join("a.avif");
        assert!(matches!(
            converter.convert(job).await,
            Err(ConverterError::FfmpegNotFound { .. })
        ));
    }
}
