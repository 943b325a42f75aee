//! Derivative generation.
//!
//! Produces the assets derived from a probed scene: a thumbnail frame, a
//! preview frame, and marker timestamps. The production implementation drives
//! ffmpeg; the [`DerivativeGenerator`] trait keeps the queue testable with
//! stubs.

use async_trait::async_trait;
use scenevault_db::models::Scene;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// Generator failure taxonomy. Both variants are transient: a crashed or
/// timed-out tool may succeed on a later attempt.
#[derive(Debug, Error)]
pub enum DerivativeError {
    #[error("Generator tool failed: {0}")]
    ToolFailure(String),

    #[error("Generation timed out after {0:?}")]
    Timeout(Duration),
}

impl DerivativeError {
    /// Whether the failure is transient and generation may succeed on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ToolFailure(_) | Self::Timeout(_))
    }
}

/// Assets produced for one scene. Fields are independent: a generator may
/// produce some and not others.
#[derive(Debug, Clone, Default)]
pub struct Derivatives {
    pub thumbnail: Option<PathBuf>,
    pub preview: Option<PathBuf>,
    /// Marker timestamps in seconds, ascending.
    pub markers: Vec<f64>,
}

/// Interface for producing thumbnail/preview/marker derivatives.
#[async_trait]
pub trait DerivativeGenerator: Send + Sync {
    /// Generate derivatives for a scene. The scene is expected to have a path;
    /// probed duration improves frame selection but is not required.
    async fn generate(&self, scene: &Scene) -> Result<Derivatives, DerivativeError>;
}

/// Fraction of the duration at which the thumbnail frame is grabbed.
const THUMBNAIL_POSITION: f64 = 0.2;

/// Fraction of the duration at which the preview frame is grabbed.
const PREVIEW_POSITION: f64 = 0.5;

/// Number of evenly spaced markers laid over a scene's duration.
const MARKER_COUNT: usize = 9;

/// Scenes shorter than this get no markers.
const MIN_MARKER_DURATION_SECS: f64 = 30.0;

/// Generator that extracts frames with ffmpeg and computes evenly spaced
/// markers from the probed duration.
#[derive(Debug, Clone)]
pub struct FfmpegGenerator {
    binary: PathBuf,
    output_dir: PathBuf,
    timeout: Duration,
}

impl FfmpegGenerator {
    /// Create a generator writing derived images under `output_dir`.
    pub fn new(
        binary: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        timeout: Duration,
    ) -> Self {
        Self {
            binary: binary.into(),
            output_dir: output_dir.into(),
            timeout,
        }
    }

    async fn grab_frame(
        &self,
        input: &Path,
        at_secs: f64,
        width: u32,
        output: &Path,
    ) -> Result<(), DerivativeError> {
        let mut command = Command::new(&self.binary);
        command
            .arg("-y")
            .args(["-ss", &format!("{:.3}", at_secs)])
            .arg("-i")
            .arg(input)
            .args(["-frames:v", "1"])
            .args(["-vf", &format!("scale={}:-2", width)])
            .arg(output)
            .kill_on_drop(true);

        let result = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| DerivativeError::Timeout(self.timeout))?
            .map_err(|e| DerivativeError::ToolFailure(format!("{:?}: {}", self.binary, e)))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(DerivativeError::ToolFailure(stderr.trim().to_string()));
        }

        Ok(())
    }
}

/// Compute evenly spaced marker timestamps for a duration.
pub fn marker_timestamps(duration_secs: Option<f64>) -> Vec<f64> {
    match duration_secs {
        Some(duration) if duration >= MIN_MARKER_DURATION_SECS => {
            let step = duration / (MARKER_COUNT + 1) as f64;
            (1..=MARKER_COUNT).map(|i| step * i as f64).collect()
        }
        _ => Vec::new(),
    }
}

#[async_trait]
impl DerivativeGenerator for FfmpegGenerator {
    async fn generate(&self, scene: &Scene) -> Result<Derivatives, DerivativeError> {
        let Some(path) = scene.path.as_deref() else {
            return Ok(Derivatives::default());
        };
        let input = Path::new(path);

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| DerivativeError::ToolFailure(format!("output dir: {}", e)))?;

        let duration = scene.duration_secs.unwrap_or(0.0);
        let thumbnail_path = self.output_dir.join(format!("{}_thumb.jpg", scene.id));
        let preview_path = self.output_dir.join(format!("{}_preview.jpg", scene.id));

        debug!(scene_id = %scene.id, "Generating derivatives for {}", input.display());

        self.grab_frame(input, duration * THUMBNAIL_POSITION, 320, &thumbnail_path)
            .await?;
        self.grab_frame(input, duration * PREVIEW_POSITION, 640, &preview_path)
            .await?;

        Ok(Derivatives {
            thumbnail: Some(thumbnail_path),
            preview: Some(preview_path),
            markers: marker_timestamps(scene.duration_secs),
        })
    }
}
