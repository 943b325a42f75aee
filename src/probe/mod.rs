//! Media probing.
//!
//! The [`SceneProber`] trait is the narrow interface through which the
//! processing queue and the stream negotiator extract container/codec/duration
//! metadata from a file. The production implementation shells out to ffprobe;
//! tests substitute stubs.

pub mod ffprobe;

pub use ffprobe::FfprobeProber;

use async_trait::async_trait;
use scenevault_common::{Container, VideoCodec};
use scenevault_db::models::Scene;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Probe failure taxonomy.
///
/// [`NotFound`](ProbeError::NotFound), [`Unreadable`](ProbeError::Unreadable),
/// and [`UnsupportedFormat`](ProbeError::UnsupportedFormat) are permanent for
/// a given file; [`Timeout`](ProbeError::Timeout) and
/// [`ToolFailure`](ProbeError::ToolFailure) are transient and worth retrying.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    #[error("File not readable: {0}")]
    Unreadable(PathBuf),

    #[error("Unsupported or corrupt media: {0}")]
    UnsupportedFormat(String),

    #[error("Probe timed out after {0:?}")]
    Timeout(Duration),

    #[error("Probe tool failed: {0}")]
    ToolFailure(String),
}

impl ProbeError {
    /// Whether the failure is transient and the probe may succeed on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::ToolFailure(_))
    }
}

/// Probed technical metadata for one video file.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ProbedMeta {
    pub container: Container,
    pub video_codec: VideoCodec,
    pub audio_codec: Option<String>,
    pub duration_secs: Option<f64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Interface for extracting technical metadata from a media file.
#[async_trait]
pub trait SceneProber: Send + Sync {
    /// Probe the file at `path`.
    async fn probe(&self, path: &Path) -> Result<ProbedMeta, ProbeError>;
}

/// Merge probed metadata into a scene record.
///
/// Only metadata fields are touched; derivative references and the path are
/// left as-is.
pub fn apply_to_scene(scene: &mut Scene, meta: &ProbedMeta) {
    scene.container = Some(meta.container);
    scene.video_codec = Some(meta.video_codec);
    scene.audio_codec = meta.audio_codec.clone();
    scene.duration_secs = meta.duration_secs;
    scene.width = meta.width;
    scene.height = meta.height;
}
