//! FFprobe-based media probing.

use super::{ProbeError, ProbedMeta, SceneProber};
use async_trait::async_trait;
use scenevault_common::paths::file_extension;
use scenevault_common::{Container, VideoCodec};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    format_name: String,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: String,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

/// Prober that shells out to ffprobe with a bounded timeout.
#[derive(Debug, Clone)]
pub struct FfprobeProber {
    binary: PathBuf,
    timeout: Duration,
}

impl FfprobeProber {
    /// Create a prober invoking the given ffprobe binary.
    pub fn new(binary: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }
}

impl Default for FfprobeProber {
    fn default() -> Self {
        Self::new("ffprobe", Duration::from_secs(30))
    }
}

#[async_trait]
impl SceneProber for FfprobeProber {
    async fn probe(&self, path: &Path) -> Result<ProbedMeta, ProbeError> {
        match tokio::fs::metadata(path).await {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ProbeError::NotFound(path.to_path_buf()));
            }
            Err(_) => return Err(ProbeError::Unreadable(path.to_path_buf())),
        }

        let mut command = Command::new(&self.binary);
        command
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path)
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| ProbeError::Timeout(self.timeout))?
            .map_err(|e| ProbeError::ToolFailure(format!("{:?}: {}", self.binary, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProbeError::UnsupportedFormat(stderr.trim().to_string()));
        }

        let ff_output: FfprobeOutput = serde_json::from_slice(&output.stdout)
            .map_err(|e| ProbeError::ToolFailure(format!("unparseable ffprobe output: {}", e)))?;

        parse_ffprobe_output(path, ff_output)
    }
}

fn parse_ffprobe_output(path: &Path, output: FfprobeOutput) -> Result<ProbedMeta, ProbeError> {
    let video = output
        .streams
        .iter()
        .find(|s| s.codec_type == "video")
        .ok_or_else(|| ProbeError::UnsupportedFormat("no video stream".to_string()))?;

    let audio = output.streams.iter().find(|s| s.codec_type == "audio");

    let extension = file_extension(path);
    let container = Container::from_format_name(&output.format.format_name, extension.as_deref());
    let video_codec = video
        .codec_name
        .as_deref()
        .map(VideoCodec::from_codec_name)
        .unwrap_or(VideoCodec::Other);

    Ok(ProbedMeta {
        container,
        video_codec,
        audio_codec: audio.and_then(|s| s.codec_name.clone()),
        duration_secs: output.format.duration.and_then(|s| s.parse().ok()),
        width: video.width,
        height: video.height,
    })
}
