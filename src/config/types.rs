use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub library: LibraryConfig,

    #[serde(default)]
    pub processing: ProcessingConfig,

    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LibraryConfig {
    /// Folders scanned for video files.
    #[serde(default)]
    pub paths: Vec<PathBuf>,

    /// Regex patterns; a file whose lowercased path matches any of them is
    /// never registered. Validated at load time.
    #[serde(default)]
    pub exclude_files: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProcessingConfig {
    /// Ceiling on processing attempts per queue item.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,

    #[serde(default = "default_generate_timeout")]
    pub generate_timeout_secs: u64,

    /// Where derived thumbnails and previews are written.
    #[serde(default = "default_generated_dir")]
    pub generated_dir: PathBuf,
}

fn default_max_attempts() -> u32 {
    3
}
fn default_probe_timeout() -> u64 {
    30
}
fn default_generate_timeout() -> u64 {
    120
}
fn default_generated_dir() -> PathBuf {
    PathBuf::from("./generated")
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            probe_timeout_secs: default_probe_timeout(),
            generate_timeout_secs: default_generate_timeout(),
            generated_dir: default_generated_dir(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ToolsConfig {
    /// Explicit ffmpeg binary; discovered on PATH when unset.
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    /// Explicit ffprobe binary; discovered on PATH when unset.
    #[serde(default)]
    pub ffprobe_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./scenevault.db")
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}
