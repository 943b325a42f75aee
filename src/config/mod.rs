mod types;

pub use types::*;

use anyhow::{Context, Result};
use regex::Regex;
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = [
        "./scenevault.toml",
        "~/.config/scenevault/config.toml",
        "/etc/scenevault/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Compile the exclude patterns. Guaranteed to succeed for a validated config.
pub fn compile_excludes(config: &Config) -> Result<Vec<Regex>> {
    config
        .library
        .exclude_files
        .iter()
        .map(|pattern| {
            Regex::new(pattern).with_context(|| format!("Invalid exclude pattern: {}", pattern))
        })
        .collect()
}

/// Validate configuration
fn validate_config(config: &Config) -> Result<()> {
    // A bad exclude regex would silently skip nothing or everything; refuse
    // to start rather than scan with it.
    compile_excludes(config)?;

    if config.processing.max_attempts == 0 {
        anyhow::bail!("processing.max_attempts cannot be 0");
    }
    if config.processing.probe_timeout_secs == 0 {
        anyhow::bail!("processing.probe_timeout_secs cannot be 0");
    }

    // Validate library paths exist
    for path in &config.library.paths {
        if !path.exists() {
            tracing::warn!("Library path does not exist: {:?}", path);
        }
    }

    Ok(())
}
