//! Format settings loaded from an optional TOML file and `CHAINFMT_*`
//! environment variables.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chainfmt_core::FormatConfig;

/// Default config file location (`<config dir>/chainfmt/chainfmt.toml`).
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("chainfmt")
        .join("chainfmt.toml")
}

/// Load [`FormatConfig`]. Missing file and unset variables fall back to defaults.
///
/// Recognized keys: `client_version`, `max_inputs_per_tx`
/// (`CHAINFMT_CLIENT_VERSION`, `CHAINFMT_MAX_INPUTS_PER_TX`).
pub fn load(path: &Path) -> Result<FormatConfig> {
    config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(config::Environment::with_prefix("CHAINFMT").try_parsing(true))
        .build()
        .and_then(|c| c.try_deserialize::<FormatConfig>())
        .with_context(|| format!("loading config from {}", path.display()))
}
