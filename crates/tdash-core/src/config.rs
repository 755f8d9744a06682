use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::checksum::ChecksumKind;

/// Global configuration loaded from `~/.config/tdash/config.toml`.
/// Keys missing from the file take their default values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashConfig {
    /// Interval between control channel key polls, in milliseconds.
    pub control_poll_ms: u64,
    /// Minimum gap between producer-driven redraws in milliseconds (0 = redraw on every call).
    /// Entry creation, completion and key presses always redraw.
    pub redraw_interval_ms: u64,
    /// How long the "press any key" step waits before continuing on its own.
    pub completion_wait_secs: u64,
    /// Number of transfers the CLI runs at once.
    pub max_concurrent_transfers: usize,
    /// Chunk size used by the copy producer.
    pub copy_buffer_bytes: usize,
    /// Checksum computed for every transfer when the CLI does not pass `--checksum`.
    pub default_checksum: Option<ChecksumKind>,
}

impl Default for DashConfig {
    fn default() -> Self {
        Self {
            control_poll_ms: 100,
            redraw_interval_ms: 0,
            completion_wait_secs: 10,
            max_concurrent_transfers: 4,
            copy_buffer_bytes: 64 * 1024,
            default_checksum: None,
        }
    }
}

impl DashConfig {
    pub fn control_poll_interval(&self) -> Duration {
        Duration::from_millis(self.control_poll_ms.max(1))
    }

    pub fn redraw_interval(&self) -> Duration {
        Duration::from_millis(self.redraw_interval_ms)
    }

    pub fn completion_wait(&self) -> Duration {
        Duration::from_secs(self.completion_wait_secs)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("tdash")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<DashConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = DashConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: DashConfig = toml::from_str(&data)?;
    Ok(cfg)
}
