//! Runtime configuration

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Configuration for the `vtscreens` binary
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Luau script that builds and animates screens
    pub script_path: PathBuf,
    /// Period of the present loop
    pub frame_interval_ms: u64,
    /// Force a full repaint every N frames (0 = never)
    pub full_repaint_interval: u64,
    /// Enter the alternate screen while running
    pub alternate_screen: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            script_path: PathBuf::from("screen.lua"),
            frame_interval_ms: 50,
            full_repaint_interval: 0,
            alternate_screen: true,
        }
    }
}

impl Config {
    /// Load config from a TOML file. A missing file yields defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::warn!("config not found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;

        tracing::info!(
            script = %config.script_path.display(),
            frame_interval_ms = config.frame_interval_ms,
            "loaded config from {}",
            path.display()
        );

        Ok(config)
    }

    /// Whether frame number `frame` should be a full repaint
    pub fn is_full_repaint_frame(&self, frame: u64) -> bool {
        self.full_repaint_interval > 0 && frame > 0 && frame % self.full_repaint_interval == 0
    }
}
