//! Tunable parameters for a sync session.
//! Values come from an optional TOML file; anything left out keeps its default.

use crate::keys::{Command, KeyMap};
use crate::srt::ParseMode;
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Default period of the caption lookup.
pub const DEFAULT_SYNC_INTERVAL_MS: u64 = 500;
/// Default period of the video identity check.
pub const DEFAULT_IDENTITY_INTERVAL_MS: u64 = 1000;
/// Default quiet period after a manual adjustment.
pub const DEFAULT_SUPPRESSION_MS: u64 = 1000;
/// Default font size of the caption box, in pixels.
pub const DEFAULT_FONT_BASELINE_PX: f32 = 20.0;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    pub sync_interval_ms: u64,
    pub identity_interval_ms: u64,
    /// Autosync is skipped for this long after every manual adjustment.
    pub suppression_ms: u64,
    /// How long the drift indicator stays up.
    pub drift_display_ms: u64,
    /// Size of a fine nudge, in seconds.
    pub fine_step_secs: f64,
    /// How many times one coarse key press is applied.
    pub coarse_repeat: u32,
    pub parse_mode: ParseMode,
    pub font_baseline_px: f32,
    pub font_step_px: f32,
    /// Extra key bindings, e.g. `"z" = "undo"`.
    pub keys: BTreeMap<String, Command>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            sync_interval_ms: DEFAULT_SYNC_INTERVAL_MS,
            identity_interval_ms: DEFAULT_IDENTITY_INTERVAL_MS,
            suppression_ms: DEFAULT_SUPPRESSION_MS,
            drift_display_ms: 2000,
            fine_step_secs: 0.1,
            coarse_repeat: 2,
            parse_mode: ParseMode::Lenient,
            font_baseline_px: DEFAULT_FONT_BASELINE_PX,
            font_step_px: 1.0,
            keys: BTreeMap::new(),
        }
    }
}

impl SyncConfig {
    /// Read and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "config: loading");
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: '{}'", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Invalid config file: '{}'", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every value is usable.
    pub fn validate(&self) -> Result<()> {
        if self.sync_interval_ms == 0 || self.identity_interval_ms == 0 {
            return Err(anyhow!("polling intervals must be greater than zero"));
        }
        if !(self.fine_step_secs.is_finite() && self.fine_step_secs > 0.0) {
            return Err(anyhow!("fine_step_secs must be a positive number"));
        }
        if self.coarse_repeat == 0 {
            return Err(anyhow!("coarse_repeat must be at least 1"));
        }
        if !(self.font_baseline_px >= 1.0 && self.font_step_px > 0.0) {
            return Err(anyhow!("font sizes must be positive"));
        }
        self.key_map()?;
        Ok(())
    }

    pub fn key_map(&self) -> Result<KeyMap> {
        KeyMap::with_overrides(&self.keys)
    }

    pub fn sync_interval(&self) -> Duration {
        Duration::from_millis(self.sync_interval_ms)
    }

    pub fn identity_interval(&self) -> Duration {
        Duration::from_millis(self.identity_interval_ms)
    }

    pub fn suppression(&self) -> Duration {
        Duration::from_millis(self.suppression_ms)
    }

    pub fn drift_display(&self) -> Duration {
        Duration::from_millis(self.drift_display_ms)
    }
}
