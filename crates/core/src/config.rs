use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Detection tuning, mirroring the persisted option keys.
///
/// Serialized names are the storage keys, so a hand-edited options file
/// round-trips. Missing keys deserialize to their built-in default; a key
/// is never required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub tile_size: u32,
    pub stride: u32,
    pub pixel_diff_threshold: u8,
    pub tile_change_ratio_threshold: f64,
    pub warn_percent: f64,
    pub alert_percent: f64,
    pub overlay_auto_hide_ms: u64,
    pub baseline_interval_ms: u64,
    pub visible_capture_delay_ms: u64,
    pub second_pass_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tile_size: 10,
            stride: 2,
            pixel_diff_threshold: 20,
            tile_change_ratio_threshold: 0.2,
            warn_percent: 2.0,
            alert_percent: 10.0,
            overlay_auto_hide_ms: 6000,
            baseline_interval_ms: 1000,
            visible_capture_delay_ms: 500,
            second_pass_delay_ms: 800,
        }
    }
}

impl Config {
    /// Best-effort load. A missing file or unparseable content falls back
    /// to the defaults; missing keys fall back per key.
    pub fn load(path: &Path) -> Self {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|s| serde_json::from_str::<Config>(&s).ok())
            .unwrap_or_default()
            .normalized()
    }

    /// Strict load for the interactive reload command, so a broken edit is
    /// reported instead of silently reverting to defaults.
    pub fn reload(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read {}", path.display()))?;
        let cfg: Config = serde_json::from_str(&raw)
            .with_context(|| format!("parse {}", path.display()))?;
        Ok(cfg.normalized())
    }

    pub fn save(&self, path: &Path) {
        if let Ok(json) = serde_json::to_string_pretty(self) {
            let _ = std::fs::write(path, json);
        }
    }

    /// Clamp every field into its documented range. `alertPercent` never
    /// drops below `warnPercent`.
    pub fn normalized(mut self) -> Self {
        let d = Config::default();
        self.tile_size = self.tile_size.max(1);
        self.stride = self.stride.max(1);
        if !self.tile_change_ratio_threshold.is_finite() {
            self.tile_change_ratio_threshold = d.tile_change_ratio_threshold;
        }
        self.tile_change_ratio_threshold = self.tile_change_ratio_threshold.clamp(0.0, 1.0);
        if !self.warn_percent.is_finite() {
            self.warn_percent = d.warn_percent;
        }
        if !self.alert_percent.is_finite() {
            self.alert_percent = d.alert_percent;
        }
        self.warn_percent = self.warn_percent.clamp(0.0, 100.0);
        self.alert_percent = self.alert_percent.clamp(0.0, 100.0).max(self.warn_percent);
        self
    }
}
