// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Capture pipeline configuration, persisted as JSON in the data directory.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Result, ScanError};
use crate::types::{EnhancementSettings, MIN_CROP_SIZE};

/// File name used inside the data directory.
pub const CONFIG_FILE: &str = "scan-config.json";

/// Tunables for capture, review, and enhancement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Quiet period before a settings change recomputes the preview.
    pub debounce_ms: u64,
    /// Smallest crop edge in source pixels.
    pub min_crop_size: f32,
    /// Radius around a crop corner that counts as a hit, in logical pixels.
    pub corner_hit_radius: f32,
    /// Horizontal travel needed before a swipe triggers, in logical pixels.
    pub swipe_threshold: f32,
    /// Pinch distance delta that doubles the zoom.
    pub pinch_divisor: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
    /// JPEG quality for previews (0.0..=1.0).
    pub preview_quality: f32,
    /// Settings used for auto-enhancement during processing.
    pub enhancement: EnhancementSettings,
    /// Extension appended to the document name before assembly.
    pub document_extension: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 300,
            min_crop_size: MIN_CROP_SIZE,
            corner_hit_radius: 44.0,
            swipe_threshold: 50.0,
            pinch_divisor: 500.0,
            min_zoom: 1.0,
            max_zoom: 3.0,
            preview_quality: 0.95,
            enhancement: EnhancementSettings::default(),
            document_extension: "pdf".into(),
        }
    }
}

impl ScanConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Reject values that would break crop or zoom invariants.
    pub fn validate(&self) -> Result<()> {
        if self.min_crop_size <= 0.0 {
            return Err(ScanError::Config("min_crop_size must be positive".into()));
        }
        if self.pinch_divisor <= 0.0 {
            return Err(ScanError::Config("pinch_divisor must be positive".into()));
        }
        if self.min_zoom <= 0.0 || self.min_zoom > self.max_zoom {
            return Err(ScanError::Config(format!(
                "zoom bounds [{}, {}] are inverted or non-positive",
                self.min_zoom, self.max_zoom
            )));
        }
        if !(0.0..=1.0).contains(&self.preview_quality) {
            return Err(ScanError::Config(format!(
                "preview_quality {} outside 0.0..=1.0",
                self.preview_quality
            )));
        }
        Ok(())
    }

    /// Load `scan-config.json` from `data_dir`, falling back to defaults when
    /// the file is missing, unreadable, or invalid.
    pub fn load_or_default(data_dir: &Path) -> Self {
        let path = data_dir.join(CONFIG_FILE);
        let data = match std::fs::read_to_string(&path) {
            Ok(data) => data,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "no scan config, using defaults");
                return Self::default();
            }
        };
        match serde_json::from_str::<Self>(&data) {
            Ok(config) => match config.validate() {
                Ok(()) => config,
                Err(e) => {
                    warn!(error = %e, "scan config rejected, using defaults");
                    Self::default()
                }
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "scan config unreadable, using defaults");
                Self::default()
            }
        }
    }

    /// Persist to `scan-config.json` in `data_dir`.
    pub fn save(&self, data_dir: &Path) -> Result<()> {
        self.validate()?;
        let path = data_dir.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)?;
        debug!(path = %path.display(), "scan config saved");
        Ok(())
    }
}
