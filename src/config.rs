//! Tunable parameters for every detection stage, loadable from JSON.

use crate::error::OmrResult;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Parameters for turning a page into a binary edge map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessParams {
    /// Grayscale values strictly below this are painted as "very dark".
    pub dark_threshold: u8,
    /// Edge intensities at or above this become 255, the rest 0.
    pub binary_threshold: u8,
    /// Radius of the max filter; 0 is a 1-pixel window and leaves the map untouched.
    pub noise_filter_radius: u8,
}

impl Default for PreprocessParams {
    fn default() -> Self {
        Self {
            dark_threshold: 20,
            binary_threshold: 80,
            noise_filter_radius: 0,
        }
    }
}

/// Parameters for the horizontal projection staff-line detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaffParams {
    /// Pixels brighter than this count towards a row's projection.
    pub on_threshold: u8,
    /// Fraction of the strongest row a row must exceed to become a candidate.
    pub peak_fraction: f64,
    /// Minimum gap between two kept lines, in rows.
    pub min_line_distance: u32,
    /// Above this many lines every other line is dropped.
    pub doubling_limit: usize,
}

impl Default for StaffParams {
    fn default() -> Self {
        Self {
            on_threshold: 97,
            peak_fraction: 0.5,
            min_line_distance: 5,
            doubling_limit: 10,
        }
    }
}

/// Parameters for the sliding-window template search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchParams {
    /// Inclusive minimum correlation for a window to become a detection.
    pub threshold: f64,
    /// Scan columns in parallel when the `rayon` feature is compiled in.
    ///
    /// Ignored without the feature.
    pub parallel: bool,
    /// Abort a single template search after this many milliseconds.
    pub deadline_ms: Option<u64>,
}

impl Default for MatchParams {
    fn default() -> Self {
        Self {
            threshold: 0.6,
            parallel: true,
            deadline_ms: None,
        }
    }
}

impl MatchParams {
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_ms.map(Duration::from_millis)
    }

    pub(crate) fn use_parallel(&self) -> bool {
        self.parallel && cfg!(feature = "rayon")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NmsParams {
    /// Maximum tolerated intersection over the smaller box area.
    pub overlap_threshold: f64,
}

impl Default for NmsParams {
    fn default() -> Self {
        Self {
            overlap_threshold: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PitchParams {
    /// Rows below a staff's lowest line that still belong to its band.
    pub band_margin: u32,
}

impl Default for PitchParams {
    fn default() -> Self {
        Self { band_margin: 15 }
    }
}

/// Full configuration of a recognition run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OmrConfig {
    pub preprocess: PreprocessParams,
    pub staff: StaffParams,
    pub matching: MatchParams,
    pub nms: NmsParams,
    pub pitch: PitchParams,
}

impl OmrConfig {
    /// Load a JSON config from disk. Missing fields keep their defaults.
    pub fn load_json(path: impl AsRef<Path>) -> OmrResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write the config as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> OmrResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
