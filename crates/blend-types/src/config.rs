// ─────────────────────────────────────────────────────────────────────
// Adaptive LoRA Scheduler — Blend Kernel Configuration
// Calibration constants for curve shape and adaptive response.
// ─────────────────────────────────────────────────────────────────────

use serde::{Deserialize, Serialize};

use crate::error::{BlendError, BlendResult};

/// Steepness `k` of the re-normalized logistic curve.
pub const DEFAULT_SIGMOID_STEEPNESS: f64 = 10.0;

/// High-frequency energy ratio of a typical photograph after mean
/// removal. A natural 1/f spectrum puts roughly a quarter of its energy
/// outside the central `min(h, w) / 8` band.
pub const DEFAULT_COMPLEXITY_REFERENCE_RATIO: f64 = 0.25;

/// Luma variance of a typical photograph (intensities in [0, 1]).
pub const DEFAULT_VARIANCE_REFERENCE: f64 = 0.05;

/// Runtime configuration for the Blend Kernel.
///
/// All values are calibration constants: they are read-only once a
/// scheduler is built and can be tuned without changing the algorithm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlendConfig {
    /// Steepness of the sigmoid family.
    /// Default: 10.0.
    pub sigmoid_steepness: f64,

    /// High-frequency energy ratio that maps to a complexity score of 1.0.
    /// Default: 0.25.
    pub complexity_reference_ratio: f64,

    /// Low-frequency half-width is `min(h, w) / low_band_divisor`.
    /// Default: 8.
    pub low_band_divisor: usize,

    /// Luma variance that maps to a complexity score of 1.0 in
    /// basic-variance mode.
    /// Default: 0.05.
    pub variance_reference: f64,

    /// Modifier response scale under the standard goal.
    /// Default: 0.5.
    pub standard_scale: f64,

    /// Response scale on the side a goal focuses on.
    /// Default: 1.5.
    pub amplified_scale: f64,

    /// Response scale on the side a goal ignores.
    /// Default: 0.1.
    pub dampened_scale: f64,

    /// Lower clamp for the curve modifier.
    /// Default: 0.1.
    pub modifier_min: f64,

    /// Upper clamp for the curve modifier.
    /// Default: 10.0.
    pub modifier_max: f64,

    /// Frames analyzed per batch; longer batches are strided.
    /// Default: 8.
    pub max_analysis_frames: usize,
}

impl Default for BlendConfig {
    fn default() -> Self {
        Self {
            sigmoid_steepness: DEFAULT_SIGMOID_STEEPNESS,
            complexity_reference_ratio: DEFAULT_COMPLEXITY_REFERENCE_RATIO,
            low_band_divisor: 8,
            variance_reference: DEFAULT_VARIANCE_REFERENCE,
            standard_scale: 0.5,
            amplified_scale: 1.5,
            dampened_scale: 0.1,
            modifier_min: 0.1,
            modifier_max: 10.0,
            max_analysis_frames: 8,
        }
    }
}

impl BlendConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> BlendResult<()> {
        let positive = [
            ("sigmoid_steepness", self.sigmoid_steepness),
            ("complexity_reference_ratio", self.complexity_reference_ratio),
            ("variance_reference", self.variance_reference),
            ("standard_scale", self.standard_scale),
            ("amplified_scale", self.amplified_scale),
            ("dampened_scale", self.dampened_scale),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(BlendError::Config(format!(
                    "{name} must be finite and > 0, got {value}"
                )));
            }
        }
        if !(self.modifier_min > 0.0 && self.modifier_min < 1.0) {
            return Err(BlendError::Config(format!(
                "modifier_min must be in (0, 1), got {}",
                self.modifier_min
            )));
        }
        if !(self.modifier_max > 1.0 && self.modifier_max.is_finite()) {
            return Err(BlendError::Config(format!(
                "modifier_max must be finite and > 1, got {}",
                self.modifier_max
            )));
        }
        if self.low_band_divisor < 2 {
            return Err(BlendError::Config(format!(
                "low_band_divisor must be >= 2, got {}",
                self.low_band_divisor
            )));
        }
        if self.max_analysis_frames < 1 {
            return Err(BlendError::Config(format!(
                "max_analysis_frames must be >= 1, got {}",
                self.max_analysis_frames
            )));
        }
        Ok(())
    }

    /// Load from JSON string. Missing fields take their defaults.
    pub fn from_json(json: &str) -> BlendResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| BlendError::Config(format!("JSON parse error: {e}")))
    }
}
