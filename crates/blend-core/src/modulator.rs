// ─────────────────────────────────────────────────────────────────────
// Adaptive LoRA Scheduler — Adaptive Modulator
// (complexity score, tuning goal, intensity) → curve exponent.
// ─────────────────────────────────────────────────────────────────────
//! Maps image complexity onto a curve modifier `m`, applied as
//! `weight = curve(t)^m`.
//!
//! - `m < 1` bulges the curve up: the high adapter gains weight early.
//! - `m > 1` sags the curve: the high adapter is held back.
//!
//! The deviation `d = (score - 1) * intensity` drives the response;
//! each goal picks the scale applied to `d`.

use blend_types::{BlendConfig, TuningGoal};

/// Computes curve modifiers from complexity scores.
#[derive(Debug, Clone)]
pub struct AdaptiveModulator {
    config: BlendConfig,
}

impl AdaptiveModulator {
    pub fn new(config: BlendConfig) -> Self {
        Self { config }
    }

    /// Curve modifier, clamped to `[modifier_min, modifier_max]`.
    ///
    /// Never fails: negative or non-finite intensity counts as 0.0 and a
    /// non-finite result falls back to the neutral 1.0.
    pub fn modifier(&self, score: f64, goal: TuningGoal, intensity: f64) -> f64 {
        let intensity = if intensity.is_finite() && intensity >= 0.0 {
            intensity
        } else {
            log::warn!("adaptive intensity {intensity} invalid, using 0.0");
            0.0
        };
        if intensity == 0.0 {
            return 1.0;
        }
        if !score.is_finite() {
            log::warn!("complexity score {score} not finite, modifier left neutral");
            return 1.0;
        }

        let deviation = (score - 1.0) * intensity;
        let scale = self.response_scale(score, goal);
        let raw = 1.0 + deviation * scale;
        self.clamp(raw)
    }

    /// Scale applied to the deviation for this goal and score side.
    fn response_scale(&self, score: f64, goal: TuningGoal) -> f64 {
        match goal {
            TuningGoal::Standard => self.config.standard_scale,
            TuningGoal::EncourageMotion => {
                if score < 1.0 {
                    self.config.amplified_scale
                } else {
                    self.config.dampened_scale
                }
            }
            TuningGoal::PreserveDetails => {
                if score > 1.0 {
                    self.config.amplified_scale
                } else {
                    self.config.dampened_scale
                }
            }
        }
    }

    fn clamp(&self, raw: f64) -> f64 {
        if !raw.is_finite() {
            log::warn!("curve modifier not finite, using 1.0");
            return 1.0;
        }
        let clamped = raw.clamp(self.config.modifier_min, self.config.modifier_max);
        if clamped != raw {
            log::debug!("curve modifier {raw:.4} clamped to {clamped:.4}");
        }
        clamped
    }
}

impl Default for AdaptiveModulator {
    fn default() -> Self {
        Self::new(BlendConfig::default())
    }
}
