// ─────────────────────────────────────────────────────────────────────
// Adaptive LoRA Scheduler — Blend Kernel Schedule Types
// Step range, per-step result and display statistics.
// ─────────────────────────────────────────────────────────────────────

use serde::{Deserialize, Serialize};

use crate::error::{BlendError, BlendResult};

/// Fractions of the full step range reported as sample points.
pub const SAMPLE_FRACTIONS: [f64; 5] = [0.0, 0.25, 0.5, 0.75, 1.0];

/// Clamp a value to [lo, hi], mapping NaN to lo and Inf to nearest bound.
#[inline]
pub fn clamp_weight(value: f64, lo: f64, hi: f64) -> f64 {
    if value.is_nan() {
        log::warn!("clamp_weight: NaN detected, clamping to {lo:.4}");
        return lo;
    }
    if value.is_infinite() {
        let boundary = if value > 0.0 { hi } else { lo };
        log::warn!("clamp_weight: Inf detected, clamping to {boundary:.4}");
        return boundary;
    }
    value.clamp(lo, hi)
}

/// Active blending window `[start_step, end_step]`, both inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRange {
    pub start_step: usize,
    pub end_step: usize,
}

impl StepRange {
    pub fn new(start_step: usize, end_step: usize) -> Self {
        Self {
            start_step,
            end_step,
        }
    }

    /// The whole schedule, `[0, steps - 1]`.
    pub fn full(steps: usize) -> Self {
        Self::new(0, steps.saturating_sub(1))
    }

    /// Build from host integers, where a negative `end_step` means
    /// "until the last step".
    pub fn from_host(start_step: i64, end_step: i64, steps: usize) -> BlendResult<Self> {
        let end = if end_step < 0 {
            steps as i64 - 1
        } else {
            end_step
        };
        if start_step < 0 || end < 0 {
            return Err(BlendError::InvalidRange {
                start: start_step,
                end,
                steps,
            });
        }
        let range = Self::new(start_step as usize, end as usize);
        range.validate(steps)?;
        Ok(range)
    }

    /// Check `0 <= start <= end < steps`.
    pub fn validate(&self, steps: usize) -> BlendResult<()> {
        if self.start_step > self.end_step || self.end_step >= steps {
            return Err(BlendError::InvalidRange {
                start: self.start_step as i64,
                end: self.end_step as i64,
                steps,
            });
        }
        Ok(())
    }

    /// Number of curve intervals spanned, never less than one.
    pub fn span(&self) -> usize {
        (self.end_step - self.start_step).max(1)
    }
}

/// Weight at a fixed fraction of the schedule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplePoint {
    pub step: usize,
    /// Strength of the "high" adapter.
    pub high: f64,
    /// Strength of the "low" adapter (`1 - high`).
    pub low: f64,
}

/// Complete per-step blend schedule plus display statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleResult {
    /// High-adapter weight per step; `len == steps`.
    pub weights: Vec<f64>,
    /// First step whose side of 0.5 differs from the previous step.
    pub crossing_step: Option<usize>,
    /// Weights at 0/25/50/75/100% of `[0, steps - 1]`.
    pub sample_points: Vec<SamplePoint>,
    /// Measured image complexity, when adaptation ran.
    pub complexity_score: Option<f64>,
    /// Curve exponent, when adaptation ran.
    pub modifier: Option<f64>,
}

impl ScheduleResult {
    pub fn steps(&self) -> usize {
        self.weights.len()
    }

    /// Per-step weights for the "low" adapter.
    pub fn low_weights(&self) -> Vec<f64> {
        self.weights.iter().map(|w| 1.0 - w).collect()
    }

    pub fn is_adaptive(&self) -> bool {
        self.modifier.is_some()
    }
}
