// ─────────────────────────────────────────────────────────────────────
// Adaptive LoRA Scheduler — Schedule Assembler
// Curve + range + modifier → per-step weights and statistics.
// ─────────────────────────────────────────────────────────────────────

use blend_types::schedule::SAMPLE_FRACTIONS;
use blend_types::{
    clamp_weight, BlendDirection, BlendError, BlendResult, SamplePoint, ScheduleResult, StepRange,
};

use crate::curve::{CurveGenerator, CurveSpec};

/// Drives the curve generator across a step range.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScheduleAssembler {
    curve: CurveGenerator,
}

impl ScheduleAssembler {
    pub fn new(curve: CurveGenerator) -> Self {
        Self { curve }
    }

    /// Build a rising (low → high) schedule.
    ///
    /// `modifier` defaults to 1.0. The result carries no adaptive
    /// metadata; callers that ran the analyzer fill it in.
    pub fn build(
        &self,
        steps: usize,
        spec: &CurveSpec,
        range: StepRange,
        modifier: Option<f64>,
    ) -> BlendResult<ScheduleResult> {
        self.build_directed(steps, spec, range, modifier, BlendDirection::LowToHigh)
    }

    /// Build a schedule in either direction.
    ///
    /// Steps before `start_step` hold the weight at `start_step`; steps
    /// after `end_step` hold the weight at `end_step`.
    pub fn build_directed(
        &self,
        steps: usize,
        spec: &CurveSpec,
        range: StepRange,
        modifier: Option<f64>,
        direction: BlendDirection,
    ) -> BlendResult<ScheduleResult> {
        if steps < 1 {
            return Err(BlendError::InvalidStepCount(steps as i64));
        }
        range.validate(steps)?;

        let modifier = modifier.unwrap_or(1.0);
        if !(modifier.is_finite() && modifier > 0.0) {
            return Err(BlendError::Numerical(format!(
                "curve modifier must be finite and > 0, got {modifier}"
            )));
        }

        let span = range.span() as f64;
        let weight_at = |i: usize| -> f64 {
            let t = (i - range.start_step) as f64 / span;
            let value = self.curve.evaluate_modified(spec, t, modifier);
            clamp_weight(direction.orient(value), 0.0, 1.0)
        };

        let head = weight_at(range.start_step);
        let tail = weight_at(range.end_step);
        let weights: Vec<f64> = (0..steps)
            .map(|i| {
                if i < range.start_step {
                    head
                } else if i > range.end_step {
                    tail
                } else {
                    weight_at(i)
                }
            })
            .collect();

        let crossing_step = crossing_step(&weights, direction);
        let sample_points = sample_points(&weights);

        Ok(ScheduleResult {
            weights,
            crossing_step,
            sample_points,
            complexity_score: None,
            modifier: None,
        })
    }
}

/// First step where the weight crosses 0.5 in the schedule's direction:
/// `< 0.5 → >= 0.5` rising, `>= 0.5 → < 0.5` falling.
///
/// Transitions against the direction (non-monotonic custom curves) are
/// skipped.
pub fn crossing_step(weights: &[f64], direction: BlendDirection) -> Option<usize> {
    weights
        .windows(2)
        .position(|pair| {
            let (before, after) = (pair[0] >= 0.5, pair[1] >= 0.5);
            match direction {
                BlendDirection::LowToHigh => !before && after,
                BlendDirection::HighToLow => before && !after,
            }
        })
        .map(|i| i + 1)
}

/// Weights at 0/25/50/75/100% of `[0, len - 1]`, nearest index.
pub fn sample_points(weights: &[f64]) -> Vec<SamplePoint> {
    if weights.is_empty() {
        return Vec::new();
    }
    let last = (weights.len() - 1) as f64;
    SAMPLE_FRACTIONS
        .iter()
        .map(|&f| {
            let step = (f * last).round() as usize;
            let high = weights[step];
            SamplePoint {
                step,
                high,
                low: 1.0 - high,
            }
        })
        .collect()
}
