// ─────────────────────────────────────────────────────────────────────
// Adaptive LoRA Scheduler — Blend Scheduler Pipeline
// Node inputs → validated schedule, with optional adaptive shaping.
// ─────────────────────────────────────────────────────────────────────
//! Orchestrates one scheduling call:
//!
//! 1. Validate step count and resolve the step range.
//! 2. Build the curve spec (custom points or value list).
//! 3. If adaptation is on and images are present: score complexity,
//!    derive the curve modifier.
//! 4. Assemble the per-step weights and statistics.

use serde::{Deserialize, Serialize};

use blend_types::{
    AdaptiveMode, BlendConfig, BlendDirection, BlendError, BlendResult, CurveFamily,
    ScheduleResult, StepRange, TuningGoal,
};

use crate::assembler::ScheduleAssembler;
use crate::complexity::ComplexityAnalyzer;
use crate::curve::{CurveGenerator, CurveSpec};
use crate::image::ImageBatch;
use crate::modulator::AdaptiveModulator;

/// Primitive inputs of one scheduling call, as the host node sees them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleRequest {
    /// Total generation steps (must be >= 1).
    pub steps: i64,
    pub start_step: i64,
    /// Negative means "last step".
    pub end_step: i64,
    pub blend_strategy: CurveFamily,
    /// `(position, value)` pairs for the custom family.
    pub control_points: Option<Vec<(f64, f64)>>,
    /// Evenly spaced values for the custom family; used when
    /// `control_points` is absent.
    pub custom_curve: Option<Vec<f64>>,
    /// High → low instead of low → high.
    pub invert: bool,
    pub adaptive_mode: AdaptiveMode,
    pub tuning_goal: TuningGoal,
    pub adaptive_intensity: f64,
}

impl Default for ScheduleRequest {
    fn default() -> Self {
        Self {
            steps: 30,
            start_step: 0,
            end_step: -1,
            blend_strategy: CurveFamily::Linear,
            control_points: None,
            custom_curve: None,
            invert: false,
            adaptive_mode: AdaptiveMode::Off,
            tuning_goal: TuningGoal::Standard,
            adaptive_intensity: 1.0,
        }
    }
}

impl ScheduleRequest {
    pub fn new(steps: i64, blend_strategy: CurveFamily) -> Self {
        Self {
            steps,
            blend_strategy,
            ..Default::default()
        }
    }

    /// Validated step count.
    pub fn step_count(&self) -> BlendResult<usize> {
        if self.steps < 1 {
            return Err(BlendError::InvalidStepCount(self.steps));
        }
        Ok(self.steps as usize)
    }

    /// Curve spec for the requested family.
    pub fn curve_spec(&self) -> BlendResult<CurveSpec> {
        if self.blend_strategy != CurveFamily::Custom {
            if self.control_points.is_some() || self.custom_curve.is_some() {
                log::debug!(
                    "custom points ignored for blend strategy '{}'",
                    self.blend_strategy
                );
            }
            return Ok(CurveSpec::new(self.blend_strategy));
        }
        match (&self.control_points, &self.custom_curve) {
            (Some(points), _) => CurveSpec::custom(points),
            (None, Some(values)) => CurveSpec::custom_from_values(values),
            (None, None) => Ok(CurveSpec::new(CurveFamily::Custom)),
        }
    }

    pub fn direction(&self) -> BlendDirection {
        BlendDirection::from_invert(self.invert)
    }
}

/// Complexity score and the modifier derived from it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adaptation {
    pub complexity_score: f64,
    pub modifier: f64,
}

/// End-to-end blend schedule engine.
///
/// Stateless between calls apart from the analyzer's FFT plan cache;
/// safe to share across threads.
pub struct BlendScheduler {
    config: BlendConfig,
    assembler: ScheduleAssembler,
    analyzer: ComplexityAnalyzer,
    modulator: AdaptiveModulator,
}

impl BlendScheduler {
    pub fn new(config: BlendConfig) -> BlendResult<Self> {
        config.validate()?;
        Ok(Self::from_validated(config))
    }

    /// Wire the stages from a config that has already passed `validate()`.
    fn from_validated(config: BlendConfig) -> Self {
        Self {
            assembler: ScheduleAssembler::new(CurveGenerator::new(config.sigmoid_steepness)),
            analyzer: ComplexityAnalyzer::new(config.clone()),
            modulator: AdaptiveModulator::new(config.clone()),
            config,
        }
    }

    /// Run one scheduling call.
    ///
    /// Either returns a complete schedule or an error; nothing partial.
    pub fn run(
        &self,
        request: &ScheduleRequest,
        images: Option<&ImageBatch>,
    ) -> BlendResult<ScheduleResult> {
        let steps = request.step_count()?;
        let range = StepRange::from_host(request.start_step, request.end_step, steps)?;
        let spec = request.curve_spec()?;

        log::info!(
            "blend schedule: strategy={} steps={steps} range={}..={} direction={:?}",
            spec.family(),
            range.start_step,
            range.end_step,
            request.direction()
        );

        let adaptation = match (request.adaptive_mode.is_enabled(), images) {
            (true, Some(images)) => Some(self.analyze(
                images,
                request.adaptive_mode,
                request.tuning_goal,
                request.adaptive_intensity,
            )),
            (true, None) => {
                log::debug!("adaptive mode {} without images, skipped", request.adaptive_mode);
                None
            }
            (false, _) => None,
        };

        let mut result = self.assembler.build_directed(
            steps,
            &spec,
            range,
            adaptation.map(|a| a.modifier),
            request.direction(),
        )?;
        if let Some(a) = adaptation {
            result.complexity_score = Some(a.complexity_score);
            result.modifier = Some(a.modifier);
        }

        for p in &result.sample_points {
            log::info!(
                "  step {:3}: high={:.1}% low={:.1}%",
                p.step,
                p.high * 100.0,
                p.low * 100.0
            );
        }
        Ok(result)
    }

    /// Score images and derive the curve modifier.
    pub fn analyze(
        &self,
        images: &ImageBatch,
        mode: AdaptiveMode,
        goal: TuningGoal,
        intensity: f64,
    ) -> Adaptation {
        let complexity_score = self.analyzer.score(images, mode);
        let modifier = self.modulator.modifier(complexity_score, goal, intensity);
        log::info!(
            "adaptive {mode}: goal={goal} intensity={intensity:.2} \
             complexity={complexity_score:.3} modifier={modifier:.3}"
        );
        Adaptation {
            complexity_score,
            modifier,
        }
    }

    pub fn analyzer(&self) -> &ComplexityAnalyzer {
        &self.analyzer
    }

    pub fn modulator(&self) -> &AdaptiveModulator {
        &self.modulator
    }

    pub fn config(&self) -> &BlendConfig {
        &self.config
    }
}

impl Default for BlendScheduler {
    fn default() -> Self {
        Self::from_validated(BlendConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::GrayImage;

    fn noise_batch(size: usize) -> ImageBatch {
        let mut state = 0x9e37_79b9_7f4a_7c15u64;
        let gray = GrayImage::from_fn(size, size, |_, _| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            (state % 1000) as f64 / 1000.0
        })
        .unwrap();
        ImageBatch::from_gray(&gray)
    }

    #[test]
    fn test_default_request_full_range() {
        let scheduler = BlendScheduler::default();
        let result = scheduler.run(&ScheduleRequest::default(), None).unwrap();
        assert_eq!(result.weights.len(), 30);
        assert_eq!(result.weights[0], 0.0);
        assert_eq!(result.weights[29], 1.0);
        assert!(result.complexity_score.is_none());
        assert!(result.modifier.is_none());
    }

    #[test]
    fn test_invalid_step_count() {
        let scheduler = BlendScheduler::default();
        let request = ScheduleRequest::new(0, CurveFamily::Linear);
        assert!(matches!(
            scheduler.run(&request, None),
            Err(BlendError::InvalidStepCount(0))
        ));
    }

    #[test]
    fn test_invalid_range_no_partial() {
        let scheduler = BlendScheduler::default();
        let request = ScheduleRequest {
            steps: 10,
            start_step: 8,
            end_step: 3,
            ..Default::default()
        };
        assert!(matches!(
            scheduler.run(&request, None),
            Err(BlendError::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_invert_high_to_low() {
        let scheduler = BlendScheduler::default();
        let request = ScheduleRequest {
            steps: 10,
            invert: true,
            ..Default::default()
        };
        let result = scheduler.run(&request, None).unwrap();
        assert_eq!(result.weights[0], 1.0);
        assert_eq!(result.weights[9], 0.0);
    }

    #[test]
    fn test_custom_from_value_list() {
        let scheduler = BlendScheduler::default();
        let request = ScheduleRequest {
            steps: 5,
            blend_strategy: CurveFamily::Custom,
            custom_curve: Some(vec![0.0, 0.8, 1.0]),
            ..Default::default()
        };
        let result = scheduler.run(&request, None).unwrap();
        // t = 0.5 → 0.8
        assert!((result.weights[2] - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_custom_bad_points_rejected() {
        let scheduler = BlendScheduler::default();
        let request = ScheduleRequest {
            steps: 5,
            blend_strategy: CurveFamily::Custom,
            control_points: Some(vec![(0.7, 0.2), (0.3, 0.5)]),
            ..Default::default()
        };
        assert!(matches!(
            scheduler.run(&request, None),
            Err(BlendError::InvalidCurveSpec(_))
        ));
    }

    #[test]
    fn test_adaptive_without_images_is_plain() {
        let scheduler = BlendScheduler::default();
        let request = ScheduleRequest {
            steps: 12,
            adaptive_mode: AdaptiveMode::FrequencyAnalysis,
            ..Default::default()
        };
        let result = scheduler.run(&request, None).unwrap();
        assert!(!result.is_adaptive());
    }

    #[test]
    fn test_preserve_details_on_texture() {
        let scheduler = BlendScheduler::default();
        let images = noise_batch(32);
        let request = ScheduleRequest {
            steps: 20,
            adaptive_mode: AdaptiveMode::FrequencyAnalysis,
            tuning_goal: TuningGoal::PreserveDetails,
            adaptive_intensity: 2.0,
            ..Default::default()
        };
        let result = scheduler.run(&request, Some(&images)).unwrap();
        let score = result.complexity_score.unwrap();
        let modifier = result.modifier.unwrap();
        assert!(score > 1.0, "score {score}");
        assert!((modifier - 1.0).abs() > 0.5);
        assert!((0.1..=10.0).contains(&modifier));

        let plain = scheduler
            .run(
                &ScheduleRequest {
                    adaptive_mode: AdaptiveMode::Off,
                    ..request.clone()
                },
                Some(&images),
            )
            .unwrap();
        // m > 1 holds the high adapter back mid-schedule.
        assert!(result.weights[10] < plain.weights[10]);
    }

    #[test]
    fn test_zero_intensity_keeps_shape() {
        let scheduler = BlendScheduler::default();
        let images = noise_batch(16);
        let request = ScheduleRequest {
            steps: 15,
            blend_strategy: CurveFamily::Sigmoid,
            adaptive_mode: AdaptiveMode::FrequencyAnalysis,
            adaptive_intensity: 0.0,
            ..Default::default()
        };
        let adaptive = scheduler.run(&request, Some(&images)).unwrap();
        let plain = scheduler
            .run(
                &ScheduleRequest {
                    adaptive_mode: AdaptiveMode::Off,
                    ..request.clone()
                },
                None,
            )
            .unwrap();
        assert_eq!(adaptive.modifier, Some(1.0));
        assert_eq!(adaptive.weights, plain.weights);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = BlendConfig {
            modifier_min: 0.0,
            ..Default::default()
        };
        assert!(BlendScheduler::new(config).is_err());
    }

    #[test]
    fn test_request_from_json() {
        let request: ScheduleRequest = serde_json::from_str(
            r#"{"steps": 8, "blend_strategy": "ease_out", "tuning_goal": "encourage_motion"}"#,
        )
        .unwrap();
        assert_eq!(request.steps, 8);
        assert_eq!(request.blend_strategy, CurveFamily::EaseOut);
        assert_eq!(request.tuning_goal, TuningGoal::EncourageMotion);
        assert_eq!(request.end_step, -1);
    }

    #[test]
    fn test_request_json_host_spellings() {
        let request: ScheduleRequest = serde_json::from_str(
            r#"{"blend_strategy": "ease-in", "tuning_goal": "Preserve Details",
                "adaptive_mode": "frequency_analysis"}"#,
        )
        .unwrap();
        assert_eq!(request.blend_strategy, CurveFamily::EaseIn);
        assert_eq!(request.tuning_goal, TuningGoal::PreserveDetails);
        assert_eq!(request.adaptive_mode, AdaptiveMode::FrequencyAnalysis);
    }

    #[test]
    fn test_default_matches_validated_new() {
        let a = BlendScheduler::default();
        let b = BlendScheduler::new(BlendConfig::default()).unwrap();
        assert_eq!(a.config(), b.config());
        let request = ScheduleRequest::new(25, CurveFamily::Sigmoid);
        assert_eq!(a.run(&request, None).unwrap(), b.run(&request, None).unwrap());
    }
}
