// ─────────────────────────────────────────────────────────────────────
// Adaptive LoRA Scheduler — Blend Kernel PyO3 FFI Bindings
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
// Note: #[deny(unsafe_code)] not applied — PyO3 proc macros generate
// unsafe blocks internally. All hand-written code in this crate is safe.
//! Python-callable wrappers around the Rust Blend Kernel.
//!
//! Exposes `RustBlendScheduler`, `BlendConfig`, `ScheduleResult`, and
//! helper functions to the host node runtime via PyO3.
//!
//! # FFI Contract
//!
//! - Inputs are primitives: ints, floats, strings, flat float lists.
//! - Images cross as a flat `[B, H, W, C]` float list plus its shape
//!   (`tensor.cpu().flatten().tolist()`, `tuple(tensor.shape)`).
//! - Every Rust error surfaces as `ValueError`; nothing partial returns.
//! - All config validated before storage (`BlendConfig::validate()`).
//!
//! Install: `cd blend-kernel && pip install -e crates/blend-ffi`
//! (requires maturin).
//!
//! Usage from Python:
//! ```python
//! from blend_kernel import RustBlendScheduler
//!
//! scheduler = RustBlendScheduler()
//! result = scheduler.schedule(30, blend_strategy="sigmoid")
//! high, low = result.weights, result.low_weights
//! ```

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyDict;

use blend_core::{AdaptiveModulator, BlendScheduler, ComplexityAnalyzer, ImageBatch, ScheduleRequest};
use blend_types::{
    AdaptiveMode, BlendConfig, BlendError, CurveFamily, ExecutionMode, ScheduleResult, TuningGoal,
};

fn to_py_err(e: BlendError) -> PyErr {
    PyValueError::new_err(e.to_string())
}

/// Build an image batch from a flat float list and a 3- or 4-D shape.
///
/// `(H, W, C)` is treated as a single frame.
fn image_batch(pixels: Vec<f32>, shape: Vec<usize>) -> PyResult<ImageBatch> {
    let (frames, height, width, channels) = match shape.as_slice() {
        [b, h, w, c] => (*b, *h, *w, *c),
        [h, w, c] => (1, *h, *w, *c),
        other => {
            return Err(PyValueError::new_err(format!(
                "image_shape must be (B, H, W, C) or (H, W, C), got {other:?}"
            )))
        }
    };
    ImageBatch::new(frames, height, width, channels, pixels).map_err(to_py_err)
}

// ─── PyBlendConfig ──────────────────────────────────────────────────

/// Python-visible calibration configuration for the Blend Kernel.
#[pyclass(name = "BlendConfig")]
#[derive(Clone)]
struct PyBlendConfig {
    inner: BlendConfig,
}

#[pymethods]
impl PyBlendConfig {
    #[new]
    #[pyo3(signature = (
        sigmoid_steepness = 10.0,
        complexity_reference_ratio = 0.25,
        low_band_divisor = 8,
        variance_reference = 0.05,
        standard_scale = 0.5,
        amplified_scale = 1.5,
        dampened_scale = 0.1,
        modifier_min = 0.1,
        modifier_max = 10.0,
        max_analysis_frames = 8,
    ))]
    #[allow(clippy::too_many_arguments)]
    fn new(
        sigmoid_steepness: f64,
        complexity_reference_ratio: f64,
        low_band_divisor: usize,
        variance_reference: f64,
        standard_scale: f64,
        amplified_scale: f64,
        dampened_scale: f64,
        modifier_min: f64,
        modifier_max: f64,
        max_analysis_frames: usize,
    ) -> PyResult<Self> {
        let config = BlendConfig {
            sigmoid_steepness,
            complexity_reference_ratio,
            low_band_divisor,
            variance_reference,
            standard_scale,
            amplified_scale,
            dampened_scale,
            modifier_min,
            modifier_max,
            max_analysis_frames,
        };
        config.validate().map_err(to_py_err)?;
        Ok(Self { inner: config })
    }

    /// Construct from JSON string.
    #[staticmethod]
    fn from_json(json: &str) -> PyResult<Self> {
        let config = BlendConfig::from_json(json).map_err(to_py_err)?;
        config.validate().map_err(to_py_err)?;
        Ok(Self { inner: config })
    }

    fn __repr__(&self) -> String {
        format!(
            "BlendConfig(sigmoid_steepness={}, reference_ratio={}, modifier=[{}, {}])",
            self.inner.sigmoid_steepness,
            self.inner.complexity_reference_ratio,
            self.inner.modifier_min,
            self.inner.modifier_max
        )
    }
}

// ─── PyScheduleResult ───────────────────────────────────────────────

/// Python-visible blend schedule.
#[pyclass(name = "ScheduleResult")]
#[derive(Clone)]
struct PyScheduleResult {
    inner: ScheduleResult,
}

#[pymethods]
impl PyScheduleResult {
    /// High-adapter strength per step.
    #[getter]
    fn weights(&self) -> Vec<f64> {
        self.inner.weights.clone()
    }

    /// Low-adapter strength per step.
    #[getter]
    fn low_weights(&self) -> Vec<f64> {
        self.inner.low_weights()
    }

    #[getter]
    fn crossing_step(&self) -> Option<usize> {
        self.inner.crossing_step
    }

    /// `[(step, high, low), ...]` at 0/25/50/75/100%.
    #[getter]
    fn sample_points(&self) -> Vec<(usize, f64, f64)> {
        self.inner
            .sample_points
            .iter()
            .map(|p| (p.step, p.high, p.low))
            .collect()
    }

    #[getter]
    fn complexity_score(&self) -> Option<f64> {
        self.inner.complexity_score
    }

    #[getter]
    fn modifier(&self) -> Option<f64> {
        self.inner.modifier
    }

    /// True when images reshaped the curve.
    #[getter]
    fn is_adaptive(&self) -> bool {
        self.inner.is_adaptive()
    }

    fn __len__(&self) -> usize {
        self.inner.steps()
    }

    fn to_dict<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        let dict = PyDict::new(py);
        dict.set_item("weights", self.weights())?;
        dict.set_item("low_weights", self.low_weights())?;
        dict.set_item("crossing_step", self.inner.crossing_step)?;
        dict.set_item("sample_points", self.sample_points())?;
        dict.set_item("complexity_score", self.inner.complexity_score)?;
        dict.set_item("modifier", self.inner.modifier)?;
        dict.set_item("is_adaptive", self.inner.is_adaptive())?;
        Ok(dict)
    }

    fn __repr__(&self) -> String {
        format!(
            "ScheduleResult(steps={}, crossing_step={:?}, complexity={:?}, modifier={:?})",
            self.inner.steps(),
            self.inner.crossing_step,
            self.inner.complexity_score,
            self.inner.modifier
        )
    }
}

// ─── RustBlendScheduler ─────────────────────────────────────────────

/// Per-step LoRA blend scheduler exposed to Python.
///
/// Stateless between calls; one instance can serve every node.
#[pyclass(name = "RustBlendScheduler")]
struct PyBlendScheduler {
    inner: BlendScheduler,
}

#[pymethods]
impl PyBlendScheduler {
    #[new]
    #[pyo3(signature = (config = None))]
    fn new(config: Option<PyBlendConfig>) -> PyResult<Self> {
        let cfg = config.map(|c| c.inner).unwrap_or_default();
        let inner = BlendScheduler::new(cfg).map_err(to_py_err)?;
        Ok(Self { inner })
    }

    /// Calibration this scheduler was built with.
    #[getter]
    fn config(&self) -> PyBlendConfig {
        PyBlendConfig {
            inner: self.inner.config().clone(),
        }
    }

    /// Compute a blend schedule.
    ///
    /// Args:
    ///     steps: Total generation steps (>= 1).
    ///     start_step / end_step: Active range; end_step < 0 means last step.
    ///     blend_strategy: linear | ease-in | ease-out | sigmoid | custom_curve | step.
    ///     invert: High → Low instead of Low → High.
    ///     control_points: Optional [(position, value), ...] for custom curves.
    ///     custom_curve: Optional evenly spaced values for custom curves.
    ///     adaptive_mode: off | frequency_analysis | basic_variance.
    ///     tuning_goal: Standard | Encourage Motion | Preserve Details.
    ///     adaptive_intensity: Strength of the adaptive effect (>= 0).
    ///     images: Optional flat float list of frames.
    ///     image_shape: Shape of `images`, (B, H, W, C) or (H, W, C).
    #[pyo3(signature = (
        steps,
        start_step = 0,
        end_step = -1,
        blend_strategy = "linear",
        invert = false,
        control_points = None,
        custom_curve = None,
        adaptive_mode = "off",
        tuning_goal = "standard",
        adaptive_intensity = 1.0,
        images = None,
        image_shape = None,
    ))]
    #[allow(clippy::too_many_arguments)]
    fn schedule(
        &self,
        py: Python<'_>,
        steps: i64,
        start_step: i64,
        end_step: i64,
        blend_strategy: &str,
        invert: bool,
        control_points: Option<Vec<(f64, f64)>>,
        custom_curve: Option<Vec<f64>>,
        adaptive_mode: &str,
        tuning_goal: &str,
        adaptive_intensity: f64,
        images: Option<Vec<f32>>,
        image_shape: Option<Vec<usize>>,
    ) -> PyResult<PyScheduleResult> {
        let request = ScheduleRequest {
            steps,
            start_step,
            end_step,
            blend_strategy: blend_strategy.parse::<CurveFamily>().map_err(to_py_err)?,
            control_points,
            custom_curve,
            invert,
            adaptive_mode: adaptive_mode.parse::<AdaptiveMode>().map_err(to_py_err)?,
            tuning_goal: tuning_goal.parse::<TuningGoal>().map_err(to_py_err)?,
            adaptive_intensity,
        };
        let batch = match (images, image_shape) {
            (Some(pixels), Some(shape)) => Some(image_batch(pixels, shape)?),
            (None, None) => None,
            _ => {
                return Err(PyValueError::new_err(
                    "images and image_shape must be given together",
                ))
            }
        };

        // Pure Rust from here on; let other Python threads run.
        let result = py
            .allow_threads(|| self.inner.run(&request, batch.as_ref()))
            .map_err(to_py_err)?;
        Ok(PyScheduleResult { inner: result })
    }

    /// Complexity score of a flat image batch.
    #[pyo3(signature = (images, image_shape, mode = "frequency_analysis"))]
    fn complexity_score(
        &self,
        images: Vec<f32>,
        image_shape: Vec<usize>,
        mode: &str,
    ) -> PyResult<f64> {
        let mode = mode.parse::<AdaptiveMode>().map_err(to_py_err)?;
        let batch = image_batch(images, image_shape)?;
        Ok(self.inner.analyzer().score(&batch, mode))
    }

    /// Curve modifier for a score under a tuning goal.
    #[pyo3(signature = (score, tuning_goal = "standard", adaptive_intensity = 1.0))]
    fn curve_modifier(&self, score: f64, tuning_goal: &str, adaptive_intensity: f64) -> PyResult<f64> {
        let goal = tuning_goal.parse::<TuningGoal>().map_err(to_py_err)?;
        Ok(self.inner.modulator().modifier(score, goal, adaptive_intensity))
    }
}

/// Complexity score under the default calibration.
#[pyfunction]
#[pyo3(name = "complexity_score", signature = (images, image_shape, mode = "frequency_analysis"))]
fn default_complexity_score(
    py: Python<'_>,
    images: Vec<f32>,
    image_shape: Vec<usize>,
    mode: &str,
) -> PyResult<f64> {
    let mode = mode.parse::<AdaptiveMode>().map_err(to_py_err)?;
    let batch = image_batch(images, image_shape)?;
    Ok(py.allow_threads(|| ComplexityAnalyzer::default().score(&batch, mode)))
}

/// Curve modifier under the default calibration.
#[pyfunction]
#[pyo3(name = "curve_modifier", signature = (score, tuning_goal = "standard", adaptive_intensity = 1.0))]
fn default_curve_modifier(score: f64, tuning_goal: &str, adaptive_intensity: f64) -> PyResult<f64> {
    let goal = tuning_goal.parse::<TuningGoal>().map_err(to_py_err)?;
    Ok(AdaptiveModulator::default().modifier(score, goal, adaptive_intensity))
}

/// Display tag for the host: `normal`, `preview` or `active_blend`.
#[pyfunction]
#[pyo3(signature = (preview_only = false, has_adapters = true))]
fn execution_mode(preview_only: bool, has_adapters: bool) -> &'static str {
    ExecutionMode::resolve(preview_only, has_adapters).as_str()
}

// ─── Module ─────────────────────────────────────────────────────────

#[pymodule]
fn blend_kernel(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyBlendConfig>()?;
    m.add_class::<PyScheduleResult>()?;
    m.add_class::<PyBlendScheduler>()?;
    m.add_function(wrap_pyfunction!(default_complexity_score, m)?)?;
    m.add_function(wrap_pyfunction!(default_curve_modifier, m)?)?;
    m.add_function(wrap_pyfunction!(execution_mode, m)?)?;
    Ok(())
}
