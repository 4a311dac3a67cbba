// ─────────────────────────────────────────────────────────────────────
// Adaptive LoRA Scheduler — Blend Kernel Error Hierarchy
// Hard failures raised at the point of invalid input.
// ─────────────────────────────────────────────────────────────────────

use thiserror::Error;

/// Root error type for all Blend Kernel failures.
///
/// Soft-degradation cases (uniform image, out-of-range modifier) are
/// not errors; they are clamped and logged.
#[derive(Error, Debug)]
pub enum BlendError {
    /// Malformed custom control points or unknown curve family.
    #[error("invalid curve spec: {0}")]
    InvalidCurveSpec(String),

    /// Step range inverted or outside `[0, steps - 1]`.
    #[error("invalid range: start_step={start} end_step={end} for {steps} steps")]
    InvalidRange { start: i64, end: i64, steps: usize },

    /// Step count below one.
    #[error("invalid step count: {0} (must be >= 1)")]
    InvalidStepCount(i64),

    /// Image buffer does not match its declared shape.
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// Invalid request parameter (unknown goal, mode, etc.).
    #[error("validation error: {0}")]
    Validation(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Numerical error (NaN/Inf in computation).
    #[error("numerical error: {0}")]
    Numerical(String),
}

pub type BlendResult<T> = Result<T, BlendError>;
