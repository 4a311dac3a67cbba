// ─────────────────────────────────────────────────────────────────────
// Adaptive LoRA Scheduler — Curve Generator
// Normalized progress t ∈ [0, 1] → blend weight ∈ [0, 1].
// ─────────────────────────────────────────────────────────────────────
//! Base curve families and the exponent modifier.
//!
//! Every family is a pure function of `t` with `f(0) = 0` and
//! `f(1) = 1`, except custom curves whose explicit endpoints say
//! otherwise. Raising to a positive exponent keeps 0 and 1 fixed.

use blend_types::config::DEFAULT_SIGMOID_STEEPNESS;
use blend_types::{BlendError, BlendResult, CurveFamily};

/// Immutable curve configuration: a family plus, for `Custom`,
/// a validated control polyline that always spans `t = 0 .. 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveSpec {
    family: CurveFamily,
    control_points: Vec<(f64, f64)>,
}

impl CurveSpec {
    /// Spec for any non-custom family.
    ///
    /// `Custom` without points degenerates to the identity polyline
    /// `(0,0) → (1,1)`.
    pub fn new(family: CurveFamily) -> Self {
        let control_points = match family {
            CurveFamily::Custom => vec![(0.0, 0.0), (1.0, 1.0)],
            _ => Vec::new(),
        };
        Self {
            family,
            control_points,
        }
    }

    /// Custom piecewise-linear curve.
    ///
    /// Positions must be strictly increasing; positions and values must
    /// lie in [0, 1]. A missing `t = 0` point defaults to `(0, 0)` and a
    /// missing `t = 1` point to `(1, 1)`.
    pub fn custom(points: &[(f64, f64)]) -> BlendResult<Self> {
        for (i, &(x, y)) in points.iter().enumerate() {
            if !x.is_finite() || !y.is_finite() {
                return Err(BlendError::InvalidCurveSpec(format!(
                    "control point {i} is not finite: ({x}, {y})"
                )));
            }
            if !(0.0..=1.0).contains(&x) || !(0.0..=1.0).contains(&y) {
                return Err(BlendError::InvalidCurveSpec(format!(
                    "control point {i} outside [0, 1]: ({x}, {y})"
                )));
            }
        }
        for (i, pair) in points.windows(2).enumerate() {
            if pair[1].0 <= pair[0].0 {
                return Err(BlendError::InvalidCurveSpec(format!(
                    "control point positions must be strictly increasing: \
                     point {} at {} follows {}",
                    i + 1,
                    pair[1].0,
                    pair[0].0
                )));
            }
        }

        let mut control_points = Vec::with_capacity(points.len() + 2);
        if points.first().map_or(true, |&(x, _)| x > 0.0) {
            control_points.push((0.0, 0.0));
        }
        control_points.extend_from_slice(points);
        if points.last().map_or(true, |&(x, _)| x < 1.0) {
            control_points.push((1.0, 1.0));
        }

        Ok(Self {
            family: CurveFamily::Custom,
            control_points,
        })
    }

    /// Custom curve from evenly spaced values (`t_i = i / (n - 1)`).
    ///
    /// A single value is placed at `t = 0`.
    pub fn custom_from_values(values: &[f64]) -> BlendResult<Self> {
        let n = values.len();
        let points: Vec<(f64, f64)> = match n {
            0 => Vec::new(),
            1 => vec![(0.0, values[0])],
            _ => values
                .iter()
                .enumerate()
                .map(|(i, &v)| (i as f64 / (n - 1) as f64, v))
                .collect(),
        };
        Self::custom(&points)
    }

    pub fn family(&self) -> CurveFamily {
        self.family
    }

    /// Normalized control polyline (empty for non-custom families).
    pub fn control_points(&self) -> &[(f64, f64)] {
        &self.control_points
    }
}

impl Default for CurveSpec {
    fn default() -> Self {
        Self::new(CurveFamily::Linear)
    }
}

/// Evaluates curve specs with a fixed sigmoid steepness.
#[derive(Debug, Clone, Copy)]
pub struct CurveGenerator {
    steepness: f64,
    sig_lo: f64,
    sig_range: f64,
}

impl CurveGenerator {
    pub fn new(steepness: f64) -> Self {
        let sig_lo = logistic(-steepness / 2.0);
        let sig_hi = logistic(steepness / 2.0);
        Self {
            steepness,
            sig_lo,
            sig_range: sig_hi - sig_lo,
        }
    }

    /// Curve value at `t`. Input is clamped to [0, 1]; NaN reads as 0.
    pub fn evaluate(&self, spec: &CurveSpec, t: f64) -> f64 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match spec.family {
            CurveFamily::Linear => t,
            CurveFamily::EaseIn => t * t,
            CurveFamily::EaseOut => {
                let u = 1.0 - t;
                1.0 - u * u
            }
            CurveFamily::Sigmoid => self.sigmoid(t),
            CurveFamily::Custom => interpolate(&spec.control_points, t),
            CurveFamily::Step => {
                if t < 0.5 {
                    0.0
                } else {
                    1.0
                }
            }
        }
    }

    /// Curve value at `t` raised to `modifier`.
    pub fn evaluate_modified(&self, spec: &CurveSpec, t: f64, modifier: f64) -> f64 {
        apply_modifier(self.evaluate(spec, t), modifier)
    }

    /// Logistic shifted and scaled so the endpoints land on 0 and 1.
    fn sigmoid(&self, t: f64) -> f64 {
        if t <= 0.0 {
            return 0.0;
        }
        if t >= 1.0 {
            return 1.0;
        }
        let raw = logistic(self.steepness * (t - 0.5));
        ((raw - self.sig_lo) / self.sig_range).clamp(0.0, 1.0)
    }
}

impl Default for CurveGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_SIGMOID_STEEPNESS)
    }
}

/// Evaluate with the default steepness.
pub fn evaluate(spec: &CurveSpec, t: f64) -> f64 {
    CurveGenerator::default().evaluate(spec, t)
}

/// `value^modifier`; `modifier == 1` is exact identity.
#[inline]
pub fn apply_modifier(value: f64, modifier: f64) -> f64 {
    if modifier == 1.0 {
        value
    } else {
        value.max(0.0).powf(modifier)
    }
}

#[inline]
fn logistic(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Piecewise-linear interpolation over a polyline spanning [0, 1].
fn interpolate(points: &[(f64, f64)], t: f64) -> f64 {
    let (first, last) = match (points.first(), points.last()) {
        (Some(f), Some(l)) => (*f, *l),
        _ => return t,
    };
    if t <= first.0 {
        return first.1;
    }
    if t >= last.0 {
        return last.1;
    }
    // First segment whose right end reaches t.
    let idx = points.partition_point(|&(x, _)| x < t);
    let (x0, y0) = points[idx - 1];
    let (x1, y1) = points[idx];
    let frac = (t - x0) / (x1 - x0);
    y0 + (y1 - y0) * frac
}
