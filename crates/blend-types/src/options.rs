// ─────────────────────────────────────────────────────────────────────
// Adaptive LoRA Scheduler — Blend Kernel Option Enums
// Closed variants for every string-valued node input.
// ─────────────────────────────────────────────────────────────────────
//! Curve family, tuning goal, adaptive mode, direction and execution
//! mode. Host strings are parsed once, at construction; unknown names
//! are rejected there rather than at evaluation time. Deserialization
//! goes through the same `FromStr` parsers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BlendError;

/// Normalize a host-side option name: lowercase, `-`/space → `_`.
fn normalize(name: &str) -> String {
    name.trim()
        .to_ascii_lowercase()
        .replace(['-', ' '], "_")
}

/// Base shape of the blend curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum CurveFamily {
    #[default]
    Linear,
    EaseIn,
    EaseOut,
    Sigmoid,
    /// Piecewise-linear through caller-supplied control points.
    Custom,
    /// Hard switch at the midpoint.
    Step,
}

impl CurveFamily {
    pub const ALL: [CurveFamily; 6] = [
        CurveFamily::Linear,
        CurveFamily::EaseIn,
        CurveFamily::EaseOut,
        CurveFamily::Sigmoid,
        CurveFamily::Custom,
        CurveFamily::Step,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CurveFamily::Linear => "linear",
            CurveFamily::EaseIn => "ease_in",
            CurveFamily::EaseOut => "ease_out",
            CurveFamily::Sigmoid => "sigmoid",
            CurveFamily::Custom => "custom",
            CurveFamily::Step => "step",
        }
    }
}

impl FromStr for CurveFamily {
    type Err = BlendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "linear" => Ok(CurveFamily::Linear),
            "ease_in" => Ok(CurveFamily::EaseIn),
            "ease_out" => Ok(CurveFamily::EaseOut),
            "sigmoid" => Ok(CurveFamily::Sigmoid),
            "custom" | "custom_curve" => Ok(CurveFamily::Custom),
            "step" => Ok(CurveFamily::Step),
            _ => Err(BlendError::InvalidCurveSpec(format!(
                "unknown curve family '{s}'"
            ))),
        }
    }
}

impl TryFrom<String> for CurveFamily {
    type Error = BlendError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl fmt::Display for CurveFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Policy mapping a complexity score to a curve modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum TuningGoal {
    /// Symmetric response around a score of 1.0.
    #[default]
    Standard,
    /// Smooth inputs get an earlier, stronger high-adapter presence.
    EncourageMotion,
    /// Cluttered inputs get a suppressed high-adapter contribution.
    PreserveDetails,
}

impl TuningGoal {
    pub fn as_str(&self) -> &'static str {
        match self {
            TuningGoal::Standard => "standard",
            TuningGoal::EncourageMotion => "encourage_motion",
            TuningGoal::PreserveDetails => "preserve_details",
        }
    }
}

impl FromStr for TuningGoal {
    type Err = BlendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "standard" | "balanced" => Ok(TuningGoal::Standard),
            "encourage_motion" => Ok(TuningGoal::EncourageMotion),
            "preserve_details" => Ok(TuningGoal::PreserveDetails),
            _ => Err(BlendError::Validation(format!("unknown tuning goal '{s}'"))),
        }
    }
}

impl TryFrom<String> for TuningGoal {
    type Error = BlendError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl fmt::Display for TuningGoal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How (and whether) image complexity modulates the curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum AdaptiveMode {
    #[default]
    Off,
    /// High-frequency energy ratio of the 2-D spectrum.
    FrequencyAnalysis,
    /// Plain luma variance.
    BasicVariance,
}

impl AdaptiveMode {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, AdaptiveMode::Off)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AdaptiveMode::Off => "off",
            AdaptiveMode::FrequencyAnalysis => "frequency_analysis",
            AdaptiveMode::BasicVariance => "basic_variance",
        }
    }
}

impl FromStr for AdaptiveMode {
    type Err = BlendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "off" => Ok(AdaptiveMode::Off),
            "frequency_analysis" => Ok(AdaptiveMode::FrequencyAnalysis),
            "basic_variance" => Ok(AdaptiveMode::BasicVariance),
            _ => Err(BlendError::Validation(format!(
                "unknown adaptive mode '{s}'"
            ))),
        }
    }
}

impl TryFrom<String> for AdaptiveMode {
    type Error = BlendError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl fmt::Display for AdaptiveMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which adapter the schedule moves toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendDirection {
    /// High weight rises 0 → 1.
    #[default]
    LowToHigh,
    /// High weight falls 1 → 0.
    HighToLow,
}

impl BlendDirection {
    pub fn from_invert(invert: bool) -> Self {
        if invert {
            BlendDirection::HighToLow
        } else {
            BlendDirection::LowToHigh
        }
    }

    #[inline]
    pub fn orient(&self, value: f64) -> f64 {
        match self {
            BlendDirection::LowToHigh => value,
            BlendDirection::HighToLow => 1.0 - value,
        }
    }
}

/// Display tag owned by the caller's execution context.
///
/// Kept out of `ScheduleResult`: the schedule is identical whichever
/// mode the host runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// No adapters attached; schedule computed for display only.
    Normal,
    /// Caller asked for a preview; adapters are left untouched.
    Preview,
    /// Schedule is applied to both adapters.
    ActiveBlend,
}

impl ExecutionMode {
    pub fn resolve(preview_only: bool, has_adapters: bool) -> Self {
        if preview_only {
            ExecutionMode::Preview
        } else if has_adapters {
            ExecutionMode::ActiveBlend
        } else {
            ExecutionMode::Normal
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionMode::Normal => "normal",
            ExecutionMode::Preview => "preview",
            ExecutionMode::ActiveBlend => "active_blend",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_host_spellings() {
        assert_eq!("ease-in".parse::<CurveFamily>().unwrap(), CurveFamily::EaseIn);
        assert_eq!("ease_out".parse::<CurveFamily>().unwrap(), CurveFamily::EaseOut);
        assert_eq!(
            "custom_curve".parse::<CurveFamily>().unwrap(),
            CurveFamily::Custom
        );
        assert_eq!("Sigmoid".parse::<CurveFamily>().unwrap(), CurveFamily::Sigmoid);
    }

    #[test]
    fn test_family_unknown_rejected() {
        assert!(matches!(
            "bezier".parse::<CurveFamily>(),
            Err(BlendError::InvalidCurveSpec(_))
        ));
    }

    #[test]
    fn test_family_roundtrip_names() {
        for family in CurveFamily::ALL {
            assert_eq!(family.as_str().parse::<CurveFamily>().unwrap(), family);
        }
    }

    #[test]
    fn test_goal_display_names() {
        assert_eq!(
            "Encourage Motion".parse::<TuningGoal>().unwrap(),
            TuningGoal::EncourageMotion
        );
        assert_eq!(
            "Preserve Details".parse::<TuningGoal>().unwrap(),
            TuningGoal::PreserveDetails
        );
        assert!("turbo".parse::<TuningGoal>().is_err());
    }

    #[test]
    fn test_adaptive_mode_parse() {
        assert_eq!("off".parse::<AdaptiveMode>().unwrap(), AdaptiveMode::Off);
        assert!(!AdaptiveMode::Off.is_enabled());
        assert!("frequency_analysis"
            .parse::<AdaptiveMode>()
            .unwrap()
            .is_enabled());
        assert!("fft".parse::<AdaptiveMode>().is_err());
    }

    #[test]
    fn test_direction_orient() {
        assert_eq!(BlendDirection::from_invert(false).orient(0.25), 0.25);
        assert_eq!(BlendDirection::from_invert(true).orient(0.25), 0.75);
    }

    #[test]
    fn test_execution_mode_resolve() {
        assert_eq!(ExecutionMode::resolve(true, true), ExecutionMode::Preview);
        assert_eq!(ExecutionMode::resolve(false, true), ExecutionMode::ActiveBlend);
        assert_eq!(ExecutionMode::resolve(false, false), ExecutionMode::Normal);
        assert_eq!(ExecutionMode::ActiveBlend.as_str(), "active_blend");
    }

    #[test]
    fn test_serde_snake_case() {
        let json = serde_json::to_string(&TuningGoal::PreserveDetails).unwrap();
        assert_eq!(json, "\"preserve_details\"");
        let back: TuningGoal = serde_json::from_str(&json).unwrap();
        assert_eq!(back, TuningGoal::PreserveDetails);
    }

    #[test]
    fn test_serde_accepts_host_spellings() {
        let family: CurveFamily = serde_json::from_str("\"ease-in\"").unwrap();
        assert_eq!(family, CurveFamily::EaseIn);
        let goal: TuningGoal = serde_json::from_str("\"Preserve Details\"").unwrap();
        assert_eq!(goal, TuningGoal::PreserveDetails);
        let mode: AdaptiveMode = serde_json::from_str("\"Frequency Analysis\"").unwrap();
        assert_eq!(mode, AdaptiveMode::FrequencyAnalysis);
        assert!(serde_json::from_str::<CurveFamily>("\"bezier\"").is_err());
    }
}
