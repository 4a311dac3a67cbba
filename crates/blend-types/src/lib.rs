// ─────────────────────────────────────────────────────────────────────
// Adaptive LoRA Scheduler — Blend Kernel Types
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Type definitions, calibration configuration, and error hierarchy
//! for the Blend Kernel, the per-step LoRA blend schedule engine.

pub mod config;
pub mod error;
pub mod options;
pub mod schedule;

pub use config::BlendConfig;
pub use error::{BlendError, BlendResult};
pub use options::{AdaptiveMode, BlendDirection, CurveFamily, ExecutionMode, TuningGoal};
pub use schedule::{clamp_weight, SamplePoint, ScheduleResult, StepRange};
