// ─────────────────────────────────────────────────────────────────────
// Adaptive LoRA Scheduler — Blend Kernel Core Engine
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Curve generation, image complexity analysis, adaptive modulation,
//! and schedule assembly for per-step LoRA blending.
//!
//! # Invariants
//!
//! 1. **One weight per step**: every schedule has exactly `steps`
//!    weights, each in [0, 1]. Errors return no partial schedule.
//!
//! 2. **Pure and deterministic**: identical inputs give bit-identical
//!    weights and scores. No component keeps cross-call state; the FFT
//!    plan cache only memoizes plans.
//!
//! 3. **Soft degradation never raises**: a uniform image scores 0.0,
//!    out-of-range modifiers are clamped, bad intensities count as 0.0.
//!
//! 4. **Boundary hold**: steps before / after the active range repeat
//!    the weight at `start_step` / `end_step`.

pub mod assembler;
pub mod complexity;
pub mod curve;
pub mod image;
pub mod modulator;
pub mod scheduler;

pub use assembler::ScheduleAssembler;
pub use complexity::{ComplexityAnalyzer, SpectralEnergy};
pub use curve::{CurveGenerator, CurveSpec};
pub use image::{GrayImage, ImageBatch};
pub use modulator::AdaptiveModulator;
pub use scheduler::{Adaptation, BlendScheduler, ScheduleRequest};
