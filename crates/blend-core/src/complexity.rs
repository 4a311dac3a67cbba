// ─────────────────────────────────────────────────────────────────────
// Adaptive LoRA Scheduler — Complexity Analyzer
// Image(s) → scalar complexity score, ≈1.0 for a typical photograph.
// ─────────────────────────────────────────────────────────────────────
//! Frequency-domain complexity measurement.
//!
//! Each frame is reduced to luma, mean-centred, and transformed with a
//! 2-D FFT (rows, then columns). The score is the share of spectral
//! energy `|X|²` outside a central low-frequency square, divided by the
//! calibration ratio of a typical photograph:
//!
//! ```text
//! score = (E_high / E_total) / complexity_reference_ratio
//! ```
//!
//! Uniform frames carry no energy at all; they score 0.0 instead of
//! propagating 0/0.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use blend_types::{AdaptiveMode, BlendConfig};

use crate::image::{GrayImage, ImageBatch};

/// Below this total energy a frame is treated as flat.
const MIN_SPECTRAL_ENERGY: f64 = 1e-18;

/// Spectral energy split of one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectralEnergy {
    pub low: f64,
    pub high: f64,
}

impl SpectralEnergy {
    pub fn total(&self) -> f64 {
        self.low + self.high
    }

    /// `high / total`, or 0.0 for a flat spectrum.
    pub fn high_ratio(&self) -> f64 {
        let total = self.total();
        if !(total > MIN_SPECTRAL_ENERGY) {
            return 0.0;
        }
        self.high / total
    }
}

/// Per-size forward FFT plans.
struct FftPlanCache {
    planner: FftPlanner<f64>,
    plans: HashMap<usize, Arc<dyn Fft<f64>>>,
}

impl FftPlanCache {
    fn new() -> Self {
        Self {
            planner: FftPlanner::new(),
            plans: HashMap::new(),
        }
    }

    fn forward(&mut self, size: usize) -> Arc<dyn Fft<f64>> {
        if let Some(fft) = self.plans.get(&size) {
            return Arc::clone(fft);
        }
        let fft = self.planner.plan_fft_forward(size);
        self.plans.insert(size, Arc::clone(&fft));
        fft
    }
}

/// Image complexity analyzer.
///
/// Thread-safe: the FFT plan cache is guarded by a `parking_lot::Mutex`
/// and never influences results.
pub struct ComplexityAnalyzer {
    config: BlendConfig,
    plans: Mutex<FftPlanCache>,
}

impl ComplexityAnalyzer {
    pub fn new(config: BlendConfig) -> Self {
        Self {
            config,
            plans: Mutex::new(FftPlanCache::new()),
        }
    }

    /// Mean complexity over (up to `max_analysis_frames`) frames.
    ///
    /// `AdaptiveMode::Off` scores 0.0 without touching the pixels.
    pub fn score(&self, images: &ImageBatch, mode: AdaptiveMode) -> f64 {
        if !mode.is_enabled() {
            return 0.0;
        }
        let indices = images.sample_indices(self.config.max_analysis_frames);
        log::debug!(
            "complexity analysis: {} frames at {}x{}, sampling {}, mode={mode}",
            images.frames(),
            images.width(),
            images.height(),
            indices.len()
        );

        let mut total = 0.0;
        for &i in &indices {
            let frame_score = match images.gray_frame(i) {
                Ok(gray) => self.score_frame(&gray, mode),
                Err(e) => {
                    log::warn!("complexity analysis: skipping frame {i}: {e}");
                    0.0
                }
            };
            log::debug!("complexity analysis: frame {i} score={frame_score:.4}");
            total += frame_score;
        }
        let score = total / indices.len() as f64;
        log::debug!("complexity analysis: mean score={score:.4}");
        score
    }

    /// Frequency-analysis score of a single grayscale grid.
    pub fn score_gray(&self, image: &GrayImage) -> f64 {
        self.score_frame(image, AdaptiveMode::FrequencyAnalysis)
    }

    fn score_frame(&self, image: &GrayImage, mode: AdaptiveMode) -> f64 {
        if !image.is_finite() {
            log::warn!("complexity analysis: non-finite pixels, scoring 0.0");
            return 0.0;
        }
        if image.is_uniform() {
            return 0.0;
        }
        let score = match mode {
            AdaptiveMode::Off => 0.0,
            AdaptiveMode::FrequencyAnalysis => {
                self.band_energy(image).high_ratio() / self.config.complexity_reference_ratio
            }
            AdaptiveMode::BasicVariance => image.variance() / self.config.variance_reference,
        };
        if score.is_finite() {
            score.max(0.0)
        } else {
            log::warn!("complexity analysis: non-finite score, scoring 0.0");
            0.0
        }
    }

    /// Split the mean-centred spectrum into low and high bands.
    ///
    /// The low band is the square of signed frequencies
    /// `fy, fx ∈ [-r, r)` with `r = max(1, min(h, w) / low_band_divisor)`,
    /// i.e. the centre square of an fft-shifted spectrum.
    pub fn band_energy(&self, image: &GrayImage) -> SpectralEnergy {
        let (w, h) = (image.width(), image.height());
        let radius = (w.min(h) / self.config.low_band_divisor).max(1) as i64;

        let mean = image.mean();
        let mut rows: Vec<Complex<f64>> = image
            .pixels()
            .iter()
            .map(|&p| Complex::new(p - mean, 0.0))
            .collect();

        let (row_fft, col_fft) = {
            let mut plans = self.plans.lock();
            (plans.forward(w), plans.forward(h))
        };

        // Rows: buffer holds h chunks of length w.
        row_fft.process(&mut rows);

        // Columns: transpose to w chunks of length h.
        let mut cols = vec![Complex::new(0.0, 0.0); w * h];
        for y in 0..h {
            for x in 0..w {
                cols[x * h + y] = rows[y * w + x];
            }
        }
        col_fft.process(&mut cols);

        let mut energy = SpectralEnergy { low: 0.0, high: 0.0 };
        for x in 0..w {
            let fx = signed_frequency(x, w);
            let x_low = (-radius..radius).contains(&fx);
            for y in 0..h {
                let e = cols[x * h + y].norm_sqr();
                let fy = signed_frequency(y, h);
                if x_low && (-radius..radius).contains(&fy) {
                    energy.low += e;
                } else {
                    energy.high += e;
                }
            }
        }
        energy
    }
}

impl Default for ComplexityAnalyzer {
    fn default() -> Self {
        Self::new(BlendConfig::default())
    }
}

/// FFT bin index → signed frequency in `[-n/2, (n-1)/2]`.
#[inline]
fn signed_frequency(k: usize, n: usize) -> i64 {
    if k <= (n - 1) / 2 {
        k as i64
    } else {
        k as i64 - n as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic pseudo-random texture (LCG).
    fn noise_image(size: usize, seed: u64) -> GrayImage {
        let mut state = seed;
        GrayImage::from_fn(size, size, |_, _| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            ((state >> 33) as f64) / (1u64 << 31) as f64
        })
        .unwrap()
    }

    fn gradient_image(size: usize) -> GrayImage {
        GrayImage::from_fn(size, size, |x, _| x as f64 / size as f64).unwrap()
    }

    #[test]
    fn test_signed_frequency() {
        let even: Vec<i64> = (0..8).map(|k| signed_frequency(k, 8)).collect();
        assert_eq!(even, vec![0, 1, 2, 3, -4, -3, -2, -1]);
        let odd: Vec<i64> = (0..5).map(|k| signed_frequency(k, 5)).collect();
        assert_eq!(odd, vec![0, 1, 2, -2, -1]);
    }

    #[test]
    fn test_uniform_image_scores_zero() {
        let analyzer = ComplexityAnalyzer::default();
        let flat = GrayImage::new(16, 16, vec![0.37; 256]).unwrap();
        assert_eq!(analyzer.score_gray(&flat), 0.0);
        let batch = ImageBatch::from_gray(&flat);
        assert_eq!(analyzer.score(&batch, AdaptiveMode::FrequencyAnalysis), 0.0);
        assert_eq!(analyzer.score(&batch, AdaptiveMode::BasicVariance), 0.0);
    }

    #[test]
    fn test_noise_scores_above_neutral() {
        let analyzer = ComplexityAnalyzer::default();
        let score = analyzer.score_gray(&noise_image(64, 7));
        // White noise spreads energy evenly: ~15/16 outside the band.
        assert!(score > 3.0, "noise score {score}");
    }

    #[test]
    fn test_gradient_scores_below_noise() {
        let analyzer = ComplexityAnalyzer::default();
        let smooth = analyzer.score_gray(&gradient_image(64));
        let noisy = analyzer.score_gray(&noise_image(64, 11));
        assert!(smooth < noisy);
        assert!(smooth < 1.0, "gradient score {smooth}");
    }

    #[test]
    fn test_energy_conserved() {
        // Parseval: sum |X|^2 = N * sum |x - mean|^2
        let analyzer = ComplexityAnalyzer::default();
        let img = noise_image(16, 3);
        let energy = analyzer.band_energy(&img);
        let n = (img.width() * img.height()) as f64;
        let spatial = img.variance() * n * n;
        assert!((energy.total() - spatial).abs() / spatial < 1e-9);
    }

    #[test]
    fn test_deterministic() {
        let analyzer = ComplexityAnalyzer::default();
        let img = noise_image(32, 5);
        let a = analyzer.score_gray(&img);
        let b = analyzer.score_gray(&img);
        assert_eq!(a.to_bits(), b.to_bits());
    }

    #[test]
    fn test_non_square_image() {
        let analyzer = ComplexityAnalyzer::default();
        let img = GrayImage::from_fn(48, 20, |x, y| ((x * 7 + y * 13) % 5) as f64 / 5.0).unwrap();
        let score = analyzer.score_gray(&img);
        assert!(score.is_finite() && score > 0.0);
    }

    #[test]
    fn test_frames_reduce_by_mean() {
        let analyzer = ComplexityAnalyzer::default();
        let noisy = noise_image(16, 9);
        let flat = GrayImage::new(16, 16, vec![0.5; 256]).unwrap();

        let mut data: Vec<f32> = noisy.pixels().iter().map(|&p| p as f32).collect();
        data.extend(flat.pixels().iter().map(|&p| p as f32));
        let batch = ImageBatch::new(2, 16, 16, 1, data).unwrap();

        let single = analyzer.score_gray(&noisy);
        let combined = analyzer.score(&batch, AdaptiveMode::FrequencyAnalysis);
        assert!((combined - single / 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_basic_variance_mode() {
        let analyzer = ComplexityAnalyzer::default();
        let img = GrayImage::new(2, 2, vec![0.0, 1.0, 0.0, 1.0]).unwrap();
        let batch = ImageBatch::from_gray(&img);
        // variance 0.25 / reference 0.05
        let score = analyzer.score(&batch, AdaptiveMode::BasicVariance);
        assert!((score - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_off_mode_scores_zero() {
        let analyzer = ComplexityAnalyzer::default();
        let batch = ImageBatch::from_gray(&noise_image(8, 1));
        assert_eq!(analyzer.score(&batch, AdaptiveMode::Off), 0.0);
    }

    #[test]
    fn test_non_finite_pixels_degrade() {
        let analyzer = ComplexityAnalyzer::default();
        let img = GrayImage::new(2, 1, vec![0.0, f64::NAN]).unwrap();
        assert_eq!(analyzer.score_gray(&img), 0.0);
    }
}
