// ─────────────────────────────────────────────────────────────────────
// Adaptive LoRA Scheduler — Image Inputs
// Host image tensors in [frames, height, width, channels] layout.
// ─────────────────────────────────────────────────────────────────────

use blend_types::{BlendError, BlendResult};

/// Rec. 601 luma weights.
const LUMA_R: f64 = 0.299;
const LUMA_G: f64 = 0.587;
const LUMA_B: f64 = 0.114;

/// Element count of a shape, or `InvalidImage` if the product overflows.
fn shape_len(dims: &[usize]) -> BlendResult<usize> {
    dims.iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or_else(|| BlendError::InvalidImage(format!("shape {dims:?} overflows usize")))
}

/// 2-D grayscale intensity grid, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct GrayImage {
    width: usize,
    height: usize,
    pixels: Vec<f64>,
}

impl GrayImage {
    pub fn new(width: usize, height: usize, pixels: Vec<f64>) -> BlendResult<Self> {
        if width == 0 || height == 0 {
            return Err(BlendError::InvalidImage(format!(
                "empty image: {width}x{height}"
            )));
        }
        let expected = shape_len(&[width, height])?;
        if pixels.len() != expected {
            return Err(BlendError::InvalidImage(format!(
                "expected {expected} pixels for {width}x{height}, got {}",
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Build from a generator `f(x, y)`.
    pub fn from_fn(
        width: usize,
        height: usize,
        mut f: impl FnMut(usize, usize) -> f64,
    ) -> BlendResult<Self> {
        let mut pixels = Vec::with_capacity(shape_len(&[width, height])?);
        for y in 0..height {
            for x in 0..width {
                pixels.push(f(x, y));
            }
        }
        Self::new(width, height, pixels)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[f64] {
        &self.pixels
    }

    pub fn mean(&self) -> f64 {
        self.pixels.iter().sum::<f64>() / self.pixels.len() as f64
    }

    /// Population variance.
    pub fn variance(&self) -> f64 {
        let mean = self.mean();
        self.pixels.iter().map(|p| (p - mean) * (p - mean)).sum::<f64>()
            / self.pixels.len() as f64
    }

    /// True when every pixel holds the same value.
    pub fn is_uniform(&self) -> bool {
        match self.pixels.split_first() {
            Some((&first, rest)) => rest.iter().all(|&p| p == first),
            None => true,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.pixels.iter().all(|p| p.is_finite())
    }
}

/// Batch of frames in host tensor layout `[B, H, W, C]`, intensities
/// nominally in [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBatch {
    frames: usize,
    height: usize,
    width: usize,
    channels: usize,
    data: Vec<f32>,
}

impl ImageBatch {
    pub fn new(
        frames: usize,
        height: usize,
        width: usize,
        channels: usize,
        data: Vec<f32>,
    ) -> BlendResult<Self> {
        if frames == 0 || height == 0 || width == 0 {
            return Err(BlendError::InvalidImage(format!(
                "empty batch shape [{frames}, {height}, {width}, {channels}]"
            )));
        }
        if !matches!(channels, 1 | 3 | 4) {
            return Err(BlendError::InvalidImage(format!(
                "unsupported channel count {channels} (expected 1, 3 or 4)"
            )));
        }
        let expected = shape_len(&[frames, height, width, channels])?;
        if data.len() != expected {
            return Err(BlendError::InvalidImage(format!(
                "expected {expected} values for shape [{frames}, {height}, {width}, {channels}], got {}",
                data.len()
            )));
        }
        Ok(Self {
            frames,
            height,
            width,
            channels,
            data,
        })
    }

    /// 8-bit input, rescaled by 1/255.
    pub fn from_u8(
        frames: usize,
        height: usize,
        width: usize,
        channels: usize,
        data: &[u8],
    ) -> BlendResult<Self> {
        let scaled = data.iter().map(|&b| b as f32 / 255.0).collect();
        Self::new(frames, height, width, channels, scaled)
    }

    /// Single grayscale frame.
    pub fn from_gray(image: &GrayImage) -> Self {
        Self {
            frames: 1,
            height: image.height,
            width: image.width,
            channels: 1,
            data: image.pixels.iter().map(|&p| p as f32).collect(),
        }
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Luma of frame `index`; alpha is ignored.
    pub fn gray_frame(&self, index: usize) -> BlendResult<GrayImage> {
        if index >= self.frames {
            return Err(BlendError::InvalidImage(format!(
                "frame {index} out of range for {} frames",
                self.frames
            )));
        }
        let frame_len = self.height * self.width * self.channels;
        let frame = &self.data[index * frame_len..(index + 1) * frame_len];
        let pixels: Vec<f64> = frame
            .chunks_exact(self.channels)
            .map(|px| match self.channels {
                1 => px[0] as f64,
                _ => LUMA_R * px[0] as f64 + LUMA_G * px[1] as f64 + LUMA_B * px[2] as f64,
            })
            .collect();
        GrayImage::new(self.width, self.height, pixels)
    }

    /// Frame indices to analyze: all of them up to `max_frames`, else a
    /// uniform stride from frame 0.
    pub fn sample_indices(&self, max_frames: usize) -> Vec<usize> {
        let max_frames = max_frames.max(1);
        if self.frames <= max_frames {
            return (0..self.frames).collect();
        }
        let stride = self.frames / max_frames;
        (0..self.frames).step_by(stride).take(max_frames).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gray_shape_mismatch() {
        assert!(GrayImage::new(2, 2, vec![0.0; 3]).is_err());
        assert!(GrayImage::new(0, 2, Vec::new()).is_err());
    }

    #[test]
    fn test_gray_stats() {
        let img = GrayImage::new(2, 2, vec![0.0, 1.0, 0.0, 1.0]).unwrap();
        assert!((img.mean() - 0.5).abs() < 1e-12);
        assert!((img.variance() - 0.25).abs() < 1e-12);
        assert!(!img.is_uniform());
        assert!(GrayImage::new(2, 1, vec![0.3, 0.3]).unwrap().is_uniform());
    }

    #[test]
    fn test_batch_shape_validation() {
        assert!(ImageBatch::new(1, 2, 2, 3, vec![0.0; 12]).is_ok());
        assert!(ImageBatch::new(1, 2, 2, 3, vec![0.0; 11]).is_err());
        assert!(ImageBatch::new(1, 2, 2, 2, vec![0.0; 8]).is_err());
        assert!(ImageBatch::new(0, 2, 2, 3, Vec::new()).is_err());
    }

    #[test]
    fn test_oversized_shape_rejected() {
        let err = ImageBatch::new(1, 1 << 32, 1 << 32, 1, Vec::new()).unwrap_err();
        assert!(matches!(err, BlendError::InvalidImage(_)));
        assert!(ImageBatch::new(usize::MAX, 2, 1, 1, Vec::new()).is_err());
        assert!(GrayImage::new(usize::MAX, 2, Vec::new()).is_err());
        assert!(GrayImage::from_fn(usize::MAX, 2, |_, _| 0.0).is_err());
    }

    #[test]
    fn test_luma_conversion() {
        // One pure-red, one pure-green pixel.
        let batch = ImageBatch::new(1, 1, 2, 3, vec![1.0, 0.0, 0.0, 0.0, 1.0, 0.0]).unwrap();
        let gray = batch.gray_frame(0).unwrap();
        assert!((gray.pixels()[0] - 0.299).abs() < 1e-6);
        assert!((gray.pixels()[1] - 0.587).abs() < 1e-6);
    }

    #[test]
    fn test_rgba_ignores_alpha() {
        let batch = ImageBatch::new(1, 1, 1, 4, vec![1.0, 1.0, 1.0, 0.0]).unwrap();
        let gray = batch.gray_frame(0).unwrap();
        assert!((gray.pixels()[0] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_from_u8_scales() {
        let batch = ImageBatch::from_u8(1, 1, 1, 1, &[255]).unwrap();
        assert!((batch.gray_frame(0).unwrap().pixels()[0] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_frame_out_of_range() {
        let batch = ImageBatch::new(2, 1, 1, 1, vec![0.0, 1.0]).unwrap();
        assert!(batch.gray_frame(1).is_ok());
        assert!(batch.gray_frame(2).is_err());
    }

    #[test]
    fn test_sample_indices() {
        let batch = ImageBatch::new(20, 1, 1, 1, vec![0.0; 20]).unwrap();
        assert_eq!(batch.sample_indices(8), vec![0, 2, 4, 6, 8, 10, 12, 14]);
        assert_eq!(batch.sample_indices(32).len(), 20);

        let short = ImageBatch::new(3, 1, 1, 1, vec![0.0; 3]).unwrap();
        assert_eq!(short.sample_indices(8), vec![0, 1, 2]);
    }
}
