//! Baseline skin tone estimation
//!
//! Samples the central 30% x 30% window of the frame, where the face is
//! assumed to be, and averages the pixels a rule-based skin classifier
//! accepts.

use palette::Srgb;
use serde::{Deserialize, Serialize};

use crate::color::{is_skin, skin_distance};
use crate::constants::skin::{DEFAULT_SKIN_TONE, SAMPLE_END, SAMPLE_START};
use crate::image_loader::PixelBuffer;

/// Mean skin color, channels in 0-255
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkinTone {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl SkinTone {
    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// Mean of the three channels
    pub fn brightness(&self) -> f64 {
        (self.r + self.g + self.b) / 3.0
    }
}

impl Default for SkinTone {
    fn default() -> Self {
        let [r, g, b] = DEFAULT_SKIN_TONE;
        Self { r, g, b }
    }
}

impl From<Srgb<u8>> for SkinTone {
    fn from(px: Srgb<u8>) -> Self {
        Self::new(px.red as f64, px.green as f64, px.blue as f64)
    }
}

/// Running RGB mean over accepted pixels
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ToneAccumulator {
    sum: [f64; 3],
    count: usize,
}

impl ToneAccumulator {
    pub(crate) fn push(&mut self, px: Srgb<u8>) {
        self.sum[0] += px.red as f64;
        self.sum[1] += px.green as f64;
        self.sum[2] += px.blue as f64;
        self.count += 1;
    }

    /// Mean color, or `None` when nothing was accepted
    pub(crate) fn mean(&self) -> Option<SkinTone> {
        if self.count == 0 {
            return None;
        }
        let n = self.count as f64;
        Some(SkinTone::new(self.sum[0] / n, self.sum[1] / n, self.sum[2] / n))
    }
}

/// Samples the frame centre for a baseline skin tone
#[derive(Debug, Clone, Copy, Default)]
pub struct SkinToneEstimator;

impl SkinToneEstimator {
    pub fn new() -> Self {
        Self
    }

    /// Estimate the skin tone of `image`
    ///
    /// Falls back to [`SkinTone::default`] (200, 150, 130) when no pixel of
    /// the sampling window qualifies as skin.
    pub fn estimate(&self, image: &PixelBuffer) -> SkinTone {
        let (width, height) = (image.width() as f64, image.height() as f64);
        // Both window ends are inclusive
        let x0 = (width * SAMPLE_START) as u32;
        let x1 = ((width * SAMPLE_END) as u32).min(image.width() - 1);
        let y0 = (height * SAMPLE_START) as u32;
        let y1 = ((height * SAMPLE_END) as u32).min(image.height() - 1);

        let mut acc = ToneAccumulator::default();
        for y in y0..=y1 {
            for x in x0..=x1 {
                let px = image.rgb(x, y);
                if is_skin(px) {
                    acc.push(px);
                }
            }
        }

        match acc.mean() {
            Some(tone) => {
                tracing::debug!(
                    samples = acc.count,
                    brightness = tone.brightness(),
                    "skin tone sampled"
                );
                tone
            }
            None => {
                tracing::debug!("no skin pixels in sample window, using default tone");
                SkinTone::default()
            }
        }
    }
}

/// Average of patch pixels close to a reference tone, for local adaptation
pub(crate) fn local_tone(
    image: &PixelBuffer,
    x_range: std::ops::Range<u32>,
    y_range: std::ops::Range<u32>,
    reference: &SkinTone,
    tolerance: f64,
) -> SkinTone {
    let mut acc = ToneAccumulator::default();
    for y in y_range {
        for x in x_range.clone() {
            let px = image.rgb(x, y);
            if skin_distance(px, reference) <= tolerance {
                acc.push(px);
            }
        }
    }
    acc.mean().unwrap_or(*reference)
}

/// Brightness of a tone, guarded for use as a divisor
pub(crate) fn safe_brightness(tone: &SkinTone) -> Option<f64> {
    let b = tone.brightness();
    (b > 0.0).then_some(b)
}
