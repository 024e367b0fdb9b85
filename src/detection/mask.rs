//! Per-pixel candidate masks
//!
//! Each condition has its own predicate over a pixel's color and the
//! baseline skin tone. Predicates run over a [`Window`] of the image (the
//! interior of the frame, or a padded box in hybrid mode) and produce a
//! [`BinaryMask`] in the window's local coordinates.

use palette::Srgb;

use crate::calibration::SkinTone;
use crate::color::{brightness, is_brown, redness, skin_distance};
use crate::config::{
    AcneCandidateConfig, AdaptiveComedonalRule, AdaptiveInflammatoryRule, BrightSpotRule,
    DarkSpotRule, InflammatoryRule, PigmentationConfig,
};
use crate::detection::hybrid::LabelBias;
use crate::image_loader::PixelBuffer;

/// Half-open rectangle `[x0, x0 + width) x [y0, y0 + height)` of an image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub x0: u32,
    pub y0: u32,
    pub width: u32,
    pub height: u32,
}

impl Window {
    /// The whole image
    pub fn full(image: &PixelBuffer) -> Self {
        Self {
            x0: 0,
            y0: 0,
            width: image.width(),
            height: image.height(),
        }
    }

    /// The image without a `margin` pixel band along each edge (may be empty)
    pub fn interior(image: &PixelBuffer, margin: u32) -> Self {
        Self {
            x0: margin.min(image.width()),
            y0: margin.min(image.height()),
            width: image.width().saturating_sub(2 * margin),
            height: image.height().saturating_sub(2 * margin),
        }
    }

    /// Window spanning `[x0, x1) x [y0, y1)`
    pub fn from_bounds(x0: u32, y0: u32, x1: u32, y1: u32) -> Self {
        Self {
            x0,
            y0,
            width: x1.saturating_sub(x0),
            height: y1.saturating_sub(y0),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Boolean arena over a window, indexed `ly * width + lx`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryMask {
    window: Window,
    bits: Vec<bool>,
}

impl BinaryMask {
    /// All-clear mask
    pub fn new(window: Window) -> Self {
        Self {
            window,
            bits: vec![false; window.area()],
        }
    }

    /// Evaluate `predicate` at every window pixel (global coordinates)
    pub fn from_fn(window: Window, mut predicate: impl FnMut(u32, u32) -> bool) -> Self {
        let mut bits = Vec::with_capacity(window.area());
        for ly in 0..window.height {
            for lx in 0..window.width {
                bits.push(predicate(window.x0 + lx, window.y0 + ly));
            }
        }
        Self { window, bits }
    }

    pub fn window(&self) -> Window {
        self.window
    }

    pub fn width(&self) -> u32 {
        self.window.width
    }

    pub fn height(&self) -> u32 {
        self.window.height
    }

    #[inline]
    pub fn index(&self, lx: u32, ly: u32) -> usize {
        ly as usize * self.window.width as usize + lx as usize
    }

    /// Whether local coordinates fall inside the window
    #[inline]
    pub fn contains_local(&self, lx: i64, ly: i64) -> bool {
        lx >= 0 && ly >= 0 && lx < self.window.width as i64 && ly < self.window.height as i64
    }

    /// Bit at local coordinates; out-of-window reads are clear
    #[inline]
    pub fn get(&self, lx: i64, ly: i64) -> bool {
        self.contains_local(lx, ly) && self.bits[self.index(lx as u32, ly as u32)]
    }

    #[inline]
    pub fn set(&mut self, lx: u32, ly: u32, value: bool) {
        let i = self.index(lx, ly);
        self.bits[i] = value;
    }

    /// Bit by local flat index
    #[inline]
    pub fn at(&self, index: usize) -> bool {
        self.bits[index]
    }

    /// Number of set pixels
    pub fn count(&self) -> usize {
        self.bits.iter().filter(|b| **b).count()
    }

    /// Clear every pixel marked in the image-sized `claimed` arena
    pub fn clear_claimed(&mut self, claimed: &[bool], image_width: u32) {
        let w = self.window;
        for ly in 0..w.height {
            for lx in 0..w.width {
                let global = (w.y0 + ly) as usize * image_width as usize + (w.x0 + lx) as usize;
                if claimed[global] {
                    self.set(lx, ly, false);
                }
            }
        }
    }
}

impl InflammatoryRule {
    pub fn matches(&self, px: Srgb<u8>, tone: &SkinTone) -> bool {
        let b = brightness(px);
        redness(px) > self.min_redness
            && b >= self.min_brightness
            && b <= self.max_brightness
            && skin_distance(px, tone) > self.min_skin_distance
    }
}

impl DarkSpotRule {
    pub fn matches(&self, px: Srgb<u8>, tone: &SkinTone) -> bool {
        brightness(px) < self.max_brightness
            && (px.red as f64) < tone.r - self.min_red_deficit
            && skin_distance(px, tone) > self.min_skin_distance
    }
}

impl BrightSpotRule {
    pub fn matches(&self, px: Srgb<u8>, tone: &SkinTone) -> bool {
        brightness(px) > self.min_brightness
            && redness(px) > self.min_redness
            && skin_distance(px, tone) > self.min_skin_distance
    }
}

impl AcneCandidateConfig {
    /// Any of the inflammatory, comedonal or bright rules
    pub fn matches(&self, px: Srgb<u8>, tone: &SkinTone) -> bool {
        self.inflammatory.matches(px, tone)
            || self.comedonal.matches(px, tone)
            || self.bright.matches(px, tone)
    }
}

impl PigmentationConfig {
    /// Darker than the skin by the margin and brown in hue
    pub fn matches(&self, px: Srgb<u8>, tone: &SkinTone) -> bool {
        brightness(px) < tone.brightness() - self.min_darkening
            && is_brown(px, self.brown_green_blue_ratio)
    }
}

impl AdaptiveInflammatoryRule {
    pub fn matches(&self, px: Srgb<u8>, tone: &SkinTone) -> bool {
        let b = brightness(px);
        redness(px) > self.min_redness
            && b >= self.min_brightness
            && b <= self.max_brightness
            && skin_distance(px, tone) > self.min_skin_distance
    }
}

impl AdaptiveComedonalRule {
    pub fn matches(&self, px: Srgb<u8>, tone: &SkinTone) -> bool {
        let b = brightness(px);
        (b < self.dark_below || b > self.bright_above)
            && skin_distance(px, tone) > self.min_skin_distance
    }
}

/// Acne lesion candidates over `window`
pub fn acne_mask(
    image: &PixelBuffer,
    window: Window,
    rules: &AcneCandidateConfig,
    tone: &SkinTone,
) -> BinaryMask {
    BinaryMask::from_fn(window, |x, y| rules.matches(image.rgb(x, y), tone))
}

/// Dark comedonal candidates only (pore detection)
pub fn dark_spot_mask(
    image: &PixelBuffer,
    window: Window,
    rule: &DarkSpotRule,
    tone: &SkinTone,
) -> BinaryMask {
    BinaryMask::from_fn(window, |x, y| rule.matches(image.rgb(x, y), tone))
}

/// Hyperpigmentation candidates over `window`
pub fn pigmentation_mask(
    image: &PixelBuffer,
    window: Window,
    rules: &PigmentationConfig,
    tone: &SkinTone,
) -> BinaryMask {
    BinaryMask::from_fn(window, |x, y| rules.matches(image.rgb(x, y), tone))
}

/// Class-aware mask inside a rough box, relative to the box's local tone
pub fn adaptive_mask(
    image: &PixelBuffer,
    window: Window,
    bias: LabelBias,
    inflammatory: &AdaptiveInflammatoryRule,
    comedonal: &AdaptiveComedonalRule,
    local_tone: &SkinTone,
) -> BinaryMask {
    match bias {
        LabelBias::Inflammatory => BinaryMask::from_fn(window, |x, y| {
            inflammatory.matches(image.rgb(x, y), local_tone)
        }),
        LabelBias::Comedonal => {
            BinaryMask::from_fn(window, |x, y| comedonal.matches(image.rgb(x, y), local_tone))
        }
    }
}
