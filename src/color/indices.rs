//! Per-pixel color indices
//!
//! All indices work on 8-bit sRGB channel values without linearisation, the
//! scale the detection thresholds in [`crate::config`] are expressed in.

use palette::Srgb;

use crate::calibration::SkinTone;
use crate::constants::skin;

/// Mean of the three channels, 0-255
#[inline]
pub fn brightness(px: Srgb<u8>) -> f64 {
    (px.red as f64 + px.green as f64 + px.blue as f64) / 3.0
}

/// Erythema index `R - (G + B) / 2`
#[inline]
pub fn redness(px: Srgb<u8>) -> f64 {
    px.red as f64 - (px.green as f64 + px.blue as f64) / 2.0
}

/// Rec. 601 luma used for gradient computation
#[inline]
pub fn luminance(px: Srgb<u8>) -> f64 {
    0.299 * px.red as f64 + 0.587 * px.green as f64 + 0.114 * px.blue as f64
}

/// Sum of absolute per-channel differences from the skin tone
#[inline]
pub fn skin_distance(px: Srgb<u8>, tone: &SkinTone) -> f64 {
    (px.red as f64 - tone.r).abs() + (px.green as f64 - tone.g).abs() + (px.blue as f64 - tone.b).abs()
}

/// Rule-based skin classifier for well-lit RGB
#[inline]
pub fn is_skin(px: Srgb<u8>) -> bool {
    let (r, g, b) = (px.red, px.green, px.blue);
    r > skin::MIN_RED
        && g > skin::MIN_GREEN
        && b > skin::MIN_BLUE
        && r > g
        && r > b
        && (r as i32 - g as i32).abs() > skin::MIN_RED_GREEN_SPREAD
}

/// Brown hue test: red above blue and green above `ratio` times blue
#[inline]
pub fn is_brown(px: Srgb<u8>, ratio: f64) -> bool {
    px.red > px.blue && px.green as f64 > ratio * px.blue as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brightness_and_redness() {
        let px = Srgb::new(220u8, 60, 60);
        assert!((brightness(px) - 340.0 / 3.0).abs() < 1e-9);
        assert_eq!(redness(px), 160.0);
        assert_eq!(redness(Srgb::new(10u8, 200, 200)), -190.0);
    }

    #[test]
    fn test_luminance_of_white() {
        assert!((luminance(Srgb::new(255u8, 255, 255)) - 255.0).abs() < 1e-9);
        assert_eq!(luminance(Srgb::new(0u8, 0, 0)), 0.0);
    }

    #[test]
    fn test_skin_distance() {
        let tone = SkinTone::new(200.0, 150.0, 130.0);
        assert_eq!(skin_distance(Srgb::new(200, 150, 130), &tone), 0.0);
        assert_eq!(skin_distance(Srgb::new(220, 60, 60), &tone), 180.0);
    }

    #[test]
    fn test_skin_rule() {
        assert!(is_skin(Srgb::new(200, 150, 130)));
        // Grey fails r > g
        assert!(!is_skin(Srgb::new(150, 150, 150)));
        // Too dark
        assert!(!is_skin(Srgb::new(90, 50, 30)));
        // Red and green too close
        assert!(!is_skin(Srgb::new(200, 190, 130)));
    }

    #[test]
    fn test_brown_rule() {
        assert!(is_brown(Srgb::new(150, 110, 80), 1.1));
        assert!(!is_brown(Srgb::new(150, 85, 80), 1.1));
        assert!(!is_brown(Srgb::new(70, 110, 80), 1.1));
    }
}
