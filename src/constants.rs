//! Fixed reference values for skin analysis
//!
//! Structural constants that are part of the measurement model rather than
//! tunable detection thresholds. Thresholds live in [`crate::config`].

/// Physical scale heuristics used when no reference object is available
pub mod calibration {
    /// Fraction of the frame width a face typically occupies
    pub const FACE_FRAME_FRACTION: f64 = 0.5;

    /// Average adult face width in millimetres
    pub const FACE_WIDTH_MM: f64 = 100.0;

    /// Reference coin diameter when the caller does not give one
    pub const COIN_DIAMETER_MM: f64 = 25.0;

    /// Reference fingertip width when the caller does not give one
    pub const FINGER_WIDTH_MM: f64 = 20.0;

    /// Square millimetres per square centimetre
    pub const MM2_PER_CM2: f64 = 100.0;
}

/// Baseline skin tone sampling
pub mod skin {
    /// Fallback skin tone when no sampled pixel qualifies as skin
    pub const DEFAULT_SKIN_TONE: [f64; 3] = [200.0, 150.0, 130.0];

    /// Central sampling window, as fractions of width and height
    pub const SAMPLE_START: f64 = 0.35;
    pub const SAMPLE_END: f64 = 0.65;

    /// Skin qualification rule: r > 95, g > 40, b > 20 and |r - g| > 15
    pub const MIN_RED: u8 = 95;
    pub const MIN_GREEN: u8 = 40;
    pub const MIN_BLUE: u8 = 20;
    pub const MIN_RED_GREEN_SPREAD: i32 = 15;
}

/// Anatomical region layout, fractions of image width/height `(x0, y0, x1, y1)`
///
/// Assumes a frontal face centred in the upper part of the frame.
pub mod roi {
    pub const FOREHEAD: [f64; 4] = [0.30, 0.10, 0.70, 0.25];
    pub const LEFT_CHEEK: [f64; 4] = [0.15, 0.40, 0.38, 0.65];
    pub const RIGHT_CHEEK: [f64; 4] = [0.62, 0.40, 0.85, 0.65];
    pub const CHIN: [f64; 4] = [0.38, 0.72, 0.62, 0.88];
}

/// Skin hyperpigmentation index histogram
pub mod histogram {
    /// Number of brightness buckets
    pub const BUCKETS: usize = 256;

    /// Darker buckets weigh more: 4 below 64, 3 below 128, 2 below 192, else 1
    pub const fn bucket_weight(bucket: usize) -> u64 {
        if bucket < 64 {
            4
        } else if bucket < 128 {
            3
        } else if bucket < 192 {
            2
        } else {
            1
        }
    }

    /// Final divisor applied after normalising by pixel count
    pub const SHI_SCALE: f64 = 100.0;
}

/// Wrinkle measurement units
pub mod wrinkles {
    /// Pixel area unit used for the per-cm² line count
    pub const COUNT_AREA_UNIT_PX: f64 = 10_000.0;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_histogram_weights() {
        assert_eq!(histogram::bucket_weight(0), 4);
        assert_eq!(histogram::bucket_weight(63), 4);
        assert_eq!(histogram::bucket_weight(64), 3);
        assert_eq!(histogram::bucket_weight(191), 2);
        assert_eq!(histogram::bucket_weight(192), 1);
        assert_eq!(histogram::bucket_weight(255), 1);
    }

    #[test]
    fn test_roi_layout_is_inside_frame() {
        for rect in [roi::FOREHEAD, roi::LEFT_CHEEK, roi::RIGHT_CHEEK, roi::CHIN] {
            assert!(rect[0] < rect[2] && rect[1] < rect[3]);
            assert!(rect.iter().all(|f| (0.0..=1.0).contains(f)));
        }
    }

    #[test]
    fn test_sample_window() {
        assert!(skin::SAMPLE_START < skin::SAMPLE_END);
        assert!((skin::SAMPLE_END - skin::SAMPLE_START - 0.30).abs() < 1e-9);
    }
}
