//! Enlarged pore counting
//!
//! Pores are small dark specks. They come from the dark-spot predicate
//! without the morphology pass, which would erase them.

use serde::{Deserialize, Serialize};

use crate::calibration::{CalibrationData, SkinTone};
use crate::config::AnalysisConfig;
use crate::detection::mask::{dark_spot_mask, Window};
use crate::detection::{ContourExtractor, RegionSegmenter};
use crate::image_loader::PixelBuffer;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoreMetrics {
    pub pore_count: usize,
    /// Mean pore area in mm²
    pub avg_pore_size: f64,
    /// Pores per cm² of calibrated frame
    pub pore_density: f64,
}

pub struct PoreDetector<'a> {
    config: &'a AnalysisConfig,
}

impl<'a> PoreDetector<'a> {
    pub fn new(config: &'a AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn measure(
        &self,
        image: &PixelBuffer,
        calibration: &CalibrationData,
        tone: SkinTone,
    ) -> PoreMetrics {
        let pores = &self.config.pores;
        let seg = &self.config.segmentation;
        let window = Window::interior(image, seg.border_margin);
        let mask = dark_spot_mask(image, window, &self.config.acne_candidates.comedonal, &tone);

        // A dark component larger than a pore is rejected with all its pixels
        let regions = RegionSegmenter::new(pores.max_pixels, pores.min_pixels.max(2))
            .whole_components_only()
            .segment(&mask, image);
        let extractor = ContourExtractor::new(image, calibration, tone);

        let sizes: Vec<f64> = regions
            .iter()
            .filter_map(|r| extractor.extract(r))
            .filter(|f| f.circularity >= pores.min_circularity)
            .map(|f| f.area_mm2)
            .collect();

        let frame_cm2 = calibration.rect_area_cm2(image.width() as f64, image.height() as f64);
        let pore_count = sizes.len();
        PoreMetrics {
            pore_count,
            avg_pore_size: if pore_count == 0 {
                0.0
            } else {
                sizes.iter().sum::<f64>() / pore_count as f64
            },
            pore_density: if frame_cm2 > 0.0 {
                pore_count as f64 / frame_cm2
            } else {
                0.0
            },
        }
    }
}
