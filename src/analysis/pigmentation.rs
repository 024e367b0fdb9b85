//! Hyperpigmentation analysis
//!
//! Two independent measurements:
//!
//! - The Skin Hyperpigmentation Index (SHI), a weighted brightness histogram
//!   over the whole frame where darker buckets weigh more.
//! - Brown spots segmented like acne candidates, giving spot count, density,
//!   coverage and mean darkening against the skin tone.

use serde::{Deserialize, Serialize};

use crate::analysis::severity::{Severity, SeverityGrader};
use crate::calibration::{CalibrationData, SkinTone};
use crate::color::brightness;
use crate::config::AnalysisConfig;
use crate::constants::histogram::{bucket_weight, BUCKETS, SHI_SCALE};
use crate::detection::mask::{pigmentation_mask, Window};
use crate::detection::{BoundingBox, CenterPoint, MorphologyFilter, RegionSegmenter};
use crate::image_loader::PixelBuffer;

/// 256-bucket brightness histogram
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistogramScorer {
    buckets: [u64; BUCKETS],
    total: u64,
}

impl HistogramScorer {
    /// Histogram of every pixel's brightness
    pub fn from_image(image: &PixelBuffer) -> Self {
        let mut buckets = [0u64; BUCKETS];
        for i in 0..image.pixel_count() {
            let bucket = (brightness(image.rgb_at(i)) as usize).min(BUCKETS - 1);
            buckets[bucket] += 1;
        }
        Self {
            buckets,
            total: image.pixel_count() as u64,
        }
    }

    pub fn buckets(&self) -> &[u64; BUCKETS] {
        &self.buckets
    }

    /// `Σ count·weight / total / 100`; zero for an empty histogram
    pub fn shi(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let weighted: u64 = self
            .buckets
            .iter()
            .enumerate()
            .map(|(i, count)| count * bucket_weight(i))
            .sum();
        weighted as f64 / self.total as f64 / SHI_SCALE
    }
}

/// One brown spot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PigmentedRegion {
    pub bbox: BoundingBox,
    /// Pixel count
    pub area: usize,
    pub area_mm2: f64,
    /// Mean of skin brightness minus pixel brightness
    pub intensity_diff: f64,
    pub center: CenterPoint,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PigmentationMetrics {
    /// Spot pixels as a percentage of analysed pixels
    pub pigmented_percent: f64,
    pub avg_intensity_diff: f64,
    pub shi: f64,
    pub spot_count: usize,
    /// Spots per cm²
    pub spot_density: f64,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PigmentationAnalysis {
    pub metrics: PigmentationMetrics,
    pub regions: Vec<PigmentedRegion>,
}

pub struct PigmentationAnalyzer<'a> {
    config: &'a AnalysisConfig,
}

impl<'a> PigmentationAnalyzer<'a> {
    pub fn new(config: &'a AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn analyze(
        &self,
        image: &PixelBuffer,
        calibration: &CalibrationData,
        tone: SkinTone,
    ) -> PigmentationAnalysis {
        let pig = &self.config.pigmentation;
        let seg = &self.config.segmentation;
        let skin_brightness = tone.brightness();

        let shi = HistogramScorer::from_image(image).shi();

        let window = Window::interior(image, seg.border_margin);
        let mask = pigmentation_mask(image, window, pig, &tone);
        let cleaned = MorphologyFilter::new(seg.erosion_min_neighbors).apply(&mask);
        let spots = RegionSegmenter::new(pig.max_region_pixels, pig.min_region_pixels)
            .segment(&cleaned, image);

        let mut spot_pixels = 0usize;
        let mut diff_sum = 0.0;
        let regions: Vec<PigmentedRegion> = spots
            .iter()
            .map(|spot| {
                let diff: f64 = spot
                    .pixels
                    .iter()
                    .map(|p| skin_brightness - brightness(image.rgb(p.x, p.y)))
                    .sum();
                spot_pixels += spot.area();
                diff_sum += diff;
                let (cx, cy) = spot.centroid();
                PigmentedRegion {
                    bbox: spot.bbox,
                    area: spot.area(),
                    area_mm2: calibration.area_mm2(spot.area() as f64),
                    intensity_diff: diff / spot.area() as f64,
                    center: CenterPoint { x: cx, y: cy },
                }
            })
            .collect();

        let analysed = window.area();
        let pigmented_percent = if analysed == 0 {
            0.0
        } else {
            spot_pixels as f64 / analysed as f64 * 100.0
        };
        let avg_intensity_diff = if spot_pixels == 0 {
            0.0
        } else {
            diff_sum / spot_pixels as f64
        };
        let frame_cm2 = calibration.rect_area_cm2(image.width() as f64, image.height() as f64);
        let spot_density = if frame_cm2 > 0.0 {
            regions.len() as f64 / frame_cm2
        } else {
            0.0
        };

        let severity = SeverityGrader::new(&self.config.severity)
            .pigmentation(pigmented_percent, avg_intensity_diff);

        tracing::debug!(
            spots = regions.len(),
            pigmented_percent,
            shi,
            "pigmentation measured"
        );

        PigmentationAnalysis {
            metrics: PigmentationMetrics {
                pigmented_percent,
                avg_intensity_diff,
                shi,
                spot_count: regions.len(),
                spot_density,
                severity,
            },
            regions,
        }
    }
}
