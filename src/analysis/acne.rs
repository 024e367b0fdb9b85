//! Acne analysis
//!
//! ## Pipeline
//!
//! 1. Candidate regions, either refined from external rough boxes
//!    ([`HybridDetector`]) or segmented from the whole-frame candidate mask
//! 2. Classification ([`LesionClassifier`])
//! 3. False-positive filtering and the hard cap ([`FalsePositiveFilter`])
//! 4. ROI density ([`RoiAggregator`]), pore metrics and grading

use serde::{Deserialize, Serialize};

use crate::analysis::filter::FalsePositiveFilter;
use crate::analysis::lesion::{Lesion, LesionClassifier, LesionKind};
use crate::analysis::pores::{PoreDetector, PoreMetrics};
use crate::analysis::roi::{average_density, Roi, RoiAggregator};
use crate::analysis::severity::{Severity, SeverityGrader};
use crate::calibration::{CalibrationData, SkinTone};
use crate::config::AnalysisConfig;
use crate::detection::mask::{acne_mask, Window};
use crate::detection::{
    ContourExtractor, HybridDetector, MorphologyFilter, RegionFeatures, RegionSegmenter, RoughBox,
};
use crate::image_loader::PixelBuffer;

/// Which path produced the lesion candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DetectionMode {
    Hybrid,
    LocalOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcneMetrics {
    pub total_count: usize,
    pub comedones: usize,
    pub whiteheads: usize,
    pub blackheads: usize,
    pub papules: usize,
    pub pustules: usize,
    pub nodules: usize,
    pub inflammatory_count: usize,
    pub inflammatory_percent: f64,
    /// Mean ROI density, lesions per cm²
    pub average_density: f64,
    pub average_redness: f64,
    pub average_redness_percent: f64,
    pub pore_count: usize,
    /// Mean pore area in mm²
    pub avg_pore_size: f64,
    pub pore_density: f64,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcneAnalysis {
    pub metrics: AcneMetrics,
    pub lesions: Vec<Lesion>,
    pub rois: Vec<Roi>,
    pub detection_mode: DetectionMode,
}

pub struct AcneAnalyzer<'a> {
    config: &'a AnalysisConfig,
}

impl<'a> AcneAnalyzer<'a> {
    pub fn new(config: &'a AnalysisConfig) -> Self {
        Self { config }
    }

    /// Detect, classify, filter and grade acne lesions
    ///
    /// `boxes` are rough detections from an external detector; pass an empty
    /// slice for whole-frame segmentation. Boxes that are all unusable lead
    /// to whole-frame segmentation as well.
    pub fn analyze(
        &self,
        image: &PixelBuffer,
        calibration: &CalibrationData,
        tone: SkinTone,
        boxes: &[RoughBox],
    ) -> AcneAnalysis {
        let hybrid = if boxes.is_empty() {
            None
        } else {
            HybridDetector::new(image, calibration, tone, self.config).refine(boxes)
        };
        let (features, detection_mode) = match hybrid {
            Some(features) => (features, DetectionMode::Hybrid),
            None => (
                self.local_features(image, calibration, tone),
                DetectionMode::LocalOnly,
            ),
        };

        let classifier = LesionClassifier::new(&self.config.classification);
        let candidates: Vec<Lesion> = features
            .into_iter()
            .enumerate()
            .map(|(i, f)| classifier.classify(i + 1, f))
            .collect();
        let lesions = FalsePositiveFilter::new(&self.config.false_positive).apply(candidates);

        let rois = RoiAggregator::new(image.width(), image.height(), calibration).aggregate(&lesions);
        let pores = PoreDetector::new(self.config).measure(image, calibration, tone);
        let metrics = self.metrics(&lesions, average_density(&rois), pores);

        tracing::debug!(
            mode = ?detection_mode,
            lesions = lesions.len(),
            severity = %metrics.severity,
            "acne analysed"
        );

        AcneAnalysis {
            metrics,
            lesions,
            rois,
            detection_mode,
        }
    }

    /// Whole-frame candidate mask, morphology, segmentation and features
    pub fn local_features(
        &self,
        image: &PixelBuffer,
        calibration: &CalibrationData,
        tone: SkinTone,
    ) -> Vec<RegionFeatures> {
        let seg = &self.config.segmentation;
        let window = Window::interior(image, seg.border_margin);
        let mask = acne_mask(image, window, &self.config.acne_candidates, &tone);
        let cleaned = MorphologyFilter::new(seg.erosion_min_neighbors).apply(&mask);
        tracing::debug!(
            candidates = mask.count(),
            cleaned = cleaned.count(),
            "acne candidate mask"
        );

        let extractor = ContourExtractor::new(image, calibration, tone);
        RegionSegmenter::new(seg.max_region_pixels, seg.min_region_pixels)
            .segment(&cleaned, image)
            .iter()
            .filter_map(|r| extractor.extract(r))
            .collect()
    }

    fn metrics(&self, lesions: &[Lesion], average_density: f64, pores: PoreMetrics) -> AcneMetrics {
        let count = |kind: LesionKind| lesions.iter().filter(|l| l.kind == kind).count();
        let total_count = lesions.len();
        let inflammatory_count = lesions.iter().filter(|l| l.is_inflammatory).count();
        let mean = |value: fn(&Lesion) -> f64| {
            if total_count == 0 {
                0.0
            } else {
                lesions.iter().map(value).sum::<f64>() / total_count as f64
            }
        };
        let inflammatory_percent = if total_count == 0 {
            0.0
        } else {
            inflammatory_count as f64 / total_count as f64 * 100.0
        };
        let nodules = count(LesionKind::Nodule);

        AcneMetrics {
            total_count,
            comedones: count(LesionKind::Comedone),
            whiteheads: count(LesionKind::Whitehead),
            blackheads: count(LesionKind::Blackhead),
            papules: count(LesionKind::Papule),
            pustules: count(LesionKind::Pustule),
            nodules,
            inflammatory_count,
            inflammatory_percent,
            average_density,
            average_redness: mean(|l| l.redness),
            average_redness_percent: mean(|l| l.redness_percent),
            pore_count: pores.pore_count,
            avg_pore_size: pores.avg_pore_size,
            pore_density: pores.pore_density,
            severity: SeverityGrader::new(&self.config.severity).acne(
                total_count,
                inflammatory_percent,
                average_density,
                nodules,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::{CalibrationInput, CalibrationService};
    use palette::Srgb;

    const SKIN: Srgb<u8> = Srgb::new(200, 150, 130);

    fn paint_disc(image: &mut PixelBuffer, cx: i64, cy: i64, r: i64, color: Srgb<u8>) {
        for y in cy - r..=cy + r {
            for x in cx - r..=cx + r {
                if (x - cx).pow(2) + (y - cy).pow(2) <= r * r {
                    image.set_rgb(x as u32, y as u32, color);
                }
            }
        }
    }

    fn calibration(width: u32) -> CalibrationData {
        CalibrationService::new()
            .calibrate(&CalibrationInput::default(), width)
            .unwrap()
    }

    #[test]
    fn test_clear_skin() {
        let image = PixelBuffer::filled(120, 120, SKIN);
        let config = AnalysisConfig::default();
        let result =
            AcneAnalyzer::new(&config).analyze(&image, &calibration(120), SkinTone::default(), &[]);
        assert_eq!(result.metrics.total_count, 0);
        assert_eq!(result.metrics.inflammatory_percent, 0.0);
        assert_eq!(result.metrics.severity, Severity::Mild);
        assert_eq!(result.detection_mode, DetectionMode::LocalOnly);
        assert_eq!(result.rois.len(), 4);
    }

    #[test]
    fn test_red_disc_detected() {
        let mut image = PixelBuffer::filled(200, 200, SKIN);
        paint_disc(&mut image, 50, 100, 6, Srgb::new(220, 60, 60));
        let config = AnalysisConfig::default();
        let cal = calibration(200);
        let result = AcneAnalyzer::new(&config).analyze(&image, &cal, SkinTone::default(), &[]);

        assert_eq!(result.metrics.total_count, 1);
        let lesion = &result.lesions[0];
        assert_eq!(lesion.area_mm2, lesion.area as f64 / (cal.pixels_per_mm * cal.pixels_per_mm));
        assert!(lesion.is_inflammatory);
        assert_eq!(result.metrics.inflammatory_percent, 100.0);
        // Centroid (50, 100) sits in the left cheek
        assert_eq!(result.rois[1].lesion_count, 1);
        assert_eq!(result.metrics.severity, Severity::Mild);
    }

    #[test]
    fn test_unusable_boxes_fall_back() {
        let mut image = PixelBuffer::filled(200, 200, SKIN);
        paint_disc(&mut image, 50, 100, 6, Srgb::new(220, 60, 60));
        let config = AnalysisConfig::default();
        let cal = calibration(200);
        let weak = RoughBox::from_center(50.0, 100.0, 14.0, 14.0, 0.2, "papule");
        let result = AcneAnalyzer::new(&config).analyze(&image, &cal, SkinTone::default(), &[weak]);
        assert_eq!(result.detection_mode, DetectionMode::LocalOnly);
        assert_eq!(result.metrics.total_count, 1);
    }

    #[test]
    fn test_confident_box_uses_hybrid_path() {
        let mut image = PixelBuffer::filled(200, 200, SKIN);
        paint_disc(&mut image, 50, 100, 6, Srgb::new(220, 60, 60));
        let config = AnalysisConfig::default();
        let cal = calibration(200);
        let strong = RoughBox::from_center(50.0, 100.0, 14.0, 14.0, 0.9, "papule");
        let result = AcneAnalyzer::new(&config).analyze(&image, &cal, SkinTone::default(), &[strong]);
        assert_eq!(result.detection_mode, DetectionMode::Hybrid);
        assert_eq!(result.metrics.total_count, 1);
    }

    #[test]
    fn test_repeat_runs_are_identical() {
        let mut image = PixelBuffer::filled(200, 200, SKIN);
        paint_disc(&mut image, 50, 100, 6, Srgb::new(220, 60, 60));
        paint_disc(&mut image, 150, 100, 5, Srgb::new(230, 90, 80));
        let config = AnalysisConfig::default();
        let cal = calibration(200);
        let analyzer = AcneAnalyzer::new(&config);
        let first = analyzer.analyze(&image, &cal, SkinTone::default(), &[]);
        let second = analyzer.analyze(&image, &cal, SkinTone::default(), &[]);
        assert_eq!(first, second);
    }
}
