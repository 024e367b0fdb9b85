//! Hybrid detection: refinement of external rough boxes
//!
//! An external object detector may supply coarse lesion boxes with a
//! confidence and a class label. Each confident box is padded, a skin tone
//! local to the patch is measured, and a class-aware mask is segmented
//! inside the patch only. At most the N largest sub-regions of each box are
//! kept, and a global claimed-pixel arena keeps overlapping boxes from
//! reporting the same pixels twice.
//!
//! The detector is a collaborator behind [`LesionBoxSource`]. Its failures
//! are typed ([`DetectorError`]) but never fatal: the caller falls back to
//! whole-image segmentation.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::calibration::skin_tone::local_tone;
use crate::calibration::{CalibrationData, SkinTone};
use crate::config::AnalysisConfig;
use crate::detection::contour::{ContourExtractor, RegionFeatures};
use crate::detection::mask::{adaptive_mask, Window};
use crate::detection::morphology::MorphologyFilter;
use crate::detection::region::{Region, RegionSegmenter};
use crate::image_loader::PixelBuffer;

/// Coarse lesion box from an external detector, top-left origin, pixels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoughBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub confidence: f32,
    pub label: String,
}

impl RoughBox {
    /// Convert a centre-format detection (YOLO style) to top-left form
    pub fn from_center(
        cx: f64,
        cy: f64,
        width: f64,
        height: f64,
        confidence: f32,
        label: impl Into<String>,
    ) -> Self {
        Self {
            x: cx - width / 2.0,
            y: cy - height / 2.0,
            width,
            height,
            confidence,
            label: label.into(),
        }
    }

    /// Finite position and positive finite size
    pub fn is_well_formed(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0
            && self.confidence.is_finite()
    }
}

/// Label of a detector class id
///
/// Unknown ids are reported as `"inflammatory"`.
pub fn box_label_for_class_id(class_id: u32) -> &'static str {
    match class_id {
        0 => "comedone",
        1 => "papule",
        2 => "pustule",
        3 => "nodule",
        5 => "non-inflammatory",
        _ => "inflammatory",
    }
}

/// Which adaptive mask a box label selects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelBias {
    Inflammatory,
    Comedonal,
}

impl LabelBias {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "comedone" | "whitehead" | "blackhead" | "non-inflammatory" => LabelBias::Comedonal,
            _ => LabelBias::Inflammatory,
        }
    }
}

/// Why the external detector produced no boxes
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DetectorError {
    #[error("Detector not available")]
    Unavailable,

    #[error("Detector answered after {elapsed_ms} ms (limit {limit_ms} ms)")]
    Timeout { elapsed_ms: u64, limit_ms: u64 },

    #[error("Detector rejected the request: {reason}")]
    Rejected { reason: String },

    #[error("Detector transport failure: {message}")]
    Transport { message: String },
}

/// Supplier of rough lesion boxes
pub trait LesionBoxSource {
    /// Detect rough boxes in `image`, giving up after `timeout`
    fn detect(&self, image: &PixelBuffer, timeout: Duration)
        -> Result<Vec<RoughBox>, DetectorError>;
}

impl<F> LesionBoxSource for F
where
    F: Fn(&PixelBuffer, Duration) -> Result<Vec<RoughBox>, DetectorError>,
{
    fn detect(
        &self,
        image: &PixelBuffer,
        timeout: Duration,
    ) -> Result<Vec<RoughBox>, DetectorError> {
        self(image, timeout)
    }
}

/// Boxes already in hand (e.g. produced on another device)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StaticBoxes(pub Vec<RoughBox>);

impl LesionBoxSource for StaticBoxes {
    fn detect(&self, _image: &PixelBuffer, _timeout: Duration) -> Result<Vec<RoughBox>, DetectorError> {
        Ok(self.0.clone())
    }
}

/// Query `source`, turning an over-long answer into [`DetectorError::Timeout`]
pub fn request_boxes(
    source: &dyn LesionBoxSource,
    image: &PixelBuffer,
    timeout: Duration,
) -> Result<Vec<RoughBox>, DetectorError> {
    let started = Instant::now();
    let boxes = source.detect(image, timeout)?;
    let elapsed = started.elapsed();
    if elapsed > timeout {
        return Err(DetectorError::Timeout {
            elapsed_ms: elapsed.as_millis() as u64,
            limit_ms: timeout.as_millis() as u64,
        });
    }
    Ok(boxes)
}

/// Refines rough boxes into lesion regions
pub struct HybridDetector<'a> {
    image: &'a PixelBuffer,
    calibration: &'a CalibrationData,
    tone: SkinTone,
    config: &'a AnalysisConfig,
}

impl<'a> HybridDetector<'a> {
    pub fn new(
        image: &'a PixelBuffer,
        calibration: &'a CalibrationData,
        tone: SkinTone,
        config: &'a AnalysisConfig,
    ) -> Self {
        Self {
            image,
            calibration,
            tone,
            config,
        }
    }

    /// Refine `boxes`
    ///
    /// # Returns
    ///
    /// `None` when no box is both well formed and confident enough, which
    /// tells the caller to use whole-image segmentation instead. Otherwise
    /// the features of the kept sub-regions, box by box.
    pub fn refine(&self, boxes: &[RoughBox]) -> Option<Vec<RegionFeatures>> {
        let hybrid = &self.config.hybrid;
        let usable: Vec<&RoughBox> = boxes
            .iter()
            .filter(|b| {
                if !b.is_well_formed() {
                    tracing::warn!(?b, "skipping malformed detector box");
                    return false;
                }
                b.confidence >= hybrid.min_confidence
            })
            .collect();

        if usable.is_empty() {
            tracing::debug!(supplied = boxes.len(), "no usable detector boxes");
            return None;
        }

        let extractor = ContourExtractor::new(self.image, self.calibration, self.tone);
        let mut claimed = vec![false; self.image.pixel_count()];
        let mut features = Vec::new();

        for rough in usable {
            let window = self.padded_window(rough);
            if window.is_empty() {
                continue;
            }
            let mut regions = self.refine_box(rough, window, &claimed);
            regions.sort_by(|a, b| b.area().cmp(&a.area()));
            regions.truncate(hybrid.max_regions_per_box);

            for region in &regions {
                for p in &region.pixels {
                    claimed[self.image.index(p.x, p.y)] = true;
                }
                if let Some(f) = extractor.extract(region) {
                    features.push(f);
                }
            }
        }

        tracing::debug!(regions = features.len(), "hybrid refinement complete");
        Some(features)
    }

    /// Segment the class-aware mask of one padded box
    fn refine_box(&self, rough: &RoughBox, window: Window, claimed: &[bool]) -> Vec<Region> {
        let hybrid = &self.config.hybrid;
        let seg = &self.config.segmentation;

        let patch_tone = local_tone(
            self.image,
            window.x0..window.x0 + window.width,
            window.y0..window.y0 + window.height,
            &self.tone,
            hybrid.local_tone_tolerance,
        );

        let mut mask = adaptive_mask(
            self.image,
            window,
            LabelBias::from_label(&rough.label),
            &hybrid.inflammatory,
            &hybrid.comedonal,
            &patch_tone,
        );
        mask.clear_claimed(claimed, self.image.width());
        let mut cleaned = MorphologyFilter::new(seg.erosion_min_neighbors).apply(&mask);
        cleaned.clear_claimed(claimed, self.image.width());

        RegionSegmenter::new(seg.max_region_pixels, seg.min_region_pixels)
            .with_patch_edges()
            .segment(&cleaned, self.image)
    }

    /// Box padded by a fraction of its longer side, clipped to the image
    fn padded_window(&self, rough: &RoughBox) -> Window {
        let pad = self.config.hybrid.padding_fraction * rough.width.max(rough.height);
        let clip = |v: f64, max: u32| v.clamp(0.0, max as f64) as u32;
        let (w, h) = (self.image.width(), self.image.height());
        Window::from_bounds(
            clip((rough.x - pad).floor(), w),
            clip((rough.y - pad).floor(), h),
            clip((rough.x + rough.width + pad).ceil(), w),
            clip((rough.y + rough.height + pad).ceil(), h),
        )
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

    fn rough(x: f64, y: f64, size: f64, confidence: f32, label: &str) -> RoughBox {
        RoughBox {
            x,
            y,
            width: size,
            height: size,
            confidence,
            label: label.to_string(),
        }
    }

    fn scene() -> (PixelBuffer, CalibrationData) {
        let mut image = PixelBuffer::filled(100, 100, SKIN);
        paint_disc(&mut image, 30, 30, 4, Srgb::new(210, 90, 90));
        let cal = CalibrationService::new()
            .calibrate(&CalibrationInput::default(), 100)
            .unwrap();
        (image, cal)
    }

    #[test]
    fn test_class_id_mapping() {
        assert_eq!(box_label_for_class_id(0), "comedone");
        assert_eq!(box_label_for_class_id(2), "pustule");
        assert_eq!(box_label_for_class_id(5), "non-inflammatory");
        assert_eq!(box_label_for_class_id(42), "inflammatory");
    }

    #[test]
    fn test_label_bias() {
        assert_eq!(LabelBias::from_label("Blackhead"), LabelBias::Comedonal);
        assert_eq!(LabelBias::from_label("papule"), LabelBias::Inflammatory);
        assert_eq!(LabelBias::from_label("mystery"), LabelBias::Inflammatory);
    }

    #[test]
    fn test_from_center() {
        let b = RoughBox::from_center(50.0, 40.0, 10.0, 6.0, 0.8, "papule");
        assert_eq!((b.x, b.y, b.width, b.height), (45.0, 37.0, 10.0, 6.0));
    }

    #[test]
    fn test_confident_box_is_refined() {
        let (image, cal) = scene();
        let config = AnalysisConfig::default();
        let detector = HybridDetector::new(&image, &cal, SkinTone::default(), &config);
        let found = detector
            .refine(&[rough(24.0, 24.0, 12.0, 0.9, "papule")])
            .unwrap();
        assert_eq!(found.len(), 1);
        // Radius-4 disc (49 px) grown by the 3x3 dilation
        assert_eq!(found[0].area_px, 89);
        assert_eq!(found[0].center, crate::detection::CenterPoint { x: 30.0, y: 30.0 });
    }

    #[test]
    fn test_low_confidence_only_means_fallback() {
        let (image, cal) = scene();
        let config = AnalysisConfig::default();
        let detector = HybridDetector::new(&image, &cal, SkinTone::default(), &config);
        assert!(detector.refine(&[rough(24.0, 24.0, 12.0, 0.2, "papule")]).is_none());
        assert!(detector.refine(&[]).is_none());
    }

    #[test]
    fn test_malformed_box_is_skipped() {
        let (image, cal) = scene();
        let config = AnalysisConfig::default();
        let detector = HybridDetector::new(&image, &cal, SkinTone::default(), &config);
        let bad = rough(24.0, 24.0, f64::NAN, 0.9, "papule");
        assert!(detector.refine(&[bad]).is_none());
    }

    #[test]
    fn test_overlapping_boxes_do_not_double_count() {
        let (image, cal) = scene();
        let config = AnalysisConfig::default();
        let detector = HybridDetector::new(&image, &cal, SkinTone::default(), &config);
        let found = detector
            .refine(&[
                rough(24.0, 24.0, 12.0, 0.9, "papule"),
                rough(22.0, 22.0, 14.0, 0.8, "pustule"),
            ])
            .unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_at_most_three_regions_per_box() {
        let mut image = PixelBuffer::filled(120, 120, SKIN);
        for (i, r) in [2i64, 3, 4, 5].iter().enumerate() {
            paint_disc(&mut image, 20 + 20 * i as i64, 40, *r, Srgb::new(210, 90, 90));
        }
        let cal = CalibrationService::new()
            .calibrate(&CalibrationInput::default(), 120)
            .unwrap();
        let config = AnalysisConfig::default();
        let detector = HybridDetector::new(&image, &cal, SkinTone::default(), &config);
        let found = detector
            .refine(&[RoughBox {
                x: 10.0,
                y: 30.0,
                width: 80.0,
                height: 20.0,
                confidence: 0.9,
                label: "papule".into(),
            }])
            .unwrap();
        assert_eq!(found.len(), 3);
        assert!(found[0].area_px > found[1].area_px);
        assert!(found[1].area_px > found[2].area_px);
    }

    #[test]
    fn test_static_boxes_and_closure_sources() {
        let image = PixelBuffer::filled(10, 10, SKIN);
        let timeout = Duration::from_millis(100);
        let boxes = StaticBoxes(vec![rough(1.0, 1.0, 2.0, 0.9, "papule")]);
        assert_eq!(request_boxes(&boxes, &image, timeout).unwrap().len(), 1);

        let failing = |_: &PixelBuffer, _: Duration| -> Result<Vec<RoughBox>, DetectorError> {
            Err(DetectorError::Unavailable)
        };
        assert_eq!(
            request_boxes(&failing, &image, timeout),
            Err(DetectorError::Unavailable)
        );
    }

    #[test]
    fn test_slow_source_times_out() {
        let image = PixelBuffer::filled(10, 10, SKIN);
        let slow = |_: &PixelBuffer, _: Duration| -> Result<Vec<RoughBox>, DetectorError> {
            std::thread::sleep(Duration::from_millis(20));
            Ok(Vec::new())
        };
        let err = request_boxes(&slow, &image, Duration::from_millis(1)).unwrap_err();
        assert!(matches!(err, DetectorError::Timeout { limit_ms: 1, .. }));
    }
}
