//! Geometric and color features of segmented regions

use serde::{Deserialize, Serialize};

use crate::calibration::skin_tone::safe_brightness;
use crate::calibration::{CalibrationData, SkinTone};
use crate::color::brightness;
use crate::detection::region::{BoundingBox, PixelPoint, Region};
use crate::image_loader::PixelBuffer;

/// Fraction of the shorter bbox side sampled as the lesion centre
const CENTER_ZONE_FRACTION: f64 = 0.15;

/// Sub-pixel coordinate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CenterPoint {
    pub x: f64,
    pub y: f64,
}

/// Shape and color description of one region, before classification
#[derive(Debug, Clone, PartialEq)]
pub struct RegionFeatures {
    pub bbox: BoundingBox,
    pub area_px: usize,
    pub area_mm2: f64,
    /// Boundary pixel count
    pub perimeter: f64,
    /// `4π·area/perimeter²`; exceeds 1 for compact pixel blobs
    pub circularity: f64,
    /// Mean brightness of the centre zone
    pub center_intensity: f64,
    /// Mean `R - (G + B) / 2`
    pub redness: f64,
    /// Red excess over the skin tone, percent of skin brightness, >= 0
    pub redness_percent: f64,
    pub contour: Vec<PixelPoint>,
    /// Member centroid
    pub center: CenterPoint,
}

impl RegionFeatures {
    pub fn aspect_ratio(&self) -> f64 {
        self.bbox.aspect_ratio()
    }
}

/// Computes [`RegionFeatures`] against one image, scale and skin tone
#[derive(Debug, Clone, Copy)]
pub struct ContourExtractor<'a> {
    image: &'a PixelBuffer,
    calibration: &'a CalibrationData,
    tone: SkinTone,
}

impl<'a> ContourExtractor<'a> {
    pub fn new(image: &'a PixelBuffer, calibration: &'a CalibrationData, tone: SkinTone) -> Self {
        Self {
            image,
            calibration,
            tone,
        }
    }

    /// Describe `region`
    ///
    /// # Returns
    ///
    /// `None` for degenerate regions (fewer than two pixels).
    pub fn extract(&self, region: &Region) -> Option<RegionFeatures> {
        let area_px = region.area();
        if area_px < 2 {
            return None;
        }
        let bbox = region.bbox;

        let perimeter = if region.contour.is_empty() {
            (bbox.width().max(bbox.height()) * 2) as f64
        } else {
            region.contour.len() as f64
        };
        let circularity = 4.0 * std::f64::consts::PI * area_px as f64 / (perimeter * perimeter);

        let [r, g, b] = region.mean_rgb();
        let redness = r - (g + b) / 2.0;
        let redness_percent = safe_brightness(&self.tone)
            .map(|skin| ((r - self.tone.r) / skin * 100.0).max(0.0))
            .unwrap_or(0.0);

        let (cx, cy) = region.centroid();

        Some(RegionFeatures {
            bbox,
            area_px,
            area_mm2: self.calibration.area_mm2(area_px as f64),
            perimeter,
            circularity,
            center_intensity: self.center_intensity(region, (r + g + b) / 3.0),
            redness,
            redness_percent,
            contour: region.contour.clone(),
            center: CenterPoint { x: cx, y: cy },
        })
    }

    /// Mean brightness of members near the bbox centre, else `fallback`
    fn center_intensity(&self, region: &Region, fallback: f64) -> f64 {
        let bbox = region.bbox;
        let (cx, cy) = bbox.center();
        let radius = CENTER_ZONE_FRACTION * bbox.width().min(bbox.height()) as f64;

        let (sum, count) = region
            .pixels
            .iter()
            .filter(|p| {
                let (dx, dy) = (p.x as f64 - cx, p.y as f64 - cy);
                (dx * dx + dy * dy).sqrt() <= radius
            })
            .fold((0.0, 0usize), |(sum, count), p| {
                (sum + brightness(self.image.rgb(p.x, p.y)), count + 1)
            });

        if count == 0 {
            fallback
        } else {
            sum / count as f64
        }
    }
}
