//! Anatomical regions of interest and lesion density
//!
//! The layout is fixed, as fractions of the frame, for a face filling the
//! upper centre of the photo. No landmark detection is involved.

use serde::{Deserialize, Serialize};

use crate::analysis::lesion::Lesion;
use crate::calibration::CalibrationData;
use crate::constants::calibration::MM2_PER_CM2;
use crate::constants::roi;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RoiName {
    Forehead,
    LeftCheek,
    RightCheek,
    Chin,
}

impl RoiName {
    pub const ALL: [RoiName; 4] = [
        RoiName::Forehead,
        RoiName::LeftCheek,
        RoiName::RightCheek,
        RoiName::Chin,
    ];

    /// Layout fractions `[x0, y0, x1, y1]`
    pub fn fractions(self) -> [f64; 4] {
        match self {
            RoiName::Forehead => roi::FOREHEAD,
            RoiName::LeftCheek => roi::LEFT_CHEEK,
            RoiName::RightCheek => roi::RIGHT_CHEEK,
            RoiName::Chin => roi::CHIN,
        }
    }
}

/// Half-open pixel rectangle `[x0, x1) x [y0, y1)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoiRect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl RoiRect {
    pub fn width(&self) -> f64 {
        (self.x1 - self.x0).max(0.0)
    }

    pub fn height(&self) -> f64 {
        (self.y1 - self.y0).max(0.0)
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x0 && x < self.x1 && y >= self.y0 && y < self.y1
    }
}

/// Lesion density over one region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Roi {
    pub name: RoiName,
    pub bbox: RoiRect,
    pub area_mm2: f64,
    /// Ids of lesions whose centroid lies inside
    pub lesion_ids: Vec<usize>,
    pub lesion_count: usize,
    /// Lesions per cm²
    pub density: f64,
}

/// Assigns lesions to the fixed ROI layout
#[derive(Debug, Clone, Copy)]
pub struct RoiAggregator<'a> {
    width: u32,
    height: u32,
    calibration: &'a CalibrationData,
}

impl<'a> RoiAggregator<'a> {
    pub fn new(width: u32, height: u32, calibration: &'a CalibrationData) -> Self {
        Self {
            width,
            height,
            calibration,
        }
    }

    /// Pixel rectangle of `name` in this frame
    pub fn rect(&self, name: RoiName) -> RoiRect {
        let [fx0, fy0, fx1, fy1] = name.fractions();
        let (w, h) = (self.width as f64, self.height as f64);
        RoiRect {
            x0: fx0 * w,
            y0: fy0 * h,
            x1: fx1 * w,
            y1: fy1 * h,
        }
    }

    /// Count and density of lesions per region, in layout order
    pub fn aggregate(&self, lesions: &[Lesion]) -> Vec<Roi> {
        RoiName::ALL
            .iter()
            .map(|&name| {
                let bbox = self.rect(name);
                let lesion_ids: Vec<usize> = lesions
                    .iter()
                    .filter(|l| bbox.contains(l.center.x, l.center.y))
                    .map(|l| l.id)
                    .collect();
                let area_cm2 = self.calibration.rect_area_cm2(bbox.width(), bbox.height());
                let density = if area_cm2 > 0.0 {
                    lesion_ids.len() as f64 / area_cm2
                } else {
                    0.0
                };
                Roi {
                    name,
                    bbox,
                    area_mm2: area_cm2 * MM2_PER_CM2,
                    lesion_count: lesion_ids.len(),
                    lesion_ids,
                    density,
                }
            })
            .collect()
    }
}

/// Mean of the per-region densities
pub fn average_density(rois: &[Roi]) -> f64 {
    if rois.is_empty() {
        return 0.0;
    }
    rois.iter().map(|r| r.density).sum::<f64>() / rois.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::lesion::LesionKind;
    use crate::calibration::{CalibrationInput, CalibrationService};
    use crate::detection::{BoundingBox, CenterPoint};

    fn lesion_at(id: usize, x: f64, y: f64) -> Lesion {
        Lesion {
            id,
            bbox: BoundingBox { min_x: 0, min_y: 0, max_x: 1, max_y: 1 },
            area: 40,
            area_mm2: 1.0,
            perimeter: 20.0,
            circularity: 0.8,
            center_intensity: 120.0,
            redness: 60.0,
            redness_percent: 5.0,
            kind: LesionKind::Papule,
            is_inflammatory: true,
            contour: Vec::new(),
            center: CenterPoint { x, y },
        }
    }

    #[test]
    fn test_layout_rects() {
        let cal = CalibrationService::new()
            .calibrate(&CalibrationInput::default(), 400)
            .unwrap();
        let agg = RoiAggregator::new(400, 400, &cal);
        let forehead = agg.rect(RoiName::Forehead);
        assert!((forehead.x0 - 120.0).abs() < 1e-9);
        assert!((forehead.y1 - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_centroid_membership_and_density() {
        // 400 px at 2 px/mm: left cheek is 92 x 100 px = 46 x 50 mm = 23 cm²
        let cal = CalibrationService::new()
            .calibrate(&CalibrationInput::default(), 400)
            .unwrap();
        let agg = RoiAggregator::new(400, 400, &cal);
        let lesions = vec![
            lesion_at(1, 100.0, 200.0),
            lesion_at(2, 110.0, 210.0),
            lesion_at(3, 200.0, 50.0),
            lesion_at(4, 5.0, 5.0),
        ];
        let rois = agg.aggregate(&lesions);
        assert_eq!(rois.len(), 4);

        let left = &rois[1];
        assert_eq!(left.name, RoiName::LeftCheek);
        assert_eq!(left.lesion_ids, vec![1, 2]);
        assert!((left.area_mm2 - 2300.0).abs() < 1e-6);
        assert!((left.density - 2.0 / 23.0).abs() < 1e-9);

        assert_eq!(rois[0].lesion_count, 1);
        assert_eq!(rois[3].lesion_count, 0);
        assert_eq!(rois[3].density, 0.0);
    }

    #[test]
    fn test_average_density() {
        assert_eq!(average_density(&[]), 0.0);
    }
}
