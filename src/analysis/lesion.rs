//! Acne lesion model and rule-based classification
//!
//! Classification is a decision list over area (mm²), circularity and
//! centre intensity. Bands overlap; the first matching rule wins, in this
//! order: pustule, papule, nodule, whitehead, blackhead, and comedone as
//! the terminal case.

use serde::{Deserialize, Serialize};

use crate::config::ClassificationConfig;
use crate::detection::{BoundingBox, CenterPoint, PixelPoint, RegionFeatures};

/// Acne lesion subtype
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LesionKind {
    Pustule,
    Papule,
    Nodule,
    Comedone,
    Whitehead,
    Blackhead,
}

impl LesionKind {
    pub fn is_inflammatory(self) -> bool {
        matches!(self, LesionKind::Pustule | LesionKind::Papule | LesionKind::Nodule)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LesionKind::Pustule => "pustule",
            LesionKind::Papule => "papule",
            LesionKind::Nodule => "nodule",
            LesionKind::Comedone => "comedone",
            LesionKind::Whitehead => "whitehead",
            LesionKind::Blackhead => "blackhead",
        }
    }
}

/// Classified acne lesion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesion {
    pub id: usize,
    pub bbox: BoundingBox,
    /// Pixel count
    pub area: usize,
    pub area_mm2: f64,
    pub perimeter: f64,
    pub circularity: f64,
    pub center_intensity: f64,
    pub redness: f64,
    pub redness_percent: f64,
    #[serde(rename = "type")]
    pub kind: LesionKind,
    pub is_inflammatory: bool,
    pub contour: Vec<PixelPoint>,
    pub center: CenterPoint,
}

impl Lesion {
    /// Width over height of the bounding box
    pub fn aspect_ratio(&self) -> f64 {
        self.bbox.aspect_ratio()
    }
}

/// First-match decision list over lesion features
#[derive(Debug, Clone, Copy)]
pub struct LesionClassifier<'a> {
    config: &'a ClassificationConfig,
}

impl<'a> LesionClassifier<'a> {
    pub fn new(config: &'a ClassificationConfig) -> Self {
        Self { config }
    }

    /// Lesion type for the given shape and centre brightness
    pub fn kind(&self, area_mm2: f64, circularity: f64, center_intensity: f64) -> LesionKind {
        let c = self.config;

        let pustule = &c.pustule;
        if (pustule.min_area_mm2..=pustule.max_area_mm2).contains(&area_mm2)
            && circularity > pustule.min_circularity
            && center_intensity > pustule.min_center_intensity
        {
            return LesionKind::Pustule;
        }

        let papule = &c.papule;
        if (papule.min_area_mm2..=papule.max_area_mm2).contains(&area_mm2)
            && (papule.min_circularity..=papule.max_circularity).contains(&circularity)
            && center_intensity < papule.max_center_intensity
        {
            return LesionKind::Papule;
        }

        if area_mm2 > c.nodule.min_area_mm2 || circularity < c.nodule.max_circularity {
            return LesionKind::Nodule;
        }

        let whitehead = &c.whitehead;
        if area_mm2 < whitehead.max_area_mm2
            && center_intensity > whitehead.min_center_intensity
            && circularity > whitehead.min_circularity
        {
            return LesionKind::Whitehead;
        }

        let blackhead = &c.blackhead;
        if area_mm2 < blackhead.max_area_mm2
            && center_intensity < blackhead.max_center_intensity
            && circularity > blackhead.min_circularity
        {
            return LesionKind::Blackhead;
        }

        LesionKind::Comedone
    }

    /// Classify one region into a [`Lesion`]
    pub fn classify(&self, id: usize, features: RegionFeatures) -> Lesion {
        let kind = self.kind(
            features.area_mm2,
            features.circularity,
            features.center_intensity,
        );
        Lesion {
            id,
            bbox: features.bbox,
            area: features.area_px,
            area_mm2: features.area_mm2,
            perimeter: features.perimeter,
            circularity: features.circularity,
            center_intensity: features.center_intensity,
            redness: features.redness,
            redness_percent: features.redness_percent,
            kind,
            is_inflammatory: kind.is_inflammatory(),
            contour: features.contour,
            center: features.center,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(area_mm2: f64, circularity: f64, center_intensity: f64) -> LesionKind {
        let config = ClassificationConfig::default();
        LesionClassifier::new(&config).kind(area_mm2, circularity, center_intensity)
    }

    #[test]
    fn test_pustule() {
        assert_eq!(kind(2.0, 0.7, 160.0), LesionKind::Pustule);
    }

    #[test]
    fn test_area_rule_makes_nodule() {
        assert_eq!(kind(6.0, 0.9, 200.0), LesionKind::Nodule);
    }

    #[test]
    fn test_papule() {
        assert_eq!(kind(1.0, 0.6, 120.0), LesionKind::Papule);
    }

    #[test]
    fn test_irregular_shape_is_nodule() {
        assert_eq!(kind(1.0, 0.3, 120.0), LesionKind::Nodule);
    }

    #[test]
    fn test_small_heads() {
        // Too small for the pustule band, bright centre
        assert_eq!(kind(0.1, 0.9, 150.0), LesionKind::Whitehead);
        assert_eq!(kind(0.1, 0.9, 60.0), LesionKind::Blackhead);
        assert_eq!(kind(0.1, 0.9, 115.0), LesionKind::Comedone);
    }

    #[test]
    fn test_order_breaks_overlaps() {
        // Matches both pustule and whitehead bands: pustule comes first
        assert_eq!(kind(0.4, 0.9, 150.0), LesionKind::Pustule);
        // Matches both papule and blackhead bands: papule comes first
        assert_eq!(kind(0.3, 0.6, 60.0), LesionKind::Papule);
    }

    #[test]
    fn test_circularity_above_one_is_accepted() {
        assert_eq!(kind(2.0, 1.77, 160.0), LesionKind::Pustule);
        assert_eq!(kind(2.0, 1.77, 120.0), LesionKind::Comedone);
    }

    #[test]
    fn test_inflammatory_flags() {
        assert!(LesionKind::Nodule.is_inflammatory());
        assert!(!LesionKind::Blackhead.is_inflammatory());
        assert_eq!(serde_json::to_string(&LesionKind::Whitehead).unwrap(), "\"whitehead\"");
    }
}
