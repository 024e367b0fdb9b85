//! Configuration structures for the skinquant analysis pipeline.
//!
//! Every tunable threshold of the engine lives here, grouped by the stage
//! that consumes it. The record is immutable once handed to a
//! [`SkinAnalyzer`](crate::SkinAnalyzer) and is passed by reference into each
//! detector, so two conditions never silently drift apart.
//!
//! # Configuration Loading
//!
//! ```no_run
//! use skinquant::AnalysisConfig;
//! use std::path::Path;
//!
//! // Load from file
//! let config = AnalysisConfig::from_json_file(Path::new("config.json"))?;
//!
//! // Or use defaults
//! let config = AnalysisConfig::default();
//! # Ok::<(), skinquant::AnalysisError>(())
//! ```
//!
//! # Configuration Sections
//!
//! - [`SegmentationConfig`]: border margin, morphology and flood fill bounds
//! - [`AcneCandidateConfig`]: per-pixel lesion predicates
//! - [`PigmentationConfig`]: dark brown spot predicate and region bounds
//! - [`WrinkleConfig`]: Sobel edge tracing
//! - [`HybridConfig`]: refinement of external rough boxes
//! - [`ClassificationConfig`]: lesion type decision list
//! - [`FalsePositiveConfig`]: lesion post-filter
//! - [`PoreConfig`]: pore speck detection
//! - [`SeverityConfig`]: Mild / Moderate / Severe grading

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{AnalysisError, Result};

/// Complete analysis configuration.
///
/// `Default` reproduces the reference thresholds. Sections missing from a
/// JSON file fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AnalysisConfig {
    pub segmentation: SegmentationConfig,
    pub acne_candidates: AcneCandidateConfig,
    pub pigmentation: PigmentationConfig,
    pub wrinkles: WrinkleConfig,
    pub hybrid: HybridConfig,
    pub classification: ClassificationConfig,
    pub false_positive: FalsePositiveConfig,
    pub pores: PoreConfig,
    pub severity: SeverityConfig,
}

/// Mask cleanup and connected-region bounds shared by the lesion detectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentationConfig {
    /// Pixels excluded along every image edge
    pub border_margin: u32,

    /// Erosion keeps a pixel only with at least this many set 8-neighbors
    pub erosion_min_neighbors: u8,

    /// Flood fill stops growing a region at this many pixels
    pub max_region_pixels: usize,

    /// Regions smaller than this are discarded
    pub min_region_pixels: usize,
}

/// Per-pixel acne candidate predicates.
///
/// A pixel is a candidate when any of the three rules holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcneCandidateConfig {
    pub inflammatory: InflammatoryRule,
    pub comedonal: DarkSpotRule,
    pub bright: BrightSpotRule,
}

/// Red, mid-brightness pixels that differ from the baseline skin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InflammatoryRule {
    pub min_redness: f64,
    pub min_brightness: f64,
    pub max_brightness: f64,
    pub min_skin_distance: f64,
}

/// Dark pixels clearly less red than the baseline skin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DarkSpotRule {
    pub max_brightness: f64,
    /// Required drop of the red channel below the skin tone red
    pub min_red_deficit: f64,
    pub min_skin_distance: f64,
}

/// Bright reddish pixels (pus heads)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrightSpotRule {
    pub min_brightness: f64,
    pub min_redness: f64,
    pub min_skin_distance: f64,
}

/// Hyperpigmentation spot detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PigmentationConfig {
    /// Required brightness drop below the skin tone brightness
    pub min_darkening: f64,

    /// Brown pixels need green above this multiple of blue
    pub brown_green_blue_ratio: f64,

    pub max_region_pixels: usize,
    pub min_region_pixels: usize,
}

/// Wrinkle line tracing over the Sobel gradient magnitude.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WrinkleConfig {
    /// Gradient magnitude (0-255) a pixel needs to belong to a line
    pub edge_threshold: f64,

    /// Tracing stops a line at this many points
    pub max_line_points: usize,

    /// Lines with fewer points are discarded
    pub min_line_points: usize,

    /// Millimetre approximation of one traced point
    pub mm_per_point: f64,
}

/// Refinement of externally supplied rough lesion boxes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HybridConfig {
    /// Boxes below this detector confidence are ignored
    pub min_confidence: f32,

    /// Padding added on every side, as a fraction of max(box width, box height)
    pub padding_fraction: f64,

    /// Largest sub-regions kept per box
    pub max_regions_per_box: usize,

    /// Time budget for the external detector call
    pub detector_timeout_ms: u64,

    /// Patch pixels within this skin distance of the global tone form the local tone
    pub local_tone_tolerance: f64,

    /// Mask used inside boxes labelled as inflammatory lesions
    pub inflammatory: AdaptiveInflammatoryRule,

    /// Mask used inside boxes labelled as comedones
    pub comedonal: AdaptiveComedonalRule,
}

/// Looser redness / brightness band for inflammatory-labelled boxes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaptiveInflammatoryRule {
    pub min_redness: f64,
    pub min_brightness: f64,
    pub max_brightness: f64,
    pub min_skin_distance: f64,
}

/// Bimodal dark-or-bright band for comedone-labelled boxes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaptiveComedonalRule {
    /// Pixels darker than this qualify (blackheads)
    pub dark_below: f64,
    /// Pixels brighter than this qualify (whiteheads)
    pub bright_above: f64,
    pub min_skin_distance: f64,
}

/// Bands of the lesion type decision list, evaluated in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationConfig {
    pub pustule: PustuleBand,
    pub papule: PapuleBand,
    pub nodule: NoduleBand,
    pub whitehead: WhiteheadBand,
    pub blackhead: BlackheadBand,
}

/// Area in `[min, max]`, circularity above, centre brighter than
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PustuleBand {
    pub min_area_mm2: f64,
    pub max_area_mm2: f64,
    pub min_circularity: f64,
    pub min_center_intensity: f64,
}

/// Area in `[min, max]`, circularity in `[min, max]`, centre darker than
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PapuleBand {
    pub min_area_mm2: f64,
    pub max_area_mm2: f64,
    pub min_circularity: f64,
    pub max_circularity: f64,
    pub max_center_intensity: f64,
}

/// Area above, or circularity below
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoduleBand {
    pub min_area_mm2: f64,
    pub max_circularity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhiteheadBand {
    pub max_area_mm2: f64,
    pub min_center_intensity: f64,
    pub min_circularity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlackheadBand {
    pub max_area_mm2: f64,
    pub max_center_intensity: f64,
    pub min_circularity: f64,
}

/// Lesion post-filter. A lesion matching any rejection rule is dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FalsePositiveConfig {
    pub min_area_mm2: f64,
    pub min_area_px: usize,
    pub min_circularity: f64,

    /// Inflammatory lesions need at least this redness
    pub min_inflammatory_redness: f64,

    /// Allowed bounding box width/height range
    pub min_aspect_ratio: f64,
    pub max_aspect_ratio: f64,

    /// Centre intensity strictly inside this band is ambiguous...
    pub ambiguous_center_low: f64,
    pub ambiguous_center_high: f64,
    /// ...and rejected unless redness reaches this
    pub ambiguous_min_redness: f64,

    /// Mid-grey centres within the tolerance need `mid_gray_min_redness`
    pub mid_gray_center: f64,
    pub mid_gray_tolerance: f64,
    pub mid_gray_min_redness: f64,

    /// Hard cap on kept lesions, largest first
    pub max_kept: usize,
}

/// Pore specks in the raw dark-candidate mask.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoreConfig {
    pub min_pixels: usize,
    pub max_pixels: usize,
    pub min_circularity: f64,
}

/// Severity grading thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SeverityConfig {
    pub acne: AcneGrading,
    pub pigmentation: PigmentationGrading,
    pub wrinkles: WrinkleGrading,
}

/// Acne grading. Percentages are 0-100, densities per cm².
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcneGrading {
    /// At or below this many lesions the skin is graded Mild unconditionally
    pub clear_skin_max_count: usize,

    pub severe_density: f64,
    pub severe_density_inflammatory: f64,
    pub severe_count: usize,
    pub severe_count_inflammatory: f64,
    pub severe_nodules: usize,
    pub severe_total: usize,

    pub moderate_density: f64,
    pub moderate_density_inflammatory: f64,
    pub moderate_count: usize,
    pub moderate_count_inflammatory: f64,
    pub moderate_nodules: usize,
    pub moderate_nodule_total: usize,
}

/// Pigmentation grading. Coverage thresholds are inclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PigmentationGrading {
    pub severe_coverage_percent: f64,
    pub severe_intensity_diff: f64,
    pub moderate_coverage_percent: f64,
    pub moderate_intensity_diff: f64,
}

/// Wrinkle grading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WrinkleGrading {
    pub severe_count_per_cm: f64,
    pub severe_length_mm: f64,
    pub severe_depth: f64,
    pub moderate_count_per_cm: f64,
    pub moderate_length_mm: f64,
    pub moderate_depth: f64,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            border_margin: 5,
            erosion_min_neighbors: 3,
            max_region_pixels: 400,
            min_region_pixels: 10,
        }
    }
}

impl Default for AcneCandidateConfig {
    fn default() -> Self {
        Self {
            inflammatory: InflammatoryRule {
                min_redness: 20.0,
                min_brightness: 60.0,
                max_brightness: 220.0,
                min_skin_distance: 40.0,
            },
            comedonal: DarkSpotRule {
                max_brightness: 90.0,
                min_red_deficit: 30.0,
                min_skin_distance: 50.0,
            },
            bright: BrightSpotRule {
                min_brightness: 170.0,
                min_redness: 15.0,
                min_skin_distance: 40.0,
            },
        }
    }
}

impl Default for PigmentationConfig {
    fn default() -> Self {
        Self {
            min_darkening: 25.0,
            brown_green_blue_ratio: 1.1,
            max_region_pixels: 500,
            min_region_pixels: 20,
        }
    }
}

impl Default for WrinkleConfig {
    fn default() -> Self {
        Self {
            edge_threshold: 128.0,
            max_line_points: 200,
            min_line_points: 10,
            mm_per_point: 0.1,
        }
    }
}

impl Default for HybridConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.5,
            padding_fraction: 0.1,
            max_regions_per_box: 3,
            detector_timeout_ms: 3000,
            local_tone_tolerance: 60.0,
            inflammatory: AdaptiveInflammatoryRule {
                min_redness: 10.0,
                min_brightness: 40.0,
                max_brightness: 230.0,
                min_skin_distance: 25.0,
            },
            comedonal: AdaptiveComedonalRule {
                dark_below: 100.0,
                bright_above: 180.0,
                min_skin_distance: 30.0,
            },
        }
    }
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            pustule: PustuleBand {
                min_area_mm2: 0.3,
                max_area_mm2: 5.0,
                min_circularity: 0.6,
                min_center_intensity: 140.0,
            },
            papule: PapuleBand {
                min_area_mm2: 0.2,
                max_area_mm2: 3.0,
                min_circularity: 0.4,
                max_circularity: 0.8,
                max_center_intensity: 140.0,
            },
            nodule: NoduleBand {
                min_area_mm2: 5.0,
                max_circularity: 0.4,
            },
            whitehead: WhiteheadBand {
                max_area_mm2: 0.5,
                min_center_intensity: 130.0,
                min_circularity: 0.5,
            },
            blackhead: BlackheadBand {
                max_area_mm2: 0.5,
                max_center_intensity: 100.0,
                min_circularity: 0.4,
            },
        }
    }
}

impl Default for FalsePositiveConfig {
    fn default() -> Self {
        Self {
            min_area_mm2: 0.3,
            min_area_px: 30,
            min_circularity: 0.3,
            min_inflammatory_redness: 30.0,
            min_aspect_ratio: 0.33,
            max_aspect_ratio: 3.0,
            ambiguous_center_low: 100.0,
            ambiguous_center_high: 140.0,
            ambiguous_min_redness: 35.0,
            mid_gray_center: 128.0,
            mid_gray_tolerance: 20.0,
            mid_gray_min_redness: 30.0,
            max_kept: 30,
        }
    }
}

impl Default for PoreConfig {
    fn default() -> Self {
        Self {
            min_pixels: 3,
            max_pixels: 29,
            min_circularity: 0.5,
        }
    }
}

impl Default for AcneGrading {
    fn default() -> Self {
        Self {
            clear_skin_max_count: 5,
            severe_density: 8.0,
            severe_density_inflammatory: 70.0,
            severe_count: 80,
            severe_count_inflammatory: 50.0,
            severe_nodules: 5,
            severe_total: 100,
            moderate_density: 4.0,
            moderate_density_inflammatory: 40.0,
            moderate_count: 40,
            moderate_count_inflammatory: 30.0,
            moderate_nodules: 2,
            moderate_nodule_total: 30,
        }
    }
}

impl Default for PigmentationGrading {
    fn default() -> Self {
        Self {
            severe_coverage_percent: 30.0,
            severe_intensity_diff: 50.0,
            moderate_coverage_percent: 10.0,
            moderate_intensity_diff: 20.0,
        }
    }
}

impl Default for WrinkleGrading {
    fn default() -> Self {
        Self {
            severe_count_per_cm: 10.0,
            severe_length_mm: 40.0,
            severe_depth: 50.0,
            moderate_count_per_cm: 5.0,
            moderate_length_mm: 20.0,
            moderate_depth: 20.0,
        }
    }
}

impl AnalysisConfig {
    /// Check internal consistency of all sections
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::InvalidParameter`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let seg = &self.segmentation;
        if seg.min_region_pixels < 2 {
            return Err(AnalysisError::invalid_parameter(
                "segmentation.min_region_pixels",
                seg.min_region_pixels,
            ));
        }
        if seg.max_region_pixels < seg.min_region_pixels {
            return Err(AnalysisError::invalid_parameter(
                "segmentation.max_region_pixels",
                seg.max_region_pixels,
            ));
        }
        if seg.erosion_min_neighbors > 8 {
            return Err(AnalysisError::invalid_parameter(
                "segmentation.erosion_min_neighbors",
                seg.erosion_min_neighbors,
            ));
        }

        let pig = &self.pigmentation;
        if pig.min_region_pixels < 2 || pig.max_region_pixels < pig.min_region_pixels {
            return Err(AnalysisError::invalid_parameter(
                "pigmentation.max_region_pixels",
                pig.max_region_pixels,
            ));
        }

        let wr = &self.wrinkles;
        if wr.min_line_points == 0 || wr.max_line_points < wr.min_line_points {
            return Err(AnalysisError::invalid_parameter(
                "wrinkles.max_line_points",
                wr.max_line_points,
            ));
        }
        if !(wr.mm_per_point > 0.0) {
            return Err(AnalysisError::invalid_parameter("wrinkles.mm_per_point", wr.mm_per_point));
        }

        let hy = &self.hybrid;
        if !(0.0..=1.0).contains(&hy.min_confidence) {
            return Err(AnalysisError::invalid_parameter("hybrid.min_confidence", hy.min_confidence));
        }
        if !(hy.padding_fraction >= 0.0) {
            return Err(AnalysisError::invalid_parameter(
                "hybrid.padding_fraction",
                hy.padding_fraction,
            ));
        }
        if hy.max_regions_per_box == 0 {
            return Err(AnalysisError::invalid_parameter("hybrid.max_regions_per_box", 0));
        }
        if hy.detector_timeout_ms == 0 {
            return Err(AnalysisError::invalid_parameter("hybrid.detector_timeout_ms", 0));
        }

        let fp = &self.false_positive;
        if !(fp.min_aspect_ratio > 0.0 && fp.min_aspect_ratio <= fp.max_aspect_ratio) {
            return Err(AnalysisError::invalid_parameter(
                "false_positive.min_aspect_ratio",
                fp.min_aspect_ratio,
            ));
        }
        if fp.ambiguous_center_low > fp.ambiguous_center_high {
            return Err(AnalysisError::invalid_parameter(
                "false_positive.ambiguous_center_low",
                fp.ambiguous_center_low,
            ));
        }

        let pores = &self.pores;
        if pores.min_pixels < 2 || pores.max_pixels < pores.min_pixels {
            return Err(AnalysisError::invalid_parameter("pores.max_pixels", pores.max_pixels));
        }

        let cls = &self.classification;
        if cls.pustule.min_area_mm2 > cls.pustule.max_area_mm2
            || cls.papule.min_area_mm2 > cls.papule.max_area_mm2
            || cls.papule.min_circularity > cls.papule.max_circularity
        {
            return Err(AnalysisError::invalid_parameter(
                "classification",
                "inverted band bounds",
            ));
        }

        Ok(())
    }

    /// Parse and validate a configuration from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| AnalysisError::config("invalid configuration JSON", e))?;
        config.validate().map_err(|e| AnalysisError::ConfigError {
            message: e.to_string(),
            source: None,
        })?;
        Ok(config)
    }

    /// Load configuration from JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AnalysisError::config(format!("cannot read {}", path.display()), e))?;
        Self::from_json_str(&content)
    }

    /// Save configuration to JSON file
    pub fn to_json_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| AnalysisError::config("cannot serialize configuration", e))?;
        std::fs::write(path, json)
            .map_err(|e| AnalysisError::config(format!("cannot write {}", path.display()), e))?;
        Ok(())
    }
}
