//! Conservative multi-criteria severity grading
//!
//! Every grader checks Severe first, then Moderate, and answers Mild
//! otherwise. Criteria within a tier are alternatives (any one suffices).

use serde::{Deserialize, Serialize};

use crate::config::SeverityConfig;

/// Ordered severity tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Mild,
    Moderate,
    Severe,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Severity::Mild => "Mild",
            Severity::Moderate => "Moderate",
            Severity::Severe => "Severe",
        };
        f.write_str(name)
    }
}

/// Maps aggregate metrics to a [`Severity`]
#[derive(Debug, Clone, Copy)]
pub struct SeverityGrader<'a> {
    config: &'a SeverityConfig,
}

impl<'a> SeverityGrader<'a> {
    pub fn new(config: &'a SeverityConfig) -> Self {
        Self { config }
    }

    /// Acne grade
    ///
    /// # Arguments
    ///
    /// * `total_count` - Lesions kept after filtering
    /// * `inflammatory_percent` - Share of inflammatory lesions, 0-100
    /// * `average_density` - Mean ROI density, lesions per cm²
    /// * `nodules` - Nodule count
    ///
    /// A handful of lesions is always Mild, whatever their type.
    pub fn acne(
        &self,
        total_count: usize,
        inflammatory_percent: f64,
        average_density: f64,
        nodules: usize,
    ) -> Severity {
        let g = &self.config.acne;
        if total_count <= g.clear_skin_max_count {
            return Severity::Mild;
        }

        let severe = (average_density > g.severe_density
            && inflammatory_percent > g.severe_density_inflammatory)
            || (total_count > g.severe_count && inflammatory_percent > g.severe_count_inflammatory)
            || nodules > g.severe_nodules
            || total_count > g.severe_total;
        if severe {
            return Severity::Severe;
        }

        let moderate = (average_density > g.moderate_density
            && inflammatory_percent > g.moderate_density_inflammatory)
            || (total_count > g.moderate_count
                && inflammatory_percent > g.moderate_count_inflammatory)
            || (nodules > g.moderate_nodules && total_count > g.moderate_nodule_total);
        if moderate {
            Severity::Moderate
        } else {
            Severity::Mild
        }
    }

    /// Hyperpigmentation grade from coverage (%) and mean darkening
    pub fn pigmentation(&self, coverage_percent: f64, intensity_diff: f64) -> Severity {
        let g = &self.config.pigmentation;
        if coverage_percent >= g.severe_coverage_percent || intensity_diff > g.severe_intensity_diff
        {
            Severity::Severe
        } else if coverage_percent >= g.moderate_coverage_percent
            || intensity_diff > g.moderate_intensity_diff
        {
            Severity::Moderate
        } else {
            Severity::Mild
        }
    }

    /// Wrinkle grade from line density, mean length (mm) and mean depth
    pub fn wrinkles(&self, count_per_cm: f64, avg_length_mm: f64, avg_depth: f64) -> Severity {
        let g = &self.config.wrinkles;
        if count_per_cm > g.severe_count_per_cm
            || avg_length_mm > g.severe_length_mm
            || avg_depth > g.severe_depth
        {
            Severity::Severe
        } else if count_per_cm > g.moderate_count_per_cm
            || avg_length_mm > g.moderate_length_mm
            || avg_depth > g.moderate_depth
        {
            Severity::Moderate
        } else {
            Severity::Mild
        }
    }
}
