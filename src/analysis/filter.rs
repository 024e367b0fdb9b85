//! False-positive suppression for classified lesions

use crate::analysis::lesion::Lesion;
use crate::config::FalsePositiveConfig;

/// Multi-predicate post-filter with a hard cap on kept lesions
#[derive(Debug, Clone, Copy)]
pub struct FalsePositiveFilter<'a> {
    config: &'a FalsePositiveConfig,
}

impl<'a> FalsePositiveFilter<'a> {
    pub fn new(config: &'a FalsePositiveConfig) -> Self {
        Self { config }
    }

    /// True when any rejection rule fires
    pub fn rejects(&self, lesion: &Lesion) -> bool {
        let c = self.config;
        let aspect = lesion.aspect_ratio();
        let ci = lesion.center_intensity;

        lesion.area_mm2 < c.min_area_mm2
            || lesion.area < c.min_area_px
            || lesion.circularity < c.min_circularity
            || (lesion.is_inflammatory && lesion.redness < c.min_inflammatory_redness)
            || aspect < c.min_aspect_ratio
            || aspect > c.max_aspect_ratio
            || (ci > c.ambiguous_center_low
                && ci < c.ambiguous_center_high
                && lesion.redness < c.ambiguous_min_redness)
            || ((ci - c.mid_gray_center).abs() < c.mid_gray_tolerance
                && lesion.redness < c.mid_gray_min_redness)
    }

    /// Drop rejected lesions, then keep the largest `max_kept` by area
    ///
    /// Sorting is stable, so equal areas keep detection order.
    pub fn apply(&self, lesions: Vec<Lesion>) -> Vec<Lesion> {
        let before = lesions.len();
        let mut kept: Vec<Lesion> = lesions.into_iter().filter(|l| !self.rejects(l)).collect();
        kept.sort_by(|a, b| b.area_mm2.total_cmp(&a.area_mm2));
        kept.truncate(self.config.max_kept);
        tracing::debug!(before, after = kept.len(), "false-positive filter applied");
        kept
    }
}
