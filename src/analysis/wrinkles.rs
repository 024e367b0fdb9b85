//! Wrinkle analysis from traced edge chains

use serde::{Deserialize, Serialize};

use crate::analysis::severity::{Severity, SeverityGrader};
use crate::config::AnalysisConfig;
use crate::constants::wrinkles::COUNT_AREA_UNIT_PX;
use crate::detection::{EdgeTracer, GradientMap, WrinkleLine};
use crate::image_loader::PixelBuffer;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WrinkleMetrics {
    pub count: usize,
    /// Lines per 10 000 px of frame
    pub count_per_cm: f64,
    /// Mean line length in mm (0.1 mm per traced point)
    pub avg_length: f64,
    /// Mean edge strength, a depth proxy
    pub avg_depth: f64,
    /// Percentage of pixels with a strong gradient
    pub density_percent: f64,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WrinkleAnalysis {
    pub metrics: WrinkleMetrics,
    pub lines: Vec<WrinkleLine>,
}

pub struct WrinkleAnalyzer<'a> {
    config: &'a AnalysisConfig,
}

impl<'a> WrinkleAnalyzer<'a> {
    pub fn new(config: &'a AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn analyze(&self, image: &PixelBuffer) -> WrinkleAnalysis {
        let wr = &self.config.wrinkles;
        let map = GradientMap::compute(image);
        let lines = EdgeTracer::new(wr.edge_threshold, wr.max_line_points, wr.min_line_points)
            .trace(&map);

        let count = lines.len();
        let area_units = image.pixel_count() as f64 / COUNT_AREA_UNIT_PX;
        let count_per_cm = if area_units > 0.0 {
            count as f64 / area_units
        } else {
            0.0
        };
        let (avg_length, avg_depth) = if count == 0 {
            (0.0, 0.0)
        } else {
            let n = count as f64;
            (
                lines.iter().map(|l| l.length).sum::<f64>() / n * wr.mm_per_point,
                lines.iter().map(|l| l.strength).sum::<f64>() / n,
            )
        };
        let density_percent = map.strong_percent(wr.edge_threshold);

        let severity = SeverityGrader::new(&self.config.severity).wrinkles(
            count_per_cm,
            avg_length,
            avg_depth,
        );

        tracing::debug!(count, count_per_cm, avg_depth, "wrinkles measured");

        WrinkleAnalysis {
            metrics: WrinkleMetrics {
                count,
                count_per_cm,
                avg_length,
                avg_depth,
                density_percent,
                severity,
            },
            lines,
        }
    }
}
