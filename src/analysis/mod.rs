//! Condition analysis: classification, filtering, aggregation and grading
//!
//! Each condition module turns detection output into a metrics record:
//!
//! - [`acne`]: lesion classification, false-positive filtering, ROI density
//!   and pore metrics
//! - [`pigmentation`]: brightness histogram index and brown spot statistics
//! - [`wrinkles`]: traced line statistics
//! - [`severity`]: the Mild / Moderate / Severe graders shared by all three

pub mod acne;
pub mod filter;
pub mod lesion;
pub mod pigmentation;
pub mod pores;
pub mod roi;
pub mod severity;
pub mod wrinkles;

pub use acne::{AcneAnalysis, AcneAnalyzer, AcneMetrics, DetectionMode};
pub use filter::FalsePositiveFilter;
pub use lesion::{Lesion, LesionClassifier, LesionKind};
pub use pigmentation::{
    HistogramScorer, PigmentationAnalysis, PigmentationAnalyzer, PigmentationMetrics,
    PigmentedRegion,
};
pub use pores::{PoreDetector, PoreMetrics};
pub use roi::{Roi, RoiAggregator, RoiName, RoiRect};
pub use severity::{Severity, SeverityGrader};
pub use wrinkles::{WrinkleAnalysis, WrinkleAnalyzer, WrinkleMetrics};
