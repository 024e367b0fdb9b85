//! Pixel-level segmentation and detection
//!
//! This module turns a pixel buffer into connected candidate regions:
//! per-pixel candidate masks, morphological noise suppression, bounded
//! flood fill, contour features, refinement of external rough boxes, and
//! Sobel edge tracing for line-shaped features.

pub mod contour;
pub mod edges;
pub mod hybrid;
pub mod mask;
pub mod morphology;
pub mod region;
#[cfg(feature = "remote-detector")]
pub mod remote;

pub use contour::{CenterPoint, ContourExtractor, RegionFeatures};
pub use edges::{EdgeTracer, GradientMap, WrinkleLine};
pub use hybrid::{
    box_label_for_class_id, request_boxes, DetectorError, HybridDetector, LabelBias,
    LesionBoxSource, RoughBox, StaticBoxes,
};
pub use mask::{BinaryMask, Window};
pub use morphology::MorphologyFilter;
pub use region::{BoundingBox, PixelPoint, Region, RegionSegmenter};
#[cfg(feature = "remote-detector")]
pub use remote::HttpBoxSource;
