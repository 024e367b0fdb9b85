//! # Skinquant
//!
//! A Rust crate for quantifying acne, hyperpigmentation and wrinkles in
//! facial photographs.
//!
//! This library provides calibrated skin measurements by:
//! - Deriving a physical scale from a reference object or a face-width heuristic
//! - Estimating a baseline skin tone from the frame centre
//! - Segmenting lesion, brown spot and line candidates with bounded flood fills
//! - Optionally refining rough boxes from an external object detector
//! - Classifying lesions and grading each condition as Mild, Moderate or Severe
//!
//! ## Example
//!
//! ```rust,no_run
//! use skinquant::{analyze_skin, image_loader, AnalysisInput};
//! use std::path::Path;
//!
//! let pixels = image_loader::load_pixels(Path::new("face.jpg"))?;
//! let result = analyze_skin(&AnalysisInput::new(pixels))?;
//! if let Some(acne) = &result.acne {
//!     println!("{} lesions, {}", acne.metrics.total_count, acne.metrics.severity);
//! }
//! # Ok::<(), skinquant::AnalysisError>(())
//! ```

pub mod analysis;
pub mod calibration;
pub mod color;
pub mod config;
pub mod constants;
pub mod detection;
pub mod error;
pub mod image_loader;
pub mod pipeline;

pub use analysis::{
    AcneAnalysis, AcneMetrics, DetectionMode, Lesion, LesionKind, PigmentationAnalysis,
    PigmentationMetrics, Roi, RoiName, Severity, WrinkleAnalysis, WrinkleMetrics,
};
pub use calibration::{CalibrationData, CalibrationInput, ReferenceKind, SkinTone};
pub use color::SkinToneProfile;
pub use config::AnalysisConfig;
pub use detection::{DetectorError, LesionBoxSource, RoughBox, StaticBoxes};
pub use error::{AnalysisError, Result};
pub use image_loader::PixelBuffer;
pub use pipeline::{AnalysisInput, AnalysisKind, AnalysisResult, SkinAnalyzer};

/// Analyse a photo with the default configuration
///
/// This is the main entry point for one-off analyses. Build a
/// [`SkinAnalyzer`] to reuse a configuration or attach a detector.
///
/// # Arguments
///
/// * `input` - Pixels, calibration and options for one photo
///
/// # Returns
///
/// An `AnalysisResult` with the metrics and severity of each requested
/// condition
///
/// # Errors
///
/// Returns `AnalysisError` if the calibration does not yield a positive
/// pixels-per-millimetre scale.
pub fn analyze_skin(input: &AnalysisInput) -> Result<AnalysisResult> {
    SkinAnalyzer::default().analyze(input)
}
