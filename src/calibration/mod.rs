//! Physical scale and baseline skin tone calibration
//!
//! Both calibrations run once per analysis, before any detector: the
//! pixels-per-millimetre scale converts every area and length the detectors
//! measure, and the skin tone is the reference every color predicate is
//! relative to.

pub mod scale;
pub mod skin_tone;

pub use scale::{CalibrationData, CalibrationInput, CalibrationService, ReferenceKind};
pub use skin_tone::{SkinTone, SkinToneEstimator};
