//! Pixels-per-millimetre calibration
//!
//! The scale comes from a reference object of known size measured on screen
//! (a coin or a fingertip), or, without one, from the assumption that the
//! face spans about half the frame width and is about 100 mm wide.

use serde::{Deserialize, Serialize};

use crate::constants::calibration::{
    COIN_DIAMETER_MM, FACE_FRAME_FRACTION, FACE_WIDTH_MM, FINGER_WIDTH_MM, MM2_PER_CM2,
};
use crate::error::{AnalysisError, Result};

/// Reference object held next to the face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceKind {
    #[default]
    None,
    Coin,
    Finger,
}

impl ReferenceKind {
    /// Physical size assumed when the caller gives none
    pub fn default_size_mm(self) -> Option<f64> {
        match self {
            ReferenceKind::None => None,
            ReferenceKind::Coin => Some(COIN_DIAMETER_MM),
            ReferenceKind::Finger => Some(FINGER_WIDTH_MM),
        }
    }
}

/// Calibration request as supplied by the capture screen
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationInput {
    pub reference_kind: ReferenceKind,
    /// Physical size of the reference; defaults per kind when absent
    pub reference_size_mm: Option<f64>,
    /// Measured on-screen size of the reference in image pixels
    pub reference_pixels: Option<f64>,
}

impl CalibrationInput {
    /// Calibrate against a measured reference object
    pub fn with_reference(kind: ReferenceKind, size_mm: f64, pixels: f64) -> Self {
        Self {
            reference_kind: kind,
            reference_size_mm: Some(size_mm),
            reference_pixels: Some(pixels),
        }
    }
}

/// Resolved physical scale of an image
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationData {
    pub reference_kind: ReferenceKind,
    pub reference_size_mm: Option<f64>,
    pub reference_pixels: Option<f64>,
    /// Always finite and positive
    pub pixels_per_mm: f64,
}

impl CalibrationData {
    /// Pixel area to square millimetres
    #[inline]
    pub fn area_mm2(&self, area_px: f64) -> f64 {
        area_px / (self.pixels_per_mm * self.pixels_per_mm)
    }

    /// Pixel length to millimetres
    #[inline]
    pub fn length_mm(&self, length_px: f64) -> f64 {
        length_px / self.pixels_per_mm
    }

    /// Area of a `width x height` pixel rectangle in cm²
    pub fn rect_area_cm2(&self, width_px: f64, height_px: f64) -> f64 {
        self.length_mm(width_px) * self.length_mm(height_px) / MM2_PER_CM2
    }

    /// True when the heuristic face-width scale was used
    pub fn is_heuristic(&self) -> bool {
        self.reference_pixels.is_none() || self.reference_kind == ReferenceKind::None
    }
}

/// Derives the pixels-per-millimetre scale
#[derive(Debug, Clone, Copy, Default)]
pub struct CalibrationService;

impl CalibrationService {
    pub fn new() -> Self {
        Self
    }

    /// Resolve the image scale
    ///
    /// Without a reference (kind `None` or no measured pixels) the scale is
    /// `image_width * 0.5 / 100 mm`. Otherwise it is
    /// `reference_pixels / reference_size_mm`.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::InvalidCalibration`] when the resulting scale
    /// is not a finite positive number (zero image width, zero or negative
    /// measurement).
    pub fn calibrate(&self, input: &CalibrationInput, image_width: u32) -> Result<CalibrationData> {
        let reference = match (input.reference_kind, input.reference_pixels) {
            (ReferenceKind::None, _) | (_, None) => None,
            (kind, Some(pixels)) => {
                let size_mm = input
                    .reference_size_mm
                    .or_else(|| kind.default_size_mm())
                    .unwrap_or(f64::NAN);
                Some((size_mm, pixels))
            }
        };

        let (reference_size_mm, reference_pixels, pixels_per_mm) = match reference {
            Some((size_mm, pixels)) => (Some(size_mm), Some(pixels), pixels / size_mm),
            None => (
                input.reference_size_mm,
                None,
                image_width as f64 * FACE_FRAME_FRACTION / FACE_WIDTH_MM,
            ),
        };

        if !pixels_per_mm.is_finite() || pixels_per_mm <= 0.0 {
            return Err(AnalysisError::InvalidCalibration { pixels_per_mm });
        }

        tracing::debug!(
            kind = ?input.reference_kind,
            pixels_per_mm,
            "calibration resolved"
        );

        Ok(CalibrationData {
            reference_kind: input.reference_kind,
            reference_size_mm,
            reference_pixels,
            pixels_per_mm,
        })
    }
}
