//! Skin tone color space conversion
//!
//! Describes the baseline skin tone in CIE L*a*b* (D65) and derives the
//! Individual Typology Angle, `ITA° = atan2(L* - 50, b*)`, a common
//! colorimetric skin-type descriptor.

use palette::{FromColor, Lab, Srgb};
use serde::{Deserialize, Serialize};

use crate::calibration::SkinTone;

/// Skin type bands over ITA°
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ItaCategory {
    VeryLight,
    Light,
    Intermediate,
    Tan,
    Brown,
    Dark,
}

impl ItaCategory {
    /// Classify an ITA° angle (Chardon bands)
    pub fn from_angle(ita: f32) -> Self {
        if ita > 55.0 {
            ItaCategory::VeryLight
        } else if ita > 41.0 {
            ItaCategory::Light
        } else if ita > 28.0 {
            ItaCategory::Intermediate
        } else if ita > 10.0 {
            ItaCategory::Tan
        } else if ita > -30.0 {
            ItaCategory::Brown
        } else {
            ItaCategory::Dark
        }
    }
}

/// Baseline skin tone with its perceptual description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkinToneProfile {
    /// Mean RGB of the sampled skin
    pub tone: SkinTone,
    /// CIE L*a*b* coordinates
    pub lab: Lab,
    /// Individual Typology Angle in degrees
    pub ita_degrees: f32,
    pub category: ItaCategory,
    /// Hexadecimal color representation
    pub hex: String,
    /// False when the tone was supplied by the caller
    pub estimated: bool,
}

impl SkinToneProfile {
    pub fn new(tone: SkinTone, estimated: bool) -> Self {
        let lab = rgb_to_lab(&tone);
        let ita_degrees = (lab.l - 50.0).atan2(lab.b).to_degrees();
        Self {
            hex: to_hex(&tone),
            lab,
            ita_degrees,
            category: ItaCategory::from_angle(ita_degrees),
            tone,
            estimated,
        }
    }
}

/// Convert a 0-255 RGB skin tone to Lab
pub fn rgb_to_lab(tone: &SkinTone) -> Lab {
    let srgb = Srgb::new(
        (tone.r / 255.0).clamp(0.0, 1.0) as f32,
        (tone.g / 255.0).clamp(0.0, 1.0) as f32,
        (tone.b / 255.0).clamp(0.0, 1.0) as f32,
    );
    Lab::from_color(srgb)
}

/// Hex string of the rounded tone (e.g. "#C89682")
pub fn to_hex(tone: &SkinTone) -> String {
    let channel = |v: f64| v.round().clamp(0.0, 255.0) as u8;
    format!(
        "#{:02X}{:02X}{:02X}",
        channel(tone.r),
        channel(tone.g),
        channel(tone.b)
    )
}
