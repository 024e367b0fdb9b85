//! Pixel color indices and skin tone color conversions
//!
//! This module holds the per-pixel measures every detector shares
//! (brightness, erythema index, luminance, distance from the baseline skin
//! tone) and the CIE L*a*b* description of the baseline skin tone.

pub mod conversion;
pub mod indices;

pub use conversion::{ItaCategory, SkinToneProfile};
pub use indices::{brightness, is_brown, is_skin, luminance, redness, skin_distance};
