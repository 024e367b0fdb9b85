//! Decoded RGBA pixel buffers
//!
//! The analysis engine consumes an already decoded, row-major RGBA buffer.
//! This module owns that buffer type and the thin adapters from the `image`
//! crate used by the demos and tests.
//!
//! ## Design
//!
//! Pixels are addressed either by `(x, y)` or by the flat index
//! `y * width + x`, the same index space every mask and visited arena in
//! [`crate::detection`] uses.

use image::{DynamicImage, RgbaImage};
use palette::Srgb;
use std::path::Path;

use crate::error::{AnalysisError, Result};

/// Bytes per RGBA pixel
pub const CHANNELS: usize = 4;

/// Row-major RGBA8 image with validated dimensions.
///
/// Invariant: `data.len() == width * height * 4`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap a raw RGBA byte buffer
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::InvalidInput`] for a zero dimension and
    /// [`AnalysisError::DimensionMismatch`] when the byte count is not
    /// `width * height * 4`.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(AnalysisError::InvalidInput {
                reason: format!("image dimensions {}x{} are empty", width, height),
            });
        }
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(CHANNELS))
            .ok_or_else(|| AnalysisError::InvalidInput {
                reason: format!("image dimensions {}x{} overflow", width, height),
            })?;
        if data.len() != expected {
            return Err(AnalysisError::DimensionMismatch {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { width, height, data })
    }

    /// Opaque image of a single color
    pub fn filled(width: u32, height: u32, color: Srgb<u8>) -> Self {
        let pixel = [color.red, color.green, color.blue, 255];
        let data = pixel
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * CHANNELS)
            .collect();
        Self { width, height, data }
    }

    /// Convert a decoded `image` buffer
    pub fn from_rgba_image(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            data: image.into_raw(),
        }
    }

    /// Copy back into an `image` buffer (for encoding)
    pub fn to_rgba_image(&self) -> Option<RgbaImage> {
        RgbaImage::from_raw(self.width, self.height, self.data.clone())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of pixels
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Flat pixel index of `(x, y)`
    #[inline]
    pub fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Color at `(x, y)`; alpha is ignored
    #[inline]
    pub fn rgb(&self, x: u32, y: u32) -> Srgb<u8> {
        self.rgb_at(self.index(x, y))
    }

    /// Color at flat pixel index
    #[inline]
    pub fn rgb_at(&self, index: usize) -> Srgb<u8> {
        let offset = index * CHANNELS;
        Srgb::new(self.data[offset], self.data[offset + 1], self.data[offset + 2])
    }

    /// Overwrite the color at `(x, y)` (alpha becomes opaque)
    pub fn set_rgb(&mut self, x: u32, y: u32, color: Srgb<u8>) {
        let offset = self.index(x, y) * CHANNELS;
        self.data[offset] = color.red;
        self.data[offset + 1] = color.green;
        self.data[offset + 2] = color.blue;
        self.data[offset + 3] = 255;
    }
}

impl From<RgbaImage> for PixelBuffer {
    fn from(image: RgbaImage) -> Self {
        Self::from_rgba_image(image)
    }
}

impl From<DynamicImage> for PixelBuffer {
    fn from(image: DynamicImage) -> Self {
        Self::from_rgba_image(image.to_rgba8())
    }
}

/// Load an image file and convert it to a [`PixelBuffer`]
///
/// # Errors
///
/// Returns [`AnalysisError::ImageLoadError`] if the file cannot be opened or decoded.
///
/// # Example
///
/// ```rust,no_run
/// use skinquant::image_loader::load_pixels;
/// use std::path::Path;
///
/// let pixels = load_pixels(Path::new("face.jpg"))?;
/// println!("Loaded image: {}x{}", pixels.width(), pixels.height());
/// # Ok::<(), skinquant::AnalysisError>(())
/// ```
pub fn load_pixels(path: &Path) -> Result<PixelBuffer> {
    let image = image::open(path).map_err(|e| {
        AnalysisError::image_load(format!("cannot decode {}", path.display()), e)
    })?;
    Ok(PixelBuffer::from(image))
}

/// File extensions the loader decodes
pub fn supported_extensions() -> &'static [&'static str] {
    &["jpg", "jpeg", "png"]
}

/// Check whether an extension (without dot, any case) is supported
pub fn is_supported_extension(ext: &str) -> bool {
    let ext = ext.to_lowercase();
    supported_extensions().contains(&ext.as_str())
}
