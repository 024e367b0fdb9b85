//! Morphological noise suppression on candidate masks
//!
//! One erosion pass followed by one 3x3 dilation pass (an opening with a
//! neighbor-count erosion). Isolated candidate pixels and thin threads are
//! removed; blobs that survive erosion regain roughly their original extent.

use crate::detection::mask::BinaryMask;

/// 8-neighborhood offsets, row-major
pub(crate) const NEIGHBORS_8: [(i64, i64); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Erosion-then-dilation filter
#[derive(Debug, Clone, Copy)]
pub struct MorphologyFilter {
    min_neighbors: u8,
}

impl Default for MorphologyFilter {
    fn default() -> Self {
        Self::new(3)
    }
}

impl MorphologyFilter {
    /// Filter keeping pixels with at least `min_neighbors` of 8 set neighbors
    pub fn new(min_neighbors: u8) -> Self {
        Self { min_neighbors }
    }

    /// Erode then dilate
    pub fn apply(&self, mask: &BinaryMask) -> BinaryMask {
        self.dilate(&self.erode(mask))
    }

    /// Keep set pixels with enough set 8-neighbors; pixels outside the
    /// window count as clear
    pub fn erode(&self, mask: &BinaryMask) -> BinaryMask {
        let mut out = BinaryMask::new(mask.window());
        for ly in 0..mask.height() {
            for lx in 0..mask.width() {
                if !mask.at(mask.index(lx, ly)) {
                    continue;
                }
                let set = NEIGHBORS_8
                    .iter()
                    .filter(|(dx, dy)| mask.get(lx as i64 + dx, ly as i64 + dy))
                    .count();
                if set >= self.min_neighbors as usize {
                    out.set(lx, ly, true);
                }
            }
        }
        out
    }

    /// Set the 3x3 neighborhood of every set pixel, clipped to the window
    pub fn dilate(&self, mask: &BinaryMask) -> BinaryMask {
        let (width, height) = (mask.width() as i64, mask.height() as i64);
        let mut out = BinaryMask::new(mask.window());
        for ly in 0..height {
            for lx in 0..width {
                if !mask.get(lx, ly) {
                    continue;
                }
                for ny in (ly - 1).max(0)..=(ly + 1).min(height - 1) {
                    for nx in (lx - 1).max(0)..=(lx + 1).min(width - 1) {
                        out.set(nx as u32, ny as u32, true);
                    }
                }
            }
        }
        out
    }
}
