//! Bounded connected-region segmentation
//!
//! ## Algorithm
//!
//! The mask is scanned row-major. Every unvisited set pixel seeds a
//! 4-connected breadth-first flood fill. The region's member list doubles as
//! the FIFO (a head cursor walks it), and is capped at `max_pixels`: once the
//! cap is hit no further pixels are enqueued, and pixels left out stay
//! unvisited so a later seed may start a new region from them. The scan
//! therefore costs O(window area) however the mask looks.
//!
//! A member is recorded as a contour pixel when any of its 8 neighbors is
//! clear in the mask or falls outside the window. In hybrid mode the window
//! is the padded box, so the patch edge counts as a boundary.

use serde::{Deserialize, Serialize};

use crate::detection::mask::BinaryMask;
use crate::detection::morphology::NEIGHBORS_8;
use crate::image_loader::PixelBuffer;

const NEIGHBORS_4: [(i64, i64); 4] = [(0, -1), (-1, 0), (1, 0), (0, 1)];

/// Pixel coordinate in image space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: u32,
    pub y: u32,
}

impl PixelPoint {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// Inclusive pixel bounding box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

impl BoundingBox {
    /// Box around a single pixel
    pub fn at(p: PixelPoint) -> Self {
        Self {
            min_x: p.x,
            min_y: p.y,
            max_x: p.x,
            max_y: p.y,
        }
    }

    pub fn include(&mut self, p: PixelPoint) {
        self.min_x = self.min_x.min(p.x);
        self.min_y = self.min_y.min(p.y);
        self.max_x = self.max_x.max(p.x);
        self.max_y = self.max_y.max(p.y);
    }

    pub fn width(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    pub fn height(&self) -> u32 {
        self.max_y - self.min_y + 1
    }

    /// Width over height
    pub fn aspect_ratio(&self) -> f64 {
        self.width() as f64 / self.height() as f64
    }

    /// Geometric centre in pixel coordinates
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_x as f64 + self.max_x as f64) / 2.0,
            (self.min_y as f64 + self.max_y as f64) / 2.0,
        )
    }

    pub fn contains(&self, p: PixelPoint) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }
}

/// Connected set of mask pixels with running color sums
#[derive(Debug, Clone)]
pub struct Region {
    /// Members in visiting order
    pub pixels: Vec<PixelPoint>,
    /// Members touching the mask boundary
    pub contour: Vec<PixelPoint>,
    pub bbox: BoundingBox,
    /// Channel sums over all members
    pub sum_rgb: [f64; 3],
}

impl Region {
    pub fn area(&self) -> usize {
        self.pixels.len()
    }

    /// Mean member color
    pub fn mean_rgb(&self) -> [f64; 3] {
        let n = self.pixels.len().max(1) as f64;
        [self.sum_rgb[0] / n, self.sum_rgb[1] / n, self.sum_rgb[2] / n]
    }

    /// Mean of member centroid coordinates
    pub fn centroid(&self) -> (f64, f64) {
        let n = self.pixels.len().max(1) as f64;
        let (sx, sy) = self
            .pixels
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x as f64, sy + p.y as f64));
        (sx / n, sy / n)
    }
}

/// Bounded 4-connected flood fill over a mask
#[derive(Debug, Clone, Copy)]
pub struct RegionSegmenter {
    max_pixels: usize,
    min_pixels: usize,
    patch_edges: bool,
    whole_components: bool,
}

impl RegionSegmenter {
    /// # Arguments
    ///
    /// * `max_pixels` - Hard cap on a single region's size
    /// * `min_pixels` - Regions smaller than this are discarded
    pub fn new(max_pixels: usize, min_pixels: usize) -> Self {
        Self {
            max_pixels: max_pixels.max(1),
            min_pixels,
            patch_edges: false,
            whole_components: false,
        }
    }

    /// Count the mask window's edge as contour (hybrid patches)
    ///
    /// Without this only image bounds and clear mask pixels bound a region.
    pub fn with_patch_edges(mut self) -> Self {
        self.patch_edges = true;
        self
    }

    /// Drop a connected component outright when it exceeds the cap
    ///
    /// By default the fill stops at the cap and the remaining pixels seed
    /// later regions.
    pub fn whole_components_only(mut self) -> Self {
        self.whole_components = true;
        self
    }

    /// Extract regions from `mask`, reading colors from `image`
    ///
    /// Regions are returned in seed order (row-major over the window).
    pub fn segment(&self, mask: &BinaryMask, image: &PixelBuffer) -> Vec<Region> {
        let window = mask.window();
        let mut visited = vec![false; window.area()];
        let mut regions = Vec::new();
        let mut members: Vec<usize> = Vec::with_capacity(self.max_pixels);

        for seed in 0..window.area() {
            if visited[seed] || !mask.at(seed) {
                continue;
            }

            members.clear();
            visited[seed] = true;
            members.push(seed);
            let mut head = 0;
            while head < members.len() {
                let idx = members[head];
                head += 1;
                let (lx, ly) = (
                    (idx % window.width as usize) as i64,
                    (idx / window.width as usize) as i64,
                );
                for (dx, dy) in NEIGHBORS_4 {
                    if !self.whole_components && members.len() >= self.max_pixels {
                        break;
                    }
                    let (nx, ny) = (lx + dx, ly + dy);
                    if !mask.get(nx, ny) {
                        continue;
                    }
                    let n = mask.index(nx as u32, ny as u32);
                    if !visited[n] {
                        visited[n] = true;
                        members.push(n);
                    }
                }
            }

            if members.len() < self.min_pixels || members.len() > self.max_pixels {
                continue;
            }
            regions.push(self.build_region(&members, mask, image));
        }

        tracing::debug!(regions = regions.len(), "segmentation complete");
        regions
    }

    fn build_region(&self, members: &[usize], mask: &BinaryMask, image: &PixelBuffer) -> Region {
        let window = mask.window();
        let mut pixels = Vec::with_capacity(members.len());
        let mut contour = Vec::new();
        let mut sum_rgb = [0.0; 3];
        let mut bbox: Option<BoundingBox> = None;

        for &idx in members {
            let lx = (idx % window.width as usize) as u32;
            let ly = (idx / window.width as usize) as u32;
            let p = PixelPoint::new(window.x0 + lx, window.y0 + ly);

            let px = image.rgb(p.x, p.y);
            sum_rgb[0] += px.red as f64;
            sum_rgb[1] += px.green as f64;
            sum_rgb[2] += px.blue as f64;

            match bbox.as_mut() {
                Some(b) => b.include(p),
                None => bbox = Some(BoundingBox::at(p)),
            }

            let on_edge = NEIGHBORS_8.iter().any(|(dx, dy)| {
                let (nx, ny) = (lx as i64 + dx, ly as i64 + dy);
                if mask.contains_local(nx, ny) {
                    return !mask.get(nx, ny);
                }
                let (gx, gy) = (p.x as i64 + dx, p.y as i64 + dy);
                let in_image =
                    gx >= 0 && gy >= 0 && gx < image.width() as i64 && gy < image.height() as i64;
                self.patch_edges || !in_image
            });
            if on_edge {
                contour.push(p);
            }
            pixels.push(p);
        }

        Region {
            pixels,
            contour,
            bbox: bbox.unwrap_or(BoundingBox::at(PixelPoint::new(window.x0, window.y0))),
            sum_rgb,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::mask::Window;
    use palette::Srgb;

    fn mask_of(image: &PixelBuffer, on: impl Fn(u32, u32) -> bool) -> BinaryMask {
        BinaryMask::from_fn(Window::full(image), on)
    }

    #[test]
    fn test_two_separate_blocks() {
        let image = PixelBuffer::filled(20, 20, Srgb::new(200, 150, 130));
        let mask = mask_of(&image, |x, y| {
            (2..5).contains(&x) && (2..5).contains(&y) || (10..14).contains(&x) && (10..14).contains(&y)
        });
        let regions = RegionSegmenter::new(400, 2).segment(&mask, &image);
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].area(), 9);
        assert_eq!(regions[1].area(), 16);
        assert_eq!(
            regions[1].bbox,
            BoundingBox { min_x: 10, min_y: 10, max_x: 13, max_y: 13 }
        );
    }

    #[test]
    fn test_contour_of_square() {
        let image = PixelBuffer::filled(10, 10, Srgb::new(200, 150, 130));
        let mask = mask_of(&image, |x, y| (3..6).contains(&x) && (3..6).contains(&y));
        let regions = RegionSegmenter::new(400, 2).segment(&mask, &image);
        assert_eq!(regions[0].contour.len(), 8);
        assert!(!regions[0].contour.contains(&PixelPoint::new(4, 4)));
    }

    #[test]
    fn test_diagonal_pixels_are_separate_regions() {
        let image = PixelBuffer::filled(6, 6, Srgb::new(200, 150, 130));
        let mask = mask_of(&image, |x, y| (x, y) == (1, 1) || (x, y) == (2, 2));
        let regions = RegionSegmenter::new(400, 1).segment(&mask, &image);
        assert_eq!(regions.len(), 2);
    }

    #[test]
    fn test_region_cap_leaves_rest_for_later_seeds() {
        let image = PixelBuffer::filled(10, 10, Srgb::new(200, 150, 130));
        let mask = mask_of(&image, |_, _| true);
        let regions = RegionSegmenter::new(30, 1).segment(&mask, &image);
        assert!(regions.iter().all(|r| r.area() <= 30));
        let total: usize = regions.iter().map(Region::area).sum();
        assert_eq!(total, 100);
    }

    #[test]
    fn test_small_regions_discarded() {
        let image = PixelBuffer::filled(10, 10, Srgb::new(200, 150, 130));
        let mask = mask_of(&image, |x, y| x == 2 && y < 3);
        assert!(RegionSegmenter::new(400, 10).segment(&mask, &image).is_empty());
    }

    #[test]
    fn test_patch_edge_is_contour() {
        let image = PixelBuffer::filled(10, 10, Srgb::new(200, 150, 130));
        let mask = BinaryMask::from_fn(Window::from_bounds(2, 2, 5, 5), |_, _| true);
        let regions = RegionSegmenter::new(400, 2)
            .with_patch_edges()
            .segment(&mask, &image);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].contour.len(), 8);
        assert_eq!(regions[0].bbox.min_x, 2);
    }

    #[test]
    fn test_interior_window_edge_is_not_contour() {
        let image = PixelBuffer::filled(20, 20, Srgb::new(200, 150, 130));
        // Block hugging the top-left corner of a 5 px interior window
        let mask = BinaryMask::from_fn(Window::interior(&image, 5), |x, y| x < 9 && y < 9);
        let regions = RegionSegmenter::new(400, 2).segment(&mask, &image);
        assert_eq!(regions[0].area(), 16);
        // Only the right column and bottom row border clear mask pixels
        assert_eq!(regions[0].contour.len(), 7);
        assert!(!regions[0].contour.contains(&PixelPoint::new(5, 5)));
        assert!(regions[0].contour.contains(&PixelPoint::new(8, 8)));
    }

    #[test]
    fn test_image_bounds_are_contour() {
        let image = PixelBuffer::filled(6, 6, Srgb::new(200, 150, 130));
        let mask = mask_of(&image, |x, y| x < 2 && y < 2);
        let regions = RegionSegmenter::new(400, 2).segment(&mask, &image);
        assert_eq!(regions[0].contour.len(), 4);
    }

    #[test]
    fn test_over_cap_component_dropped_whole() {
        let image = PixelBuffer::filled(30, 30, Srgb::new(200, 150, 130));
        // 21 x 20 block is just over a 400 px cap; a 2 x 2 speck is kept
        let mask = mask_of(&image, |x, y| {
            (2..23).contains(&x) && (2..22).contains(&y) || (26..28).contains(&x) && (26..28).contains(&y)
        });
        let regions = RegionSegmenter::new(400, 2)
            .whole_components_only()
            .segment(&mask, &image);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].area(), 4);
        assert_eq!(regions[0].bbox.min_x, 26);
    }

    #[test]
    fn test_color_sums() {
        let mut image = PixelBuffer::filled(5, 5, Srgb::new(200, 150, 130));
        image.set_rgb(1, 1, Srgb::new(100, 50, 30));
        let mask = mask_of(&image, |x, y| y == 1 && (1..3).contains(&x));
        let regions = RegionSegmenter::new(400, 2).segment(&mask, &image);
        assert_eq!(regions[0].mean_rgb(), [150.0, 100.0, 80.0]);
        assert_eq!(regions[0].centroid(), (1.5, 1.0));
    }

    #[test]
    fn test_bounding_box_geometry() {
        let b = BoundingBox { min_x: 2, min_y: 4, max_x: 7, max_y: 6 };
        assert_eq!(b.width(), 6);
        assert_eq!(b.height(), 3);
        assert_eq!(b.aspect_ratio(), 2.0);
        assert_eq!(b.center(), (4.5, 5.0));
        assert!(b.contains(PixelPoint::new(7, 6)));
        assert!(!b.contains(PixelPoint::new(8, 6)));
    }
}
