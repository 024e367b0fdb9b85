//! Sobel gradients and line tracing for wrinkle detection

use image::{ImageBuffer, Luma};
use imageproc::filter::filter3x3;
use serde::{Deserialize, Serialize};

use crate::color::luminance;
use crate::detection::morphology::NEIGHBORS_8;
use crate::detection::region::PixelPoint;
use crate::image_loader::PixelBuffer;

const SOBEL_X: [f32; 9] = [-1.0, 0.0, 1.0, -2.0, 0.0, 2.0, -1.0, 0.0, 1.0];
const SOBEL_Y: [f32; 9] = [-1.0, -2.0, -1.0, 0.0, 0.0, 0.0, 1.0, 2.0, 1.0];

/// Gradient magnitude per pixel, clamped to [0, 255]
///
/// The one-pixel frame has no full 3x3 neighborhood and is left at zero.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientMap {
    width: u32,
    height: u32,
    magnitude: Vec<f64>,
}

impl GradientMap {
    /// Sobel pass over the luminance of `image`
    pub fn compute(image: &PixelBuffer) -> Self {
        let (width, height) = (image.width(), image.height());
        let luma: ImageBuffer<Luma<f32>, Vec<f32>> =
            ImageBuffer::from_fn(width, height, |x, y| Luma([luminance(image.rgb(x, y)) as f32]));

        let gx: Vec<f32> = filter3x3(&luma, &SOBEL_X).into_raw();
        let gy: Vec<f32> = filter3x3(&luma, &SOBEL_Y).into_raw();

        let w = width as usize;
        let mut magnitude = vec![0.0; image.pixel_count()];
        for y in 1..height.saturating_sub(1) as usize {
            for x in 1..width.saturating_sub(1) as usize {
                let i = y * w + x;
                let (dx, dy) = (gx[i] as f64, gy[i] as f64);
                magnitude[i] = (dx * dx + dy * dy).sqrt().min(255.0);
            }
        }

        Self {
            width,
            height,
            magnitude,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Magnitude at `(x, y)`; zero outside the map
    pub fn at(&self, x: i64, y: i64) -> f64 {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return 0.0;
        }
        self.magnitude[y as usize * self.width as usize + x as usize]
    }

    /// Percentage of pixels whose magnitude exceeds `threshold`
    pub fn strong_percent(&self, threshold: f64) -> f64 {
        if self.magnitude.is_empty() {
            return 0.0;
        }
        let strong = self.magnitude.iter().filter(|m| **m > threshold).count();
        strong as f64 / self.magnitude.len() as f64 * 100.0
    }
}

/// One traced edge chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WrinkleLine {
    pub points: Vec<PixelPoint>,
    /// Point count
    pub length: f64,
    /// Mean gradient magnitude along the chain, a depth proxy
    pub strength: f64,
}

/// Bounded 8-connected tracing over strong gradients
#[derive(Debug, Clone, Copy)]
pub struct EdgeTracer {
    threshold: f64,
    max_points: usize,
    min_points: usize,
}

impl EdgeTracer {
    pub fn new(threshold: f64, max_points: usize, min_points: usize) -> Self {
        Self {
            threshold,
            max_points: max_points.max(1),
            min_points,
        }
    }

    /// Trace lines in row-major seed order
    pub fn trace(&self, map: &GradientMap) -> Vec<WrinkleLine> {
        let (width, height) = (map.width() as usize, map.height() as usize);
        let mut visited = vec![false; width * height];
        let mut lines = Vec::new();
        let mut chain: Vec<usize> = Vec::with_capacity(self.max_points);

        for seed in 0..width * height {
            if visited[seed] || map.magnitude[seed] <= self.threshold {
                continue;
            }
            chain.clear();
            visited[seed] = true;
            chain.push(seed);
            let mut head = 0;
            while head < chain.len() {
                let idx = chain[head];
                head += 1;
                let (x, y) = ((idx % width) as i64, (idx / width) as i64);
                for (dx, dy) in NEIGHBORS_8 {
                    if chain.len() >= self.max_points {
                        break;
                    }
                    let (nx, ny) = (x + dx, y + dy);
                    if map.at(nx, ny) <= self.threshold {
                        continue;
                    }
                    let n = ny as usize * width + nx as usize;
                    if !visited[n] {
                        visited[n] = true;
                        chain.push(n);
                    }
                }
            }

            if chain.len() < self.min_points {
                continue;
            }
            let strength =
                chain.iter().map(|&i| map.magnitude[i]).sum::<f64>() / chain.len() as f64;
            lines.push(WrinkleLine {
                points: chain
                    .iter()
                    .map(|&i| PixelPoint::new((i % width) as u32, (i / width) as u32))
                    .collect(),
                length: chain.len() as f64,
                strength,
            });
        }

        tracing::debug!(lines = lines.len(), "edge tracing complete");
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use palette::Srgb;

    #[test]
    fn test_flat_image_has_no_gradient() {
        let image = PixelBuffer::filled(10, 10, Srgb::new(200, 150, 130));
        let map = GradientMap::compute(&image);
        assert_eq!(map.strong_percent(0.0), 0.0);
    }

    #[test]
    fn test_step_edge_saturates() {
        let mut image = PixelBuffer::filled(10, 10, Srgb::new(0, 0, 0));
        for y in 0..10 {
            for x in 5..10 {
                image.set_rgb(x, y, Srgb::new(255, 255, 255));
            }
        }
        let map = GradientMap::compute(&image);
        assert_eq!(map.at(4, 5), 255.0);
        assert_eq!(map.at(5, 5), 255.0);
        assert_eq!(map.at(2, 5), 0.0);
        // Frame pixels are never computed
        assert_eq!(map.at(0, 5), 0.0);
        assert_eq!(map.at(4, 0), 0.0);
    }

    #[test]
    fn test_single_pixel_response() {
        let mut image = PixelBuffer::filled(12, 12, Srgb::new(0, 0, 0));
        image.set_rgb(5, 5, Srgb::new(100, 100, 100));
        let map = GradientMap::compute(&image);
        // Centre column weight 2, diagonal weights 1 on both axes
        assert!((map.at(6, 5) - 200.0).abs() < 1e-3);
        assert!((map.at(6, 6) - 100.0 * 2f64.sqrt()).abs() < 1e-3);
        assert_eq!(map.at(5, 5), 0.0);
        assert_eq!(map.at(8, 5), 0.0);
    }

    #[test]
    fn test_dark_line_traced() {
        let mut image = PixelBuffer::filled(60, 30, Srgb::new(200, 150, 130));
        for x in 10..50 {
            image.set_rgb(x, 15, Srgb::new(90, 60, 50));
        }
        let map = GradientMap::compute(&image);
        let lines = EdgeTracer::new(128.0, 200, 10).trace(&map);
        assert!(!lines.is_empty());
        assert!(lines.iter().all(|l| l.length >= 10.0 && l.length <= 200.0));
        assert!(lines.iter().all(|l| l.strength > 128.0));
        assert!(map.strong_percent(128.0) > 0.0);
    }

    #[test]
    fn test_short_chains_discarded() {
        let mut image = PixelBuffer::filled(30, 30, Srgb::new(200, 150, 130));
        image.set_rgb(15, 15, Srgb::new(0, 0, 0));
        let map = GradientMap::compute(&image);
        assert!(EdgeTracer::new(128.0, 200, 10).trace(&map).is_empty());
    }

    #[test]
    fn test_line_cap() {
        let mut image = PixelBuffer::filled(120, 20, Srgb::new(0, 0, 0));
        for y in 10..20 {
            for x in 0..120 {
                image.set_rgb(x, y, Srgb::new(255, 255, 255));
            }
        }
        let map = GradientMap::compute(&image);
        let lines = EdgeTracer::new(128.0, 50, 10).trace(&map);
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| l.points.len() <= 50));
    }
}
