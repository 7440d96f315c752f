//! Connected-component search over a thresholded edge map.
//!
//! Pixels whose red channel exceeds [`EDGE_THRESHOLD`] are grouped with a
//! 4-connected flood fill driven by an explicit work-list (no recursion), and
//! each blob's bounding box is kept only if it looks like a plate.

use crate::preprocessing::raster::{RasterBuffer, Region};

/// Minimum edge magnitude (exclusive) for a pixel to join a blob
pub const EDGE_THRESHOLD: u8 = 50;
/// Accepted `width / height` range for a plate bounding box (inclusive)
pub const MIN_ASPECT_RATIO: f64 = 2.5;
pub const MAX_ASPECT_RATIO: f64 = 4.5;
/// Smallest plate bounding box area in pixels
pub const MIN_AREA: u64 = 1000;

/// Bounding box accumulator for one blob
struct BlobBounds {
    min_x: u32,
    max_x: u32,
    min_y: u32,
    max_y: u32,
}

impl BlobBounds {
    fn seed(x: u32, y: u32) -> Self {
        Self {
            min_x: x,
            max_x: x,
            min_y: y,
            max_y: y,
        }
    }

    fn include(&mut self, x: u32, y: u32) {
        self.min_x = self.min_x.min(x);
        self.max_x = self.max_x.max(x);
        self.min_y = self.min_y.min(y);
        self.max_y = self.max_y.max(y);
    }

    fn region(&self) -> Region {
        Region::new(
            self.min_x,
            self.min_y,
            self.max_x - self.min_x + 1,
            self.max_y - self.min_y + 1,
        )
    }
}

/// Plate shape filter: aspect ratio in `[2.5, 4.5]` and area of at least 1000
pub fn is_valid_plate_region(region: &Region) -> bool {
    let ratio = region.aspect_ratio();
    (MIN_ASPECT_RATIO..=MAX_ASPECT_RATIO).contains(&ratio) && region.area() >= MIN_AREA
}

/// Find plate-shaped blobs in an edge map, in raster-scan discovery order
pub fn find_regions(edges: &RasterBuffer) -> Vec<Region> {
    let (width, height) = edges.dimensions();
    let w = width as usize;
    let data = edges.pixels();
    let is_edge = |idx: usize| data[idx * 4] > EDGE_THRESHOLD;

    let mut visited = vec![false; w * height as usize];
    let mut stack: Vec<(u32, u32)> = Vec::new();
    let mut regions = Vec::new();
    let mut blobs = 0usize;

    for y in 0..height {
        for x in 0..width {
            let seed = y as usize * w + x as usize;
            if visited[seed] || !is_edge(seed) {
                continue;
            }

            visited[seed] = true;
            stack.push((x, y));
            let mut bounds = BlobBounds::seed(x, y);

            while let Some((cx, cy)) = stack.pop() {
                bounds.include(cx, cy);

                let neighbours = [
                    (cx > 0).then(|| (cx - 1, cy)),
                    (cx + 1 < width).then(|| (cx + 1, cy)),
                    (cy > 0).then(|| (cx, cy - 1)),
                    (cy + 1 < height).then(|| (cx, cy + 1)),
                ];
                for (nx, ny) in neighbours.into_iter().flatten() {
                    let idx = ny as usize * w + nx as usize;
                    if !visited[idx] && is_edge(idx) {
                        visited[idx] = true;
                        stack.push((nx, ny));
                    }
                }
            }

            blobs += 1;
            let region = bounds.region();
            if is_valid_plate_region(&region) {
                regions.push(region);
            }
        }
    }

    tracing::debug!(
        "Found {} edge blobs, {} plate-shaped",
        blobs,
        regions.len()
    );

    regions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::steps::{edges, grayscale};

    fn draw_rect(img: &mut RasterBuffer, region: Region, rgba: [u8; 4]) {
        for y in region.y..region.y + region.height {
            for x in region.x..region.x + region.width {
                img.put_pixel(x, y, rgba);
            }
        }
    }

    /// Edge map with the given blobs painted at full magnitude
    fn edge_map(width: u32, height: u32, blobs: &[Region]) -> RasterBuffer {
        let mut img = RasterBuffer::filled(width, height, [0, 0, 0, 255]);
        for blob in blobs {
            draw_rect(&mut img, *blob, [255, 255, 255, 255]);
        }
        img
    }

    #[test]
    fn test_plate_rectangle_yields_single_candidate() {
        let mut img = RasterBuffer::filled(800, 600, [0, 0, 0, 255]);
        draw_rect(&mut img, Region::new(235, 250, 330, 100), [255, 255, 255, 255]);

        let edges = edges::apply(&grayscale::apply(img));
        let regions = find_regions(&edges);

        assert_eq!(regions.len(), 1);
        let region = regions[0];
        // The Sobel band straddles the outline by one pixel on each side
        assert_eq!(region, Region::new(234, 249, 332, 102));
        assert!(region.fits_within(800, 600));
    }

    #[test]
    fn test_no_edges_yields_no_candidates() {
        let img = RasterBuffer::filled(200, 100, [40, 40, 40, 255]);
        let edges = edges::apply(&grayscale::apply(img));
        assert!(find_regions(&edges).is_empty());
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let mut img = edge_map(100, 40, &[]);
        draw_rect(&mut img, Region::new(0, 0, 90, 30), [50, 50, 50, 255]);
        assert!(find_regions(&img).is_empty());

        draw_rect(&mut img, Region::new(0, 0, 90, 30), [51, 51, 51, 255]);
        assert_eq!(find_regions(&img), vec![Region::new(0, 0, 90, 30)]);
    }

    #[test]
    fn test_aspect_and_area_filter() {
        let blobs = [
            Region::new(0, 0, 60, 60),    // ratio 1.0
            Region::new(100, 0, 200, 20), // ratio 10
            Region::new(0, 100, 30, 10),  // ratio 3, area 300
            Region::new(0, 150, 100, 40), // ratio 2.5, area 4000
            Region::new(200, 150, 90, 20), // ratio 4.5, area 1800
        ];
        let regions = find_regions(&edge_map(400, 300, &blobs));

        assert_eq!(regions, vec![blobs[3], blobs[4]]);
        for region in &regions {
            let ratio = region.aspect_ratio();
            assert!((MIN_ASPECT_RATIO..=MAX_ASPECT_RATIO).contains(&ratio));
            assert!(region.area() >= MIN_AREA);
        }
    }

    #[test]
    fn test_diagonal_pixels_are_not_connected() {
        // Two plate-shaped blocks touching only at a corner
        let blobs = [Region::new(0, 0, 90, 30), Region::new(90, 30, 90, 30)];
        let regions = find_regions(&edge_map(200, 80, &blobs));
        assert_eq!(regions, blobs.to_vec());
    }

    #[test]
    fn test_regions_reported_in_discovery_order() {
        let blobs = [Region::new(150, 5, 90, 30), Region::new(5, 50, 120, 40)];
        let regions = find_regions(&edge_map(300, 120, &blobs));
        assert_eq!(regions, blobs.to_vec());
    }

    #[test]
    fn test_large_blob_does_not_overflow_stack() {
        let edges = edge_map(1200, 400, &[Region::new(0, 0, 1200, 400)]);
        assert_eq!(find_regions(&edges), vec![Region::new(0, 0, 1200, 400)]);
    }

    #[test]
    fn test_regions_stay_inside_source() {
        let blobs = [Region::new(110, 80, 90, 20)];
        let edges = edge_map(200, 100, &blobs);
        for region in find_regions(&edges) {
            assert!(region.x + region.width <= edges.width());
            assert!(region.y + region.height <= edges.height());
        }
    }
}
