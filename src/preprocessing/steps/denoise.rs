use crate::preprocessing::kernel::{convolve_rgb, Kernel};
use crate::preprocessing::raster::RasterBuffer;

/// Default blur radius
pub const DEFAULT_RADIUS: u32 = 1;

/// Apply a full 2D Gaussian blur of the given radius.
/// Pixels within `radius` of the edge keep their original values.
pub fn apply(buffer: RasterBuffer, radius: u32) -> RasterBuffer {
    if radius == 0 {
        return buffer;
    }

    // No pixel has full kernel support, so skip building the kernel at all
    let (width, height) = buffer.dimensions();
    match radius.checked_mul(2).and_then(|d| d.checked_add(1)) {
        Some(size) if size <= width && size <= height => {}
        _ => return buffer,
    }

    let kernel = Kernel::gaussian(radius);
    convolve_rgb(&buffer, &kernel)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calculate_variance(img: &RasterBuffer) -> f64 {
        let values: Vec<f64> = img.pixels().chunks(4).map(|p| p[0] as f64).collect();
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64
    }

    #[test]
    fn test_denoise_reduces_isolated_noise() {
        let mut img = RasterBuffer::filled(10, 10, [128, 128, 128, 255]);
        img.put_pixel(5, 5, [0, 0, 0, 255]);
        img.put_pixel(6, 5, [255, 255, 255, 255]);

        let result = apply(img.clone(), 2);

        assert!(calculate_variance(&result) < calculate_variance(&img));
    }

    #[test]
    fn test_denoise_keeps_uniform_image() {
        let img = RasterBuffer::filled(8, 8, [90, 90, 90, 200]);
        assert_eq!(apply(img.clone(), DEFAULT_RADIUS), img);
    }

    #[test]
    fn test_denoise_leaves_border_of_radius_width() {
        let mut img = RasterBuffer::filled(12, 12, [50, 50, 50, 255]);
        img.put_pixel(1, 1, [250, 250, 250, 255]);
        img.put_pixel(3, 3, [250, 250, 250, 255]);

        let result = apply(img, 2);

        // (1,1) lies in the 2-pixel border
        assert_eq!(result.pixel(1, 1), [250, 250, 250, 255]);
        // (3,3) is interior and gets smoothed towards its neighbours
        assert!(result.pixel(3, 3)[0] < 250);
    }

    #[test]
    fn test_radius_larger_than_image_returns_input() {
        let mut img = RasterBuffer::filled(4, 4, [10, 20, 30, 255]);
        img.put_pixel(2, 2, [250, 250, 250, 255]);

        assert_eq!(apply(img.clone(), 2), img);
        assert_eq!(apply(img.clone(), u32::MAX / 2), img);
        assert_eq!(apply(img.clone(), u32::MAX), img);
    }
}
