use crate::preprocessing::kernel::clamp_u8;
use crate::preprocessing::raster::{RasterBuffer, CHANNELS};

/// Default contrast factor
pub const DEFAULT_FACTOR: f32 = 1.5;

/// Slope of the contrast curve for a given factor.
///
/// For factors above ~1.016 the denominator goes negative and the curve
/// inverts polarity while stretching; that behaviour is kept as-is.
pub fn slope(factor: f32) -> f64 {
    let level = factor as f64 * 255.0;
    259.0 * (level + 255.0) / (255.0 * (259.0 - level))
}

/// Stretch R, G and B linearly around the 128 midpoint
pub fn apply(mut buffer: RasterBuffer, factor: f32) -> RasterBuffer {
    let slope = slope(factor);
    if !slope.is_finite() {
        tracing::warn!("Contrast factor {} gives a degenerate slope, skipping", factor);
        return buffer;
    }

    // Per-value lookup table, the transform has no neighbour dependency
    let mut lut = [0u8; 256];
    for (value, entry) in lut.iter_mut().enumerate() {
        *entry = clamp_u8(slope * (value as f64 - 128.0) + 128.0);
    }

    for px in buffer.pixels_mut().chunks_exact_mut(CHANNELS) {
        px[0] = lut[px[0] as usize];
        px[1] = lut[px[1] as usize];
        px[2] = lut[px[2] as usize];
    }
    buffer
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_factor_stretches_around_midpoint() {
        // factor 0.5 -> slope = 259*382.5 / (255*131.5) ~= 2.954
        let mut img = RasterBuffer::filled(3, 1, [128, 128, 128, 255]);
        img.put_pixel(1, 0, [138, 138, 138, 255]);
        img.put_pixel(2, 0, [118, 118, 118, 255]);

        let result = apply(img, 0.5);

        assert_eq!(result.pixel(0, 0)[0], 128);
        assert_eq!(result.pixel(1, 0)[0], 158); // 128 + 29.54
        assert_eq!(result.pixel(2, 0)[0], 98); // 128 - 29.54
    }

    #[test]
    fn test_default_factor_inverts_and_saturates() {
        let mut img = RasterBuffer::filled(2, 1, [255, 255, 255, 255]);
        img.put_pixel(1, 0, [0, 0, 0, 7]);

        let result = apply(img, DEFAULT_FACTOR);

        assert!(slope(DEFAULT_FACTOR) < 0.0);
        assert_eq!(result.pixel(0, 0), [0, 0, 0, 255]);
        assert_eq!(result.pixel(1, 0), [255, 255, 255, 7]);
    }

    #[test]
    fn test_zero_factor_is_near_identity() {
        // slope(0) = 259/259 = 1
        let img = RasterBuffer::filled(4, 4, [17, 99, 230, 255]);
        assert_eq!(apply(img.clone(), 0.0), img);
    }
}
