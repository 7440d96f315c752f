//! Square convolution kernels and the shared "valid convolution" pass.
//!
//! Convolution only writes interior pixels that have full kernel support;
//! the border of width `radius` is copied from the source unchanged.

use super::raster::{RasterBuffer, CHANNELS};

/// 3x3 high-pass sharpening kernel
pub const SHARPEN: [[f64; 3]; 3] = [[0.0, -1.0, 0.0], [-1.0, 5.0, -1.0], [0.0, -1.0, 0.0]];

pub const SOBEL_X: [[f64; 3]; 3] = [[-1.0, 0.0, 1.0], [-2.0, 0.0, 2.0], [-1.0, 0.0, 1.0]];
pub const SOBEL_Y: [[f64; 3]; 3] = [[-1.0, -2.0, -1.0], [0.0, 0.0, 0.0], [1.0, 2.0, 1.0]];

/// Immutable odd-sized square weight matrix, stored row-major
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    radius: u32,
    weights: Vec<f64>,
}

impl Kernel {
    /// Normalized `(2r+1)x(2r+1)` Gaussian with `sigma = r / 3`.
    ///
    /// Radius 0 yields the 1x1 identity kernel.
    pub fn gaussian(radius: u32) -> Self {
        if radius == 0 {
            return Self {
                radius,
                weights: vec![1.0],
            };
        }

        let sigma = radius as f64 / 3.0;
        let denom = 2.0 * sigma * sigma;
        let r = radius as i64;
        let mut weights = Vec::with_capacity(((2 * r + 1) * (2 * r + 1)) as usize);
        for dy in -r..=r {
            for dx in -r..=r {
                let d2 = (dx * dx + dy * dy) as f64;
                weights.push((-d2 / denom).exp());
            }
        }

        let sum: f64 = weights.iter().sum();
        for w in &mut weights {
            *w /= sum;
        }

        Self { radius, weights }
    }

    /// Build a 3x3 kernel from constant rows
    pub fn from_3x3(rows: [[f64; 3]; 3]) -> Self {
        Self {
            radius: 1,
            weights: rows.iter().flatten().copied().collect(),
        }
    }

    #[inline]
    pub fn radius(&self) -> u32 {
        self.radius
    }

    #[inline]
    pub fn size(&self) -> u32 {
        2 * self.radius + 1
    }

    /// Weight at kernel column `kx`, row `ky`
    #[inline]
    pub fn weight(&self, kx: u32, ky: u32) -> f64 {
        self.weights[(ky * self.size() + kx) as usize]
    }

    #[allow(dead_code)]
    pub fn sum(&self) -> f64 {
        self.weights.iter().sum()
    }
}

/// Convolve the R, G and B channels of every interior pixel with `kernel`.
///
/// Results are rounded and clamped to `[0, 255]`; alpha and the border ring
/// keep their source values. Buffers too small to hold a single full window
/// come back unchanged.
pub fn convolve_rgb(src: &RasterBuffer, kernel: &Kernel) -> RasterBuffer {
    let (width, height) = src.dimensions();
    let radius = kernel.radius();
    let size = kernel.size();
    let mut out = src.clone();

    if width < size || height < size {
        return out;
    }

    let data = src.pixels();
    let out_data = out.pixels_mut();
    let row_stride = width as usize * CHANNELS;

    for y in radius..height - radius {
        for x in radius..width - radius {
            let mut acc = [0.0f64; 3];
            for ky in 0..size {
                let row = (y + ky - radius) as usize * row_stride;
                for kx in 0..size {
                    let w = kernel.weight(kx, ky);
                    if w == 0.0 {
                        continue;
                    }
                    let i = row + (x + kx - radius) as usize * CHANNELS;
                    acc[0] += data[i] as f64 * w;
                    acc[1] += data[i + 1] as f64 * w;
                    acc[2] += data[i + 2] as f64 * w;
                }
            }

            let o = (y as usize * width as usize + x as usize) * CHANNELS;
            for (c, value) in acc.iter().enumerate() {
                out_data[o + c] = clamp_u8(*value);
            }
        }
    }

    out
}

/// Round to nearest and saturate into a channel value
#[inline]
pub fn clamp_u8(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gaussian_weights_sum_to_one() {
        for radius in 0..=10 {
            let kernel = Kernel::gaussian(radius);
            assert!(
                (kernel.sum() - 1.0).abs() < 1e-6,
                "radius {} sums to {}",
                radius,
                kernel.sum()
            );
        }
    }

    #[test]
    fn test_gaussian_is_odd_and_symmetric() {
        let kernel = Kernel::gaussian(2);
        assert_eq!(kernel.size(), 5);
        assert_eq!(kernel.weight(0, 0), kernel.weight(4, 4));
        assert_eq!(kernel.weight(1, 2), kernel.weight(3, 2));
        assert!(kernel.weight(2, 2) > kernel.weight(1, 2));
    }

    #[test]
    fn test_radius_zero_is_identity() {
        let kernel = Kernel::gaussian(0);
        assert_eq!(kernel.size(), 1);
        assert_eq!(kernel.weight(0, 0), 1.0);
    }

    #[test]
    fn test_convolve_leaves_border_untouched() {
        let mut src = RasterBuffer::filled(6, 6, [100, 100, 100, 255]);
        src.put_pixel(0, 0, [7, 8, 9, 255]);
        src.put_pixel(2, 2, [200, 200, 200, 255]);

        let out = convolve_rgb(&src, &Kernel::from_3x3(SHARPEN));

        assert_eq!(out.pixel(0, 0), [7, 8, 9, 255]);
        // 5*200 - 4*100 = 600, clamped
        assert_eq!(out.pixel(2, 2), [255, 255, 255, 255]);
        // 5*100 - 200 - 3*100 = 0
        assert_eq!(out.pixel(3, 2), [0, 0, 0, 255]);
    }

    #[test]
    fn test_convolve_small_buffer_is_unchanged() {
        let src = RasterBuffer::filled(2, 5, [1, 2, 3, 4]);
        assert_eq!(convolve_rgb(&src, &Kernel::from_3x3(SHARPEN)), src);
    }
}
