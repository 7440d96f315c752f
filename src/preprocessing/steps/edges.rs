//! Sobel gradient magnitude over the grayscale channel.
//!
//! Output pixels carry `min(255, sqrt(gx^2 + gy^2))` in R, G and B with
//! alpha forced to 255. The one-pixel border has no full 3x3 support and is
//! written as zero magnitude so it can never seed a region.

use crate::preprocessing::kernel::{clamp_u8, Kernel, SOBEL_X, SOBEL_Y};
use crate::preprocessing::raster::{RasterBuffer, CHANNELS};

/// Compute the edge-magnitude map of a grayscale buffer (red channel is read)
pub fn apply(gray: &RasterBuffer) -> RasterBuffer {
    let (width, height) = gray.dimensions();
    let mut out = RasterBuffer::filled(width, height, [0, 0, 0, 255]);

    if width < 3 || height < 3 {
        return out;
    }

    let kernel_x = Kernel::from_3x3(SOBEL_X);
    let kernel_y = Kernel::from_3x3(SOBEL_Y);
    let data = gray.pixels();
    let row_stride = width as usize * CHANNELS;
    let out_data = out.pixels_mut();

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let mut gx = 0.0f64;
            let mut gy = 0.0f64;
            for ky in 0..3u32 {
                let row = (y + ky - 1) as usize * row_stride;
                for kx in 0..3u32 {
                    let value = data[row + (x + kx - 1) as usize * CHANNELS] as f64;
                    gx += value * kernel_x.weight(kx, ky);
                    gy += value * kernel_y.weight(kx, ky);
                }
            }

            let magnitude = clamp_u8((gx * gx + gy * gy).sqrt());
            let o = (y as usize * width as usize + x as usize) * CHANNELS;
            out_data[o] = magnitude;
            out_data[o + 1] = magnitude;
            out_data[o + 2] = magnitude;
        }
    }

    out
}
