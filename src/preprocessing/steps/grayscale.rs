use crate::preprocessing::kernel::clamp_u8;
use crate::preprocessing::raster::{RasterBuffer, CHANNELS};

const RED_WEIGHT: f64 = 0.299;
const GREEN_WEIGHT: f64 = 0.587;
const BLUE_WEIGHT: f64 = 0.114;

/// Collapse colour into BT.601 luma, written back to R, G and B.
/// This is the foundation for every other preprocessing step.
pub fn apply(mut buffer: RasterBuffer) -> RasterBuffer {
    for px in buffer.pixels_mut().chunks_exact_mut(CHANNELS) {
        let luma = clamp_u8(
            RED_WEIGHT * px[0] as f64 + GREEN_WEIGHT * px[1] as f64 + BLUE_WEIGHT * px[2] as f64,
        );
        px[0] = luma;
        px[1] = luma;
        px[2] = luma;
    }
    buffer
}
