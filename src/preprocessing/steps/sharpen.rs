use crate::preprocessing::kernel::{convolve_rgb, Kernel, SHARPEN};
use crate::preprocessing::raster::RasterBuffer;

/// Apply Laplacian-based sharpening.
/// Centre weight 5, direct neighbours -1; the outermost ring is left as-is.
pub fn apply(buffer: RasterBuffer) -> RasterBuffer {
    convolve_rgb(&buffer, &Kernel::from_3x3(SHARPEN))
}
