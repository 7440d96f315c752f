use crate::preprocessing::raster::RasterBuffer;
use image::imageops::{self, FilterType};

/// Canonical plate raster handed to the recognizer (~3.33:1)
pub const TARGET_WIDTH: u32 = 400;
pub const TARGET_HEIGHT: u32 = 120;

/// Resize to `target_width x target_height` with nearest-neighbour sampling.
///
/// No interpolation: crisp glyph edges recognize better than smoothed ones.
/// A buffer already at the target size, or an empty one, is returned as-is.
pub fn apply(buffer: RasterBuffer, target_width: u32, target_height: u32) -> RasterBuffer {
    let (width, height) = buffer.dimensions();
    if (width, height) == (target_width, target_height) {
        return buffer;
    }
    if width == 0 || height == 0 || target_width == 0 || target_height == 0 {
        tracing::warn!(
            "Cannot resample {}x{} to {}x{}, leaving as-is",
            width,
            height,
            target_width,
            target_height
        );
        return buffer;
    }

    let resized = match buffer.as_image() {
        Ok(view) => imageops::resize(&view, target_width, target_height, FilterType::Nearest),
        Err(e) => {
            tracing::warn!("Skipping normalize: {}", e);
            return buffer;
        }
    };

    RasterBuffer::from_rgba_image(resized)
}
