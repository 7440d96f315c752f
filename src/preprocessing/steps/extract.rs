use crate::error::PreprocessError;
use crate::preprocessing::raster::{RasterBuffer, Region};
use image::imageops;

/// Copy the pixels of `region` out of `source` into a new buffer.
///
/// Fails when the region is empty or reaches past the source bounds.
pub fn apply(source: &RasterBuffer, region: &Region) -> Result<RasterBuffer, PreprocessError> {
    let (width, height) = source.dimensions();
    if !region.fits_within(width, height) {
        return Err(PreprocessError::RegionOutOfBounds {
            region: *region,
            width,
            height,
        });
    }

    let image = source.clone().into_rgba_image()?;
    let cropped = imageops::crop_imm(&image, region.x, region.y, region.width, region.height);

    Ok(RasterBuffer::from_rgba_image(cropped.to_image()))
}
