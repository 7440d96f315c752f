//! Debug rendering of plate candidates over the filtered image.

use crate::error::PreprocessError;
use crate::preprocessing::pipeline::Detection;
use crate::preprocessing::raster::{RasterBuffer, Region};
use image::Rgba;
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

const CANDIDATE_COLOR: Rgba<u8> = Rgba([255, 160, 0, 255]);
const SELECTED_COLOR: Rgba<u8> = Rgba([0, 220, 0, 255]);

fn to_rect(region: &Region) -> Rect {
    Rect::at(region.x as i32, region.y as i32).of_size(region.width, region.height)
}

/// Outline every candidate, then the selected one with a thicker green box
pub fn draw_detection(
    buffer: RasterBuffer,
    detection: &Detection,
) -> Result<RasterBuffer, PreprocessError> {
    let mut canvas = buffer.into_rgba_image()?;

    for candidate in &detection.candidates {
        draw_hollow_rect_mut(&mut canvas, to_rect(&candidate.region), CANDIDATE_COLOR);
    }

    if let Some(best) = &detection.selected {
        let r = best.region;
        draw_hollow_rect_mut(&mut canvas, to_rect(&r), SELECTED_COLOR);
        // Second, inset outline so the winner stands out
        if r.width > 2 && r.height > 2 {
            let inset = Region::new(r.x + 1, r.y + 1, r.width - 2, r.height - 2);
            draw_hollow_rect_mut(&mut canvas, to_rect(&inset), SELECTED_COLOR);
        }
    }

    Ok(RasterBuffer::from_rgba_image(canvas))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::steps::select;

    #[test]
    fn test_selected_region_is_outlined() {
        let region = Region::new(10, 10, 90, 30);
        let candidates = select::score_all(&[region]);
        let detection = Detection {
            selected: select::select_best(&candidates),
            candidates,
        };

        let out = draw_detection(RasterBuffer::filled(120, 60, [0, 0, 0, 255]), &detection)
            .unwrap();

        assert_eq!(out.dimensions(), (120, 60));
        assert_eq!(out.pixel(10, 10), [0, 220, 0, 255]);
        assert_eq!(out.pixel(99, 39), [0, 220, 0, 255]);
        assert_eq!(out.pixel(11, 11), [0, 220, 0, 255]);
        assert_eq!(out.pixel(50, 25), [0, 0, 0, 255]);
    }

    #[test]
    fn test_empty_detection_leaves_image_unchanged() {
        let img = RasterBuffer::filled(20, 20, [5, 5, 5, 255]);
        let detection = Detection {
            candidates: Vec::new(),
            selected: None,
        };
        assert_eq!(draw_detection(img.clone(), &detection).unwrap(), img);
    }
}
