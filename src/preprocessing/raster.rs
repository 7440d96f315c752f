//! Owned RGBA raster buffer and plate region types.
//!
//! Decoding and PNG encoding happen only at this boundary; every stage in
//! between works on [`RasterBuffer`] values passed by move.

use crate::error::PreprocessError;
use image::{ImageBuffer, ImageFormat, Rgba, RgbaImage};
use serde::Serialize;
use std::io::Cursor;

/// Bytes per pixel (R, G, B, A)
pub const CHANNELS: usize = 4;

/// Row-major RGBA8 image with no row padding.
///
/// Invariant: `pixels.len() == width * height * 4`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterBuffer {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl RasterBuffer {
    /// Create a buffer filled with a single RGBA colour
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let count = width as usize * height as usize;
        let mut pixels = Vec::with_capacity(count * CHANNELS);
        for _ in 0..count {
            pixels.extend_from_slice(&rgba);
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Wrap raw RGBA bytes, validating the length invariant
    pub fn from_raw(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, PreprocessError> {
        let expected = width as usize * height as usize * CHANNELS;
        if pixels.len() != expected {
            return Err(PreprocessError::InvalidBuffer {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Decode an encoded image payload (PNG, JPEG, ...) into RGBA8
    pub fn decode(bytes: &[u8]) -> Result<Self, PreprocessError> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| PreprocessError::Decode(e.to_string()))?;
        Ok(Self::from_rgba_image(image.into_rgba8()))
    }

    pub fn from_rgba_image(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        let mut pixels = image.into_raw();
        // ImageBuffer tolerates oversized containers; keep ours exact
        pixels.truncate(width as usize * height as usize * CHANNELS);
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn into_rgba_image(self) -> Result<RgbaImage, PreprocessError> {
        let expected = self.width as usize * self.height as usize * CHANNELS;
        let actual = self.pixels.len();
        RgbaImage::from_raw(self.width, self.height, self.pixels)
            .ok_or(PreprocessError::InvalidBuffer { expected, actual })
    }

    /// Borrow the pixels as an `image` buffer without copying
    pub fn as_image(&self) -> Result<ImageBuffer<Rgba<u8>, &[u8]>, PreprocessError> {
        ImageBuffer::from_raw(self.width, self.height, self.pixels.as_slice()).ok_or(
            PreprocessError::InvalidBuffer {
                expected: self.width as usize * self.height as usize * CHANNELS,
                actual: self.pixels.len(),
            },
        )
    }

    /// Encode as PNG, the payload format handed to the recognizer
    pub fn encode_png(&self) -> Result<Vec<u8>, PreprocessError> {
        let image = self.clone().into_rgba_image()?;
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|e| PreprocessError::Encode(e.to_string()))?;
        Ok(bytes)
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    #[inline]
    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    /// Byte offset of the pixel at `(x, y)`
    #[inline]
    #[allow(dead_code)]
    pub fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * CHANNELS
    }

    #[inline]
    #[allow(dead_code)]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = self.offset(x, y);
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }

    #[inline]
    #[allow(dead_code)]
    pub fn put_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        let i = self.offset(x, y);
        self.pixels[i..i + CHANNELS].copy_from_slice(&rgba);
    }
}

/// Axis-aligned rectangle inside a raster buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// `width / height`, or 0 for a degenerate region
    pub fn aspect_ratio(&self) -> f64 {
        if self.height == 0 {
            return 0.0;
        }
        self.width as f64 / self.height as f64
    }

    /// True when the region is non-empty and lies entirely inside `width x height`
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        let right = self.x.checked_add(self.width);
        let bottom = self.y.checked_add(self.height);
        self.width > 0
            && self.height > 0
            && matches!(right, Some(r) if r <= width)
            && matches!(bottom, Some(b) if b <= height)
    }
}
