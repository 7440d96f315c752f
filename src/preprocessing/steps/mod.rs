//! Individual preprocessing steps

pub mod contrast;
pub mod denoise;
pub mod edges;
pub mod extract;
pub mod grayscale;
pub mod normalize;
pub mod regions;
pub mod select;
pub mod sharpen;
