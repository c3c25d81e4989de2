//! Data models for the peacnut panel.

mod image;
mod mode;

pub use image::{ExtractedImage, ImageKey};
pub use mode::SelectionMode;
