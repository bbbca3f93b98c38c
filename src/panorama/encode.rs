//! Image encoding module
//!
//! Turns equirectangular pixel buffers into JPEG or PNG container bytes.

mod encoder;
mod standard_encoder;
pub mod types;

pub use encoder::ImageEncoder;
pub use standard_encoder::StandardEncoder;
pub use types::{EncodedImage, ImageFormat};
