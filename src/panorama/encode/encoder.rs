use crate::panorama::common::error::Result;
use crate::panorama::encode::types::{EncodedImage, ImageFormat};
use crate::panorama::projection::types::EquirectangularBuffer;

pub trait ImageEncoder: Send + Sync + 'static {
    fn encode(&self, image: &EquirectangularBuffer, format: ImageFormat) -> Result<EncodedImage>;
}
