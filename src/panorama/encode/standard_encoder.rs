use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder as _};
use tracing::debug;

use crate::panorama::common::error::{CaptureError, Result};
use crate::panorama::encode::encoder::ImageEncoder;
use crate::panorama::encode::types::{EncodedImage, ImageFormat};
use crate::panorama::projection::types::EquirectangularBuffer;

/// Encodes RGB8 panoramas with the `image` crate codecs.
pub struct StandardEncoder {
    jpeg_quality: u8,
}

impl StandardEncoder {
    pub fn new(jpeg_quality: u8) -> Self {
        Self {
            jpeg_quality: jpeg_quality.clamp(1, 100),
        }
    }

    pub fn jpeg_quality(&self) -> u8 {
        self.jpeg_quality
    }
}

impl Default for StandardEncoder {
    fn default() -> Self {
        Self::new(100)
    }
}

impl ImageEncoder for StandardEncoder {
    fn encode(&self, image: &EquirectangularBuffer, format: ImageFormat) -> Result<EncodedImage> {
        debug!("Encoding {:?} image: {}x{}", format, image.width, image.height);

        let expected = image.width as usize * image.height as usize * 3;
        if image.data.len() != expected {
            return Err(CaptureError::EncodeFailure(format!(
                "pixel buffer holds {} bytes, {}x{} RGB needs {}",
                image.data.len(),
                image.width,
                image.height,
                expected
            )));
        }

        let mut bytes = Vec::new();
        let encoded = match format {
            ImageFormat::Jpeg => JpegEncoder::new_with_quality(&mut bytes, self.jpeg_quality)
                .write_image(&image.data, image.width, image.height, ExtendedColorType::Rgb8),
            ImageFormat::Png => PngEncoder::new(&mut bytes).write_image(
                &image.data,
                image.width,
                image.height,
                ExtendedColorType::Rgb8,
            ),
        };
        encoded.map_err(|e| CaptureError::EncodeFailure(e.to_string()))?;

        if bytes.is_empty() {
            return Err(CaptureError::EncodeFailure("encoder produced no data".to_string()));
        }

        debug!("Encoding complete, {} bytes", bytes.len());
        Ok(EncodedImage {
            bytes,
            width: image.width,
            height: image.height,
            format,
        })
    }
}
