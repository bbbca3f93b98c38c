use tracing::{debug, instrument};

use crate::panorama::common::error::{CaptureError, Result};
use crate::panorama::encode::types::{EncodedImage, ImageFormat};
use crate::panorama::metadata::crc::Crc32;
use crate::panorama::metadata::xmp::{XmpPanoramaMetadata, XmpSettings};
use crate::panorama::metadata::{jpeg, png};

/// Embeds GPano XMP into encoded JPEG or PNG bytes.
///
/// Owns the CRC table used for PNG chunks, built once in [`Self::new`].
#[derive(Debug, Clone)]
pub struct MetadataInjector {
    crc: Crc32,
    settings: XmpSettings,
}

impl MetadataInjector {
    pub fn new(settings: XmpSettings) -> Self {
        Self {
            crc: Crc32::new(),
            settings,
        }
    }

    pub fn metadata_for(&self, width: u32, height: u32) -> XmpPanoramaMetadata {
        XmpPanoramaMetadata::for_dimensions(width, height, &self.settings)
    }

    /// Returns a new image carrying panorama metadata for its own dimensions.
    /// The input is left untouched.
    #[instrument(skip(self, image), fields(format = ?image.format, width = image.width, height = image.height, input_len = image.bytes.len()))]
    pub fn inject(&self, image: &EncodedImage) -> Result<EncodedImage> {
        if image.width == 0 || image.height == 0 {
            return Err(CaptureError::InvalidDimensions(image.width, image.height));
        }

        let metadata = self.metadata_for(image.width, image.height);
        let bytes = match image.format {
            ImageFormat::Jpeg => jpeg::inject(&image.bytes, &metadata.jpeg_packet())?,
            ImageFormat::Png => png::inject(&image.bytes, &metadata.png_packet(), &self.crc)?,
        };

        debug!(output_len = bytes.len(), "Metadata injected");
        Ok(EncodedImage {
            bytes,
            width: image.width,
            height: image.height,
            format: image.format,
        })
    }
}

impl Default for MetadataInjector {
    fn default() -> Self {
        Self::new(XmpSettings::default())
    }
}
