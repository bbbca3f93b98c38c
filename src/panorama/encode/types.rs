//! Encoded image types

/// Container format of an encoded panorama
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
}

impl ImageFormat {
    pub fn from_jpeg_flag(encode_as_jpeg: bool) -> Self {
        if encode_as_jpeg {
            ImageFormat::Jpeg
        } else {
            ImageFormat::Png
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Png => "png",
        }
    }
}

/// Encoded container bytes plus the pixel dimensions they describe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
}

impl EncodedImage {
    pub fn is_jpeg(&self) -> bool {
        self.format == ImageFormat::Jpeg
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
