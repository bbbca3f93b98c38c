//! Capture request and configuration types

use crate::panorama::encode::ImageFormat;
use crate::panorama::metadata::XmpSettings;
use crate::panorama::projection::{floor_power_of_two, SampleFilter, DEFAULT_MAX_CUBEMAP_EDGE};
use crate::panorama::render::Viewpoint;

/// One capture. Built per call and not changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureRequest {
    /// Target panorama width before power-of-two rounding
    pub width: u32,
    /// JPEG when true, PNG otherwise
    pub encode_as_jpeg: bool,
    /// Rotate the panorama so its centre faces the capture heading
    pub face_alignment_enabled: bool,
    /// Heading of the capturing viewpoint in degrees, `[0, 360)`
    pub heading_degrees: f32,
    pub viewpoint: Viewpoint,
}

impl CaptureRequest {
    pub fn new(width: u32) -> Self {
        Self {
            width,
            encode_as_jpeg: true,
            face_alignment_enabled: false,
            heading_degrees: 0.0,
            viewpoint: Viewpoint::default(),
        }
    }

    pub fn jpeg(mut self, encode_as_jpeg: bool) -> Self {
        self.encode_as_jpeg = encode_as_jpeg;
        self
    }

    pub fn face_alignment(mut self, enabled: bool) -> Self {
        self.face_alignment_enabled = enabled;
        self
    }

    /// Sets the heading, wrapped into `[0, 360)`.
    pub fn heading(mut self, degrees: f32) -> Self {
        let wrapped = degrees.rem_euclid(360.0);
        self.heading_degrees = if wrapped >= 360.0 { 0.0 } else { wrapped };
        self
    }

    pub fn viewpoint(mut self, viewpoint: Viewpoint) -> Self {
        self.viewpoint = viewpoint;
        self
    }

    pub fn format(&self) -> ImageFormat {
        ImageFormat::from_jpeg_flag(self.encode_as_jpeg)
    }

    /// Remap padding in turns: `heading / 360` with face alignment, else 0.
    pub fn padding(&self) -> f32 {
        if self.face_alignment_enabled {
            self.heading_degrees.rem_euclid(360.0) / 360.0
        } else {
            0.0
        }
    }
}

/// Configuration for panorama capture
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Largest cube edge to render; rounded down to a power of two when used
    pub max_cubemap_edge: u32,
    /// JPEG quality, 1..=100
    pub jpeg_quality: u8,
    /// Whether to reject requests that would produce an empty panorama
    pub validate_dimensions: bool,
    /// Texel filter of the equirectangular remap
    pub filter: SampleFilter,
    /// Values stamped into the XMP packet
    pub xmp: XmpSettings,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            max_cubemap_edge: DEFAULT_MAX_CUBEMAP_EDGE,
            jpeg_quality: 100,
            validate_dimensions: true,
            filter: SampleFilter::Bilinear,
            xmp: XmpSettings::default(),
        }
    }
}

impl CaptureConfig {
    pub fn builder() -> CaptureConfigBuilder {
        CaptureConfigBuilder::default()
    }
}

/// Builder for CaptureConfig
#[derive(Default)]
pub struct CaptureConfigBuilder {
    max_cubemap_edge: Option<u32>,
    jpeg_quality: Option<u8>,
    validate_dimensions: Option<bool>,
    filter: Option<SampleFilter>,
    xmp: Option<XmpSettings>,
}

impl CaptureConfigBuilder {
    /// Rounded down to a power of two, minimum 1.
    pub fn max_cubemap_edge(mut self, edge: u32) -> Self {
        self.max_cubemap_edge = Some(edge);
        self
    }

    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = Some(quality);
        self
    }

    pub fn validate_dimensions(mut self, validate: bool) -> Self {
        self.validate_dimensions = Some(validate);
        self
    }

    pub fn filter(mut self, filter: SampleFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn xmp(mut self, xmp: XmpSettings) -> Self {
        self.xmp = Some(xmp);
        self
    }

    pub fn build(self) -> CaptureConfig {
        let default = CaptureConfig::default();
        let max_edge = self.max_cubemap_edge.unwrap_or(default.max_cubemap_edge);
        CaptureConfig {
            max_cubemap_edge: floor_power_of_two(max_edge),
            jpeg_quality: self.jpeg_quality.unwrap_or(default.jpeg_quality).clamp(1, 100),
            validate_dimensions: self.validate_dimensions.unwrap_or(default.validate_dimensions),
            filter: self.filter.unwrap_or(default.filter),
            xmp: self.xmp.unwrap_or(default.xmp),
        }
    }
}
