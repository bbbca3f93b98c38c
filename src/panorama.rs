//! Panoramic capture pipeline
//!
//! Renders a cube capture, projects it to an equirectangular image, encodes it
//! and embeds Photo Sphere XMP metadata in the encoded bytes.

pub mod capture;
pub mod common;
pub mod encode;
pub mod metadata;
pub mod projection;
pub mod render;

pub use common::{CaptureError, Result};

pub use capture::{
    CaptureConfig,
    CaptureConfigBuilder,
    CapturePipeline,
    CaptureRequest,
    CaptureState,
    PipelineTimings,
};

pub use encode::{EncodedImage, ImageEncoder, ImageFormat, StandardEncoder};

pub use metadata::{MetadataInjector, PanoramaInfo, XmpPanoramaMetadata, XmpSettings};

pub use projection::{
    CubeFace,
    CubemapBuffer,
    EquirectProjector,
    EquirectangularBuffer,
    PanoramaProjector,
    SampleFilter,
};

pub use render::{Environment, RenderBackend, SkyGradient, SoftwareBackend, Viewpoint};
