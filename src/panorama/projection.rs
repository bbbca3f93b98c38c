//! Panorama projection module
//!
//! Cube face math, the CPU equirectangular remap and the projector that drives
//! a render backend through one capture.

pub mod cube;
mod equirect_projector;
mod projector;
pub mod types;

pub use cube::CubeFace;
pub use equirect_projector::{EquirectProjector, SampleFilter};
pub use projector::{cubemap_size, floor_power_of_two, PanoramaProjector, ProjectionTargets, DEFAULT_MAX_CUBEMAP_EDGE};
pub use types::{CubemapBuffer, EquirectangularBuffer};
