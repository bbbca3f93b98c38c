//! Rendering collaborator module
//!
//! The backend trait the projector drives, plus a CPU implementation.

mod backend;
mod environment;
mod readback_queue;
mod software_backend;
pub mod types;

pub use backend::{ReadbackCallback, RenderBackend};
pub use environment::{Environment, SkyGradient};
pub use readback_queue::ReadbackQueue;
pub use software_backend::SoftwareBackend;
pub use types::{TargetDesc, TargetHandle, Viewpoint};
