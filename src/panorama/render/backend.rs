use crate::panorama::common::error::Result;
use crate::panorama::projection::types::EquirectangularBuffer;
use crate::panorama::render::types::{TargetDesc, TargetHandle, Viewpoint};

/// Completion for an asynchronous readback. Invoked exactly once, on the
/// backend's completion queue.
pub type ReadbackCallback = Box<dyn FnOnce(Result<EquirectangularBuffer>) + Send + 'static>;

/// The host renderer a capture runs against.
///
/// Backends own target memory. Callers serialise captures against one backend;
/// implementations only need to keep their own bookkeeping consistent when
/// called from the completion queue and the capturing thread.
pub trait RenderBackend: Send + Sync + 'static {
    /// Whether this device can render a six-face cube capture at all.
    fn supports_cubemap(&self) -> bool;

    fn acquire_target(&self, desc: TargetDesc) -> Result<TargetHandle>;

    fn release_target(&self, handle: TargetHandle);

    /// Points the capturing camera at `target` and returns what it pointed at
    /// before.
    fn swap_camera_target(&self, target: Option<TargetHandle>) -> Option<TargetHandle>;

    fn render_cubemap(&self, viewpoint: &Viewpoint, target: TargetHandle) -> Result<()>;

    /// Runs the cube-to-equirectangular remap from `cube` into `equirect`,
    /// rotated by `padding` turns.
    fn remap_equirect(&self, cube: TargetHandle, equirect: TargetHandle, padding: f32) -> Result<()>;

    /// Blocking readback of an equirect target.
    fn read_back(&self, target: TargetHandle) -> Result<EquirectangularBuffer>;

    /// Non-blocking readback; `done` receives the pixels or the readback error.
    fn read_back_async(&self, target: TargetHandle, done: ReadbackCallback);
}
