//! Drives a [`RenderBackend`] through one cube capture and equirectangular
//! remap, owning the temporary targets for the duration.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::panorama::common::error::{CaptureError, Result};
use crate::panorama::projection::types::EquirectangularBuffer;
use crate::panorama::render::{RenderBackend, TargetDesc, TargetHandle, Viewpoint};

/// Largest cube edge most devices accept.
pub const DEFAULT_MAX_CUBEMAP_EDGE: u32 = 8192;

/// Largest power of two not above `n`, and 1 for 0.
pub fn floor_power_of_two(n: u32) -> u32 {
    1 << (31 - n.max(1).leading_zeros())
}

/// `min(max_edge, next_power_of_two(width))`, never below 1. `max_edge` is
/// itself rounded down to a power of two, and widths whose next power of two
/// overflows saturate at it.
pub fn cubemap_size(width: u32, max_edge: u32) -> u32 {
    let max_edge = floor_power_of_two(max_edge);
    width
        .checked_next_power_of_two()
        .unwrap_or(max_edge)
        .min(max_edge)
        .max(1)
}

pub struct PanoramaProjector<B: RenderBackend> {
    backend: Arc<B>,
    max_edge: u32,
}

impl<B: RenderBackend> PanoramaProjector<B> {
    /// `max_edge` is rounded down to a power of two.
    pub fn new(backend: Arc<B>, max_edge: u32) -> Self {
        Self {
            backend,
            max_edge: floor_power_of_two(max_edge),
        }
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    pub fn cubemap_size(&self, width: u32) -> u32 {
        cubemap_size(width, self.max_edge)
    }

    /// Renders the cube capture and remaps it into a fresh equirect target.
    ///
    /// The cube target is released as soon as the remap has consumed it. The
    /// returned guard owns the equirect target and releases it when dropped.
    #[instrument(skip(self, viewpoint))]
    pub fn render(
        &self,
        viewpoint: &Viewpoint,
        cubemap_size: u32,
        padding: f32,
    ) -> Result<ProjectionTargets<B>> {
        if !self.backend.supports_cubemap() {
            warn!("Backend cannot render cube captures");
            return Err(CaptureError::RenderUnsupported);
        }

        let mut targets = ProjectionTargets::empty(Arc::clone(&self.backend));
        let cube = self
            .backend
            .acquire_target(TargetDesc::Cube { edge: cubemap_size })?;
        targets.cube = Some(cube);
        let equirect = self.backend.acquire_target(TargetDesc::Equirect {
            width: cubemap_size,
            height: cubemap_size / 2,
        })?;
        targets.equirect = Some(equirect);

        {
            let _camera = CameraRedirect::new(self.backend.as_ref(), cube);
            self.backend.render_cubemap(viewpoint, cube)?;
        }

        self.backend.remap_equirect(cube, equirect, padding)?;
        targets.release_cube();

        Ok(targets)
    }

    /// Blocking projection: render, remap, read back, release.
    pub fn project_sync(
        &self,
        viewpoint: &Viewpoint,
        cubemap_size: u32,
        padding: f32,
    ) -> Result<EquirectangularBuffer> {
        self.render(viewpoint, cubemap_size, padding)?.read_back()
    }

    /// Non-blocking projection. `done` runs exactly once: on the backend's
    /// completion queue after the readback, or on the calling thread if the
    /// render itself failed. Targets are released before `done` runs.
    pub fn project_async<F>(&self, viewpoint: &Viewpoint, cubemap_size: u32, padding: f32, done: F)
    where
        F: FnOnce(Result<EquirectangularBuffer>) + Send + 'static,
    {
        match self.render(viewpoint, cubemap_size, padding) {
            Ok(targets) => targets.read_back_async(move |pixels, targets| {
                drop(targets);
                done(pixels);
            }),
            Err(e) => done(Err(e)),
        }
    }
}

/// Temporary targets of one projection. Each held handle is released exactly
/// once, when the guard is dropped or earlier through [`Self::release_cube`].
pub struct ProjectionTargets<B: RenderBackend> {
    backend: Arc<B>,
    cube: Option<TargetHandle>,
    equirect: Option<TargetHandle>,
}

impl<B: RenderBackend> ProjectionTargets<B> {
    fn empty(backend: Arc<B>) -> Self {
        Self {
            backend,
            cube: None,
            equirect: None,
        }
    }

    fn release_cube(&mut self) {
        if let Some(cube) = self.cube.take() {
            self.backend.release_target(cube);
        }
    }

    pub fn read_back(&self) -> Result<EquirectangularBuffer> {
        let handle = self.equirect.ok_or_else(|| {
            CaptureError::TargetUnavailable("equirect target already released".to_string())
        })?;
        self.backend.read_back(handle)
    }

    /// Requests an asynchronous readback and hands the pixels plus this guard
    /// to `done`, which decides when the targets go away. A failed async
    /// readback falls back to the blocking path.
    pub fn read_back_async<F>(self, done: F)
    where
        F: FnOnce(Result<EquirectangularBuffer>, Self) + Send + 'static,
    {
        let Some(handle) = self.equirect else {
            let err = CaptureError::TargetUnavailable("equirect target already released".to_string());
            done(Err(err), self);
            return;
        };

        let backend = Arc::clone(&self.backend);
        backend.read_back_async(
            handle,
            Box::new(move |pixels| {
                let pixels = match pixels {
                    Ok(pixels) => Ok(pixels),
                    Err(e) => {
                        warn!(error = %e, "Async readback failed, retrying synchronously");
                        self.read_back()
                    }
                };
                done(pixels, self);
            }),
        );
    }
}

impl<B: RenderBackend> Drop for ProjectionTargets<B> {
    fn drop(&mut self) {
        self.release_cube();
        if let Some(equirect) = self.equirect.take() {
            debug!(?equirect, "Releasing equirect target");
            self.backend.release_target(equirect);
        }
    }
}

/// Points the backend camera at a target and restores the previous one on drop.
struct CameraRedirect<'a, B: RenderBackend> {
    backend: &'a B,
    previous: Option<TargetHandle>,
}

impl<'a, B: RenderBackend> CameraRedirect<'a, B> {
    fn new(backend: &'a B, target: TargetHandle) -> Self {
        let previous = backend.swap_camera_target(Some(target));
        Self { backend, previous }
    }
}

impl<B: RenderBackend> Drop for CameraRedirect<'_, B> {
    fn drop(&mut self) {
        self.backend.swap_camera_target(self.previous.take());
    }
}
