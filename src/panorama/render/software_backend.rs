//! CPU render backend.
//!
//! Renders cube faces by evaluating an [`Environment`] at every texel centre,
//! runs the remap through an owned [`EquirectProjector`] and completes
//! asynchronous readbacks on a single [`ReadbackQueue`] worker.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use rayon::prelude::*;
use tracing::{debug, instrument};

use crate::panorama::common::error::{CaptureError, Result};
use crate::panorama::projection::cube::{face_uv_to_direction, CubeFace};
use crate::panorama::projection::{CubemapBuffer, EquirectProjector, EquirectangularBuffer};
use crate::panorama::render::backend::{ReadbackCallback, RenderBackend};
use crate::panorama::render::environment::Environment;
use crate::panorama::render::readback_queue::ReadbackQueue;
use crate::panorama::render::types::{TargetDesc, TargetHandle, Viewpoint};

enum Target {
    Cube(CubemapBuffer),
    Equirect(EquirectangularBuffer),
}

pub struct SoftwareBackend<E: Environment> {
    environment: E,
    projector: EquirectProjector,
    targets: Mutex<HashMap<TargetHandle, Target>>,
    camera_target: Mutex<Option<TargetHandle>>,
    next_handle: AtomicU64,
    readback: ReadbackQueue,
}

impl<E: Environment> SoftwareBackend<E> {
    pub fn new(environment: E, projector: EquirectProjector) -> Result<Self> {
        Ok(Self {
            environment,
            projector,
            targets: Mutex::new(HashMap::new()),
            camera_target: Mutex::new(None),
            next_handle: AtomicU64::new(1),
            readback: ReadbackQueue::new("pano-readback")?,
        })
    }

    /// Number of targets currently allocated.
    pub fn live_targets(&self) -> usize {
        self.targets.lock().len()
    }

    pub fn camera_target(&self) -> Option<TargetHandle> {
        *self.camera_target.lock()
    }

    fn take_cube(&self, handle: TargetHandle) -> Result<CubemapBuffer> {
        let mut targets = self.targets.lock();
        match targets.remove(&handle) {
            Some(Target::Cube(cube)) => Ok(cube),
            Some(other) => {
                targets.insert(handle, other);
                Err(CaptureError::TargetUnavailable(format!("{handle:?} is not a cube target")))
            }
            None => Err(CaptureError::TargetUnavailable(format!("{handle:?} is not allocated"))),
        }
    }

    fn snapshot_equirect(&self, handle: TargetHandle) -> Result<EquirectangularBuffer> {
        match self.targets.lock().get(&handle) {
            Some(Target::Equirect(buffer)) => Ok(buffer.clone()),
            Some(Target::Cube(_)) => Err(CaptureError::Readback(format!(
                "{handle:?} is a cube target"
            ))),
            None => Err(CaptureError::Readback(format!("{handle:?} is not allocated"))),
        }
    }
}

impl<E: Environment> RenderBackend for SoftwareBackend<E> {
    fn supports_cubemap(&self) -> bool {
        true
    }

    fn acquire_target(&self, desc: TargetDesc) -> Result<TargetHandle> {
        let target = match desc {
            TargetDesc::Cube { edge } if edge > 0 => Target::Cube(CubemapBuffer::new(edge)),
            TargetDesc::Equirect { width, height } if height > 0 && width == height * 2 => {
                Target::Equirect(EquirectangularBuffer::new(width))
            }
            _ => {
                return Err(CaptureError::TargetUnavailable(format!(
                    "unsupported target shape {desc:?}"
                )));
            }
        };

        let handle = TargetHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        self.targets.lock().insert(handle, target);
        debug!(?handle, ?desc, "Acquired target");
        Ok(handle)
    }

    fn release_target(&self, handle: TargetHandle) {
        if self.targets.lock().remove(&handle).is_some() {
            debug!(?handle, "Released target");
        }
    }

    fn swap_camera_target(&self, target: Option<TargetHandle>) -> Option<TargetHandle> {
        std::mem::replace(&mut *self.camera_target.lock(), target)
    }

    #[instrument(skip(self), fields(position = ?viewpoint.position))]
    fn render_cubemap(&self, viewpoint: &Viewpoint, target: TargetHandle) -> Result<()> {
        let mut cube = self.take_cube(target)?;
        let edge = cube.edge();
        let origin = viewpoint.position;

        cube.faces_mut()
            .par_iter_mut()
            .zip(CubeFace::ALL.par_iter())
            .for_each(|(data, &face)| {
                for (i, px) in data.chunks_exact_mut(3).enumerate() {
                    let x = (i as u32 % edge) as f32;
                    let y = (i as u32 / edge) as f32;
                    let dir = face_uv_to_direction(
                        face,
                        (x + 0.5) / edge as f32,
                        (y + 0.5) / edge as f32,
                    )
                    .normalize();
                    px.copy_from_slice(&self.environment.radiance(origin, dir));
                }
            });

        self.targets.lock().insert(target, Target::Cube(cube));
        Ok(())
    }

    fn remap_equirect(&self, cube: TargetHandle, equirect: TargetHandle, padding: f32) -> Result<()> {
        let mut targets = self.targets.lock();
        let mut output = match targets.remove(&equirect) {
            Some(Target::Equirect(buffer)) => buffer,
            Some(other) => {
                targets.insert(equirect, other);
                return Err(CaptureError::TargetUnavailable(format!(
                    "{equirect:?} is not an equirect target"
                )));
            }
            None => {
                return Err(CaptureError::TargetUnavailable(format!(
                    "{equirect:?} is not allocated"
                )));
            }
        };

        let result = match targets.get(&cube) {
            Some(Target::Cube(source)) => self.projector.project(source, padding, &mut output),
            _ => Err(CaptureError::TargetUnavailable(format!(
                "{cube:?} is not a cube target"
            ))),
        };
        targets.insert(equirect, Target::Equirect(output));
        result
    }

    fn read_back(&self, target: TargetHandle) -> Result<EquirectangularBuffer> {
        self.snapshot_equirect(target)
    }

    fn read_back_async(&self, target: TargetHandle, done: ReadbackCallback) {
        // Like a GPU readback, the copy is taken when the request is issued.
        let pixels = self.snapshot_equirect(target);
        self.readback.submit(move || done(pixels));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam::channel;
    use glam::Vec3;
    use std::time::Duration;

    fn backend() -> SoftwareBackend<impl Environment> {
        let env = |_: Vec3, dir: Vec3| {
            let (face, _, _) = crate::panorama::projection::cube::direction_to_face_uv(dir);
            [face.index() as u8 * 50, 0, 0]
        };
        SoftwareBackend::new(env, EquirectProjector::default()).unwrap()
    }

    #[test]
    fn test_render_fills_each_face_from_environment() {
        let backend = backend();
        let cube = backend.acquire_target(TargetDesc::Cube { edge: 4 }).unwrap();
        let equirect = backend
            .acquire_target(TargetDesc::Equirect { width: 16, height: 8 })
            .unwrap();
        backend.render_cubemap(&Viewpoint::default(), cube).unwrap();
        backend.remap_equirect(cube, equirect, 0.0).unwrap();

        let pixels = backend.read_back(equirect).unwrap();
        // Centre of the panorama looks down +Z.
        assert_eq!(pixels.pixel(8, 4), [CubeFace::PositiveZ.index() as u8 * 50, 0, 0]);
        assert_eq!(backend.live_targets(), 2);

        backend.release_target(cube);
        backend.release_target(equirect);
        assert_eq!(backend.live_targets(), 0);
    }

    #[test]
    fn test_async_readback_matches_sync() {
        let backend = backend();
        let cube = backend.acquire_target(TargetDesc::Cube { edge: 8 }).unwrap();
        let equirect = backend
            .acquire_target(TargetDesc::Equirect { width: 32, height: 16 })
            .unwrap();
        backend.render_cubemap(&Viewpoint::default(), cube).unwrap();
        backend.remap_equirect(cube, equirect, 0.3).unwrap();

        let (tx, rx) = channel::bounded(1);
        backend.read_back_async(equirect, Box::new(move |pixels| tx.send(pixels).unwrap()));
        let async_pixels = rx.recv_timeout(Duration::from_secs(5)).unwrap().unwrap();
        assert_eq!(async_pixels, backend.read_back(equirect).unwrap());
    }

    #[test]
    fn test_readback_of_released_target_fails() {
        let backend = backend();
        let equirect = backend
            .acquire_target(TargetDesc::Equirect { width: 8, height: 4 })
            .unwrap();
        backend.release_target(equirect);
        assert!(matches!(backend.read_back(equirect), Err(CaptureError::Readback(_))));
    }

    #[test]
    fn test_camera_target_swap_returns_previous() {
        let backend = backend();
        assert_eq!(backend.swap_camera_target(Some(TargetHandle(7))), None);
        assert_eq!(backend.swap_camera_target(None), Some(TargetHandle(7)));
        assert_eq!(backend.camera_target(), None);
    }

    #[test]
    fn test_rejects_non_two_to_one_equirect() {
        let backend = backend();
        let err = backend
            .acquire_target(TargetDesc::Equirect { width: 10, height: 10 })
            .unwrap_err();
        assert!(matches!(err, CaptureError::TargetUnavailable(_)));
    }
}
