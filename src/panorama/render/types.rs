//! Render target types

use glam::Vec3;

/// Opaque handle to a backend-owned render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetHandle(pub u64);

/// Shape of a render target to acquire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetDesc {
    /// Six square faces of `edge` pixels
    Cube { edge: u32 },
    /// Flat RGB target
    Equirect { width: u32, height: u32 },
}

/// World-space point a cube capture is rendered from. Cube captures are
/// axis-aligned, so only the position matters; the camera heading is applied
/// later as remap padding.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewpoint {
    pub position: Vec3,
}

impl Viewpoint {
    pub fn at(position: Vec3) -> Self {
        Self { position }
    }
}
