//! CPU cube-to-equirectangular remap.
//!
//! Every output pixel centre is turned into a longitude/latitude pair, then a
//! direction, then a cube face lookup. A horizontal `padding` in turns rotates
//! the seam: with padding `k / width`, output column `x` shows what unpadded
//! column `(x + k) mod width` would show.

use std::f64::consts::{PI, TAU};

use glam::Vec3;
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::panorama::common::error::{CaptureError, Result};
use crate::panorama::projection::cube::direction_to_face_uv;
use crate::panorama::projection::types::{CubemapBuffer, EquirectangularBuffer};

/// How face texels are sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SampleFilter {
    /// Nearest texel
    Nearest,
    /// Bilinear between the four nearest texels, clamped to the face
    #[default]
    Bilinear,
}

/// Owned remap "material": built once by whoever hosts the remap and reused
/// for every capture.
#[derive(Debug, Clone, Default)]
pub struct EquirectProjector {
    filter: SampleFilter,
}

impl EquirectProjector {
    pub fn new(filter: SampleFilter) -> Self {
        Self { filter }
    }

    /// Fills `output` from `cubemap`. `padding` is a fraction of a full turn
    /// and may be any finite value; it is wrapped into `[0, 1)`.
    pub fn project(
        &self,
        cubemap: &CubemapBuffer,
        padding: f32,
        output: &mut EquirectangularBuffer,
    ) -> Result<()> {
        let width = output.width as usize;
        let height = output.height as usize;
        if width == 0 || height == 0 || cubemap.edge() == 0 {
            return Err(CaptureError::InvalidDimensions(output.width, output.height));
        }
        let padding = if padding.is_finite() {
            f64::from(padding).rem_euclid(1.0)
        } else {
            warn!(padding, "Ignoring non-finite remap padding");
            0.0
        };
        debug!(
            width,
            height,
            edge = cubemap.edge(),
            padding,
            "Remapping cubemap to equirectangular"
        );

        output
            .data
            .par_chunks_mut(width * 3)
            .enumerate()
            .for_each(|(y, row)| {
                let v = (y as f64 + 0.5) / height as f64;
                let (sin_lat, cos_lat) = ((0.5 - v) * PI).sin_cos();
                for (x, px) in row.chunks_exact_mut(3).enumerate() {
                    let u = ((x as f64 + 0.5) / width as f64 + padding).fract();
                    let (sin_lon, cos_lon) = ((u - 0.5) * TAU).sin_cos();
                    let dir = Vec3::new(
                        (cos_lat * sin_lon) as f32,
                        sin_lat as f32,
                        (cos_lat * cos_lon) as f32,
                    );
                    px.copy_from_slice(&self.sample(cubemap, dir));
                }
            });

        Ok(())
    }

    fn sample(&self, cubemap: &CubemapBuffer, dir: Vec3) -> [u8; 3] {
        let (face, u, v) = direction_to_face_uv(dir);
        let edge = cubemap.edge();
        let max = edge - 1;

        match self.filter {
            SampleFilter::Nearest => {
                let x = ((u * edge as f32) as u32).min(max);
                let y = ((v * edge as f32) as u32).min(max);
                cubemap.pixel(face, x, y)
            }
            SampleFilter::Bilinear => {
                let fx = u * edge as f32 - 0.5;
                let fy = v * edge as f32 - 0.5;
                let x0 = fx.floor();
                let y0 = fy.floor();
                let tx = fx - x0;
                let ty = fy - y0;

                let clamp = |c: f32| (c.max(0.0) as u32).min(max);
                let (xa, xb) = (clamp(x0), clamp(x0 + 1.0));
                let (ya, yb) = (clamp(y0), clamp(y0 + 1.0));

                let p00 = cubemap.pixel(face, xa, ya);
                let p10 = cubemap.pixel(face, xb, ya);
                let p01 = cubemap.pixel(face, xa, yb);
                let p11 = cubemap.pixel(face, xb, yb);

                std::array::from_fn(|c| {
                    let top = f32::from(p00[c]) * (1.0 - tx) + f32::from(p10[c]) * tx;
                    let bottom = f32::from(p01[c]) * (1.0 - tx) + f32::from(p11[c]) * tx;
                    (top * (1.0 - ty) + bottom * ty).round().clamp(0.0, 255.0) as u8
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panorama::projection::cube::CubeFace;

    fn coloured_cube(edge: u32) -> CubemapBuffer {
        let mut cube = CubemapBuffer::new(edge);
        for face in CubeFace::ALL {
            let i = face.index() as u8;
            cube.fill_face(face, [i * 40, 255 - i * 40, i]);
        }
        cube
    }

    fn face_colour(face: CubeFace) -> [u8; 3] {
        let i = face.index() as u8;
        [i * 40, 255 - i * 40, i]
    }

    #[test]
    fn test_cardinal_directions_land_on_expected_faces() {
        let cube = coloured_cube(8);
        let mut out = EquirectangularBuffer::new(64);
        EquirectProjector::default().project(&cube, 0.0, &mut out).unwrap();

        let mid = out.height / 2;
        // Centre column looks down +Z, a quarter turn right is +X.
        assert_eq!(out.pixel(32, mid), face_colour(CubeFace::PositiveZ));
        assert_eq!(out.pixel(48, mid), face_colour(CubeFace::PositiveX));
        assert_eq!(out.pixel(16, mid), face_colour(CubeFace::NegativeX));
        assert_eq!(out.pixel(0, mid), face_colour(CubeFace::NegativeZ));
        assert_eq!(out.pixel(10, 0), face_colour(CubeFace::PositiveY));
        assert_eq!(out.pixel(10, out.height - 1), face_colour(CubeFace::NegativeY));
    }

    #[test]
    fn test_quarter_turn_padding_shifts_columns() {
        // A cube whose faces carry gradients, so column shifts are visible.
        let mut cube = CubemapBuffer::new(16);
        for face in CubeFace::ALL {
            let data = cube.face_mut(face);
            for (i, px) in data.chunks_exact_mut(3).enumerate() {
                px.copy_from_slice(&[(i % 251) as u8, face.index() as u8 * 30, (i / 16) as u8]);
            }
        }

        let projector = EquirectProjector::new(SampleFilter::Bilinear);
        let mut plain = EquirectangularBuffer::new(1024);
        let mut rotated = EquirectangularBuffer::new(1024);
        projector.project(&cube, 0.0, &mut plain).unwrap();
        projector.project(&cube, 90.0 / 360.0, &mut rotated).unwrap();

        for y in [0u32, 100, 255, 256, 511] {
            for x in 0..1024u32 {
                assert_eq!(
                    rotated.pixel(x, y),
                    plain.pixel((x + 256) % 1024, y),
                    "x={x} y={y}"
                );
            }
        }
    }

    #[test]
    fn test_full_turn_padding_is_identity() {
        let cube = coloured_cube(4);
        let projector = EquirectProjector::new(SampleFilter::Nearest);
        let mut a = EquirectangularBuffer::new(32);
        let mut b = EquirectangularBuffer::new(32);
        projector.project(&cube, 0.0, &mut a).unwrap();
        projector.project(&cube, 1.0, &mut b).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_degenerate_output_is_rejected() {
        let cube = coloured_cube(4);
        let mut out = EquirectangularBuffer::new(1);
        let err = EquirectProjector::default().project(&cube, 0.0, &mut out).unwrap_err();
        assert!(matches!(err, CaptureError::InvalidDimensions(1, 0)));
    }
}
