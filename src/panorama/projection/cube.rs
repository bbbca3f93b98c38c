//! Cube face addressing.
//!
//! Directions use a Y-up frame with +Z forward. Face images are stored top row
//! first; `(u, v)` are normalised face coordinates with `v = 0` at the top row.
//! The per-face axes follow the usual major-axis cube map table:
//!
//! | face | major axis | u grows toward | v grows toward |
//! |------|------------|----------------|----------------|
//! | +X   | +x         | -z             | -y             |
//! | -X   | -x         | +z             | -y             |
//! | +Y   | +y         | +x             | +z             |
//! | -Y   | -y         | +x             | -z             |
//! | +Z   | +z         | +x             | -y             |
//! | -Z   | -z         | -x             | -y             |

use glam::Vec3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CubeFace {
    PositiveX,
    NegativeX,
    PositiveY,
    NegativeY,
    PositiveZ,
    NegativeZ,
}

impl CubeFace {
    pub const ALL: [CubeFace; 6] = [
        CubeFace::PositiveX,
        CubeFace::NegativeX,
        CubeFace::PositiveY,
        CubeFace::NegativeY,
        CubeFace::PositiveZ,
        CubeFace::NegativeZ,
    ];

    pub fn index(self) -> usize {
        match self {
            CubeFace::PositiveX => 0,
            CubeFace::NegativeX => 1,
            CubeFace::PositiveY => 2,
            CubeFace::NegativeY => 3,
            CubeFace::PositiveZ => 4,
            CubeFace::NegativeZ => 5,
        }
    }
}

/// Maps a direction (need not be normalised, must be non-zero) to the face it
/// hits and the `(u, v)` coordinates on that face, both in `[0, 1]`.
#[inline]
pub fn direction_to_face_uv(dir: Vec3) -> (CubeFace, f32, f32) {
    let abs = dir.abs();
    let (face, sc, tc, ma) = if abs.x >= abs.y && abs.x >= abs.z {
        if dir.x >= 0.0 {
            (CubeFace::PositiveX, -dir.z, -dir.y, abs.x)
        } else {
            (CubeFace::NegativeX, dir.z, -dir.y, abs.x)
        }
    } else if abs.y >= abs.z {
        if dir.y >= 0.0 {
            (CubeFace::PositiveY, dir.x, dir.z, abs.y)
        } else {
            (CubeFace::NegativeY, dir.x, -dir.z, abs.y)
        }
    } else if dir.z >= 0.0 {
        (CubeFace::PositiveZ, dir.x, -dir.y, abs.z)
    } else {
        (CubeFace::NegativeZ, -dir.x, -dir.y, abs.z)
    };

    let u = ((sc / ma + 1.0) * 0.5).clamp(0.0, 1.0);
    let v = ((tc / ma + 1.0) * 0.5).clamp(0.0, 1.0);
    (face, u, v)
}

/// Inverse of [`direction_to_face_uv`]: the (unnormalised) direction through
/// face coordinate `(u, v)`.
#[inline]
pub fn face_uv_to_direction(face: CubeFace, u: f32, v: f32) -> Vec3 {
    let sc = 2.0 * u - 1.0;
    let tc = 2.0 * v - 1.0;
    match face {
        CubeFace::PositiveX => Vec3::new(1.0, -tc, -sc),
        CubeFace::NegativeX => Vec3::new(-1.0, -tc, sc),
        CubeFace::PositiveY => Vec3::new(sc, 1.0, tc),
        CubeFace::NegativeY => Vec3::new(sc, -1.0, -tc),
        CubeFace::PositiveZ => Vec3::new(sc, -tc, 1.0),
        CubeFace::NegativeZ => Vec3::new(-sc, -tc, -1.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_directions_hit_face_centres() {
        let cases = [
            (Vec3::X, CubeFace::PositiveX),
            (Vec3::NEG_X, CubeFace::NegativeX),
            (Vec3::Y, CubeFace::PositiveY),
            (Vec3::NEG_Y, CubeFace::NegativeY),
            (Vec3::Z, CubeFace::PositiveZ),
            (Vec3::NEG_Z, CubeFace::NegativeZ),
        ];
        for (dir, expected) in cases {
            let (face, u, v) = direction_to_face_uv(dir);
            assert_eq!(face, expected);
            assert!((u - 0.5).abs() < 1e-6 && (v - 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn test_face_uv_inverts_direction_lookup() {
        // Stay off the exact edges where two faces tie.
        let samples = [0.1f32, 0.3, 0.5, 0.7, 0.9];
        for face in CubeFace::ALL {
            for &u in &samples {
                for &v in &samples {
                    let dir = face_uv_to_direction(face, u, v).normalize();
                    let (back, bu, bv) = direction_to_face_uv(dir);
                    assert_eq!(back, face, "u={u} v={v}");
                    assert!((bu - u).abs() < 1e-5, "{face:?} u {bu} != {u}");
                    assert!((bv - v).abs() < 1e-5, "{face:?} v {bv} != {v}");
                }
            }
        }
    }

    #[test]
    fn test_top_row_of_side_faces_looks_up() {
        for face in [
            CubeFace::PositiveX,
            CubeFace::NegativeX,
            CubeFace::PositiveZ,
            CubeFace::NegativeZ,
        ] {
            assert!(face_uv_to_direction(face, 0.5, 0.0).y > 0.0);
        }
    }
}
