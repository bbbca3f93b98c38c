//! Pixel buffers exchanged between the render backend and the projector

use crate::panorama::projection::cube::CubeFace;

/// Six square RGB8 faces of a cube capture, indexed by [`CubeFace::index`].
#[derive(Debug, Clone)]
pub struct CubemapBuffer {
    edge: u32,
    faces: [Vec<u8>; 6],
}

impl CubemapBuffer {
    pub fn new(edge: u32) -> Self {
        let face_len = edge as usize * edge as usize * 3;
        Self {
            edge,
            faces: std::array::from_fn(|_| vec![0u8; face_len]),
        }
    }

    pub fn edge(&self) -> u32 {
        self.edge
    }

    pub fn face(&self, face: CubeFace) -> &[u8] {
        &self.faces[face.index()]
    }

    pub fn face_mut(&mut self, face: CubeFace) -> &mut [u8] {
        &mut self.faces[face.index()]
    }

    /// Mutable access to all faces at once, in [`CubeFace::ALL`] order.
    pub fn faces_mut(&mut self) -> &mut [Vec<u8>; 6] {
        &mut self.faces
    }

    #[inline]
    pub fn pixel(&self, face: CubeFace, x: u32, y: u32) -> [u8; 3] {
        let i = (y as usize * self.edge as usize + x as usize) * 3;
        let data = self.face(face);
        [data[i], data[i + 1], data[i + 2]]
    }

    /// Fills one face with a single colour.
    pub fn fill_face(&mut self, face: CubeFace, rgb: [u8; 3]) {
        for px in self.faces[face.index()].chunks_exact_mut(3) {
            px.copy_from_slice(&rgb);
        }
    }
}

/// Equirectangular RGB8 image, row-major, `height == width / 2`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EquirectangularBuffer {
    /// Width of the image in pixels
    pub width: u32,
    /// Height of the image in pixels
    pub height: u32,
    /// RGB pixel data interleaved [R, G, B, R, G, B, ...]
    pub data: Vec<u8>,
}

impl EquirectangularBuffer {
    /// Allocates a black panorama `width` pixels wide and `width / 2` high.
    pub fn new(width: u32) -> Self {
        let height = width / 2;
        Self {
            width,
            height,
            data: vec![0u8; width as usize * height as usize * 3],
        }
    }

    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let i = (y as usize * self.width as usize + x as usize) * 3;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }
}
