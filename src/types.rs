use serde::{Deserialize, Serialize};

/// A 3D point with floating-point coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

impl From<[f32; 3]> for Point3 {
    fn from([x, y, z]: [f32; 3]) -> Self {
        Self { x, y, z }
    }
}

impl From<Point3> for [f32; 3] {
    fn from(p: Point3) -> Self {
        [p.x, p.y, p.z]
    }
}

/// A per-vertex color. Channels are usually in [0, 1], but samples far from
/// the mean can leave that range; no clamping is applied.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }
}

impl From<[f32; 3]> for Rgb {
    fn from([r, g, b]: [f32; 3]) -> Self {
        Self { r, g, b }
    }
}

impl From<Rgb> for [f32; 3] {
    fn from(c: Rgb) -> Self {
        [c.r, c.g, c.b]
    }
}

/// A triangle as three vertex indices.
pub type Triangle = [u32; 3];

/// Triangle connectivity and texture coordinates shared by every instance of a
/// model. Coefficients never change it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Topology {
    pub triangles: Vec<Triangle>,
    /// One `(u, v)` pair per vertex, or empty.
    pub texcoords: Vec<[f32; 2]>,
}

impl Topology {
    pub fn new(triangles: Vec<Triangle>) -> Self {
        Self {
            triangles,
            texcoords: Vec::new(),
        }
    }

    pub fn with_texcoords(mut self, texcoords: Vec<[f32; 2]>) -> Self {
        self.texcoords = texcoords;
        self
    }

    pub fn num_triangles(&self) -> usize {
        self.triangles.len()
    }

    pub fn has_texcoords(&self) -> bool {
        !self.texcoords.is_empty()
    }

    /// Largest vertex index referenced by any triangle.
    pub fn max_vertex_index(&self) -> Option<u32> {
        self.triangles.iter().flatten().copied().max()
    }
}

/// Interpret a flat `[x0, y0, z0, x1, y1, z1, ...]` vector as consecutive
/// triples. The vector length must be a multiple of 3.
pub fn from_flat<T: From<[f32; 3]>>(v: &[f32]) -> Vec<T> {
    debug_assert!(v.len() % 3 == 0);
    v.chunks_exact(3)
        .map(|c| T::from([c[0], c[1], c[2]]))
        .collect()
}

/// Flatten triples back to `[x0, y0, z0, x1, y1, z1, ...]`.
pub fn to_flat<T: Copy + Into<[f32; 3]>>(items: &[T]) -> Vec<f32> {
    let mut v = Vec::with_capacity(items.len() * 3);
    for &item in items {
        v.extend_from_slice(&item.into());
    }
    v
}
