use std::sync::Arc;

use crate::types::{Point3, Rgb, Topology, Triangle};

/// One concrete instance of a morphable model.
///
/// The topology is shared with the model that produced the mesh; only the
/// per-vertex data is owned.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Point3>,
    /// One color per vertex, or empty if the model has no color model.
    pub colors: Vec<Rgb>,
    topology: Arc<Topology>,
}

impl Mesh {
    pub fn new(vertices: Vec<Point3>, colors: Vec<Rgb>, topology: Arc<Topology>) -> Self {
        debug_assert!(colors.is_empty() || colors.len() == vertices.len());
        Self {
            vertices,
            colors,
            topology,
        }
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn has_colors(&self) -> bool {
        !self.colors.is_empty()
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.topology.triangles
    }

    pub fn texcoords(&self) -> &[[f32; 2]] {
        &self.topology.texcoords
    }

    pub fn topology(&self) -> &Arc<Topology> {
        &self.topology
    }
}
