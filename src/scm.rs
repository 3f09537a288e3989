//! Loader for the legacy `.scm` morphable model format.
//!
//! The format is a flat little-endian stream with no header or version tag:
//!
//! ```text
//! u32 num_vertices, u32 num_triangles
//! num_triangles x (u32, u32, u32)           triangle vertex indices
//! shape block, then color block, each:
//!   u32 K, u32 D                            basis size
//!   K columns x D f64                       orthonormal basis, column-major
//!   u32 D, D x f64                          mean
//!   u32 K, K x f64                          eigenvalues
//! ```
//!
//! The stored basis is orthonormal; it is rescaled by the square root of the
//! eigenvalues on load. A color block with zero components means the model
//! has no color model, whether or not it carries a mean.

use std::io::Read;

use log::{debug, warn};
use ndarray::{Array1, Array2};

use crate::basis::PcaModel;
use crate::error::{Error, Result};
use crate::model::MorphableModel;
use crate::types::{Topology, Triangle};

/// Reader wrapper for the fixed-width little-endian fields.
struct ScmReader<R: Read> {
    reader: R,
}

impl<R: Read> ScmReader<R> {
    fn new(reader: R) -> Self {
        Self { reader }
    }

    fn read_u32(&mut self) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.reader.read_exact(&mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    fn read_len(&mut self) -> Result<usize> {
        Ok(self.read_u32()? as usize)
    }

    fn read_f64(&mut self) -> Result<f64> {
        let mut buf = [0u8; 8];
        self.reader.read_exact(&mut buf)?;
        Ok(f64::from_le_bytes(buf))
    }

    /// Read `n` doubles, narrowed to `f32`.
    fn read_f64_vec(&mut self, n: usize) -> Result<Vec<f32>> {
        (0..n).map(|_| self.read_f64().map(|v| v as f32)).collect()
    }
}

/// Load a legacy model from an already-opened reader.
pub fn load_scm_model_from_reader<R: Read>(reader: R) -> Result<MorphableModel> {
    let mut r = ScmReader::new(reader);
    parse_scm_model(&mut r)
}

fn parse_scm_model<R: Read>(r: &mut ScmReader<R>) -> Result<MorphableModel> {
    let num_vertices = r.read_len()?;
    let num_triangles = r.read_len()?;

    let mut triangles: Vec<Triangle> = Vec::with_capacity(num_triangles.min(1 << 20));
    for _ in 0..num_triangles {
        let triangle = [r.read_u32()?, r.read_u32()?, r.read_u32()?];
        if let Some(&bad) = triangle.iter().find(|&&v| v as usize >= num_vertices) {
            return Err(Error::InvalidModel(format!(
                "Triangle index {} out of bounds for {} vertices",
                bad, num_vertices
            )));
        }
        triangles.push(triangle);
    }

    let shape = parse_pca_block(r, "shape", num_vertices)?
        .ok_or_else(|| Error::InvalidModel("Shape model has no components".into()))?;
    // A color block with only a mean still means "no color model".
    let color = parse_pca_block(r, "color", num_vertices)?.filter(|c| c.num_components() > 0);
    if color.is_none() {
        warn!("Legacy model has no color components");
    }

    debug!(
        "Loaded legacy model: {} vertices, {} triangles, {} shape / {} color components",
        num_vertices,
        num_triangles,
        shape.num_components(),
        color.as_ref().map_or(0, |c| c.num_components())
    );

    MorphableModel::new(shape, color, None, Topology::new(triangles))
}

/// Parse one basis/mean/eigenvalue block. Returns `None` for a block with
/// zero components and zero dimension, and a mean-only model for a block with
/// zero components over a full mean.
fn parse_pca_block<R: Read>(
    r: &mut ScmReader<R>,
    what: &str,
    num_vertices: usize,
) -> Result<Option<PcaModel>> {
    let num_components = r.read_len()?;
    let num_dims = r.read_len()?;

    if num_components == 0 && num_dims == 0 {
        // An empty block still carries empty mean and eigenvalue vectors.
        let num_mean = r.read_len()?;
        let num_eigenvalues = r.read_len()?;
        if num_mean != 0 || num_eigenvalues != 0 {
            return Err(Error::InvalidModel(format!(
                "Empty {} block has {} mean values and {} eigenvalues",
                what, num_mean, num_eigenvalues
            )));
        }
        return Ok(None);
    }

    if num_dims != 3 * num_vertices {
        return Err(Error::InvalidModel(format!(
            "{} dimension {} is not three times the vertex count {}",
            what, num_dims, num_vertices
        )));
    }

    // The basis is stored column by column.
    let data = r.read_f64_vec(num_components * num_dims)?;
    let basis = Array2::from_shape_vec((num_components, num_dims), data)
        .map_err(|e| Error::InvalidModel(format!("Invalid {} basis: {}", what, e)))?
        .reversed_axes();

    let num_mean = r.read_len()?;
    if num_mean != num_dims {
        return Err(Error::InvalidModel(format!(
            "{} mean has length {}, expected {}",
            what, num_mean, num_dims
        )));
    }
    let mean = Array1::from(r.read_f64_vec(num_mean)?);

    let num_eigenvalues = r.read_len()?;
    if num_eigenvalues != num_components {
        return Err(Error::InvalidModel(format!(
            "{} has {} eigenvalues for {} components",
            what, num_eigenvalues, num_components
        )));
    }
    let eigenvalues = Array1::from(r.read_f64_vec(num_eigenvalues)?);

    if num_components == 0 {
        return Ok(Some(PcaModel::from_mean(mean)));
    }
    PcaModel::from_orthonormal(mean, basis.as_standard_layout().into_owned(), eigenvalues).map(Some)
}
