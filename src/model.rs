use std::sync::Arc;

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::basis::PcaModel;
use crate::error::{Error, Result};
use crate::expression::{Blendshape, ExpressionModel};
use crate::mesh::Mesh;
use crate::types::{from_flat, Point3, Rgb, Topology};

/// A 3D morphable model: PCA shape and color models, an optional expression
/// component, and the topology shared by every instance.
///
/// The model is immutable. Merging in a new expression component produces a
/// new model that shares the other parts with the original.
///
/// # Usage
///
/// ```no_run
/// use morph_face::{FileStore, ModelStore};
/// use std::path::Path;
///
/// let model = FileStore.load_model(Path::new("face.bin"))?;
/// let mesh = model.sample(&[1.0, -0.5], &[])?;
/// println!("{} vertices", mesh.num_vertices());
/// # Ok::<(), morph_face::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MorphableModel {
    /// Vertex positions, `D = 3V`.
    shape: Arc<PcaModel>,

    /// Per-vertex colors, same dimension as the shape model.
    color: Option<Arc<PcaModel>>,

    /// Deltas added on top of shape instances.
    expression: Option<Arc<ExpressionModel>>,

    topology: Arc<Topology>,
}

impl MorphableModel {
    /// Create a model, checking that all parts agree on the vertex count.
    pub fn new(
        shape: PcaModel,
        color: Option<PcaModel>,
        expression: Option<ExpressionModel>,
        topology: Topology,
    ) -> Result<Self> {
        let model = Self {
            shape: Arc::new(shape),
            color: color.map(Arc::new),
            expression: expression.map(Arc::new),
            topology: Arc::new(topology),
        };
        model.validate()?;
        Ok(model)
    }

    pub fn builder() -> MorphableModelBuilder {
        MorphableModelBuilder::new()
    }

    /// Check every invariant that ties the parts together.
    pub fn validate(&self) -> Result<()> {
        self.shape.validate()?;
        let dim = self.shape.data_dimension();
        if dim % 3 != 0 {
            return Err(Error::InvalidModel(format!(
                "Shape dimension {} is not a multiple of 3",
                dim
            )));
        }

        if let Some(color) = &self.color {
            color.validate()?;
            if color.data_dimension() != dim {
                return Err(Error::InvalidModel(format!(
                    "Color dimension {} does not match shape dimension {}",
                    color.data_dimension(),
                    dim
                )));
            }
        }

        if let Some(expression) = &self.expression {
            check_expression(expression, dim)?;
        }

        let num_vertices = self.num_vertices();
        if let Some(max) = self.topology.max_vertex_index() {
            if max as usize >= num_vertices {
                return Err(Error::InvalidModel(format!(
                    "Triangle references vertex {} but the model has {} vertices",
                    max, num_vertices
                )));
            }
        }
        if self.topology.has_texcoords() && self.topology.texcoords.len() != num_vertices {
            return Err(Error::InvalidModel(format!(
                "{} texture coordinates for {} vertices",
                self.topology.texcoords.len(),
                num_vertices
            )));
        }

        Ok(())
    }

    pub fn shape(&self) -> &Arc<PcaModel> {
        &self.shape
    }

    pub fn color(&self) -> Option<&Arc<PcaModel>> {
        self.color.as_ref()
    }

    pub fn expression(&self) -> Option<&Arc<ExpressionModel>> {
        self.expression.as_ref()
    }

    pub fn topology(&self) -> &Arc<Topology> {
        &self.topology
    }

    pub fn num_vertices(&self) -> usize {
        self.shape.data_dimension() / 3
    }

    pub fn has_color(&self) -> bool {
        self.color.is_some()
    }

    pub fn has_expression(&self) -> bool {
        self.expression.is_some()
    }

    pub fn num_shape_components(&self) -> usize {
        self.shape.num_components()
    }

    pub fn num_color_components(&self) -> usize {
        self.color.as_ref().map_or(0, |c| c.num_components())
    }

    pub fn num_expression_components(&self) -> usize {
        self.expression.as_ref().map_or(0, |e| e.component_count())
    }

    /// Return a new model with `expression` replacing the current expression
    /// component. Shape, color and topology are shared with `self`, which is
    /// left untouched.
    pub fn with_expression(&self, expression: ExpressionModel) -> Result<Self> {
        check_expression(&expression, self.shape.data_dimension())?;
        Ok(Self {
            shape: Arc::clone(&self.shape),
            color: self.color.clone(),
            expression: Some(Arc::new(expression)),
            topology: Arc::clone(&self.topology),
        })
    }

    /// Shorthand for [`with_expression`](Self::with_expression) with a
    /// blendshape set.
    pub fn with_blendshapes(&self, blendshapes: Vec<Blendshape>) -> Result<Self> {
        self.with_expression(ExpressionModel::Blendshapes(blendshapes))
    }

    /// The mean shape with the mean color.
    pub fn mean_mesh(&self) -> Mesh {
        let colors = self.color.as_ref().map(|c| c.evaluate_mean());
        self.make_mesh(&self.shape.evaluate_mean(), colors.as_ref())
    }

    /// An instance without expression.
    pub fn sample(&self, shape_coefficients: &[f32], color_coefficients: &[f32]) -> Result<Mesh> {
        let shape = self.shape.evaluate(shape_coefficients)?;
        let colors = self.evaluate_color(color_coefficients)?;
        Ok(self.make_mesh(&shape, colors.as_ref()))
    }

    /// An instance with the expression delta added to the shape.
    ///
    /// On a model without expression, empty expression coefficients fall back
    /// to [`sample`](Self::sample); any non-empty vector is rejected with
    /// [`Error::MissingExpression`].
    pub fn sample_with_expression(
        &self,
        shape_coefficients: &[f32],
        expression_coefficients: &[f32],
        color_coefficients: &[f32],
    ) -> Result<Mesh> {
        let Some(expression) = &self.expression else {
            if !expression_coefficients.is_empty() {
                return Err(Error::MissingExpression);
            }
            return self.sample(shape_coefficients, color_coefficients);
        };

        let shape = self.shape.evaluate(shape_coefficients)? + expression.evaluate(expression_coefficients)?;
        let colors = self.evaluate_color(color_coefficients)?;
        Ok(self.make_mesh(&shape, colors.as_ref()))
    }

    fn evaluate_color(&self, coefficients: &[f32]) -> Result<Option<Array1<f32>>> {
        match &self.color {
            Some(color) => color.evaluate(coefficients).map(Some),
            None if coefficients.is_empty() => Ok(None),
            None => Err(Error::DimensionMismatch {
                what: "color",
                components: 0,
                coefficients: coefficients.len(),
            }),
        }
    }

    fn make_mesh(&self, shape: &Array1<f32>, colors: Option<&Array1<f32>>) -> Mesh {
        Mesh::new(
            reshape::<Point3>(shape),
            colors.map(reshape::<Rgb>).unwrap_or_default(),
            Arc::clone(&self.topology),
        )
    }
}

fn check_expression(expression: &ExpressionModel, shape_dimension: usize) -> Result<()> {
    expression.validate()?;
    match expression.data_dimension() {
        Some(dim) if dim == shape_dimension => Ok(()),
        dim => Err(Error::InvalidModel(format!(
            "Expression dimension {} does not match shape dimension {}",
            dim.unwrap_or(0),
            shape_dimension
        ))),
    }
}

/// Reshape a flat `[x0, y0, z0, x1, ...]` instance into triples.
fn reshape<T: From<[f32; 3]>>(flat: &Array1<f32>) -> Vec<T> {
    match flat.as_slice() {
        Some(slice) => from_flat(slice),
        None => from_flat(&flat.to_vec()),
    }
}

/// Builder for creating a [`MorphableModel`].
pub struct MorphableModelBuilder {
    shape: Option<PcaModel>,
    color: Option<PcaModel>,
    expression: Option<ExpressionModel>,
    topology: Topology,
}

impl MorphableModelBuilder {
    pub fn new() -> Self {
        Self {
            shape: None,
            color: None,
            expression: None,
            topology: Topology::default(),
        }
    }

    pub fn shape(mut self, shape: PcaModel) -> Self {
        self.shape = Some(shape);
        self
    }

    pub fn color(mut self, color: PcaModel) -> Self {
        self.color = Some(color);
        self
    }

    pub fn expression(mut self, expression: ExpressionModel) -> Self {
        self.expression = Some(expression);
        self
    }

    pub fn topology(mut self, topology: Topology) -> Self {
        self.topology = topology;
        self
    }

    /// Build the MorphableModel.
    pub fn build(self) -> Result<MorphableModel> {
        let shape = self
            .shape
            .ok_or_else(|| Error::InvalidModel("Missing shape model".into()))?;

        MorphableModel::new(shape, self.color, self.expression, self.topology)
    }
}

impl Default for MorphableModelBuilder {
    fn default() -> Self {
        Self::new()
    }
}
