use ndarray::{Array1, ArrayView1};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::basis::PcaModel;
use crate::error::{Error, Result};
use crate::sampler::uniform_draws;

/// A named deformation applied on top of a shape instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blendshape {
    pub name: String,
    /// Per-vertex offsets, `[dx0, dy0, dz0, dx1, ...]`.
    pub deformation: Vec<f32>,
}

impl Blendshape {
    pub fn new(name: impl Into<String>, deformation: Vec<f32>) -> Self {
        Self {
            name: name.into(),
            deformation,
        }
    }
}

/// The expression component of a morphable model.
///
/// Both variants produce a *delta* that is added to a shape instance, but the
/// coefficients mean different things: blendshape weights are non-negative
/// activation levels of non-orthogonal deformations, PCA coefficients are
/// scores centered on the neutral expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExpressionModel {
    Blendshapes(Vec<Blendshape>),
    Pca(PcaModel),
}

impl ExpressionModel {
    pub fn component_count(&self) -> usize {
        match self {
            ExpressionModel::Blendshapes(shapes) => shapes.len(),
            ExpressionModel::Pca(model) => model.num_components(),
        }
    }

    /// Length of the produced delta, or `None` for an empty blendshape set.
    pub fn data_dimension(&self) -> Option<usize> {
        match self {
            ExpressionModel::Blendshapes(shapes) => shapes.first().map(|b| b.deformation.len()),
            ExpressionModel::Pca(model) => Some(model.data_dimension()),
        }
    }

    /// Display names of the components: blendshape names, or the component
    /// index for PCA expressions.
    pub fn component_names(&self) -> Vec<String> {
        match self {
            ExpressionModel::Blendshapes(shapes) => shapes.iter().map(|b| b.name.clone()).collect(),
            ExpressionModel::Pca(model) => (0..model.num_components()).map(|i| i.to_string()).collect(),
        }
    }

    /// Check that every blendshape has the same, non-zero length and that a
    /// PCA expression is internally consistent.
    pub fn validate(&self) -> Result<()> {
        match self {
            ExpressionModel::Blendshapes(shapes) => validate_blendshapes(shapes),
            ExpressionModel::Pca(model) => model.validate(),
        }
    }

    /// Evaluate the expression delta for the given coefficients.
    ///
    /// Missing trailing coefficients count as zero. More coefficients than
    /// components is an error.
    pub fn evaluate(&self, coefficients: &[f32]) -> Result<Array1<f32>> {
        if coefficients.len() > self.component_count() {
            return Err(Error::DimensionMismatch {
                what: "expression",
                components: self.component_count(),
                coefficients: coefficients.len(),
            });
        }

        match self {
            ExpressionModel::Blendshapes(shapes) => {
                let mut delta = Array1::zeros(self.data_dimension().unwrap_or(0));
                for (shape, &weight) in shapes.iter().zip(coefficients) {
                    if weight == 0.0 {
                        continue;
                    }
                    if shape.deformation.len() != delta.len() {
                        return Err(Error::InvalidModel(format!(
                            "Blendshape '{}' has length {}, expected {}",
                            shape.name,
                            shape.deformation.len(),
                            delta.len()
                        )));
                    }
                    delta.scaled_add(weight, &ArrayView1::from(&shape.deformation));
                }
                Ok(delta)
            }
            // The PCA mean is the neutral expression, so only the offset from
            // it is a usable delta.
            ExpressionModel::Pca(model) => Ok(model.evaluate(coefficients)? - model.mean()),
        }
    }

    /// Draw a full set of expression coefficients.
    ///
    /// Blendshape weights come from `Uniform[0, spread]` and are never
    /// negative; PCA coefficients come from `Normal(0, spread)`.
    pub fn sample_random<R: Rng + ?Sized>(&self, rng: &mut R, spread: f32) -> Result<Vec<f32>> {
        match self {
            ExpressionModel::Blendshapes(shapes) => uniform_draws(rng, shapes.len(), spread),
            ExpressionModel::Pca(model) => model.sample_random(rng, spread),
        }
    }
}

/// Check that a blendshape set is non-empty and that every deformation has
/// the same length.
pub fn validate_blendshapes(shapes: &[Blendshape]) -> Result<()> {
    let Some(first) = shapes.first() else {
        return Err(Error::InvalidModel("Blendshape set is empty".into()));
    };
    let dim = first.deformation.len();
    if let Some(bad) = shapes.iter().find(|b| b.deformation.len() != dim) {
        return Err(Error::InvalidModel(format!(
            "Blendshape '{}' has length {}, expected {}",
            bad.name,
            bad.deformation.len(),
            dim
        )));
    }
    Ok(())
}
