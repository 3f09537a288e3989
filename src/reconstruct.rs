//! Turning coefficient vectors into meshes.
//!
//! These functions check every coefficient vector against its channel before
//! evaluating, so a caller sees which channel was wrong. Empty vectors are
//! always accepted and mean "no offset from the mean".

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::mesh::Mesh;
use crate::model::MorphableModel;

/// One coefficient vector per channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Coefficients {
    pub shape: Vec<f32>,
    pub expression: Vec<f32>,
    pub color: Vec<f32>,
}

impl Coefficients {
    /// All-zero coefficients sized to every component of `model`.
    pub fn zeros_for(model: &MorphableModel) -> Self {
        Self {
            shape: vec![0.0; model.num_shape_components()],
            expression: vec![0.0; model.num_expression_components()],
            color: vec![0.0; model.num_color_components()],
        }
    }

    /// Set every coefficient to zero, keeping the lengths.
    pub fn reset(&mut self) {
        for c in self
            .shape
            .iter_mut()
            .chain(self.expression.iter_mut())
            .chain(self.color.iter_mut())
        {
            *c = 0.0;
        }
    }
}

fn check_len(what: &'static str, components: usize, coefficients: &[f32]) -> Result<()> {
    if coefficients.len() > components {
        return Err(Error::DimensionMismatch {
            what,
            components,
            coefficients: coefficients.len(),
        });
    }
    Ok(())
}

/// Check `coefficients` against the component counts of `model`.
pub fn validate(model: &MorphableModel, coefficients: &Coefficients) -> Result<()> {
    check_len("shape", model.num_shape_components(), &coefficients.shape)?;
    check_len("color", model.num_color_components(), &coefficients.color)?;
    if !model.has_expression() && !coefficients.expression.is_empty() {
        return Err(Error::MissingExpression);
    }
    check_len(
        "expression",
        model.num_expression_components(),
        &coefficients.expression,
    )
}

/// The mean mesh of `model`.
pub fn reconstruct_mean(model: &MorphableModel) -> Mesh {
    model.mean_mesh()
}

/// The mesh for `coefficients`, including the expression delta when the
/// model has an expression component.
pub fn reconstruct(model: &MorphableModel, coefficients: &Coefficients) -> Result<Mesh> {
    validate(model, coefficients)?;
    if model.has_expression() {
        model.sample_with_expression(
            &coefficients.shape,
            &coefficients.expression,
            &coefficients.color,
        )
    } else {
        model.sample(&coefficients.shape, &coefficients.color)
    }
}
