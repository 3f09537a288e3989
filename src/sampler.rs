//! Random coefficient draws.
//!
//! PCA channels are sampled from `Normal(0, spread)`; blendshape weights are
//! activation levels and are sampled from `Uniform[0, spread]`. The generator
//! is always supplied by the caller, so a fixed seed reproduces a sequence of
//! draws exactly.

use rand::distr::{Distribution, Uniform};
use rand::Rng;
use rand_distr::Normal;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::MorphableModel;
use crate::reconstruct::Coefficients;

/// Per-channel spread for [`draw`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spread {
    pub shape: f32,
    pub expression: f32,
    pub color: f32,
}

impl Spread {
    pub const fn uniform(spread: f32) -> Self {
        Self {
            shape: spread,
            expression: spread,
            color: spread,
        }
    }
}

impl Default for Spread {
    fn default() -> Self {
        Self::uniform(1.0)
    }
}

fn check_spread(spread: f32) -> Result<()> {
    if spread.is_finite() && spread >= 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidSpread(spread))
    }
}

/// `n` independent draws from `Normal(0, spread)`.
pub(crate) fn normal_draws<R: Rng + ?Sized>(rng: &mut R, n: usize, spread: f32) -> Result<Vec<f32>> {
    check_spread(spread)?;
    let normal = Normal::new(0.0, spread).map_err(|_| Error::InvalidSpread(spread))?;
    Ok((0..n).map(|_| normal.sample(rng)).collect())
}

/// `n` independent draws from `Uniform[0, spread]`.
pub(crate) fn uniform_draws<R: Rng + ?Sized>(rng: &mut R, n: usize, spread: f32) -> Result<Vec<f32>> {
    check_spread(spread)?;
    let uniform = Uniform::new_inclusive(0.0, spread).map_err(|_| Error::InvalidSpread(spread))?;
    Ok((0..n).map(|_| uniform.sample(rng)).collect())
}

/// Draw a full set of coefficients for `model`.
///
/// Every component of every channel is resampled. The expression vector is
/// empty when the model has no expression component, and the color vector is
/// empty when it has no color model.
pub fn draw<R: Rng + ?Sized>(
    model: &MorphableModel,
    rng: &mut R,
    spread: Spread,
) -> Result<Coefficients> {
    let shape = model.shape().sample_random(rng, spread.shape)?;
    let expression = match model.expression() {
        Some(expression) => expression.sample_random(rng, spread.expression)?,
        None => {
            check_spread(spread.expression)?;
            Vec::new()
        }
    };
    let color = match model.color() {
        Some(color) => color.sample_random(rng, spread.color)?,
        None => {
            check_spread(spread.color)?;
            Vec::new()
        }
    };

    Ok(Coefficients {
        shape,
        expression,
        color,
    })
}
