//! Linear (PCA) basis models.
//!
//! A [`PcaModel`] describes a `D`-dimensional quantity (shape or color of `V`
//! vertices, so `D = 3V`) as a mean plus a linear combination of `K` basis
//! directions.

use ndarray::{s, Array1, Array2, ArrayView1};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::sampler::normal_draws;

/// A PCA-style linear model: mean, `D x K` basis and per-component variance.
///
/// # Usage
///
/// ```
/// use morph_face::PcaModel;
/// use ndarray::{array, Array2};
///
/// let model = PcaModel::new(array![0.0, 0.0, 1.0], Array2::eye(3), array![1.0, 1.0, 1.0])?;
/// let instance = model.evaluate(&[1.5, -0.5])?; // remaining components are 0
/// assert_eq!(instance, array![1.5, -0.5, 1.0]);
/// # Ok::<(), morph_face::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PcaModel {
    /// The mean instance, length `D`.
    mean: Array1<f32>,

    /// Basis directions as columns, `D x K`.
    basis: Array2<f32>,

    /// Variance explained by each basis column, length `K`.
    variance: Array1<f32>,
}

impl PcaModel {
    /// Create a model from a mean, a basis whose columns are already scaled
    /// to the desired coefficient units, and the per-component variances.
    pub fn new(mean: Array1<f32>, basis: Array2<f32>, variance: Array1<f32>) -> Result<Self> {
        let model = Self {
            mean,
            basis,
            variance,
        };
        model.validate()?;
        Ok(model)
    }

    /// Create a model from an orthonormal basis. Column `k` is rescaled by
    /// `sqrt(variance[k])` so that unit coefficients mean one standard
    /// deviation.
    pub fn from_orthonormal(
        mean: Array1<f32>,
        orthonormal_basis: Array2<f32>,
        variance: Array1<f32>,
    ) -> Result<Self> {
        if orthonormal_basis.ncols() != variance.len() {
            return Err(Error::InvalidModel(format!(
                "Basis has {} columns but {} variances were given",
                orthonormal_basis.ncols(),
                variance.len()
            )));
        }
        let mut basis = orthonormal_basis;
        for (mut column, &var) in basis.columns_mut().into_iter().zip(variance.iter()) {
            column *= var.max(0.0).sqrt();
        }
        Self::new(mean, basis, variance)
    }

    /// A model with no components: every evaluation yields the mean.
    pub fn from_mean(mean: Array1<f32>) -> Self {
        let dim = mean.len();
        Self {
            mean,
            basis: Array2::zeros((dim, 0)),
            variance: Array1::zeros(0),
        }
    }

    /// Check the dimensional invariants. Deserialized models must pass this
    /// before use.
    pub fn validate(&self) -> Result<()> {
        let (rows, cols) = self.basis.dim();
        if rows != self.mean.len() {
            return Err(Error::InvalidModel(format!(
                "Basis has {} rows but mean has length {}",
                rows,
                self.mean.len()
            )));
        }
        if cols != self.variance.len() {
            return Err(Error::InvalidModel(format!(
                "Basis has {} columns but {} variances were given",
                cols,
                self.variance.len()
            )));
        }
        if let Some(bad) = self.variance.iter().find(|v| !v.is_finite() || **v < 0.0) {
            return Err(Error::InvalidModel(format!("Invalid variance {}", bad)));
        }
        Ok(())
    }

    /// Number of basis components `K`.
    pub fn num_components(&self) -> usize {
        self.basis.ncols()
    }

    /// Length `D` of every instance.
    pub fn data_dimension(&self) -> usize {
        self.mean.len()
    }

    pub fn mean(&self) -> &Array1<f32> {
        &self.mean
    }

    pub fn basis(&self) -> &Array2<f32> {
        &self.basis
    }

    pub fn variance(&self) -> &Array1<f32> {
        &self.variance
    }

    /// Compute `mean + basis * coefficients`.
    ///
    /// Fewer than `K` coefficients are zero-padded. More than `K` is an error.
    pub fn evaluate(&self, coefficients: &[f32]) -> Result<Array1<f32>> {
        let k = coefficients.len();
        if k > self.num_components() {
            return Err(Error::DimensionMismatch {
                what: "PCA",
                components: self.num_components(),
                coefficients: k,
            });
        }
        if k == 0 {
            return Ok(self.mean.clone());
        }

        // Padded entries are zero, so only the leading k columns contribute.
        let leading = self.basis.slice(s![.., ..k]);
        Ok(&self.mean + &leading.dot(&ArrayView1::from(coefficients)))
    }

    pub fn evaluate_mean(&self) -> Array1<f32> {
        self.mean.clone()
    }

    /// Draw `K` coefficients from `Normal(0, spread)`.
    ///
    /// The per-component variance is not used: the basis already carries the
    /// model's scale and `spread` is a global multiplier chosen by the user.
    pub fn sample_random<R: Rng + ?Sized>(&self, rng: &mut R, spread: f32) -> Result<Vec<f32>> {
        normal_draws(rng, self.num_components(), spread)
    }
}
