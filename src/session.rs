//! Viewer state behind the coefficient sliders.
//!
//! A [`Session`] owns the current model reference and the current coefficients
//! and pushes a freshly reconstructed mesh to its [`Viewport`] after every
//! change. Loading or merging builds a complete new model first and then
//! replaces the reference in one assignment, so a failed load leaves the
//! previous state intact and a reader holding the old `Arc` keeps a consistent
//! model.

use std::path::Path;
use std::sync::Arc;

use log::info;
use rand::Rng;

use crate::error::{Error, Result};
use crate::mesh::Mesh;
use crate::model::MorphableModel;
use crate::reconstruct::{reconstruct, Coefficients};
use crate::sampler::{draw, Spread};
use crate::store::{load_morphable_model, ModelStore};
use crate::types::{Point3, Rgb, Triangle};

/// Receiver of reconstructed mesh buffers.
///
/// `set_vertices` and `set_colors` must be given as many entries as the
/// vertex range covered by the last `set_mesh` call.
pub trait Viewport {
    fn set_mesh(&mut self, vertices: &[Point3], triangles: &[Triangle]);
    fn set_vertices(&mut self, vertices: &[Point3]);
    fn set_colors(&mut self, colors: &[Rgb]);
}

/// Which coefficient vector a slider belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Shape,
    Expression,
    Color,
}

impl Channel {
    fn name(self) -> &'static str {
        match self {
            Channel::Shape => "shape",
            Channel::Expression => "expression",
            Channel::Color => "color",
        }
    }
}

pub struct Session<V: Viewport> {
    viewport: V,
    model: Option<Arc<MorphableModel>>,
    coefficients: Coefficients,
}

impl<V: Viewport> Session<V> {
    pub fn new(viewport: V) -> Self {
        Self {
            viewport,
            model: None,
            coefficients: Coefficients::default(),
        }
    }

    pub fn viewport(&self) -> &V {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut V {
        &mut self.viewport
    }

    /// The current model. Cloning the `Arc` keeps it alive across reloads.
    pub fn model(&self) -> Option<&Arc<MorphableModel>> {
        self.model.as_ref()
    }

    pub fn coefficients(&self) -> &Coefficients {
        &self.coefficients
    }

    /// Load a model (format chosen by suffix) and optionally merge a
    /// blendshape set into it, then show its mean.
    pub fn load<S: ModelStore + ?Sized>(
        &mut self,
        store: &S,
        model_path: &Path,
        blendshapes_path: Option<&Path>,
    ) -> Result<()> {
        let mut model = load_morphable_model(store, model_path)?;
        if let Some(path) = blendshapes_path {
            model = model.with_blendshapes(store.load_blendshapes(path)?)?;
        }
        info!("Loaded model from {:?}", model_path);
        self.replace_model(model);
        Ok(())
    }

    /// Merge a blendshape set into the current model.
    pub fn load_blendshapes<S: ModelStore + ?Sized>(&mut self, store: &S, path: &Path) -> Result<()> {
        let current = self.model.as_ref().ok_or(Error::NoModelLoaded)?;
        let merged = current.with_blendshapes(store.load_blendshapes(path)?)?;
        info!("Merged blendshapes from {:?}", path);
        self.replace_model(merged);
        Ok(())
    }

    /// Install `model`, reset every coefficient to zero and show the mean.
    pub fn replace_model(&mut self, model: MorphableModel) {
        let model = Arc::new(model);
        self.coefficients = Coefficients::zeros_for(&model);

        let mesh = model.mean_mesh();
        self.model = Some(model);
        self.viewport.set_mesh(&mesh.vertices, mesh.triangles());
        self.viewport.set_colors(&mesh.colors);
    }

    /// Change one coefficient and update the affected buffer.
    pub fn set_coefficient(&mut self, channel: Channel, index: usize, value: f32) -> Result<()> {
        let model = Arc::clone(self.model.as_ref().ok_or(Error::NoModelLoaded)?);
        let mut updated = self.coefficients.clone();
        let values = match channel {
            Channel::Shape => &mut updated.shape,
            Channel::Expression => &mut updated.expression,
            Channel::Color => &mut updated.color,
        };
        let Some(slot) = values.get_mut(index) else {
            return Err(Error::DimensionMismatch {
                what: channel.name(),
                components: values.len(),
                coefficients: index + 1,
            });
        };
        *slot = value;

        let mesh = reconstruct(&model, &updated)?;
        self.coefficients = updated;
        match channel {
            Channel::Shape | Channel::Expression => self.viewport.set_vertices(&mesh.vertices),
            Channel::Color => self.viewport.set_colors(&mesh.colors),
        }
        Ok(())
    }

    /// Zero every coefficient and show the mean.
    pub fn reset_to_mean(&mut self) -> Result<()> {
        let model = self.model.as_ref().ok_or(Error::NoModelLoaded)?;
        self.coefficients.reset();
        let mesh = model.mean_mesh();
        self.viewport.set_vertices(&mesh.vertices);
        self.viewport.set_colors(&mesh.colors);
        Ok(())
    }

    /// Draw new coefficients for every channel and show the result. The drawn
    /// values become the current coefficients.
    pub fn randomize<R: Rng + ?Sized>(&mut self, rng: &mut R, spread: Spread) -> Result<()> {
        let model = Arc::clone(self.model.as_ref().ok_or(Error::NoModelLoaded)?);
        let coefficients = draw(&model, rng, spread)?;
        let mesh = reconstruct(&model, &coefficients)?;
        self.coefficients = coefficients;
        self.viewport.set_vertices(&mesh.vertices);
        self.viewport.set_colors(&mesh.colors);
        Ok(())
    }

    /// Reconstruct the mesh for the current coefficients.
    pub fn current_mesh(&self) -> Result<Mesh> {
        let model = self.model.as_ref().ok_or(Error::NoModelLoaded)?;
        reconstruct(model, &self.coefficients)
    }
}
