//! # morph-face
//!
//! Pure Rust evaluation and sampling of 3D morphable face models.
//!
//! This crate provides:
//! - **PCA models**: shape and color as mean + linear basis ([`PcaModel`])
//! - **Expressions**: either a blendshape set or a second PCA model
//!   ([`ExpressionModel`]), chosen at runtime
//! - **Reconstruction**: coefficient vectors to vertex and color buffers
//! - **Sampling**: random coefficients with the right law per channel
//! - **Loading**: native archives and the legacy `.scm` layout
//!
//! ## Model Overview
//!
//! A morphable model instance is computed as
//!
//! ```text
//! shape  = shape_mean + shape_basis * alpha + expression_delta(beta)
//! color  = color_mean + color_basis * gamma
//! ```
//!
//! where the expression delta is `sum_i beta_i * blendshape_i` for blendshapes
//! or `pca_basis * beta` for a PCA expression model. Flat vectors hold
//! `[x0, y0, z0, x1, y1, z1, ...]`.
//!
//! ## Quick Start
//!
//! ```rust
//! use morph_face::{
//!     reconstruct, sampler, Blendshape, Coefficients, MorphableModel, PcaModel, Spread,
//!     Topology,
//! };
//! use ndarray::{array, Array2};
//! use rand::SeedableRng;
//!
//! // One triangle, one shape component that lifts the first vertex.
//! let shape = PcaModel::new(
//!     array![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
//!     Array2::from_shape_fn((9, 1), |(r, _)| if r == 2 { 1.0 } else { 0.0 }),
//!     array![1.0],
//! )
//! .unwrap();
//! let model = MorphableModel::builder()
//!     .shape(shape)
//!     .topology(Topology::new(vec![[0, 1, 2]]))
//!     .build()
//!     .unwrap()
//!     .with_blendshapes(vec![Blendshape::new("smile", vec![0.1; 9])])
//!     .unwrap();
//!
//! let coefficients = Coefficients {
//!     shape: vec![0.5],
//!     expression: vec![1.0],
//!     ..Default::default()
//! };
//! let mesh = reconstruct(&model, &coefficients).unwrap();
//! assert_eq!(mesh.num_vertices(), 3);
//!
//! let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(0);
//! let random = sampler::draw(&model, &mut rng, Spread::default()).unwrap();
//! assert_eq!(random.shape.len(), 1);
//! ```
//!
//! ## Viewers
//!
//! Implement [`Viewport`] for your renderer and drive it with a [`Session`]:
//!
//! ```rust
//! use morph_face::{Point3, Rgb, Triangle, Viewport};
//!
//! struct MyViewport { /* ... */ }
//!
//! impl Viewport for MyViewport {
//!     fn set_mesh(&mut self, vertices: &[Point3], triangles: &[Triangle]) {}
//!     fn set_vertices(&mut self, vertices: &[Point3]) {}
//!     fn set_colors(&mut self, colors: &[Rgb]) {}
//! }
//! ```

mod basis;
mod error;
mod expression;
mod mesh;
mod model;
pub mod obj;
mod reconstruct;
pub mod sampler;
pub mod scm;
mod session;
pub mod store;
mod types;

pub use basis::PcaModel;
pub use error::{Error, ErrorKind, Result};
pub use expression::{validate_blendshapes, Blendshape, ExpressionModel};
pub use mesh::Mesh;
pub use model::{MorphableModel, MorphableModelBuilder};
pub use reconstruct::{reconstruct, reconstruct_mean, validate as validate_coefficients, Coefficients};
pub use sampler::Spread;
pub use session::{Channel, Session, Viewport};
pub use store::{load_morphable_model, FileStore, ModelFormat, ModelStore, MODEL_FORMAT_VERSION};
pub use types::{from_flat, to_flat, Point3, Rgb, Topology, Triangle};
