use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Dimension mismatch: {coefficients} {what} coefficients given, model has {components} components")]
    DimensionMismatch {
        what: &'static str,
        components: usize,
        coefficients: usize,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Model deserialization error: {0}")]
    Deserialization(#[from] bincode::Error),

    #[error("Invalid model: {0}")]
    InvalidModel(String),

    #[error("Unsupported archive version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("Wrong archive type: expected {expected}, found tag {found:?}")]
    WrongArchive { expected: &'static str, found: [u8; 4] },

    #[error("Unsupported model file {0:?}: use a .bin or .scm file")]
    UnsupportedExtension(PathBuf),

    #[error("Expression coefficients given, but the model has no expression component")]
    MissingExpression,

    #[error("No model loaded")]
    NoModelLoaded,

    #[error("Invalid sampling spread {0}: must be finite and non-negative")]
    InvalidSpread(f32),
}

/// Coarse classification of [`Error`], for callers that present failures
/// differently depending on who is at fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A coefficient vector was longer than the model it was applied to.
    DimensionMismatch,
    /// The model store could not produce a model or blendshape set.
    Load,
    /// The caller asked for something the API does not support.
    Usage,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::DimensionMismatch { .. } => ErrorKind::DimensionMismatch,
            Error::Io(_)
            | Error::Deserialization(_)
            | Error::InvalidModel(_)
            | Error::UnsupportedVersion { .. }
            | Error::WrongArchive { .. } => ErrorKind::Load,
            Error::UnsupportedExtension(_)
            | Error::MissingExpression
            | Error::NoModelLoaded
            | Error::InvalidSpread(_) => ErrorKind::Usage,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
