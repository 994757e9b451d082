//! Error types for the layer pipeline and mesh expansion.
//!
//! None of these ever stop a recomputation: the pipeline turns them into
//! absent parse data or layer warnings. They only surface as values at the
//! wasm boundary.

use thiserror::Error;

/// Errors that can occur while expanding parsed commands into triangles.
#[derive(Debug, Error)]
pub enum GeometryError {
    /// An aperture definition is missing or invalid.
    #[error("invalid aperture: {0}")]
    InvalidAperture(String),
}

/// Errors raised by the session workspace and its inputs.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    /// The upload collaborator could not deliver the file content.
    #[error("content of `{0}` is unavailable")]
    ContentUnavailable(String),

    /// The file content is not valid UTF-8 text.
    #[error("content of `{name}` is not valid text: {source}")]
    InvalidEncoding {
        /// File name.
        name: String,
        /// Underlying decode error.
        #[source]
        source: std::str::Utf8Error,
    },

    /// No file with this name is in the working set.
    #[error("no layer named `{0}`")]
    UnknownLayer(String),

    /// Declared board specs could not be decoded.
    #[error("invalid board specs: {0}")]
    InvalidSpecs(String),
}
