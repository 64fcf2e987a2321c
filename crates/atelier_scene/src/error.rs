//! Document and reconstruction errors

use std::path::PathBuf;

use atelier_geometry::GeometryError;
use thiserror::Error;

use crate::loader::LoadError;

/// Failure to read or write a whole scene document
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Document file could not be read or written
    #[error("Document I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Document is not valid JSON or not an object
    #[error("Document JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure to reconstruct a single object.
///
/// Always scoped to one record; never aborts a whole document.
#[derive(Debug, Error)]
pub enum ReconstructError {
    /// Descriptor `type` tag is not one this build understands
    #[error("Unrecognised geometry descriptor")]
    UnknownDescriptor,

    /// Raw geometry payload is malformed
    #[error("Invalid raw geometry: {0}")]
    InvalidRawGeometry(#[from] GeometryError),

    /// Stored primitive parameters are too large to tessellate
    #[error("Primitive too complex: {0}")]
    TooComplex(#[source] GeometryError),

    /// Custom geometry stored without a usable vertex payload
    #[error("Custom geometry has no raw vertex payload")]
    MissingRawGeometry,

    /// External asset failed to load
    #[error("Failed to load model '{path}': {source}")]
    AssetLoad {
        path: String,
        #[source]
        source: LoadError,
    },

    /// Reconstruction was cancelled before this object finished
    #[error("Reconstruction cancelled")]
    Cancelled,
}

pub type DocumentResult<T> = std::result::Result<T, DocumentError>;
