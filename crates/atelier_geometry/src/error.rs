//! Error types for geometry construction

use thiserror::Error;

/// Geometry errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    /// Position buffer has no elements
    #[error("Position buffer is empty")]
    EmptyPositions,

    /// Position buffer length is not a multiple of three
    #[error("Position buffer length {0} is not a multiple of 3")]
    InvalidStride(usize),

    /// Index references a vertex past the end of the position buffer
    #[error("Index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },

    /// Position buffer contains NaN or infinity
    #[error("Position component {0} is not finite")]
    NonFinitePosition(usize),

    /// Tessellation would emit more vertices than allowed
    #[error("Tessellation needs {count} vertices, limit is {max}")]
    TooManyVertices { count: u64, max: u64 },
}

/// Result type for geometry operations
pub type Result<T> = std::result::Result<T, GeometryError>;
