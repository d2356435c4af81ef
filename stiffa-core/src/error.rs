//! Error types for stiffa operations.

use thiserror::Error;

/// Result type alias using stiffa Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during assembly, elimination and solution.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Operand sizes disagree (vector/matrix/local block).
    #[error("dimension mismatch in {context}: expected {expected}, got {actual}")]
    DimensionMismatch {
        context: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A row or column index lies outside the matrix.
    #[error("index ({row}, {col}) out of bounds for {nrows}x{ncols} matrix")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        nrows: usize,
        ncols: usize,
    },

    /// A position that is not part of the sparsity pattern was referenced.
    #[error("no stored entry at ({row}, {col}); the diagonal must be allocated during assembly")]
    MissingEntry { row: usize, col: usize },

    /// Two constraints prescribe different values for the same DOF.
    #[error("conflicting constraints on dof {dof}: {existing} vs {requested}")]
    ConflictingConstraint {
        dof: usize,
        existing: f64,
        requested: f64,
    },

    /// The iterative solver hit its iteration cap.
    #[error("solver did not converge after {iterations} iterations (residual {residual:e})")]
    NotConverged { iterations: usize, residual: f64 },

    /// Element-related errors (degenerate geometry, unsupported combination).
    #[error("element error: {0}")]
    Element(String),

    /// Mesh-related errors.
    #[error("mesh error: {0}")]
    Mesh(String),

    /// Assembly errors.
    #[error("assembly error: {0}")]
    Assembly(String),

    /// Solver errors.
    #[error("solver error: {0}")]
    Solver(String),

    /// Invalid material or section properties.
    #[error("invalid material: {0}")]
    InvalidMaterial(String),
}

impl Error {
    pub(crate) fn dimension(context: &'static str, expected: usize, actual: usize) -> Self {
        Error::DimensionMismatch {
            context,
            expected,
            actual,
        }
    }
}
