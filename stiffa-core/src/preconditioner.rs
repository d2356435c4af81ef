//! Preconditioners for the conjugate gradient solver.
//!
//! A preconditioner approximates `A⁻¹`: given a residual it produces the
//! preconditioned residual in place. Variants are interchangeable behind the
//! [`Preconditioner`] trait and chosen by [`PreconditionerKind`].

use crate::error::{Error, Result};
use crate::sparse::CsrMatrix;
use nalgebra::DVector;
use tracing::warn;

/// Approximate inverse applied once per solver iteration.
pub trait Preconditioner {
    /// Overwrite `residual` with `M⁻¹ residual`.
    fn apply(&self, residual: &mut DVector<f64>);

    /// Dimension of the operator this preconditioner was built for.
    fn size(&self) -> usize;

    /// Name for diagnostics.
    fn name(&self) -> &str;
}

/// Preconditioner selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PreconditionerKind {
    /// No preconditioning (plain CG).
    None,
    /// Diagonal scaling.
    #[default]
    Jacobi,
}

impl PreconditionerKind {
    /// Build the selected preconditioner for `matrix`.
    pub fn build(self, matrix: &CsrMatrix) -> Result<Box<dyn Preconditioner>> {
        Ok(match self {
            PreconditionerKind::None => Box::new(IdentityPreconditioner::new(matrix.nrows())),
            PreconditionerKind::Jacobi => Box::new(JacobiPreconditioner::new(matrix)?),
        })
    }
}

/// `M = I`.
#[derive(Debug, Clone, Copy)]
pub struct IdentityPreconditioner {
    size: usize,
}

impl IdentityPreconditioner {
    pub fn new(size: usize) -> Self {
        Self { size }
    }
}

impl Preconditioner for IdentityPreconditioner {
    fn apply(&self, _residual: &mut DVector<f64>) {}

    fn size(&self) -> usize {
        self.size
    }

    fn name(&self) -> &str {
        "identity"
    }
}

/// Jacobi (diagonal) preconditioner, `M = diag(A)`.
///
/// Rows whose diagonal is zero or not stored use a multiplier of 1; those rows
/// are reported through [`fallback_rows`](Self::fallback_rows) and a warning.
#[derive(Debug, Clone)]
pub struct JacobiPreconditioner {
    inverse_diagonal: DVector<f64>,
    fallback_rows: Vec<usize>,
}

impl JacobiPreconditioner {
    pub fn new(matrix: &CsrMatrix) -> Result<Self> {
        if matrix.nrows() != matrix.ncols() {
            return Err(Error::dimension(
                "preconditioner matrix columns",
                matrix.nrows(),
                matrix.ncols(),
            ));
        }

        let mut fallback_rows = Vec::new();
        let diagonal = matrix.diagonal();
        let inverse_diagonal = DVector::from_fn(diagonal.len(), |row, _| match diagonal[row] {
            Some(a_ii) if a_ii != 0.0 => 1.0 / a_ii,
            _ => {
                fallback_rows.push(row);
                1.0
            }
        });

        if !fallback_rows.is_empty() {
            warn!(
                rows = ?fallback_rows,
                "zero diagonal found; using unit scaling on these rows, convergence may suffer"
            );
        }

        Ok(Self {
            inverse_diagonal,
            fallback_rows,
        })
    }

    /// Rows that fell back to unit scaling.
    pub fn fallback_rows(&self) -> &[usize] {
        &self.fallback_rows
    }

    pub fn inverse_diagonal(&self) -> &DVector<f64> {
        &self.inverse_diagonal
    }
}

impl Preconditioner for JacobiPreconditioner {
    fn apply(&self, residual: &mut DVector<f64>) {
        residual.component_mul_assign(&self.inverse_diagonal);
    }

    fn size(&self) -> usize {
        self.inverse_diagonal.len()
    }

    fn name(&self) -> &str {
        "jacobi"
    }
}
