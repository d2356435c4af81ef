//! Linear system solvers.
//!
//! Solves the constrained system Ku = f with a preconditioned conjugate
//! gradient iteration. The initial guess carries the prescribed boundary
//! values, so constrained DOFs start (and stay) at their final value.
//!
//! # Algorithm
//!
//! ```text
//! r = b - A x,  z = M⁻¹ r,  p = z
//! repeat:
//!     α = (r·z) / (p·Ap)
//!     x += α p,  r -= α Ap
//!     stop if ||r|| <= tol ||b||
//!     z = M⁻¹ r,  β = (r·z)_new / (r·z)_old
//!     p = z + β p
//! ```

use crate::error::{Error, Result};
use crate::preconditioner::{Preconditioner, PreconditionerKind};
use crate::sparse::CsrMatrix;
use nalgebra::DVector;
use std::time::Instant;
use tracing::{info, trace, warn};

/// Linear solver interface.
pub trait Solver {
    /// Solve the linear system Ax = b starting from `initial_guess`.
    ///
    /// # Arguments
    ///
    /// * `matrix` - System matrix (K, constraints eliminated)
    /// * `rhs` - Right-hand side vector (lifted f)
    /// * `initial_guess` - Starting iterate (boundary-value vector)
    ///
    /// # Returns
    ///
    /// Solution vector and statistics. Non-convergence is reported in the
    /// statistics, not as an error.
    fn solve(&self, matrix: &CsrMatrix, rhs: &[f64], initial_guess: &[f64]) -> Result<Solution>;

    /// Solver name for diagnostics.
    fn name(&self) -> &str;
}

/// Solver configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    /// Relative residual tolerance: stop when ||r|| <= tolerance * ||b||.
    pub tolerance: f64,
    /// Maximum iterations.
    pub max_iterations: usize,
    /// Preconditioner built from the system matrix.
    pub preconditioner: PreconditionerKind,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-10,
            max_iterations: 10000,
            preconditioner: PreconditionerKind::Jacobi,
        }
    }
}

/// Solution statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveStats {
    /// Solver name used.
    pub solver: String,
    /// Number of iterations performed.
    pub iterations: usize,
    /// Final residual norm ||b - Ax||₂.
    pub residual: f64,
    /// Whether the tolerance was met.
    pub converged: bool,
    /// Wall-clock time in seconds.
    pub time_seconds: f64,
}

/// Solver output.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    /// DOF vector, node-major.
    pub x: Vec<f64>,
    pub stats: SolveStats,
}

impl Solution {
    /// Turn a non-converged outcome into [`Error::NotConverged`].
    pub fn ensure_converged(self) -> Result<Self> {
        if self.stats.converged {
            Ok(self)
        } else {
            Err(Error::NotConverged {
                iterations: self.stats.iterations,
                residual: self.stats.residual,
            })
        }
    }

    /// Components of `node`.
    ///
    /// # Panics
    ///
    /// Panics if the node is outside the solution.
    pub fn nodal(&self, node: usize, dofs_per_node: usize) -> &[f64] {
        &self.x[node * dofs_per_node..(node + 1) * dofs_per_node]
    }
}

/// Preconditioned conjugate gradient for symmetric positive (semi)definite systems.
#[derive(Debug, Clone, Default)]
pub struct ConjugateGradient {
    pub config: SolverConfig,
}

impl ConjugateGradient {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    /// Run PCG with an explicit preconditioner.
    pub fn solve_preconditioned(
        &self,
        matrix: &CsrMatrix,
        rhs: &[f64],
        initial_guess: &[f64],
        preconditioner: &dyn Preconditioner,
    ) -> Result<Solution> {
        let start = Instant::now();
        let n = matrix.nrows();
        if matrix.ncols() != n {
            return Err(Error::dimension("matrix columns", n, matrix.ncols()));
        }
        if rhs.len() != n {
            return Err(Error::dimension("right-hand side", n, rhs.len()));
        }
        if initial_guess.len() != n {
            return Err(Error::dimension("initial guess", n, initial_guess.len()));
        }
        if preconditioner.size() != n {
            return Err(Error::dimension("preconditioner", n, preconditioner.size()));
        }

        let b = DVector::from_column_slice(rhs);
        let rhs_norm = b.norm();
        let threshold = if rhs_norm > 0.0 {
            self.config.tolerance * rhs_norm
        } else {
            self.config.tolerance
        };

        let mut x = DVector::from_column_slice(initial_guess);
        let mut r = &b - matrix.mul_vec(&x)?;
        let mut residual = r.norm();
        let mut iterations = 0;
        let mut converged = residual <= threshold;

        if !converged {
            let mut z = r.clone();
            preconditioner.apply(&mut z);
            let mut p = z.clone();
            let mut rz = r.dot(&z);
            let mut ap = DVector::zeros(n);

            while iterations < self.config.max_iterations {
                matrix.mul_vec_into(&p, &mut ap)?;
                let curvature = p.dot(&ap);
                if curvature <= 0.0 || !curvature.is_finite() {
                    warn!(iterations, curvature, "conjugate gradient breakdown");
                    break;
                }

                let alpha = rz / curvature;
                x.axpy(alpha, &p, 1.0);
                r.axpy(-alpha, &ap, 1.0);
                iterations += 1;
                residual = r.norm();
                trace!(iterations, residual, "cg iteration");

                if residual <= threshold {
                    converged = true;
                    break;
                }

                z.copy_from(&r);
                preconditioner.apply(&mut z);
                let rz_next = r.dot(&z);
                let beta = rz_next / rz;
                rz = rz_next;
                p.axpy(1.0, &z, beta);
            }
        }

        let stats = SolveStats {
            solver: format!("{} ({})", self.name(), preconditioner.name()),
            iterations,
            residual,
            converged,
            time_seconds: start.elapsed().as_secs_f64(),
        };

        if converged {
            info!(iterations, residual, "cg converged");
        } else {
            warn!(
                iterations,
                residual,
                max_iterations = self.config.max_iterations,
                "cg did not converge"
            );
        }

        Ok(Solution {
            x: x.data.into(),
            stats,
        })
    }
}

impl Solver for ConjugateGradient {
    fn solve(&self, matrix: &CsrMatrix, rhs: &[f64], initial_guess: &[f64]) -> Result<Solution> {
        let preconditioner = self.config.preconditioner.build(matrix)?;
        self.solve_preconditioned(matrix, rhs, initial_guess, preconditioner.as_ref())
    }

    fn name(&self) -> &str {
        "Preconditioned CG"
    }
}
