//! Boundary conditions and Dirichlet elimination.
//!
//! Prescribed displacements are imposed by turning each constrained row and
//! column of the stiffness matrix into an identity row/column and lifting the
//! coupling onto the right-hand side:
//!
//! ```text
//! rhs = F - K Ubc        (K: unconstrained stiffness)
//! rhs[d] = Ubc[d]        for every constrained d
//! ```
//!
//! Lifting needs the unconstrained coupling coefficients, so [`eliminate`] reads
//! the unconstrained matrix and returns a modified copy.

use crate::dof::global_dof;
use crate::error::{Error, Result};
use crate::mesh::Mesh;
use crate::sparse::CsrMatrix;
use nalgebra::DVector;
use std::collections::BTreeMap;
use tracing::debug;

/// Boundary condition types.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryCondition {
    /// Fixed displacement (Dirichlet).
    Displacement {
        node: usize,
        component: usize,
        value: f64,
    },
    /// Applied nodal force (Neumann).
    Force {
        node: usize,
        component: usize,
        value: f64,
    },
}

/// Prescribed DOF values, keyed by global DOF.
///
/// Repeating a constraint with the same value is a no-op; a different value
/// for an already constrained DOF is rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct DirichletConstraints {
    dofs_per_node: usize,
    values: BTreeMap<usize, f64>,
}

impl DirichletConstraints {
    pub fn new(dofs_per_node: usize) -> Self {
        Self {
            dofs_per_node,
            values: BTreeMap::new(),
        }
    }

    pub fn dofs_per_node(&self) -> usize {
        self.dofs_per_node
    }

    /// Prescribe `value` for `component` of `node`.
    pub fn add(&mut self, node: usize, component: usize, value: f64) -> Result<()> {
        if component >= self.dofs_per_node {
            return Err(Error::dimension(
                "constraint component",
                self.dofs_per_node,
                component + 1,
            ));
        }
        self.add_dof(global_dof(node, component, self.dofs_per_node), value)
    }

    /// Prescribe `value` for a global DOF.
    pub fn add_dof(&mut self, dof: usize, value: f64) -> Result<()> {
        match self.values.get(&dof) {
            Some(&existing) if existing != value => Err(Error::ConflictingConstraint {
                dof,
                existing,
                requested: value,
            }),
            Some(_) => Ok(()),
            None => {
                self.values.insert(dof, value);
                Ok(())
            }
        }
    }

    /// Prescribe `value` on every component of `node`.
    pub fn fix_node(&mut self, node: usize, value: f64) -> Result<()> {
        (0..self.dofs_per_node).try_for_each(|c| self.add(node, c, value))
    }

    /// Fix every node of every element whose region (first tag) is in `tags`.
    pub fn fix_tagged(&mut self, mesh: &Mesh, tags: &[u32], value: f64) -> Result<()> {
        for element in mesh.elements() {
            if element.region().is_some_and(|r| tags.contains(&r)) {
                for &node in &element.nodes {
                    self.fix_node(node, value)?;
                }
            }
        }
        Ok(())
    }

    /// Number of constrained DOFs.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Prescribed value of a DOF, if constrained.
    pub fn get(&self, dof: usize) -> Option<f64> {
        self.values.get(&dof).copied()
    }

    /// (dof, value) pairs in ascending DOF order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.values.iter().map(|(&dof, &value)| (dof, value))
    }
}

/// Split boundary conditions into constraints, adding forces to `load`.
pub fn apply_conditions(
    conditions: &[BoundaryCondition],
    dofs_per_node: usize,
    load: &mut [f64],
) -> Result<DirichletConstraints> {
    let mut constraints = DirichletConstraints::new(dofs_per_node);
    for bc in conditions {
        match *bc {
            BoundaryCondition::Displacement {
                node,
                component,
                value,
            } => constraints.add(node, component, value)?,
            BoundaryCondition::Force {
                node,
                component,
                value,
            } => {
                if component >= dofs_per_node {
                    return Err(Error::dimension("force component", dofs_per_node, component + 1));
                }
                let dof = global_dof(node, component, dofs_per_node);
                let n_dofs = load.len();
                let slot = load
                    .get_mut(dof)
                    .ok_or_else(|| Error::dimension("force dof", n_dofs, dof + 1))?;
                *slot += value;
            }
        }
    }
    Ok(constraints)
}

/// System with constraints eliminated, ready for the iterative solver.
#[derive(Debug, Clone)]
pub struct ConstrainedSystem {
    /// Stiffness with identity rows/columns at constrained DOFs.
    pub matrix: CsrMatrix,
    /// Lifted right-hand side.
    pub rhs: Vec<f64>,
    /// Boundary-value vector: prescribed values at constrained DOFs, zero elsewhere.
    pub initial_guess: Vec<f64>,
    /// Constrained DOFs in ascending order.
    pub constrained_dofs: Vec<usize>,
}

/// Eliminate Dirichlet constraints from `stiffness` and `load`.
///
/// `stiffness` is left untouched and serves as the unconstrained operator for
/// lifting.
///
/// # Errors
///
/// - [`Error::DimensionMismatch`] if the matrix is not square or `load` has the wrong length
/// - [`Error::IndexOutOfBounds`] for a constraint past the last DOF
/// - [`Error::MissingEntry`] if a constrained diagonal was never assembled
pub fn eliminate(
    stiffness: &CsrMatrix,
    load: &[f64],
    constraints: &DirichletConstraints,
) -> Result<ConstrainedSystem> {
    let n = stiffness.nrows();
    if stiffness.ncols() != n {
        return Err(Error::dimension("stiffness columns", n, stiffness.ncols()));
    }
    if load.len() != n {
        return Err(Error::dimension("load vector", n, load.len()));
    }

    let mut boundary_values = vec![0.0; n];
    for (dof, value) in constraints.iter() {
        if dof >= n {
            return Err(Error::IndexOutOfBounds {
                row: dof,
                col: dof,
                nrows: n,
                ncols: n,
            });
        }
        boundary_values[dof] = value;
    }

    let lifted = stiffness.mul_vec(&DVector::from_column_slice(&boundary_values))?;
    let mut rhs: Vec<f64> = (DVector::from_column_slice(load) - lifted).data.into();

    let mut matrix = stiffness.clone();
    for (dof, value) in constraints.iter() {
        matrix.zero_row(dof)?;
        matrix.zero_col(dof)?; // scans every row
        matrix.assign(dof, dof, 1.0)?;
        rhs[dof] = value;
    }

    debug!(constrained = constraints.len(), n_dofs = n, "dirichlet constraints eliminated");

    Ok(ConstrainedSystem {
        matrix,
        rhs,
        initial_guess: boundary_values,
        constrained_dofs: constraints.iter().map(|(dof, _)| dof).collect(),
    })
}
