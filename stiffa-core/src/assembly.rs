//! Finite element assembly.
//!
//! Assembles the global stiffness triplets and load vector from element
//! contributions. Elements are visited sequentially in mesh order; types the
//! formulation does not support (boundary point markers, unsupported cells in
//! a mixed mesh) are skipped by type tag.

use crate::element::{Formulation, LocalSystem};
use crate::error::{Error, Result};
use crate::mesh::Mesh;
use crate::sparse::TripletMatrix;
use nalgebra::{DMatrix, DVector};
use tracing::debug;

/// Assembled system ready for conversion and constraint elimination.
#[derive(Debug, Clone)]
pub struct AssembledSystem {
    /// Global stiffness triplets (duplicates not yet summed).
    pub stiffness: TripletMatrix,
    /// Global load vector.
    pub load: Vec<f64>,
    /// Number of DOFs in the system.
    pub n_dofs: usize,
    /// Components per node used for DOF numbering.
    pub dofs_per_node: usize,
    /// Indices of elements that contributed nothing.
    pub skipped_elements: Vec<usize>,
}

/// Assembly options.
#[derive(Debug, Clone, PartialEq)]
pub struct AssemblyOptions {
    /// Expected stored entries per DOF, used to pre-size the triplet buffer.
    pub nnz_per_dof_estimate: usize,
}

impl Default for AssemblyOptions {
    fn default() -> Self {
        Self {
            nnz_per_dof_estimate: 18,
        }
    }
}

/// Scatter one element's local stiffness and load into the global system.
///
/// Local entry (A, B) goes to (dofs[A], dofs[B]); local load A is added to
/// `load[dofs[A]]`.
pub fn scatter(
    triplet: &mut TripletMatrix,
    load: &mut [f64],
    dofs: &[usize],
    stiffness: &DMatrix<f64>,
    element_load: &DVector<f64>,
) -> Result<()> {
    if element_load.len() != dofs.len() {
        return Err(Error::dimension("local load vector", dofs.len(), element_load.len()));
    }
    if let Some(&dof) = dofs.iter().find(|&&d| d >= load.len()) {
        return Err(Error::Assembly(format!(
            "DOF {} out of range for {} global DOFs",
            dof,
            load.len()
        )));
    }

    triplet.add_submatrix(dofs, stiffness)?;
    for (&dof, &value) in dofs.iter().zip(element_load.iter()) {
        load[dof] += value;
    }
    Ok(())
}

/// Assemble global stiffness triplets and load vector.
///
/// # Example
///
/// ```ignore
/// let formulation = LinearElasticity::new(Dimension::Two, properties);
/// let system = assemble(&mesh, &formulation, &AssemblyOptions::default())?;
/// let stiffness = system.stiffness.to_csr()?;
/// ```
pub fn assemble<F: Formulation + ?Sized>(
    mesh: &Mesh,
    formulation: &F,
    options: &AssemblyOptions,
) -> Result<AssembledSystem> {
    let dofs_per_node = formulation.dofs_per_node();
    let n_dofs = mesh.n_nodes() * dofs_per_node;

    let mut stiffness =
        TripletMatrix::with_capacity(n_dofs, n_dofs, n_dofs * options.nnz_per_dof_estimate);
    let mut load = vec![0.0; n_dofs];
    let mut skipped_elements = Vec::new();

    for (elem_idx, connectivity) in mesh.elements().iter().enumerate() {
        if !formulation.supports(connectivity.element_type) {
            debug!(
                element = elem_idx,
                element_type = ?connectivity.element_type,
                "skipping element without stiffness"
            );
            skipped_elements.push(elem_idx);
            continue;
        }

        let LocalSystem {
            dofs,
            stiffness: ke,
            load: fe,
        } = formulation.local_system(mesh, elem_idx)?;
        scatter(&mut stiffness, &mut load, &dofs, &ke, &fe)?;
    }

    debug!(
        n_dofs,
        triplets = stiffness.nnz(),
        skipped = skipped_elements.len(),
        "assembly done"
    );

    Ok(AssembledSystem {
        stiffness,
        load,
        n_dofs,
        dofs_per_node,
        skipped_elements,
    })
}
