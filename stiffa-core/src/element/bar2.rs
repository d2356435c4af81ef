//! 2-node axial bar (truss) element.
//!
//! Carries axial force only, so each node has stiffness solely along the
//! bar axis:
//!
//! ```text
//! K = EA/L * [ c cᵀ  -c cᵀ ]
//!            [-c cᵀ   c cᵀ ]
//! ```
//!
//! where `c` is the unit direction from node 1 to node 2. Self-weight
//! `ρ g A L` is lumped half to each node.
//!
//! A bar has no transverse stiffness: a node connected only to collinear bars
//! leaves zero diagonal entries on its transverse DOFs.

use crate::element::{check_coords, Element, ElementProperties};
use crate::error::{Error, Result};
use crate::types::{Dimension, Point3};
use nalgebra::{DMatrix, DVector};

/// 2-node truss element in 2D or 3D.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bar2 {
    dimension: Dimension,
}

impl Bar2 {
    pub fn new(dimension: Dimension) -> Self {
        Self { dimension }
    }

    /// Unit axis (first `dim` components) and length.
    fn axis(&self, coords: &[Point3]) -> Result<(DVector<f64>, f64)> {
        check_coords(coords, 2)?;
        let dim = self.dimension.dofs_per_node();
        let delta = (coords[1] - coords[0]).rows(0, dim).into_owned();
        let length = delta.norm();
        if length <= f64::EPSILON {
            return Err(Error::Element("Bar2 has zero length".into()));
        }
        Ok((delta / length, length))
    }
}

impl Element for Bar2 {
    fn n_nodes(&self) -> usize {
        2
    }

    fn dofs_per_node(&self) -> usize {
        self.dimension.dofs_per_node()
    }

    fn stiffness(&self, coords: &[Point3], props: &ElementProperties) -> Result<DMatrix<f64>> {
        let (cdir, length) = self.axis(coords)?;
        let dim = cdir.len();
        let k = props.material.youngs_modulus * props.section.area / length;
        let block = &cdir * cdir.transpose() * k;

        let mut ke = DMatrix::zeros(2 * dim, 2 * dim);
        ke.view_mut((0, 0), (dim, dim)).copy_from(&block);
        ke.view_mut((dim, dim), (dim, dim)).copy_from(&block);
        ke.view_mut((0, dim), (dim, dim)).copy_from(&-&block);
        ke.view_mut((dim, 0), (dim, dim)).copy_from(&-&block);
        Ok(ke)
    }

    fn body_load(&self, coords: &[Point3], props: &ElementProperties) -> Result<DVector<f64>> {
        let (cdir, length) = self.axis(coords)?;
        let dim = cdir.len();
        let half_mass = props.material.density_or_zero() * props.section.area * length / 2.0;

        Ok(DVector::from_fn(2 * dim, |a, _| half_mass * props.gravity[a % dim]))
    }

    fn measure(&self, coords: &[Point3]) -> f64 {
        self.axis(coords).map(|(_, length)| length).unwrap_or(0.0)
    }
}
