//! 3-node constant-strain triangle (plane stress).
//!
//! Linear shape functions give a constant B-matrix, so the stiffness is
//! integrated exactly with a single evaluation: `K = t A Bᵀ D B`.
//! Self-weight `ρ g t A` is lumped equally to the three nodes.

use crate::element::{check_coords, Element, ElementProperties};
use crate::error::{Error, Result};
use crate::types::Point3;
use nalgebra::{DMatrix, DVector, SMatrix};

/// Plane stress linear triangle, 2 DOFs per node.
#[derive(Debug, Clone, Copy, Default)]
pub struct Tri3;

impl Tri3 {
    pub fn new() -> Self {
        Self
    }

    /// Twice the signed area (positive for counter-clockwise ordering).
    fn signed_area_2(coords: &[Point3]) -> f64 {
        let (x1, y1) = (coords[0][0], coords[0][1]);
        let (x2, y2) = (coords[1][0], coords[1][1]);
        let (x3, y3) = (coords[2][0], coords[2][1]);
        (x2 - x1) * (y3 - y1) - (x3 - x1) * (y2 - y1)
    }

    /// Strain-displacement matrix (3x6) and element area.
    fn compute_b_matrix(coords: &[Point3]) -> Result<(SMatrix<f64, 3, 6>, f64)> {
        check_coords(coords, 3)?;
        let area_2 = Self::signed_area_2(coords);
        if area_2.abs() <= f64::EPSILON {
            return Err(Error::Element("Degenerate Tri3: zero area".into()));
        }

        let mut b = SMatrix::<f64, 3, 6>::zeros();
        for i in 0..3 {
            let j = (i + 1) % 3;
            let k = (i + 2) % 3;
            // dN_i/dx = (y_j - y_k) / 2A, dN_i/dy = (x_k - x_j) / 2A
            let dndx = (coords[j][1] - coords[k][1]) / area_2;
            let dndy = (coords[k][0] - coords[j][0]) / area_2;
            b[(0, 2 * i)] = dndx;
            b[(1, 2 * i + 1)] = dndy;
            b[(2, 2 * i)] = dndy;
            b[(2, 2 * i + 1)] = dndx;
        }

        Ok((b, area_2.abs() / 2.0))
    }
}

impl Element for Tri3 {
    fn n_nodes(&self) -> usize {
        3
    }

    fn dofs_per_node(&self) -> usize {
        2
    }

    fn stiffness(&self, coords: &[Point3], props: &ElementProperties) -> Result<DMatrix<f64>> {
        let (b, area) = Self::compute_b_matrix(coords)?;
        let d = props.material.constitutive_plane_stress();
        let ke = b.transpose() * d * b * (props.section.thickness * area);
        Ok(DMatrix::from_column_slice(6, 6, ke.as_slice()))
    }

    fn body_load(&self, coords: &[Point3], props: &ElementProperties) -> Result<DVector<f64>> {
        let (_, area) = Self::compute_b_matrix(coords)?;
        let third_mass =
            props.material.density_or_zero() * props.section.thickness * area / 3.0;
        Ok(DVector::from_fn(6, |a, _| third_mass * props.gravity[a % 2]))
    }

    fn measure(&self, coords: &[Point3]) -> f64 {
        if coords.len() != 3 {
            return 0.0;
        }
        Self::signed_area_2(coords).abs() / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::{Material, Section};
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    fn unit_triangle() -> [Point3; 3] {
        [
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
        ]
    }

    fn props() -> ElementProperties {
        let material = Material::new(1000.0, 0.25).unwrap().with_density(2.0).unwrap();
        ElementProperties::new(material, Section::new(1.0, 0.5).unwrap())
    }

    #[test]
    fn test_stiffness_symmetric_positive_diagonal() {
        let ke = Tri3::new().stiffness(&unit_triangle(), &props()).unwrap();
        assert_eq!(ke.shape(), (6, 6));
        assert_relative_eq!(ke, ke.transpose(), epsilon = 1e-10);
        for i in 0..6 {
            assert!(ke[(i, i)] > 0.0, "Diagonal {} is not positive", i);
        }
    }

    #[test]
    fn test_rigid_body_modes() {
        let coords = [
            Vector3::new(0.3, -0.1, 0.0),
            Vector3::new(2.0, 0.4, 0.0),
            Vector3::new(0.9, 1.7, 0.0),
        ];
        let ke = Tri3::new().stiffness(&coords, &props()).unwrap();

        let translate_x = DVector::from_vec(vec![1.0, 0.0, 1.0, 0.0, 1.0, 0.0]);
        let translate_y = DVector::from_vec(vec![0.0, 1.0, 0.0, 1.0, 0.0, 1.0]);
        // Infinitesimal rotation: u = -y, v = x
        let rotate = DVector::from_fn(6, |a, _| {
            let node = a / 2;
            if a % 2 == 0 {
                -coords[node][1]
            } else {
                coords[node][0]
            }
        });

        for mode in [translate_x, translate_y, rotate] {
            assert!((&ke * mode).norm() < 1e-9 * ke.norm());
        }
    }

    #[test]
    fn test_orientation_independent() {
        let ccw = unit_triangle();
        let cw = [ccw[0], ccw[2], ccw[1]];
        let k_ccw = Tri3::new().stiffness(&ccw, &props()).unwrap();
        let k_cw = Tri3::new().stiffness(&cw, &props()).unwrap();
        // Node 0 block is unaffected by swapping the other two nodes
        assert_relative_eq!(k_ccw[(0, 0)], k_cw[(0, 0)], epsilon = 1e-10);
        assert_relative_eq!(k_ccw[(1, 1)], k_cw[(1, 1)], epsilon = 1e-10);
    }

    #[test]
    fn test_body_load_total_weight() {
        let fe = Tri3::new().body_load(&unit_triangle(), &props()).unwrap();
        // ρ t A g = 2.0 * 0.5 * 0.5 * 9.81
        let total: f64 = (0..3).map(|n| fe[2 * n + 1]).sum();
        assert_relative_eq!(total, -2.0 * 0.5 * 0.5 * 9.81, max_relative = 1e-12);
        assert_eq!(fe[0], 0.0);
        assert_relative_eq!(Tri3::new().measure(&unit_triangle()), 0.5);
    }

    #[test]
    fn test_degenerate_triangle() {
        let coords = [
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 1.0, 0.0),
            Vector3::new(2.0, 2.0, 0.0),
        ];
        assert!(matches!(
            Tri3::new().stiffness(&coords, &props()),
            Err(Error::Element(_))
        ));
    }
}
