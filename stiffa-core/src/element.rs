//! Element trait and implementations.
//!
//! The Element trait defines the interface for finite elements, enabling
//! the assembly process to work with any element type uniformly. A
//! [`Formulation`] wraps element creation, properties and DOF mapping into
//! the per-element local systems the assembler scatters.
//!
//! # Submodules
//!
//! - [`bar2`] - 2-node axial truss bar
//! - [`tri3`] - constant-strain plane stress triangle

use crate::dof::element_dofs;
use crate::error::{Error, Result};
use crate::material::{Material, Section};
use crate::mesh::{ElementType, Mesh};
use crate::types::{Dimension, Point3, Vec3, STANDARD_GRAVITY};
use nalgebra::{DMatrix, DVector};

pub mod bar2;
pub mod tri3;

pub use bar2::Bar2;
pub use tri3::Tri3;

/// Material, section and body-force data shared by every element.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementProperties {
    pub material: Material,
    pub section: Section,
    /// Gravitational acceleration vector (m/s²).
    pub gravity: Vec3,
}

impl ElementProperties {
    pub fn new(material: Material, section: Section) -> Self {
        Self {
            material,
            section,
            gravity: Vec3::new(0.0, -STANDARD_GRAVITY, 0.0),
        }
    }

    pub fn with_gravity(mut self, gravity: Vec3) -> Self {
        self.gravity = gravity;
        self
    }
}

/// Finite element interface.
pub trait Element {
    /// Number of nodes in this element.
    fn n_nodes(&self) -> usize;

    /// Degrees of freedom per node.
    fn dofs_per_node(&self) -> usize;

    /// Total degrees of freedom for this element.
    fn n_dofs(&self) -> usize {
        self.n_nodes() * self.dofs_per_node()
    }

    /// Element stiffness matrix in node-major local DOF order.
    fn stiffness(&self, coords: &[Point3], props: &ElementProperties) -> Result<DMatrix<f64>>;

    /// Lumped self-weight load vector in node-major local DOF order.
    fn body_load(&self, coords: &[Point3], props: &ElementProperties) -> Result<DVector<f64>>;

    /// Element length (bars) or area (plane elements).
    fn measure(&self, coords: &[Point3]) -> f64;
}

/// Create an element implementation, or `None` when the type has no
/// stiffness in the given dimension (points, quads, triangles in 3D).
pub fn create_element(element_type: ElementType, dimension: Dimension) -> Option<Box<dyn Element>> {
    match (element_type, dimension) {
        (ElementType::Line2, _) => Some(Box::new(Bar2::new(dimension))),
        (ElementType::Tri3, Dimension::Two) => Some(Box::new(Tri3::new())),
        _ => None,
    }
}

pub(crate) fn check_coords(coords: &[Point3], n_nodes: usize) -> Result<()> {
    if coords.len() != n_nodes {
        return Err(Error::dimension("element coordinates", n_nodes, coords.len()));
    }
    Ok(())
}

/// One element's contribution, ready to scatter.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalSystem {
    /// Local-to-global DOF map.
    pub dofs: Vec<usize>,
    pub stiffness: DMatrix<f64>,
    pub load: DVector<f64>,
}

/// Supplies element-local systems to the assembler.
pub trait Formulation {
    /// Components per node, fixing the global DOF numbering.
    fn dofs_per_node(&self) -> usize;

    /// Whether elements of this type contribute stiffness.
    fn supports(&self, element_type: ElementType) -> bool;

    /// Local stiffness, load and DOF map for element `elem_idx`.
    fn local_system(&self, mesh: &Mesh, elem_idx: usize) -> Result<LocalSystem>;
}

/// Small-strain linear elasticity with uniform properties.
#[derive(Debug, Clone)]
pub struct LinearElasticity {
    pub dimension: Dimension,
    pub properties: ElementProperties,
}

impl LinearElasticity {
    pub fn new(dimension: Dimension, properties: ElementProperties) -> Self {
        Self {
            dimension,
            properties,
        }
    }
}

impl Formulation for LinearElasticity {
    fn dofs_per_node(&self) -> usize {
        self.dimension.dofs_per_node()
    }

    fn supports(&self, element_type: ElementType) -> bool {
        create_element(element_type, self.dimension).is_some()
    }

    fn local_system(&self, mesh: &Mesh, elem_idx: usize) -> Result<LocalSystem> {
        let connectivity = mesh
            .element(elem_idx)
            .ok_or_else(|| Error::Mesh(format!("Element index {} out of bounds", elem_idx)))?;
        let element = create_element(connectivity.element_type, self.dimension).ok_or_else(|| {
            Error::Element(format!(
                "{:?} has no {:?} formulation",
                connectivity.element_type, self.dimension
            ))
        })?;
        let coords = mesh
            .element_coords(elem_idx)
            .ok_or_else(|| Error::Mesh(format!("Element index {} out of bounds", elem_idx)))?;

        Ok(LocalSystem {
            dofs: element_dofs(&connectivity.nodes, self.dofs_per_node()),
            stiffness: element.stiffness(&coords, &self.properties)?,
            load: element.body_load(&coords, &self.properties)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    #[test]
    fn test_create_element() {
        assert!(create_element(ElementType::Line2, Dimension::Two).is_some());
        assert!(create_element(ElementType::Line2, Dimension::Three).is_some());
        assert!(create_element(ElementType::Tri3, Dimension::Two).is_some());
        assert!(create_element(ElementType::Tri3, Dimension::Three).is_none());
        assert!(create_element(ElementType::Point, Dimension::Two).is_none());
        assert!(create_element(ElementType::Quad4, Dimension::Two).is_none());
    }

    #[test]
    fn test_local_system_dofs() {
        let mut mesh = Mesh::new();
        mesh.add_node(Vector3::new(0.0, 0.0, 0.0));
        mesh.add_node(Vector3::new(1.0, 0.0, 0.0));
        mesh.add_node(Vector3::new(2.0, 0.0, 0.0));
        mesh.add_element(ElementType::Line2, vec![2, 1]).unwrap();
        mesh.add_element(ElementType::Point, vec![0]).unwrap();

        let formulation = LinearElasticity::new(
            Dimension::Two,
            ElementProperties::new(Material::steel(), Section::default()),
        );
        let local = formulation.local_system(&mesh, 0).unwrap();
        assert_eq!(local.dofs, vec![4, 5, 2, 3]);
        assert_eq!(local.stiffness.shape(), (4, 4));
        assert_eq!(local.load.len(), 4);

        assert!(!formulation.supports(ElementType::Point));
        assert!(matches!(formulation.local_system(&mesh, 1), Err(Error::Element(_))));
        assert!(matches!(formulation.local_system(&mesh, 5), Err(Error::Mesh(_))));
    }
}
