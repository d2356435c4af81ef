//! Mesh data structure for FEA.
//!
//! Stores nodal coordinates, element connectivity, element type tags and
//! per-element integer tags (physical/region ids in gmsh parlance). Reading
//! mesh files is left to callers; meshes are built in memory.

use crate::error::{Error, Result};
use crate::types::Point3;

/// Element connectivity - node indices for an element.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementConnectivity {
    /// Element type identifier.
    pub element_type: ElementType,
    /// Node indices (0-based).
    pub nodes: Vec<usize>,
    /// Integer tags; the first tag is the region id.
    pub tags: Vec<u32>,
}

impl ElementConnectivity {
    /// Region id (first tag), if tagged.
    pub fn region(&self) -> Option<u32> {
        self.tags.first().copied()
    }
}

/// Supported element types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    /// 1-node point element (boundary markers).
    Point,
    /// 2-node line (truss bar).
    Line2,
    /// 3-node triangle (plane stress).
    Tri3,
    /// 4-node quadrilateral.
    Quad4,
}

impl ElementType {
    /// Number of nodes for this element type.
    pub fn n_nodes(self) -> usize {
        match self {
            ElementType::Point => 1,
            ElementType::Line2 => 2,
            ElementType::Tri3 => 3,
            ElementType::Quad4 => 4,
        }
    }

    /// Map a gmsh element type code.
    pub fn from_gmsh(code: u32) -> Option<Self> {
        match code {
            1 => Some(ElementType::Line2),
            2 => Some(ElementType::Tri3),
            3 => Some(ElementType::Quad4),
            15 => Some(ElementType::Point),
            _ => None,
        }
    }

    /// gmsh element type code.
    pub fn gmsh_code(self) -> u32 {
        match self {
            ElementType::Line2 => 1,
            ElementType::Tri3 => 2,
            ElementType::Quad4 => 3,
            ElementType::Point => 15,
        }
    }
}

/// Finite element mesh.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    /// Nodal coordinates.
    nodes: Vec<Point3>,
    /// Element connectivity.
    elements: Vec<ElementConnectivity>,
}

impl Mesh {
    /// Create a new empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mesh with pre-allocated capacity.
    pub fn with_capacity(n_nodes: usize, n_elements: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(n_nodes),
            elements: Vec::with_capacity(n_elements),
        }
    }

    /// Add a node to the mesh, returning its index.
    pub fn add_node(&mut self, point: Point3) -> usize {
        let idx = self.nodes.len();
        self.nodes.push(point);
        idx
    }

    /// Add multiple nodes at once.
    pub fn add_nodes(&mut self, points: impl IntoIterator<Item = Point3>) {
        self.nodes.extend(points);
    }

    /// Add an untagged element to the mesh.
    pub fn add_element(&mut self, element_type: ElementType, nodes: Vec<usize>) -> Result<usize> {
        self.add_tagged_element(element_type, nodes, Vec::new())
    }

    /// Add an element carrying integer tags.
    pub fn add_tagged_element(
        &mut self,
        element_type: ElementType,
        nodes: Vec<usize>,
        tags: Vec<u32>,
    ) -> Result<usize> {
        if nodes.len() != element_type.n_nodes() {
            return Err(Error::Mesh(format!(
                "Element type {:?} requires {} nodes, got {}",
                element_type,
                element_type.n_nodes(),
                nodes.len()
            )));
        }

        for &node_idx in &nodes {
            if node_idx >= self.nodes.len() {
                return Err(Error::Mesh(format!(
                    "Node index {} out of bounds (mesh has {} nodes)",
                    node_idx,
                    self.nodes.len()
                )));
            }
        }

        let idx = self.elements.len();
        self.elements.push(ElementConnectivity {
            element_type,
            nodes,
            tags,
        });
        Ok(idx)
    }

    /// Number of nodes in the mesh.
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Number of elements in the mesh.
    pub fn n_elements(&self) -> usize {
        self.elements.len()
    }

    /// Get nodal coordinates.
    pub fn nodes(&self) -> &[Point3] {
        &self.nodes
    }

    /// Get a specific node's coordinates.
    pub fn node(&self, idx: usize) -> Option<&Point3> {
        self.nodes.get(idx)
    }

    /// Get element connectivity.
    pub fn elements(&self) -> &[ElementConnectivity] {
        &self.elements
    }

    /// Get a specific element's connectivity.
    pub fn element(&self, idx: usize) -> Option<&ElementConnectivity> {
        self.elements.get(idx)
    }

    /// Get coordinates for an element's nodes.
    pub fn element_coords(&self, elem_idx: usize) -> Option<Vec<Point3>> {
        let elem = self.elements.get(elem_idx)?;
        Some(elem.nodes.iter().map(|&i| self.nodes[i]).collect())
    }

    /// Shortest element edge, taking edges between consecutive element nodes.
    pub fn min_length(&self) -> Option<f64> {
        self.elements
            .iter()
            .filter(|e| e.nodes.len() > 1)
            .flat_map(|e| {
                let n = e.nodes.len();
                // Lines have a single edge; polygons close the loop.
                let n_edges = if n == 2 { 1 } else { n };
                (0..n_edges).map(move |k| (e.nodes[k], e.nodes[(k + 1) % n]))
            })
            .map(|(a, b)| (self.nodes[b] - self.nodes[a]).norm())
            .min_by(|a, b| a.total_cmp(b))
    }

    /// Compute mesh bounding box.
    pub fn bounds(&self) -> Option<(Point3, Point3)> {
        let first = *self.nodes.first()?;
        Some(
            self.nodes[1..]
                .iter()
                .fold((first, first), |(min, max), node| (min.inf(node), max.sup(node))),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    #[test]
    fn test_mesh_creation() {
        let mut mesh = Mesh::new();
        mesh.add_node(Vector3::new(0.0, 0.0, 0.0));
        mesh.add_node(Vector3::new(1.0, 0.0, 0.0));
        mesh.add_node(Vector3::new(0.0, 1.0, 0.0));
        assert_eq!(mesh.n_nodes(), 3);

        mesh.add_element(ElementType::Tri3, vec![0, 1, 2]).unwrap();
        mesh.add_tagged_element(ElementType::Point, vec![0], vec![1, 7]).unwrap();
        assert_eq!(mesh.n_elements(), 2);
        assert_eq!(mesh.element(0).unwrap().region(), None);
        assert_eq!(mesh.element(1).unwrap().region(), Some(1));
    }

    #[test]
    fn test_invalid_element_node_count() {
        let mut mesh = Mesh::new();
        mesh.add_node(Vector3::new(0.0, 0.0, 0.0));
        mesh.add_node(Vector3::new(1.0, 0.0, 0.0));

        // Tri3 needs 3 nodes, we only provide 2
        let result = mesh.add_element(ElementType::Tri3, vec![0, 1]);
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_node_index() {
        let mut mesh = Mesh::new();
        mesh.add_node(Vector3::new(0.0, 0.0, 0.0));

        let result = mesh.add_element(ElementType::Line2, vec![0, 3]);
        assert!(matches!(result, Err(Error::Mesh(_))));
    }

    #[test]
    fn test_gmsh_codes() {
        assert_eq!(ElementType::from_gmsh(1), Some(ElementType::Line2));
        assert_eq!(ElementType::from_gmsh(15), Some(ElementType::Point));
        assert_eq!(ElementType::from_gmsh(99), None);
        for ty in [ElementType::Point, ElementType::Line2, ElementType::Tri3, ElementType::Quad4] {
            assert_eq!(ElementType::from_gmsh(ty.gmsh_code()), Some(ty));
        }
    }

    #[test]
    fn test_min_length() {
        let mut mesh = Mesh::new();
        assert_eq!(mesh.min_length(), None);

        mesh.add_node(Vector3::new(0.0, 0.0, 0.0));
        mesh.add_node(Vector3::new(2.0, 0.0, 0.0));
        mesh.add_node(Vector3::new(2.0, 0.5, 0.0));
        mesh.add_element(ElementType::Line2, vec![0, 1]).unwrap();
        assert_eq!(mesh.min_length(), Some(2.0));

        mesh.add_element(ElementType::Tri3, vec![0, 1, 2]).unwrap();
        assert_eq!(mesh.min_length(), Some(0.5));
    }

    #[test]
    fn test_bounds() {
        let mut mesh = Mesh::new();
        mesh.add_node(Vector3::new(-1.0, -2.0, -3.0));
        mesh.add_node(Vector3::new(1.0, 2.0, 3.0));
        mesh.add_node(Vector3::new(0.0, 0.0, 0.0));

        let (min, max) = mesh.bounds().unwrap();
        assert_eq!(min, Vector3::new(-1.0, -2.0, -3.0));
        assert_eq!(max, Vector3::new(1.0, 2.0, 3.0));
    }
}
