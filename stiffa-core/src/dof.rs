//! Degree-of-freedom numbering.
//!
//! Global DOFs are blocked node-major: all components of node 0, then all
//! components of node 1, and so on. Sparse formats, load vectors and boundary
//! conditions all index with this convention.

/// Global index of `component` at `node`.
#[inline]
pub fn global_dof(node: usize, component: usize, components_per_node: usize) -> usize {
    debug_assert!(component < components_per_node, "component out of range");
    node * components_per_node + component
}

/// Inverse of [`global_dof`]: (node, component).
#[inline]
pub fn node_component(dof: usize, components_per_node: usize) -> (usize, usize) {
    (dof / components_per_node, dof % components_per_node)
}

/// Local-to-global DOF map for an element, node-major then component.
pub fn element_dofs(nodes: &[usize], components_per_node: usize) -> Vec<usize> {
    nodes
        .iter()
        .flat_map(|&node| {
            (0..components_per_node).map(move |c| global_dof(node, c, components_per_node))
        })
        .collect()
}
