//! Core data types shared across the crate.
//!
//! Geometry is always carried in 3D; 2D problems leave the z component at
//! zero and use two DOFs per node.

use nalgebra::Vector3;

/// A point in 3D space.
pub type Point3 = Vector3<f64>;

/// A 3D vector (displacement, body force, etc.).
pub type Vec3 = Vector3<f64>;

/// Standard gravitational acceleration (m/s²).
pub const STANDARD_GRAVITY: f64 = 9.81;

/// Spatial dimension of an analysis, which fixes the DOFs per node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dimension {
    /// Plane problems: (u, v) per node.
    #[default]
    Two,
    /// Solid/space-truss problems: (u, v, w) per node.
    Three,
}

impl Dimension {
    /// Number of displacement components per node.
    pub fn dofs_per_node(self) -> usize {
        match self {
            Dimension::Two => 2,
            Dimension::Three => 3,
        }
    }
}
