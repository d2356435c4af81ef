//! Stiffa Core - sparse static finite element analysis
//!
//! Small structural FEM library with:
//! - Triplet accumulation and CSR storage with constraint editing
//! - Node-major DOF numbering and element assembly
//! - Dirichlet elimination with lifting
//! - Jacobi-preconditioned conjugate gradient
//!
//! # Architecture
//!
//! The pipeline is built around these core abstractions:
//!
//! - [`Element`] trait: element stiffness and lumped body load
//! - [`Formulation`]: maps mesh cells to local systems
//! - [`TripletMatrix`] / [`CsrMatrix`]: assembly buffer and solver matrix
//! - [`DirichletConstraints`]: prescribed DOF values
//! - [`Solver`] trait: linear system solution strategies
//!
//! [`LinearStatic`] strings them together for a full static run.

pub mod types;
pub mod element;
pub mod mesh;
pub mod material;
pub mod sparse;
pub mod dof;
pub mod assembly;
pub mod boundary;
pub mod preconditioner;
pub mod solver;
pub mod analysis;
pub mod error;

pub use types::{Dimension, Point3, Vec3};
pub use element::{create_element, Element, ElementProperties, Formulation, LinearElasticity};
pub use mesh::{ElementType, Mesh};
pub use material::{Material, Section};
pub use sparse::{CsrMatrix, TripletMatrix};
pub use boundary::{BoundaryCondition, DirichletConstraints};
pub use preconditioner::{Preconditioner, PreconditionerKind};
pub use solver::{ConjugateGradient, Solution, Solver, SolverConfig};
pub use analysis::{AnalysisConfig, AnalysisResult, LinearStatic};
pub use error::{Error, Result};
