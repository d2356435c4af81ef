//! Linear static analysis driver.
//!
//! Runs the full pipeline on a mesh:
//!
//! 1. assemble element contributions into triplets and a load vector
//! 2. collect constraints (explicit conditions + tagged regions)
//! 3. convert to CSR and eliminate constraints
//! 4. solve with preconditioned CG

use crate::assembly::{assemble, AssemblyOptions};
use crate::boundary::{apply_conditions, eliminate, BoundaryCondition};
use crate::element::Formulation;
use crate::error::Result;
use crate::mesh::Mesh;
use crate::solver::{ConjugateGradient, Solution, Solver, SolverConfig};
use tracing::{debug, info};

/// Analysis configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub solver: SolverConfig,
    pub assembly: AssemblyOptions,
    /// Region tags whose nodes get zero displacement on every component.
    pub fixed_tags: Vec<u32>,
    /// Treat solver non-convergence as an error.
    pub require_convergence: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            solver: SolverConfig::default(),
            assembly: AssemblyOptions::default(),
            fixed_tags: vec![1, 2],
            require_convergence: true,
        }
    }
}

/// Result of a linear static run.
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    pub solution: Solution,
    pub dofs_per_node: usize,
    /// Elements skipped during assembly.
    pub skipped_elements: Vec<usize>,
    /// Constrained DOFs, ascending.
    pub constrained_dofs: Vec<usize>,
}

impl AnalysisResult {
    /// Displacement components of `node`.
    pub fn displacement(&self, node: usize) -> &[f64] {
        self.solution.nodal(node, self.dofs_per_node)
    }
}

/// Small-displacement static analysis with a fixed formulation.
#[derive(Debug, Clone)]
pub struct LinearStatic<F> {
    formulation: F,
    config: AnalysisConfig,
    conditions: Vec<BoundaryCondition>,
}

impl<F: Formulation> LinearStatic<F> {
    pub fn new(formulation: F, config: AnalysisConfig) -> Self {
        Self {
            formulation,
            config,
            conditions: Vec::new(),
        }
    }

    /// Add explicit nodal constraints and forces on top of tagged regions.
    pub fn with_conditions(mut self, conditions: Vec<BoundaryCondition>) -> Self {
        self.conditions = conditions;
        self
    }

    pub fn run(&self, mesh: &Mesh) -> Result<AnalysisResult> {
        let system = assemble(mesh, &self.formulation, &self.config.assembly)?;
        let dofs_per_node = system.dofs_per_node;

        let mut load = system.load;
        let mut constraints = apply_conditions(&self.conditions, dofs_per_node, &mut load)?;
        constraints.fix_tagged(mesh, &self.config.fixed_tags, 0.0)?;
        debug!(constrained = constraints.len(), "boundary conditions collected");

        let stiffness = system.stiffness.to_csr()?;
        let constrained = eliminate(&stiffness, &load, &constraints)?;

        let solver = ConjugateGradient::new(self.config.solver.clone());
        let mut solution = solver.solve(
            &constrained.matrix,
            &constrained.rhs,
            &constrained.initial_guess,
        )?;
        if self.config.require_convergence {
            solution = solution.ensure_converged()?;
        }

        info!(
            n_dofs = system.n_dofs,
            nnz = stiffness.nnz(),
            iterations = solution.stats.iterations,
            time_seconds = solution.stats.time_seconds,
            "linear static analysis done"
        );

        Ok(AnalysisResult {
            solution,
            dofs_per_node,
            skipped_elements: system.skipped_elements,
            constrained_dofs: constrained.constrained_dofs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{ElementProperties, LinearElasticity};
    use crate::error::Error;
    use crate::material::{Material, Section};
    use crate::mesh::ElementType;
    use crate::preconditioner::PreconditionerKind;
    use crate::types::{Dimension, Vec3, STANDARD_GRAVITY};
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    const E: f64 = 2.0e11;
    const AREA: f64 = 1.0e-4;
    const RHO: f64 = 8000.0;

    fn fixed(node: usize, component: usize, value: f64) -> BoundaryCondition {
        BoundaryCondition::Displacement {
            node,
            component,
            value,
        }
    }

    fn force(node: usize, component: usize, value: f64) -> BoundaryCondition {
        BoundaryCondition::Force {
            node,
            component,
            value,
        }
    }

    fn bar_formulation(gravity: Vec3) -> LinearElasticity {
        let material = Material::new(E, 0.3).unwrap().with_density(RHO).unwrap();
        let properties = ElementProperties::new(material, Section::new(AREA, 1.0).unwrap())
            .with_gravity(gravity);
        LinearElasticity::new(Dimension::Two, properties)
    }

    #[test]
    fn test_two_node_truss_self_weight() {
        // Bar from (0,0) to (1,0), node 0 fixed through a tagged point element
        let mut mesh = Mesh::new();
        mesh.add_node(Vector3::new(0.0, 0.0, 0.0));
        mesh.add_node(Vector3::new(1.0, 0.0, 0.0));
        mesh.add_element(ElementType::Line2, vec![0, 1]).unwrap();
        mesh.add_tagged_element(ElementType::Point, vec![0], vec![1]).unwrap();

        let gravity = Vector3::new(STANDARD_GRAVITY, 0.0, 0.0);
        let analysis = LinearStatic::new(bar_formulation(gravity), AnalysisConfig::default());
        let result = analysis.run(&mesh).unwrap();

        assert_eq!(result.displacement(0), &[0.0, 0.0]);
        assert_eq!(result.skipped_elements, vec![1]);
        assert_eq!(result.constrained_dofs, vec![0, 1]);

        // Tip displacement of a bar under self-weight: ρ g L² / (2E)
        let length = 1.0;
        let expected = RHO * STANDARD_GRAVITY * length * length / (2.0 * E);
        let tip = result.displacement(1);
        assert_relative_eq!(tip[0], expected, max_relative = 1e-9);
        assert_eq!(tip[1], 0.0);
        assert!(result.solution.stats.converged);
    }

    #[test]
    fn test_hanging_bar_refined() {
        // Vertical bar hanging from its top node, 8 segments
        let n_segments = 8;
        let length = 2.0;
        let mut mesh = Mesh::new();
        for i in 0..=n_segments {
            mesh.add_node(Vector3::new(0.0, -length * i as f64 / n_segments as f64, 0.0));
        }
        for i in 0..n_segments {
            mesh.add_element(ElementType::Line2, vec![i, i + 1]).unwrap();
        }
        mesh.add_tagged_element(ElementType::Point, vec![0], vec![2]).unwrap();

        let gravity = Vector3::new(0.0, -STANDARD_GRAVITY, 0.0);
        let result = LinearStatic::new(bar_formulation(gravity), AnalysisConfig::default())
            .run(&mesh)
            .unwrap();

        // Lumped loads reproduce the exact nodal values u(s) = ρ g (L s - s²/2) / E
        for i in 0..=n_segments {
            let s = length * i as f64 / n_segments as f64;
            let exact = -RHO * STANDARD_GRAVITY * (length * s - s * s / 2.0) / E;
            assert_relative_eq!(
                result.displacement(i)[1],
                exact,
                epsilon = 1e-15,
                max_relative = 1e-6
            );
        }
    }

    #[test]
    fn test_prescribed_displacement_exact() {
        let mut mesh = Mesh::new();
        for x in [0.0, 1.0, 2.0] {
            mesh.add_node(Vector3::new(x, 0.0, 0.0));
        }
        mesh.add_element(ElementType::Line2, vec![0, 1]).unwrap();
        mesh.add_element(ElementType::Line2, vec![1, 2]).unwrap();

        let formulation = LinearElasticity::new(
            Dimension::Two,
            ElementProperties::new(
                Material::new(E, 0.3).unwrap(),
                Section::new(AREA, 1.0).unwrap(),
            ),
        );
        let conditions = vec![
            fixed(0, 0, 0.0),
            fixed(0, 1, 0.0),
            fixed(1, 1, 0.0),
            fixed(2, 0, 1.0e-3),
            fixed(2, 1, -2.0e-3),
        ];
        let result = LinearStatic::new(formulation, AnalysisConfig::default())
            .with_conditions(conditions)
            .run(&mesh)
            .unwrap();

        assert_eq!(result.displacement(2), &[1.0e-3, -2.0e-3]);
        assert_eq!(result.displacement(0), &[0.0, 0.0]);
        assert_relative_eq!(result.displacement(1)[0], 5.0e-4, max_relative = 1e-9);
    }

    #[test]
    fn test_plane_stress_uniaxial_patch() {
        // Unit square, two triangles, tension P on the x = 1 edge
        let mut mesh = Mesh::new();
        mesh.add_node(Vector3::new(0.0, 0.0, 0.0));
        mesh.add_node(Vector3::new(1.0, 0.0, 0.0));
        mesh.add_node(Vector3::new(1.0, 1.0, 0.0));
        mesh.add_node(Vector3::new(0.0, 1.0, 0.0));
        mesh.add_element(ElementType::Tri3, vec![0, 1, 2]).unwrap();
        mesh.add_element(ElementType::Tri3, vec![0, 2, 3]).unwrap();

        let (e, nu, p) = (1000.0, 0.25, 10.0);
        let formulation = LinearElasticity::new(
            Dimension::Two,
            ElementProperties::new(
                Material::new(e, nu).unwrap(),
                Section::new(1.0, 1.0).unwrap(),
            ),
        );
        let conditions = vec![
            fixed(0, 0, 0.0),
            fixed(0, 1, 0.0),
            fixed(3, 0, 0.0),
            force(1, 0, p / 2.0),
            force(2, 0, p / 2.0),
        ];
        let result = LinearStatic::new(formulation, AnalysisConfig::default())
            .with_conditions(conditions)
            .run(&mesh)
            .unwrap();

        let strain_x = p / e;
        assert_relative_eq!(result.displacement(1)[0], strain_x, max_relative = 1e-7);
        assert_relative_eq!(result.displacement(2)[0], strain_x, max_relative = 1e-7);
        assert_relative_eq!(result.displacement(2)[1], -nu * strain_x, max_relative = 1e-7);
        assert_relative_eq!(result.displacement(3)[1], -nu * strain_x, max_relative = 1e-7);
        assert_relative_eq!(result.displacement(1)[1], 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_transverse_self_weight_on_single_bar_not_converged() {
        // Same two-node bar, default gravity along -y: no stiffness resists the
        // load, so CG breaks down on its first direction
        let mut mesh = Mesh::new();
        mesh.add_node(Vector3::new(0.0, 0.0, 0.0));
        mesh.add_node(Vector3::new(1.0, 0.0, 0.0));
        mesh.add_element(ElementType::Line2, vec![0, 1]).unwrap();
        mesh.add_tagged_element(ElementType::Point, vec![0], vec![1]).unwrap();

        let gravity = Vector3::new(0.0, -STANDARD_GRAVITY, 0.0);
        let half_weight = RHO * STANDARD_GRAVITY * AREA / 2.0;

        let strict = LinearStatic::new(bar_formulation(gravity), AnalysisConfig::default());
        match strict.run(&mesh) {
            Err(Error::NotConverged {
                iterations,
                residual,
            }) => {
                assert_eq!(iterations, 0);
                assert_relative_eq!(residual, half_weight, max_relative = 1e-12);
            }
            other => panic!("expected non-convergence, got {:?}", other),
        }

        let config = AnalysisConfig {
            require_convergence: false,
            ..AnalysisConfig::default()
        };
        let result = LinearStatic::new(bar_formulation(gravity), config)
            .run(&mesh)
            .unwrap();
        assert!(!result.solution.stats.converged);
        assert_eq!(result.displacement(1), &[0.0, 0.0]);
    }

    #[test]
    fn test_conflicting_constraint_rejected() {
        let mut mesh = Mesh::new();
        mesh.add_node(Vector3::new(0.0, 0.0, 0.0));
        mesh.add_node(Vector3::new(1.0, 0.0, 0.0));
        mesh.add_element(ElementType::Line2, vec![0, 1]).unwrap();
        mesh.add_tagged_element(ElementType::Point, vec![0], vec![1]).unwrap();

        let result = LinearStatic::new(bar_formulation(Vec3::zeros()), AnalysisConfig::default())
            .with_conditions(vec![fixed(0, 0, 1.0)])
            .run(&mesh);
        assert!(matches!(result, Err(Error::ConflictingConstraint { dof: 0, .. })));
    }

    #[test]
    fn test_non_convergence_policy() {
        let mut mesh = Mesh::new();
        for x in [0.0, 1.0, 2.0, 3.0] {
            mesh.add_node(Vector3::new(x, 0.0, 0.0));
        }
        for i in 0..3 {
            mesh.add_element(ElementType::Line2, vec![i, i + 1]).unwrap();
        }
        mesh.add_tagged_element(ElementType::Point, vec![0], vec![1]).unwrap();

        let gravity = Vector3::new(STANDARD_GRAVITY, 0.0, 0.0);
        let mut config = AnalysisConfig::default();
        config.solver = SolverConfig {
            max_iterations: 1,
            preconditioner: PreconditionerKind::None,
            ..SolverConfig::default()
        };

        let strict = LinearStatic::new(bar_formulation(gravity), config.clone());
        assert!(matches!(
            strict.run(&mesh),
            Err(Error::NotConverged { iterations: 1, .. })
        ));

        config.require_convergence = false;
        let lenient = LinearStatic::new(bar_formulation(gravity), config);
        let result = lenient.run(&mesh).unwrap();
        assert!(!result.solution.stats.converged);
        assert_eq!(result.displacement(0), &[0.0, 0.0]);
    }
}
