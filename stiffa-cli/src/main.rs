use anyhow::Context;
use clap::Parser;
use nalgebra::Vector3;
use stiffa_core::{
    AnalysisConfig, AnalysisResult, BoundaryCondition, Dimension, ElementProperties, ElementType,
    LinearElasticity, LinearStatic, Material, Mesh, Section,
};
use tracing::{info, warn};
use tracing_subscriber::FmtSubscriber;

mod cli;

use cli::{Cli, Commands, SolverArgs};

/// Region tag used for clamped supports.
const SUPPORT_TAG: u32 = 1;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;

    match cli.command {
        Commands::Bar {
            segments,
            length,
            solver,
        } => run_bar(segments, length, &solver),
        Commands::Truss { load, bay, solver } => run_truss(load, bay, &solver),
    }
}

fn analysis_config(args: &SolverArgs) -> AnalysisConfig {
    AnalysisConfig {
        solver: args.solver_config(),
        fixed_tags: vec![SUPPORT_TAG],
        require_convergence: !args.allow_unconverged,
        ..AnalysisConfig::default()
    }
}

fn steel_bars() -> ElementProperties {
    ElementProperties::new(Material::steel(), Section::default())
}

/// Vertical bar of `segments` elements hanging from node 0.
fn hanging_bar_mesh(segments: usize, length: f64) -> anyhow::Result<Mesh> {
    anyhow::ensure!(segments > 0, "bar needs at least one segment");
    anyhow::ensure!(length > 0.0, "bar length must be positive, got {length}");

    let mut mesh = Mesh::with_capacity(segments + 1, segments + 1);
    mesh.add_nodes((0..=segments).map(|i| {
        let s = length * i as f64 / segments as f64;
        Vector3::new(0.0, -s, 0.0)
    }));
    for i in 0..segments {
        mesh.add_element(ElementType::Line2, vec![i, i + 1])?;
    }
    mesh.add_tagged_element(ElementType::Point, vec![0], vec![SUPPORT_TAG])?;
    Ok(mesh)
}

/// Rollers on the transverse component of every bar node.
///
/// A vertical bar has no stiffness along x, so without them those DOFs
/// would carry zero diagonals into the solver.
fn hanging_bar_rollers(mesh: &Mesh) -> Vec<BoundaryCondition> {
    (0..mesh.n_nodes())
        .map(|node| BoundaryCondition::Displacement {
            node,
            component: 0,
            value: 0.0,
        })
        .collect()
}

/// Two-bay Warren truss: bottom chord 0-1-2, top chord 3-4, equilateral panels.
fn warren_truss_mesh(bay: f64) -> anyhow::Result<Mesh> {
    anyhow::ensure!(bay > 0.0, "bay width must be positive, got {bay}");

    let height = bay * 3.0_f64.sqrt() / 2.0;
    let mut mesh = Mesh::with_capacity(5, 8);
    mesh.add_nodes([
        Vector3::new(0.0, 0.0, 0.0),
        Vector3::new(bay, 0.0, 0.0),
        Vector3::new(2.0 * bay, 0.0, 0.0),
        Vector3::new(0.5 * bay, height, 0.0),
        Vector3::new(1.5 * bay, height, 0.0),
    ]);
    for members in [[0, 1], [1, 2], [3, 4], [0, 3], [3, 1], [1, 4], [4, 2]] {
        mesh.add_element(ElementType::Line2, members.to_vec())?;
    }
    mesh.add_tagged_element(ElementType::Point, vec![0], vec![SUPPORT_TAG])?;
    Ok(mesh)
}

/// Roller at the right support and the midspan point load.
fn warren_truss_conditions(load: f64) -> Vec<BoundaryCondition> {
    vec![
        BoundaryCondition::Displacement {
            node: 2,
            component: 1,
            value: 0.0,
        },
        BoundaryCondition::Force {
            node: 1,
            component: 1,
            value: -load,
        },
    ]
}

fn report_mesh(mesh: &Mesh) {
    if let (Some((min, max)), Some(h)) = (mesh.bounds(), mesh.min_length()) {
        println!("mesh: {} nodes, {} elements", mesh.n_nodes(), mesh.n_elements());
        println!(
            "extent: [{:.3}, {:.3}] x [{:.3}, {:.3}], shortest edge {:.4}",
            min.x, max.x, min.y, max.y, h
        );
    }
}

fn report_stats(result: &AnalysisResult) {
    let stats = &result.solution.stats;
    if !stats.converged {
        warn!(
            iterations = stats.iterations,
            residual = stats.residual,
            "solver did not converge, displacements are approximate"
        );
    }
    println!(
        "{}: {} iterations, residual {:.3e}, {:.3} ms",
        stats.solver,
        stats.iterations,
        stats.residual,
        stats.time_seconds * 1e3
    );
}

fn run_bar(segments: usize, length: f64, args: &SolverArgs) -> anyhow::Result<()> {
    let mesh = hanging_bar_mesh(segments, length)?;
    report_mesh(&mesh);

    let properties = steel_bars();
    let rho_g = properties.material.density_or_zero() * properties.gravity.norm();
    let youngs = properties.material.youngs_modulus;
    info!(segments, length, "hanging bar");

    let analysis = LinearStatic::new(
        LinearElasticity::new(Dimension::Two, properties),
        analysis_config(args),
    )
    .with_conditions(hanging_bar_rollers(&mesh));
    let result = analysis.run(&mesh).context("hanging bar analysis failed")?;
    report_stats(&result);

    println!(
        "{:>6} {:>10} {:>14} {:>14} {:>10}",
        "node", "depth", "u_y", "exact", "rel err"
    );
    for (node, point) in mesh.nodes().iter().enumerate() {
        let s = -point.y;
        let exact = -rho_g * (length * s - 0.5 * s * s) / youngs;
        let computed = result.displacement(node)[1];
        let rel_err = if exact == 0.0 {
            computed.abs()
        } else {
            ((computed - exact) / exact).abs()
        };
        println!("{node:>6} {s:>10.4} {computed:>14.6e} {exact:>14.6e} {rel_err:>10.2e}");
    }
    Ok(())
}

fn run_truss(load: f64, bay: f64, args: &SolverArgs) -> anyhow::Result<()> {
    let mesh = warren_truss_mesh(bay)?;
    report_mesh(&mesh);
    info!(load, bay, "two-bay truss");

    let analysis = LinearStatic::new(
        LinearElasticity::new(Dimension::Two, steel_bars()),
        analysis_config(args),
    )
    .with_conditions(warren_truss_conditions(load));
    let result = analysis.run(&mesh).context("truss analysis failed")?;
    report_stats(&result);

    println!("{:>6} {:>14} {:>14}", "node", "u_x", "u_y");
    for node in 0..mesh.n_nodes() {
        let u = result.displacement(node);
        println!("{node:>6} {:>14.6e} {:>14.6e}", u[0], u[1]);
    }
    println!("midspan deflection: {:.6e} m", result.displacement(1)[1]);
    Ok(())
}
