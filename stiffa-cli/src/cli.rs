use clap::{Args, Parser, Subcommand, ValueEnum};
use stiffa_core::{PreconditionerKind, SolverConfig};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Linear static truss and plane-stress analyses",
    long_about = None
)]
pub struct Cli {
    /// Set the logging level
    #[arg(long, default_value = "info")]
    pub log_level: tracing::Level,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Vertical bar hanging under its own weight, compared to the exact solution
    Bar {
        /// Number of bar segments
        #[arg(long, default_value_t = 10)]
        segments: usize,
        /// Bar length in metres
        #[arg(long, default_value_t = 1.0)]
        length: f64,
        #[command(flatten)]
        solver: SolverArgs,
    },
    /// Two-bay Warren truss with a midspan point load
    Truss {
        /// Downward point load at midspan in newtons
        #[arg(long, default_value_t = 10_000.0)]
        load: f64,
        /// Bay width in metres
        #[arg(long, default_value_t = 2.0)]
        bay: f64,
        #[command(flatten)]
        solver: SolverArgs,
    },
}

#[derive(Args, Debug, Clone)]
pub struct SolverArgs {
    /// Relative residual tolerance
    #[arg(long, default_value_t = 1e-10)]
    pub tolerance: f64,
    /// Maximum CG iterations
    #[arg(long, default_value_t = 10_000)]
    pub max_iterations: usize,
    /// Preconditioner
    #[arg(long, value_enum, default_value_t = PreconditionerArg::Jacobi)]
    pub preconditioner: PreconditionerArg,
    /// Report a non-converged solve instead of failing
    #[arg(long)]
    pub allow_unconverged: bool,
}

impl SolverArgs {
    pub fn solver_config(&self) -> SolverConfig {
        SolverConfig {
            tolerance: self.tolerance,
            max_iterations: self.max_iterations,
            preconditioner: self.preconditioner.into(),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum PreconditionerArg {
    None,
    Jacobi,
}

impl From<PreconditionerArg> for PreconditionerKind {
    fn from(arg: PreconditionerArg) -> Self {
        match arg {
            PreconditionerArg::None => PreconditionerKind::None,
            PreconditionerArg::Jacobi => PreconditionerKind::Jacobi,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_bar_arguments() {
        let cli = Cli::try_parse_from([
            "stiffa",
            "--log-level",
            "debug",
            "bar",
            "--segments",
            "4",
            "--preconditioner",
            "none",
        ])
        .unwrap();
        assert_eq!(cli.log_level, tracing::Level::DEBUG);
        match cli.command {
            Commands::Bar {
                segments,
                length,
                solver,
            } => {
                assert_eq!(segments, 4);
                assert_eq!(length, 1.0);
                let config = solver.solver_config();
                assert_eq!(config.preconditioner, PreconditionerKind::None);
                assert_eq!(config.tolerance, 1e-10);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_solver_defaults_match_library() {
        let cli = Cli::try_parse_from(["stiffa", "truss"]).unwrap();
        let Commands::Truss { solver, .. } = cli.command else {
            panic!("expected truss command");
        };
        assert_eq!(solver.solver_config(), SolverConfig::default());
        assert!(!solver.allow_unconverged);
    }
}
