use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "ffmin - constrained molecular-mechanics geometry minimization with UFF and MMFF94 force fields.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Minimize a molecule under the restraints described in a job file.
    Minimize(MinimizeArgs),
    /// Print the single-point energy breakdown of the job's starting geometry.
    Energy(EnergyArgs),
}

/// Arguments for the `minimize` subcommand.
#[derive(Args, Debug)]
pub struct MinimizeArgs {
    /// Path to the job file in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub job: PathBuf,

    /// Write the result (status, energies and final coordinates) to this TOML file.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    // --- Minimizer Overrides ---
    /// Override `minimizer.max-iterations` from the job file.
    #[arg(long, value_name = "INT")]
    pub max_iterations: Option<usize>,

    /// Override `minimizer.gradient-tolerance` from the job file.
    #[arg(long, value_name = "FLOAT")]
    pub gradient_tolerance: Option<f64>,

    /// Override `minimizer.energy-tolerance` from the job file.
    #[arg(long, value_name = "FLOAT")]
    pub energy_tolerance: Option<f64>,
}

/// Arguments for the `energy` subcommand.
#[derive(Args, Debug)]
pub struct EnergyArgs {
    /// Path to the job file in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub job: PathBuf,
}
