//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Strata - compile medallion model definitions to SQL and plan deployments
#[derive(Parser, Debug)]
#[command(name = "st")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the model definition root
    #[arg(short, long, global = true, default_value = ".")]
    pub root: PathBuf,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate SQL artifacts for every materializable model
    Generate(GenerateArgs),

    /// Validate the model corpus without generating
    Validate(ValidateArgs),

    /// Environment state operations (init, show, plan, apply)
    State(StateArgs),

    /// Export the dependency graph for lineage rendering
    Graph(GraphArgs),
}

/// Arguments for the generate command
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Output directory for emitted SQL
    #[arg(short, long, default_value = "target/sql")]
    pub out_dir: PathBuf,

    /// Target SQL dialect (postgres or spark)
    #[arg(short, long, default_value = "postgres")]
    pub dialect: String,
}

/// Arguments for the validate command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Treat warnings as errors
    #[arg(long)]
    pub strict: bool,
}

/// Arguments for the state command
#[derive(Args, Debug)]
pub struct StateArgs {
    /// State subcommand
    #[command(subcommand)]
    pub command: StateCommands,
}

/// State subcommands
#[derive(Subcommand, Debug)]
pub enum StateCommands {
    /// Snapshot the current corpus; fails if the environment has state
    Init(StateEnvArgs),

    /// Print the environment's snapshot
    Show(StateEnvArgs),

    /// Diff the current corpus against the environment's snapshot
    Plan(StateEnvArgs),

    /// Apply the plan and write the updated snapshot
    Apply(ApplyArgs),
}

/// Common arguments for state subcommands
#[derive(Args, Debug)]
pub struct StateEnvArgs {
    /// Environment name (e.g. dev, prod)
    #[arg(short, long)]
    pub env: String,

    /// Base directory for state files (relative to the root)
    #[arg(long, default_value = ".strata/state")]
    pub state_dir: PathBuf,
}

/// Arguments for the state apply subcommand
#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Common environment arguments
    #[command(flatten)]
    pub env: StateEnvArgs,

    /// How to commit the plan
    #[arg(short, long, value_enum, default_value = "confirm")]
    pub mode: ApplyModeArg,
}

/// Apply modes
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyModeArg {
    /// Compute and print the plan, write nothing
    DryRun,
    /// Write the snapshot unconditionally
    Auto,
    /// Print the plan and ask for confirmation
    Confirm,
}

impl From<ApplyModeArg> for st_core::ApplyMode {
    fn from(arg: ApplyModeArg) -> Self {
        match arg {
            ApplyModeArg::DryRun => st_core::ApplyMode::DryRun,
            ApplyModeArg::Auto => st_core::ApplyMode::Auto,
            ApplyModeArg::Confirm => st_core::ApplyMode::Confirm,
        }
    }
}

/// Arguments for the graph command
#[derive(Args, Debug)]
pub struct GraphArgs {
    /// Export format
    #[arg(short, long, value_enum, default_value = "nodes-edges")]
    pub format: GraphFormatArg,

    /// Write to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Graph export formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphFormatArg {
    /// Flat node and edge lists (JSON)
    NodesEdges,
    /// Models nested under their layer (JSON)
    Hierarchical,
    /// Graphviz digraph
    Dot,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_args() {
        // Validates the entire command tree: short flag conflicts,
        // duplicate args, and other clap definition errors.
        Cli::command().debug_assert();
    }
}
