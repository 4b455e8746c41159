use clap::{Args, CommandFactory, Parser, Subcommand, ValueHint};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "capex", author, version, about, long_about = None)]
pub struct Cli {
    /// Set the logging level
    #[arg(long, default_value = "info", global = true)]
    pub log_level: tracing::Level,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Progressive hedging parameters
    Ph {
        #[command(subcommand)]
        command: PhCommands,
    },
    /// Demand response
    Dr {
        #[command(subcommand)]
        command: DrCommands,
    },
    /// Model data and per-scenario solves
    Model {
        #[command(subcommand)]
        command: ModelCommands,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: Shell,
        /// Write output to a file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

/// Options shared by every command that builds model instances.
#[derive(Args, Debug, Clone)]
pub struct DemandResponseArgs {
    /// Directory holding optional input tables (demand_response_max_share.tab)
    #[arg(long, value_hint = ValueHint::DirPath)]
    pub inputs_dir: Option<PathBuf>,

    /// Fraction of hourly load that can be shifted to other times of day.
    /// Default for every period without a row in demand_response_max_share.tab
    #[arg(long, default_value_t = 0.10)]
    pub demand_response_share: f64,
}

#[derive(Subcommand, Debug)]
pub enum PhCommands {
    /// Set cost-proportional rho for first-stage variables in every scenario
    Rho {
        /// Model data file (YAML or JSON)
        #[arg(long, value_hint = ValueHint::FilePath)]
        model: PathBuf,

        /// First-stage cost expression to take coefficients from
        #[arg(long, default_value = "InvestmentCost")]
        cost_expression: String,

        /// Multiplier applied to every cost coefficient (CP(rho))
        #[arg(long, default_value_t = 1.0)]
        rho_coefficient: f64,

        /// Add demand response components to each scenario instance
        #[arg(long)]
        demand_response: bool,

        #[command(flatten)]
        dr: DemandResponseArgs,

        /// Write the rho table as JSON to this file instead of stdout
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        out: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
pub enum DrCommands {
    /// Show the demand response components added to one scenario
    Inspect {
        /// Model data file (YAML or JSON)
        #[arg(long, value_hint = ValueHint::FilePath)]
        model: PathBuf,

        /// Scenario to build (defaults to the first)
        #[arg(long)]
        scenario: Option<String>,

        #[command(flatten)]
        dr: DemandResponseArgs,

        /// Write the summary as JSON to this file instead of stdout
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        out: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ModelCommands {
    /// Check a model data file and report its dimensions
    Validate {
        /// Model data file (YAML or JSON)
        #[arg(long, value_hint = ValueHint::FilePath)]
        model: PathBuf,
    },
    /// Solve each scenario on its own (no PH coupling)
    Solve {
        /// Model data file (YAML or JSON)
        #[arg(long, value_hint = ValueHint::FilePath)]
        model: PathBuf,

        /// Only solve this scenario
        #[arg(long)]
        scenario: Option<String>,

        /// Add demand response components to each scenario instance
        #[arg(long)]
        demand_response: bool,

        #[command(flatten)]
        dr: DemandResponseArgs,

        /// Write solutions as JSON to this file instead of stdout
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        out: Option<PathBuf>,
    },
}

pub fn build_cli_command() -> clap::Command {
    Cli::command()
}
