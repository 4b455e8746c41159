use capex_cli::cli::{Cli, Commands};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;

mod commands;

use commands::{completions, dr, model, ph};

fn main() {
    let cli = Cli::parse();

    // stdout carries JSON results; logs go to stderr
    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let (name, result) = match &cli.command {
        Commands::Ph { command } => ("ph", ph::handle(command)),
        Commands::Dr { command } => ("dr", dr::handle(command)),
        Commands::Model { command } => ("model", model::handle(command)),
        Commands::Completions { shell, out } => {
            ("completions", completions::handle(*shell, out.as_deref()))
        }
    };

    match result {
        Ok(()) => info!("{} command finished", name),
        Err(err) => {
            error!("{} command failed: {:#}", name, err);
            eprintln!("Error: {err:#}");
            std::process::exit(1);
        }
    }
}
