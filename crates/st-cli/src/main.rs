//! Strata CLI - compile medallion model definitions to SQL and plan
//! deployments

use clap::Parser;
use std::process::ExitCode;

mod cli;
mod commands;

use cli::{Cli, Commands};
use commands::{common, generate, graph, state, validate};

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Generate(args) => generate::execute(args, &cli.global),
        Commands::Validate(args) => validate::execute(args, &cli.global),
        Commands::State(args) => state::execute(&args.command, &cli.global),
        Commands::Graph(args) => graph::execute(args, &cli.global),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{:#}", error);
            common::exit_code_for(&error)
        }
    }
}
