//! v8pack CLI - Builds V8 and packages it for NuGet

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};
use v8pack::core::error::find_pipeline_error;

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        let code = find_pipeline_error(&e).map_or(1, |pe| pe.exit_code());
        std::process::exit(code);
    }
}

fn run() -> Result<()> {
    // Parse CLI
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("v8pack=debug")
    } else {
        EnvFilter::new("v8pack=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    // Execute command
    match cli.command {
        Commands::Build(args) => commands::build::execute(args),
        Commands::Sync(args) => commands::sync::execute(args),
        Commands::Version(args) => commands::version::execute(args),
        Commands::Defines(args) => commands::defines::execute(args),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
