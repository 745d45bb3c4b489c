//! pep517 CLI - Command-line frontend for PEP 517 build backends
//!
//! This binary calls the hooks of a Python build backend in an isolated
//! subprocess and prints what they return.

use clap::Parser;
use std::process::ExitCode;

mod cli_args;
mod commands;

use cli_args::{Cli, Commands};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init()
        .ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Requires { target, backend } => commands::hooks::requires(target, &backend),
        Commands::Metadata { out, backend } => commands::hooks::metadata(&out, &backend),
        Commands::Wheel {
            out,
            metadata_dir,
            backend,
        } => commands::hooks::wheel(&out, metadata_dir.as_deref(), &backend),
        Commands::Sdist { out, backend } => commands::hooks::sdist(&out, &backend),
        Commands::Doctor { python } => commands::doctor::run(python.as_deref()),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            tracing::debug!(error = ?e, "Command failed");
            eprintln!("{}: {:#}", colored::Colorize::red("error"), e);
            ExitCode::from(1)
        }
    }
}
