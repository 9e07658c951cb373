mod cli;
mod commands;
mod config;
mod engine;
mod paths;
mod progress;
mod provider;
mod resource;
mod runlist;
mod templates;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use config::SousConfig;
use std::io;
use std::process::ExitCode;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
    };

    if let Command::Completions { shell } = cli.command {
        generate(shell, &mut Cli::command(), "sous", &mut io::stdout());
        return Ok(ExitCode::SUCCESS);
    }

    let config = SousConfig::load(cli.config.as_deref())?;

    let code = match cli.command {
        Command::Apply(args) => commands::converge::apply(&ctx, &config, args)?,
        Command::Diff(args) => commands::converge::diff(&ctx, &config, args)?,
        Command::Validate(args) => commands::converge::validate(&ctx, &config, args)?,
        Command::Resources(args) => {
            commands::resources::run(&ctx, &config, args.resource_type.as_deref())?;
            0
        }
        Command::Completions { .. } => 0,
    };

    Ok(ExitCode::from(code))
}
