//! Convergence commands
//!
//! - `apply` - converge every resource in a run list
//! - `diff` - preview what apply would change
//! - `validate` - check a run list without touching the system

use anyhow::Result;
use colored::Colorize;
use declarative::{ConvergenceEngine, EngineOptions, Platform, RunReport, platform};
use std::time::Duration;

use crate::Context;
use crate::cli::{ApplyArgs, RunArgs};
use crate::config::SousConfig;
use crate::engine::{self, ExecuteOptions};
use crate::provider::builtin_registry;
use crate::resource::Catalog;
use crate::runlist::RunList;
use crate::{paths, ui};

/// Converge a run list; returns the process exit code
pub fn apply(ctx: &Context, config: &SousConfig, args: ApplyArgs) -> Result<u8> {
    let mut opts = execute_options(ctx, config, &args.run);
    opts.engine.dry_run = args.dry_run;
    opts.yes = args.yes;
    converge(config, &args.run, &opts)
}

/// Dry run of a run list; returns the process exit code
pub fn diff(ctx: &Context, config: &SousConfig, args: RunArgs) -> Result<u8> {
    let mut opts = execute_options(ctx, config, &args);
    opts.engine.dry_run = true;
    converge(config, &args, &opts)
}

/// Validate a run list; returns the process exit code
pub fn validate(ctx: &Context, config: &SousConfig, args: RunArgs) -> Result<u8> {
    let run_list = load_run_list(&args)?;
    let plan = Catalog::builtin().plan(&run_list);
    let opts = execute_options(ctx, config, &args);
    let engine = ConvergenceEngine::new(builtin_registry(config.paths.limits_dir()), opts.engine);
    let failures = engine.validate(&plan);

    if args.json {
        let json = serde_json::to_string_pretty(&failures)?;
        println!("{json}");
    } else if !ctx.quiet {
        for failure in &failures {
            let error = failure
                .outcome
                .error()
                .map_or_else(String::new, ToString::to_string);
            println!("  {} {} {}", "✗".red(), failure.key.bold(), error.red());
        }
        if failures.is_empty() {
            ui::success(&format!(
                "{} resources valid for {}",
                plan.len(),
                engine.options().platform
            ));
        } else {
            ui::error(&format!(
                "{} of {} resources invalid",
                failures.len(),
                plan.len()
            ));
        }
    }

    Ok(if failures.is_empty() { 0 } else { 1 })
}

fn converge(config: &SousConfig, args: &RunArgs, opts: &ExecuteOptions) -> Result<u8> {
    let run_list = load_run_list(args)?;
    if run_list.is_empty() {
        if !opts.quiet && !opts.json {
            ui::info("Run list is empty, nothing to converge");
        }
        return Ok(0);
    }

    let plan = Catalog::builtin().plan(&run_list);
    let limits_dir = config.paths.limits_dir();
    let Some(report) = engine::execute(&plan, || builtin_registry(limits_dir.clone()), opts)? else {
        return Ok(0);
    };

    finish(&report, opts)
}

fn finish(report: &RunReport, opts: &ExecuteOptions) -> Result<u8> {
    if opts.json {
        engine::print_json(report)?;
    }
    log::info!(
        "Run finished in {}ms: {:?}",
        report.duration().num_milliseconds(),
        report.summary()
    );
    Ok(report.exit_code())
}

fn load_run_list(args: &RunArgs) -> Result<RunList> {
    let path = paths::expand(&args.run_list.to_string_lossy());
    RunList::load(&path)
}

/// Merge command-line flags over the config file
fn execute_options(ctx: &Context, config: &SousConfig, args: &RunArgs) -> ExecuteOptions {
    ExecuteOptions {
        engine: engine_options(config, args, ctx.verbose > 0),
        yes: false,
        json: args.json,
        quiet: ctx.quiet,
        verbose: ctx.verbose > 0,
    }
}

fn engine_options(config: &SousConfig, args: &RunArgs, verbose: bool) -> EngineOptions {
    let platform = args
        .platform
        .map(Platform::from)
        .or(config.run.platform)
        .unwrap_or_else(platform::detect);

    EngineOptions {
        dry_run: false,
        jobs: args.jobs.map_or(config.run.jobs, usize::from),
        stop_on_failure: args.stop_on_failure || config.run.stop_on_failure,
        action_timeout: args
            .timeout
            .map(Duration::from_secs)
            .or_else(|| config.run.action_timeout()),
        platform,
        verbose,
    }
}
