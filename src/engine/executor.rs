//! Run orchestration - preview, confirm, converge, report

use anyhow::{Context as AnyhowContext, Result};
use colored::Colorize;
use declarative::{ConvergenceEngine, ConvergencePlan, EngineOptions, NoProgress, ProviderRegistry, RunReport};

use crate::progress::RunProgress;
use crate::ui;

use super::differ::{display_diff, display_failures, display_report};

/// Options for one `apply` or `diff` invocation
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    pub engine: EngineOptions,
    /// Skip confirmation prompts
    pub yes: bool,
    /// Print the report as JSON instead of the terminal UI
    pub json: bool,
    pub quiet: bool,
    pub verbose: bool,
}

impl ExecuteOptions {
    fn interactive(&self) -> bool {
        !self.json && !self.quiet
    }

    fn progress(&self) -> RunProgress {
        if self.interactive() {
            RunProgress::new(self.verbose)
        } else {
            RunProgress::hidden()
        }
    }
}

/// Converge a plan.
///
/// A real run is previewed first with a dry run and needs confirmation
/// unless `yes` is set. Returns `None` when the user aborts.
pub fn execute(
    plan: &ConvergencePlan,
    registry: impl Fn() -> ProviderRegistry,
    opts: &ExecuteOptions,
) -> Result<Option<RunReport>> {
    if opts.engine.dry_run {
        let report = ConvergenceEngine::new(registry(), opts.engine.clone())
            .converge(plan, &opts.progress());
        if opts.interactive() {
            display_diff(&report);
            display_failures(&report);
        }
        return Ok(Some(report));
    }

    if !opts.yes && opts.interactive() {
        let preview_options = EngineOptions {
            dry_run: true,
            ..opts.engine.clone()
        };
        let preview = ConvergenceEngine::new(registry(), preview_options).converge(plan, &NoProgress);
        display_diff(&preview);
        display_failures(&preview);

        if preview.summary().total_changes() == 0 {
            return Ok(Some(preview));
        }

        if !confirm_proceed()? {
            println!();
            println!("  {} Aborted", "✗".red());
            return Ok(None);
        }
    }

    if !is_root() && opts.interactive() {
        ui::warn("Not running as root; package and system file changes will likely fail");
    }

    let report = ConvergenceEngine::new(registry(), opts.engine.clone()).converge(plan, &opts.progress());
    if opts.interactive() {
        display_report(&report, opts.verbose);
    }
    Ok(Some(report))
}

/// Print a report as pretty JSON on stdout
pub fn print_json(report: &RunReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialize run report")?;
    println!("{json}");
    Ok(())
}

/// Confirm with user
fn confirm_proceed() -> Result<bool> {
    use dialoguer::Confirm;

    let confirmed = Confirm::new()
        .with_prompt("Continue?")
        .default(true)
        .interact()?;

    Ok(confirmed)
}

/// Whether the process runs with root privileges
#[cfg(unix)]
fn is_root() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail
    unsafe { libc::geteuid() == 0 }
}

#[cfg(not(unix))]
fn is_root() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::builtin_registry;
    use crate::resource::Catalog;
    use crate::runlist::RunList;
    use declarative::{Outcome, Platform};
    use std::fs;
    use std::path::Path;

    fn options(dry_run: bool) -> ExecuteOptions {
        ExecuteOptions {
            engine: EngineOptions {
                dry_run,
                platform: Platform::Linux,
                ..EngineOptions::default()
            },
            yes: true,
            json: true,
            quiet: false,
            verbose: false,
        }
    }

    fn plan() -> ConvergencePlan {
        let run_list = RunList::parse(
            r#"
[[resource]]
type = "user_ulimit"
name = "tomcat"
filehandle_limit = 8192

[[resource]]
type = "user_ulimit"
name = "*"
core_limit = 0
"#,
        )
        .unwrap();
        Catalog::builtin().plan(&run_list)
    }

    fn run(dir: &Path, dry_run: bool) -> RunReport {
        execute(&plan(), || builtin_registry(dir.to_path_buf()), &options(dry_run))
            .unwrap()
            .unwrap()
    }

    #[test]
    fn test_dry_run_then_apply_then_noop() {
        let dir = tempfile::tempdir().unwrap();

        let preview = run(dir.path(), true);
        assert!(preview.dry_run);
        assert_eq!(preview.summary().updated, 2);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);

        let applied = run(dir.path(), false);
        assert_eq!(applied.summary().created, 2);
        assert!(dir.path().join("tomcat_limits.conf").exists());
        assert!(dir.path().join("00_all_limits.conf").exists());

        let again = run(dir.path(), false);
        assert_eq!(again.summary().unchanged, 2);
        assert_eq!(again.exit_code(), 0);
    }

    #[test]
    fn test_packages_without_provider_fail_validation() {
        let dir = tempfile::tempdir().unwrap();
        let run_list =
            RunList::parse("[[resource]]\ntype = \"pacman_package\"\nname = \"vim\"\n").unwrap();
        let report = execute(
            &Catalog::builtin().plan(&run_list),
            || builtin_registry(dir.path().to_path_buf()),
            &options(false),
        )
        .unwrap()
        .unwrap();

        assert_eq!(report.exit_code(), 1);
        let outcome = &report.resources[0].outcome;
        assert!(matches!(outcome, Outcome::Failed { .. }));
        assert_eq!(outcome.error().map(|e| e.kind()), Some("validation"));
    }

    #[test]
    fn test_report_serializes() {
        let dir = tempfile::tempdir().unwrap();
        let report = run(dir.path(), true);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["dry_run"], true);
        assert_eq!(json["resources"][0]["key"], "user_ulimit[tomcat]");
        assert_eq!(json["resources"][0]["outcome"], "updated");
    }
}
