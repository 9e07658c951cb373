//! Diff and report display - terminal UI for run reports

use colored::Colorize;
use declarative::{DiffKind, Outcome, ResourceReport, RunReport};
use std::collections::BTreeMap;

use crate::ui;

/// Resources a run changed (or would change in a dry run)
pub fn pending_changes(report: &RunReport) -> Vec<&ResourceReport> {
    report
        .resources
        .iter()
        .filter(|r| r.outcome.is_change())
        .collect()
}

/// Plain-text detail for an outcome: the diff, the error, or the skip reason
pub fn describe(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Unchanged => String::new(),
        Outcome::Created { diff } | Outcome::Updated { diff } | Outcome::Deleted { diff } => {
            let changes: Vec<String> = diff.changes.iter().map(ToString::to_string).collect();
            changes.join(", ")
        }
        Outcome::Failed { error } => match error.stderr() {
            Some(stderr) if !stderr.is_empty() => format!("{error}: {}", stderr.trim()),
            _ => error.to_string(),
        },
        Outcome::Skipped { reason } => reason.clone(),
    }
}

/// Colored single-character marker for an outcome
fn symbol(outcome: &Outcome) -> colored::ColoredString {
    match outcome {
        Outcome::Unchanged => "○".dimmed(),
        Outcome::Created { .. } => "+".green(),
        Outcome::Updated { diff } if diff.kind == DiffKind::Create => "+".green(),
        Outcome::Deleted { .. } => "-".red(),
        Outcome::Updated { diff } if diff.kind == DiffKind::Remove => "-".red(),
        Outcome::Updated { .. } => "~".yellow(),
        Outcome::Failed { .. } => "✗".red(),
        Outcome::Skipped { .. } => "⊘".dimmed(),
    }
}

/// Display the changes a dry run found, grouped by resource type
pub fn display_diff(report: &RunReport) {
    let changes = pending_changes(report);
    if changes.is_empty() {
        println!();
        println!("  {} No changes needed", "✓".green());
        return;
    }

    let mut by_type: BTreeMap<&str, Vec<&ResourceReport>> = BTreeMap::new();
    for resource in &changes {
        by_type
            .entry(resource.resource_type.as_str())
            .or_default()
            .push(resource);
    }

    println!();
    println!(
        "┌─ {} ─────────────────────────────────────────┐",
        "Convergence Diff".bold()
    );
    println!("│");

    for (resource_type, resources) in &by_type {
        println!("│ {}", resource_type.bold());
        for resource in resources {
            println!(
                "│   {} {:<30} {}",
                symbol(&resource.outcome),
                resource.identity,
                ui::truncate(&describe(&resource.outcome), 60).dimmed()
            );
        }
        println!("│");
    }

    println!("├─────────────────────────────────────────────────────┤");
    println!(
        "│ Summary: {} of {} resources would change",
        changes.len().to_string().bold(),
        report.resources.len()
    );
    println!("└─────────────────────────────────────────────────────┘");
}

/// Display validation and probe failures that happened before any change
pub fn display_failures(report: &RunReport) {
    let failures: Vec<_> = report.failures().collect();
    if failures.is_empty() {
        return;
    }

    println!();
    println!("  {} {} resources failed:", "✗".red(), failures.len());
    for resource in failures {
        println!(
            "    {} {}",
            resource.key.bold(),
            describe(&resource.outcome).red()
        );
    }
}

/// Display the outcome of every resource, then the summary
pub fn display_report(report: &RunReport, verbose: bool) {
    println!();
    for resource in &report.resources {
        if !verbose && matches!(resource.outcome, Outcome::Unchanged) {
            continue;
        }
        let action = resource.action.map_or("-", |a| a.as_str());
        let detail = describe(&resource.outcome);
        println!(
            "  {} {:<36} {:<8} {:<10} {}",
            symbol(&resource.outcome),
            resource.key,
            action,
            resource.outcome.label(),
            ui::format_duration_ms(resource.duration_ms).dimmed()
        );
        if !detail.is_empty() {
            ui::dim(&format!("    {detail}"));
        }
    }

    print_summary(report);
}

/// Print final summary
fn print_summary(report: &RunReport) {
    let summary = report.summary();
    let elapsed = report.duration().num_milliseconds().max(0) as u64;

    println!();
    if report.dry_run {
        println!("  {} Dry run - no changes made", "ℹ".blue());
    } else if report.is_success() {
        println!("  {} Converged successfully!", "✓".green().bold());
    } else {
        println!("  {} Converged with errors", "⚠".yellow().bold());
    }

    let verb = if report.dry_run { "would be" } else { "" };
    let line = |count: usize, what: &str| {
        if count > 0 {
            let what = if verb.is_empty() {
                what.to_string()
            } else {
                format!("{verb} {what}")
            };
            println!("    • {count} resources {what}");
        }
    };
    line(summary.created, "created");
    line(summary.updated, "updated");
    line(summary.deleted, "deleted");
    if summary.unchanged > 0 {
        println!("    • {} resources unchanged", summary.unchanged);
    }
    if summary.skipped > 0 {
        println!("    • {} resources skipped", summary.skipped);
    }
    if summary.failed > 0 {
        println!("    • {} {} failed", summary.failed, "resources".red());
    }
    ui::dim(&format!(
        "{} resources in {}",
        summary.total(),
        ui::format_duration_ms(elapsed)
    ));
}
