//! Progress indicators for convergence runs.
//!
//! [`RunProgress`] drives an `indicatif` bar from the engine's worker threads.

use colored::Colorize;
use declarative::{Outcome, ProgressCallback};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Progress bar fed by [`ProgressCallback`] events
pub struct RunProgress {
    bar: ProgressBar,
    verbose: bool,
}

impl RunProgress {
    /// Visible bar on stderr
    pub fn new(verbose: bool) -> Self {
        let bar = ProgressBar::new(0);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}")
        {
            bar.set_style(style.progress_chars("=>-"));
        }
        Self { bar, verbose }
    }

    /// Bar that never draws (quiet and JSON output)
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::hidden()),
            verbose: false,
        }
    }
}

impl ProgressCallback for RunProgress {
    fn on_run_start(&self, total: usize) {
        self.bar.set_length(total as u64);
    }

    fn on_resource_start(&self, key: &str) {
        self.bar.set_message(key.to_string());
    }

    fn on_resource_complete(&self, key: &str, outcome: &Outcome) {
        self.bar.inc(1);
        if outcome.is_failure() {
            self.bar.println(format!("  {} {}", "✗".red(), key));
        } else if self.verbose && outcome.is_change() {
            self.bar
                .println(format!("  {} {} {}", "✓".green(), key, outcome.label().dimmed()));
        }
    }

    fn on_run_complete(&self) {
        self.bar.finish_and_clear();
    }
}
