//! Suite-level spinner using indicatif.
//!
//! One spinner covers the whole run; scenarios running in parallel print
//! their lines above it through [`TerminalReporter`](super::TerminalReporter).

#![allow(clippy::expect_used)] // Templates are compile-time constants

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", " "];

/// Spinner shown while a suite runs.
pub struct SuiteProgress {
    pb: ProgressBar,
}

impl SuiteProgress {
    /// Start ticking with `running N scenario(s)...`.
    ///
    /// # Panics
    ///
    /// Panics if the template string is invalid (it is a constant).
    #[must_use]
    pub fn start(scenarios: usize) -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .tick_strings(TICKS)
                .template("{spinner:.cyan} {msg} {elapsed:.dim}")
                .expect("valid template"),
        );
        pb.set_message(format!("running {scenarios} scenario(s)..."));
        pb.enable_steady_tick(Duration::from_millis(100));
        Self { pb }
    }

    #[must_use]
    pub fn bar(&self) -> &ProgressBar {
        &self.pb
    }

    /// Replace the spinner with `✓ summary` or `✗ summary` and the total time.
    pub fn finish(self, passed: bool, summary: &str) {
        let mark = if passed { "✓" } else { "✗" };
        self.pb.set_style(
            ProgressStyle::default_spinner()
                .template("{prefix} {msg} ({elapsed})")
                .expect("valid template"),
        );
        self.pb.set_prefix(mark);
        self.pb.finish_with_message(summary.to_string());
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.pb.is_finished()
    }
}
