//! Terminal output for suite runs.
//!
//! Results go to stdout, failures to stderr so they are still visible with
//! `--quiet` or when stdout is piped into a report file.

pub mod human;
pub mod json;
pub mod progress;
pub mod reporter;
pub mod styles;

use console::Term;
use owo_colors::OwoColorize as _;

pub use human::HumanRenderer;
pub use reporter::TerminalReporter;
pub use styles::Styles;

/// Styling and verbosity shared by every renderer.
pub struct OutputContext {
    pub styles: Styles,
    /// Whether stdout is a terminal.
    pub is_tty: bool,
    /// Suppress everything except failures.
    pub quiet: bool,
}

impl OutputContext {
    /// Colors are used only on a terminal and never with `--no-color`
    /// (which clap also sets from `NO_COLOR`).
    #[must_use]
    pub fn new(no_color: bool, quiet: bool) -> Self {
        let is_tty = Term::stdout().is_term();
        let mut styles = Styles::default();
        if is_tty && !no_color {
            styles.colorize();
        }
        Self {
            styles,
            is_tty,
            quiet,
        }
    }

    /// Spinners only make sense on an interactive, non-quiet terminal.
    #[must_use]
    pub fn show_progress(&self) -> bool {
        self.is_tty && !self.quiet
    }

    // ── Line formatting ──────────────────────────────────────────────────────

    #[must_use]
    pub fn pass_line(&self, msg: &str) -> String {
        format!("  {} {msg}", "✓".style(self.styles.passed))
    }

    #[must_use]
    pub fn fail_line(&self, msg: &str) -> String {
        format!("  {} {msg}", "✗".style(self.styles.failed))
    }

    #[must_use]
    pub fn warn_line(&self, msg: &str) -> String {
        format!("  {} {msg}", "!".style(self.styles.warning))
    }

    #[must_use]
    pub fn step_line(&self, msg: &str) -> String {
        format!("  {} {msg}", "→".style(self.styles.step))
    }

    // ── Printing ─────────────────────────────────────────────────────────────

    pub fn pass(&self, msg: &str) {
        self.out(&self.pass_line(msg));
    }

    /// Never suppressed.
    pub fn fail(&self, msg: &str) {
        eprintln!("{}", self.fail_line(msg));
    }

    pub fn warn(&self, msg: &str) {
        self.out(&self.warn_line(msg));
    }

    pub fn note(&self, msg: &str) {
        self.out(&format!("  {msg}"));
    }

    pub fn header(&self, msg: &str) {
        self.out(&format!("  {}", msg.style(self.styles.header)));
    }

    /// Key in muted style, left-padded to `width`.
    pub fn kv(&self, key: &str, width: usize, value: &str) {
        self.out(&format!(
            "    {}  {value}",
            format!("{key:<width$}").style(self.styles.muted)
        ));
    }

    /// Indented continuation of a failure (mismatch, diagnostics line).
    /// Never suppressed.
    pub fn detail(&self, line: &str) {
        eprintln!("      {line}");
    }

    pub fn blank(&self) {
        if !self.quiet {
            println!();
        }
    }

    fn out(&self, line: &str) {
        if !self.quiet {
            println!("{line}");
        }
    }
}
