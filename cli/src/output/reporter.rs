//! `TerminalReporter` — Presentation-layer implementation of `ProgressReporter`.
//!
//! Application services emit scenario events through the port; this type
//! decides how they look. With a spinner attached, `step` updates the
//! spinner text and other lines are printed above it, so concurrent
//! scenarios do not garble the terminal. Everything is suppressed when quiet.

use indicatif::ProgressBar;

use crate::application::ports::ProgressReporter;
use crate::output::OutputContext;

pub struct TerminalReporter<'a> {
    ctx: &'a OutputContext,
    spinner: Option<&'a ProgressBar>,
}

impl<'a> TerminalReporter<'a> {
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx, spinner: None }
    }

    /// Route messages through `spinner`.
    #[must_use]
    pub fn with_spinner(mut self, spinner: &'a ProgressBar) -> Self {
        self.spinner = Some(spinner);
        self
    }

    fn emit(&self, line: String) {
        if self.ctx.quiet {
            return;
        }
        match self.spinner {
            Some(pb) => pb.println(line),
            None => println!("{line}"),
        }
    }
}

impl ProgressReporter for TerminalReporter<'_> {
    fn step(&self, message: &str) {
        match self.spinner {
            Some(pb) if !self.ctx.quiet => pb.set_message(message.to_string()),
            _ => self.emit(self.ctx.step_line(message)),
        }
    }

    fn success(&self, message: &str) {
        self.emit(self.ctx.pass_line(message));
    }

    fn warn(&self, message: &str) {
        self.emit(self.ctx.warn_line(message));
    }
}
