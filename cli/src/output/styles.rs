//! Stylesheet for scenario results. Every style is plain until
//! [`Styles::colorize`] is called.

use owo_colors::Style;
use provcheck_common::FailureKind;

#[derive(Default, Clone)]
pub struct Styles {
    pub passed: Style,
    pub failed: Style,
    pub warning: Style,
    /// In-progress steps (`→ advanced: applying...`).
    pub step: Style,
    /// Durations, paths and other secondary text.
    pub muted: Style,
    pub emphasis: Style,
    pub header: Style,
    /// Failure codes such as `ASSERTION_FAILURE`.
    pub code: Style,
    /// Failures that may have left resources behind.
    pub leak: Style,
}

impl Styles {
    pub fn colorize(&mut self) {
        self.passed = Style::new().green();
        self.failed = Style::new().red();
        self.warning = Style::new().yellow();
        self.step = Style::new().blue();
        self.muted = Style::new().dimmed();
        self.emphasis = Style::new().bold();
        self.header = Style::new().bold().cyan();
        self.code = Style::new().magenta();
        self.leak = Style::new().bold().red();
    }

    /// Style for a failure code.
    #[must_use]
    pub fn for_kind(&self, kind: FailureKind) -> Style {
        match kind {
            FailureKind::Teardown => self.leak,
            _ => self.code,
        }
    }
}
