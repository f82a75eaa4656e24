//! Human-readable terminal renderer.

use owo_colors::OwoColorize as _;
use provcheck_common::{Outcome, ScenarioReport, SuiteReport};

use crate::domain::{ScenarioMode, Suite};
use crate::output::OutputContext;

/// Renders harness results as human-readable terminal output using `OutputContext`.
pub struct HumanRenderer<'a> {
    ctx: &'a OutputContext,
}

impl<'a> HumanRenderer<'a> {
    /// Create a new `HumanRenderer` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }

    /// Render the CLI version information.
    pub fn render_version(&self, version: &str) {
        if self.ctx.quiet {
            return;
        }
        self.ctx.note(&format!("provcheck v{version}"));
    }

    /// Render a finished suite run. Failures are always shown, even when quiet.
    pub fn render_report(&self, report: &SuiteReport) {
        self.ctx.blank();
        self.ctx.header("Results:");
        for scenario in &report.scenarios {
            self.render_scenario(scenario);
        }
        let summary = format!("{} passed, {} failed", report.passed(), report.failed());
        if report.all_passed() {
            self.ctx.pass(&summary);
        } else {
            self.ctx.fail(&summary);
        }
    }

    fn render_scenario(&self, scenario: &ScenarioReport) {
        let took = format_duration(scenario.duration_ms);
        match &scenario.outcome {
            Outcome::Passed => {
                self.ctx.pass(&format!(
                    "{} {}",
                    scenario.scenario,
                    took.style(self.ctx.styles.muted)
                ));
            }
            Outcome::Failed {
                kind,
                message,
                mismatches,
            } => {
                self.ctx.fail(&format!(
                    "{} [{}] {}",
                    scenario.scenario.style(self.ctx.styles.emphasis),
                    kind.code().style(self.ctx.styles.for_kind(*kind)),
                    took.style(self.ctx.styles.muted)
                ));
                if mismatches.is_empty() {
                    for line in message.lines().take(20) {
                        self.ctx.detail(line);
                    }
                } else {
                    for m in mismatches {
                        self.ctx.detail(&format!("- {m}"));
                    }
                }
                if scenario.leaked {
                    let hint = match &scenario.kept_workdir {
                        Some(dir) => format!("run `terraform -chdir={} destroy`", dir.display()),
                        None => "run `provcheck destroy`".to_string(),
                    };
                    self.ctx.fail(&format!(
                        "{}: teardown failed, resources may remain; {hint}",
                        scenario.scenario
                    ));
                }
            }
        }
    }

    /// Render the scenarios of a validated suite.
    pub fn render_suite(&self, suite: &Suite) {
        self.ctx.pass(&format!(
            "suite is valid ({} scenario(s), max_parallel {})",
            suite.scenarios.len(),
            suite.max_parallel
        ));
        for s in &suite.scenarios {
            let mode = match s.mode {
                ScenarioMode::Apply => "apply",
                ScenarioMode::PlanOnly => "plan",
            };
            let negative = if s.expected.expects_failure() {
                " (expects rejection)"
            } else {
                ""
            };
            self.ctx.kv(
                &s.name,
                28,
                &format!("{mode:<5} {}{negative}", s.config_dir.display()),
            );
        }
    }

    /// Render a destroy sweep.
    pub fn render_destroy(&self, results: &[(String, bool)]) {
        let failed = results.iter().filter(|(_, ok)| !ok).count();
        if failed == 0 {
            self.ctx
                .pass(&format!("{} configuration(s) destroyed", results.len()));
        } else {
            self.ctx.fail(&format!(
                "{failed} of {} configuration(s) could not be destroyed",
                results.len()
            ));
        }
    }
}

/// `850ms`, `12.3s`, `4m 05s`.
#[must_use]
pub fn format_duration(ms: u64) -> String {
    match ms {
        0..1_000 => format!("{ms}ms"),
        1_000..60_000 => format!("{}.{}s", ms / 1_000, (ms % 1_000) / 100),
        _ => format!("{}m {:02}s", ms / 60_000, (ms % 60_000) / 1_000),
    }
}
