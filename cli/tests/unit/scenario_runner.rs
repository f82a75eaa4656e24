//! Unit tests for `run_scenario`: teardown guarantees, negative scenarios
//! and assertion reporting, all against in-memory adapters.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use provcheck_common::{
    FailureKind, InstanceVariables, Outcome, PlacementConstraint, ScenarioPhase, ScenarioReport,
};
use provcheck_cli::application::ports::{InstanceInspector, Provisioner};
use provcheck_cli::application::services::scenario_runner::{
    Harness, ScenarioContext, run_scenario,
};
use provcheck_cli::domain::{ExpectOverrides, PlanSummary, ScenarioConfig};

use crate::helpers::{PROJECT, ZONE, advanced_vars, plan_scenario, scenario, snapshot_for};
use crate::mocks::{
    ApplyBehavior, DestroyBehavior, FakeInspector, InPlaceWorkdirs, InspectBehavior, PlanBehavior,
    RecordingProvisioner, RecordingReporter, UnusedInspector,
};

async fn run<P: Provisioner, I: InstanceInspector>(
    provisioner: &P,
    inspector: &I,
    scenario: &ScenarioConfig,
    reporter: &RecordingReporter,
) -> ScenarioReport {
    let workdirs = InPlaceWorkdirs::default();
    let harness = Harness {
        provisioner,
        inspector,
        workdirs: &workdirs,
    };
    run_scenario(&harness, ScenarioContext { scenario, reporter }).await
}

fn failure_kind(report: &ScenarioReport) -> Option<FailureKind> {
    report.outcome.kind()
}

fn mismatch_fields(report: &ScenarioReport) -> Vec<String> {
    match &report.outcome {
        Outcome::Failed { mismatches, .. } => mismatches.iter().map(|m| m.field.clone()).collect(),
        Outcome::Passed => Vec::new(),
    }
}

fn negative(vars: InstanceVariables) -> ScenarioConfig {
    scenario(
        "confidential-n1-rejected",
        vars,
        &ExpectOverrides {
            apply_error: Some(vec!["n2d".into(), "n2".into(), "e2".into()]),
            ..ExpectOverrides::default()
        },
    )
}

const CONFIDENTIAL_DIAGNOSTICS: &str = "Error: Invalid value for variable\n\n\
    Confidential VMs require a machine type from the n2d, n2, or e2 families.";

// ── Happy path ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_advanced_scenario_passes_and_destroys_once() {
    let vars = advanced_vars();
    let provisioner = RecordingProvisioner::default();
    let inspector = FakeInspector::returning(snapshot_for(&vars));
    let reporter = RecordingReporter::default();
    let sc = scenario("advanced", vars, &ExpectOverrides::default());

    let report = run(&provisioner, &inspector, &sc, &reporter).await;

    assert!(report.outcome.is_passed(), "got: {:?}", report.outcome);
    assert_eq!(provisioner.applies(), 1);
    assert_eq!(provisioner.destroys(), 1);
    assert!(report.destroyed);
    assert!(!report.leaked);
    assert_eq!(
        report.phases,
        vec![
            ScenarioPhase::Init,
            ScenarioPhase::Applying,
            ScenarioPhase::Applied,
            ScenarioPhase::Inspecting,
            ScenarioPhase::Asserting,
            ScenarioPhase::Destroying,
            ScenarioPhase::Done,
        ]
    );
    assert_eq!(
        inspector.lookups(),
        vec![(
            PROJECT.to_string(),
            ZONE.to_string(),
            "test-advanced-instance".to_string()
        )]
    );
}

#[tokio::test]
async fn test_simple_scenario_skips_unset_checks() {
    let vars = InstanceVariables::named("test-simple-instance");
    let provisioner = RecordingProvisioner::default();
    // No IAP setting: an external address is neither required nor forbidden.
    let inspector = FakeInspector::returning(snapshot_for(&vars));
    let reporter = RecordingReporter::default();
    let sc = scenario("simple", vars, &ExpectOverrides::default());

    let report = run(&provisioner, &inspector, &sc, &reporter).await;

    assert!(report.outcome.is_passed(), "got: {:?}", report.outcome);
    assert_eq!(provisioner.destroys(), 1);
}

#[tokio::test]
async fn test_already_gone_at_teardown_warns_but_passes() {
    let vars = InstanceVariables::named("vm-gone");
    let provisioner = RecordingProvisioner {
        destroy: DestroyBehavior::AlreadyGone,
        ..RecordingProvisioner::default()
    };
    let inspector = FakeInspector::returning(snapshot_for(&vars));
    let reporter = RecordingReporter::default();
    let sc = scenario("gone", vars, &ExpectOverrides::default());

    let report = run(&provisioner, &inspector, &sc, &reporter).await;

    assert!(report.outcome.is_passed());
    assert!(
        reporter.warnings().iter().any(|w| w.contains("already gone")),
        "got: {:?}",
        reporter.warnings()
    );
}

// ── Assertion failures still tear down ───────────────────────────────────────

#[tokio::test]
async fn test_external_address_with_iap_fails_and_destroys() {
    let vars = advanced_vars();
    let mut snapshot = snapshot_for(&vars);
    snapshot.external_address = Some("35.9.9.9".into());
    let provisioner = RecordingProvisioner::default();
    let inspector = FakeInspector::returning(snapshot);
    let reporter = RecordingReporter::default();
    let sc = scenario("advanced", vars, &ExpectOverrides::default());

    let report = run(&provisioner, &inspector, &sc, &reporter).await;

    assert_eq!(failure_kind(&report), Some(FailureKind::Assertion));
    assert_eq!(mismatch_fields(&report), vec!["external_address".to_string()]);
    assert_eq!(provisioner.destroys(), 1);
    assert!(report.destroyed);
    assert_eq!(report.phases.last(), Some(&ScenarioPhase::Failed));
    assert!(report.phases.contains(&ScenarioPhase::Destroying));
}

#[tokio::test]
async fn test_every_mismatch_is_reported() {
    let vars = advanced_vars();
    let mut snapshot = snapshot_for(&vars);
    snapshot.security_flags.vtpm = false;
    snapshot.security_flags.confidential_compute = false;
    snapshot.placement_constraints = vec![PlacementConstraint::node_groups(["other-group"])];
    let provisioner = RecordingProvisioner::default();
    let inspector = FakeInspector::returning(snapshot);
    let reporter = RecordingReporter::default();
    let sc = scenario("advanced", vars, &ExpectOverrides::default());

    let report = run(&provisioner, &inspector, &sc, &reporter).await;

    let fields = mismatch_fields(&report);
    assert!(fields.contains(&"security.vtpm".to_string()), "got: {fields:?}");
    assert!(fields.contains(&"security.confidential_compute".to_string()));
    assert!(fields.contains(&"placement_constraints".to_string()));
    assert_eq!(provisioner.destroys(), 1);
}

#[tokio::test]
async fn test_inspection_failure_still_destroys() {
    let provisioner = RecordingProvisioner::default();
    let inspector = FakeInspector::new(InspectBehavior::NotFound);
    let reporter = RecordingReporter::default();
    let sc = scenario("lost", advanced_vars(), &ExpectOverrides::default());

    let report = run(&provisioner, &inspector, &sc, &reporter).await;

    assert_eq!(failure_kind(&report), Some(FailureKind::NotFound));
    assert_eq!(provisioner.destroys(), 1);
    assert!(!report.phases.contains(&ScenarioPhase::Asserting));
}

#[tokio::test]
async fn test_auth_failure_still_destroys() {
    let provisioner = RecordingProvisioner::default();
    let inspector = FakeInspector::new(InspectBehavior::Auth);
    let reporter = RecordingReporter::default();
    let sc = scenario("no-token", advanced_vars(), &ExpectOverrides::default());

    let report = run(&provisioner, &inspector, &sc, &reporter).await;

    assert_eq!(failure_kind(&report), Some(FailureKind::Auth));
    assert_eq!(provisioner.destroys(), 1);
}

#[tokio::test]
async fn test_inspects_name_reported_by_outputs() {
    let vars = InstanceVariables::named("requested-name");
    let mut outputs = crate::helpers::outputs_for(&vars);
    outputs
        .outputs
        .insert("vm_name".into(), "actual-name".into());
    let provisioner = RecordingProvisioner::with_apply(ApplyBehavior::Outputs(outputs));
    let inspector = FakeInspector::new(InspectBehavior::NotFound);
    let reporter = RecordingReporter::default();
    let sc = scenario("renamed", vars, &ExpectOverrides::default());

    let _ = run(&provisioner, &inspector, &sc, &reporter).await;

    assert_eq!(inspector.lookups()[0].2, "actual-name");
}

#[tokio::test]
async fn test_missing_internal_ip_output_fails_and_tears_down() {
    let vars = InstanceVariables::named("no-ip");
    let mut outputs = crate::helpers::outputs_for(&vars);
    outputs.outputs.remove("vm_internal_ip");
    let provisioner = RecordingProvisioner::with_apply(ApplyBehavior::Outputs(outputs));
    let reporter = RecordingReporter::default();
    let sc = scenario("no-ip", vars, &ExpectOverrides::default());

    let report = run(&provisioner, &UnusedInspector, &sc, &reporter).await;

    assert_eq!(failure_kind(&report), Some(FailureKind::OutputNotFound));
    assert_eq!(provisioner.destroys(), 1);
    assert!(!report.phases.contains(&ScenarioPhase::Inspecting));
}

// ── Apply failures ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_apply_timeout_triggers_teardown() {
    let provisioner = RecordingProvisioner::with_apply(ApplyBehavior::TimeOut);
    let reporter = RecordingReporter::default();
    let sc = scenario("slow", advanced_vars(), &ExpectOverrides::default());

    let report = run(&provisioner, &UnusedInspector, &sc, &reporter).await;

    assert_eq!(failure_kind(&report), Some(FailureKind::Timeout));
    assert_eq!(provisioner.destroys(), 1);
    assert!(report.destroyed);
    assert!(!report.phases.contains(&ScenarioPhase::Applied));
}

#[tokio::test]
async fn test_rejected_apply_has_nothing_to_destroy() {
    let provisioner =
        RecordingProvisioner::with_apply(ApplyBehavior::Reject("Error: quota exceeded".into()));
    let reporter = RecordingReporter::default();
    let sc = scenario("quota", advanced_vars(), &ExpectOverrides::default());

    let report = run(&provisioner, &UnusedInspector, &sc, &reporter).await;

    assert_eq!(failure_kind(&report), Some(FailureKind::Apply));
    assert_eq!(provisioner.destroys(), 0);
    assert!(!report.destroyed);
    match &report.outcome {
        Outcome::Failed { message, .. } => assert!(message.contains("quota exceeded")),
        Outcome::Passed => panic!("expected failure"),
    }
}

// ── Negative scenarios ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_confidential_n1_rejection_passes() {
    let vars = InstanceVariables {
        machine_type: Some("n1-standard-1".into()),
        enable_confidential_vm: Some(true),
        ..InstanceVariables::named("test-confidential-n1")
    };
    let provisioner =
        RecordingProvisioner::with_apply(ApplyBehavior::Reject(CONFIDENTIAL_DIAGNOSTICS.into()));
    let reporter = RecordingReporter::default();

    let report = run(&provisioner, &UnusedInspector, &negative(vars), &reporter).await;

    assert!(report.outcome.is_passed(), "got: {:?}", report.outcome);
    assert_eq!(provisioner.destroys(), 0);
    assert_eq!(
        report.phases,
        vec![
            ScenarioPhase::Init,
            ScenarioPhase::Applying,
            ScenarioPhase::Asserting,
            ScenarioPhase::Done,
        ]
    );
}

#[tokio::test]
async fn test_rejection_with_wrong_diagnostics_fails() {
    let provisioner =
        RecordingProvisioner::with_apply(ApplyBehavior::Reject("Error: zone does not exist".into()));
    let reporter = RecordingReporter::default();
    let sc = negative(InstanceVariables::named("test-confidential-n1"));

    let report = run(&provisioner, &UnusedInspector, &sc, &reporter).await;

    assert_eq!(failure_kind(&report), Some(FailureKind::Assertion));
    assert_eq!(mismatch_fields(&report).len(), 3);
}

#[tokio::test]
async fn test_unexpected_success_fails_and_destroys() {
    // The supported family converges, which a negative scenario must flag.
    let vars = InstanceVariables {
        machine_type: Some("n2-standard-4".into()),
        enable_confidential_vm: Some(true),
        ..InstanceVariables::named("test-confidential-n2")
    };
    let provisioner = RecordingProvisioner::default();
    let reporter = RecordingReporter::default();

    let report = run(&provisioner, &UnusedInspector, &negative(vars), &reporter).await;

    assert_eq!(failure_kind(&report), Some(FailureKind::Assertion));
    assert_eq!(mismatch_fields(&report), vec!["apply_error".to_string()]);
    assert_eq!(provisioner.destroys(), 1);
}

#[tokio::test]
async fn test_confidential_n2_positive_scenario_passes() {
    let vars = InstanceVariables {
        machine_type: Some("n2-standard-4".into()),
        enable_confidential_vm: Some(true),
        ..InstanceVariables::named("test-confidential-n2")
    };
    let provisioner = RecordingProvisioner::default();
    let inspector = FakeInspector::returning(snapshot_for(&vars));
    let reporter = RecordingReporter::default();
    let sc = scenario("confidential-n2", vars, &ExpectOverrides::default());

    let report = run(&provisioner, &inspector, &sc, &reporter).await;

    assert!(report.outcome.is_passed(), "got: {:?}", report.outcome);
    assert_eq!(provisioner.destroys(), 1);
}

// ── Teardown failures ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_teardown_failure_after_pass_is_reported() {
    let vars = advanced_vars();
    let provisioner = RecordingProvisioner {
        destroy: DestroyBehavior::Fail,
        ..RecordingProvisioner::default()
    };
    let inspector = FakeInspector::returning(snapshot_for(&vars));
    let reporter = RecordingReporter::default();
    let sc = scenario("stuck", vars, &ExpectOverrides::default());

    let report = run(&provisioner, &inspector, &sc, &reporter).await;

    assert_eq!(failure_kind(&report), Some(FailureKind::Teardown));
    assert!(report.leaked);
    assert_eq!(provisioner.destroys(), 1);
    assert_eq!(report.kept_workdir.as_ref(), Some(&sc.config_dir));
    assert!(
        reporter.warnings().iter().any(|w| w.contains("state kept in")),
        "got: {:?}",
        reporter.warnings()
    );
}

#[tokio::test]
async fn test_clean_teardown_keeps_no_workdir() {
    let vars = advanced_vars();
    let provisioner = RecordingProvisioner::default();
    let inspector = FakeInspector::returning(snapshot_for(&vars));
    let reporter = RecordingReporter::default();
    let sc = scenario("tidy", vars, &ExpectOverrides::default());

    let report = run(&provisioner, &inspector, &sc, &reporter).await;

    assert!(report.outcome.is_passed());
    assert!(!report.leaked);
    assert!(report.kept_workdir.is_none());
}

#[tokio::test]
async fn test_teardown_failure_keeps_primary_error() {
    let provisioner = RecordingProvisioner {
        destroy: DestroyBehavior::Fail,
        ..RecordingProvisioner::default()
    };
    let inspector = FakeInspector::new(InspectBehavior::NotFound);
    let reporter = RecordingReporter::default();
    let sc = scenario("double-fault", advanced_vars(), &ExpectOverrides::default());

    let report = run(&provisioner, &inspector, &sc, &reporter).await;

    assert_eq!(failure_kind(&report), Some(FailureKind::NotFound));
    assert!(report.leaked);
    assert!(
        reporter.warnings().iter().any(|w| w.contains("teardown failed")),
        "got: {:?}",
        reporter.warnings()
    );
}

// ── Plan-only ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_plan_only_never_applies_or_destroys() {
    let provisioner = RecordingProvisioner::default();
    let reporter = RecordingReporter::default();
    let sc = plan_scenario("plan", advanced_vars(), &ExpectOverrides::default());

    let report = run(&provisioner, &UnusedInspector, &sc, &reporter).await;

    assert!(report.outcome.is_passed(), "got: {:?}", report.outcome);
    assert_eq!(provisioner.applies(), 0);
    assert_eq!(provisioner.destroys(), 0);
    assert!(!report.destroyed);
    assert_eq!(
        report.phases,
        vec![ScenarioPhase::Init, ScenarioPhase::Planning, ScenarioPhase::Done]
    );
}

#[tokio::test]
async fn test_plan_only_negative_scenario() {
    let provisioner = RecordingProvisioner {
        plan: PlanBehavior::Reject(CONFIDENTIAL_DIAGNOSTICS.into()),
        ..RecordingProvisioner::default()
    };
    let reporter = RecordingReporter::default();
    let expect = ExpectOverrides {
        apply_error: Some(vec!["n2d".into()]),
        ..ExpectOverrides::default()
    };
    let sc = plan_scenario("plan-negative", InstanceVariables::named("vm"), &expect);

    let report = run(&provisioner, &UnusedInspector, &sc, &reporter).await;

    assert!(report.outcome.is_passed(), "got: {:?}", report.outcome);
    assert_eq!(provisioner.applies(), 0);
}

#[tokio::test]
async fn test_plan_only_unexpected_success_fails() {
    let provisioner = RecordingProvisioner {
        plan: PlanBehavior::Summary(PlanSummary {
            add: 1,
            change: 0,
            destroy: 0,
        }),
        ..RecordingProvisioner::default()
    };
    let reporter = RecordingReporter::default();
    let expect = ExpectOverrides {
        apply_error: Some(vec!["n2d".into()]),
        ..ExpectOverrides::default()
    };
    let sc = plan_scenario("plan-negative", InstanceVariables::named("vm"), &expect);

    let report = run(&provisioner, &UnusedInspector, &sc, &reporter).await;

    assert_eq!(failure_kind(&report), Some(FailureKind::Assertion));
    match &report.outcome {
        Outcome::Failed { mismatches, .. } => {
            assert!(mismatches[0].observed.contains("1 to add"));
        }
        Outcome::Passed => panic!("expected failure"),
    }
}

#[tokio::test]
async fn test_apply_scenario_without_target_is_setup_error() {
    let provisioner = RecordingProvisioner::default();
    let reporter = RecordingReporter::default();
    let mut sc = scenario("no-target", advanced_vars(), &ExpectOverrides::default());
    sc.target = None;

    let report = run(&provisioner, &UnusedInspector, &sc, &reporter).await;

    assert_eq!(failure_kind(&report), Some(FailureKind::Setup));
    assert_eq!(provisioner.applies(), 0);
    assert_eq!(
        report.phases,
        vec![ScenarioPhase::Init, ScenarioPhase::Failed]
    );
}
