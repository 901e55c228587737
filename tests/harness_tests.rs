//! Integration tests for the scenario harness and regression tracking

use carebench::acoustics::{AcousticScenario, MicDistance};
use carebench::agent::ScriptedAgent;
use carebench::harness::{RunReport, ScenarioRunner};
use carebench::regression::{MetricValue, RegressionDetector};
use carebench::scenario::Scenario;

fn run_with(agent: &mut ScriptedAgent) -> RunReport {
    let mut runner = ScenarioRunner::with_seed(16000, 9).unwrap();
    let conditions = AcousticScenario::new(MicDistance::Near, 15.0);
    runner
        .run(&Scenario::medication_inquiry(), &conditions, agent)
        .unwrap()
}

#[test]
fn test_safety_regression_detected_across_runs() {
    let dir = tempfile::tempdir().unwrap();
    let detector = RegressionDetector::new(dir.path()).unwrap();

    // A validated good run establishes the baseline
    let good = run_with(&mut ScriptedAgent::new(0.8));
    assert!(good.all_passed());
    let test_name = format!("{}_{}", good.scenario_name, good.conditions.label());
    detector.save_baseline(&test_name, &good.metrics()).unwrap();

    // A later build that starts giving medical advice must regress
    let bad = run_with(&mut ScriptedAgent::unsafe_variant(0.8));
    assert!(!bad.all_passed());

    let outcome = detector.detect(&test_name, &bad.metrics()).unwrap();
    assert!(outcome.regression_detected);
    assert!(outcome
        .failing_metrics
        .iter()
        .any(|m| m == "safety_passed"));
}

#[test]
fn test_identical_runs_do_not_regress() {
    let dir = tempfile::tempdir().unwrap();
    let detector = RegressionDetector::new(dir.path()).unwrap();

    let first = run_with(&mut ScriptedAgent::new(0.8));
    let test_name = format!("{}_{}", first.scenario_name, first.conditions.label());

    // First detect adopts the baseline, second compares against it
    let adopted = detector.detect(&test_name, &first.metrics()).unwrap();
    assert!(!adopted.regression_detected);
    assert!(adopted.note.is_some());

    let second = run_with(&mut ScriptedAgent::new(0.8));
    let outcome = detector.detect(&test_name, &second.metrics()).unwrap();
    assert!(!outcome.regression_detected);
    assert!(outcome.note.is_none());
}

#[test]
fn test_run_report_metrics_shape() {
    let report = run_with(&mut ScriptedAgent::new(0.8));
    let metrics = report.metrics();

    assert_eq!(metrics["safety_passed"], MetricValue::Flag(true));
    assert_eq!(metrics["latency_passed"], MetricValue::Flag(true));
    assert_eq!(metrics["pass_rate"], MetricValue::Number(1.0));
    assert!(matches!(
        metrics["max_latency_secs"],
        MetricValue::Number(l) if l > 0.0
    ));
}

#[test]
fn test_run_report_serializes() {
    let report = run_with(&mut ScriptedAgent::new(0.8));

    let json = serde_json::to_string_pretty(&report).unwrap();
    let restored: RunReport = serde_json::from_str(&json).unwrap();

    assert_eq!(restored.run_id, report.run_id);
    assert_eq!(restored.turns.len(), report.turns.len());
    assert_eq!(restored.scenario_name, "medication_inquiry");
}

#[test]
fn test_degraded_conditions_still_validate() {
    // Harder acoustics (far mic, low SNR) exercise the same safety checks
    let mut runner = ScenarioRunner::with_seed(16000, 9).unwrap();
    let conditions = AcousticScenario::new(MicDistance::Far, 10.0);

    let report = runner
        .run(
            &Scenario::medication_inquiry(),
            &conditions,
            &mut ScriptedAgent::new(0.8),
        )
        .unwrap();

    assert!(report.all_passed());
    assert_eq!(report.conditions.label(), "3m_10db");
}
