//! CLI command implementations

use std::path::Path;

use log::info;

use crate::acoustics::{AcousticScenario, DegradationPipeline};
use crate::agent::{AgentClient, ScriptedAgent};
use crate::audio::{export_wav, import_wav, AudioBuffer, DEFAULT_SAMPLE_RATE};
use crate::error::{CarebenchError, Result};
use crate::harness::ScenarioRunner;
use crate::regression::RegressionDetector;
use crate::scenario::Scenario;

/// Simulated latency for the scripted stand-in agent
const SCRIPTED_AGENT_LATENCY_SECS: f32 = 0.8;

/// Generate a speech-like test utterance.
pub fn generate(output: &Path, duration: f32) -> Result<()> {
    info!("generating {:.1}s speech-like utterance", duration);

    let buffer = AudioBuffer::speech_like(duration, DEFAULT_SAMPLE_RATE);
    export_wav(&buffer, output)?;

    println!("Wrote {} ({:.1}s, {} Hz)", output.display(), buffer.duration(), buffer.sample_rate());

    Ok(())
}

/// Degrade a WAV file through the pipeline.
pub fn degrade(
    input: &Path,
    output: &Path,
    distance: f32,
    snr: f32,
    seed: Option<u64>,
) -> Result<()> {
    let clean = import_wav(input)?;
    info!(
        "degrading {} ({:.1}s at {} Hz)",
        input.display(),
        clean.duration(),
        clean.sample_rate()
    );

    let scenario = AcousticScenario::from_meters(distance, snr)?;
    let mut pipeline = match seed {
        Some(seed) => DegradationPipeline::with_seed(clean.sample_rate(), seed),
        None => DegradationPipeline::new(clean.sample_rate()),
    };

    let degraded = pipeline.degrade(&clean, &scenario)?;
    export_wav(&degraded, output)?;

    println!(
        "Degraded under {}: {} -> {}",
        scenario.label(),
        input.display(),
        output.display()
    );

    Ok(())
}

/// Run a scripted scenario end to end with regression tracking.
#[allow(clippy::too_many_arguments)]
pub fn run(
    scenario_name: &str,
    distance: f32,
    snr: f32,
    seed: Option<u64>,
    baseline_dir: &Path,
    update_baseline: bool,
    mut agent: Box<dyn AgentClient>,
) -> Result<()> {
    let scenario =
        Scenario::by_name(scenario_name).ok_or_else(|| CarebenchError::InvalidParameter {
            param: "scenario".to_string(),
            value: scenario_name.to_string(),
            expected: "a built-in scenario name (medication_inquiry)".to_string(),
        })?;
    let conditions = AcousticScenario::from_meters(distance, snr)?;

    let mut runner = match seed {
        Some(seed) => ScenarioRunner::with_seed(DEFAULT_SAMPLE_RATE, seed)?,
        None => ScenarioRunner::new(DEFAULT_SAMPLE_RATE)?,
    };

    let report = runner.run(&scenario, &conditions, agent.as_mut())?;

    println!(
        "Run {} — scenario '{}' under {} against agent '{}'",
        report.run_id, report.scenario_name, conditions.label(), report.agent_name
    );
    for turn in &report.turns {
        let status = if turn.passed { "pass" } else { "FAIL" };
        println!("  [{}] {}", status, turn.utterance);
        if let Some(safety) = &turn.safety {
            for violation in &safety.violations {
                println!("        violation: {}", violation);
            }
        }
    }

    let test_name = format!("{}_{}", report.scenario_name, conditions.label());
    let detector = RegressionDetector::new(baseline_dir)?;
    let metrics = report.metrics();

    if update_baseline {
        detector.save_baseline(&test_name, &metrics)?;
        println!("Baseline updated: {}", test_name);
        return Ok(());
    }

    let outcome = detector.detect(&test_name, &metrics)?;
    if let Some(note) = &outcome.note {
        println!("{}", note);
    }
    for (name, cmp) in &outcome.comparison {
        println!(
            "  {}: baseline {:?} -> current {:?}{}",
            name,
            cmp.baseline,
            cmp.current,
            if cmp.regressed { "  REGRESSED" } else { "" }
        );
    }

    if outcome.regression_detected {
        println!(
            "Regression detected in: {}",
            outcome.failing_metrics.join(", ")
        );
    } else {
        println!("No regression detected");
    }

    Ok(())
}

/// Build the agent client for a run.
pub fn scripted_agent() -> Box<dyn AgentClient> {
    Box::new(ScriptedAgent::new(SCRIPTED_AGENT_LATENCY_SECS))
}

/// List stored regression baselines.
pub fn list_baselines(baseline_dir: &Path) -> Result<()> {
    let detector = RegressionDetector::new(baseline_dir)?;
    let mut names = detector.list_baselines();
    names.sort();

    if names.is_empty() {
        println!("No baselines in {}", baseline_dir.display());
    } else {
        for name in names {
            println!("{}", name);
        }
    }

    Ok(())
}
