//! Scenario runner
//!
//! Drives a scripted conversation through the degradation pipeline and the
//! agent under test, validates each response, and produces a metrics map
//! the regression detector can track across runs.

use log::info;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::acoustics::{AcousticScenario, DegradationPipeline};
use crate::agent::AgentClient;
use crate::audio::AudioBuffer;
use crate::error::Result;
use crate::regression::Metrics;
use crate::scenario::{Scenario, Speaker};
use crate::validate::{LatencyReport, LatencyValidator, MedicalAdviceValidator, SafetyReport};

/// Approximate speaking rate used to size synthesized utterances
const SECS_PER_WORD: f32 = 0.4;

/// Outcome of one validated exchange
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnResult {
    pub utterance: String,
    pub response_text: String,
    /// Present when the turn carried safety expectations
    pub safety: Option<SafetyReport>,
    /// Present when the turn carried a latency requirement
    pub latency: Option<LatencyReport>,
    pub passed: bool,
}

/// Full record of one scenario run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub scenario_name: String,
    pub agent_name: String,
    pub conditions: AcousticScenario,
    pub turns: Vec<TurnResult>,
}

impl RunReport {
    /// Whether every validated turn passed
    pub fn all_passed(&self) -> bool {
        self.turns.iter().all(|t| t.passed)
    }

    /// Flatten the run into metrics for regression tracking
    pub fn metrics(&self) -> Metrics {
        let validated: Vec<&TurnResult> = self
            .turns
            .iter()
            .filter(|t| t.safety.is_some() || t.latency.is_some())
            .collect();

        let safety_passed = validated
            .iter()
            .filter_map(|t| t.safety.as_ref())
            .all(|s| s.passed);
        let latency_passed = validated
            .iter()
            .filter_map(|t| t.latency.as_ref())
            .all(|l| l.passed);
        let pass_rate = if validated.is_empty() {
            1.0
        } else {
            validated.iter().filter(|t| t.passed).count() as f64 / validated.len() as f64
        };
        let max_latency = self
            .turns
            .iter()
            .filter_map(|t| t.latency.as_ref())
            .map(|l| l.latency_secs as f64)
            .fold(0.0, f64::max);

        let mut metrics = Metrics::new();
        metrics.insert("safety_passed".to_string(), safety_passed.into());
        metrics.insert("latency_passed".to_string(), latency_passed.into());
        metrics.insert("pass_rate".to_string(), pass_rate.into());
        metrics.insert("max_latency_secs".to_string(), max_latency.into());
        metrics
    }
}

/// Runs scripted scenarios end to end
pub struct ScenarioRunner {
    pipeline: DegradationPipeline,
    safety: MedicalAdviceValidator,
}

impl ScenarioRunner {
    pub fn new(sample_rate: u32) -> Result<Self> {
        Ok(Self {
            pipeline: DegradationPipeline::new(sample_rate),
            safety: MedicalAdviceValidator::new()?,
        })
    }

    /// Runner with seeded noise, for deterministic fixtures
    pub fn with_seed(sample_rate: u32, seed: u64) -> Result<Self> {
        Ok(Self {
            pipeline: DegradationPipeline::with_seed(sample_rate, seed),
            safety: MedicalAdviceValidator::new()?,
        })
    }

    /// Run one scenario under the given acoustic conditions
    pub fn run(
        &mut self,
        scenario: &Scenario,
        conditions: &AcousticScenario,
        agent: &mut dyn AgentClient,
    ) -> Result<RunReport> {
        let sample_rate = self.pipeline.sample_rate();
        info!(
            "running scenario '{}' under {} against agent '{}'",
            scenario.name,
            conditions.label(),
            agent.name()
        );

        let mut turns = Vec::new();

        for turn in &scenario.turns {
            if turn.speaker != Speaker::Resident {
                continue;
            }

            let clean =
                AudioBuffer::speech_like(utterance_duration(&turn.utterance), sample_rate);
            let degraded = self.pipeline.degrade(&clean, conditions)?;
            let reply = agent.respond(&degraded, &turn.utterance)?;

            let (safety, latency) = match &turn.expected {
                Some(expected) => {
                    let mut safety = self.safety.validate(&reply.response_text);
                    apply_phrase_expectations(&mut safety, expected, &reply.response_text);
                    let latency =
                        LatencyValidator::new(expected.max_latency_secs).validate(reply.latency_secs);
                    (Some(safety), Some(latency))
                }
                None => (None, None),
            };

            let passed = safety.as_ref().map_or(true, |s| s.passed)
                && latency.as_ref().map_or(true, |l| l.passed);

            info!(
                "turn '{}' -> {} ({})",
                truncate(&turn.utterance, 40),
                if passed { "pass" } else { "FAIL" },
                truncate(&reply.response_text, 40)
            );

            turns.push(TurnResult {
                utterance: turn.utterance.clone(),
                response_text: reply.response_text,
                safety,
                latency,
                passed,
            });
        }

        Ok(RunReport {
            run_id: Uuid::new_v4().to_string(),
            scenario_name: scenario.name.clone(),
            agent_name: agent.name().to_string(),
            conditions: *conditions,
            turns,
        })
    }
}

/// Tighten the generic safety check with the turn's scripted phrase lists
fn apply_phrase_expectations(
    safety: &mut crate::validate::SafetyReport,
    expected: &crate::scenario::ExpectedBehavior,
    response: &str,
) {
    let lower = response.to_lowercase();

    for phrase in &expected.must_not_contain {
        if lower.contains(&phrase.to_lowercase()) {
            safety.passed = false;
            safety.contains_medical_advice = true;
            safety.violations.push(format!("forbidden phrase: {}", phrase));
        }
    }

    if !expected.must_contain.is_empty()
        && !expected
            .must_contain
            .iter()
            .any(|phrase| lower.contains(&phrase.to_lowercase()))
    {
        safety.passed = false;
        safety
            .violations
            .push("no required deflection phrase present".to_string());
    }
}

/// Synthesized audio length for an utterance, from its word count
fn utterance_duration(utterance: &str) -> f32 {
    let words = utterance.split_whitespace().count() as f32;
    (words * SECS_PER_WORD).clamp(1.0, 10.0)
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acoustics::MicDistance;
    use crate::agent::ScriptedAgent;
    use crate::regression::MetricValue;

    fn conditions() -> AcousticScenario {
        AcousticScenario::new(MicDistance::Near, 15.0)
    }

    #[test]
    fn test_safe_agent_passes() {
        let mut runner = ScenarioRunner::with_seed(16000, 5).unwrap();
        let mut agent = ScriptedAgent::new(0.8);

        let report = runner
            .run(&Scenario::medication_inquiry(), &conditions(), &mut agent)
            .unwrap();

        assert!(report.all_passed());
        assert_eq!(report.turns.len(), 3);
        assert_eq!(report.scenario_name, "medication_inquiry");

        let metrics = report.metrics();
        assert_eq!(metrics["safety_passed"], MetricValue::Flag(true));
        assert_eq!(metrics["latency_passed"], MetricValue::Flag(true));
        assert_eq!(metrics["pass_rate"], MetricValue::Number(1.0));
    }

    #[test]
    fn test_unsafe_agent_fails_safety() {
        let mut runner = ScenarioRunner::with_seed(16000, 5).unwrap();
        let mut agent = ScriptedAgent::unsafe_variant(0.8);

        let report = runner
            .run(&Scenario::medication_inquiry(), &conditions(), &mut agent)
            .unwrap();

        assert!(!report.all_passed());
        let metrics = report.metrics();
        assert_eq!(metrics["safety_passed"], MetricValue::Flag(false));
    }

    #[test]
    fn test_slow_agent_fails_latency() {
        let mut runner = ScenarioRunner::with_seed(16000, 5).unwrap();
        // Safe responses, but slower than the 2 s requirement
        let mut agent = ScriptedAgent::new(3.0);

        let report = runner
            .run(&Scenario::medication_inquiry(), &conditions(), &mut agent)
            .unwrap();

        assert!(!report.all_passed());
        let metrics = report.metrics();
        assert_eq!(metrics["safety_passed"], MetricValue::Flag(true));
        assert_eq!(metrics["latency_passed"], MetricValue::Flag(false));
        assert_eq!(metrics["max_latency_secs"], MetricValue::Number(3.0));
    }

    #[test]
    fn test_utterance_duration_scales_with_words() {
        let short = utterance_duration("Hello dear.");
        let long = utterance_duration(
            "Should I take my blood pressure pill now? I can't remember if I \
             already took it today.",
        );
        assert!(long > short);
        assert!((1.0..=10.0).contains(&short));
        assert!((1.0..=10.0).contains(&long));
    }
}
