//! Regression detection
//!
//! Tracks run metrics over time and compares them against JSON baselines.
//! A baseline is saved from a known-good run; later runs are compared
//! metric by metric with tolerances that absorb normal variance.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::error::Result;

/// Latency may grow this much over baseline before it counts as a
/// regression (network variance)
const LATENCY_TOLERANCE: f64 = 1.5;

/// Rates and scores may drop to this fraction of baseline
const RATE_TOLERANCE: f64 = 0.9;

/// A single tracked metric value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Flag(bool),
    Number(f64),
}

impl From<bool> for MetricValue {
    fn from(v: bool) -> Self {
        MetricValue::Flag(v)
    }
}

impl From<f64> for MetricValue {
    fn from(v: f64) -> Self {
        MetricValue::Number(v)
    }
}

/// Metrics keyed by name
pub type Metrics = BTreeMap<String, MetricValue>;

/// A named, timestamped snapshot of metric values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Baseline {
    pub test_name: String,
    pub timestamp: DateTime<Utc>,
    pub metrics: Metrics,
    /// Commit the baseline was recorded at, from `GIT_COMMIT` if set
    pub git_commit: String,
}

/// Side-by-side comparison for one metric
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricComparison {
    pub baseline: MetricValue,
    pub current: MetricValue,
    pub regressed: bool,
}

/// Result of comparing a run against its baseline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionOutcome {
    pub regression_detected: bool,
    pub failing_metrics: Vec<String>,
    pub comparison: BTreeMap<String, MetricComparison>,
    /// Set when no baseline existed and the current run was adopted
    pub note: Option<String>,
}

/// Tracks metrics over time against baselines stored as JSON files
#[derive(Debug, Clone)]
pub struct RegressionDetector {
    baseline_dir: PathBuf,
}

impl RegressionDetector {
    /// Create a detector rooted at the given baseline directory
    pub fn new(baseline_dir: &Path) -> Result<Self> {
        fs::create_dir_all(baseline_dir)?;
        Ok(Self {
            baseline_dir: baseline_dir.to_path_buf(),
        })
    }

    fn baseline_path(&self, test_name: &str) -> PathBuf {
        self.baseline_dir
            .join(format!("{}_baseline.json", test_name))
    }

    /// Save current metrics as the new baseline
    ///
    /// Run this from a validated build; every later run is judged against
    /// it.
    pub fn save_baseline(&self, test_name: &str, metrics: &Metrics) -> Result<()> {
        let baseline = Baseline {
            test_name: test_name.to_string(),
            timestamp: Utc::now(),
            metrics: metrics.clone(),
            git_commit: std::env::var("GIT_COMMIT").unwrap_or_else(|_| "unknown".to_string()),
        };

        let path = self.baseline_path(test_name);
        let content = serde_json::to_string_pretty(&baseline)?;
        fs::write(&path, content)?;
        info!("saved baseline: {}", path.display());

        Ok(())
    }

    /// Load the baseline for a test, if one exists
    pub fn load_baseline(&self, test_name: &str) -> Result<Option<Baseline>> {
        let path = self.baseline_path(test_name);
        if !path.exists() {
            warn!("no baseline found for {}", test_name);
            return Ok(None);
        }

        let content = fs::read_to_string(&path)?;
        let baseline: Baseline = serde_json::from_str(&content)?;
        Ok(Some(baseline))
    }

    /// Names of all stored baselines
    pub fn list_baselines(&self) -> Vec<String> {
        WalkDir::new(&self.baseline_dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter_map(|e| {
                e.file_name()
                    .to_str()
                    .and_then(|n| n.strip_suffix("_baseline.json"))
                    .map(|n| n.to_string())
            })
            .collect()
    }

    /// Compare current metrics against the baseline
    ///
    /// With no baseline on record, the current metrics are adopted as the
    /// baseline and no regression is reported.
    pub fn detect(&self, test_name: &str, current: &Metrics) -> Result<RegressionOutcome> {
        let baseline = match self.load_baseline(test_name)? {
            Some(baseline) => baseline,
            None => {
                self.save_baseline(test_name, current)?;
                return Ok(RegressionOutcome {
                    regression_detected: false,
                    failing_metrics: Vec::new(),
                    comparison: BTreeMap::new(),
                    note: Some("no baseline found, saved current run as baseline".to_string()),
                });
            }
        };

        let mut failing_metrics = Vec::new();
        let mut comparison = BTreeMap::new();

        for (name, &current_value) in current {
            let Some(&baseline_value) = baseline.metrics.get(name) else {
                // New metric with no history
                continue;
            };

            let regressed = metric_regressed(name, baseline_value, current_value);
            comparison.insert(
                name.clone(),
                MetricComparison {
                    baseline: baseline_value,
                    current: current_value,
                    regressed,
                },
            );

            if regressed {
                failing_metrics.push(name.clone());
            }
        }

        Ok(RegressionOutcome {
            regression_detected: !failing_metrics.is_empty(),
            failing_metrics,
            comparison,
            note: None,
        })
    }
}

/// Per-metric regression rule
///
/// Pass/fail flags regress when they flip to false. Latencies regress when
/// they grow beyond tolerance; every other numeric metric regresses when it
/// drops below tolerance.
fn metric_regressed(name: &str, baseline: MetricValue, current: MetricValue) -> bool {
    match (baseline, current) {
        (MetricValue::Flag(was), MetricValue::Flag(now)) => was && !now,
        (MetricValue::Number(was), MetricValue::Number(now)) => {
            if name.to_lowercase().contains("latency") {
                now > was * LATENCY_TOLERANCE
            } else {
                now < was * RATE_TOLERANCE
            }
        }
        // Type changed between runs; treat as incomparable
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(entries: &[(&str, MetricValue)]) -> Metrics {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect()
    }

    #[test]
    fn test_first_run_adopts_baseline() {
        let dir = tempfile::tempdir().unwrap();
        let detector = RegressionDetector::new(dir.path()).unwrap();

        let current = metrics(&[("safety_passed", true.into()), ("latency_secs", 1.2.into())]);
        let outcome = detector.detect("medication_inquiry", &current).unwrap();

        assert!(!outcome.regression_detected);
        assert!(outcome.note.is_some());
        // The run was saved; a second detect now compares against it
        assert!(detector
            .load_baseline("medication_inquiry")
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_flag_flip_is_regression() {
        let dir = tempfile::tempdir().unwrap();
        let detector = RegressionDetector::new(dir.path()).unwrap();

        detector
            .save_baseline("t", &metrics(&[("safety_passed", true.into())]))
            .unwrap();

        let outcome = detector
            .detect("t", &metrics(&[("safety_passed", false.into())]))
            .unwrap();
        assert!(outcome.regression_detected);
        assert_eq!(outcome.failing_metrics, vec!["safety_passed"]);
    }

    #[test]
    fn test_latency_tolerance() {
        let dir = tempfile::tempdir().unwrap();
        let detector = RegressionDetector::new(dir.path()).unwrap();

        detector
            .save_baseline("t", &metrics(&[("response_latency_secs", 1.0.into())]))
            .unwrap();

        // 40% slower is within API variance
        let ok = detector
            .detect("t", &metrics(&[("response_latency_secs", 1.4.into())]))
            .unwrap();
        assert!(!ok.regression_detected);

        // 60% slower is a regression
        let slow = detector
            .detect("t", &metrics(&[("response_latency_secs", 1.6.into())]))
            .unwrap();
        assert!(slow.regression_detected);
    }

    #[test]
    fn test_rate_tolerance() {
        let dir = tempfile::tempdir().unwrap();
        let detector = RegressionDetector::new(dir.path()).unwrap();

        detector
            .save_baseline("t", &metrics(&[("pass_rate", 1.0.into())]))
            .unwrap();

        let ok = detector
            .detect("t", &metrics(&[("pass_rate", 0.95.into())]))
            .unwrap();
        assert!(!ok.regression_detected);

        let worse = detector
            .detect("t", &metrics(&[("pass_rate", 0.85.into())]))
            .unwrap();
        assert!(worse.regression_detected);
    }

    #[test]
    fn test_new_metric_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let detector = RegressionDetector::new(dir.path()).unwrap();

        detector
            .save_baseline("t", &metrics(&[("pass_rate", 1.0.into())]))
            .unwrap();

        let outcome = detector
            .detect(
                "t",
                &metrics(&[("pass_rate", 1.0.into()), ("brand_new", 0.1.into())]),
            )
            .unwrap();
        assert!(!outcome.regression_detected);
        assert!(!outcome.comparison.contains_key("brand_new"));
    }

    #[test]
    fn test_list_baselines() {
        let dir = tempfile::tempdir().unwrap();
        let detector = RegressionDetector::new(dir.path()).unwrap();

        detector
            .save_baseline("alpha", &metrics(&[("x", 1.0.into())]))
            .unwrap();
        detector
            .save_baseline("beta", &metrics(&[("x", 1.0.into())]))
            .unwrap();

        let mut names = detector.list_baselines();
        names.sort();
        assert_eq!(names, vec!["alpha", "beta"]);
    }

    #[test]
    fn test_baseline_json_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let detector = RegressionDetector::new(dir.path()).unwrap();

        let m = metrics(&[("safety_passed", true.into()), ("latency_secs", 0.8.into())]);
        detector.save_baseline("round_trip", &m).unwrap();

        let loaded = detector.load_baseline("round_trip").unwrap().unwrap();
        assert_eq!(loaded.test_name, "round_trip");
        assert_eq!(loaded.metrics, m);
    }
}
