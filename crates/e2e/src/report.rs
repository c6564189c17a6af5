//! Test case bookkeeping and suite reports

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::E2eResult;

/// One checked assertion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionRecord {
    pub message: String,
    pub passed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Still running
    Pending,
    Passed,
    /// Ran to completion with a failed assertion or a count mismatch
    Failed,
    /// Aborted by a setup, synchronization or driver error
    Errored,
}

/// A single named test with its planned and checked assertions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCase {
    pub name: String,
    pub planned: usize,
    pub assertions: Vec<AssertionRecord>,
    pub outcome: Outcome,
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub walkthrough: Option<PathBuf>,
}

impl TestCase {
    pub fn begin(name: impl Into<String>, planned: usize) -> Self {
        Self {
            name: name.into(),
            planned,
            assertions: Vec::new(),
            outcome: Outcome::Pending,
            error: None,
            started_at: Utc::now(),
            duration_ms: 0,
            walkthrough: None,
        }
    }

    /// Record an assertion result, returning `passed`
    pub fn record(&mut self, message: impl Into<String>, passed: bool, detail: Option<String>) -> bool {
        let message = message.into();
        if passed {
            info!("PASS {}", message);
        } else {
            warn!("FAIL {}{}", message, detail.as_deref().map(|d| format!(" ({})", d)).unwrap_or_default());
        }
        self.assertions.push(AssertionRecord { message, passed, detail });
        passed
    }

    pub fn assert_ok(&mut self, message: impl Into<String>) {
        self.record(message, true, None);
    }

    pub fn assert_failed(&mut self, message: impl Into<String>, detail: impl Into<String>) {
        self.record(message, false, Some(detail.into()));
    }

    pub fn passed_count(&self) -> usize {
        self.assertions.iter().filter(|a| a.passed).count()
    }

    pub fn failed_count(&self) -> usize {
        self.assertions.len() - self.passed_count()
    }

    /// Mark the case as aborted; the first error wins
    pub fn abort(&mut self, error: impl ToString) {
        self.outcome = Outcome::Errored;
        if self.error.is_none() {
            self.error = Some(error.to_string());
        }
    }

    /// Settle the outcome once the run is over.
    ///
    /// An aborted case stays `Errored`. Otherwise any failed assertion or a
    /// difference between planned and checked assertions fails the case.
    pub fn finish(&mut self, duration_ms: u64) -> Outcome {
        self.duration_ms = duration_ms;
        if self.outcome == Outcome::Errored {
            return self.outcome;
        }

        if self.failed_count() > 0 {
            self.outcome = Outcome::Failed;
            if self.error.is_none() {
                self.error = self
                    .assertions
                    .iter()
                    .find(|a| !a.passed)
                    .map(|a| format!("assertion failed: {}", a.message));
            }
        } else if self.assertions.len() != self.planned {
            self.outcome = Outcome::Failed;
            self.error = Some(format!(
                "planned {} assertions, checked {}",
                self.planned,
                self.assertions.len()
            ));
        } else {
            self.outcome = Outcome::Passed;
        }
        self.outcome
    }

    pub fn success(&self) -> bool {
        self.outcome == Outcome::Passed
    }
}

/// Result of running a list of scenarios
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteResult {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
    pub duration_ms: u64,
    pub cases: Vec<TestCase>,
}

impl SuiteResult {
    pub fn from_cases(cases: Vec<TestCase>, duration_ms: u64) -> Self {
        let count = |o: Outcome| cases.iter().filter(|c| c.outcome == o).count();
        Self {
            total: cases.len(),
            passed: count(Outcome::Passed),
            failed: count(Outcome::Failed),
            errored: count(Outcome::Errored),
            duration_ms,
            cases,
        }
    }

    pub fn success(&self) -> bool {
        self.failed == 0 && self.errored == 0
    }

    /// Write the suite as `test-results.json` under `output_dir`
    pub fn write_json(&self, output_dir: &Path) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(output_dir)?;

        let path = output_dir.join("test-results.json");
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}
