/*!
 * Suite Result Aggregation
 *
 * Per-case outcomes and per-suite summaries for the FAT runs. A case
 * failure is recorded, never panicked, so one failed assertion does not
 * stop the remaining cases of a suite.
 *
 * Author: LDAP Registry FAT Team
 * Created: 2026-08-20
 */

use std::future::Future;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

/// Outcome of a single FAT case
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestOutcome {
    /// Case identifier
    pub id: Uuid,
    /// Case name, `suite.case` style
    pub name: String,
    /// Whether the case passed
    pub success: bool,
    /// How long the case ran
    pub duration: Duration,
    /// Failure text, if the case failed
    pub error: Option<String>,
    /// When the case was executed
    pub timestamp: DateTime<Utc>,
}

/// Aggregated results of one suite run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteSummary {
    /// Suite name
    pub suite_name: String,
    /// Individual case outcomes
    pub outcomes: Vec<TestOutcome>,
    /// Total cases executed
    pub total: usize,
    /// Cases that passed
    pub passed: usize,
    /// Cases that failed
    pub failed: usize,
    /// Summed case duration
    pub total_duration: Duration,
}

/// Run one case, timing it and converting an `Err` into a recorded
/// failure
pub async fn run_case<F, Fut>(name: &str, case: F) -> TestOutcome
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<(), String>>,
{
    let start = Instant::now();
    let result = case().await;
    let duration = start.elapsed();

    match result {
        Ok(()) => {
            info!(case = name, ?duration, "PASS");
            TestOutcome {
                id: Uuid::new_v4(),
                name: name.to_string(),
                success: true,
                duration,
                error: None,
                timestamp: Utc::now(),
            }
        }
        Err(reason) => {
            error!(case = name, ?duration, %reason, "FAIL");
            TestOutcome {
                id: Uuid::new_v4(),
                name: name.to_string(),
                success: false,
                duration,
                error: Some(reason),
                timestamp: Utc::now(),
            }
        }
    }
}

impl SuiteSummary {
    /// Aggregate case outcomes into a summary
    pub fn from_outcomes(suite_name: impl Into<String>, outcomes: Vec<TestOutcome>) -> Self {
        let suite_name = suite_name.into();
        let total = outcomes.len();
        let passed = outcomes.iter().filter(|o| o.success).count();
        let failed = total - passed;
        let total_duration = outcomes.iter().map(|o| o.duration).sum();

        info!(
            suite = %suite_name,
            passed,
            total,
            ?total_duration,
            "suite finished"
        );
        Self {
            suite_name,
            outcomes,
            total,
            passed,
            failed,
            total_duration,
        }
    }

    /// Merge several suite summaries into one run-level summary
    pub fn merged(name: impl Into<String>, summaries: Vec<SuiteSummary>) -> Self {
        let outcomes = summaries.into_iter().flat_map(|s| s.outcomes).collect();
        Self::from_outcomes(name, outcomes)
    }

    /// True when every case passed
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    /// The failed outcomes, for reporting
    pub fn failures(&self) -> impl Iterator<Item = &TestOutcome> {
        self.outcomes.iter().filter(|o| !o.success)
    }
}
