//! Sequential step execution and reporting.
//!
//! Runs the four verification steps over one guarded session, one after the
//! other. A failing step aborts only itself; the remaining steps still run
//! and every outcome lands in the report.

use crate::clock::Clock;
use crate::config::SuiteConfig;
use crate::result::RecargarResult;
use crate::session::{BrowserSession, SessionGuard};
use crate::steps;
use crate::wait::Waiter;
use std::time::{Duration, Instant};

/// Result of running a single verification step
#[derive(Debug, Clone)]
pub struct StepOutcome {
    /// Step name
    pub name: String,
    /// Whether the step passed
    pub passed: bool,
    /// Error message if it failed
    pub error: Option<String>,
    /// Wall-clock duration of the step
    pub duration: Duration,
}

impl StepOutcome {
    fn pass(name: &str, duration: Duration) -> Self {
        Self {
            name: name.to_string(),
            passed: true,
            error: None,
            duration,
        }
    }

    fn fail(name: &str, error: String, duration: Duration) -> Self {
        Self {
            name: name.to_string(),
            passed: false,
            error: Some(error),
            duration,
        }
    }
}

/// Report over one full verification run
#[derive(Debug, Clone, Default)]
pub struct SuiteReport {
    /// Outcomes in execution order
    pub outcomes: Vec<StepOutcome>,
}

impl SuiteReport {
    /// Whether every step passed
    #[must_use]
    pub fn passed(&self) -> bool {
        self.outcomes.iter().all(|o| o.passed)
    }

    /// Outcomes of failed steps
    #[must_use]
    pub fn failures(&self) -> Vec<&StepOutcome> {
        self.outcomes.iter().filter(|o| !o.passed).collect()
    }

    /// Number of steps run
    #[must_use]
    pub fn step_count(&self) -> usize {
        self.outcomes.len()
    }
}

type StepFn<S, C> = fn(&mut S, &Waiter<C>, &SuiteConfig) -> RecargarResult<()>;

/// Run all four verification steps sequentially over one session.
///
/// The guard owns teardown; this function only borrows the session. Steps
/// never run concurrently and each owns its navigation, so a failure in one
/// leaves the next free to start from a clean page load.
pub fn run_suite<S, C>(
    guard: &mut SessionGuard<S>,
    waiter: &Waiter<C>,
    config: &SuiteConfig,
) -> SuiteReport
where
    S: BrowserSession,
    C: Clock,
{
    let steps: [(&str, StepFn<S, C>); 4] = [
        ("payment_system_logos", steps::check_payment_logos),
        ("payment_block_heading", steps::check_heading_text),
        ("service_details_link", steps::check_service_link),
        ("topup_submission_flow", steps::check_payment_form),
    ];

    let mut report = SuiteReport::default();
    for (name, step) in steps {
        let start = Instant::now();
        let outcome = match step(guard.session(), waiter, config) {
            Ok(()) => StepOutcome::pass(name, start.elapsed()),
            Err(e) => {
                tracing::error!(step = name, error = %e, "verification step failed");
                StepOutcome::fail(name, e.to_string(), start.elapsed())
            }
        };
        report.outcomes.push(outcome);
    }
    report
}
