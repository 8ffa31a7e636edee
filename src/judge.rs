//! Execution pipeline for one submission
//!
//! Validates the problem and synthesizes every test case's program up
//! front, then runs them in declared order through the [`CodeExecutor`] and
//! feeds each verdict to a [`Grader`]. Every failure ends up as a [`JudgeOutcome`]; the
//! pipeline itself never returns an error.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::marshal::expected_text;
use crate::model::{Language, Problem, Submission};
use crate::sandbox::{CodeExecutor, ExecutionRequest};
use crate::synth;
use crate::verdict::{Grader, GradingPolicy, JudgeOutcome, Verdict};

/// Runs submissions against their problem's test cases
pub struct Judge {
    executor: Arc<dyn CodeExecutor>,
    timeout: Duration,
    policy: GradingPolicy,
}

impl Judge {
    pub fn new(executor: Arc<dyn CodeExecutor>, timeout: Duration, policy: GradingPolicy) -> Self {
        Judge {
            executor,
            timeout,
            policy,
        }
    }

    /// Judge one submission; pipeline failures become an `Error` outcome
    pub async fn judge(&self, submission: &Submission, problem: &Problem) -> JudgeOutcome {
        let start = Instant::now();
        let outcome = match self.run(submission, problem).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(submission_id = %submission.id, error = %e, "Pipeline failed");
                JudgeOutcome::error(e.to_string())
            }
        };

        info!(
            submission_id = %submission.id,
            status = %outcome.status,
            entries = outcome.output.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Submission judged"
        );
        outcome
    }

    async fn run(&self, submission: &Submission, problem: &Problem) -> Result<JudgeOutcome> {
        problem.validate()?;
        let language: Language = submission.language.parse()?;
        let signature = &problem.function_metadata;

        if problem.test_cases.is_empty() {
            warn!(problem_id = %problem.id, "Problem has no test cases");
        }

        let programs = synth::synthesize_all(language, &submission.code, signature, &problem.test_cases)?;

        let mut grader = Grader::new(self.policy);
        for (index, (test_case, program)) in problem.test_cases.iter().zip(programs).enumerate() {
            let test = index + 1;
            let expected = expected_text(&test_case.output, signature.return_type);

            let request = ExecutionRequest::new(submission.language.clone(), program.source)
                .with_timeout(self.timeout);

            let verdict = match self.executor.execute(request).await {
                Ok(result) => {
                    debug!(
                        submission_id = %submission.id,
                        test,
                        exit_code = ?result.exit_code,
                        elapsed_ms = result.execution_time.as_millis() as u64,
                        "Test case executed"
                    );
                    Verdict::evaluate(&result, &expected)
                }
                Err(e) => {
                    warn!(submission_id = %submission.id, test, executor = self.executor.name(), error = %e, "Sandbox spawn failed");
                    Verdict::error(e.to_string())
                }
            };

            info!(submission_id = %submission.id, test, verdict = ?verdict.kind, "Test case graded");
            if !grader.record(&verdict) {
                break;
            }
        }

        Ok(grader.finish())
    }
}
