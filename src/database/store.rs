//! Submission and problem persistence used by the worker
//!
//! Status writes are forward-only: each update names the statuses it may
//! move from, so a stale or duplicate write changes nothing.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::FromRow;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::database::PostgresPool;
use crate::error::Result;
use crate::model::{FunctionSignature, Problem, Submission, SubmissionStatus, TestCase};
use crate::verdict::JudgeOutcome;

/// What the worker reads and writes
#[async_trait]
pub trait JudgeStore: Send + Sync {
    async fn load_submission(&self, id: Uuid) -> Result<Option<Submission>>;

    async fn load_problem(&self, id: Uuid) -> Result<Option<Problem>>;

    /// Move `Pending → Processing`; returns whether the row changed
    async fn mark_processing(&self, id: Uuid) -> Result<bool>;

    /// Write the terminal status and output in one update.
    ///
    /// Returns `false` when the submission is missing or already past any
    /// state that may move to `outcome.status`.
    async fn finish(&self, id: Uuid, outcome: &JudgeOutcome) -> Result<bool>;
}

#[derive(FromRow)]
struct SubmissionRow {
    id: Uuid,
    problem_id: Uuid,
    language: String,
    code: String,
    status: String,
    output: Json<Vec<String>>,
    submitted_at: DateTime<Utc>,
}

impl TryFrom<SubmissionRow> for Submission {
    type Error = crate::error::Error;

    fn try_from(row: SubmissionRow) -> Result<Self> {
        Ok(Submission {
            id: row.id,
            problem_id: row.problem_id,
            language: row.language,
            code: row.code,
            status: row.status.parse()?,
            output: row.output.0,
            submitted_at: row.submitted_at,
        })
    }
}

#[derive(FromRow)]
struct ProblemRow {
    id: Uuid,
    title: String,
    description: String,
    difficulty: String,
    category: String,
    prerequisites: Json<Vec<String>>,
    starter_code: Json<BTreeMap<String, String>>,
    test_cases: Json<Vec<TestCase>>,
    function_metadata: Json<FunctionSignature>,
}

impl TryFrom<ProblemRow> for Problem {
    type Error = crate::error::Error;

    fn try_from(row: ProblemRow) -> Result<Self> {
        Ok(Problem {
            id: row.id,
            title: row.title,
            description: row.description,
            difficulty: row.difficulty.parse()?,
            category: row.category,
            prerequisites: row.prerequisites.0,
            starter_code: row.starter_code.0,
            test_cases: row.test_cases.0,
            function_metadata: row.function_metadata.0,
        })
    }
}

fn status_names(statuses: Vec<SubmissionStatus>) -> Vec<String> {
    statuses.iter().map(|s| s.as_str().to_string()).collect()
}

/// Judge store backed by PostgreSQL
#[derive(Clone)]
pub struct PgJudgeStore {
    pool: PostgresPool,
}

impl PgJudgeStore {
    pub fn new(pool: PostgresPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JudgeStore for PgJudgeStore {
    async fn load_submission(&self, id: Uuid) -> Result<Option<Submission>> {
        let row: Option<SubmissionRow> = sqlx::query_as(r#"
            SELECT id, problem_id, language, code, status, output, submitted_at
            FROM submissions WHERE id = $1
        "#)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Submission::try_from).transpose()
    }

    async fn load_problem(&self, id: Uuid) -> Result<Option<Problem>> {
        let row: Option<ProblemRow> = sqlx::query_as(r#"
            SELECT id, title, description, difficulty, category,
                   prerequisites, starter_code, test_cases, function_metadata
            FROM problems WHERE id = $1
        "#)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Problem::try_from).transpose()
    }

    async fn mark_processing(&self, id: Uuid) -> Result<bool> {
        let from = status_names(SubmissionStatus::predecessors(SubmissionStatus::Processing));
        let result = sqlx::query(r#"
            UPDATE submissions SET status = $2, updated_at = NOW()
            WHERE id = $1 AND status = ANY($3)
        "#)
        .bind(id)
        .bind(SubmissionStatus::Processing.as_str())
        .bind(&from)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn finish(&self, id: Uuid, outcome: &JudgeOutcome) -> Result<bool> {
        let from = status_names(SubmissionStatus::predecessors(outcome.status));
        let result = sqlx::query(r#"
            UPDATE submissions SET status = $2, output = $3, updated_at = NOW()
            WHERE id = $1 AND status = ANY($4)
        "#)
        .bind(id)
        .bind(outcome.status.as_str())
        .bind(Json(&outcome.output))
        .bind(&from)
        .execute(&self.pool)
        .await?;

        debug!(submission_id = %id, status = %outcome.status, rows = result.rows_affected(), "Terminal write");
        Ok(result.rows_affected() > 0)
    }
}

/// In-process store applying the same forward-only rule
#[derive(Debug, Default)]
pub struct MemoryJudgeStore {
    submissions: RwLock<HashMap<Uuid, Submission>>,
    problems: RwLock<HashMap<Uuid, Problem>>,
}

impl MemoryJudgeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_problem(&self, problem: Problem) {
        self.problems.write().await.insert(problem.id, problem);
    }

    pub async fn insert_submission(&self, submission: Submission) {
        self.submissions.write().await.insert(submission.id, submission);
    }

    async fn advance(&self, id: Uuid, next: SubmissionStatus, output: Option<&[String]>) -> bool {
        let mut submissions = self.submissions.write().await;
        let Some(submission) = submissions.get_mut(&id) else {
            return false;
        };
        match submission.status.transition(next) {
            Ok(status) => {
                submission.status = status;
                if let Some(output) = output {
                    submission.output = output.to_vec();
                }
                true
            }
            Err(e) => {
                debug!(submission_id = %id, error = %e, "Status write rejected");
                false
            }
        }
    }
}

#[async_trait]
impl JudgeStore for MemoryJudgeStore {
    async fn load_submission(&self, id: Uuid) -> Result<Option<Submission>> {
        Ok(self.submissions.read().await.get(&id).cloned())
    }

    async fn load_problem(&self, id: Uuid) -> Result<Option<Problem>> {
        Ok(self.problems.read().await.get(&id).cloned())
    }

    async fn mark_processing(&self, id: Uuid) -> Result<bool> {
        Ok(self.advance(id, SubmissionStatus::Processing, None).await)
    }

    async fn finish(&self, id: Uuid, outcome: &JudgeOutcome) -> Result<bool> {
        Ok(self.advance(id, outcome.status, Some(&outcome.output)).await)
    }
}
