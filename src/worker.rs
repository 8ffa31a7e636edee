//! Job Consumer
//!
//! Blocks on the work queue, marks each dequeued submission `Processing`,
//! loads it with its problem, runs the judge and persists one terminal
//! update. Queue failures are logged and retried after a fixed backoff;
//! persistence failures end the loop.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::database::JudgeStore;
use crate::error::{Error, Result};
use crate::judge::Judge;
use crate::model::SubmissionStatus;
use crate::queue::JobQueue;
use crate::sandbox::CodeExecutor;
use crate::verdict::{GradingPolicy, JudgeOutcome};

/// Longest a single pop blocks before shutdown is checked again
const POP_WAIT: Duration = Duration::from_secs(1);

/// Everything a worker needs, passed explicitly
#[derive(Clone)]
pub struct WorkerContext {
    pub config: Config,
    pub store: Arc<dyn JudgeStore>,
    pub queue: Arc<dyn JobQueue>,
    pub executor: Arc<dyn CodeExecutor>,
}

/// What happened to one dequeued token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobDisposition {
    /// A terminal status was written
    Judged(SubmissionStatus),
    /// The submission was already terminal
    Skipped,
    /// Nothing could be marked: bad token or unknown submission
    Dropped,
}

/// Single-submission-at-a-time consumer
pub struct Worker {
    ctx: WorkerContext,
    judge: Judge,
}

impl Worker {
    pub fn new(ctx: WorkerContext) -> Self {
        let policy = GradingPolicy {
            stop_on_first_failure: ctx.config.worker.stop_on_first_failure,
        };
        let judge = Judge::new(ctx.executor.clone(), ctx.config.sandbox.timeout, policy);
        Worker { ctx, judge }
    }

    /// Consume jobs until `shutdown` flips to true or its sender is dropped.
    ///
    /// Shutdown is only observed between pops, so a token the queue has
    /// already handed over is always processed.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let backoff = self.ctx.config.worker.backoff;
        info!(
            queue = %self.ctx.config.queue.name,
            executor = self.ctx.executor.name(),
            backoff_secs = backoff.as_secs(),
            "Worker started"
        );

        loop {
            // A stop request or a dropped sender both end the loop
            let stopping = *shutdown.borrow() || shutdown.has_changed().is_err();
            if stopping {
                break;
            }

            match self.ctx.queue.pop(POP_WAIT).await {
                Ok(None) => {}
                Ok(Some(token)) => match self.handle(&token).await {
                    Ok(disposition) => {
                        info!(token = %token, disposition = ?disposition, "Job finished");
                    }
                    Err(e) if e.is_persistence() => {
                        error!(token = %token, error = %e, "Persistence failed, stopping worker");
                        return Err(e);
                    }
                    Err(e) => {
                        error!(token = %token, error = %e, "Job failed");
                    }
                },
                Err(e) => {
                    error!(error = %e, retryable = e.is_retryable(), "Dequeue failed, backing off");
                    tokio::select! {
                        _ = tokio::time::sleep(backoff) => {}
                        _ = shutdown.changed() => {}
                    }
                }
            }
        }

        info!("Worker stopped");
        Ok(())
    }

    /// Process one queue token end to end
    pub async fn handle(&self, token: &str) -> Result<JobDisposition> {
        let Ok(id) = Uuid::parse_str(token.trim()) else {
            warn!(token = %token, "Dequeued token is not a submission id, dropping");
            return Ok(JobDisposition::Dropped);
        };

        let store = &self.ctx.store;
        let marked = store.mark_processing(id).await?;

        let submission = match store.load_submission(id).await {
            Ok(Some(submission)) => submission,
            Ok(None) => {
                warn!(submission_id = %id, "{}, dropping job", Error::NotFound(format!("Submission {}", id)));
                return Ok(JobDisposition::Dropped);
            }
            Err(e) if e.is_persistence() => return Err(e),
            Err(e) => return self.persist(id, JudgeOutcome::error(e.to_string())).await,
        };

        if submission.status.is_terminal() {
            info!(submission_id = %id, status = %submission.status, "Submission already judged, skipping");
            return Ok(JobDisposition::Skipped);
        }
        if !marked {
            info!(submission_id = %id, "Submission was already processing, judging again");
        }

        info!(
            submission_id = %id,
            problem_id = %submission.problem_id,
            language = %submission.language,
            "Judging submission"
        );

        let problem = match store.load_problem(submission.problem_id).await {
            Ok(Some(problem)) => problem,
            Ok(None) => {
                let message = Error::NotFound(format!("Problem {}", submission.problem_id)).to_string();
                return self.persist(id, JudgeOutcome::error(message)).await;
            }
            Err(e) if e.is_persistence() => return Err(e),
            Err(e) => return self.persist(id, JudgeOutcome::error(e.to_string())).await,
        };

        let outcome = self.judge.judge(&submission, &problem).await;
        self.persist(id, outcome).await
    }

    async fn persist(&self, id: Uuid, outcome: JudgeOutcome) -> Result<JobDisposition> {
        if self.ctx.store.finish(id, &outcome).await? {
            info!(submission_id = %id, status = %outcome.status, "Verdict persisted");
        } else {
            warn!(submission_id = %id, status = %outcome.status, "Submission moved on before the terminal write");
        }
        Ok(JobDisposition::Judged(outcome.status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryJudgeStore;
    use crate::judge::tests::{two_sum_executor, two_sum_problem, ScriptedExecutor};
    use crate::model::Submission;
    use crate::queue::MemoryQueue;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const CORRECT: &str = "def twoSum(nums, target):\n    seen = {}\n    for i, n in enumerate(nums):\n        if target - n in seen:\n            return [seen[target - n], i]\n        seen[n] = i\n";

    struct Fixture {
        store: Arc<MemoryJudgeStore>,
        queue: Arc<MemoryQueue>,
        executor: Arc<ScriptedExecutor>,
        worker: Worker,
    }

    fn fixture(executor: ScriptedExecutor) -> Fixture {
        let store = Arc::new(MemoryJudgeStore::new());
        let queue = Arc::new(MemoryQueue::new());
        let executor = Arc::new(executor);
        let mut config = Config::default();
        config.worker.backoff = Duration::from_millis(10);
        let worker = Worker::new(WorkerContext {
            config,
            store: store.clone(),
            queue: queue.clone(),
            executor: executor.clone(),
        });
        Fixture {
            store,
            queue,
            executor,
            worker,
        }
    }

    #[tokio::test]
    async fn test_handle_accepts_correct_submission() {
        let f = fixture(two_sum_executor());
        let problem = two_sum_problem();
        let submission = Submission::new(problem.id, "Python", CORRECT);
        let id = submission.id;
        f.store.insert_problem(problem).await;
        f.store.insert_submission(submission).await;

        let disposition = f.worker.handle(&id.to_string()).await.unwrap();
        assert_eq!(disposition, JobDisposition::Judged(SubmissionStatus::Accepted));

        let stored = f.store.load_submission(id).await.unwrap().unwrap();
        assert_eq!(stored.status, SubmissionStatus::Accepted);
        assert_eq!(stored.output, vec!["0,1", "1,2", "0,1"]);
    }

    #[tokio::test]
    async fn test_missing_problem_marks_error() {
        let f = fixture(two_sum_executor());
        let submission = Submission::new(Uuid::new_v4(), "Python", CORRECT);
        let id = submission.id;
        let problem_id = submission.problem_id;
        f.store.insert_submission(submission).await;

        let disposition = f.worker.handle(&id.to_string()).await.unwrap();
        assert_eq!(disposition, JobDisposition::Judged(SubmissionStatus::Error));

        let stored = f.store.load_submission(id).await.unwrap().unwrap();
        assert_eq!(stored.status, SubmissionStatus::Error);
        assert_eq!(stored.output, vec![format!("Problem {} not found", problem_id)]);
        assert_eq!(f.executor.runs(), 0);
    }

    #[tokio::test]
    async fn test_unknown_or_malformed_token_is_dropped() {
        let f = fixture(two_sum_executor());
        assert_eq!(
            f.worker.handle(&Uuid::new_v4().to_string()).await.unwrap(),
            JobDisposition::Dropped
        );
        assert_eq!(f.worker.handle("not-a-uuid").await.unwrap(), JobDisposition::Dropped);
    }

    #[tokio::test]
    async fn test_redelivered_terminal_submission_is_skipped() {
        let f = fixture(two_sum_executor());
        let problem = two_sum_problem();
        let submission = Submission::new(problem.id, "Python", CORRECT);
        let id = submission.id;
        f.store.insert_problem(problem).await;
        f.store.insert_submission(submission).await;

        f.worker.handle(&id.to_string()).await.unwrap();
        assert_eq!(f.worker.handle(&id.to_string()).await.unwrap(), JobDisposition::Skipped);
        assert_eq!(f.executor.runs(), 3);
    }

    #[tokio::test]
    async fn test_run_drains_queue_until_shutdown() {
        let f = fixture(two_sum_executor());
        let problem = two_sum_problem();
        let mut ids = Vec::new();
        for code in [CORRECT, "def twoSum(nums, target):\n    return []\n"] {
            let submission = Submission::new(problem.id, "Python", code);
            ids.push(submission.id);
            f.store.insert_submission(submission).await;
        }
        f.store.insert_problem(problem).await;
        for id in &ids {
            f.queue.push(&id.to_string()).await.unwrap();
        }

        let (stop, shutdown) = watch::channel(false);
        let worker = Arc::new(f.worker);
        let handle = {
            let worker = worker.clone();
            tokio::spawn(async move { worker.run(shutdown).await })
        };

        let store = f.store.clone();
        let all_done = async {
            loop {
                let mut done = 0;
                for id in &ids {
                    if let Some(s) = store.load_submission(*id).await.unwrap() {
                        if s.status.is_terminal() {
                            done += 1;
                        }
                    }
                }
                if done == ids.len() {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        };
        tokio::time::timeout(Duration::from_secs(5), all_done).await.unwrap();

        stop.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(3), handle)
            .await
            .unwrap()
            .unwrap()
            .unwrap();

        let first = store.load_submission(ids[0]).await.unwrap().unwrap();
        assert_eq!(first.status, SubmissionStatus::Accepted);
        assert_eq!(f.queue.len().await, 0);
        assert_eq!(f.executor.runs(), 6);
    }

    /// Fails the first pops, then behaves like an empty queue
    struct FlakyQueue {
        failures: AtomicUsize,
        pops: AtomicUsize,
    }

    #[async_trait]
    impl JobQueue for FlakyQueue {
        async fn pop(&self, wait: Duration) -> Result<Option<String>> {
            self.pops.fetch_add(1, Ordering::SeqCst);
            if self.failures.load(Ordering::SeqCst) > 0 {
                self.failures.fetch_sub(1, Ordering::SeqCst);
                return Err(Error::Queue("connection refused".into()));
            }
            tokio::time::sleep(wait).await;
            Ok(None)
        }

        async fn push(&self, _token: &str) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_queue_errors_back_off_and_retry() {
        let queue = Arc::new(FlakyQueue {
            failures: AtomicUsize::new(2),
            pops: AtomicUsize::new(0),
        });
        let mut config = Config::default();
        config.worker.backoff = Duration::from_millis(10);
        let worker = Worker::new(WorkerContext {
            config,
            store: Arc::new(MemoryJudgeStore::new()),
            queue: queue.clone(),
            executor: Arc::new(ScriptedExecutor::new()),
        });

        let (stop, shutdown) = watch::channel(false);
        let handle = tokio::spawn(async move { worker.run(shutdown).await });

        let retried = async {
            while queue.pops.load(Ordering::SeqCst) < 3 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        };
        tokio::time::timeout(Duration::from_secs(2), retried).await.unwrap();

        stop.send(true).unwrap();
        let result = tokio::time::timeout(Duration::from_secs(3), handle).await.unwrap().unwrap();
        assert!(result.is_ok());
    }

    /// Hands over one token only after a delay, like a pop already in flight
    struct SlowQueue {
        token: std::sync::Mutex<Option<String>>,
        delay: Duration,
    }

    #[async_trait]
    impl JobQueue for SlowQueue {
        async fn pop(&self, wait: Duration) -> Result<Option<String>> {
            let token = self.token.lock().unwrap().take();
            match token {
                Some(token) => {
                    tokio::time::sleep(self.delay).await;
                    Ok(Some(token))
                }
                None => {
                    tokio::time::sleep(wait).await;
                    Ok(None)
                }
            }
        }

        async fn push(&self, _token: &str) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_shutdown_during_pop_keeps_the_token() {
        let store = Arc::new(MemoryJudgeStore::new());
        let problem = two_sum_problem();
        let submission = Submission::new(problem.id, "Python", CORRECT);
        let id = submission.id;
        store.insert_problem(problem).await;
        store.insert_submission(submission).await;

        let worker = Worker::new(WorkerContext {
            config: Config::default(),
            store: store.clone(),
            queue: Arc::new(SlowQueue {
                token: std::sync::Mutex::new(Some(id.to_string())),
                delay: Duration::from_millis(100),
            }),
            executor: Arc::new(two_sum_executor()),
        });

        let (stop, shutdown) = watch::channel(false);
        let handle = tokio::spawn(async move { worker.run(shutdown).await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        stop.send(true).unwrap();

        let result = tokio::time::timeout(Duration::from_secs(3), handle).await.unwrap().unwrap();
        assert!(result.is_ok());
        let stored = store.load_submission(id).await.unwrap().unwrap();
        assert_eq!(stored.status, SubmissionStatus::Accepted);
    }

    #[tokio::test]
    async fn test_dropped_sender_stops_the_worker() {
        let f = fixture(two_sum_executor());
        let (stop, shutdown) = watch::channel(false);
        let handle = tokio::spawn(async move { f.worker.run(shutdown).await });
        drop(stop);

        let result = tokio::time::timeout(Duration::from_secs(3), handle).await.unwrap().unwrap();
        assert!(result.is_ok());
    }
}
