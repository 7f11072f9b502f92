// Job Repository Port (Interface)
//
// The repository is the only writer of job rows. All guarded mutations
// return `false` when the job was not in the required status, so callers
// can distinguish "wrong state" from "applied" without read-then-write races.

use crate::domain::{JobFeedback, JobId, JobStatus, TranslationJob};
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Aggregate queue counters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueueStats {
    pub pending: i64,
    pub processing: i64,
    pub completed: i64,
    pub failed: i64,
    pub cancelled: i64,
    pub total_cost_cents: i64,
}

/// Repository interface for TranslationJob persistence
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Insert a new job unless an active (pending/processing) job already
    /// exists for the same document+target language pair.
    /// Returns `false` on conflict. The check and insert are atomic.
    async fn insert_if_no_active(&self, job: &TranslationJob) -> Result<bool>;

    /// Find job by ID
    async fn find_by_id(&self, id: &JobId) -> Result<Option<TranslationJob>>;

    /// All jobs for a document, newest first
    async fn list_for_document(&self, document_id: &str) -> Result<Vec<TranslationJob>>;

    /// All jobs in a given status, oldest first
    async fn find_by_status(&self, status: JobStatus) -> Result<Vec<TranslationJob>>;

    /// Atomically claim up to `limit` pending jobs: status -> processing,
    /// started_at set, attempt_count incremented. Two concurrent claims
    /// never return the same job.
    async fn claim_pending(&self, limit: u32, now_millis: i64) -> Result<Vec<TranslationJob>>;

    /// Claim one specific job if (and only if) it is still pending.
    async fn claim_by_id(&self, id: &JobId, now_millis: i64) -> Result<Option<TranslationJob>>;

    /// processing -> completed with result pointer and actual cost.
    async fn complete(
        &self,
        id: &JobId,
        result_document_id: &str,
        actual_cost_cents: i64,
        now_millis: i64,
    ) -> Result<bool>;

    /// processing -> failed (terminal), recording the error.
    async fn fail(&self, id: &JobId, error: &str, now_millis: i64) -> Result<bool>;

    /// processing -> pending (retry), recording the error.
    async fn requeue(&self, id: &JobId, error: &str, now_millis: i64) -> Result<bool>;

    /// pending -> cancelled.
    async fn cancel(&self, id: &JobId, now_millis: i64) -> Result<bool>;

    /// Attach feedback to a completed job.
    async fn set_feedback(
        &self,
        id: &JobId,
        feedback: &JobFeedback,
        now_millis: i64,
    ) -> Result<bool>;

    /// Requeue processing jobs whose started_at predates `cutoff_millis`.
    /// Increments stall_count, leaves attempt_count unchanged.
    async fn requeue_stalled(&self, cutoff_millis: i64, now_millis: i64) -> Result<u64>;

    /// Reset failed jobs back to pending. Without `force`, only jobs with
    /// attempts remaining are eligible; with it, attempt counters are reset.
    async fn reset_failed(&self, force: bool, now_millis: i64) -> Result<u64>;

    /// Remove a job row entirely (orphan cleanup).
    async fn delete(&self, id: &JobId) -> Result<()>;

    /// Aggregate counts per status and total actual cost.
    async fn stats(&self) -> Result<QueueStats>;

    /// Persisted worker run flag (shared across instances).
    async fn set_worker_running(&self, running: bool, now_millis: i64) -> Result<()>;
    async fn worker_running(&self) -> Result<bool>;
}

pub mod mocks {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory repository for unit tests. Guarded transitions mirror the
    /// SQLite implementation; the outer Mutex stands in for SQL atomicity.
    pub struct InMemoryJobRepository {
        inner: Mutex<Inner>,
    }

    struct Inner {
        jobs: HashMap<JobId, TranslationJob>,
        worker_running: bool,
    }

    impl InMemoryJobRepository {
        pub fn new() -> Self {
            Self {
                inner: Mutex::new(Inner {
                    jobs: HashMap::new(),
                    worker_running: false,
                }),
            }
        }

        /// Insert bypassing the duplicate guard (test setup helper)
        pub fn put(&self, job: TranslationJob) {
            self.inner.lock().unwrap().jobs.insert(job.id.clone(), job);
        }

        pub fn get(&self, id: &str) -> Option<TranslationJob> {
            self.inner.lock().unwrap().jobs.get(id).cloned()
        }
    }

    impl Default for InMemoryJobRepository {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl JobRepository for InMemoryJobRepository {
        async fn insert_if_no_active(&self, job: &TranslationJob) -> Result<bool> {
            let mut inner = self.inner.lock().unwrap();
            let duplicate = inner.jobs.values().any(|j| {
                j.document_id == job.document_id
                    && j.target_language == job.target_language
                    && j.status.is_active()
            });
            if duplicate {
                return Ok(false);
            }
            inner.jobs.insert(job.id.clone(), job.clone());
            Ok(true)
        }

        async fn find_by_id(&self, id: &JobId) -> Result<Option<TranslationJob>> {
            Ok(self.inner.lock().unwrap().jobs.get(id).cloned())
        }

        async fn list_for_document(&self, document_id: &str) -> Result<Vec<TranslationJob>> {
            let inner = self.inner.lock().unwrap();
            let mut jobs: Vec<_> = inner
                .jobs
                .values()
                .filter(|j| j.document_id == document_id)
                .cloned()
                .collect();
            jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(jobs)
        }

        async fn find_by_status(&self, status: JobStatus) -> Result<Vec<TranslationJob>> {
            let inner = self.inner.lock().unwrap();
            let mut jobs: Vec<_> = inner
                .jobs
                .values()
                .filter(|j| j.status == status)
                .cloned()
                .collect();
            jobs.sort_by(|a, b| a.created_at.cmp(&b.created_at));
            Ok(jobs)
        }

        async fn claim_pending(&self, limit: u32, now_millis: i64) -> Result<Vec<TranslationJob>> {
            let mut inner = self.inner.lock().unwrap();
            let mut ids: Vec<_> = inner
                .jobs
                .values()
                .filter(|j| j.status == JobStatus::Pending)
                .map(|j| (j.created_at, j.id.clone()))
                .collect();
            ids.sort();
            let mut claimed = Vec::new();
            for (_, id) in ids.into_iter().take(limit as usize) {
                let job = inner.jobs.get_mut(&id).unwrap();
                job.begin(now_millis).map_err(crate::error::AppError::Domain)?;
                claimed.push(job.clone());
            }
            Ok(claimed)
        }

        async fn claim_by_id(
            &self,
            id: &JobId,
            now_millis: i64,
        ) -> Result<Option<TranslationJob>> {
            let mut inner = self.inner.lock().unwrap();
            match inner.jobs.get_mut(id) {
                Some(job) if job.status == JobStatus::Pending => {
                    job.begin(now_millis).map_err(crate::error::AppError::Domain)?;
                    Ok(Some(job.clone()))
                }
                _ => Ok(None),
            }
        }

        async fn complete(
            &self,
            id: &JobId,
            result_document_id: &str,
            actual_cost_cents: i64,
            now_millis: i64,
        ) -> Result<bool> {
            let mut inner = self.inner.lock().unwrap();
            match inner.jobs.get_mut(id) {
                Some(job) => Ok(job
                    .complete(now_millis, result_document_id, actual_cost_cents)
                    .is_ok()),
                None => Ok(false),
            }
        }

        async fn fail(&self, id: &JobId, error: &str, now_millis: i64) -> Result<bool> {
            let mut inner = self.inner.lock().unwrap();
            match inner.jobs.get_mut(id) {
                Some(job) => Ok(job.fail(now_millis, error).is_ok()),
                None => Ok(false),
            }
        }

        async fn requeue(&self, id: &JobId, error: &str, now_millis: i64) -> Result<bool> {
            let mut inner = self.inner.lock().unwrap();
            match inner.jobs.get_mut(id) {
                Some(job) => Ok(job.requeue(now_millis, error).is_ok()),
                None => Ok(false),
            }
        }

        async fn cancel(&self, id: &JobId, now_millis: i64) -> Result<bool> {
            let mut inner = self.inner.lock().unwrap();
            match inner.jobs.get_mut(id) {
                Some(job) => Ok(job.cancel(now_millis).is_ok()),
                None => Ok(false),
            }
        }

        async fn set_feedback(
            &self,
            id: &JobId,
            feedback: &JobFeedback,
            now_millis: i64,
        ) -> Result<bool> {
            let mut inner = self.inner.lock().unwrap();
            match inner.jobs.get_mut(id) {
                Some(job) if job.status == JobStatus::Completed => {
                    Ok(job.attach_feedback(now_millis, feedback.clone()).is_ok())
                }
                _ => Ok(false),
            }
        }

        async fn requeue_stalled(&self, cutoff_millis: i64, now_millis: i64) -> Result<u64> {
            let mut inner = self.inner.lock().unwrap();
            let mut count = 0;
            for job in inner.jobs.values_mut() {
                if job.status == JobStatus::Processing
                    && job.started_at.is_some_and(|t| t < cutoff_millis)
                {
                    job.status = JobStatus::Pending;
                    job.started_at = None;
                    job.stall_count += 1;
                    job.updated_at = now_millis;
                    count += 1;
                }
            }
            Ok(count)
        }

        async fn reset_failed(&self, force: bool, now_millis: i64) -> Result<u64> {
            let mut inner = self.inner.lock().unwrap();
            let mut count = 0;
            for job in inner.jobs.values_mut() {
                if job.status != JobStatus::Failed {
                    continue;
                }
                if force {
                    job.attempt_count = 0;
                } else if job.attempts_exhausted() {
                    continue;
                }
                job.status = JobStatus::Pending;
                job.last_error = None;
                job.started_at = None;
                job.completed_at = None;
                job.updated_at = now_millis;
                count += 1;
            }
            Ok(count)
        }

        async fn delete(&self, id: &JobId) -> Result<()> {
            self.inner.lock().unwrap().jobs.remove(id);
            Ok(())
        }

        async fn stats(&self) -> Result<QueueStats> {
            let inner = self.inner.lock().unwrap();
            let mut stats = QueueStats::default();
            for job in inner.jobs.values() {
                match job.status {
                    JobStatus::Pending => stats.pending += 1,
                    JobStatus::Processing => stats.processing += 1,
                    JobStatus::Completed => stats.completed += 1,
                    JobStatus::Failed => stats.failed += 1,
                    JobStatus::Cancelled => stats.cancelled += 1,
                }
                stats.total_cost_cents += job.actual_cost_cents.unwrap_or(0);
            }
            Ok(stats)
        }

        async fn set_worker_running(&self, running: bool, _now_millis: i64) -> Result<()> {
            self.inner.lock().unwrap().worker_running = running;
            Ok(())
        }

        async fn worker_running(&self) -> Result<bool> {
            Ok(self.inner.lock().unwrap().worker_running)
        }
    }
}
