// Translation Queue Service
//
// Sole authority over job persistence and status invariants. The worker
// never writes job status anywhere else.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::application::cost;
use crate::domain::{
    FailureKind, JobFeedback, JobId, JobStatus, Language, TranslationJob, UserId,
};
use crate::error::{AppError, Result};
use crate::port::{DocumentStore, IdProvider, JobRepository, QueueStats, TimeProvider};

/// Queue tuning knobs (externally configured, defaults documented)
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Retry ceiling; exceeding it forces `failed` (default 3)
    pub max_attempts: i32,
    /// Jobs stuck in `processing` longer than this are requeued (default 30)
    pub stall_threshold_minutes: i64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_attempts: crate::application::worker::constants::DEFAULT_MAX_ATTEMPTS,
            stall_threshold_minutes:
                crate::application::worker::constants::DEFAULT_STALL_THRESHOLD_MINUTES,
        }
    }
}

/// Result of an orphan cleanup pass
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleanupReport {
    pub removed: Vec<JobId>,
}

pub struct TranslationQueue {
    repo: Arc<dyn JobRepository>,
    documents: Arc<dyn DocumentStore>,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
    config: QueueConfig,
}

impl TranslationQueue {
    pub fn new(
        repo: Arc<dyn JobRepository>,
        documents: Arc<dyn DocumentStore>,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
        config: QueueConfig,
    ) -> Self {
        Self {
            repo,
            documents,
            id_provider,
            time_provider,
            config,
        }
    }

    /// Create a new pending job.
    ///
    /// Fails with `Conflict` if an active job already exists for the same
    /// document+target pair, `Validation` if source == target, `NotFound`
    /// if the source document does not exist.
    pub async fn create_job(
        &self,
        document_id: &str,
        source_language: Language,
        target_language: Language,
        requested_by: &UserId,
    ) -> Result<TranslationJob> {
        if source_language == target_language {
            return Err(AppError::Validation(
                "source and target language must differ".to_string(),
            ));
        }

        let meta = self
            .documents
            .get_document(document_id)
            .await
            .map_err(|e| AppError::Storage(e.message))?
            .ok_or_else(|| AppError::NotFound(format!("Document {document_id} not found")))?;

        let job = TranslationJob::new(
            self.id_provider.generate_id(),
            self.time_provider.now_millis(),
            document_id,
            source_language,
            target_language,
            requested_by.clone(),
            cost::estimated_cost_cents(meta.size_bytes),
            self.config.max_attempts,
        );

        // Duplicate-active check and insert are one atomic statement in the
        // repository; no read-then-write window for concurrent creators.
        let inserted = self.repo.insert_if_no_active(&job).await?;
        if !inserted {
            return Err(AppError::Conflict(format!(
                "An active translation of {} into {} already exists",
                document_id, target_language
            )));
        }

        info!(
            job_id = %job.id,
            document_id = %document_id,
            target = %target_language,
            "Translation job created"
        );
        Ok(job)
    }

    /// Atomically claim up to `limit` pending jobs for processing.
    pub async fn claim_next_pending(&self, limit: u32) -> Result<Vec<TranslationJob>> {
        let now = self.time_provider.now_millis();
        self.repo.claim_pending(limit, now).await
    }

    /// Claim one explicit job. `InvalidState` if it exists but is not pending.
    pub async fn claim_job(&self, job_id: &JobId) -> Result<TranslationJob> {
        let now = self.time_provider.now_millis();
        match self.repo.claim_by_id(job_id, now).await? {
            Some(job) => Ok(job),
            None => match self.repo.find_by_id(job_id).await? {
                Some(job) => Err(AppError::InvalidState(format!(
                    "Job {} is {}, not pending",
                    job_id, job.status
                ))),
                None => Err(AppError::NotFound(format!("Job {job_id} not found"))),
            },
        }
    }

    /// processing -> completed. Rejected (`InvalidState`) for any other
    /// current status, so double completion cannot double-count cost.
    pub async fn mark_completed(
        &self,
        job_id: &JobId,
        result_document_id: &str,
        actual_cost_cents: i64,
    ) -> Result<()> {
        let now = self.time_provider.now_millis();
        let applied = self
            .repo
            .complete(job_id, result_document_id, actual_cost_cents, now)
            .await?;
        if !applied {
            return Err(self.state_error(job_id, "complete").await?);
        }
        info!(job_id = %job_id, cost_cents = actual_cost_cents, "Job completed");
        Ok(())
    }

    /// Record a failure. Permanent failures and exhausted attempts become
    /// terminal `failed`; otherwise the job cycles back to `pending`.
    /// Returns the resulting status.
    pub async fn mark_failed(
        &self,
        job_id: &JobId,
        error: &str,
        kind: FailureKind,
    ) -> Result<JobStatus> {
        let job = self
            .repo
            .find_by_id(job_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;

        let now = self.time_provider.now_millis();
        let terminal = kind == FailureKind::Permanent || job.attempt_count >= job.max_attempts;

        let applied = if terminal {
            self.repo.fail(job_id, error, now).await?
        } else {
            self.repo.requeue(job_id, error, now).await?
        };
        if !applied {
            return Err(self.state_error(job_id, "fail").await?);
        }

        if terminal {
            warn!(
                job_id = %job_id,
                attempts = job.attempt_count,
                kind = ?kind,
                error = %error,
                "Job failed permanently"
            );
            Ok(JobStatus::Failed)
        } else {
            info!(
                job_id = %job_id,
                attempt = job.attempt_count,
                max_attempts = job.max_attempts,
                error = %error,
                "Job requeued for retry"
            );
            Ok(JobStatus::Pending)
        }
    }

    /// Requeue jobs stuck in `processing` past the stall threshold
    /// (crashed worker). Not a retry: attempt_count is left unchanged.
    pub async fn recover_stalled(&self) -> Result<u64> {
        let now = self.time_provider.now_millis();
        let cutoff = now - self.config.stall_threshold_minutes * 60_000;
        let recovered = self.repo.requeue_stalled(cutoff, now).await?;
        if recovered > 0 {
            warn!(recovered, "Requeued stalled jobs");
        }
        Ok(recovered)
    }

    /// Delete pending and failed jobs whose source document no longer
    /// exists. Terminal completed/cancelled jobs are kept: they carry the
    /// result pointer and the cost record. A race with `create_job` is
    /// tolerated: such a job is removed on the next cycle.
    pub async fn cleanup_orphaned(&self) -> Result<CleanupReport> {
        let mut report = CleanupReport::default();
        for status in [JobStatus::Pending, JobStatus::Failed] {
            for job in self.repo.find_by_status(status).await? {
                match self.documents.get_document(&job.document_id).await {
                    Ok(Some(_)) => {}
                    Ok(None) => {
                        self.repo.delete(&job.id).await?;
                        info!(job_id = %job.id, document_id = %job.document_id, "Removed orphaned job");
                        report.removed.push(job.id);
                    }
                    Err(e) => {
                        // Store unreachable: keep the job, do not guess.
                        warn!(job_id = %job.id, error = %e, "Skipping orphan check");
                    }
                }
            }
        }
        Ok(report)
    }

    pub async fn get_stats(&self) -> Result<QueueStats> {
        self.repo.stats().await
    }

    pub async fn list_for_document(&self, document_id: &str) -> Result<Vec<TranslationJob>> {
        self.repo.list_for_document(document_id).await
    }

    pub async fn find_job(&self, job_id: &JobId) -> Result<Option<TranslationJob>> {
        self.repo.find_by_id(job_id).await
    }

    /// Cancel a job. Allowed only while still pending.
    pub async fn cancel(&self, job_id: &JobId) -> Result<()> {
        let now = self.time_provider.now_millis();
        let applied = self.repo.cancel(job_id, now).await?;
        if !applied {
            return Err(self.state_error(job_id, "cancel").await?);
        }
        info!(job_id = %job_id, "Job cancelled");
        Ok(())
    }

    /// Attach requester feedback to a completed job.
    pub async fn add_feedback(
        &self,
        job_id: &JobId,
        rating: u8,
        comment: Option<String>,
    ) -> Result<()> {
        if !(1..=5).contains(&rating) {
            return Err(AppError::Validation(format!(
                "rating must be between 1 and 5, got {rating}"
            )));
        }
        let feedback = JobFeedback { rating, comment };
        let now = self.time_provider.now_millis();
        let applied = self.repo.set_feedback(job_id, &feedback, now).await?;
        if !applied {
            return Err(self.state_error(job_id, "add feedback to").await?);
        }
        Ok(())
    }

    /// Reset eligible failed jobs back to pending. With `force`, attempt
    /// counters are reset and all failed jobs become eligible.
    pub async fn retry_failed(&self, force: bool) -> Result<u64> {
        let now = self.time_provider.now_millis();
        let count = self.repo.reset_failed(force, now).await?;
        if count > 0 {
            info!(count, force, "Reset failed jobs to pending");
        }
        Ok(count)
    }

    /// Persisted worker run flag; shared across deployment instances.
    pub async fn set_running(&self, running: bool) -> Result<()> {
        let now = self.time_provider.now_millis();
        self.repo.set_worker_running(running, now).await
    }

    pub async fn is_running(&self) -> Result<bool> {
        self.repo.worker_running().await
    }

    /// Distinguish missing job from wrong-status job after a guarded
    /// update reported no effect.
    async fn state_error(&self, job_id: &JobId, action: &str) -> Result<AppError> {
        Ok(match self.repo.find_by_id(job_id).await? {
            Some(job) => AppError::InvalidState(format!(
                "Cannot {} job {} in status {}",
                action, job_id, job.status
            )),
            None => AppError::NotFound(format!("Job {job_id} not found")),
        })
    }
}
