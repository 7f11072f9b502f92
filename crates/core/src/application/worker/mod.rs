// Translation Worker - orchestrates one job end-to-end
//
// No background thread is assumed: batch processing is a stateless call
// driven by the HTTP action endpoint or an external scheduler. All status
// writes go through the TranslationQueue, never to storage directly.

pub mod constants;

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::application::cost;
use crate::application::queue::{CleanupReport, TranslationQueue};
use crate::domain::{DocumentId, JobId, JobStatus, Language, StepError, TranslationJob};
use crate::error::Result;
use crate::port::pdf_engine::PAGE_BREAK;
use crate::port::{
    DocumentStore, PdfExtractor, PdfRenderer, TimeProvider, TranslationProvider,
};

use constants::DEFAULT_BATCH_CONCURRENCY;

/// Worker tuning knobs
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Bound on jobs translated concurrently within one batch call
    pub batch_concurrency: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            batch_concurrency: DEFAULT_BATCH_CONCURRENCY,
        }
    }
}

/// Tally of one `process_pending_jobs` invocation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchOutcome {
    pub claimed: usize,
    pub completed: usize,
    pub requeued: usize,
    pub failed: usize,
}

/// Health report for the worker action endpoint
#[derive(Debug, Clone, Serialize)]
pub struct WorkerHealth {
    pub running: bool,
    pub provider: &'static str,
    pub provider_configured: bool,
    pub pending_jobs: i64,
    pub processing_jobs: i64,
}

enum JobEnd {
    Completed,
    Requeued,
    Failed,
}

pub struct TranslationWorker {
    queue: Arc<TranslationQueue>,
    documents: Arc<dyn DocumentStore>,
    provider: Arc<dyn TranslationProvider>,
    extractor: Arc<dyn PdfExtractor>,
    renderer: Arc<dyn PdfRenderer>,
    time_provider: Arc<dyn TimeProvider>,
    config: WorkerConfig,
}

impl TranslationWorker {
    pub fn new(
        queue: Arc<TranslationQueue>,
        documents: Arc<dyn DocumentStore>,
        provider: Arc<dyn TranslationProvider>,
        extractor: Arc<dyn PdfExtractor>,
        renderer: Arc<dyn PdfRenderer>,
        time_provider: Arc<dyn TimeProvider>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            queue,
            documents,
            provider,
            extractor,
            renderer,
            time_provider,
            config,
        }
    }

    /// Mark the worker as running. The flag lives in the job store so all
    /// deployment instances agree; it gates scheduled triggers, not
    /// explicit `process` calls.
    pub async fn start(&self) -> Result<()> {
        self.queue.set_running(true).await
    }

    pub async fn stop(&self) -> Result<()> {
        self.queue.set_running(false).await
    }

    /// Claim up to `limit` pending jobs and run each through the pipeline.
    /// Partial failures never abort the rest of the batch.
    pub async fn process_pending_jobs(&self, limit: u32) -> Result<BatchOutcome> {
        let jobs = self.queue.claim_next_pending(limit).await?;
        let mut outcome = BatchOutcome {
            claimed: jobs.len(),
            ..Default::default()
        };
        if jobs.is_empty() {
            return Ok(outcome);
        }

        info!(claimed = jobs.len(), "Processing job batch");

        let ends: Vec<JobEnd> = stream::iter(jobs)
            .map(|job| self.run_claimed(job))
            .buffer_unordered(self.config.batch_concurrency.max(1))
            .collect()
            .await;

        for end in ends {
            match end {
                JobEnd::Completed => outcome.completed += 1,
                JobEnd::Requeued => outcome.requeued += 1,
                JobEnd::Failed => outcome.failed += 1,
            }
        }
        Ok(outcome)
    }

    /// Run one explicit job by id (manual retry/debugging). Subject to the
    /// same state invariants: fails unless the job is pending.
    pub async fn process_job(&self, job_id: &JobId) -> Result<JobStatus> {
        let job = self.queue.claim_job(job_id).await?;
        match self.run_claimed(job).await {
            JobEnd::Completed => Ok(JobStatus::Completed),
            JobEnd::Requeued => Ok(JobStatus::Pending),
            JobEnd::Failed => Ok(JobStatus::Failed),
        }
    }

    /// Requeue jobs abandoned by a crashed worker; returns count.
    pub async fn recover_stalled_jobs(&self) -> Result<u64> {
        self.queue.recover_stalled().await
    }

    /// Reset eligible failed jobs back to pending; returns count.
    pub async fn retry_failed_jobs(&self, force: bool) -> Result<u64> {
        self.queue.retry_failed(force).await
    }

    /// Remove jobs whose source document has been deleted.
    pub async fn cleanup_orphaned_jobs(&self) -> Result<CleanupReport> {
        self.queue.cleanup_orphaned().await
    }

    pub async fn health_check(&self) -> Result<WorkerHealth> {
        let stats = self.queue.get_stats().await?;
        Ok(WorkerHealth {
            running: self.queue.is_running().await?,
            provider: self.provider.name(),
            provider_configured: self.provider.key_configured(),
            pending_jobs: stats.pending,
            processing_jobs: stats.processing,
        })
    }

    /// Run an already-claimed job to its terminal queue update. Every
    /// failure path ends in a queue status write; nothing escapes silently.
    async fn run_claimed(&self, job: TranslationJob) -> JobEnd {
        let job_id = job.id.clone();
        info!(
            job_id = %job_id,
            document_id = %job.document_id,
            attempt = job.attempt_count,
            "Processing translation job"
        );

        match self.execute(&job).await {
            Ok((result_document_id, actual_cost_cents)) => {
                match self
                    .queue
                    .mark_completed(&job_id, &result_document_id, actual_cost_cents)
                    .await
                {
                    Ok(()) => JobEnd::Completed,
                    Err(e) => {
                        error!(job_id = %job_id, error = %e, "Failed to record completion");
                        JobEnd::Failed
                    }
                }
            }
            Err(step) => {
                warn!(job_id = %job_id, kind = ?step.kind, error = %step.message, "Pipeline step failed");
                match self.queue.mark_failed(&job_id, &step.message, step.kind).await {
                    Ok(JobStatus::Pending) => JobEnd::Requeued,
                    Ok(_) => JobEnd::Failed,
                    Err(e) => {
                        error!(job_id = %job_id, error = %e, "Failed to record failure");
                        JobEnd::Failed
                    }
                }
            }
        }
    }

    /// The per-job pipeline: fetch, extract, translate, render, persist.
    async fn execute(&self, job: &TranslationJob) -> std::result::Result<(DocumentId, i64), StepError> {
        // 1. Source document. Missing document is permanent.
        let meta = self
            .documents
            .get_document(&job.document_id)
            .await?
            .ok_or_else(|| {
                StepError::permanent(format!("document {} no longer exists", job.document_id))
            })?;
        let source_bytes = self.documents.get_file_bytes(&meta.file_path).await?;

        // 2. Extract. A corrupt PDF stays corrupt; no retry.
        let text = self.extractor.extract_text(&source_bytes)?;

        // 3. Translate.
        let outcome = self
            .provider
            .translate(&text, job.source_language, job.target_language)
            .await?;

        // 4. Render one page per extracted page.
        let pages: Vec<String> = outcome
            .text
            .split(PAGE_BREAK)
            .map(str::to_string)
            .collect();
        let rendered = self.renderer.render_pages(&pages).await?;

        // 5. Persist under a derived key and register the result document.
        let now = self.time_provider.now_millis();
        let result_path = derive_result_path(&meta.file_path, job.target_language, now);
        self.documents.put_file_bytes(&result_path, &rendered).await?;
        let result_document_id = self
            .documents
            .create_document(&result_path, job.target_language, rendered.len() as i64)
            .await?;

        let actual_cost = cost::actual_cost_cents(outcome.input_tokens, outcome.output_tokens);
        Ok((result_document_id, actual_cost))
    }
}

/// `documents/statuts.pdf` + arabic -> `documents/statuts_arabic_<millis>.pdf`
fn derive_result_path(source_path: &str, target: Language, now_millis: i64) -> String {
    let stem = match source_path.rsplit_once('.') {
        Some((stem, _ext)) if !stem.is_empty() => stem,
        _ => source_path,
    };
    format!("{stem}_{}_{now_millis}.pdf", target.as_str())
}
