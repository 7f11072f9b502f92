// SQLite JobRepository Implementation

use async_trait::async_trait;
use sqlx::SqlitePool;

use transdoc_core::domain::{JobFeedback, JobId, JobStatus, Language, TranslationJob};
use transdoc_core::error::{AppError, Result};
use transdoc_core::port::{JobRepository, QueueStats};

// Helper to convert sqlx::Error to AppError with structured information
fn map_sqlx_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) => {
            if let Some(code) = db_err.code() {
                let code_str = code.as_ref();

                // SQLite error codes: https://www.sqlite.org/rescode.html
                match code_str {
                    "2067" | "1555" => AppError::Database(format!(
                        "Unique constraint violation: {} ({})",
                        db_err.message(),
                        code_str
                    )),
                    "5" => AppError::Database(format!(
                        "Database locked (SQLITE_BUSY): {}",
                        db_err.message()
                    )),
                    "13" => AppError::Database(format!("Database full: {}", db_err.message())),
                    _ => AppError::Database(format!(
                        "Database error [{}]: {}",
                        code_str,
                        db_err.message()
                    )),
                }
            } else {
                AppError::Database(format!("Database error: {}", db_err.message()))
            }
        }
        sqlx::Error::RowNotFound => AppError::Database("Row not found".to_string()),
        sqlx::Error::ColumnNotFound(col) => {
            AppError::Database(format!("Column not found: {}", col))
        }
        _ => AppError::Database(err.to_string()),
    }
}

pub struct SqliteJobRepository {
    pool: SqlitePool,
}

impl SqliteJobRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobRepository for SqliteJobRepository {
    async fn insert_if_no_active(&self, job: &TranslationJob) -> Result<bool> {
        let feedback_json = match &job.feedback {
            Some(fb) => Some(serde_json::to_string(fb)?),
            None => None,
        };

        // Duplicate-active guard and insert in one statement: the WHERE NOT
        // EXISTS makes the check atomic with respect to concurrent creators.
        let result = sqlx::query(
            r#"
            INSERT INTO translation_jobs (
                id, document_id, source_language, target_language, status,
                requested_by, estimated_cost_cents, actual_cost_cents,
                result_document_id, attempt_count, max_attempts, stall_count,
                last_error, feedback, created_at, updated_at, started_at,
                completed_at
            )
            SELECT ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?
            WHERE NOT EXISTS (
                SELECT 1 FROM translation_jobs
                WHERE document_id = ?
                  AND target_language = ?
                  AND status IN ('PENDING', 'PROCESSING')
            )
            "#,
        )
        .bind(&job.id)
        .bind(&job.document_id)
        .bind(job.source_language.as_str())
        .bind(job.target_language.as_str())
        .bind(job.status.as_db_str())
        .bind(&job.requested_by)
        .bind(job.estimated_cost_cents)
        .bind(job.actual_cost_cents)
        .bind(&job.result_document_id)
        .bind(job.attempt_count)
        .bind(job.max_attempts)
        .bind(job.stall_count)
        .bind(&job.last_error)
        .bind(&feedback_json)
        .bind(job.created_at)
        .bind(job.updated_at)
        .bind(job.started_at)
        .bind(job.completed_at)
        .bind(&job.document_id)
        .bind(job.target_language.as_str())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() == 1)
    }

    async fn find_by_id(&self, id: &JobId) -> Result<Option<TranslationJob>> {
        let row = sqlx::query_as::<_, JobRow>("SELECT * FROM translation_jobs WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.map(JobRow::into_job).transpose()
    }

    async fn list_for_document(&self, document_id: &str) -> Result<Vec<TranslationJob>> {
        let rows: Vec<JobRow> = sqlx::query_as(
            r#"
            SELECT * FROM translation_jobs
            WHERE document_id = ?
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(JobRow::into_job).collect()
    }

    async fn find_by_status(&self, status: JobStatus) -> Result<Vec<TranslationJob>> {
        let rows: Vec<JobRow> = sqlx::query_as(
            r#"
            SELECT * FROM translation_jobs
            WHERE status = ?
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(status.as_db_str())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(JobRow::into_job).collect()
    }

    async fn claim_pending(&self, limit: u32, now_millis: i64) -> Result<Vec<TranslationJob>> {
        // Single UPDATE .. RETURNING keeps the claim atomic: two concurrent
        // workers never receive the same row.
        let rows: Vec<JobRow> = sqlx::query_as(
            r#"
            UPDATE translation_jobs
            SET status = 'PROCESSING',
                started_at = ?,
                attempt_count = attempt_count + 1,
                updated_at = ?
            WHERE id IN (
                SELECT id FROM translation_jobs
                WHERE status = 'PENDING'
                ORDER BY created_at ASC, id ASC
                LIMIT ?
            )
            RETURNING *
            "#,
        )
        .bind(now_millis)
        .bind(now_millis)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(JobRow::into_job).collect()
    }

    async fn claim_by_id(&self, id: &JobId, now_millis: i64) -> Result<Option<TranslationJob>> {
        let row: Option<JobRow> = sqlx::query_as(
            r#"
            UPDATE translation_jobs
            SET status = 'PROCESSING',
                started_at = ?,
                attempt_count = attempt_count + 1,
                updated_at = ?
            WHERE id = ? AND status = 'PENDING'
            RETURNING *
            "#,
        )
        .bind(now_millis)
        .bind(now_millis)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(JobRow::into_job).transpose()
    }

    async fn complete(
        &self,
        id: &JobId,
        result_document_id: &str,
        actual_cost_cents: i64,
        now_millis: i64,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE translation_jobs
            SET status = 'COMPLETED',
                result_document_id = ?,
                actual_cost_cents = ?,
                last_error = NULL,
                completed_at = ?,
                updated_at = ?
            WHERE id = ? AND status = 'PROCESSING'
            "#,
        )
        .bind(result_document_id)
        .bind(actual_cost_cents)
        .bind(now_millis)
        .bind(now_millis)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() == 1)
    }

    async fn fail(&self, id: &JobId, error: &str, now_millis: i64) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE translation_jobs
            SET status = 'FAILED',
                last_error = ?,
                completed_at = ?,
                updated_at = ?
            WHERE id = ? AND status = 'PROCESSING'
            "#,
        )
        .bind(error)
        .bind(now_millis)
        .bind(now_millis)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() == 1)
    }

    async fn requeue(&self, id: &JobId, error: &str, now_millis: i64) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE translation_jobs
            SET status = 'PENDING',
                last_error = ?,
                started_at = NULL,
                updated_at = ?
            WHERE id = ? AND status = 'PROCESSING'
            "#,
        )
        .bind(error)
        .bind(now_millis)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() == 1)
    }

    async fn cancel(&self, id: &JobId, now_millis: i64) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE translation_jobs
            SET status = 'CANCELLED',
                completed_at = ?,
                updated_at = ?
            WHERE id = ? AND status = 'PENDING'
            "#,
        )
        .bind(now_millis)
        .bind(now_millis)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() == 1)
    }

    async fn set_feedback(
        &self,
        id: &JobId,
        feedback: &JobFeedback,
        now_millis: i64,
    ) -> Result<bool> {
        let feedback_json = serde_json::to_string(feedback)?;

        let result = sqlx::query(
            r#"
            UPDATE translation_jobs
            SET feedback = ?, updated_at = ?
            WHERE id = ? AND status = 'COMPLETED'
            "#,
        )
        .bind(&feedback_json)
        .bind(now_millis)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() == 1)
    }

    async fn requeue_stalled(&self, cutoff_millis: i64, now_millis: i64) -> Result<u64> {
        // Stall recovery is a liveness event, not a retry: attempt_count
        // stays as-is, stall_count records the requeue.
        let result = sqlx::query(
            r#"
            UPDATE translation_jobs
            SET status = 'PENDING',
                started_at = NULL,
                stall_count = stall_count + 1,
                updated_at = ?
            WHERE status = 'PROCESSING'
              AND started_at IS NOT NULL
              AND started_at < ?
            "#,
        )
        .bind(now_millis)
        .bind(cutoff_millis)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }

    async fn reset_failed(&self, force: bool, now_millis: i64) -> Result<u64> {
        let result = if force {
            sqlx::query(
                r#"
                UPDATE translation_jobs
                SET status = 'PENDING',
                    attempt_count = 0,
                    last_error = NULL,
                    started_at = NULL,
                    completed_at = NULL,
                    updated_at = ?
                WHERE status = 'FAILED'
                "#,
            )
            .bind(now_millis)
            .execute(&self.pool)
            .await
        } else {
            sqlx::query(
                r#"
                UPDATE translation_jobs
                SET status = 'PENDING',
                    last_error = NULL,
                    started_at = NULL,
                    completed_at = NULL,
                    updated_at = ?
                WHERE status = 'FAILED' AND attempt_count < max_attempts
                "#,
            )
            .bind(now_millis)
            .execute(&self.pool)
            .await
        }
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }

    async fn delete(&self, id: &JobId) -> Result<()> {
        sqlx::query("DELETE FROM translation_jobs WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn stats(&self) -> Result<QueueStats> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM translation_jobs GROUP BY status")
                .fetch_all(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        let mut stats = QueueStats::default();
        for (status, count) in rows {
            match JobStatus::parse_db(&status)? {
                JobStatus::Pending => stats.pending = count,
                JobStatus::Processing => stats.processing = count,
                JobStatus::Completed => stats.completed = count,
                JobStatus::Failed => stats.failed = count,
                JobStatus::Cancelled => stats.cancelled = count,
            }
        }

        let total_cost: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(actual_cost_cents) FROM translation_jobs WHERE actual_cost_cents IS NOT NULL",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        stats.total_cost_cents = total_cost.unwrap_or(0);

        Ok(stats)
    }

    async fn set_worker_running(&self, running: bool, now_millis: i64) -> Result<()> {
        sqlx::query("UPDATE worker_state SET running = ?, updated_at = ? WHERE id = 1")
            .bind(if running { 1 } else { 0 })
            .bind(now_millis)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn worker_running(&self) -> Result<bool> {
        let running: i64 = sqlx::query_scalar("SELECT running FROM worker_state WHERE id = 1")
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(running != 0)
    }
}

/// SQLite row representation
#[derive(Debug, sqlx::FromRow)]
struct JobRow {
    id: String,
    document_id: String,
    source_language: String,
    target_language: String,
    status: String,
    requested_by: String,
    estimated_cost_cents: i64,
    actual_cost_cents: Option<i64>,
    result_document_id: Option<String>,
    attempt_count: i32,
    max_attempts: i32,
    stall_count: i32,
    last_error: Option<String>,
    feedback: Option<String>,
    created_at: i64,
    updated_at: i64,
    started_at: Option<i64>,
    completed_at: Option<i64>,
}

impl JobRow {
    fn into_job(self) -> Result<TranslationJob> {
        let feedback: Option<JobFeedback> = match self.feedback {
            Some(json) => Some(serde_json::from_str(&json)?),
            None => None,
        };

        Ok(TranslationJob {
            id: self.id,
            document_id: self.document_id,
            source_language: Language::parse(&self.source_language)
                .map_err(AppError::Domain)?,
            target_language: Language::parse(&self.target_language)
                .map_err(AppError::Domain)?,
            status: JobStatus::parse_db(&self.status).map_err(AppError::Domain)?,
            requested_by: self.requested_by,
            estimated_cost_cents: self.estimated_cost_cents,
            actual_cost_cents: self.actual_cost_cents,
            result_document_id: self.result_document_id,
            attempt_count: self.attempt_count,
            max_attempts: self.max_attempts,
            stall_count: self.stall_count,
            last_error: self.last_error,
            feedback,
            created_at: self.created_at,
            updated_at: self.updated_at,
            started_at: self.started_at,
            completed_at: self.completed_at,
        })
    }
}
