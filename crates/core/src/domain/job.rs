// Translation Job Domain Model

use serde::{Deserialize, Serialize};

use crate::domain::error::{DomainError, Result};

/// Job ID (UUID v4)
pub type JobId = String;

/// Document ID (owned by the document store, opaque here)
pub type DocumentId = String;

/// User identifier of the requester
pub type UserId = String;

/// Supported document languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    French,
    Arabic,
    English,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::French => "french",
            Language::Arabic => "arabic",
            Language::English => "english",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "french" => Ok(Language::French),
            "arabic" => Ok(Language::Arabic),
            "english" => Ok(Language::English),
            other => Err(DomainError::UnknownLanguage(other.to_string())),
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Job Status
///
/// Reachable sequences: `pending -> processing -> completed`,
/// `pending -> processing -> pending` (retry),
/// `pending -> processing -> failed`, `pending -> cancelled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    /// Storage representation (SCREAMING_SNAKE_CASE, column value)
    pub fn as_db_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "PENDING",
            JobStatus::Processing => "PROCESSING",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Failed => "FAILED",
            JobStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse_db(s: &str) -> Result<Self> {
        match s {
            "PENDING" => Ok(JobStatus::Pending),
            "PROCESSING" => Ok(JobStatus::Processing),
            "COMPLETED" => Ok(JobStatus::Completed),
            "FAILED" => Ok(JobStatus::Failed),
            "CANCELLED" => Ok(JobStatus::Cancelled),
            other => Err(DomainError::UnknownStatus(other.to_string())),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }

    /// Active jobs block duplicate requests for the same document+language.
    pub fn is_active(&self) -> bool {
        matches!(self, JobStatus::Pending | JobStatus::Processing)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

/// Requester feedback, attachable to completed jobs only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobFeedback {
    /// 1..=5
    pub rating: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Translation Job Entity
///
/// Timestamps are epoch milliseconds, always injected via `TimeProvider`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationJob {
    pub id: JobId,
    pub document_id: DocumentId,
    pub source_language: Language,
    pub target_language: Language,
    pub status: JobStatus,
    pub requested_by: UserId,

    // Cost accounting, in the smallest currency unit
    pub estimated_cost_cents: i64,
    pub actual_cost_cents: Option<i64>,

    /// Set iff status == Completed
    pub result_document_id: Option<DocumentId>,

    pub attempt_count: i32,
    pub max_attempts: i32,
    /// Times this job was requeued by stall recovery (not a retry attempt)
    pub stall_count: i32,
    pub last_error: Option<String>,

    pub created_at: i64,
    pub updated_at: i64,
    pub started_at: Option<i64>,
    pub completed_at: Option<i64>,

    pub feedback: Option<JobFeedback>,
}

impl TranslationJob {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: impl Into<String>,
        created_at: i64,
        document_id: impl Into<String>,
        source_language: Language,
        target_language: Language,
        requested_by: impl Into<String>,
        estimated_cost_cents: i64,
        max_attempts: i32,
    ) -> Self {
        Self {
            id: id.into(),
            document_id: document_id.into(),
            source_language,
            target_language,
            status: JobStatus::Pending,
            requested_by: requested_by.into(),
            estimated_cost_cents,
            actual_cost_cents: None,
            result_document_id: None,
            attempt_count: 0,
            max_attempts,
            stall_count: 0,
            last_error: None,
            created_at,
            updated_at: created_at,
            started_at: None,
            completed_at: None,
            feedback: None,
        }
    }

    /// Transition to Processing (claim). Increments the attempt counter.
    pub fn begin(&mut self, now_millis: i64) -> Result<()> {
        if self.status != JobStatus::Pending {
            return Err(DomainError::InvalidStatusTransition {
                from: self.status.to_string(),
                to: JobStatus::Processing.to_string(),
            });
        }
        self.status = JobStatus::Processing;
        self.attempt_count += 1;
        self.started_at = Some(now_millis);
        self.updated_at = now_millis;
        Ok(())
    }

    /// Transition to Completed with the produced document reference.
    pub fn complete(
        &mut self,
        now_millis: i64,
        result_document_id: impl Into<String>,
        actual_cost_cents: i64,
    ) -> Result<()> {
        if self.status != JobStatus::Processing {
            return Err(DomainError::InvalidStatusTransition {
                from: self.status.to_string(),
                to: JobStatus::Completed.to_string(),
            });
        }
        self.status = JobStatus::Completed;
        self.result_document_id = Some(result_document_id.into());
        self.actual_cost_cents = Some(actual_cost_cents);
        self.last_error = None;
        self.completed_at = Some(now_millis);
        self.updated_at = now_millis;
        Ok(())
    }

    /// Transition to Failed (terminal).
    pub fn fail(&mut self, now_millis: i64, error: impl Into<String>) -> Result<()> {
        if self.status != JobStatus::Processing {
            return Err(DomainError::InvalidStatusTransition {
                from: self.status.to_string(),
                to: JobStatus::Failed.to_string(),
            });
        }
        self.status = JobStatus::Failed;
        self.last_error = Some(error.into());
        self.completed_at = Some(now_millis);
        self.updated_at = now_millis;
        Ok(())
    }

    /// Revert to Pending for a later retry attempt.
    pub fn requeue(&mut self, now_millis: i64, error: impl Into<String>) -> Result<()> {
        if self.status != JobStatus::Processing {
            return Err(DomainError::InvalidStatusTransition {
                from: self.status.to_string(),
                to: JobStatus::Pending.to_string(),
            });
        }
        self.status = JobStatus::Pending;
        self.last_error = Some(error.into());
        self.started_at = None;
        self.updated_at = now_millis;
        Ok(())
    }

    /// Cancel. Allowed only while still Pending.
    pub fn cancel(&mut self, now_millis: i64) -> Result<()> {
        if self.status != JobStatus::Pending {
            return Err(DomainError::InvalidStatusTransition {
                from: self.status.to_string(),
                to: JobStatus::Cancelled.to_string(),
            });
        }
        self.status = JobStatus::Cancelled;
        self.completed_at = Some(now_millis);
        self.updated_at = now_millis;
        Ok(())
    }

    /// Attach requester feedback. Allowed only on Completed jobs.
    pub fn attach_feedback(&mut self, now_millis: i64, feedback: JobFeedback) -> Result<()> {
        if self.status != JobStatus::Completed {
            return Err(DomainError::Validation(format!(
                "feedback is only allowed on completed jobs (status: {})",
                self.status
            )));
        }
        if !(1..=5).contains(&feedback.rating) {
            return Err(DomainError::Validation(format!(
                "rating must be between 1 and 5, got {}",
                feedback.rating
            )));
        }
        self.feedback = Some(feedback);
        self.updated_at = now_millis;
        Ok(())
    }

    pub fn attempts_exhausted(&self) -> bool {
        self.attempt_count >= self.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> TranslationJob {
        TranslationJob::new(
            "job-1",
            1000,
            "doc-1",
            Language::French,
            Language::Arabic,
            "u1",
            25,
            3,
        )
    }

    #[test]
    fn full_lifecycle_pending_processing_completed() {
        let mut j = job();
        assert_eq!(j.status, JobStatus::Pending);

        j.begin(2000).unwrap();
        assert_eq!(j.status, JobStatus::Processing);
        assert_eq!(j.attempt_count, 1);
        assert_eq!(j.started_at, Some(2000));

        j.complete(3000, "doc-2", 42).unwrap();
        assert_eq!(j.status, JobStatus::Completed);
        assert_eq!(j.result_document_id.as_deref(), Some("doc-2"));
        assert_eq!(j.actual_cost_cents, Some(42));
        assert!(j.status.is_terminal());
    }

    #[test]
    fn retry_cycles_back_to_pending() {
        let mut j = job();
        j.begin(2000).unwrap();
        j.requeue(3000, "provider timeout").unwrap();
        assert_eq!(j.status, JobStatus::Pending);
        assert_eq!(j.attempt_count, 1);
        assert!(j.started_at.is_none());
        assert_eq!(j.last_error.as_deref(), Some("provider timeout"));
    }

    #[test]
    fn cancel_only_from_pending() {
        let mut j = job();
        j.begin(2000).unwrap();
        assert!(j.cancel(3000).is_err());

        let mut j = job();
        j.cancel(2000).unwrap();
        assert_eq!(j.status, JobStatus::Cancelled);
    }

    #[test]
    fn complete_twice_is_rejected() {
        let mut j = job();
        j.begin(2000).unwrap();
        j.complete(3000, "doc-2", 42).unwrap();
        assert!(j.complete(4000, "doc-3", 99).is_err());
        // Cost not double-counted
        assert_eq!(j.actual_cost_cents, Some(42));
    }

    #[test]
    fn feedback_requires_completed_and_valid_rating() {
        let mut j = job();
        let fb = JobFeedback {
            rating: 4,
            comment: None,
        };
        assert!(j.attach_feedback(2000, fb.clone()).is_err());

        j.begin(2000).unwrap();
        j.complete(3000, "doc-2", 42).unwrap();
        assert!(j
            .attach_feedback(
                4000,
                JobFeedback {
                    rating: 6,
                    comment: None
                }
            )
            .is_err());
        j.attach_feedback(4000, fb).unwrap();
        assert_eq!(j.feedback.as_ref().unwrap().rating, 4);
    }

    #[test]
    fn language_round_trip() {
        for lang in [Language::French, Language::Arabic, Language::English] {
            assert_eq!(Language::parse(lang.as_str()).unwrap(), lang);
        }
        assert!(Language::parse("klingon").is_err());
    }

    #[test]
    fn status_db_round_trip() {
        for s in [
            JobStatus::Pending,
            JobStatus::Processing,
            JobStatus::Completed,
            JobStatus::Failed,
            JobStatus::Cancelled,
        ] {
            assert_eq!(JobStatus::parse_db(s.as_db_str()).unwrap(), s);
        }
    }
}
