// Domain Layer - Pure business logic and entities

pub mod error;
pub mod failure;
pub mod job;

// Re-exports
pub use error::DomainError;
pub use failure::{FailureKind, StepError};
pub use job::{DocumentId, JobFeedback, JobId, JobStatus, Language, TranslationJob, UserId};
