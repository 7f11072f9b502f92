// Application Layer - Use Cases and Business Logic

pub mod cost;
pub mod queue;
pub mod worker;

// Re-exports
pub use queue::{CleanupReport, QueueConfig, TranslationQueue};
pub use worker::{BatchOutcome, TranslationWorker, WorkerConfig, WorkerHealth};
