// Port Layer - Interfaces for external dependencies

pub mod document_store;
pub mod id_provider; // For deterministic testing
pub mod job_repository;
pub mod pdf_engine;
pub mod time_provider;
pub mod translation_provider;

// Re-exports
pub use document_store::{DocumentMeta, DocumentStore};
pub use id_provider::IdProvider;
pub use job_repository::{JobRepository, QueueStats};
pub use pdf_engine::{PdfExtractor, PdfRenderer, PAGE_BREAK};
pub use time_provider::TimeProvider;
pub use translation_provider::{TranslationOutcome, TranslationProvider};
