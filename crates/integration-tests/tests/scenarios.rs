//! End-to-end pipeline scenarios over a real SQLite job store.

use std::sync::Arc;

use transdoc_core::application::{
    QueueConfig, TranslationQueue, TranslationWorker, WorkerConfig,
};
use transdoc_core::domain::{JobStatus, Language, StepError};
use transdoc_core::port::document_store::mocks::InMemoryDocumentStore;
use transdoc_core::port::id_provider::mocks::SequentialIdProvider;
use transdoc_core::port::pdf_engine::mocks::{MockPdfExtractor, MockPdfRenderer};
use transdoc_core::port::time_provider::SystemTimeProvider;
use transdoc_core::port::translation_provider::mocks::MockTranslationProvider;
use transdoc_core::port::PdfExtractor;
use transdoc_core::port::DocumentStore;
use transdoc_core::AppError;
use transdoc_infra_sqlite::{create_pool, run_migrations, SqliteJobRepository};
use transdoc_infra_store::LocalDocumentStore;

struct Pipeline {
    docs: Arc<InMemoryDocumentStore>,
    provider: Arc<MockTranslationProvider>,
    queue: Arc<TranslationQueue>,
    worker: TranslationWorker,
}

async fn pipeline_with_extractor(extractor: Arc<dyn PdfExtractor>) -> Pipeline {
    let pool = create_pool("sqlite::memory:").await.unwrap();
    run_migrations(&pool).await.unwrap();

    let docs = Arc::new(InMemoryDocumentStore::new());
    docs.add_document("doc-1", "documents/statuts.pdf", b"%PDF-1.4 source".to_vec());
    let provider = Arc::new(MockTranslationProvider::new_success());
    let time = Arc::new(SystemTimeProvider);

    let queue = Arc::new(TranslationQueue::new(
        Arc::new(SqliteJobRepository::new(pool)),
        docs.clone(),
        Arc::new(SequentialIdProvider::new()),
        time.clone(),
        QueueConfig::default(),
    ));
    let worker = TranslationWorker::new(
        queue.clone(),
        docs.clone(),
        provider.clone(),
        extractor,
        Arc::new(MockPdfRenderer::new()),
        time,
        WorkerConfig::default(),
    );

    Pipeline {
        docs,
        provider,
        queue,
        worker,
    }
}

async fn pipeline() -> Pipeline {
    pipeline_with_extractor(Arc::new(MockPdfExtractor::returning(
        "Premiere page\n\nDeuxieme page",
    )))
    .await
}

/// Happy path: enqueue, process, result document registered, cost recorded.
#[tokio::test]
async fn enqueue_and_translate_to_completion() {
    let p = pipeline().await;
    let job = p
        .queue
        .create_job("doc-1", Language::French, Language::Arabic, &"resident-1".to_string())
        .await
        .unwrap();
    assert_eq!(job.status, JobStatus::Pending);
    assert!(job.estimated_cost_cents >= 1);

    let outcome = p.worker.process_pending_jobs(10).await.unwrap();
    assert_eq!(outcome.claimed, 1);
    assert_eq!(outcome.completed, 1);

    let stored = p.queue.find_job(&job.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Completed);
    assert!(stored.completed_at.is_some());
    assert!(stored.actual_cost_cents.unwrap() >= 1);

    let result_id = stored.result_document_id.unwrap();
    let meta = p.docs.get_document(&result_id).await.unwrap().unwrap();
    assert!(meta.file_path.starts_with("documents/statuts_arabic_"));
    assert!(p.docs.file(&meta.file_path).is_some());
}

/// Batch run: several documents translated in one call, queue drained.
#[tokio::test]
async fn batch_processes_all_pending_jobs() {
    let p = pipeline().await;
    p.docs
        .add_document("doc-2", "documents/pv-ag.pdf", b"%PDF second".to_vec());
    p.docs
        .add_document("doc-3", "documents/budget.pdf", b"%PDF third".to_vec());

    let user = "resident-1".to_string();
    for doc in ["doc-1", "doc-2", "doc-3"] {
        p.queue
            .create_job(doc, Language::French, Language::Arabic, &user)
            .await
            .unwrap();
    }

    let outcome = p.worker.process_pending_jobs(10).await.unwrap();
    assert_eq!(outcome.claimed, 3);
    assert_eq!(outcome.completed, 3);
    assert_eq!(p.provider.calls(), 3);

    let stats = p.queue.get_stats().await.unwrap();
    assert_eq!(stats.completed, 3);
    assert_eq!(stats.pending, 0);
}

/// Corrupt source: fails on the first attempt, provider never called.
#[tokio::test]
async fn corrupt_pdf_fails_without_translation() {
    let p = pipeline_with_extractor(Arc::new(MockPdfExtractor::failing(
        StepError::permanent("unreadable PDF structure"),
    )))
    .await;
    let job = p
        .queue
        .create_job("doc-1", Language::French, Language::Arabic, &"resident-1".to_string())
        .await
        .unwrap();

    let outcome = p.worker.process_pending_jobs(10).await.unwrap();
    assert_eq!(outcome.failed, 1);

    let stored = p.queue.find_job(&job.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Failed);
    assert_eq!(stored.attempt_count, 1);
    assert!(stored.last_error.unwrap().contains("unreadable"));
    assert_eq!(p.provider.calls(), 0);
}

/// Feedback: accepted only after completion, persisted with the job.
#[tokio::test]
async fn feedback_lifecycle() {
    let p = pipeline().await;
    let job = p
        .queue
        .create_job("doc-1", Language::French, Language::Arabic, &"resident-1".to_string())
        .await
        .unwrap();

    let err = p
        .queue
        .add_feedback(&job.id, 4, Some("trop tot".to_string()))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)));

    p.worker.process_pending_jobs(10).await.unwrap();
    p.queue
        .add_feedback(&job.id, 4, Some("bonne traduction".to_string()))
        .await
        .unwrap();

    let stored = p.queue.find_job(&job.id).await.unwrap().unwrap();
    let feedback = stored.feedback.unwrap();
    assert_eq!(feedback.rating, 4);
    assert_eq!(feedback.comment.as_deref(), Some("bonne traduction"));
}

/// Full storage path: document rows in SQLite, bytes on disk.
#[tokio::test]
async fn pipeline_over_local_document_store() {
    let pool = create_pool("sqlite::memory:").await.unwrap();
    run_migrations(&pool).await.unwrap();
    let dir = tempfile::tempdir().unwrap();
    let docs = Arc::new(LocalDocumentStore::new(pool.clone(), dir.path()));

    docs.put_file_bytes("documents/statuts.pdf", b"%PDF-1.4 source")
        .await
        .unwrap();
    let doc_id = docs
        .create_document("documents/statuts.pdf", Language::French, 15)
        .await
        .unwrap();

    let time = Arc::new(SystemTimeProvider);
    let queue = Arc::new(TranslationQueue::new(
        Arc::new(SqliteJobRepository::new(pool)),
        docs.clone(),
        Arc::new(SequentialIdProvider::new()),
        time.clone(),
        QueueConfig::default(),
    ));
    let worker = TranslationWorker::new(
        queue.clone(),
        docs.clone(),
        Arc::new(MockTranslationProvider::new_success()),
        Arc::new(MockPdfExtractor::returning("Texte du reglement")),
        Arc::new(MockPdfRenderer::new()),
        time,
        WorkerConfig::default(),
    );

    let job = queue
        .create_job(&doc_id, Language::French, Language::Arabic, &"resident-1".to_string())
        .await
        .unwrap();
    let outcome = worker.process_pending_jobs(10).await.unwrap();
    assert_eq!(outcome.completed, 1);

    let stored = queue.find_job(&job.id).await.unwrap().unwrap();
    let result_meta = docs
        .get_document(&stored.result_document_id.unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(result_meta.language, Some(Language::Arabic));

    // Rendered bytes really landed on disk under the content root
    let rendered = docs.get_file_bytes(&result_meta.file_path).await.unwrap();
    assert!(!rendered.is_empty());
    assert_eq!(result_meta.size_bytes, rendered.len() as i64);
}

/// Duplicate guard spans the whole active window, then releases.
#[tokio::test]
async fn duplicate_guard_follows_job_lifecycle() {
    let p = pipeline().await;
    let user = "resident-1".to_string();
    p.queue
        .create_job("doc-1", Language::French, Language::Arabic, &user)
        .await
        .unwrap();

    let err = p
        .queue
        .create_job("doc-1", Language::French, Language::Arabic, &user)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // A different target is allowed
    p.queue
        .create_job("doc-1", Language::French, Language::English, &user)
        .await
        .unwrap();

    // After completion the pair frees up
    p.worker.process_pending_jobs(10).await.unwrap();
    p.queue
        .create_job("doc-1", Language::French, Language::Arabic, &user)
        .await
        .unwrap();
}
