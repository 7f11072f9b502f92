// Translation Routes

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use transdoc_core::application::worker::constants::DEFAULT_CLAIM_LIMIT;
use transdoc_core::application::{TranslationQueue, TranslationWorker};
use transdoc_core::AppError;

use crate::auth::AuthProvider;
use crate::dto::{parse_body, parse_language, CreateJobRequest, JobAction, ListQuery, WorkerAction};
use crate::error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub queue: Arc<TranslationQueue>,
    pub worker: Arc<TranslationWorker>,
    pub auth: Arc<dyn AuthProvider>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/translations", post(create_job).get(list_jobs))
        .route("/translations/worker", get(worker_health).post(worker_action))
        .route(
            "/translations/:id",
            get(get_job).patch(patch_job).delete(delete_job),
        )
        .with_state(state)
}

async fn create_job(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Result<impl IntoResponse, ApiError> {
    let auth = state.auth.authenticate(&headers)?;
    let request: CreateJobRequest = parse_body(body)?;

    let source = parse_language(&request.source_language)?;
    let target = parse_language(&request.target_language)?;

    let job = state
        .queue
        .create_job(&request.document_id, source, target, &auth.user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(job)))
}

async fn list_jobs(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<Response, ApiError> {
    let auth = state.auth.authenticate(&headers)?;

    if query.stats.unwrap_or(false) {
        auth.require_admin()?;
        let stats = state.queue.get_stats().await?;
        return Ok(Json(stats).into_response());
    }

    let document_id = query.document_id.ok_or_else(|| {
        ApiError::App(AppError::Validation(
            "document_id query parameter is required".to_string(),
        ))
    })?;

    let jobs = state.queue.list_for_document(&document_id).await?;
    Ok(Json(jobs).into_response())
}

async fn get_job(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.auth.authenticate(&headers)?;
    let job = state
        .queue
        .find_job(&id)
        .await?
        .ok_or_else(|| ApiError::App(AppError::NotFound(format!("Job {id} not found"))))?;
    Ok(Json(job))
}

async fn patch_job(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> Result<impl IntoResponse, ApiError> {
    state.auth.authenticate(&headers)?;

    match parse_body::<JobAction>(body)? {
        JobAction::AddFeedback { rating, comment } => {
            state.queue.add_feedback(&id, rating, comment).await?;
        }
        JobAction::Cancel => {
            state.queue.cancel(&id).await?;
        }
    }

    let job = state
        .queue
        .find_job(&id)
        .await?
        .ok_or_else(|| ApiError::App(AppError::NotFound(format!("Job {id} not found"))))?;
    Ok(Json(job))
}

async fn delete_job(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.auth.authenticate(&headers)?;
    state.queue.cancel(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn worker_health(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    state.auth.authenticate(&headers)?.require_admin()?;
    let health = state.worker.health_check().await?;
    Ok(Json(health))
}

async fn worker_action(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Result<impl IntoResponse, ApiError> {
    state.auth.authenticate(&headers)?.require_admin()?;

    let response = match parse_body::<WorkerAction>(body)? {
        WorkerAction::Start => {
            state.worker.start().await?;
            json!({ "running": true })
        }
        WorkerAction::Stop => {
            state.worker.stop().await?;
            json!({ "running": false })
        }
        WorkerAction::Process { limit } => {
            let outcome = state
                .worker
                .process_pending_jobs(limit.unwrap_or(DEFAULT_CLAIM_LIMIT))
                .await?;
            serde_json::to_value(outcome).map_err(AppError::from)?
        }
        WorkerAction::ProcessJob { job_id } => {
            let status = state.worker.process_job(&job_id).await?;
            json!({ "job_id": job_id, "status": status })
        }
        WorkerAction::RecoverStalled => {
            let recovered = state.worker.recover_stalled_jobs().await?;
            json!({ "recovered": recovered })
        }
        WorkerAction::RetryFailed { force } => {
            let reset = state
                .worker
                .retry_failed_jobs(force.unwrap_or(false))
                .await?;
            json!({ "reset": reset })
        }
        WorkerAction::CleanupOrphaned => {
            let report = state.worker.cleanup_orphaned_jobs().await?;
            serde_json::to_value(report).map_err(AppError::from)?
        }
    };

    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::HeaderAuthProvider;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;
    use transdoc_core::application::{QueueConfig, WorkerConfig};
    use transdoc_core::port::document_store::mocks::InMemoryDocumentStore;
    use transdoc_core::port::id_provider::mocks::SequentialIdProvider;
    use transdoc_core::port::job_repository::mocks::InMemoryJobRepository;
    use transdoc_core::port::pdf_engine::mocks::{MockPdfExtractor, MockPdfRenderer};
    use transdoc_core::port::time_provider::mocks::FixedTimeProvider;
    use transdoc_core::port::translation_provider::mocks::MockTranslationProvider;

    fn app() -> Router {
        let repo = Arc::new(InMemoryJobRepository::new());
        let docs = Arc::new(InMemoryDocumentStore::new());
        docs.add_document("doc-1", "documents/statuts.pdf", b"%PDF fake".to_vec());
        let time = Arc::new(FixedTimeProvider::new(1_000));
        let queue = Arc::new(TranslationQueue::new(
            repo,
            docs.clone(),
            Arc::new(SequentialIdProvider::new()),
            time.clone(),
            QueueConfig::default(),
        ));
        let worker = Arc::new(TranslationWorker::new(
            queue.clone(),
            docs,
            Arc::new(MockTranslationProvider::new_success()),
            Arc::new(MockPdfExtractor::returning("Bonjour")),
            Arc::new(MockPdfRenderer::new()),
            time,
            WorkerConfig::default(),
        ));
        router(AppState {
            queue,
            worker,
            auth: Arc::new(HeaderAuthProvider),
        })
    }

    fn request(method: &str, uri: &str, user: Option<(&str, &str)>, body: Option<serde_json::Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some((id, role)) = user {
            builder = builder.header("x-user-id", id).header("x-user-role", role);
        }
        match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    fn create_body() -> serde_json::Value {
        json!({
            "document_id": "doc-1",
            "source_language": "french",
            "target_language": "arabic"
        })
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn unauthenticated_requests_are_rejected() {
        let app = app();
        let response = app
            .oneshot(request("POST", "/translations", None, Some(create_body())))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn create_then_duplicate_conflict() {
        let app = app();
        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/translations",
                Some(("u1", "member")),
                Some(create_body()),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let job = json_body(response).await;
        assert_eq!(job["status"], "pending");
        assert_eq!(job["requested_by"], "u1");

        let response = app
            .oneshot(request(
                "POST",
                "/translations",
                Some(("u2", "member")),
                Some(create_body()),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn invalid_language_is_bad_request() {
        let app = app();
        let response = app
            .oneshot(request(
                "POST",
                "/translations",
                Some(("u1", "member")),
                Some(json!({
                    "document_id": "doc-1",
                    "source_language": "french",
                    "target_language": "klingon"
                })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn missing_document_is_not_found() {
        let app = app();
        let response = app
            .oneshot(request(
                "POST",
                "/translations",
                Some(("u1", "member")),
                Some(json!({
                    "document_id": "ghost",
                    "source_language": "french",
                    "target_language": "arabic"
                })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn worker_endpoints_require_admin() {
        let app = app();
        let response = app
            .clone()
            .oneshot(request(
                "GET",
                "/translations/worker",
                Some(("u1", "member")),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = app
            .oneshot(request(
                "GET",
                "/translations/worker",
                Some(("admin-1", "admin")),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let health = json_body(response).await;
        assert_eq!(health["running"], false);
    }

    #[tokio::test]
    async fn process_action_completes_created_job() {
        let app = app();
        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/translations",
                Some(("u1", "member")),
                Some(create_body()),
            ))
            .await
            .unwrap();
        let job = json_body(response).await;
        let job_id = job["id"].as_str().unwrap().to_string();

        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/translations/worker",
                Some(("admin-1", "admin")),
                Some(json!({ "action": "process" })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let outcome = json_body(response).await;
        assert_eq!(outcome["claimed"], 1);
        assert_eq!(outcome["completed"], 1);

        let response = app
            .oneshot(request(
                "GET",
                &format!("/translations/{job_id}"),
                Some(("u1", "member")),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let job = json_body(response).await;
        assert_eq!(job["status"], "completed");
        assert!(job["result_document_id"].is_string());
    }

    #[tokio::test]
    async fn unknown_worker_action_is_bad_request() {
        let app = app();
        let response = app
            .oneshot(request(
                "POST",
                "/translations/worker",
                Some(("admin-1", "admin")),
                Some(json!({ "action": "self_destruct" })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn delete_cancels_pending_once() {
        let app = app();
        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/translations",
                Some(("u1", "member")),
                Some(create_body()),
            ))
            .await
            .unwrap();
        let job = json_body(response).await;
        let job_id = job["id"].as_str().unwrap().to_string();

        let response = app
            .clone()
            .oneshot(request(
                "DELETE",
                &format!("/translations/{job_id}"),
                Some(("u1", "member")),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        // Already cancelled: terminal states refuse
        let response = app
            .oneshot(request(
                "DELETE",
                &format!("/translations/{job_id}"),
                Some(("u1", "member")),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn feedback_via_patch_requires_completed_job() {
        let app = app();
        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/translations",
                Some(("u1", "member")),
                Some(create_body()),
            ))
            .await
            .unwrap();
        let job = json_body(response).await;
        let job_id = job["id"].as_str().unwrap().to_string();

        let response = app
            .clone()
            .oneshot(request(
                "PATCH",
                &format!("/translations/{job_id}"),
                Some(("u1", "member")),
                Some(json!({ "action": "add_feedback", "rating": 5 })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        app.clone()
            .oneshot(request(
                "POST",
                "/translations/worker",
                Some(("admin-1", "admin")),
                Some(json!({ "action": "process" })),
            ))
            .await
            .unwrap();

        let response = app
            .oneshot(request(
                "PATCH",
                &format!("/translations/{job_id}"),
                Some(("u1", "member")),
                Some(json!({ "action": "add_feedback", "rating": 5, "comment": "merci" })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let job = json_body(response).await;
        assert_eq!(job["feedback"]["rating"], 5);
    }

    #[tokio::test]
    async fn stats_query_flag_returns_aggregates_for_admins() {
        let app = app();
        app.clone()
            .oneshot(request(
                "POST",
                "/translations",
                Some(("u1", "member")),
                Some(create_body()),
            ))
            .await
            .unwrap();

        let response = app
            .clone()
            .oneshot(request(
                "GET",
                "/translations?stats=true",
                Some(("u1", "member")),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = app
            .oneshot(request(
                "GET",
                "/translations?stats=true",
                Some(("admin-1", "admin")),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let stats = json_body(response).await;
        assert_eq!(stats["pending"], 1);
        assert_eq!(stats["completed"], 0);
    }

    #[tokio::test]
    async fn list_requires_document_id() {
        let app = app();
        let response = app
            .clone()
            .oneshot(request("GET", "/translations", Some(("u1", "member")), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .oneshot(request(
                "GET",
                "/translations?document_id=doc-1",
                Some(("u1", "member")),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(json_body(response).await.as_array().unwrap().is_empty());
    }
}
