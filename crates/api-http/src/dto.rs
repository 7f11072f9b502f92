// Request Payloads
//
// Bodies are parsed from raw JSON values so malformed input uniformly
// produces 400 rather than the extractor's default 422.

use serde::Deserialize;

use transdoc_core::domain::Language;
use transdoc_core::AppError;

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    pub document_id: String,
    pub source_language: String,
    pub target_language: String,
}

/// `GET /translations` query: either a document listing or, with
/// `stats=true`, the aggregate queue counters.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub document_id: Option<String>,
    pub stats: Option<bool>,
}

/// `PATCH /translations/:id` body
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum JobAction {
    AddFeedback {
        rating: u8,
        comment: Option<String>,
    },
    Cancel,
}

/// `POST /translations/worker` body
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum WorkerAction {
    Start,
    Stop,
    Process {
        limit: Option<u32>,
    },
    ProcessJob {
        job_id: String,
    },
    RecoverStalled,
    RetryFailed {
        force: Option<bool>,
    },
    CleanupOrphaned,
}

pub fn parse_body<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> Result<T, ApiError> {
    serde_json::from_value(value)
        .map_err(|e| ApiError::App(AppError::Validation(format!("invalid request body: {e}"))))
}

pub fn parse_language(value: &str) -> Result<Language, ApiError> {
    Language::parse(value).map_err(|e| ApiError::App(AppError::Validation(e.to_string())))
}
