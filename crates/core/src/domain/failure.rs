// Tagged step failures
//
// Every collaborator the worker calls (document store, PDF engine,
// translation provider) reports failures through this one type, so the
// retry decision is a single switch on `kind` instead of string matching.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Whether a failed pipeline step is worth retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// Expected to succeed on a later attempt (timeouts, rate limits, 5xx).
    Transient,
    /// Retrying cannot fix it (corrupt input, missing object, bad credentials).
    Permanent,
}

/// Failure of a single worker pipeline step.
#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct StepError {
    pub kind: FailureKind,
    pub message: String,
}

impl StepError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Transient,
            message: message.into(),
        }
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Permanent,
            message: message.into(),
        }
    }

    pub fn is_transient(&self) -> bool {
        self.kind == FailureKind::Transient
    }
}
