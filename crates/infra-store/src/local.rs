// Local Document Store
//
// Metadata rows live in the shared SQLite database (documents table),
// binary content lives on disk under a content root. Storage keys are
// relative paths; absolute keys and parent traversal are rejected.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::debug;

use transdoc_core::domain::{DocumentId, Language, StepError};
use transdoc_core::port::{DocumentMeta, DocumentStore};

pub struct LocalDocumentStore {
    pool: SqlitePool,
    content_root: PathBuf,
}

impl LocalDocumentStore {
    pub fn new(pool: SqlitePool, content_root: impl Into<PathBuf>) -> Self {
        Self {
            pool,
            content_root: content_root.into(),
        }
    }

    /// Resolve a storage key against the content root, rejecting
    /// absolute paths and `..` components.
    fn resolve(&self, file_path: &str) -> Result<PathBuf, StepError> {
        let rel = Path::new(file_path);
        if rel.is_absolute() {
            return Err(StepError::permanent(format!(
                "absolute storage key not allowed: {file_path}"
            )));
        }
        for component in rel.components() {
            match component {
                Component::Normal(_) | Component::CurDir => {}
                _ => {
                    return Err(StepError::permanent(format!(
                        "invalid storage key: {file_path}"
                    )))
                }
            }
        }
        Ok(self.content_root.join(rel))
    }
}

fn io_step_error(context: &str, err: std::io::Error) -> StepError {
    // A missing object will never appear by retrying; everything else
    // (permissions, disk pressure) might clear up.
    if err.kind() == std::io::ErrorKind::NotFound {
        StepError::permanent(format!("{context}: {err}"))
    } else {
        StepError::transient(format!("{context}: {err}"))
    }
}

fn db_step_error(context: &str, err: sqlx::Error) -> StepError {
    StepError::transient(format!("{context}: {err}"))
}

#[async_trait]
impl DocumentStore for LocalDocumentStore {
    async fn get_document(&self, id: &str) -> Result<Option<DocumentMeta>, StepError> {
        let row: Option<(String, String, Option<String>, Option<String>, i64)> = sqlx::query_as(
            "SELECT id, file_path, title, language, size_bytes FROM documents WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_step_error("document lookup failed", e))?;

        let Some((id, file_path, title, language, size_bytes)) = row else {
            return Ok(None);
        };

        let language = match language {
            Some(code) => Some(
                Language::parse(&code)
                    .map_err(|e| StepError::permanent(format!("corrupt document row: {e}")))?,
            ),
            None => None,
        };

        Ok(Some(DocumentMeta {
            id,
            file_path,
            title,
            language,
            size_bytes,
        }))
    }

    async fn get_file_bytes(&self, file_path: &str) -> Result<Vec<u8>, StepError> {
        let path = self.resolve(file_path)?;
        debug!(key = file_path, "Reading document content");
        tokio::fs::read(&path)
            .await
            .map_err(|e| io_step_error("content read failed", e))
    }

    async fn put_file_bytes(&self, file_path: &str, bytes: &[u8]) -> Result<(), StepError> {
        let path = self.resolve(file_path)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_step_error("content dir create failed", e))?;
        }
        debug!(key = file_path, size = bytes.len(), "Writing document content");
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| io_step_error("content write failed", e))
    }

    async fn create_document(
        &self,
        file_path: &str,
        language: Language,
        size_bytes: i64,
    ) -> Result<DocumentId, StepError> {
        let id = uuid::Uuid::new_v4().to_string();
        let created_at = chrono::Utc::now().timestamp_millis();

        sqlx::query(
            r#"
            INSERT INTO documents (id, file_path, title, language, size_bytes, created_at)
            VALUES (?, ?, NULL, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(file_path)
        .bind(language.as_str())
        .bind(size_bytes)
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| db_step_error("document insert failed", e))?;

        Ok(id)
    }
}
