// Document Store Port (Interface)
//
// The portal's document storage (metadata + binary content) is an external
// collaborator. The pipeline only needs lookups, byte transfer, and
// registration of the translated output.

use crate::domain::{DocumentId, Language, StepError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// The minimal document shape the pipeline depends on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMeta {
    pub id: DocumentId,
    /// Storage key, relative to the store's content root
    pub file_path: String,
    pub title: Option<String>,
    pub language: Option<Language>,
    pub size_bytes: i64,
}

/// Document store interface
///
/// Errors carry a transient/permanent tag: network blips are transient,
/// a genuinely missing object is permanent.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Look up document metadata. `Ok(None)` means the document does not exist.
    async fn get_document(&self, id: &str) -> Result<Option<DocumentMeta>, StepError>;

    /// Fetch binary content by storage key.
    async fn get_file_bytes(&self, file_path: &str) -> Result<Vec<u8>, StepError>;

    /// Store binary content under a storage key.
    async fn put_file_bytes(&self, file_path: &str, bytes: &[u8]) -> Result<(), StepError>;

    /// Register a new document record for stored content, returning its id.
    async fn create_document(
        &self,
        file_path: &str,
        language: Language,
        size_bytes: i64,
    ) -> Result<DocumentId, StepError>;
}

pub mod mocks {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;

    /// In-memory document store for tests
    pub struct InMemoryDocumentStore {
        docs: Mutex<HashMap<DocumentId, DocumentMeta>>,
        files: Mutex<HashMap<String, Vec<u8>>>,
        counter: AtomicU64,
        /// When set, get_file_bytes fails with this error (failure injection)
        fetch_error: Mutex<Option<StepError>>,
    }

    impl InMemoryDocumentStore {
        pub fn new() -> Self {
            Self {
                docs: Mutex::new(HashMap::new()),
                files: Mutex::new(HashMap::new()),
                counter: AtomicU64::new(1),
                fetch_error: Mutex::new(None),
            }
        }

        /// Seed a document with content (test setup helper)
        pub fn add_document(&self, id: &str, file_path: &str, bytes: Vec<u8>) {
            self.docs.lock().unwrap().insert(
                id.to_string(),
                DocumentMeta {
                    id: id.to_string(),
                    file_path: file_path.to_string(),
                    title: None,
                    language: None,
                    size_bytes: bytes.len() as i64,
                },
            );
            self.files
                .lock()
                .unwrap()
                .insert(file_path.to_string(), bytes);
        }

        pub fn remove_document(&self, id: &str) {
            self.docs.lock().unwrap().remove(id);
        }

        pub fn fail_fetches_with(&self, err: StepError) {
            *self.fetch_error.lock().unwrap() = Some(err);
        }

        pub fn file(&self, file_path: &str) -> Option<Vec<u8>> {
            self.files.lock().unwrap().get(file_path).cloned()
        }
    }

    impl Default for InMemoryDocumentStore {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl DocumentStore for InMemoryDocumentStore {
        async fn get_document(&self, id: &str) -> Result<Option<DocumentMeta>, StepError> {
            Ok(self.docs.lock().unwrap().get(id).cloned())
        }

        async fn get_file_bytes(&self, file_path: &str) -> Result<Vec<u8>, StepError> {
            if let Some(err) = self.fetch_error.lock().unwrap().clone() {
                return Err(err);
            }
            self.files
                .lock()
                .unwrap()
                .get(file_path)
                .cloned()
                .ok_or_else(|| StepError::permanent(format!("file not found: {file_path}")))
        }

        async fn put_file_bytes(&self, file_path: &str, bytes: &[u8]) -> Result<(), StepError> {
            self.files
                .lock()
                .unwrap()
                .insert(file_path.to_string(), bytes.to_vec());
            Ok(())
        }

        async fn create_document(
            &self,
            file_path: &str,
            language: Language,
            size_bytes: i64,
        ) -> Result<DocumentId, StepError> {
            let id = format!("doc-gen-{}", self.counter.fetch_add(1, Ordering::SeqCst));
            self.docs.lock().unwrap().insert(
                id.clone(),
                DocumentMeta {
                    id: id.clone(),
                    file_path: file_path.to_string(),
                    title: None,
                    language: Some(language),
                    size_bytes,
                },
            );
            Ok(id)
        }
    }
}
