// Unicode Fallback Font Acquisition
//
// The renderer's builtin fonts only cover Latin-1. Documents with text
// beyond U+00FF (Arabic output in particular) need an external TTF,
// fetched over HTTP and cached on disk so repeated renders stay local.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use transdoc_core::domain::StepError;

#[async_trait]
pub trait FontFetcher: Send + Sync {
    /// Return the fallback font's TTF bytes.
    async fn fetch(&self) -> Result<Vec<u8>, StepError>;
}

pub struct HttpFontFetcher {
    client: reqwest::Client,
    url: String,
    cache_path: Option<PathBuf>,
}

impl HttpFontFetcher {
    pub fn new(url: impl Into<String>, cache_path: Option<PathBuf>) -> Result<Self, StepError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| StepError::permanent(format!("font client init failed: {e}")))?;

        Ok(Self {
            client,
            url: url.into(),
            cache_path,
        })
    }

    async fn read_cache(&self) -> Option<Vec<u8>> {
        let path = self.cache_path.as_ref()?;
        match tokio::fs::read(path).await {
            Ok(bytes) if !bytes.is_empty() => {
                debug!(path = %path.display(), "Fallback font served from cache");
                Some(bytes)
            }
            _ => None,
        }
    }

    async fn write_cache(&self, bytes: &[u8]) {
        let Some(path) = self.cache_path.as_ref() else {
            return;
        };
        if let Some(parent) = path.parent() {
            let _ = tokio::fs::create_dir_all(parent).await;
        }
        // Cache write failure is not fatal; the next render refetches.
        if let Err(e) = tokio::fs::write(path, bytes).await {
            warn!(path = %path.display(), error = %e, "Failed to cache fallback font");
        }
    }
}

#[async_trait]
impl FontFetcher for HttpFontFetcher {
    async fn fetch(&self) -> Result<Vec<u8>, StepError> {
        if let Some(bytes) = self.read_cache().await {
            return Ok(bytes);
        }

        info!(url = %self.url, "Fetching Unicode fallback font");
        let response = self.client.get(&self.url).send().await.map_err(|e| {
            StepError::transient(format!("font download failed: {e}"))
        })?;

        let status = response.status();
        if !status.is_success() {
            // A missing font URL is a deployment problem; server-side
            // errors are worth retrying.
            let message = format!("font download failed with status {status}");
            return if status.is_server_error() {
                Err(StepError::transient(message))
            } else {
                Err(StepError::permanent(message))
            };
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| StepError::transient(format!("font download interrupted: {e}")))?
            .to_vec();

        if bytes.is_empty() {
            return Err(StepError::permanent("font download returned empty body".to_string()));
        }

        self.write_cache(&bytes).await;
        Ok(bytes)
    }
}

pub mod mocks {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fetcher serving fixed bytes and counting invocations
    pub struct CountingFontFetcher {
        bytes: Vec<u8>,
        count: AtomicUsize,
    }

    impl CountingFontFetcher {
        pub fn serving(bytes: Vec<u8>) -> Self {
            Self {
                bytes,
                count: AtomicUsize::new(0),
            }
        }

        pub fn calls(&self) -> usize {
            self.count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl FontFetcher for CountingFontFetcher {
        async fn fetch(&self) -> Result<Vec<u8>, StepError> {
            self.count.fetch_add(1, Ordering::SeqCst);
            Ok(self.bytes.clone())
        }
    }
}
