//! Builtin sequential HTTP fetch.

use std::time::Duration;

use async_trait::async_trait;
use comfyops_core::weights::FetchError;
use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;

use super::{FetchJob, FetchStrategy};
use crate::progress::{ProgressCallback, ProgressThrottle};

/// Longest a transfer may sit without receiving data.
///
/// There is no cap on the whole transfer; large checkpoints take as long as
/// they take.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(600);

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Streams one URL at a time with reqwest.
pub struct BuiltinSequentialFetch {
    client: reqwest::Client,
    progress: Option<ProgressCallback>,
}

impl BuiltinSequentialFetch {
    /// Create a fetcher with the given user agent and idle timeout.
    pub fn new(user_agent: &str, idle_timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .connect_timeout(CONNECT_TIMEOUT.min(idle_timeout))
            .read_timeout(idle_timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Falling back to default HTTP client");
                reqwest::Client::new()
            });

        Self {
            client,
            progress: None,
        }
    }

    #[must_use]
    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Stream the response body into the temporary file.
    async fn transfer(&self, job: &FetchJob) -> Result<(), FetchError> {
        let tmp = job.temp_path();

        let response = self
            .client
            .get(&job.url)
            .send()
            .await
            .map_err(|e| FetchError::network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
                url: job.url.clone(),
            });
        }

        let total = response.content_length().unwrap_or(0);
        let mut file = tokio::fs::File::create(&tmp)
            .await
            .map_err(|e| FetchError::from_io_error(&e))?;

        let mut throttle = ProgressThrottle::default();
        let mut downloaded: u64 = 0;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| FetchError::network(e.to_string()))?;
            file.write_all(&chunk)
                .await
                .map_err(|e| FetchError::from_io_error(&e))?;
            downloaded += chunk.len() as u64;

            if let Some(cb) = &self.progress {
                if throttle.should_emit() {
                    cb(&job.destination, downloaded, total);
                }
            }
        }

        file.flush().await.map_err(|e| FetchError::from_io_error(&e))?;
        drop(file);

        if let Some(cb) = &self.progress {
            cb(&job.destination, downloaded, total.max(downloaded));
        }

        tokio::fs::rename(&tmp, &job.destination)
            .await
            .map_err(|e| FetchError::from_io_error(&e))
    }
}

#[async_trait]
impl FetchStrategy for BuiltinSequentialFetch {
    fn name(&self) -> &'static str {
        "builtin"
    }

    async fn fetch(&self, job: &FetchJob) -> Result<(), FetchError> {
        tracing::debug!(url = %job.url, dest = %job.destination.display(), "Fetching");

        let result = self.transfer(job).await;
        if result.is_err() {
            // Never leave a partial file behind.
            let _ = tokio::fs::remove_file(job.temp_path()).await;
        }
        result
    }
}
