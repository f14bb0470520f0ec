//! Collaborator interfaces: video bytes, font asset, usage counting.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use tokio::sync::Mutex;
use tracing::debug;

/// Collaborator error, carried through the controller unmodified.
pub type SourceError = Box<dyn std::error::Error + Send + Sync>;

/// Resolves original video bytes by video identity.
#[async_trait]
pub trait VideoSource: Send + Sync {
    async fn fetch(&self, video_id: &str) -> Result<Vec<u8>, SourceError>;
}

/// Fetches the caption font file.
#[async_trait]
pub trait FontSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<u8>, SourceError>;
}

/// Fire-and-forget render counting.
///
/// Invoked after a successful render; implementations must swallow
/// their own failures, which never fail the job.
pub trait UsageCounter: Send + Sync {
    fn record_render(&self, video_id: &str);
}

/// Memoizes video bytes per id for the lifetime of the wrapper.
pub struct CachingVideoSource<S> {
    inner: S,
    cache: Mutex<HashMap<String, Arc<Vec<u8>>>>,
}

impl<S: VideoSource> CachingVideoSource<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl<S: VideoSource> VideoSource for CachingVideoSource<S> {
    async fn fetch(&self, video_id: &str) -> Result<Vec<u8>, SourceError> {
        if let Some(bytes) = self.cache.lock().await.get(video_id) {
            debug!("Video bytes cache hit: {}", video_id);
            return Ok(bytes.as_ref().clone());
        }

        let bytes = Arc::new(self.inner.fetch(video_id).await?);
        self.cache
            .lock()
            .await
            .insert(video_id.to_string(), bytes.clone());
        Ok(bytes.as_ref().clone())
    }
}

/// HTTP-backed video source: `GET {base_url}/{video_id}`.
pub struct HttpVideoSource {
    http: Client,
    base_url: String,
}

impl HttpVideoSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl VideoSource for HttpVideoSource {
    async fn fetch(&self, video_id: &str) -> Result<Vec<u8>, SourceError> {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), video_id);
        debug!("Fetching video bytes from {}", url);

        let response = self.http.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(format!("Video source returned {}", response.status()).into());
        }

        Ok(response.bytes().await?.to_vec())
    }
}

/// HTTP-backed font source for a fixed font URL.
pub struct HttpFontSource {
    http: Client,
    font_url: String,
}

impl HttpFontSource {
    pub fn new(font_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            font_url: font_url.into(),
        }
    }
}

#[async_trait]
impl FontSource for HttpFontSource {
    async fn fetch(&self) -> Result<Vec<u8>, SourceError> {
        debug!("Fetching caption font from {}", self.font_url);

        let response = self.http.get(&self.font_url).send().await?;
        if !response.status().is_success() {
            return Err(format!("Font source returned {}", response.status()).into());
        }

        Ok(response.bytes().await?.to_vec())
    }
}

/// Usage counter over the `metrics` facade.
pub struct MetricsUsageCounter;

impl UsageCounter for MetricsUsageCounter {
    fn record_render(&self, video_id: &str) {
        metrics::counter!("capstudio_renders_total").increment(1);
        debug!("Recorded render for video {}", video_id);
    }
}

/// Usage counter that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopUsageCounter;

impl UsageCounter for NoopUsageCounter {
    fn record_render(&self, video_id: &str) {
        let _ = video_id;
    }
}
