//! Export asset loading.
//!
//! The header photo is resolved through `AssetLoader`, both when a photo URL
//! is attached and when an export needs the pixels. Every load is bounded by
//! a timeout and reports a tagged outcome instead of an error. Remote loads
//! are cached by URL, so the export after an attach and concurrent exports of
//! the same photo share a single fetch.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::document::photo::decode_data_url;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("remote returned status {0}")]
    Status(u16),

    #[error("unsupported asset reference '{0}': only data: and http(s) URLs are loaded")]
    Unsupported(String),

    #[error("could not decode asset: {0}")]
    Decode(String),
}

/// Where an asset comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetSource {
    /// An inline `data:` URL. Decoded directly and never cached.
    DataUrl(String),
    /// An http(s) URL, fetched through the `RemoteFetcher`.
    Remote(String),
}

impl AssetSource {
    /// Anything other than a `data:` or http(s) URL is refused, so a stored
    /// reference can never name a path on the server.
    pub fn parse(reference: &str) -> Result<AssetSource, AssetError> {
        let reference = reference.trim();
        if reference.starts_with("data:") {
            Ok(AssetSource::DataUrl(reference.to_string()))
        } else if reference.starts_with("http://") || reference.starts_with("https://") {
            Ok(AssetSource::Remote(reference.to_string()))
        } else {
            let shown: String = reference.chars().take(64).collect();
            Err(AssetError::Unsupported(shown))
        }
    }

    fn cache_key(&self) -> Option<&str> {
        match self {
            AssetSource::DataUrl(_) => None,
            AssetSource::Remote(url) => Some(url),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub mime: String,
    pub bytes: Bytes,
}

#[derive(Debug, Clone)]
pub enum LoadOutcome {
    Loaded(Arc<Asset>),
    Failed(String),
    TimedOut,
}

impl LoadOutcome {
    pub fn asset(&self) -> Option<&Arc<Asset>> {
        match self {
            LoadOutcome::Loaded(asset) => Some(asset),
            _ => None,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Remote fetching
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait RemoteFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Asset, AssetError>;
}

/// Fetches remote assets over HTTP with reqwest.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl RemoteFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Asset, AssetError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AssetError::Status(status.as_u16()));
        }
        let mime = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let bytes = response.bytes().await?;
        Ok(Asset { mime, bytes })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Loader
// ────────────────────────────────────────────────────────────────────────────

type Slot = Arc<OnceCell<Arc<Asset>>>;

pub struct AssetLoader {
    fetcher: Arc<dyn RemoteFetcher>,
    timeout: Duration,
    cache: Mutex<HashMap<String, Slot>>,
}

impl AssetLoader {
    pub fn new(fetcher: Arc<dyn RemoteFetcher>, timeout: Duration) -> Self {
        Self {
            fetcher,
            timeout,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Loads `source`, giving up after the configured timeout.
    ///
    /// A timed-out or failed load leaves nothing in the cache, so a later
    /// call tries again.
    pub async fn load(&self, source: &AssetSource) -> LoadOutcome {
        match tokio::time::timeout(self.timeout, self.resolve(source)).await {
            Ok(Ok(asset)) => LoadOutcome::Loaded(asset),
            Ok(Err(e)) => {
                warn!(source = ?source_label(source), error = %e, "Asset load failed");
                LoadOutcome::Failed(e.to_string())
            }
            Err(_) => {
                warn!(
                    source = ?source_label(source),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Asset load timed out"
                );
                LoadOutcome::TimedOut
            }
        }
    }

    pub fn cached_count(&self) -> usize {
        self.cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .values()
            .filter(|slot| slot.initialized())
            .count()
    }

    async fn resolve(&self, source: &AssetSource) -> Result<Arc<Asset>, AssetError> {
        let Some(key) = source.cache_key() else {
            return fetch_uncached(source, self.fetcher.as_ref()).await.map(Arc::new);
        };

        let slot = {
            let mut cache = self
                .cache
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            Arc::clone(cache.entry(key.to_string()).or_default())
        };

        let asset = slot
            .get_or_try_init(|| async {
                debug!(source = ?source_label(source), "Fetching asset");
                fetch_uncached(source, self.fetcher.as_ref()).await.map(Arc::new)
            })
            .await?;
        Ok(Arc::clone(asset))
    }
}

async fn fetch_uncached(source: &AssetSource, fetcher: &dyn RemoteFetcher) -> Result<Asset, AssetError> {
    match source {
        AssetSource::DataUrl(url) => {
            let (mime, bytes) = decode_data_url(url).map_err(|e| AssetError::Decode(e.to_string()))?;
            Ok(Asset {
                mime,
                bytes: Bytes::from(bytes),
            })
        }
        AssetSource::Remote(url) => fetcher.fetch(url).await,
    }
}

/// Short form for logs; data URLs can be megabytes long.
fn source_label(source: &AssetSource) -> String {
    match source {
        AssetSource::DataUrl(url) => format!("data URL ({} chars)", url.len()),
        AssetSource::Remote(url) => url.clone(),
    }
}
