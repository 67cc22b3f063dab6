// Site data loading
// translations.json and hotels.json are fetched through a DataSource. Every fetch
// runs as a LoadTask that can be cancelled; a failed or cancelled load leaves the
// feature on its empty default instead of failing the page.

use crate::hotels::{parse_hotels, Hotel};
use crate::i18n::TranslationCatalog;
use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    #[error("HTTP {status} for {path}")]
    HttpStatus { status: u16, path: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParseError(#[from] serde_json::Error),

    #[error("Load cancelled")]
    Cancelled,

    #[error("Task failed: {0}")]
    TaskFailed(String),
}

#[derive(Debug, Clone)]
pub struct LoaderConfig {
    pub base_url: String,
    pub translations_path: String,
    pub hotels_path: String,
    pub timeout_ms: u64,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            translations_path: "data/translations.json".to_string(),
            hotels_path: "data/hotels.json".to_string(),
            timeout_ms: 10_000,
        }
    }
}

// Anything that can hand back the bytes of a site data file
#[async_trait]
pub trait DataSource: Send + Sync + 'static {
    async fn fetch(&self, path: &str) -> Result<Bytes, LoadError>;
}

pub struct HttpDataSource {
    client: reqwest::Client,
    base_url: String,
    timeout_ms: u64,
}

impl HttpDataSource {
    pub fn new(config: &LoaderConfig) -> Result<Self, LoadError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| LoadError::NetworkError(e.to_string()))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout_ms: config.timeout_ms,
        })
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches("./").trim_start_matches('/'))
    }

    fn map_error(&self, err: reqwest::Error) -> LoadError {
        if err.is_timeout() {
            LoadError::Timeout(self.timeout_ms)
        } else {
            LoadError::NetworkError(err.to_string())
        }
    }
}

#[async_trait]
impl DataSource for HttpDataSource {
    async fn fetch(&self, path: &str) -> Result<Bytes, LoadError> {
        let url = self.url_for(path);
        tracing::debug!(%url, "Fetching site data");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::HttpStatus {
                status: status.as_u16(),
                path: path.to_string(),
            });
        }

        response.bytes().await.map_err(|e| self.map_error(e))
    }
}

// Reads data files from a local directory, e.g. a checked-out `public/` folder
pub struct FsDataSource {
    root: PathBuf,
}

impl FsDataSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl DataSource for FsDataSource {
    async fn fetch(&self, path: &str) -> Result<Bytes, LoadError> {
        let full = self.root.join(path.trim_start_matches("./").trim_start_matches('/'));
        match tokio::fs::read(&full).await {
            Ok(bytes) => Ok(Bytes::from(bytes)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(LoadError::NotFound(full.display().to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }
}

// Preloaded documents served from memory, with an optional artificial delay
#[derive(Default)]
pub struct MemoryDataSource {
    documents: DashMap<String, Bytes>,
    delay: Option<Duration>,
}

impl MemoryDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn insert(&self, path: &str, body: impl Into<Bytes>) {
        self.documents.insert(path.to_string(), body.into());
    }
}

#[async_trait]
impl DataSource for MemoryDataSource {
    async fn fetch(&self, path: &str) -> Result<Bytes, LoadError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.documents
            .get(path)
            .map(|body| body.clone())
            .ok_or_else(|| LoadError::NotFound(path.to_string()))
    }
}

#[derive(Debug)]
pub enum TaskOutcome<T> {
    Completed(T),
    Failed(LoadError),
    Cancelled,
}

impl<T> TaskOutcome<T> {
    pub fn ok(self) -> Option<T> {
        match self {
            TaskOutcome::Completed(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, TaskOutcome::Completed(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, TaskOutcome::Cancelled)
    }

    pub fn into_result(self) -> Result<T, LoadError> {
        match self {
            TaskOutcome::Completed(value) => Ok(value),
            TaskOutcome::Failed(err) => Err(err),
            TaskOutcome::Cancelled => Err(LoadError::Cancelled),
        }
    }
}

impl<T: Default> TaskOutcome<T> {
    // Degrades to the empty default, logging why
    pub fn or_default(self, what: &str) -> T {
        match self {
            TaskOutcome::Completed(value) => value,
            TaskOutcome::Failed(err) => {
                tracing::error!(what, error = %err, "Load failed, continuing with defaults");
                T::default()
            }
            TaskOutcome::Cancelled => {
                tracing::info!(what, "Load cancelled, continuing with defaults");
                T::default()
            }
        }
    }
}

/// A spawned fetch with its own cancellation token.
///
/// The token is a child of the token passed to [`LoadTask::spawn`], so
/// cancelling the parent cancels every task spawned from it.
pub struct LoadTask<T> {
    name: &'static str,
    token: CancellationToken,
    handle: JoinHandle<TaskOutcome<T>>,
}

impl<T: Send + 'static> LoadTask<T> {
    pub fn spawn<F>(name: &'static str, parent: &CancellationToken, work: F) -> Self
    where
        F: Future<Output = Result<T, LoadError>> + Send + 'static,
    {
        let token = parent.child_token();
        let task_token = token.clone();
        let handle = tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = task_token.cancelled() => TaskOutcome::Cancelled,
                result = work => match result {
                    Ok(value) => TaskOutcome::Completed(value),
                    Err(err) => TaskOutcome::Failed(err),
                },
            }
        });

        tracing::debug!(task = name, "Load task started");
        Self {
            name,
            token,
            handle,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub async fn join(self) -> TaskOutcome<T> {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(err) if err.is_cancelled() => TaskOutcome::Cancelled,
            Err(err) => TaskOutcome::Failed(LoadError::TaskFailed(err.to_string())),
        }
    }
}

pub async fn fetch_translations(
    source: Arc<dyn DataSource>,
    path: String,
) -> Result<TranslationCatalog, LoadError> {
    let bytes = source.fetch(&path).await?;
    Ok(TranslationCatalog::from_slice(&bytes)?)
}

pub async fn fetch_hotels(source: Arc<dyn DataSource>, path: String) -> Result<Vec<Hotel>, LoadError> {
    let bytes = source.fetch(&path).await?;
    Ok(parse_hotels(&bytes)?)
}

#[derive(Debug, Default)]
pub struct SiteData {
    pub translations: TranslationCatalog,
    pub hotels: Vec<Hotel>,
}

/// Loads translations and hotels concurrently; returns once both have settled.
pub async fn load_site_data(
    source: Arc<dyn DataSource>,
    config: &LoaderConfig,
    cancel: &CancellationToken,
) -> SiteData {
    let translations = LoadTask::spawn(
        "translations",
        cancel,
        fetch_translations(source.clone(), config.translations_path.clone()),
    );
    let hotels = LoadTask::spawn(
        "hotels",
        cancel,
        fetch_hotels(source, config.hotels_path.clone()),
    );

    let (translations, hotels) = futures::join!(translations.join(), hotels.join());

    SiteData {
        translations: translations.or_default("translations"),
        hotels: hotels.or_default("hotels"),
    }
}
