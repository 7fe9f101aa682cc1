//! Narrative data sources.
//!
//! A `NarrativeSource` supplies the work index, the place registry, and
//! chapter node files. The store does not care whether the backing is the
//! filesystem, a network service, or an in-memory fixture.
//!
//! New sources can be added by implementing the `NarrativeSource` trait.

use std::collections::BTreeMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use crate::model::{ChapterData, PlacesData, WorkIndex};

/// Error type for narrative source operations.
#[derive(Debug)]
pub struct SourceError {
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for SourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as _)
    }
}

impl SourceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Type alias for a boxed future that can be sent between threads.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Trait for narrative data backends.
///
/// Implementations must be `Send + Sync` for use across async tasks.
/// Methods return boxed futures for dyn-compatibility.
pub trait NarrativeSource: Send + Sync {
    /// Load the work index (`index.json`).
    fn load_work_index(&self) -> BoxFuture<'_, Result<WorkIndex, SourceError>>;

    /// Load the place registry data (`geo/places.json`).
    fn load_places(&self) -> BoxFuture<'_, Result<PlacesData, SourceError>>;

    /// Load one chapter's node file.
    ///
    /// Returns `Ok(None)` if the chapter doesn't exist.
    fn load_chapter(
        &self,
        volume: u32,
        chapter: u32,
    ) -> BoxFuture<'_, Result<Option<ChapterData>, SourceError>>;
}

/// Filesystem-backed source using the content pipeline's directory layout:
/// `index.json`, `geo/places.json`, `nodes/v{vv}/c{cc}.json`.
pub struct FsSource {
    root: PathBuf,
}

impl FsSource {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        &self,
        rel: &str,
    ) -> Result<Option<T>, SourceError> {
        let path = self.root.join(rel);
        let bytes = match tokio::fs::read(&path).await {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(SourceError::with_source(
                    format!("failed to read {}", path.display()),
                    e,
                ))
            }
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| SourceError::with_source(format!("failed to parse {}", path.display()), e))
    }
}

impl NarrativeSource for FsSource {
    fn load_work_index(&self) -> BoxFuture<'_, Result<WorkIndex, SourceError>> {
        Box::pin(async move {
            self.read_json("index.json")
                .await?
                .ok_or_else(|| SourceError::new("work index not found"))
        })
    }

    fn load_places(&self) -> BoxFuture<'_, Result<PlacesData, SourceError>> {
        Box::pin(async move {
            self.read_json("geo/places.json")
                .await?
                .ok_or_else(|| SourceError::new("place registry not found"))
        })
    }

    fn load_chapter(
        &self,
        volume: u32,
        chapter: u32,
    ) -> BoxFuture<'_, Result<Option<ChapterData>, SourceError>> {
        let rel = format!("nodes/v{volume:02}/c{chapter:02}.json");
        Box::pin(async move { self.read_json(&rel).await })
    }
}

/// In-memory source for tests or embedded data.
#[derive(Debug, Clone)]
pub struct MemorySource {
    work_index: WorkIndex,
    places: PlacesData,
    chapters: BTreeMap<(u32, u32), ChapterData>,
}

impl MemorySource {
    pub fn new(work_index: WorkIndex, places: PlacesData) -> Self {
        Self {
            work_index,
            places,
            chapters: BTreeMap::new(),
        }
    }

    pub fn with_chapter(mut self, volume: u32, chapter: u32, data: ChapterData) -> Self {
        self.chapters.insert((volume, chapter), data);
        self
    }
}

impl NarrativeSource for MemorySource {
    fn load_work_index(&self) -> BoxFuture<'_, Result<WorkIndex, SourceError>> {
        Box::pin(async move { Ok(self.work_index.clone()) })
    }

    fn load_places(&self) -> BoxFuture<'_, Result<PlacesData, SourceError>> {
        Box::pin(async move { Ok(self.places.clone()) })
    }

    fn load_chapter(
        &self,
        volume: u32,
        chapter: u32,
    ) -> BoxFuture<'_, Result<Option<ChapterData>, SourceError>> {
        Box::pin(async move { Ok(self.chapters.get(&(volume, chapter)).cloned()) })
    }
}
