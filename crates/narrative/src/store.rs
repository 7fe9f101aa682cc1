use std::collections::BTreeMap;
use std::sync::Arc;

use geo::PlaceRegistry;
use parking_lot::Mutex;
use tracing::debug;

use crate::model::{ChapterData, Node, Work};
use crate::node_id::NodeId;
use crate::source::{NarrativeSource, SourceError};

#[derive(Debug, Default)]
struct StoreState {
    work: Option<Arc<Work>>,
    places: Option<Arc<PlaceRegistry>>,
    chapters: BTreeMap<(u32, u32), Arc<ChapterData>>,
}

/// Caching facade over a `NarrativeSource`.
///
/// The work index, the place registry, and each chapter file are loaded at
/// most once and held for the session; `clear_cache` resets everything.
/// The lock is never held across an await, so concurrent loads of the same
/// chapter may both hit the source; last write wins and the content is
/// identical, so only the wasted fetch is lost.
pub struct NarrativeStore {
    source: Arc<dyn NarrativeSource>,
    state: Mutex<StoreState>,
}

impl NarrativeStore {
    pub fn new(source: Arc<dyn NarrativeSource>) -> Self {
        Self {
            source,
            state: Mutex::new(StoreState::default()),
        }
    }

    /// The work structure (volumes + chapter metadata), for the table of
    /// contents.
    pub async fn work(&self) -> Result<Arc<Work>, SourceError> {
        if let Some(work) = self.state.lock().work.clone() {
            return Ok(work);
        }
        let index = self.source.load_work_index().await?;
        let work = Arc::new(index.work);
        self.state.lock().work = Some(work.clone());
        Ok(work)
    }

    /// The session's place registry.
    pub async fn places(&self) -> Result<Arc<PlaceRegistry>, SourceError> {
        if let Some(places) = self.state.lock().places.clone() {
            return Ok(places);
        }
        let data = self.source.load_places().await?;
        let registry = Arc::new(PlaceRegistry::new(data.places));
        self.state.lock().places = Some(registry.clone());
        Ok(registry)
    }

    /// Loads one chapter's nodes, consulting the chapter cache first.
    pub async fn chapter(
        &self,
        volume: u32,
        chapter: u32,
    ) -> Result<Option<Arc<ChapterData>>, SourceError> {
        if let Some(data) = self.state.lock().chapters.get(&(volume, chapter)).cloned() {
            return Ok(Some(data));
        }
        let Some(data) = self.source.load_chapter(volume, chapter).await? else {
            return Ok(None);
        };
        let data = Arc::new(data);
        self.state
            .lock()
            .chapters
            .insert((volume, chapter), data.clone());
        Ok(Some(data))
    }

    /// Looks up a node by its textual id.
    ///
    /// A malformed id is surfaced as not-found, not as an error; the caller
    /// shows "no such node" either way.
    pub async fn node(&self, id: &str) -> Result<Option<Node>, SourceError> {
        let parsed: NodeId = match id.parse() {
            Ok(p) => p,
            Err(e) => {
                debug!("rejecting node lookup: {e}");
                return Ok(None);
            }
        };

        let Some(data) = self.chapter(parsed.volume, parsed.chapter).await? else {
            return Ok(None);
        };
        Ok(data.nodes.iter().find(|n| n.id == id).cloned())
    }

    /// The id of the first node of the first chapter, for the default view.
    pub async fn first_node_id(&self) -> Result<Option<String>, SourceError> {
        let work = self.work().await?;
        let Some(volume) = work.volumes.first() else {
            return Ok(None);
        };
        let Some(chapter) = volume.chapters.first() else {
            return Ok(None);
        };
        let Some(data) = self.chapter(volume.number, chapter.number).await? else {
            return Ok(None);
        };
        Ok(data.nodes.first().map(|n| n.id.clone()))
    }

    /// Drops every cached entry; the next access reloads from the source.
    pub fn clear_cache(&self) {
        let mut state = self.state.lock();
        state.work = None;
        state.places = None;
        state.chapters.clear();
    }
}
