use std::sync::Arc;
use std::time::Instant;

use narrative::{NarrativeStore, Node, SourceError};
use routing::{RouteCoordinator, RouteRequest, RouteState};
use scene::{derive_scene, MapScene, RouteEndpoints};
use tokio::sync::watch;
use tracing::debug;

use crate::consumer::SceneConsumer;
use crate::highlight::{HighlightSource, HighlightState};

/// One reading session: the current node, its derived scene, and the route
/// resolution that scene asked for.
///
/// A reading-position change flows through `select_node`: load the node,
/// derive its scene, hand the scene's route endpoints (or nothing) to the
/// route coordinator. The consumer renders from the scene and from the
/// coordinator's observable state.
pub struct ReaderSession {
    store: NarrativeStore,
    coordinator: RouteCoordinator,
    highlight: HighlightState,
    current: Option<Node>,
    scene: Option<MapScene>,
}

impl ReaderSession {
    pub fn new(store: NarrativeStore, coordinator: RouteCoordinator) -> Self {
        Self {
            store,
            coordinator,
            highlight: HighlightState::new(),
            current: None,
            scene: None,
        }
    }

    pub fn current_node(&self) -> Option<&Node> {
        self.current.as_ref()
    }

    pub fn scene(&self) -> Option<&MapScene> {
        self.scene.as_ref()
    }

    pub fn route_state(&self) -> RouteState {
        self.coordinator.state()
    }

    /// Observes route resolution over time.
    pub fn subscribe_route(&self) -> watch::Receiver<RouteState> {
        self.coordinator.subscribe()
    }

    pub fn store(&self) -> &NarrativeStore {
        &self.store
    }

    /// Moves the reading position to `id`.
    ///
    /// Returns `Ok(false)` when the node does not exist (including a
    /// malformed id); the previous position stays current in that case.
    pub async fn select_node(&mut self, id: &str) -> Result<bool, SourceError> {
        let Some(node) = self.store.node(id).await? else {
            debug!("node {id:?} not found, keeping current position");
            return Ok(false);
        };

        let places = self.store.places().await?;
        let scene = derive_scene(Some(&node), &places);
        self.coordinator
            .request(scene.as_ref().and_then(|s| route_request(s.route.as_ref())));
        self.current = Some(node);
        self.scene = scene;
        Ok(true)
    }

    /// Opens the work at its first node.
    pub async fn open_first(&mut self) -> Result<bool, SourceError> {
        match self.store.first_node_id().await? {
            Some(id) => self.select_node(&id).await,
            None => Ok(false),
        }
    }

    /// Follows the current node's `next` link, if any.
    pub async fn next(&mut self) -> Result<bool, SourceError> {
        match self.link(|l| l.next.clone()) {
            Some(id) => self.select_node(&id).await,
            None => Ok(false),
        }
    }

    /// Follows the current node's `prev` link, if any.
    pub async fn prev(&mut self) -> Result<bool, SourceError> {
        match self.link(|l| l.prev.clone()) {
            Some(id) => self.select_node(&id).await,
            None => Ok(false),
        }
    }

    fn link(&self, pick: impl Fn(&narrative::NodeLinks) -> Option<String>) -> Option<String> {
        self.current.as_ref()?.links.as_ref().and_then(pick)
    }

    /// Records a highlight signal from either the text or the map surface.
    pub fn signal_highlight(
        &mut self,
        place_id: impl Into<String>,
        source: HighlightSource,
        now: Instant,
    ) {
        self.highlight.signal(place_id, source, now);
    }

    pub fn clear_highlight(&mut self) {
        self.highlight.clear();
    }

    pub fn highlight(&self, now: Instant) -> Option<&str> {
        self.highlight.current(now)
    }

    /// Pushes the session's full output to a consumer.
    pub fn render_to(&self, consumer: &mut dyn SceneConsumer, now: Instant) {
        consumer.apply_scene(self.scene.as_ref());
        consumer.apply_route(&self.coordinator.state());
        consumer.apply_highlight(self.highlight.current(now));
    }
}

fn route_request(endpoints: Option<&RouteEndpoints>) -> Option<RouteRequest> {
    let endpoints = endpoints?;
    Some(RouteRequest {
        from_id: endpoints.from_id.clone(),
        to_id: endpoints.to_id.clone(),
        from_coord: endpoints.from_coord,
        to_coord: endpoints.to_coord,
    })
}

/// Convenience constructor wiring a session from its collaborators.
pub fn session_with(
    store: NarrativeStore,
    provider: Arc<dyn routing::RouteProvider>,
    cache: Arc<routing::RouteCache>,
) -> ReaderSession {
    ReaderSession::new(store, RouteCoordinator::new(provider, cache))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Instant;

    use geo::{Coord, Place};
    use narrative::{
        CameraConfig, CameraMode, ChapterData, ChapterMeta, ContentFormat, ContentRef, FeatureKind,
        FeatureRef, FeatureRole, MapConfig, MemorySource, NarrativeStore, Node, NodeLinks,
        PlacesData, RouteRef, Volume, Work, WorkIndex, WorkMeta,
    };
    use pretty_assertions::assert_eq;
    use routing::{BoxFuture, RouteCache, RouteCoordinator, RouteProvider, RouteResult, RouteState, RoutingError};
    use scene::MapScene;

    use super::ReaderSession;
    use crate::consumer::SceneConsumer;
    use crate::highlight::HighlightSource;

    struct ImmediateProvider;

    impl RouteProvider for ImmediateProvider {
        fn fetch_route(
            &self,
            origin: Coord,
            destination: Coord,
        ) -> BoxFuture<'_, Result<RouteResult, RoutingError>> {
            Box::pin(async move {
                Ok(RouteResult {
                    distance_m: 52_340,
                    duration_s: 3_725,
                    path: vec![origin, destination],
                })
            })
        }
    }

    #[derive(Default)]
    struct RecordingConsumer {
        scene_ids: Vec<Option<String>>,
        route_states: Vec<RouteState>,
        highlights: Vec<Option<String>>,
    }

    impl SceneConsumer for RecordingConsumer {
        fn apply_scene(&mut self, scene: Option<&MapScene>) {
            self.scene_ids.push(scene.map(|s| s.scene_id.clone()));
        }

        fn apply_route(&mut self, state: &RouteState) {
            self.route_states.push(state.clone());
        }

        fn apply_highlight(&mut self, place_id: Option<&str>) {
            self.highlights.push(place_id.map(str::to_string));
        }
    }

    fn place(id: &str, name: &str, lng: f64, lat: f64) -> Place {
        Place {
            id: id.to_string(),
            name: name.to_string(),
            aliases: None,
            coord: Coord::new(lng, lat),
            level: None,
            notes: None,
        }
    }

    fn place_ref(id: &str, role: FeatureRole) -> FeatureRef {
        FeatureRef {
            kind: FeatureKind::Place,
            place_id: Some(id.to_string()),
            region_id: None,
            label: None,
            role: Some(role),
        }
    }

    fn node(
        id: &str,
        features: Vec<FeatureRef>,
        route: Option<RouteRef>,
        links: NodeLinks,
    ) -> Node {
        Node {
            id: id.to_string(),
            work_id: "test-work".to_string(),
            volume: 1,
            chapter: 1,
            title: id.to_string(),
            time: None,
            content: ContentRef {
                format: ContentFormat::Md,
                reference: format!("content/{id}.md"),
                inline: None,
            },
            map: MapConfig {
                features,
                route,
                camera: CameraConfig {
                    mode: CameraMode::AutoFit,
                    padding: None,
                    lng: None,
                    lat: None,
                    height: None,
                    heading: None,
                    pitch: None,
                    duration_ms: None,
                },
            },
            transitions: None,
            links: Some(links),
            sources: None,
        }
    }

    fn fixture_store() -> NarrativeStore {
        let chapter_meta = ChapterMeta {
            id: "v01-c01".to_string(),
            number: 1,
            title: "Chapter One".to_string(),
            node_count: 2,
            nodes_ref: "nodes/v01/c01.json".to_string(),
        };
        let work_index = WorkIndex {
            work: Work {
                id: "test-work".to_string(),
                title: "Test Work".to_string(),
                subtitle: None,
                author: None,
                description: None,
                volumes: vec![Volume {
                    id: "v01".to_string(),
                    number: 1,
                    title: "Volume One".to_string(),
                    subtitle: None,
                    chapters: vec![chapter_meta.clone()],
                }],
            },
            meta: WorkMeta {
                version: "1".to_string(),
                updated_at: "2024-01-01".to_string(),
                total_nodes: 2,
                total_places: 2,
            },
        };
        let places = PlacesData {
            version: "1".to_string(),
            updated_at: "2024-01-01".to_string(),
            places: vec![
                place("P-shaoshan", "Shaoshan", 112.52, 27.92),
                place("P-changsha", "Changsha", 112.97, 28.19),
            ],
        };
        let nodes = vec![
            node(
                "V01-C01-P0001",
                vec![place_ref("P-shaoshan", FeatureRole::Primary)],
                None,
                NodeLinks {
                    prev: None,
                    next: Some("V01-C01-P0002".to_string()),
                },
            ),
            node(
                "V01-C01-P0002",
                vec![
                    place_ref("P-shaoshan", FeatureRole::Primary),
                    place_ref("P-changsha", FeatureRole::Context),
                ],
                Some(RouteRef {
                    route_id: None,
                    from: "P-shaoshan".to_string(),
                    to: "P-changsha".to_string(),
                    via: None,
                    source: None,
                }),
                NodeLinks {
                    prev: Some("V01-C01-P0001".to_string()),
                    next: None,
                },
            ),
        ];
        let source = MemorySource::new(work_index, places).with_chapter(
            1,
            1,
            ChapterData {
                chapter: chapter_meta,
                nodes,
            },
        );
        NarrativeStore::new(Arc::new(source))
    }

    fn session() -> ReaderSession {
        ReaderSession::new(
            fixture_store(),
            RouteCoordinator::new(Arc::new(ImmediateProvider), Arc::new(RouteCache::new())),
        )
    }

    async fn settled_route(session: &ReaderSession) -> RouteState {
        let mut rx = session.subscribe_route();
        let state = rx.wait_for(|s| !s.is_loading).await.unwrap().clone();
        state
    }

    #[tokio::test]
    async fn selecting_a_node_derives_its_scene() {
        let mut s = session();
        assert!(s.select_node("V01-C01-P0001").await.unwrap());

        let scene = s.scene().unwrap();
        assert_eq!(scene.scene_id, "V01-C01-P0001");
        assert_eq!(scene.markers.len(), 1);
        assert!(!scene.has_route());

        // No route endpoints, so the coordinator sits idle.
        assert_eq!(s.route_state(), RouteState::idle());
    }

    #[tokio::test]
    async fn a_route_scene_drives_the_coordinator() {
        let mut s = session();
        assert!(s.select_node("V01-C01-P0002").await.unwrap());
        assert!(s.scene().unwrap().has_route());

        let state = settled_route(&s).await;
        let data = state.data.unwrap();
        assert_eq!(data.distance_m, 52_340);
        assert_eq!(state.request.unwrap().from_id, "P-shaoshan");
    }

    #[tokio::test]
    async fn unknown_or_malformed_node_keeps_the_current_position() {
        let mut s = session();
        assert!(s.select_node("V01-C01-P0001").await.unwrap());

        assert!(!s.select_node("V01-C01-P0099").await.unwrap());
        assert!(!s.select_node("garbage").await.unwrap());
        assert_eq!(s.current_node().unwrap().id, "V01-C01-P0001");
        assert_eq!(s.scene().unwrap().scene_id, "V01-C01-P0001");
    }

    #[tokio::test]
    async fn next_and_prev_follow_node_links() {
        let mut s = session();
        assert!(s.open_first().await.unwrap());
        assert_eq!(s.current_node().unwrap().id, "V01-C01-P0001");

        assert!(s.next().await.unwrap());
        assert_eq!(s.current_node().unwrap().id, "V01-C01-P0002");
        assert!(!s.next().await.unwrap());

        assert!(s.prev().await.unwrap());
        assert_eq!(s.current_node().unwrap().id, "V01-C01-P0001");
    }

    #[tokio::test]
    async fn render_pushes_scene_route_and_highlight() {
        let mut s = session();
        s.select_node("V01-C01-P0002").await.unwrap();
        settled_route(&s).await;

        let now = Instant::now();
        s.signal_highlight("P-shaoshan", HighlightSource::Hover, now);

        let mut consumer = RecordingConsumer::default();
        s.render_to(&mut consumer, now);

        assert_eq!(consumer.scene_ids, vec![Some("V01-C01-P0002".to_string())]);
        assert_eq!(consumer.route_states.len(), 1);
        assert!(consumer.route_states[0].data.is_some());
        assert_eq!(consumer.highlights, vec![Some("P-shaoshan".to_string())]);
    }

    #[tokio::test]
    async fn rapid_navigation_settles_on_the_last_route() {
        let mut s = session();
        s.select_node("V01-C01-P0002").await.unwrap();
        s.select_node("V01-C01-P0001").await.unwrap();

        // The second node has no route; the earlier request must not
        // resurface even after its fetch would have settled.
        tokio::task::yield_now().await;
        assert_eq!(s.route_state(), RouteState::idle());
    }
}
