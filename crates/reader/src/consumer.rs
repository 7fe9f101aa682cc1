use routing::RouteState;
use scene::MapScene;

/// The core's output boundary: whatever renders the map implements this.
///
/// The core pushes the derived scene, the observable route state, and the
/// transient highlight; how they are drawn (tiles, DOM, 3D globe) is the
/// consumer's business entirely.
pub trait SceneConsumer {
    /// A new scene (or no scene, when no node is current). Consumers should
    /// change-detect on `scene_id`; scene content for a fixed id is stable.
    fn apply_scene(&mut self, scene: Option<&MapScene>);

    /// The current route resolution state. Called again as the state
    /// settles; a state carrying `error` means "draw no route", not a
    /// failure of the consumer.
    fn apply_route(&mut self, state: &RouteState);

    /// The currently highlighted place, if any.
    fn apply_highlight(&mut self, place_id: Option<&str>);
}
