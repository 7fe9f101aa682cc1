use geo::{Coord, PlaceRegistry};
use narrative::Node;
use serde::{Deserialize, Serialize};

use crate::camera::{resolve_camera, CameraTarget};
use crate::marker::{resolve_markers, PlaceMarker};

/// Resolved endpoints of a node's travel route, ready for the route
/// coordinator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteEndpoints {
    pub from_id: String,
    pub to_id: String,
    pub from_coord: Coord,
    pub to_coord: Coord,
}

/// The derived map scene for one narrative node.
///
/// `scene_id` equals the source node's id and is the scene's sole identity;
/// consumers detect change by comparing ids, never by hashing content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapScene {
    pub scene_id: String,
    pub markers: Vec<PlaceMarker>,
    pub camera: CameraTarget,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<RouteEndpoints>,
}

impl MapScene {
    pub fn has_route(&self) -> bool {
        self.route.is_some()
    }
}

/// Derives the map scene for a node against the place registry.
///
/// Pure and deterministic: the same `(node, places)` inputs always produce
/// structurally identical output, so results can be memoized on
/// `(node.id, registry identity)`. Derivation never fails; anything that
/// does not resolve simply narrows to an absent field.
pub fn derive_scene(node: Option<&Node>, places: &PlaceRegistry) -> Option<MapScene> {
    let node = node?;

    let markers = resolve_markers(&node.map.features, places);
    let camera = resolve_camera(&node.map.camera, &markers);

    // Route endpoints only materialize when both ends resolve; a dangling
    // endpoint means no route, not an error.
    let route = node.map.route.as_ref().and_then(|route_ref| {
        let from = places.get(&route_ref.from)?;
        let to = places.get(&route_ref.to)?;
        Some(RouteEndpoints {
            from_id: from.id.clone(),
            to_id: to.id.clone(),
            from_coord: from.coord,
            to_coord: to.coord,
        })
    });

    Some(MapScene {
        scene_id: node.id.clone(),
        markers,
        camera,
        route,
    })
}
