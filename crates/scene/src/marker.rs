use geo::PlaceRegistry;
use narrative::{FeatureKind, FeatureRef, FeatureRole};
use serde::{Deserialize, Serialize};

/// A point rendered on the map for a resolved place reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceMarker {
    pub id: String,
    pub name: String,
    pub label: String,
    pub lng: f64,
    pub lat: f64,
    pub role: FeatureRole,
}

/// Resolves a node's place references into markers.
///
/// One marker per `place`-typed reference whose id resolves in the registry,
/// in reference order. Unresolvable references are dropped silently; a node
/// referencing a place the registry doesn't know simply shows fewer markers.
pub fn resolve_markers(features: &[FeatureRef], places: &PlaceRegistry) -> Vec<PlaceMarker> {
    let mut markers = Vec::new();
    for feature in features {
        if feature.kind != FeatureKind::Place {
            continue;
        }
        let Some(place_id) = feature.place_id.as_deref() else {
            continue;
        };
        let Some(place) = places.get(place_id) else {
            continue;
        };
        markers.push(PlaceMarker {
            id: place.id.clone(),
            name: place.name.clone(),
            label: feature
                .label
                .clone()
                .unwrap_or_else(|| place.name.clone()),
            lng: place.coord.lng,
            lat: place.coord.lat,
            role: feature.role.unwrap_or(FeatureRole::Context),
        });
    }
    markers
}

#[cfg(test)]
mod tests {
    use geo::{Coord, Place, PlaceRegistry};
    use narrative::{FeatureKind, FeatureRef, FeatureRole};

    use super::resolve_markers;

    fn registry() -> PlaceRegistry {
        PlaceRegistry::new(vec![
            Place {
                id: "P-a".to_string(),
                name: "Place A".to_string(),
                aliases: None,
                coord: Coord::new(100.0, 30.0),
                level: None,
                notes: None,
            },
            Place {
                id: "P-b".to_string(),
                name: "Place B".to_string(),
                aliases: None,
                coord: Coord::new(104.0, 32.0),
                level: None,
                notes: None,
            },
        ])
    }

    fn place_ref(id: &str) -> FeatureRef {
        FeatureRef {
            kind: FeatureKind::Place,
            place_id: Some(id.to_string()),
            region_id: None,
            label: None,
            role: None,
        }
    }

    #[test]
    fn markers_follow_reference_order() {
        let markers = resolve_markers(&[place_ref("P-b"), place_ref("P-a")], &registry());
        assert_eq!(markers.len(), 2);
        assert_eq!(markers[0].id, "P-b");
        assert_eq!(markers[1].id, "P-a");
    }

    #[test]
    fn unresolvable_reference_is_dropped() {
        let markers = resolve_markers(&[place_ref("P-a"), place_ref("P-missing")], &registry());
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].id, "P-a");
    }

    #[test]
    fn region_refs_and_missing_ids_produce_no_markers() {
        let region = FeatureRef {
            kind: FeatureKind::Region,
            place_id: None,
            region_id: Some("R-x".to_string()),
            label: None,
            role: None,
        };
        let no_id = FeatureRef {
            kind: FeatureKind::Place,
            place_id: None,
            region_id: None,
            label: None,
            role: None,
        };
        assert!(resolve_markers(&[region, no_id], &registry()).is_empty());
    }

    #[test]
    fn label_override_and_default_role() {
        let mut with_label = place_ref("P-a");
        with_label.label = Some("Hometown".to_string());
        let markers = resolve_markers(&[with_label, place_ref("P-b")], &registry());
        assert_eq!(markers[0].label, "Hometown");
        assert_eq!(markers[1].label, "Place B");
        assert_eq!(markers[0].role, FeatureRole::Context);
    }
}
