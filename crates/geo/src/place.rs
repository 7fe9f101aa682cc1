use serde::{Deserialize, Serialize};

use crate::coord::Coord;

/// Administrative level of a place record.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceLevel {
    Province,
    City,
    County,
    Town,
    Village,
    Poi,
}

/// A named point location from the place registry.
///
/// Places are loaded once per session and never mutated; narrative nodes
/// reference them by id only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aliases: Option<Vec<String>>,
    pub coord: Coord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<PlaceLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::Place;

    #[test]
    fn place_deserializes_from_registry_json() {
        let raw = r#"{
            "id": "P-shaoshan",
            "name": "Shaoshan",
            "aliases": ["Shaoshanchong"],
            "coord": { "lng": 112.52, "lat": 27.92 },
            "level": "town"
        }"#;
        let place: Place = serde_json::from_str(raw).unwrap();
        assert_eq!(place.id, "P-shaoshan");
        assert_eq!(place.coord.lng, 112.52);
        assert_eq!(place.level, Some(super::PlaceLevel::Town));
    }
}
