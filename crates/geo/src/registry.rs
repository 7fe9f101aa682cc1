use std::collections::HashMap;

use crate::place::Place;

/// Immutable id-indexed lookup over the session's place records.
///
/// Built once from the loaded place list; lookups never allocate and the
/// registry is never mutated afterwards, so scene derivation can treat a
/// registry reference as a stable memoization key.
#[derive(Debug, Clone, Default)]
pub struct PlaceRegistry {
    places: Vec<Place>,
    by_id: HashMap<String, usize>,
}

impl PlaceRegistry {
    pub fn new(places: Vec<Place>) -> Self {
        let by_id = places
            .iter()
            .enumerate()
            .map(|(idx, p)| (p.id.clone(), idx))
            .collect();
        Self { places, by_id }
    }

    pub fn get(&self, id: &str) -> Option<&Place> {
        self.by_id.get(id).map(|&idx| &self.places[idx])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }

    /// Iterates places in their original load order.
    pub fn iter(&self) -> impl Iterator<Item = &Place> {
        self.places.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::PlaceRegistry;
    use crate::coord::Coord;
    use crate::place::Place;

    fn place(id: &str, lng: f64, lat: f64) -> Place {
        Place {
            id: id.to_string(),
            name: id.to_string(),
            aliases: None,
            coord: Coord::new(lng, lat),
            level: None,
            notes: None,
        }
    }

    #[test]
    fn lookup_by_id() {
        let reg = PlaceRegistry::new(vec![place("a", 1.0, 2.0), place("b", 3.0, 4.0)]);
        assert_eq!(reg.len(), 2);
        assert_eq!(reg.get("b").unwrap().coord.lng, 3.0);
        assert!(reg.get("c").is_none());
    }

    #[test]
    fn duplicate_ids_resolve_to_the_last_record() {
        let reg = PlaceRegistry::new(vec![place("a", 1.0, 2.0), place("a", 9.0, 9.0)]);
        assert_eq!(reg.get("a").unwrap().coord.lng, 9.0);
    }
}
