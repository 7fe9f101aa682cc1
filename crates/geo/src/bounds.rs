use serde::{Deserialize, Serialize};

use crate::coord::Coord;

/// Axis-aligned geographic bounding box in degrees.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct LngLatBounds {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl LngLatBounds {
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// Computes the bounding box of a set of coordinates.
    ///
    /// Returns `None` for an empty input; callers decide the degenerate-case
    /// policy themselves.
    pub fn from_coords<I>(coords: I) -> Option<Self>
    where
        I: IntoIterator<Item = Coord>,
    {
        let mut iter = coords.into_iter();
        let first = iter.next()?;
        let mut out = Self::new(first.lng, first.lat, first.lng, first.lat);
        for c in iter {
            out.west = out.west.min(c.lng);
            out.east = out.east.max(c.lng);
            out.south = out.south.min(c.lat);
            out.north = out.north.max(c.lat);
        }
        Some(out)
    }

    pub fn span_lng(&self) -> f64 {
        self.east - self.west
    }

    pub fn span_lat(&self) -> f64 {
        self.north - self.south
    }

    pub fn center(&self) -> Coord {
        Coord::new(
            (self.west + self.east) / 2.0,
            (self.south + self.north) / 2.0,
        )
    }

    /// Expands each dimension by `fraction` of its raw span on both sides.
    ///
    /// The fraction applies to the unexpanded span; padding is applied once,
    /// never iteratively.
    pub fn padded(&self, fraction: f64) -> Self {
        let d_lng = self.span_lng() * fraction;
        let d_lat = self.span_lat() * fraction;
        Self {
            west: self.west - d_lng,
            east: self.east + d_lng,
            south: self.south - d_lat,
            north: self.north + d_lat,
        }
    }
}
