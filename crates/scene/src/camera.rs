use geo::LngLatBounds;
use narrative::{CameraConfig, CameraMode};
use serde::{Deserialize, Serialize};

use crate::marker::PlaceMarker;

/// Default height for preset cameras, meters above the ellipsoid.
pub const DEFAULT_PRESET_HEIGHT_M: f64 = 10_000.0;
pub const DEFAULT_HEADING_DEG: f64 = 0.0;
pub const DEFAULT_PITCH_DEG: f64 = -45.0;
/// Default fly-to animation duration.
pub const DEFAULT_FLY_DURATION_MS: u64 = 1200;
/// Default autoFit padding, as a fraction of the raw marker span per side.
pub const DEFAULT_AUTO_FIT_PADDING: f64 = 0.25;
/// Height used when autoFit degenerates to a single marker.
pub const SINGLE_MARKER_HEIGHT_M: f64 = 10_000.0;

/// The "home" framing used when an autoFit node resolves no markers at all:
/// a wide, steep view over the narrative's origin region (Shaoshan).
pub const HOME_LNG: f64 = 112.5;
pub const HOME_LAT: f64 = 27.9;
pub const HOME_HEIGHT_M: f64 = 50_000.0;
pub const HOME_PITCH_DEG: f64 = -60.0;

/// Camera framing derived for a scene. Built fresh per scene, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum CameraTarget {
    /// Fly to an authored (or implied) position.
    Preset {
        lng: f64,
        lat: f64,
        height: f64,
        heading: f64,
        pitch: f64,
        duration_ms: u64,
    },
    /// Frame a bounding rectangle computed from the scene's markers.
    AutoFit {
        bounds: LngLatBounds,
        padding: f64,
        duration_ms: u64,
    },
}

/// Resolves the authored camera configuration against the scene's markers.
///
/// `autoFit` never yields a zero-area rectangle: with one marker it becomes
/// an implicit preset centered on that marker, and with none it falls back
/// to the home framing. `followRoute` is derived like `autoFit`.
pub fn resolve_camera(config: &CameraConfig, markers: &[PlaceMarker]) -> CameraTarget {
    let duration_ms = config.duration_ms.unwrap_or(DEFAULT_FLY_DURATION_MS);

    match config.mode {
        CameraMode::Preset => CameraTarget::Preset {
            lng: config.lng.unwrap_or(HOME_LNG),
            lat: config.lat.unwrap_or(HOME_LAT),
            height: config.height.unwrap_or(DEFAULT_PRESET_HEIGHT_M),
            heading: config.heading.unwrap_or(DEFAULT_HEADING_DEG),
            pitch: config.pitch.unwrap_or(DEFAULT_PITCH_DEG),
            duration_ms,
        },
        CameraMode::AutoFit | CameraMode::FollowRoute => match markers {
            [] => CameraTarget::Preset {
                lng: HOME_LNG,
                lat: HOME_LAT,
                height: HOME_HEIGHT_M,
                heading: DEFAULT_HEADING_DEG,
                pitch: HOME_PITCH_DEG,
                duration_ms,
            },
            [only] => CameraTarget::Preset {
                lng: only.lng,
                lat: only.lat,
                height: SINGLE_MARKER_HEIGHT_M,
                heading: DEFAULT_HEADING_DEG,
                pitch: DEFAULT_PITCH_DEG,
                duration_ms,
            },
            [first, rest @ ..] => {
                let mut bounds = LngLatBounds::new(first.lng, first.lat, first.lng, first.lat);
                for m in rest {
                    bounds.west = bounds.west.min(m.lng);
                    bounds.east = bounds.east.max(m.lng);
                    bounds.south = bounds.south.min(m.lat);
                    bounds.north = bounds.north.max(m.lat);
                }
                let padding = config.padding.unwrap_or(DEFAULT_AUTO_FIT_PADDING);
                CameraTarget::AutoFit {
                    bounds: bounds.padded(padding),
                    padding,
                    duration_ms,
                }
            }
        },
    }
}
