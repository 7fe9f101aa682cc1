use std::time::{Duration, Instant};

/// How long a click-originated highlight stays lit before clearing itself.
pub const CLICK_HIGHLIGHT_CLEAR_MS: u64 = 3000;

/// Where a highlight signal originated.
///
/// Text and map interactions both feed the same slot; the last signal
/// received wins regardless of origin.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HighlightSource {
    Click,
    Hover,
}

#[derive(Debug, Clone)]
struct ActiveHighlight {
    place_id: String,
    /// Click highlights expire on their own; hover highlights persist until
    /// replaced or cleared.
    expires_at: Option<Instant>,
}

/// Transient place-highlight state shared between text and map surfaces.
///
/// Time is passed in rather than read from a clock so the state machine is
/// deterministic under test.
#[derive(Debug, Clone, Default)]
pub struct HighlightState {
    active: Option<ActiveHighlight>,
}

impl HighlightState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a highlight signal. The previous signal, whatever its
    /// source, is replaced.
    pub fn signal(&mut self, place_id: impl Into<String>, source: HighlightSource, now: Instant) {
        let expires_at = match source {
            HighlightSource::Click => {
                Some(now + Duration::from_millis(CLICK_HIGHLIGHT_CLEAR_MS))
            }
            HighlightSource::Hover => None,
        };
        self.active = Some(ActiveHighlight {
            place_id: place_id.into(),
            expires_at,
        });
    }

    pub fn clear(&mut self) {
        self.active = None;
    }

    /// The currently highlighted place id, if any and not yet expired.
    pub fn current(&self, now: Instant) -> Option<&str> {
        let active = self.active.as_ref()?;
        if let Some(expires_at) = active.expires_at {
            if now >= expires_at {
                return None;
            }
        }
        Some(active.place_id.as_str())
    }
}
