use std::fmt;
use std::str::FromStr;

/// Parsed narrative node id.
///
/// The textual form is `V{vv}-C{cc}-P{nnnn}`; the components give the id a
/// total order within a chapter (and across the work).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId {
    pub volume: u32,
    pub chapter: u32,
    pub page: u32,
}

impl NodeId {
    pub fn new(volume: u32, chapter: u32, page: u32) -> Self {
        Self {
            volume,
            chapter,
            page,
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "V{:02}-C{:02}-P{:04}",
            self.volume, self.chapter, self.page
        )
    }
}

/// A narrative id that does not match `V{vv}-C{cc}-P{nnnn}`.
///
/// Callers surface this as "not found", never as a crash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedNodeId {
    pub raw: String,
}

impl fmt::Display for MalformedNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed node id: {:?}", self.raw)
    }
}

impl std::error::Error for MalformedNodeId {}

impl FromStr for NodeId {
    type Err = MalformedNodeId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || MalformedNodeId { raw: s.to_string() };

        let mut parts = s.split('-');
        let volume = parse_component(parts.next(), 'V').ok_or_else(err)?;
        let chapter = parse_component(parts.next(), 'C').ok_or_else(err)?;
        let page = parse_component(parts.next(), 'P').ok_or_else(err)?;
        if parts.next().is_some() {
            return Err(err());
        }

        Ok(NodeId {
            volume,
            chapter,
            page,
        })
    }
}

fn parse_component(part: Option<&str>, prefix: char) -> Option<u32> {
    let digits = part?.strip_prefix(prefix)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
