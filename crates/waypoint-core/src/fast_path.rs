//! Precompiled-regex fast path
//!
//! Every registered pattern is kept in one list in the order the trie walk
//! would try them: static before parameter before wildcard at the first
//! differing segment, a pattern before its extensions, then registration
//! order. Only patterns whose match chain is just their own record are
//! served from here; the others fall through to the trie walk.

use crate::compiler::CompiledPath;
use crate::record::RecordId;
use crate::Params;
use std::collections::HashSet;
use std::sync::Arc;
use waypoint_trie::{parse_pattern, Segment};

/// Outcome of a fast-path lookup
#[derive(Debug, Clone, PartialEq)]
pub enum FastLookup {
    /// An eligible pattern matched first
    Hit { record: RecordId, params: Params },
    /// The first match is not served directly; the trie must decide
    Nested,
    /// Nothing matched
    Miss,
}

/// One pattern registered with the fast path
#[derive(Debug, Clone)]
pub struct FastEntry {
    pub record: RecordId,
    pub compiled: Arc<CompiledPath>,
    /// The record has no parent, children or default child, and the trie
    /// accepts exactly what its regex accepts
    pub standalone: bool,
}

#[derive(Debug)]
struct Slot {
    entry: FastEntry,
    eligible: bool,
    ranks: Vec<u8>,
    order: usize,
}

/// Pattern list for direct regex matching
#[derive(Debug, Default)]
pub struct FastPathIndex {
    slots: Vec<Slot>,
}

impl FastPathIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the indexed patterns.
    ///
    /// `registered` lists every registered pattern; an entry that extends
    /// any of them is never eligible.
    pub fn rebuild(&mut self, entries: Vec<FastEntry>, registered: &[&str]) {
        let shapes: HashSet<String> = registered
            .iter()
            .filter_map(|p| parse_pattern(p).ok())
            .map(|segments| shape(&segments))
            .collect();

        self.slots = entries
            .into_iter()
            .enumerate()
            .filter_map(|(order, entry)| {
                let (extends_other, ranks) = {
                    let segments = parse_pattern(entry.compiled.pattern()).ok()?;
                    let extends = (0..segments.len())
                        .any(|n| shapes.contains(&shape(&segments[..n])));
                    (extends, segments.iter().map(rank).collect())
                };
                Some(Slot {
                    eligible: entry.standalone && !extends_other,
                    ranks,
                    entry,
                    order,
                })
            })
            .collect();

        self.slots
            .sort_by(|a, b| a.ranks.cmp(&b.ranks).then_with(|| a.order.cmp(&b.order)));
    }

    /// Try the patterns in rank order against a normalized path
    pub fn lookup(&self, path: &str) -> FastLookup {
        for slot in &self.slots {
            let Some(params) = slot.entry.compiled.extract(path) else {
                continue;
            };
            if !slot.eligible {
                return FastLookup::Nested;
            }
            return FastLookup::Hit {
                record: slot.entry.record,
                params,
            };
        }
        FastLookup::Miss
    }

    /// Number of indexed patterns
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of patterns served directly
    pub fn eligible_len(&self) -> usize {
        self.slots.iter().filter(|s| s.eligible).count()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }
}

/// Optional and required parameters share one trie edge, so they rank alike
fn rank(segment: &Segment<'_>) -> u8 {
    match segment {
        Segment::Static(_) => 0,
        Segment::Param { .. } => 1,
        Segment::Wildcard => 2,
    }
}

/// Trie edge sequence of a pattern. Parameters line up with parameters
/// whatever their names, as they do in the trie.
fn shape(segments: &[Segment<'_>]) -> String {
    let edges: Vec<&str> = segments
        .iter()
        .map(|segment| match *segment {
            Segment::Static(text) => text,
            Segment::Param { .. } => ":",
            Segment::Wildcard => "*",
        })
        .collect();
    edges.join("/")
}
