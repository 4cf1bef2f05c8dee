//! The sweep-line implementation.
//!
//! The sweep runs over snap-rounded segments, which are guaranteed to meet only
//! at their endpoints. That means there is no intersection detection left to
//! do here: the sweep only needs to keep track of which segments are active,
//! and in what order, so that it can compute winding numbers.
//!
//! The main entry point is [`sweep`], which calls back with the per-set winding
//! numbers on either side of every edge.

use std::collections::BTreeMap;

use crate::{geom::GridPoint, segments::SegIdx, snap::RoundedSegment};

mod events;
mod status;

pub use events::{Event, EventKind, EventQueue};
pub use status::{compare, Status};

/// A snap-rounded segment, as the sweep sees it.
///
/// Sweep edges always go from left to right (in lexicographic order), and
/// identical rounded segments are merged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SweepEdge {
    /// The smaller endpoint.
    pub left: GridPoint,
    /// The larger endpoint.
    pub right: GridPoint,
    /// For each set, the change in winding number when crossing this edge
    /// from below to above.
    pub deltas: Vec<i32>,
    /// All the input segments that were rounded onto this edge.
    pub sources: Vec<SegIdx>,
}

impl SweepEdge {
    /// Is this edge vertical?
    pub fn is_vertical(&self) -> bool {
        self.left.x == self.right.x
    }
}

/// Merges rounded segments into sweep edges.
///
/// `set_of` says which set each input segment belongs to; every set must be
/// less than `n_sets`. Edges on which all the windings cancel are dropped.
pub fn build_edges(
    rounded: &[RoundedSegment],
    n_sets: usize,
    set_of: impl Fn(SegIdx) -> usize,
) -> Vec<SweepEdge> {
    let mut merged: BTreeMap<(GridPoint, GridPoint), SweepEdge> = BTreeMap::new();
    for seg in rounded {
        let (left, right, delta) = if seg.start < seg.end {
            (seg.start, seg.end, 1)
        } else {
            (seg.end, seg.start, -1)
        };
        let edge = merged.entry((left, right)).or_insert_with(|| SweepEdge {
            left,
            right,
            deltas: vec![0; n_sets],
            sources: Vec::new(),
        });
        edge.deltas[set_of(seg.source)] += delta;
        if !edge.sources.contains(&seg.source) {
            edge.sources.push(seg.source);
        }
    }

    merged
        .into_values()
        .filter(|edge| {
            let keep = edge.deltas.iter().any(|d| *d != 0);
            if !keep {
                tracing::trace!(left = ?edge.left, right = ?edge.right, "dropping a cancelled edge");
            }
            keep
        })
        .collect()
}

/// Runs a sweep over the edges, calling `f` with every edge as it leaves the
/// sweep line.
///
/// The callback receives the edge's index, the edge, and the per-set winding
/// numbers just below and just above it. Edges are reported in sweep order:
/// in increasing order of their right endpoints, and from top to bottom among
/// edges that end at the same point.
pub fn sweep(
    edges: &[SweepEdge],
    n_sets: usize,
    mut f: impl FnMut(usize, &SweepEdge, &[i32], &[i32]),
) {
    let queue = EventQueue::new(edges);
    let mut status = Status::default();
    tracing::debug!(edges = edges.len(), events = queue.len(), "sweeping");

    for ev in queue.iter() {
        tracing::trace!(?ev, "event");
        match ev.kind {
            EventKind::Enter => {
                status.insert(edges, ev.edge);
            }
            EventKind::Leave => {
                let Some(pos) = status.find(edges, ev.edge) else {
                    continue;
                };
                let edge = &edges[ev.edge];
                let below = status.winding_below(edges, pos, n_sets);
                let above: Vec<i32> = below
                    .iter()
                    .zip(&edge.deltas)
                    .map(|(w, d)| w + d)
                    .collect();
                status.remove(pos);
                f(ev.edge, edge, &below, &above);
            }
        }
    }

    if !status.is_empty() {
        tracing::error!(
            remaining = status.len(),
            "sweep finished with edges still active"
        );
    }
}
