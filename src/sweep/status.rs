//! The sweep line's status: the active edges, sorted from bottom to top.

use std::cmp::Ordering;

use crate::geom::orient_grid;

use super::SweepEdge;

fn below_if_ccw(o: Ordering) -> Ordering {
    // If the other point is counter-clockwise of `a`, then `a` is below.
    o.reverse()
}

/// Compares two edges that are both crossed by the sweep line.
///
/// `Less` means that `a` is below `b`. Since the edges never cross, their
/// relative order is the same everywhere they overlap, so it can be determined
/// by looking at the endpoints of the "younger" edge (the one that started
/// later) relative to the older one.
pub fn compare(a: &SweepEdge, b: &SweepEdge) -> Ordering {
    if a.left == b.left && a.right == b.right {
        return Ordering::Equal;
    }
    if a.left == b.left {
        return below_if_ccw(orient_grid(a.left, a.right, b.right))
            .then_with(|| a.right.cmp(&b.right));
    }
    if a.right == b.right {
        return below_if_ccw(orient_grid(a.left, a.right, b.left))
            .then_with(|| a.left.cmp(&b.left));
    }
    if a.left < b.left {
        below_if_ccw(orient_grid(a.left, a.right, b.left))
            .then_with(|| below_if_ccw(orient_grid(a.left, a.right, b.right)))
            .then_with(|| a.left.cmp(&b.left))
    } else {
        compare(b, a).reverse()
    }
}

/// The set of edges currently crossing the sweep line, from bottom to top.
#[derive(Clone, Debug, Default)]
pub struct Status {
    entries: Vec<usize>,
}

impl Status {
    /// The number of active edges.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Are there no active edges?
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The active edges, from bottom to top.
    pub fn entries(&self) -> &[usize] {
        &self.entries
    }

    /// Inserts an edge at its sorted position, and returns that position.
    pub fn insert(&mut self, edges: &[SweepEdge], idx: usize) -> usize {
        let edge = &edges[idx];
        let pos = self
            .entries
            .partition_point(|&e| compare(&edges[e], edge) == Ordering::Less);
        self.entries.insert(pos, idx);
        pos
    }

    /// Finds the position of an active edge.
    ///
    /// If the edge isn't where it should be, the status has become inconsistent.
    /// That's logged, and `None` is returned.
    pub fn find(&self, edges: &[SweepEdge], idx: usize) -> Option<usize> {
        let edge = &edges[idx];
        let pos = self
            .entries
            .partition_point(|&e| compare(&edges[e], edge) == Ordering::Less);
        if self.entries.get(pos) == Some(&idx) {
            Some(pos)
        } else {
            tracing::error!(
                edge = idx,
                left = ?edge.left,
                right = ?edge.right,
                pos,
                "active edge is missing from the sweep status, skipping it"
            );
            None
        }
    }

    /// Removes the edge at `pos`, returning its index.
    pub fn remove(&mut self, pos: usize) -> usize {
        self.entries.remove(pos)
    }

    /// The edge directly below position `pos`, if there is one.
    pub fn below(&self, pos: usize) -> Option<usize> {
        pos.checked_sub(1).map(|p| self.entries[p])
    }

    /// The per-set winding numbers just below the edge at position `pos`.
    pub fn winding_below(&self, edges: &[SweepEdge], pos: usize, n_sets: usize) -> Vec<i32> {
        let mut winding = vec![0; n_sets];
        for &e in &self.entries[..pos] {
            for (w, d) in winding.iter_mut().zip(&edges[e].deltas) {
                *w += d;
            }
        }
        winding
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::GridPoint;

    fn edge(l: (i64, i64), r: (i64, i64)) -> SweepEdge {
        SweepEdge {
            left: GridPoint::new(l.0, l.1),
            right: GridPoint::new(r.0, r.1),
            deltas: vec![1],
            sources: Vec::new(),
        }
    }

    #[test]
    fn comparisons() {
        let low = edge((0, 0), (10, 0));
        let high = edge((2, 5), (8, 6));
        assert_eq!(compare(&low, &high), Ordering::Less);
        assert_eq!(compare(&high, &low), Ordering::Greater);

        // Sharing a left endpoint.
        let steep = edge((0, 0), (1, 10));
        assert_eq!(compare(&low, &steep), Ordering::Less);

        // Sharing a right endpoint.
        let from_above = edge((5, 5), (10, 0));
        assert_eq!(compare(&low, &from_above), Ordering::Less);

        // The younger edge starts exactly on the older one's line, but
        // after it ends; the other endpoint decides.
        let younger = edge((3, 0), (12, -1));
        let older = edge((0, 0), (2, 0));
        assert_eq!(compare(&older, &younger), Ordering::Greater);
        assert_eq!(compare(&low, &low), Ordering::Equal);
    }

    #[test]
    fn insert_find_remove() {
        let edges = vec![
            edge((0, 0), (10, 0)),
            edge((0, 10), (10, 10)),
            edge((1, 5), (9, 5)),
        ];
        let mut status = Status::default();
        assert_eq!(status.insert(&edges, 0), 0);
        assert_eq!(status.insert(&edges, 1), 1);
        assert_eq!(status.insert(&edges, 2), 1);
        assert_eq!(status.entries(), &[0, 2, 1]);
        assert_eq!(status.find(&edges, 1), Some(2));
        assert_eq!(status.below(2), Some(2));
        assert_eq!(status.winding_below(&edges, 2, 1), vec![2]);

        assert_eq!(status.remove(1), 2);
        assert_eq!(status.find(&edges, 2), None);
        assert_eq!(status.len(), 2);
    }
}
