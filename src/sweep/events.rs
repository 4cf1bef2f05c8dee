//! The sweep's event queue.

use std::cmp::Ordering;

use crate::geom::{orient_grid, GridPoint};

use super::SweepEdge;

/// What happens to an edge at an event.
///
/// At any given point, edges leave the sweep line before other edges enter it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventKind {
    /// The sweep line has reached the edge's right endpoint.
    Leave,
    /// The sweep line has reached the edge's left endpoint.
    Enter,
}

/// A sweep-line event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Event {
    /// Where the event happens.
    pub point: GridPoint,
    /// The index of the edge that enters or leaves.
    pub edge: usize,
    /// Whether the edge enters or leaves.
    pub kind: EventKind,
}

/// All the events of a sweep, in the order they should be processed.
#[derive(Clone, Debug, Default)]
pub struct EventQueue {
    events: Vec<Event>,
}

// Among events at the same point, leaving edges go from top to bottom and
// entering edges from bottom to top. Both are angular orders within a
// half-plane, so the cross product is a consistent comparison.
fn cmp_events(edges: &[SweepEdge], a: &Event, b: &Event) -> Ordering {
    a.point
        .cmp(&b.point)
        .then(a.kind.cmp(&b.kind))
        .then_with(|| {
            let (ea, eb) = (&edges[a.edge], &edges[b.edge]);
            match a.kind {
                EventKind::Leave => orient_grid(a.point, eb.left, ea.left),
                EventKind::Enter => orient_grid(a.point, eb.right, ea.right),
            }
        })
        .then(a.edge.cmp(&b.edge))
}

impl EventQueue {
    /// Creates the events for a collection of edges.
    pub fn new(edges: &[SweepEdge]) -> Self {
        let mut events = Vec::with_capacity(edges.len() * 2);
        for (idx, edge) in edges.iter().enumerate() {
            events.push(Event {
                point: edge.left,
                edge: idx,
                kind: EventKind::Enter,
            });
            events.push(Event {
                point: edge.right,
                edge: idx,
                kind: EventKind::Leave,
            });
        }
        events.sort_by(|a, b| cmp_events(edges, a, b));
        EventQueue { events }
    }

    /// The number of events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Are there no events at all?
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Iterates over the events, in order.
    pub fn iter(&self) -> impl Iterator<Item = &Event> + '_ {
        self.events.iter()
    }
}

impl IntoIterator for EventQueue {
    type Item = Event;
    type IntoIter = std::vec::IntoIter<Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(l: (i64, i64), r: (i64, i64)) -> SweepEdge {
        SweepEdge {
            left: GridPoint::new(l.0, l.1),
            right: GridPoint::new(r.0, r.1),
            deltas: vec![1],
            sources: Vec::new(),
        }
    }

    #[test]
    fn order_at_a_point() {
        // Three edges coming into (2, 0), and three going out.
        let edges = vec![
            edge((0, 0), (2, 0)),
            edge((0, 1), (2, 0)),
            edge((0, -1), (2, 0)),
            edge((2, 0), (4, 1)),
            edge((2, 0), (4, -1)),
            edge((2, 0), (2, 3)),
        ];
        let q = EventQueue::new(&edges);
        let at: Vec<_> = q
            .iter()
            .filter(|ev| ev.point == GridPoint::new(2, 0))
            .map(|ev| (ev.kind, ev.edge))
            .collect();
        assert_eq!(
            at,
            vec![
                (EventKind::Leave, 1),
                (EventKind::Leave, 0),
                (EventKind::Leave, 2),
                (EventKind::Enter, 4),
                (EventKind::Enter, 3),
                (EventKind::Enter, 5),
            ]
        );
        assert_eq!(q.len(), 12);
    }
}
