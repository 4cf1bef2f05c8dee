//! Overlays of any number of tagged sets.
//!
//! An overlay cuts the plane into regions according to which input sets
//! contain them. Unlike a boolean operation, which only keeps the boundary of
//! a single result, an overlay keeps every edge where the collection of
//! containing sets changes, and labels the region on each side with the tags
//! of its sets.

use crate::{
    geom::Segment,
    mesh::Mesh,
    segments::Segments,
    snap::{SnapRounder, DEFAULT_PRECISION},
    sweep::{build_edges, sweep},
    Error, WindingRule,
};

/// Parameters for an [`Overlay`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OverlayConfig {
    /// The snap-rounding grid has this many cells per unit.
    pub precision: f64,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        OverlayConfig {
            precision: DEFAULT_PRECISION,
        }
    }
}

/// A collection of tagged sets, ready to be overlaid.
///
/// ```
/// use gridsweeper::{overlay::Overlay, Segments, SegmentData, WindingRule};
///
/// let mut overlay = Overlay::default();
/// let a = overlay.add_set("a", WindingRule::NonZero);
/// let b = overlay.add_set("b", WindingRule::NonZero);
///
/// let mut segs = Segments::default();
/// segs.add_cycle([(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0)], SegmentData::new(a, ()));
/// segs.add_cycle([(1.0, 1.0), (3.0, 1.0), (3.0, 3.0), (1.0, 3.0)], SegmentData::new(b, ()));
///
/// let mesh = overlay.run(&segs).unwrap();
/// let both = mesh
///     .faces()
///     .find(|f| mesh.face_data(*f) == Some(&vec!["a", "b"]))
///     .unwrap();
/// assert_eq!(mesh.face_area(both), 1.0);
/// ```
#[derive(Clone, Debug)]
pub struct Overlay<T> {
    config: OverlayConfig,
    sets: Vec<(T, WindingRule)>,
}

impl<T> Default for Overlay<T> {
    fn default() -> Self {
        Overlay {
            config: OverlayConfig::default(),
            sets: Vec::new(),
        }
    }
}

impl<T: Clone + PartialEq> Overlay<T> {
    /// Creates an overlay with no sets.
    pub fn new(config: OverlayConfig) -> Self {
        Overlay {
            config,
            sets: Vec::new(),
        }
    }

    /// Adds a set, returning the set number that its segments should use.
    pub fn add_set(&mut self, tag: T, rule: WindingRule) -> usize {
        self.sets.push((tag, rule));
        self.sets.len() - 1
    }

    /// The number of sets.
    pub fn num_sets(&self) -> usize {
        self.sets.len()
    }

    fn tags(&self, winding: &[i32]) -> Vec<T> {
        self.sets
            .iter()
            .zip(winding)
            .filter(|((_, rule), w)| rule.is_inside(**w))
            .map(|((tag, _), _)| tag.clone())
            .collect()
    }

    /// Computes the overlay.
    ///
    /// Every region of the output is labelled with the tags of all the sets
    /// that contain it, in the order that the sets were added. Regions that
    /// aren't in any set aren't faces of the output; the half-edges bounding
    /// them are outer.
    pub fn run<S>(&self, segments: &Segments<S>) -> Result<Mesh<Vec<T>>, Error> {
        let n_sets = self.sets.len();
        if let Some(set) = segments
            .indices()
            .map(|idx| segments.data(idx).set)
            .find(|set| *set >= n_sets)
        {
            return Err(Error::UnknownSet { set });
        }

        let mut rounder = SnapRounder::new(self.config.precision);
        rounder.process(segments)?;
        let edges = build_edges(rounder.rounded(), n_sets, |idx| segments.data(idx).set);

        let mut mesh = Mesh::new();
        sweep(&edges, n_sets, |_, edge, below, above| {
            let below = self.tags(below);
            let above = self.tags(above);
            if below == above {
                return;
            }
            let (l, r) = (rounder.to_point(edge.left), rounder.to_point(edge.right));
            let nonempty = |tags: Vec<T>| (!tags.is_empty()).then_some(tags);
            mesh.add_segment(
                l,
                r,
                nonempty(above),
                nonempty(below),
                Some(Segment::new(l, r)),
            );
        });

        tracing::debug!(
            sets = n_sets,
            edges = edges.len(),
            faces = mesh.num_faces(),
            open_chains = mesh.chains().count(),
            "overlaid"
        );
        Ok(mesh)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::segments::SegmentData;

    fn square(segs: &mut Segments<()>, x: f64, y: f64, size: f64, set: usize) {
        segs.add_cycle(
            [(x, y), (x + size, y), (x + size, y + size), (x, y + size)],
            SegmentData::new(set, ()),
        );
    }

    fn areas_by_tag(mesh: &Mesh<Vec<char>>) -> Vec<(Vec<char>, f64)> {
        let mut ret: Vec<(Vec<char>, f64)> = Vec::new();
        for f in mesh.faces() {
            let tags = mesh.face_data(f).cloned().unwrap_or_default();
            let area = mesh.face_area(f);
            match ret.iter_mut().find(|(t, _)| *t == tags) {
                Some((_, a)) => *a += area,
                None => ret.push((tags, area)),
            }
        }
        ret.sort_by(|a, b| a.0.cmp(&b.0));
        ret
    }

    #[test]
    fn three_squares() {
        let mut overlay = Overlay::default();
        let a = overlay.add_set('a', WindingRule::NonZero);
        let b = overlay.add_set('b', WindingRule::NonZero);
        let c = overlay.add_set('c', WindingRule::NonZero);
        let mut segs = Segments::default();
        square(&mut segs, 0.0, 0.0, 2.0, a);
        square(&mut segs, 1.0, 1.0, 2.0, b);
        square(&mut segs, 5.0, 0.0, 1.0, c);

        let mesh = overlay.run(&segs).unwrap();
        mesh.check_invariants().unwrap();
        assert_eq!(mesh.chains().count(), 0);
        assert_eq!(
            areas_by_tag(&mesh),
            vec![
                (vec!['a'], 3.0),
                (vec!['a', 'b'], 1.0),
                (vec!['b'], 3.0),
                (vec!['c'], 1.0),
            ]
        );
    }

    #[test]
    fn nested() {
        let mut overlay = Overlay::default();
        let outer = overlay.add_set('o', WindingRule::EvenOdd);
        let inner = overlay.add_set('i', WindingRule::EvenOdd);
        let mut segs = Segments::default();
        square(&mut segs, 0.0, 0.0, 4.0, outer);
        square(&mut segs, 1.0, 1.0, 2.0, inner);

        let mesh = overlay.run(&segs).unwrap();
        mesh.check_invariants().unwrap();
        // The ring around the inner square is a face, and so is the hole in
        // it (which is clockwise).
        assert_eq!(
            areas_by_tag(&mesh),
            vec![(vec!['o'], 12.0), (vec!['o', 'i'], 4.0)]
        );
        // Every edge of the inner square separates two labelled regions.
        assert_eq!(mesh.edges().filter(|e| mesh.is_inner(*e)).count(), 12);
    }

    #[test]
    fn identical_sets_share_edges() {
        let mut overlay = Overlay::default();
        let a = overlay.add_set('a', WindingRule::NonZero);
        let b = overlay.add_set('b', WindingRule::NonZero);
        let mut segs = Segments::default();
        square(&mut segs, 0.0, 0.0, 1.0, a);
        square(&mut segs, 0.0, 0.0, 1.0, b);

        let mesh = overlay.run(&segs).unwrap();
        assert_eq!(mesh.num_edges(), 4);
        assert_eq!(areas_by_tag(&mesh), vec![(vec!['a', 'b'], 1.0)]);
    }

    #[test]
    fn unknown_set() {
        let mut overlay = Overlay::default();
        overlay.add_set('a', WindingRule::NonZero);
        let mut segs = Segments::default();
        square(&mut segs, 0.0, 0.0, 1.0, 1);
        assert_matches!(overlay.run(&segs), Err(Error::UnknownSet { set: 1 }));
    }
}
