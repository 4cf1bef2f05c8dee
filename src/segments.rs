//! The input arena: straight segments, each carrying a payload.

use kurbo::BezPath;

use crate::geom::{Point, Segment};

impl_typed_vec!(
    /// An index into our segment arena.
    ///
    /// Throughout this library, we assign identities to segments, so that we may
    /// consider segments as different even if they have the same start- and end-points.
    /// This index is used to identify a segment, whose data can be retrieved by looking
    /// it up in [`Segments`].
    SegVec,
    SegIdx,
    "s"
);

/// The payload attached to every input segment.
#[derive(Clone, Debug, PartialEq)]
pub struct SegmentData<T> {
    /// Which input set this segment belongs to.
    ///
    /// Boolean clipping understands sets `0` and `1`; overlays understand as many
    /// sets as they have been told about.
    pub set: usize,
    /// A weight, carried along for the caller's benefit.
    pub weight: f64,
    /// If true, this segment's endpoints are treated as magnets by snap rounding,
    /// even if they are already aligned to the grid.
    pub snap: bool,
    /// An opaque tag, propagated to the output.
    pub tag: T,
}

impl<T> SegmentData<T> {
    /// A payload in the given set, with unit weight and no forced snapping.
    pub fn new(set: usize, tag: T) -> Self {
        SegmentData {
            set,
            weight: 1.0,
            snap: false,
            tag,
        }
    }

    /// Forces this segment's endpoints to be magnets.
    pub fn snapped(mut self) -> Self {
        self.snap = true;
        self
    }
}

/// An arena of line segments.
///
/// Segments are indexed by [`SegIdx`] and can be retrieved by indexing (i.e. with square brackets).
/// Unlike a sweep-line's internal representation, segments are stored with their
/// original orientation: it is what determines their winding contribution.
#[derive(Debug, Clone)]
pub struct Segments<T> {
    segs: SegVec<Segment>,
    data: SegVec<SegmentData<T>>,
}

impl<T> Default for Segments<T> {
    fn default() -> Self {
        Segments {
            segs: SegVec::default(),
            data: SegVec::default(),
        }
    }
}

fn pairs<T>(xs: &[T]) -> impl Iterator<Item = (&T, &T)> {
    xs.windows(2).map(|pair| (&pair[0], &pair[1]))
}

fn cyclic_pairs<T>(xs: &[T]) -> impl Iterator<Item = (&T, &T)> {
    pairs(xs).chain(xs.last().zip(xs.first()))
}

impl<T> Segments<T> {
    /// The number of line segments in this arena.
    pub fn len(&self) -> usize {
        self.segs.len()
    }

    /// Is this arena empty?
    pub fn is_empty(&self) -> bool {
        self.segs.is_empty()
    }

    /// Iterate over all indices that can be used to index into this arena.
    pub fn indices(&self) -> impl Iterator<Item = SegIdx> {
        self.segs.indices()
    }

    /// Iterate over all segments in this arena.
    pub fn segments(&self) -> impl Iterator<Item = (SegIdx, &Segment)> {
        self.segs.iter()
    }

    /// The payload of the segment at `idx`.
    pub fn data(&self, idx: SegIdx) -> &SegmentData<T> {
        &self.data[idx]
    }

    /// Adds a single segment.
    pub fn push(&mut self, seg: Segment, data: SegmentData<T>) -> SegIdx {
        self.data.push(data);
        self.segs.push(seg)
    }

    /// The largest number of distinct sets referenced by these segments.
    pub fn num_sets(&self) -> usize {
        self.data
            .iter()
            .map(|(_, d)| d.set + 1)
            .max()
            .unwrap_or(0)
    }
}

impl<T: Clone> Segments<T> {
    /// Add a (non-closed) polyline to this arena.
    pub fn add_points<P: Into<Point>>(
        &mut self,
        ps: impl IntoIterator<Item = P>,
        data: SegmentData<T>,
    ) {
        let ps: Vec<Point> = ps.into_iter().map(|p| p.into()).collect();
        for (p, q) in pairs(&ps) {
            self.push(Segment::new(*p, *q), data.clone());
        }
    }

    /// Add a closed polyline to this arena.
    ///
    /// The last point is joined back to the first one; it doesn't need to be repeated.
    pub fn add_cycle<P: Into<Point>>(&mut self, ps: impl IntoIterator<Item = P>, data: SegmentData<T>) {
        let ps: Vec<Point> = ps.into_iter().map(|p| p.into()).collect();
        if ps.len() <= 1 {
            return;
        }
        for (p, q) in cyclic_pairs(&ps) {
            if p != q {
                self.push(Segment::new(*p, *q), data.clone());
            }
        }
    }

    /// Add a collection of closed polylines to this arena.
    pub fn add_cycles<P: Into<Point>>(
        &mut self,
        ps: impl IntoIterator<Item = impl IntoIterator<Item = P>>,
        data: SegmentData<T>,
    ) {
        for p in ps {
            self.add_cycle(p, data.clone());
        }
    }

    /// Adds a Bézier path, approximated by line segments to within `tolerance`.
    ///
    /// Every subpath is treated as closed, whether or not it ends with a `ClosePath`.
    pub fn add_bez_path(&mut self, path: &BezPath, tolerance: f64, data: SegmentData<T>) {
        let mut current: Vec<Point> = Vec::new();
        let mut contours = Vec::new();
        kurbo::flatten(path, tolerance, |el| match el {
            kurbo::PathEl::MoveTo(p) => {
                if !current.is_empty() {
                    contours.push(std::mem::take(&mut current));
                }
                current.push(p.into());
            }
            kurbo::PathEl::LineTo(p) => current.push(p.into()),
            kurbo::PathEl::ClosePath => {
                if !current.is_empty() {
                    contours.push(std::mem::take(&mut current));
                }
            }
            // `flatten` only emits lines.
            kurbo::PathEl::QuadTo(..) | kurbo::PathEl::CurveTo(..) => {}
        });
        if !current.is_empty() {
            contours.push(current);
        }
        for mut c in contours {
            if c.len() >= 2 && c.first() == c.last() {
                c.pop();
            }
            self.add_cycle(c, data.clone());
        }
    }
}

impl<T> std::ops::Index<SegIdx> for Segments<T> {
    type Output = Segment;

    fn index(&self, index: SegIdx) -> &Self::Output {
        &self.segs[index]
    }
}
