//! Geometric primitives, like points and lines, and the predicates on them.

use std::cmp::Ordering;

use crate::num::{CheapOrderedFloat, DoubleDouble};

/// A two-dimensional point.
///
/// Points are sorted by `x` and then by `y`, for the convenience of our sweep-line
/// algorithms (which move in increasing `x`).
#[derive(Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Point {
    /// Horizontal component.
    pub x: f64,
    /// Vertical component.
    ///
    /// Although it isn't important for functionality, the documentation and method naming
    /// assumes that larger values are up.
    pub y: f64,
}

impl Ord for Point {
    fn cmp(&self, other: &Self) -> Ordering {
        (
            CheapOrderedFloat::from(self.x),
            CheapOrderedFloat::from(self.y),
        )
            .cmp(&(
                CheapOrderedFloat::from(other.x),
                CheapOrderedFloat::from(other.y),
            ))
    }
}

impl PartialOrd for Point {
    #[inline(always)]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Eq for Point {}

impl std::hash::Hash for Point {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        CheapOrderedFloat::from(self.x).hash(state);
        CheapOrderedFloat::from(self.y).hash(state);
    }
}

impl std::fmt::Debug for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:?}, {:?})", self.x, self.y)
    }
}

impl Point {
    /// Create a new point.
    pub fn new(x: f64, y: f64) -> Self {
        debug_assert!(x.is_finite());
        debug_assert!(y.is_finite());
        Point { x, y }
    }

    /// Compute an affine combination between `self` and `other`; that is, `(1 - t) * self + t * other`.
    pub fn affine(&self, other: &Self, t: f64) -> Self {
        Point {
            x: (1.0 - t) * self.x + t * other.x,
            y: (1.0 - t) * self.y + t * other.y,
        }
    }

    /// Converts to a `kurbo` point.
    pub fn to_kurbo(self) -> kurbo::Point {
        kurbo::Point::new(self.x, self.y)
    }

    pub(crate) fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

impl From<kurbo::Point> for Point {
    fn from(p: kurbo::Point) -> Self {
        Self { x: p.x, y: p.y }
    }
}

/// A straight line segment, with an orientation.
#[derive(Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Segment {
    /// Where the segment starts.
    pub start: Point,
    /// Where the segment ends.
    pub end: Point,
}

impl std::fmt::Debug for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} -> {:?}", self.start, self.end)
    }
}

impl Segment {
    /// Create a new segment.
    pub fn new(start: Point, end: Point) -> Self {
        Segment { start, end }
    }

    /// The same segment, going the other way.
    pub fn reversed(&self) -> Self {
        Segment {
            start: self.end,
            end: self.start,
        }
    }

    /// The lexicographically smaller endpoint.
    pub fn left(&self) -> Point {
        self.start.min(self.end)
    }

    /// The lexicographically larger endpoint.
    pub fn right(&self) -> Point {
        self.start.max(self.end)
    }

    /// Is this segment degenerate (i.e. just a point)?
    pub fn is_point(&self) -> bool {
        self.start == self.end
    }

    /// Converts to a `kurbo` line.
    pub fn to_kurbo(&self) -> kurbo::Line {
        kurbo::Line::new(self.start.to_kurbo(), self.end.to_kurbo())
    }
}

/// A point on the integer snap-rounding grid.
///
/// Like [`Point`], grid points are ordered by `x` first.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct GridPoint {
    /// Horizontal component.
    pub x: i64,
    /// Vertical component.
    pub y: i64,
}

impl std::fmt::Debug for GridPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.x, self.y)
    }
}

impl GridPoint {
    /// Create a new grid point.
    pub fn new(x: i64, y: i64) -> Self {
        GridPoint { x, y }
    }

    /// The center of this pixel, as a float.
    pub fn to_f64(self) -> Point {
        Point::new(self.x as f64, self.y as f64)
    }
}

/// The orientation of the triangle `a, b, c`: positive if it's counter-clockwise
/// (i.e. `c` is to the left of the line from `a` to `b`).
///
/// This is computed in double-double arithmetic.
pub fn orient_dd(a: Point, b: Point, c: Point) -> DoubleDouble {
    let abx = DoubleDouble::diff(b.x, a.x);
    let aby = DoubleDouble::diff(b.y, a.y);
    let acx = DoubleDouble::diff(c.x, a.x);
    let acy = DoubleDouble::diff(c.y, a.y);
    abx * acy - aby * acx
}

/// The sign of the orientation of `a, b, c`.
///
/// `Greater` means counter-clockwise, `Less` means clockwise, and `Equal` means
/// (as far as we can tell) collinear.
pub fn orient(a: Point, b: Point, c: Point) -> Ordering {
    orient_dd(a, b, c).signum()
}

/// The exact orientation of three grid points, as in [`orient`].
pub fn orient_grid(a: GridPoint, b: GridPoint, c: GridPoint) -> Ordering {
    let abx = b.x as i128 - a.x as i128;
    let aby = b.y as i128 - a.y as i128;
    let acx = c.x as i128 - a.x as i128;
    let acy = c.y as i128 - a.y as i128;
    (abx * acy - aby * acx).cmp(&0)
}

/// Is `d` inside the circle through `a, b, c`?
///
/// `a, b, c` must be counter-clockwise. Returns `Greater` if `d` is strictly inside,
/// `Equal` if it's on the circle, and `Less` if it's outside.
pub fn incircle(a: Point, b: Point, c: Point, d: Point) -> Ordering {
    let adx = DoubleDouble::diff(a.x, d.x);
    let ady = DoubleDouble::diff(a.y, d.y);
    let bdx = DoubleDouble::diff(b.x, d.x);
    let bdy = DoubleDouble::diff(b.y, d.y);
    let cdx = DoubleDouble::diff(c.x, d.x);
    let cdy = DoubleDouble::diff(c.y, d.y);

    let alift = adx * adx + ady * ady;
    let blift = bdx * bdx + bdy * bdy;
    let clift = cdx * cdx + cdy * cdy;

    let det = alift * (bdx * cdy - bdy * cdx) + blift * (cdx * ady - cdy * adx)
        + clift * (adx * bdy - ady * bdx);
    det.signum()
}

/// Compares the directions of `a - origin` and `b - origin` by their angle,
/// measured counter-clockwise from the positive `x` axis in `[0, 2pi)`.
pub fn angle_cmp(origin: Point, a: Point, b: Point) -> Ordering {
    let upper = |p: Point| p.y > origin.y || (p.y == origin.y && p.x > origin.x);
    match (upper(a), upper(b)) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        // In the same half-plane, `a` comes first if `b` is counter-clockwise from it.
        _ => orient(origin, b, a),
    }
}

/// Does the direction of `d - origin` fall strictly inside the counter-clockwise
/// sector that starts at `from - origin` and ends at `to - origin`?
///
/// If `from` and `to` have the same direction, the sector is the whole plane
/// (minus that direction).
pub fn in_ccw_sector(origin: Point, from: Point, to: Point, d: Point) -> bool {
    // The angle of `p`, relative to `from`: the order is (0, pi), pi, (pi, 2pi), 0.
    let class = |p: Point| match orient(origin, from, p) {
        Ordering::Greater => 0,
        Ordering::Less => 2,
        Ordering::Equal => {
            let dot = DoubleDouble::diff(from.x, origin.x) * DoubleDouble::diff(p.x, origin.x)
                + DoubleDouble::diff(from.y, origin.y) * DoubleDouble::diff(p.y, origin.y);
            if dot.signum() == Ordering::Less {
                1
            } else {
                3
            }
        }
    };
    let (cd, ct) = (class(d), class(to));
    if cd == 3 {
        return false;
    }
    match cd.cmp(&ct) {
        Ordering::Less => true,
        Ordering::Greater => false,
        // Same open half-plane relative to `from`: `d` comes first if `to` is ccw from it.
        Ordering::Equal => cd != 1 && orient(origin, d, to) == Ordering::Greater,
    }
}

/// The signed area of a closed polygon, positive if it winds counter-clockwise.
pub fn signed_area(points: &[Point]) -> f64 {
    let n = points.len();
    let mut sum = 0.0;
    for i in 0..n {
        let p = points[i];
        let q = points[(i + 1) % n];
        sum += p.x * q.y - q.x * p.y;
    }
    sum / 2.0
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::num::tests::Reasonable;

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn ordering() {
        assert!(p(0.0, 5.0) < p(1.0, 0.0));
        assert!(p(1.0, 0.0) < p(1.0, 1.0));
        assert!(GridPoint::new(0, 5) < GridPoint::new(1, 0));
    }

    #[test]
    fn angles() {
        let o = p(0.0, 0.0);
        let east = p(1.0, 0.0);
        let north = p(0.0, 1.0);
        let west = p(-1.0, 0.0);
        let south = p(0.0, -1.0);
        assert_eq!(angle_cmp(o, east, north), Ordering::Less);
        assert_eq!(angle_cmp(o, north, west), Ordering::Less);
        assert_eq!(angle_cmp(o, west, south), Ordering::Less);
        assert_eq!(angle_cmp(o, south, east), Ordering::Greater);

        assert!(in_ccw_sector(o, east, west, north));
        assert!(!in_ccw_sector(o, east, west, south));
        assert!(in_ccw_sector(o, west, east, south));
        // A degenerate sector covers everything except its own direction.
        assert!(in_ccw_sector(o, east, east, south));
        assert!(!in_ccw_sector(o, east, east, p(2.0, 0.0)));
        // Reflex sectors.
        assert!(in_ccw_sector(o, north, east, south));
        assert!(!in_ccw_sector(o, north, east, p(1.0, 1.0)));
    }

    #[test]
    fn circles() {
        let a = p(0.0, 0.0);
        let b = p(1.0, 0.0);
        let c = p(0.0, 1.0);
        assert_eq!(incircle(a, b, c, p(0.5, 0.5)), Ordering::Greater);
        assert_eq!(incircle(a, b, c, p(1.0, 1.0)), Ordering::Equal);
        assert_eq!(incircle(a, b, c, p(2.0, 2.0)), Ordering::Less);
    }

    #[test]
    fn square_area() {
        let sq = [p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0), p(0.0, 1.0)];
        assert_eq!(signed_area(&sq), 1.0);
    }

    proptest! {
        #[test]
        fn orient_matches_grid(
            ax in i64::reasonable(), ay in i64::reasonable(),
            bx in i64::reasonable(), by in i64::reasonable(),
            t in 0i64..4,
        ) {
            // A point that's exactly on the line, and one that's just off it.
            let a = GridPoint::new(ax, ay);
            let b = GridPoint::new(bx, by);
            let on = GridPoint::new(ax + t * (bx - ax), ay + t * (by - ay));
            let off = GridPoint::new(on.x + 1, on.y);
            for c in [on, off] {
                prop_assert_eq!(
                    orient(a.to_f64(), b.to_f64(), c.to_f64()),
                    orient_grid(a, b, c)
                );
            }
        }

        #[test]
        fn orient_antisymmetric(a in (f64::reasonable(), f64::reasonable()), b in (f64::reasonable(), f64::reasonable()), c in (f64::reasonable(), f64::reasonable())) {
            let (a, b, c) = (Point::from(a), Point::from(b), Point::from(c));
            prop_assert_eq!(orient(a, b, c), orient(b, a, c).reverse());
            prop_assert_eq!(orient(a, b, c), orient(b, c, a));
        }
    }
}
