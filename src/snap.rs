//! Snap rounding.
//!
//! Snap rounding takes a bag of line segments that might intersect each other
//! arbitrarily, and produces a new bag of segments whose endpoints all lie on an
//! integer grid, and which only meet one another at shared endpoints.
//!
//! The grid is obtained by scaling the input by a `precision` factor. Every
//! grid point that matters is a "hot pixel": the half-open unit square
//! `[x - 1/2, x + 1/2) x [y - 1/2, y + 1/2)` centered on it. These squares
//! tile the plane, so every point belongs to exactly one pixel, and that is
//! the pixel it rounds to. There are two flavors of hot pixels:
//!
//! - *pins* are input endpoints that were already exactly on the grid, and
//! - *magnets* are everything else: endpoints that needed rounding, endpoints
//!   that the caller asked to snap, and (rounded) intersection points.
//!
//! Every segment is then re-routed through the centers of the hot pixels that
//! it touches, in the order in which it touches them. This is the classic
//! hot-pixel argument: two re-routed segments can't cross, because if the
//! originals crossed then they both pass through the hot pixel of their
//! intersection point, and if they didn't then their order is preserved
//! outside of hot pixels.
//!
//! Magnets are always used. Pins only subdivide a span between two magnets
//! if the rounded span passes over them as well, and if rounding didn't drag
//! the span across them. Skipping a pin can break the argument above, so
//! any segment whose output ends up crossing something is routed again
//! through every pin it touches.
//!
//! ```text
//!   before:               after:
//!
//!      \  |                  \ |
//!       \ |                   \|
//!   -----\+------         -----+-------
//!        |\                    |\
//!        | \                   | \
//! ```

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use crate::{
    geom::{orient, orient_grid, GridPoint, Point, Segment},
    num::CheapOrderedFloat,
    segments::{SegIdx, Segments},
    Error,
};

/// The precision used by [`SnapRounder::default`].
pub const DEFAULT_PRECISION: f64 = 65536.0;

// Scaled coordinates must stay well within the range where f64 represents
// integers (and half-integers) exactly.
const MAX_SCALED: f64 = (1u64 << 51) as f64;

/// What kind of hot pixel is this?
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
pub enum PixelKind {
    /// A grid point that segments must be routed through. Magnets always win
    /// over pins.
    Magnet,
    /// An input endpoint that was exactly on the grid.
    Pin,
}

/// An output segment of snap rounding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
pub struct RoundedSegment {
    /// The start point, on the grid.
    pub start: GridPoint,
    /// The end point, on the grid.
    pub end: GridPoint,
    /// The input segment that this piece came from.
    ///
    /// The pieces of a segment have the same orientation as the segment.
    pub source: SegIdx,
}

impl RoundedSegment {
    fn left(&self) -> GridPoint {
        self.start.min(self.end)
    }

    fn right(&self) -> GridPoint {
        self.start.max(self.end)
    }
}

// An input segment, scaled into grid coordinates but not rounded.
#[derive(Clone, Copy, Debug)]
struct Scaled {
    source: SegIdx,
    start: Point,
    end: Point,
}

impl Scaled {
    fn min_x(&self) -> f64 {
        self.start.x.min(self.end.x)
    }

    fn max_x(&self) -> f64 {
        self.start.x.max(self.end.x)
    }

    fn min_y(&self) -> f64 {
        self.start.y.min(self.end.y)
    }

    fn max_y(&self) -> f64 {
        self.start.y.max(self.end.y)
    }

    fn shares_endpoint(&self, other: &Scaled) -> bool {
        self.start == other.start
            || self.start == other.end
            || self.end == other.start
            || self.end == other.end
    }
}

// The pixel containing `p`. Ties go up, to match the half-open pixels.
fn round(p: Point) -> GridPoint {
    GridPoint::new((p.x + 0.5).floor() as i64, (p.y + 0.5).floor() as i64)
}

fn check_point(p: Point) -> Result<(), Error> {
    if p.x.is_nan() || p.y.is_nan() {
        Err(Error::NaN)
    } else if !p.is_finite() {
        Err(Error::Infinity)
    } else {
        Ok(())
    }
}

// Where does `a` cross `b`? We only care about proper crossings: if one of the
// segments touches the other, the touching endpoint is already a hot pixel.
fn crossing(a: &Scaled, b: &Scaled) -> Option<Point> {
    if a.shares_endpoint(b) {
        return None;
    }
    let o1 = orient(a.start, a.end, b.start);
    let o2 = orient(a.start, a.end, b.end);
    let o3 = orient(b.start, b.end, a.start);
    let o4 = orient(b.start, b.end, a.end);
    if [o1, o2, o3, o4].contains(&Ordering::Equal) || o1 == o2 || o3 == o4 {
        return None;
    }

    let (dx, dy) = (a.end.x - a.start.x, a.end.y - a.start.y);
    let (ex, ey) = (b.end.x - b.start.x, b.end.y - b.start.y);
    let (wx, wy) = (b.start.x - a.start.x, b.start.y - a.start.y);
    let denom = dx * ey - dy * ex;
    let t = ((wx * ey - wy * ex) / denom).clamp(0.0, 1.0);
    let u = ((wx * dy - wy * dx) / denom).clamp(0.0, 1.0);

    // The two parametric hit points differ by rounding error; taking their
    // midpoint avoids biasing the result towards either segment.
    let pa = a.start.affine(&a.end, t);
    let pb = b.start.affine(&b.end, u);
    Some(pa.affine(&pb, 0.5))
}

// The pixels of a crossing point, which was only computed approximately.
//
// If it's very close to a pixel boundary, the exact crossing might be on the
// other side. So we take all the nearby pixels that both segments pass
// through: extra hot pixels are harmless, but missing the right one isn't.
fn crossing_pixels(p: Point, a: &Scaled, b: &Scaled) -> Vec<GridPoint> {
    let slack = 1e-9 * (1.0 + p.x.abs().max(p.y.abs()));
    let nearby: BTreeSet<GridPoint> = [(-1.0, -1.0), (-1.0, 1.0), (1.0, -1.0), (1.0, 1.0)]
        .into_iter()
        .map(|(sx, sy)| round(Point::new(p.x + sx * slack, p.y + sy * slack)))
        .collect();
    if nearby.len() == 1 {
        return vec![round(p)];
    }
    let shared: Vec<GridPoint> = nearby
        .into_iter()
        .filter(|c| touches(a.start, a.end, *c) && touches(b.start, b.end, *c))
        .collect();
    if shared.is_empty() {
        vec![round(p)]
    } else {
        shared
    }
}

// Does the segment from `a` to `b` pass through `q`?
fn passes_through(a: Point, b: Point, q: Point) -> bool {
    a.x.min(b.x) <= q.x
        && q.x <= a.x.max(b.x)
        && a.y.min(b.y) <= q.y
        && q.y <= a.y.max(b.y)
        && orient(a, b, q) == Ordering::Equal
}

// Does the segment from `a` to `b` meet the half-open pixel at `c`?
//
// We test against the closed square first, and then throw out the segments
// that only meet it along its (open) top or right side.
fn touches(a: Point, b: Point, c: GridPoint) -> bool {
    let (cx, cy) = (c.x as f64, c.y as f64);
    let (left, right, bottom, top) = (cx - 0.5, cx + 0.5, cy - 0.5, cy + 0.5);
    if a.x.max(b.x) < left || a.x.min(b.x) > right || a.y.max(b.y) < bottom || a.y.min(b.y) > top {
        return false;
    }
    let corners = [
        Point::new(left, bottom),
        Point::new(right, bottom),
        Point::new(right, top),
        Point::new(left, top),
    ];
    let mut signs = corners.iter().map(|&q| orient(a, b, q));
    let first = signs.next().unwrap_or(Ordering::Equal);
    let closed = first == Ordering::Equal || signs.any(|o| o != first);
    closed && !only_on_top(a, b, left, right, top) && !only_on_right(a, b, right, bottom, top)
}

// Assuming the segment meets the closed square, does it only meet it on the
// line `y = top`?
fn only_on_top(a: Point, b: Point, left: f64, right: f64, top: f64) -> bool {
    if a.y.min(b.y) >= top {
        return true;
    }
    if a.y == b.y {
        return false;
    }
    // Otherwise the segment reaches below the top, and the only way to do
    // that without entering the square is to leave one of the top corners
    // heading down and away from it.
    let (lo, hi) = if a.y < b.y { (a, b) } else { (b, a) };
    (passes_through(a, b, Point::new(left, top)) && lo.x < hi.x)
        || (passes_through(a, b, Point::new(right, top)) && lo.x > hi.x)
}

// Assuming the segment meets the closed square, does it only meet it on the
// line `x = right`?
fn only_on_right(a: Point, b: Point, right: f64, bottom: f64, top: f64) -> bool {
    if a.x.min(b.x) >= right {
        return true;
    }
    if a.x == b.x {
        return false;
    }
    let (lo, hi) = if a.x < b.x { (a, b) } else { (b, a) };
    (passes_through(a, b, Point::new(right, bottom)) && lo.y < hi.y)
        || (passes_through(a, b, Point::new(right, top)) && lo.y > hi.y)
}

// Should a pin that `s` touches between the grid points `from` and `to`
// subdivide that span?
//
// The rounded span has to pass over the pin too, and the pin must not lie
// strictly between the original line and the rounded one.
fn keeps_pin(s: &Scaled, from: GridPoint, to: GridPoint, pin: GridPoint) -> bool {
    if from == to {
        return true;
    }
    if !touches(from.to_f64(), to.to_f64(), pin) {
        return false;
    }
    let original = orient(s.start, s.end, pin.to_f64());
    let rounded = orient_grid(from, to, pin);
    original == Ordering::Equal || rounded == Ordering::Equal || original == rounded
}

/// Snap-rounds line segments onto an integer grid.
///
/// A `SnapRounder` can be re-used: every call to [`SnapRounder::process`]
/// discards the results of the previous one.
#[derive(Clone, Debug)]
pub struct SnapRounder {
    precision: f64,
    inputs: Vec<(SegIdx, Segment)>,
    scaled: Vec<Scaled>,
    pixels: BTreeMap<GridPoint, PixelKind>,
    intersections: Vec<Point>,
    rounded: Vec<RoundedSegment>,
}

impl Default for SnapRounder {
    fn default() -> Self {
        SnapRounder::new(DEFAULT_PRECISION)
    }
}

impl SnapRounder {
    /// Creates a snap rounder for the grid with `precision` cells per unit.
    pub fn new(precision: f64) -> Self {
        SnapRounder {
            precision,
            inputs: Vec::new(),
            scaled: Vec::new(),
            pixels: BTreeMap::new(),
            intersections: Vec::new(),
            rounded: Vec::new(),
        }
    }

    /// The number of grid cells per unit.
    pub fn precision(&self) -> f64 {
        self.precision
    }

    /// Forgets everything computed by the last call to [`SnapRounder::process`].
    pub fn clear(&mut self) {
        self.inputs.clear();
        self.scaled.clear();
        self.pixels.clear();
        self.intersections.clear();
        self.rounded.clear();
    }

    /// Converts a grid point back to the input's coordinates.
    pub fn to_point(&self, p: GridPoint) -> Point {
        Point::new(p.x as f64 / self.precision, p.y as f64 / self.precision)
    }

    fn scale(&self, p: Point) -> Result<Point, Error> {
        let q = Point::new(p.x * self.precision, p.y * self.precision);
        if q.x.abs() >= MAX_SCALED || q.y.abs() >= MAX_SCALED {
            return Err(Error::OutOfRange);
        }
        Ok(q)
    }

    fn add_pixel(&mut self, p: GridPoint, kind: PixelKind) {
        self.pixels
            .entry(p)
            .and_modify(|k| {
                if kind == PixelKind::Magnet {
                    *k = PixelKind::Magnet;
                }
            })
            .or_insert(kind);
    }

    fn add_endpoint(&mut self, p: Point, snap: bool) {
        let r = round(p);
        let on_grid = r.x as f64 == p.x && r.y as f64 == p.y;
        let kind = if on_grid && !snap {
            PixelKind::Pin
        } else {
            PixelKind::Magnet
        };
        self.add_pixel(r, kind);
    }

    /// Snap-rounds a collection of segments.
    ///
    /// Afterwards, the output can be retrieved with [`SnapRounder::rounded`].
    pub fn process<T>(&mut self, segments: &Segments<T>) -> Result<(), Error> {
        self.clear();
        if !self.precision.is_finite() || self.precision <= 0.0 {
            return Err(Error::InvalidPrecision(self.precision));
        }

        for (idx, seg) in segments.segments() {
            check_point(seg.start)?;
            check_point(seg.end)?;
            let start = self.scale(seg.start)?;
            let end = self.scale(seg.end)?;
            self.inputs.push((idx, *seg));
            if start == end {
                tracing::warn!(seg = ?idx, "ignoring a zero-length segment");
                continue;
            }
            let snap = segments.data(idx).snap;
            self.add_endpoint(start, snap);
            self.add_endpoint(end, snap);
            self.scaled.push(Scaled {
                source: idx,
                start,
                end,
            });
        }

        self.find_intersections();

        // Segments in `thorough` are routed through every pin they touch.
        let mut thorough = BTreeSet::new();
        loop {
            self.route(&thorough);
            self.weld();
            let before = thorough.len();
            for (i, j) in self.residual_crossings() {
                thorough.insert(self.rounded[i].source);
                thorough.insert(self.rounded[j].source);
            }
            if thorough.len() == before {
                break;
            }
            tracing::debug!(
                count = thorough.len() - before,
                "re-routing segments through all their pins"
            );
        }

        tracing::debug!(
            inputs = self.inputs.len(),
            intersections = self.intersections.len(),
            pixels = self.pixels.len(),
            outputs = self.rounded.len(),
            "snap rounded"
        );
        Ok(())
    }

    // A sweep over x: a segment is tested against every other segment whose
    // x range overlaps its own.
    fn find_intersections(&mut self) {
        let mut order: Vec<usize> = (0..self.scaled.len()).collect();
        order.sort_by(|&i, &j| {
            CheapOrderedFloat::from(self.scaled[i].min_x())
                .cmp(&CheapOrderedFloat::from(self.scaled[j].min_x()))
                .then(i.cmp(&j))
        });

        let mut active: Vec<usize> = Vec::new();
        let mut found = Vec::new();
        for i in order {
            let seg = self.scaled[i];
            let min_x = seg.min_x();
            active.retain(|&j| self.scaled[j].max_x() >= min_x);
            for &j in &active {
                if let Some(p) = crossing(&self.scaled[j], &seg) {
                    found.push((p, j, i));
                }
            }
            active.push(i);
        }

        for (p, i, j) in found {
            self.intersections
                .push(Point::new(p.x / self.precision, p.y / self.precision));
            for pixel in crossing_pixels(p, &self.scaled[i], &self.scaled[j]) {
                self.add_pixel(pixel, PixelKind::Magnet);
            }
        }
    }

    // All the hot pixels that `s` touches, except the ones it starts and ends
    // in, in the order that it touches them.
    fn hot_pixels_on(&self, s: &Scaled, ends: [GridPoint; 2]) -> Vec<(GridPoint, PixelKind)> {
        let lo = round(Point::new(s.min_x(), s.min_y()));
        let hi = round(Point::new(s.max_x(), s.max_y()));
        let mut hits: Vec<_> = self
            .pixels
            .range(GridPoint::new(lo.x, i64::MIN)..=GridPoint::new(hi.x, i64::MAX))
            .filter(|(p, _)| (lo.y..=hi.y).contains(&p.y) && !ends.contains(p))
            .filter(|(p, _)| touches(s.start, s.end, **p))
            .map(|(p, kind)| (*p, *kind))
            .collect();

        // Moving along a segment, the pixel coordinates only ever change in
        // the direction of the segment. The pixels we touch are all distinct,
        // so sorting them by x (in the direction of travel) and then by y
        // gives exactly the order in which we pass through them.
        let dir_x = CheapOrderedFloat::from(s.end.x).cmp(&CheapOrderedFloat::from(s.start.x));
        let dir_y = CheapOrderedFloat::from(s.end.y).cmp(&CheapOrderedFloat::from(s.start.y));
        let along = |dir: Ordering, a: i64, b: i64| match dir {
            Ordering::Less => b.cmp(&a),
            _ => a.cmp(&b),
        };
        hits.sort_by(|(a, _), (b, _)| {
            along(dir_x, a.x, b.x).then(along(dir_y, a.y, b.y))
        });
        hits
    }

    fn route(&mut self, thorough: &BTreeSet<SegIdx>) {
        let mut rounded = Vec::new();
        for s in &self.scaled {
            let start = round(s.start);
            let end = round(s.end);
            let keep_all = thorough.contains(&s.source);
            let hits = self.hot_pixels_on(s, [start, end]);

            // Magnets (and the endpoints) cut the segment into spans. Within
            // each span, the pins that we keep subdivide it further.
            let mut route = vec![start];
            let mut span_start = start;
            let mut pins = Vec::new();
            for (p, kind) in hits.into_iter().chain(std::iter::once((end, PixelKind::Magnet))) {
                match kind {
                    PixelKind::Pin => pins.push(p),
                    PixelKind::Magnet => {
                        route.extend(
                            pins.drain(..)
                                .filter(|pin| keep_all || keeps_pin(s, span_start, p, *pin)),
                        );
                        route.push(p);
                        span_start = p;
                    }
                }
            }
            route.dedup();

            for w in route.windows(2) {
                rounded.push(RoundedSegment {
                    start: w[0],
                    end: w[1],
                    source: s.source,
                });
            }
        }
        self.rounded = rounded;
    }

    // Rounding can move a segment so that it passes exactly over some other
    // grid vertex. Split those segments, so that everything meets at endpoints.
    fn weld(&mut self) {
        let vertices: BTreeSet<GridPoint> = self
            .rounded
            .iter()
            .flat_map(|s| [s.start, s.end])
            .collect();

        let mut welded = Vec::with_capacity(self.rounded.len());
        for s in &self.rounded {
            let (lo, hi) = (s.left(), s.right());
            let (y0, y1) = (lo.y.min(hi.y), lo.y.max(hi.y));
            let mut inner: Vec<GridPoint> = vertices
                .range(lo..=hi)
                .filter(|v| **v != lo && **v != hi && (y0..=y1).contains(&v.y))
                .filter(|v| orient_grid(s.start, s.end, **v) == Ordering::Equal)
                .copied()
                .collect();
            if inner.is_empty() {
                welded.push(*s);
                continue;
            }
            tracing::trace!(seg = ?s, count = inner.len(), "welding");
            if s.start > s.end {
                inner.reverse();
            }
            let mut prev = s.start;
            for v in inner.into_iter().chain(std::iter::once(s.end)) {
                welded.push(RoundedSegment {
                    start: prev,
                    end: v,
                    source: s.source,
                });
                prev = v;
            }
        }
        self.rounded = welded;
    }

    /// The input segments of the last call to [`SnapRounder::process`].
    pub fn inputs(&self) -> &[(SegIdx, Segment)] {
        &self.inputs
    }

    /// The snap-rounded output segments, in grid coordinates.
    pub fn rounded(&self) -> &[RoundedSegment] {
        &self.rounded
    }

    /// The snap-rounded output segments, scaled back to the input's coordinates.
    pub fn rounded_segments(&self) -> impl Iterator<Item = (SegIdx, Segment)> + '_ {
        self.rounded.iter().map(|s| {
            (
                s.source,
                Segment::new(self.to_point(s.start), self.to_point(s.end)),
            )
        })
    }

    /// All the pairwise intersection points found among the inputs, before rounding.
    pub fn intersections(&self) -> &[Point] {
        &self.intersections
    }

    /// All the magnet pixels, sorted.
    pub fn magnets(&self) -> Vec<GridPoint> {
        self.pixels_of_kind(PixelKind::Magnet)
    }

    /// All the pin pixels, sorted.
    pub fn pins(&self) -> Vec<GridPoint> {
        self.pixels_of_kind(PixelKind::Pin)
    }

    fn pixels_of_kind(&self, kind: PixelKind) -> Vec<GridPoint> {
        self.pixels
            .iter()
            .filter(|(_, k)| **k == kind)
            .map(|(p, _)| *p)
            .collect()
    }

    /// Finds all pairs of output segments that cross, or where one passes
    /// through an endpoint of the other.
    ///
    /// This is computed exactly, and it should always be empty.
    pub fn residual_crossings(&self) -> Vec<(usize, usize)> {
        let mut order: Vec<usize> = (0..self.rounded.len()).collect();
        order.sort_by_key(|&i| (self.rounded[i].left(), i));

        let mut active: Vec<usize> = Vec::new();
        let mut bad = Vec::new();
        for i in order {
            let s = &self.rounded[i];
            let x = s.left().x;
            active.retain(|&j| self.rounded[j].right().x >= x);
            for &j in &active {
                if conflict(&self.rounded[j], s) {
                    bad.push((j, i));
                }
            }
            active.push(i);
        }
        bad
    }

    /// Checks that the output is free of crossings.
    ///
    /// Returns `false` (and logs an error) if it isn't.
    pub fn validate(&self) -> bool {
        let bad = self.residual_crossings();
        if bad.is_empty() {
            true
        } else {
            tracing::error!(count = bad.len(), first = ?bad[0], "snap rounding output has crossings");
            false
        }
    }
}

fn strictly_inside(s: &RoundedSegment, p: GridPoint) -> bool {
    let (lo, hi) = (s.left(), s.right());
    lo < p && p < hi && orient_grid(s.start, s.end, p) == Ordering::Equal
}

fn conflict(a: &RoundedSegment, b: &RoundedSegment) -> bool {
    if strictly_inside(a, b.start)
        || strictly_inside(a, b.end)
        || strictly_inside(b, a.start)
        || strictly_inside(b, a.end)
    {
        return true;
    }
    let o1 = orient_grid(a.start, a.end, b.start);
    let o2 = orient_grid(a.start, a.end, b.end);
    let o3 = orient_grid(b.start, b.end, a.start);
    let o4 = orient_grid(b.start, b.end, a.end);
    o1 != Ordering::Equal
        && o2 != Ordering::Equal
        && o3 != Ordering::Equal
        && o4 != Ordering::Equal
        && o1 != o2
        && o3 != o4
}
