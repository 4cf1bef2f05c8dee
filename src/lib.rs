#![deny(missing_docs)]
#![doc = include_str!("../README.md")]

#[macro_use]
mod typed_vec;

#[cfg(any(test, feature = "arbitrary"))]
pub mod arbitrary;
pub mod clip;
mod geom;
pub mod mesh;
mod num;
pub mod overlay;
mod segments;
pub mod snap;
pub mod sweep;

#[cfg(feature = "generators")]
pub mod generators;

pub use clip::{clip, ClipConfig};
pub use geom::{GridPoint, Point, Segment};
pub use mesh::Mesh;
pub use overlay::{Overlay, OverlayConfig};
pub use segments::{SegIdx, SegmentData, Segments};
pub use snap::SnapRounder;

/// Everything that can go wrong.
///
/// Geometric difficulties in the input (self-intersections, overlaps, tiny
/// features) are never errors: they are what snap rounding is for. Errors are
/// reserved for inputs that can't be represented, and for misuse of the mesh
/// API.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum Error {
    /// At least one of the inputs was infinite.
    #[error("one of the inputs was infinite")]
    Infinity,
    /// At least one of the inputs was not a number.
    #[error("one of the inputs had a NaN")]
    NaN,
    /// An input coordinate was too large to be represented on the grid.
    #[error("one of the inputs was too large for the grid")]
    OutOfRange,
    /// The grid precision must be finite and positive.
    #[error("invalid precision {0}")]
    InvalidPrecision(f64),
    /// A segment referred to a set that the operation doesn't know about.
    #[error("unknown set {set}")]
    UnknownSet {
        /// The offending set number.
        set: usize,
    },
    /// A chain was expected to be closed, but isn't.
    #[error("the chain isn't closed")]
    ChainNotClosed,
    /// The mesh (or part of it) couldn't be triangulated.
    #[error("couldn't triangulate")]
    NotTriangulable,
    /// A point to insert wasn't inside any triangle.
    #[error("the point is outside the triangulation")]
    PointOutside,
    /// A point to insert was on an existing edge or vertex.
    #[error("the point is on an existing edge")]
    PointOnBoundary,
    /// The mesh's internal invariants don't hold.
    #[error("mesh invariant violated: {0}")]
    Invariant(String),
}

/// A winding rule tells us how to decide whether a point is "inside" a set,
/// given its winding number.
#[derive(Clone, Copy, Debug)]
pub enum WindingRule {
    /// The point is "inside" if its winding number is odd.
    EvenOdd,
    /// The point is "inside" if its winding number is non-zero.
    NonZero,
    /// The point is "inside" if its winding number is positive.
    Positive,
    /// The point is "inside" if its winding number is negative.
    Negative,
    /// The point is "inside" if the function says so.
    Custom(fn(i32) -> bool),
}

impl WindingRule {
    /// Is a point with this winding number inside?
    pub fn is_inside(&self, winding: i32) -> bool {
        match self {
            WindingRule::EvenOdd => winding % 2 != 0,
            WindingRule::NonZero => winding != 0,
            WindingRule::Positive => winding > 0,
            WindingRule::Negative => winding < 0,
            WindingRule::Custom(f) => f(winding),
        }
    }
}

/// Binary operations between sets.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum BinaryOp {
    /// A point is in the union of two sets if it is in either one.
    Union,
    /// A point is in the intersection of two sets if it is in both.
    Intersection,
    /// A point is in the exclusive-or of two sets if it is in one or the other, but not both.
    Exclusion,
    /// The points of the first set that aren't in the second.
    AWithoutB,
    /// The points of the second set that aren't in the first.
    BWithoutA,
}

impl BinaryOp {
    /// Combines membership in the two sets.
    pub fn combine(&self, in_a: bool, in_b: bool) -> bool {
        match self {
            BinaryOp::Union => in_a || in_b,
            BinaryOp::Intersection => in_a && in_b,
            BinaryOp::Exclusion => in_a != in_b,
            BinaryOp::AWithoutB => in_a && !in_b,
            BinaryOp::BWithoutA => in_b && !in_a,
        }
    }
}

/// The tolerance used by [`binary_op`] to approximate curves by lines.
pub const FLATTEN_TOLERANCE: f64 = 1e-3;

/// Computes a boolean operation between two paths.
///
/// Curves are approximated by line segments, and the result is snap-rounded
/// to the default grid. Both paths use the same winding rule.
pub fn binary_op(
    set_a: &kurbo::BezPath,
    set_b: &kurbo::BezPath,
    rule: WindingRule,
    op: BinaryOp,
) -> Result<Mesh<()>, Error> {
    let mut segs = Segments::default();
    segs.add_bez_path(set_a, FLATTEN_TOLERANCE, SegmentData::new(0, ()));
    segs.add_bez_path(set_b, FLATTEN_TOLERANCE, SegmentData::new(1, ()));
    let config = ClipConfig {
        rules: [rule; 2],
        op,
        ..ClipConfig::default()
    };
    let mesh = clip(&segs, &config)?;

    #[cfg(feature = "debug-svg")]
    {
        if let Err(e) = svg::save("out.svg", &mesh.dump_svg()) {
            tracing::warn!(%e, "couldn't save the debug output");
        }
    }

    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use kurbo::{BezPath, Shape};

    use super::*;

    fn area(mesh: &Mesh<()>) -> f64 {
        mesh.faces().map(|f| mesh.face_area(f)).sum()
    }

    #[test]
    fn winding_rules() {
        let rules = [
            WindingRule::EvenOdd,
            WindingRule::NonZero,
            WindingRule::Positive,
            WindingRule::Negative,
            WindingRule::Custom(|w| w >= 2),
        ];
        let inside = |w: i32| rules.map(|r| r.is_inside(w));
        assert_eq!(inside(0), [false, false, false, false, false]);
        assert_eq!(inside(1), [true, true, true, false, false]);
        assert_eq!(inside(-1), [true, true, false, true, false]);
        assert_eq!(inside(2), [false, true, true, false, true]);
    }

    #[test]
    fn two_squares() {
        fn to_bez(points: &[(f64, f64)]) -> BezPath {
            let mut ret = BezPath::default();
            ret.move_to(points[0]);
            for q in &points[1..] {
                ret.line_to(*q);
            }
            ret.close_path();
            ret
        }
        let a = to_bez(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]);
        let b = to_bez(&[(-0.5, -0.5), (0.5, -0.5), (0.5, 0.5), (-0.5, 0.5)]);
        let output = binary_op(&a, &b, WindingRule::EvenOdd, BinaryOp::Intersection).unwrap();
        assert_eq!(output.num_faces(), 1);
        assert_eq!(area(&output), 0.25);

        let output = binary_op(&a, &b, WindingRule::EvenOdd, BinaryOp::Union).unwrap();
        assert_eq!(area(&output), 1.75);
    }

    #[test]
    fn curves() {
        let circle = kurbo::Circle::new((0.0, 0.0), 1.0).to_path(1e-3);
        let rect = kurbo::Rect::new(0.0, -2.0, 2.0, 2.0).to_path(1e-3);
        let half = binary_op(&circle, &rect, WindingRule::NonZero, BinaryOp::AWithoutB).unwrap();
        half.check_invariants().unwrap();
        assert_eq!(half.num_faces(), 1);
        let expected = std::f64::consts::PI / 2.0;
        assert!((area(&half) - expected).abs() < 0.01);
    }

    #[test]
    fn bad_input() {
        let mut nan = BezPath::new();
        nan.move_to((0.0, 0.0));
        nan.line_to((f64::NAN, 1.0));
        nan.line_to((1.0, 0.0));
        nan.close_path();
        let square = kurbo::Rect::new(0.0, 0.0, 1.0, 1.0).to_path(1e-3);
        assert_matches!(
            binary_op(&nan, &square, WindingRule::NonZero, BinaryOp::Union),
            Err(Error::NaN)
        );
    }
}
