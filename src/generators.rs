//! Utilities for generating examples, benchmarks, and test cases.

use crate::{Point, SegmentData, Segments};

type Contours = Vec<Vec<Point>>;

/// Generate a bunch of squares, arranged in a grid.
///
/// The bottom-left of the first square is at (x0, y0). Each square has size `size
/// x size`, and the distance between squares (both horizontally and vertically)
/// is `offset`.
///
/// If `slant` is non-zero, generates parallelograms instead of squares: the
/// right-hand side of each square gets translated up by `slant`.
fn squares((x0, y0): (f64, f64), size: f64, offset: f64, slant: f64, count: usize) -> Contours {
    let mut ret = Vec::new();
    for i in 0..count {
        let x = x0 + i as f64 * offset;
        for j in 0..count {
            let y = y0 + j as f64 * offset;
            ret.push(vec![
                Point::new(x, y),
                Point::new(x + size, y + slant),
                Point::new(x + size, y + size + slant),
                Point::new(x, y + size),
            ]);
        }
    }

    ret
}

/// Generate an `n` by `n` checkerboard-like pattern with overlapping squares.
/// For `n = 3`, it looks like:
///
/// ```text
/// +----+ +----+ +----+
/// |    | |    | |    |
/// |  +-+-+-++-+-+-+  |
/// +--+-+ +-++-+ +-+--+
/// +--+-+ +-++-+ +-+--+
/// |  +-+-+-++-+-+-+  |
/// |  +-+-+-++-+-+-+  |
/// +--+-+ +-++-+ +-+--+
/// +--+-+ +-++-+ +-+--+
/// |  +-+-+-++-+-+-+  |
/// |    | |    | |    |
/// +----+ +----+ +----+
/// ```
///
/// We return the pattern in two parts: the outer collection of `n x n`
/// non-overlapping squares, and the inner collection of `(n - 1) x (n - 1)`
/// non-overlapping squares. All the squares are counter-clockwise.
pub fn checkerboard(n: usize) -> (Contours, Contours) {
    (
        squares((0.0, 0.0), 30.0, 40.0, 0.0, n),
        squares((20.0, 20.0), 30.0, 40.0, 0.0, n.saturating_sub(1)),
    )
}

/// Like `checkerboard`, but with no exactly-horizontal lines.
///
/// Horizontal lines are on grid rows no matter how they're rounded, so their
/// absence makes more work for snap rounding.
pub fn slanted_checkerboard(n: usize) -> (Contours, Contours) {
    (
        squares((0.0, 0.0), 30.0, 40.0, 1.0, n),
        squares((20.0, 20.0), 30.0, 40.0, 1.0, n.saturating_sub(1)),
    )
}

/// The "evens" are a bunch of long, skinny parallelograms going from bottom-left
/// to top-right. The "odds" go from bottom-right to top-left.
///
/// Every even crosses every odd, so there are lots of intersections.
pub fn slanties(n: usize) -> (Contours, Contours) {
    let h = 20.0 * n as f64;

    let mut even = Vec::new();
    let mut odd = Vec::new();
    for i in 0..n {
        let x_off = 20.0 * i as f64;
        even.push(vec![
            Point::new(x_off, 0.0),
            Point::new(x_off + 10.0, 0.0),
            Point::new(x_off + h + 10.0, h),
            Point::new(x_off + h, h),
        ]);

        odd.push(vec![
            Point::new(x_off + h, 0.0),
            Point::new(x_off + h + 10.0, 0.0),
            Point::new(x_off + 10.0, h),
            Point::new(x_off, h),
        ]);
    }

    (even, odd)
}

/// Puts a pair of contour collections into a segment arena, as sets `0` and `1`.
pub fn to_segments((a, b): (Contours, Contours)) -> Segments<()> {
    let mut segs = Segments::default();
    segs.add_cycles(a, SegmentData::new(0, ()));
    segs.add_cycles(b, SegmentData::new(1, ()));
    segs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::signed_area;

    #[test]
    fn counter_clockwise() {
        for (a, b) in [checkerboard(3), slanted_checkerboard(3), slanties(3)] {
            for c in a.iter().chain(&b) {
                assert!(signed_area(c) > 0.0);
            }
        }
        let (a, b) = checkerboard(3);
        assert_eq!((a.len(), b.len()), (9, 4));
        assert_eq!(to_segments((a, b)).len(), 52);
    }
}
