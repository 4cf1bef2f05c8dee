//! Utilities for fuzz and/or property testing using `arbitrary`.

use arbitrary::Unstructured;

use crate::{Point, SegmentData, Segments};

/// Generate an arbitrary float in some range.
pub fn float_in_range(
    start: f64,
    end: f64,
    u: &mut Unstructured<'_>,
) -> Result<f64, arbitrary::Error> {
    let num: u32 = u.arbitrary()?;
    let t = num as f64 / u32::MAX as f64;
    Ok((1.0 - t) * start + t * end)
}

/// Generate a float in some range, but give it a chance to be close to another float.
fn another_float_in_range(
    orig: f64,
    start: f64,
    end: f64,
    u: &mut Unstructured<'_>,
) -> Result<f64, arbitrary::Error> {
    let close: bool = u.arbitrary()?;
    if close {
        let ulps: i32 = u.int_in_range(-32..=32)?;
        let scale = 1.0f64 + ulps as f64 * f64::EPSILON;
        Ok((orig * scale).clamp(start, end))
    } else {
        float_in_range(start, end, u)
    }
}

/// Generate an arbitrary point in the square `[-size, size] x [-size, size]`.
pub fn point(size: f64, u: &mut Unstructured<'_>) -> Result<Point, arbitrary::Error> {
    Ok(Point::new(
        float_in_range(-size, size, u)?,
        float_in_range(-size, size, u)?,
    ))
}

/// Generate a point that has a chance of sharing a coordinate with (or being
/// very close to) one of the points already generated.
fn another_point(
    size: f64,
    previous: &[Point],
    u: &mut Unstructured<'_>,
) -> Result<Point, arbitrary::Error> {
    if previous.is_empty() || !u.arbitrary::<bool>()? {
        return point(size, u);
    }
    let prev = *u.choose(previous)?;
    Ok(Point::new(
        another_float_in_range(prev.x, -size, size, u)?,
        another_float_in_range(prev.y, -size, size, u)?,
    ))
}

/// Generate a collection of closed polylines in sets `0` and `1`, with
/// coordinates in `[-size, size]`.
///
/// The polylines are biased towards degenerate configurations: repeated
/// coordinates, nearly-coincident vertices, and so on.
pub fn segments(size: f64, u: &mut Unstructured<'_>) -> Result<Segments<()>, arbitrary::Error> {
    let mut segs = Segments::default();
    let mut points: Vec<Point> = Vec::new();
    let n_cycles = u.int_in_range(1..=4)?;
    for _ in 0..n_cycles {
        let set = u.int_in_range(0..=1)?;
        let len = u.int_in_range(3..=8)?;
        let mut cycle = Vec::with_capacity(len);
        for _ in 0..len {
            let p = another_point(size, &points, u)?;
            points.push(p);
            cycle.push(p);
        }
        let mut data = SegmentData::new(set, ());
        data.snap = u.ratio(1, 8)?;
        segs.add_cycle(cycle, data);
    }
    Ok(segs)
}

/// Generate a few closed polylines in sets `0` and `1` whose coordinates are
/// all multiples of half a grid cell, together with the grid's precision.
///
/// Segments between such points pass exactly through pixel corners and run
/// along pixel edges all the time.
pub fn half_cell_segments(
    u: &mut Unstructured<'_>,
) -> Result<(Segments<()>, f64), arbitrary::Error> {
    let precision = *u.choose(&[1.0, 2.0, 4.0])?;
    let mut segs = Segments::default();
    let n_cycles = u.int_in_range(1..=3)?;
    for _ in 0..n_cycles {
        let set = u.int_in_range(0..=1)?;
        let len = u.int_in_range(3..=6)?;
        let mut cycle = Vec::with_capacity(len);
        for _ in 0..len {
            let x: i32 = u.int_in_range(-6..=6)?;
            let y: i32 = u.int_in_range(-6..=6)?;
            cycle.push(Point::new(
                x as f64 / (2.0 * precision),
                y as f64 / (2.0 * precision),
            ));
        }
        segs.add_cycle(cycle, SegmentData::new(set, ()));
    }
    Ok((segs, precision))
}

/// Generate a snap-rounding precision: a power of two between `1` and `2^20`.
pub fn precision(u: &mut Unstructured<'_>) -> Result<f64, arbitrary::Error> {
    let exp: i32 = u.int_in_range(0..=20)?;
    Ok(2.0f64.powi(exp))
}
