use gridsweeper::{GridPoint, Point, Segment, SegmentData, Segments, SnapRounder};
use proptest::prelude::*;

fn segs(lines: &[(Point, Point)]) -> Segments<()> {
    let mut ret = Segments::default();
    for &(a, b) in lines {
        ret.push(Segment::new(a, b), SegmentData::new(0, ()));
    }
    ret
}

#[test]
fn pentagram() {
    let pts: Vec<Point> = (0..5)
        .map(|i| {
            let theta = 4.0 * std::f64::consts::PI * i as f64 / 5.0;
            Point::new(10.0 * theta.cos(), 10.0 * theta.sin())
        })
        .collect();
    let mut input = Segments::default();
    input.add_cycle(pts, SegmentData::new(0, ()));

    let mut snap = SnapRounder::new(16.0);
    snap.process(&input).unwrap();
    assert_eq!(snap.inputs().len(), 5);
    assert_eq!(snap.intersections().len(), 5);
    // Each of the five lines is cut at two crossings.
    assert_eq!(snap.rounded().len(), 15);
    assert!(snap.validate());
}

#[test]
fn pixels_are_reported_in_order() {
    let input = segs(&[
        (Point::new(3.0, 0.0), Point::new(0.0, 0.0)),
        (Point::new(0.5, 0.7), Point::new(2.2, 0.7)),
    ]);
    let mut snap = SnapRounder::new(1.0);
    snap.process(&input).unwrap();
    assert_eq!(snap.pins(), vec![GridPoint::new(0, 0), GridPoint::new(3, 0)]);
    assert_eq!(snap.magnets(), vec![GridPoint::new(1, 1), GridPoint::new(2, 1)]);
    assert!(snap.validate());
}

#[test]
fn results_are_reproducible() {
    let input = segs(&[
        (Point::new(0.0, 0.0), Point::new(10.0, 3.3)),
        (Point::new(0.3, 3.0), Point::new(9.1, 0.2)),
        (Point::new(5.05, -1.0), Point::new(5.05, 4.0)),
        (Point::new(1.0, 1.0), Point::new(8.0, 1.0)),
    ]);
    let mut a = SnapRounder::new(2.0);
    let mut b = SnapRounder::new(2.0);
    a.process(&input).unwrap();
    b.process(&input).unwrap();
    assert_eq!(a.rounded(), b.rounded());
    assert_eq!(a.magnets(), b.magnets());
    a.process(&input).unwrap();
    assert_eq!(a.rounded(), b.rounded());
}

#[test]
fn segments_through_pixel_corners() {
    let input = segs(&[
        (Point::new(0.0, 0.0), Point::new(4.0, 4.0)),
        (Point::new(0.0, 2.0), Point::new(2.0, 1.0)),
        (Point::new(1.0, 3.0), Point::new(3.0, 0.0)),
        (Point::new(2.0, 2.0), Point::new(1.0, 2.0)),
        (Point::new(1.0, 2.0), Point::new(4.0, 1.0)),
    ]);
    let mut snap = SnapRounder::new(2.0);
    snap.process(&input).unwrap();
    assert!(snap.validate());

    // The diagonal only bends at hot pixels that are on it.
    for (idx, seg) in snap.rounded_segments() {
        if idx == input.indices().next().unwrap() {
            assert_eq!(seg.start.x, seg.start.y);
            assert_eq!(seg.end.x, seg.end.y);
        }
    }
}

fn arb_lines() -> impl Strategy<Value = Vec<(Point, Point)>> {
    let coord = -50.0f64..50.0;
    let point = (coord.clone(), coord).prop_map(|(x, y)| Point::new(x, y));
    prop::collection::vec((point.clone(), point), 1..16)
}

proptest! {
    #[test]
    fn sound_and_close(lines in arb_lines(), exp in 0i32..8) {
        let precision = 2.0f64.powi(exp);
        let input = segs(&lines);
        let mut snap = SnapRounder::new(precision);
        snap.process(&input).unwrap();
        prop_assert!(snap.validate());

        // Every output vertex is within half a cell of an input endpoint or
        // of an intersection.
        let half = 0.5 / precision;
        let mut targets: Vec<Point> = lines.iter().flat_map(|(a, b)| [*a, *b]).collect();
        targets.extend(snap.intersections().iter().copied());
        for (_, seg) in snap.rounded_segments() {
            for q in [seg.start, seg.end] {
                prop_assert!(targets
                    .iter()
                    .any(|t| (t.x - q.x).abs() <= half && (t.y - q.y).abs() <= half));
            }
        }
    }

    #[test]
    fn integer_inputs_are_sound(
        lines in prop::collection::vec(((-4i32..=4, -4i32..=4), (-4i32..=4, -4i32..=4)), 1..12),
        precision in prop::sample::select(vec![1.0, 2.0, 3.0]),
    ) {
        let lines: Vec<(Point, Point)> = lines
            .into_iter()
            .map(|((x0, y0), (x1, y1))| {
                (Point::new(x0 as f64, y0 as f64), Point::new(x1 as f64, y1 as f64))
            })
            .collect();
        let mut snap = SnapRounder::new(precision);
        snap.process(&segs(&lines)).unwrap();
        prop_assert!(snap.validate());
    }
}
