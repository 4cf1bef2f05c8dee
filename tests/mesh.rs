use gridsweeper::{
    clip, mesh::TriangulateOptions, ClipConfig, Error, Mesh, Point, SegmentData, Segments,
};
use proptest::prelude::*;

fn regular_polygon(n: usize, radius: f64) -> Vec<Point> {
    (0..n)
        .map(|i| {
            let theta = 2.0 * std::f64::consts::PI * i as f64 / n as f64;
            Point::new(radius * theta.cos(), radius * theta.sin())
        })
        .collect()
}

fn area<T>(mesh: &Mesh<T>) -> f64 {
    mesh.faces().map(|f| mesh.face_area(f)).sum()
}

#[test]
fn convex_polygons_triangulate() {
    for n in 3..16 {
        let mut mesh = Mesh::new();
        mesh.add_polygon(regular_polygon(n, 10.0), n);
        let before = area(&mesh);
        mesh.triangulate(false).unwrap();
        mesh.check_invariants().unwrap();

        assert_eq!(mesh.num_faces(), n - 2);
        for f in mesh.faces() {
            assert_eq!(mesh.face_edges(f).len(), 3);
            assert!(mesh.face_area(f) > 0.0);
            assert_eq!(mesh.face_data(f), Some(&n));
        }
        assert!((area(&mesh) - before).abs() < 1e-9);
        // Euler: n boundary edges, plus n - 3 diagonals.
        assert_eq!(mesh.num_edges(), 2 * n - 3);
    }
}

#[test]
fn delaunay_keeps_the_count() {
    for n in [5, 8, 13] {
        let mut mesh = Mesh::new();
        mesh.add_polygon(regular_polygon(n, 1.0), ());
        mesh.triangulate_with(&TriangulateOptions {
            optimize: true,
            max_flip_passes: 10,
        })
        .unwrap();
        mesh.check_invariants().unwrap();
        assert_eq!(mesh.num_faces(), n - 2);
    }
}

#[test]
fn triangulate_a_clipped_union() {
    let mut segs = Segments::default();
    segs.add_cycle(
        [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)],
        SegmentData::new(0, ()),
    );
    segs.add_cycle(
        [(0.5, 0.5), (1.5, 0.5), (1.5, 1.5), (0.5, 1.5)],
        SegmentData::new(1, ()),
    );
    let mut mesh = clip(&segs, &ClipConfig::default()).unwrap();
    mesh.triangulate(true).unwrap();
    mesh.check_invariants().unwrap();
    assert_eq!(mesh.num_faces(), 6);
    assert_eq!(area(&mesh), 1.75);
}

#[test]
fn clones_are_independent() {
    let mut mesh = Mesh::new();
    mesh.add_polygon(regular_polygon(6, 1.0), 'x');
    let original = mesh.clone();

    mesh.triangulate(false).unwrap();
    assert_eq!(mesh.num_faces(), 4);
    assert_eq!(original.num_faces(), 1);
    assert_eq!(original.num_edges(), 6);
    original.check_invariants().unwrap();
}

#[test]
fn insert_points() {
    let mut mesh = Mesh::new();
    mesh.add_polygon(
        [
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(4.0, 4.0),
            Point::new(0.0, 4.0),
        ],
        (),
    );
    mesh.triangulate(false).unwrap();
    let inside = [(1.0, 0.5), (3.5, 1.0), (2.5, 3.0), (0.5, 3.0)];
    for (i, &(x, y)) in inside.iter().enumerate() {
        mesh.add_point(Point::new(x, y)).unwrap();
        mesh.check_invariants().unwrap();
        assert_eq!(mesh.num_faces(), 2 + 2 * (i + 1));
    }
    assert_eq!(area(&mesh), 16.0);
    assert_eq!(
        mesh.add_point(Point::new(5.0, 5.0)),
        Err(Error::PointOutside)
    );
    assert_eq!(
        mesh.add_point(Point::new(0.0, 4.0)),
        Err(Error::PointOnBoundary)
    );
}

#[test]
fn open_chains() {
    let mut mesh: Mesh<()> = Mesh::new();
    let c = mesh
        .add_polyline(
            [Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(1.0, 1.0)],
            (),
        )
        .unwrap();
    assert_eq!(mesh.num_faces(), 0);
    assert_eq!(mesh.chains().count(), 1);
    assert_eq!(mesh.finalize_chain(c), Err(Error::ChainNotClosed));

    // Closing it up turns it into a face.
    mesh.add_segment(Point::new(1.0, 1.0), Point::new(0.0, 0.0), Some(()), None, None);
    mesh.check_invariants().unwrap();
    assert_eq!(mesh.chains().count(), 0);
    assert_eq!(mesh.num_faces(), 1);
    assert_eq!(area(&mesh), 0.5);
}

proptest! {
    // However the edges of a polygon arrive, the chains end up closing into
    // a single face.
    #[test]
    fn chains_close_in_any_order(order in Just((0..9).collect::<Vec<usize>>()).prop_shuffle()) {
        let pts = regular_polygon(9, 3.0);
        let mut mesh = Mesh::new();
        for (k, &i) in order.iter().enumerate() {
            let (a, b) = (pts[i], pts[(i + 1) % 9]);
            mesh.add_segment(a, b, Some(i), None, None);
            prop_assert!(mesh.check_invariants().is_ok());
            if k + 1 < order.len() {
                prop_assert_eq!(mesh.num_faces(), 0);
            }
        }
        prop_assert_eq!(mesh.num_faces(), 1);
        prop_assert_eq!(mesh.chains().count(), 0);
        let f = mesh.faces().next().unwrap();
        prop_assert_eq!(mesh.face_edges(f).len(), 9);
        for e in mesh.face_edges(f) {
            prop_assert_eq!(mesh.lnext(mesh.lprev(e)), e);
            prop_assert_eq!(mesh.sym(mesh.sym(e)), e);
            prop_assert_eq!(mesh.onext(mesh.oprev(e)), e);
        }
    }
}
