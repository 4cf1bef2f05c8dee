//! Boolean operations between two sets of segments.

use crate::{
    geom::Segment,
    mesh::Mesh,
    segments::{SegIdx, Segments},
    snap::{SnapRounder, DEFAULT_PRECISION},
    sweep::{build_edges, sweep, SweepEdge},
    BinaryOp, Error, WindingRule,
};

/// How to compute a boolean operation.
#[derive(Clone, Copy, Debug)]
pub struct ClipConfig {
    /// The snap-rounding grid has this many cells per unit.
    pub precision: f64,
    /// The winding rules for set `0` and set `1`.
    pub rules: [WindingRule; 2],
    /// The operation.
    pub op: BinaryOp,
}

impl Default for ClipConfig {
    fn default() -> Self {
        ClipConfig {
            precision: DEFAULT_PRECISION,
            rules: [WindingRule::NonZero; 2],
            op: BinaryOp::Union,
        }
    }
}

impl ClipConfig {
    fn inside(&self, winding: &[i32]) -> bool {
        self.op.combine(
            self.rules[0].is_inside(winding[0]),
            self.rules[1].is_inside(winding[1]),
        )
    }
}

// The input segment whose tag an output edge carries: preferably one from a
// set whose membership actually changes across the edge.
fn tag_source<T>(
    segments: &Segments<T>,
    edge: &SweepEdge,
    changed: impl Fn(usize) -> bool,
) -> Option<SegIdx> {
    edge.sources
        .iter()
        .copied()
        .find(|s| changed(segments.data(*s).set))
        .or_else(|| edge.sources.first().copied())
}

/// Computes a boolean operation between the segments of set `0` and set `1`.
///
/// The segments are snap-rounded and swept. Every edge where the result of the
/// operation differs between its two sides is added to the output mesh,
/// oriented so that the result is on its left. The inner half-edges (and
/// hence the faces) carry the tag of one of the input segments that the edge
/// came from.
///
/// Coordinates in the output are multiples of `1 / config.precision`.
pub fn clip<T: Clone>(segments: &Segments<T>, config: &ClipConfig) -> Result<Mesh<T>, Error> {
    if let Some(set) = segments
        .indices()
        .map(|idx| segments.data(idx).set)
        .find(|set| *set > 1)
    {
        return Err(Error::UnknownSet { set });
    }

    let mut rounder = SnapRounder::new(config.precision);
    rounder.process(segments)?;
    let edges = build_edges(rounder.rounded(), 2, |idx| segments.data(idx).set);

    let mut mesh = Mesh::new();
    let mut kept = 0;
    sweep(&edges, 2, |_, edge, below, above| {
        let inside_below = config.inside(below);
        let inside_above = config.inside(above);
        if inside_below == inside_above {
            return;
        }
        let changed = |set: usize| {
            config.rules[set].is_inside(below[set]) != config.rules[set].is_inside(above[set])
        };
        let Some(source) = tag_source(segments, edge, changed) else {
            return;
        };
        let tag = segments.data(source).tag.clone();
        let (l, r) = (rounder.to_point(edge.left), rounder.to_point(edge.right));
        let curve = Some(Segment::new(l, r));
        // The region above an edge is on the left of its left-to-right half.
        if inside_above {
            mesh.add_segment(l, r, Some(tag), None, curve);
        } else {
            mesh.add_segment(l, r, None, Some(tag), curve);
        }
        kept += 1;
    });

    tracing::debug!(
        edges = edges.len(),
        kept,
        faces = mesh.num_faces(),
        open_chains = mesh.chains().count(),
        "clipped"
    );
    Ok(mesh)
}
