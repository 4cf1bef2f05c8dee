//! A half-edge mesh of faces and chains.
//!
//! Every edge of the mesh is stored as a pair of half-edges, pointing in
//! opposite directions. The two halves of an edge live at adjacent indices,
//! so that [`EdgeIdx::sym`] is just a bit flip. Each half-edge knows
//!
//! - `onext`: the next half-edge counter-clockwise around its origin, and
//! - `lnext`: the next half-edge around the region on its left.
//!
//! These are related by `lnext(sym(onext(e))) == e`: walking into a vertex
//! along `sym(onext(e))` and turning as far left as possible leaves along `e`.
//!
//! A half-edge may carry data (`Some(E)`), in which case it's called "inner":
//! there is a region on its left. Runs of inner half-edges that are linked by
//! `lnext` are grouped into *chains*, and a chain that closes up into a cycle
//! becomes a *face*. Faces and chains are maintained incrementally as edges
//! are added, so that an output mesh can be assembled edge-by-edge in
//! whatever order a sweep produces them.

use std::collections::HashMap;

use crate::{
    geom::{angle_cmp, in_ccw_sector, signed_area, Point, Segment},
    Error,
};

mod edit;
mod stitch;
mod triangulate;

pub use triangulate::TriangulateOptions;

impl_typed_vec!(
    /// An index of a half-edge in a [`Mesh`].
    ///
    /// The two halves of an edge have indices `2k` and `2k + 1`.
    EdgeVec,
    EdgeIdx,
    "e"
);

impl_typed_vec!(
    /// An index of a face in a [`Mesh`].
    FaceVec,
    FaceIdx,
    "f"
);

impl_typed_vec!(
    /// An index of an open chain in a [`Mesh`].
    ChainVec,
    ChainIdx,
    "c"
);

impl EdgeIdx {
    /// The other half of this edge.
    #[inline(always)]
    pub fn sym(self) -> EdgeIdx {
        EdgeIdx(self.0 ^ 1)
    }
}

#[derive(Clone, Debug)]
pub(crate) struct HalfEdge<E> {
    origin: Point,
    curve: Option<Segment>,
    onext: EdgeIdx,
    lnext: EdgeIdx,
    face: Option<FaceIdx>,
    chain: Option<ChainIdx>,
    data: Option<E>,
    diagonal: bool,
    live: bool,
}

impl<E> HalfEdge<E> {
    fn isolated(origin: Point, onext: EdgeIdx, lnext: EdgeIdx) -> Self {
        HalfEdge {
            origin,
            curve: None,
            onext,
            lnext,
            face: None,
            chain: None,
            data: None,
            diagonal: false,
            live: true,
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Face<E> {
    start: EdgeIdx,
    data: E,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct Chain {
    head: EdgeIdx,
    tail: EdgeIdx,
    len: usize,
}

// What a half-edge belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Label {
    Free,
    Chain(ChainIdx),
    Face(FaceIdx),
}

/// A half-edge mesh, with data of type `E` on its faces and inner half-edges.
#[derive(Clone, Debug)]
pub struct Mesh<E> {
    edges: EdgeVec<HalfEdge<E>>,
    faces: FaceVec<Option<Face<E>>>,
    chains: ChainVec<Option<Chain>>,
    free_edges: Vec<EdgeIdx>,
    free_faces: Vec<FaceIdx>,
    free_chains: Vec<ChainIdx>,
    // Some half-edge leaving each vertex. Entries can go stale, so they're
    // checked before use.
    vertices: HashMap<Point, EdgeIdx>,
}

impl<E> Default for Mesh<E> {
    fn default() -> Self {
        Mesh {
            edges: EdgeVec::default(),
            faces: FaceVec::default(),
            chains: ChainVec::default(),
            free_edges: Vec::new(),
            free_faces: Vec::new(),
            free_chains: Vec::new(),
            vertices: HashMap::new(),
        }
    }
}

impl<E> Mesh<E> {
    /// Creates an empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// The other half of `e`.
    pub fn sym(&self, e: EdgeIdx) -> EdgeIdx {
        e.sym()
    }

    /// The next half-edge counter-clockwise around the origin of `e`.
    pub fn onext(&self, e: EdgeIdx) -> EdgeIdx {
        self.edges[e].onext
    }

    /// The next half-edge clockwise around the origin of `e`.
    pub fn oprev(&self, e: EdgeIdx) -> EdgeIdx {
        self.edges[e.sym()].lnext
    }

    /// The next half-edge around the region to the left of `e`.
    pub fn lnext(&self, e: EdgeIdx) -> EdgeIdx {
        self.edges[e].lnext
    }

    /// The previous half-edge around the region to the left of `e`.
    pub fn lprev(&self, e: EdgeIdx) -> EdgeIdx {
        self.edges[e].onext.sym()
    }

    /// Where `e` starts.
    pub fn origin(&self, e: EdgeIdx) -> Point {
        self.edges[e].origin
    }

    /// Where `e` ends.
    pub fn dest(&self, e: EdgeIdx) -> Point {
        self.edges[e.sym()].origin
    }

    /// The data of the region to the left of `e`, if it's an inner half-edge.
    pub fn edge_data(&self, e: EdgeIdx) -> Option<&E> {
        self.edges[e].data.as_ref()
    }

    /// The input segment that `e` was made from, oriented like `e`.
    pub fn curve(&self, e: EdgeIdx) -> Option<Segment> {
        self.edges[e].curve
    }

    /// Is there a region to the left of `e`?
    pub fn is_inner(&self, e: EdgeIdx) -> bool {
        self.edges[e].data.is_some()
    }

    /// Was `e` added as a diagonal, by [`Mesh::connect`] or triangulation?
    pub fn is_diagonal(&self, e: EdgeIdx) -> bool {
        self.edges[e].diagonal
    }

    /// The face that `e` belongs to, if any.
    pub fn edge_face(&self, e: EdgeIdx) -> Option<FaceIdx> {
        self.edges[e].face
    }

    /// The open chain that `e` belongs to, if any.
    pub fn edge_chain(&self, e: EdgeIdx) -> Option<ChainIdx> {
        self.edges[e].chain
    }

    /// The number of edges (pairs of half-edges) in the mesh.
    pub fn num_edges(&self) -> usize {
        self.edges.iter().filter(|(_, h)| h.live).count() / 2
    }

    /// Iterates over all the half-edges in the mesh.
    pub fn edges(&self) -> impl Iterator<Item = EdgeIdx> + '_ {
        self.edges.iter().filter(|(_, h)| h.live).map(|(e, _)| e)
    }

    /// Iterates over all the faces in the mesh.
    pub fn faces(&self) -> impl Iterator<Item = FaceIdx> + '_ {
        self.faces
            .iter()
            .filter(|(_, f)| f.is_some())
            .map(|(idx, _)| idx)
    }

    /// The number of faces.
    pub fn num_faces(&self) -> usize {
        self.faces().count()
    }

    /// Iterates over all the open chains in the mesh.
    pub fn chains(&self) -> impl Iterator<Item = ChainIdx> + '_ {
        self.chains
            .iter()
            .filter(|(_, c)| c.is_some())
            .map(|(idx, _)| idx)
    }

    /// The data attached to a face.
    pub fn face_data(&self, f: FaceIdx) -> Option<&E> {
        self.faces.get(f)?.as_ref().map(|face| &face.data)
    }

    /// The data attached to a face, mutably.
    pub fn face_data_mut(&mut self, f: FaceIdx) -> Option<&mut E> {
        self.faces.get_mut(f)?.as_mut().map(|face| &mut face.data)
    }

    /// The first half-edge of a face's boundary.
    pub fn face_start(&self, f: FaceIdx) -> Option<EdgeIdx> {
        self.faces.get(f)?.as_ref().map(|face| face.start)
    }

    /// The boundary of a face, starting from its first half-edge.
    ///
    /// The face is on the left of every half-edge, so an outer boundary runs
    /// counter-clockwise and the boundary of a hole runs clockwise.
    pub fn face_edges(&self, f: FaceIdx) -> Vec<EdgeIdx> {
        match self.face_start(f) {
            Some(start) => self.cycle(start),
            None => Vec::new(),
        }
    }

    /// The vertices of a face, in boundary order.
    pub fn face_points(&self, f: FaceIdx) -> Vec<Point> {
        self.face_edges(f)
            .into_iter()
            .map(|e| self.origin(e))
            .collect()
    }

    /// The signed area of a face.
    ///
    /// This is positive for ordinary faces, and negative for the inside
    /// boundary of a hole.
    pub fn face_area(&self, f: FaceIdx) -> f64 {
        signed_area(&self.face_points(f))
    }

    /// The half-edges of an open chain, from its head to its tail.
    pub fn chain_edges(&self, c: ChainIdx) -> Vec<EdgeIdx> {
        let Some(Some(chain)) = self.chains.get(c) else {
            return Vec::new();
        };
        let mut ret = Vec::with_capacity(chain.len);
        let mut e = chain.head;
        for _ in 0..chain.len {
            ret.push(e);
            e = self.lnext(e);
        }
        ret
    }

    /// The points of an open chain, from the origin of its head to the
    /// destination of its tail.
    pub fn chain_points(&self, c: ChainIdx) -> Vec<Point> {
        let edges = self.chain_edges(c);
        let mut ret: Vec<Point> = edges.iter().map(|e| self.origin(*e)).collect();
        if let Some(last) = edges.last() {
            ret.push(self.dest(*last));
        }
        ret
    }

    /// Some half-edge leaving the vertex at `p`, if there is a vertex there.
    pub fn vertex_edge(&self, p: Point) -> Option<EdgeIdx> {
        match self.vertices.get(&p) {
            Some(&e) if self.edges[e].live && self.edges[e].origin == p => Some(e),
            Some(_) => self
                .edges
                .iter()
                .find(|(_, h)| h.live && h.origin == p)
                .map(|(e, _)| e),
            None => None,
        }
    }

    /// All the half-edges leaving the origin of `e`, counter-clockwise.
    pub fn fan(&self, e: EdgeIdx) -> Vec<EdgeIdx> {
        let mut ret = vec![e];
        let mut x = self.onext(e);
        while x != e && ret.len() <= self.edges.len() {
            ret.push(x);
            x = self.onext(x);
        }
        ret
    }

    // The lnext-cycle starting at `start`.
    fn cycle(&self, start: EdgeIdx) -> Vec<EdgeIdx> {
        let mut ret = vec![start];
        let mut e = self.lnext(start);
        while e != start && ret.len() <= self.edges.len() {
            ret.push(e);
            e = self.lnext(e);
        }
        ret
    }

    fn label(&self, e: EdgeIdx) -> Label {
        let h = &self.edges[e];
        match (h.face, h.chain) {
            (Some(f), _) => Label::Face(f),
            (None, Some(c)) => Label::Chain(c),
            (None, None) => Label::Free,
        }
    }

    fn set_label(&mut self, e: EdgeIdx, label: Label) {
        let h = &mut self.edges[e];
        (h.face, h.chain) = match label {
            Label::Free => (None, None),
            Label::Chain(c) => (None, Some(c)),
            Label::Face(f) => (Some(f), None),
        };
    }

    fn alloc_face(&mut self, start: EdgeIdx, data: E) -> FaceIdx {
        let face = Face { start, data };
        match self.free_faces.pop() {
            Some(f) => {
                self.faces[f] = Some(face);
                f
            }
            None => self.faces.push(Some(face)),
        }
    }

    fn free_face(&mut self, f: FaceIdx) {
        if self.faces[f].take().is_some() {
            self.free_faces.push(f);
        }
    }

    fn alloc_chain(&mut self, chain: Chain) -> ChainIdx {
        match self.free_chains.pop() {
            Some(c) => {
                self.chains[c] = Some(chain);
                c
            }
            None => self.chains.push(Some(chain)),
        }
    }

    fn free_chain(&mut self, c: ChainIdx) {
        if self.chains[c].take().is_some() {
            self.free_chains.push(c);
        }
    }

    // Looks up a vertex, repairing a stale map entry if necessary.
    fn find_vertex(&mut self, p: Point) -> Option<EdgeIdx> {
        let e = self.vertex_edge(p);
        match e {
            Some(e) => {
                self.vertices.insert(p, e);
            }
            None => {
                self.vertices.remove(&p);
            }
        }
        e
    }

    // The half-edge `x` in the fan of `fan` such that a new half-edge
    // pointing towards `target` belongs between `x` and `onext(x)`.
    fn find_connecting_edge(&self, fan: EdgeIdx, target: Point) -> EdgeIdx {
        let o = self.origin(fan);
        let mut x = fan;
        loop {
            let y = self.onext(x);
            if x == y || in_ccw_sector(o, self.dest(x), self.dest(y), target) {
                return x;
            }
            x = y;
            if x == fan {
                break;
            }
        }
        tracing::warn!(origin = ?o, ?target, "new edge overlaps an existing one");
        fan
    }

    /// Creates a new, isolated edge from `a` to `b`.
    ///
    /// Both halves are outer (they carry no data) and both are their own
    /// `onext`. The new edge isn't connected to anything, and in particular it
    /// isn't registered as a vertex; it's up to the caller to [`Mesh::splice`]
    /// it in.
    pub fn make_edge(&mut self, a: Point, b: Point) -> EdgeIdx {
        let e = match self.free_edges.pop() {
            Some(e) => e,
            None => {
                let e = self.edges.push(HalfEdge::isolated(a, EdgeIdx(0), EdgeIdx(0)));
                self.edges.push(HalfEdge::isolated(b, EdgeIdx(0), EdgeIdx(0)));
                e
            }
        };
        let s = e.sym();
        self.edges[e] = HalfEdge::isolated(a, e, s);
        self.edges[s] = HalfEdge::isolated(b, s, e);
        e
    }

    /// Frees an isolated edge, as created by [`Mesh::make_edge`].
    pub fn destroy_edge(&mut self, e: EdgeIdx) -> Result<(), Error> {
        let s = e.sym();
        if !self.edges[e].live {
            return Err(Error::Invariant(format!("{e:?} was already destroyed")));
        }
        if self.onext(e) != e || self.onext(s) != s {
            return Err(Error::Invariant(format!(
                "{e:?} can't be destroyed while it's connected"
            )));
        }
        for h in [e, s] {
            let origin = self.edges[h].origin;
            if self.vertices.get(&origin) == Some(&h) {
                self.vertices.remove(&origin);
            }
            let half = &mut self.edges[h];
            half.live = false;
            half.data = None;
            half.face = None;
            half.chain = None;
        }
        self.free_edges.push(EdgeIdx(e.0 & !1));
        Ok(())
    }

    /// The fundamental operation on the mesh's connectivity.
    ///
    /// If `a` and `b` have different origins, their fans are merged: `b`'s
    /// fan is inserted right after `a`. If they have the same origin, the fan
    /// is split in two. Either way, this exchanges `onext(a)` and `onext(b)`.
    ///
    /// This doesn't update origins, faces or chains.
    pub fn splice(&mut self, a: EdgeIdx, b: EdgeIdx) {
        let a_on = self.onext(a);
        let b_on = self.onext(b);
        self.edges[a_on.sym()].lnext = b;
        self.edges[b_on.sym()].lnext = a;
        self.edges[a].onext = b_on;
        self.edges[b].onext = a_on;
    }

    /// Attaches the start of `e2` to the end of `e1`.
    ///
    /// This is meant for building up a path from new edges: the end of `e1`
    /// and the start of `e2` should both still be isolated.
    pub fn join(&mut self, e1: EdgeIdx, e2: EdgeIdx) {
        debug_assert_eq!(self.onext(e1.sym()), e1.sym());
        debug_assert_eq!(self.onext(e2), e2);
        self.edges[e2].origin = self.dest(e1);
        self.splice(e1.sym(), e2);
    }

    // Panics if the invariants are violated, but only if we're asked to check.
    #[inline]
    pub(crate) fn assert_invariants(&self) {
        #[cfg(feature = "slow-asserts")]
        if let Err(e) = self.check_invariants() {
            panic!("{e}");
        }
    }

    /// Checks the mesh's structural invariants.
    ///
    /// These are:
    ///
    /// - the two halves of every edge are both alive;
    /// - `lnext(sym(onext(e))) == e`, and `lnext(e)` starts where `e` ends;
    /// - every half-edge in a face or chain is inner, and belongs to at most one of them;
    /// - walking a face's boundary from its start visits exactly the half-edges labelled with it;
    /// - walking a chain from its head reaches its tail, and the chain isn't closed;
    /// - the half-edges around each vertex are in counter-clockwise order.
    pub fn check_invariants(&self) -> Result<(), Error> {
        let fail = |msg: String| Err(Error::Invariant(msg));
        let mut face_counts: HashMap<FaceIdx, usize> = HashMap::new();
        let mut chain_counts: HashMap<ChainIdx, usize> = HashMap::new();

        for (e, h) in self.edges.iter() {
            if !h.live {
                continue;
            }
            if !self.edges[e.sym()].live {
                return fail(format!("{e:?} is alive but its sym isn't"));
            }
            if !self.edges[h.onext].live || !self.edges[h.lnext].live {
                return fail(format!("{e:?} links to a dead half-edge"));
            }
            if self.lnext(self.onext(e).sym()) != e {
                return fail(format!("lnext(sym(onext({e:?}))) != {e:?}"));
            }
            if self.origin(h.lnext) != self.dest(e) {
                return fail(format!("lnext({e:?}) doesn't start where {e:?} ends"));
            }
            if self.origin(h.onext) != h.origin {
                return fail(format!("onext({e:?}) has a different origin"));
            }
            if h.face.is_some() && h.chain.is_some() {
                return fail(format!("{e:?} is in both a face and a chain"));
            }
            if h.data.is_none() && (h.face.is_some() || h.chain.is_some()) {
                return fail(format!("outer half-edge {e:?} has a face or chain"));
            }
            if h.data.is_some() && h.face.is_none() && h.chain.is_none() {
                return fail(format!("inner half-edge {e:?} has no face or chain"));
            }
            if let Some(f) = h.face {
                if !matches!(self.faces.get(f), Some(Some(_))) {
                    return fail(format!("{e:?} refers to a dead face {f:?}"));
                }
                *face_counts.entry(f).or_default() += 1;
            }
            if let Some(c) = h.chain {
                if !matches!(self.chains.get(c), Some(Some(_))) {
                    return fail(format!("{e:?} refers to a dead chain {c:?}"));
                }
                *chain_counts.entry(c).or_default() += 1;
            }
        }

        for f in self.faces() {
            let edges = self.face_edges(f);
            if edges.iter().any(|e| self.edges[*e].face != Some(f)) {
                return fail(format!("the boundary of {f:?} leaves the face"));
            }
            if face_counts.get(&f).copied().unwrap_or(0) != edges.len() {
                return fail(format!("{f:?} has half-edges that aren't on its boundary"));
            }
        }

        for c in self.chains() {
            let Some(Some(chain)) = self.chains.get(c) else {
                continue;
            };
            let edges = self.chain_edges(c);
            if edges.iter().any(|e| self.edges[*e].chain != Some(c)) {
                return fail(format!("{c:?} leaves its chain"));
            }
            if edges.last() != Some(&chain.tail) {
                return fail(format!("walking {c:?} from its head doesn't reach its tail"));
            }
            if chain_counts.get(&c).copied().unwrap_or(0) != chain.len {
                return fail(format!("{c:?} has the wrong length"));
            }
            if self.lnext(chain.tail) == chain.head {
                return fail(format!("{c:?} is closed, but it isn't a face"));
            }
        }

        let mut seen = vec![false; self.edges.len()];
        for e in self.edges() {
            if seen[e.0] {
                continue;
            }
            let fan = self.fan(e);
            for x in &fan {
                seen[x.0] = true;
            }
            if fan.len() < 2 {
                continue;
            }
            let o = self.origin(e);
            let mut descents = 0;
            for (i, x) in fan.iter().enumerate() {
                let y = fan[(i + 1) % fan.len()];
                match angle_cmp(o, self.dest(*x), self.dest(y)) {
                    std::cmp::Ordering::Less => {}
                    std::cmp::Ordering::Greater => descents += 1,
                    std::cmp::Ordering::Equal => {
                        return fail(format!("{x:?} and {y:?} overlap"));
                    }
                }
            }
            if descents != 1 {
                return fail(format!("the fan at {o:?} isn't counter-clockwise"));
            }
        }

        Ok(())
    }

    /// Draws the mesh, for debugging.
    ///
    /// Faces are filled, open chains are drawn in red, and the other edges in gray.
    #[cfg(feature = "debug-svg")]
    pub fn dump_svg(&self) -> svg::Document {
        use svg::node::element::{path::Data, Path};

        let points: Vec<Point> = self.edges().map(|e| self.origin(e)).collect();
        if points.is_empty() {
            return svg::Document::new();
        }
        let min_x = points.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
        let max_x = points.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
        let min_y = points.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
        let max_y = points.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);
        let pad = (max_x - min_x).max(max_y - min_y) / 16.0 + 1e-6;
        let stroke_width = pad / 16.0;
        let mut document = svg::Document::new().set(
            "viewBox",
            (
                min_x - pad,
                min_y - pad,
                max_x - min_x + 2.0 * pad,
                max_y - min_y + 2.0 * pad,
            ),
        );

        for f in self.faces() {
            let pts = self.face_points(f);
            let mut data = Data::new().move_to((pts[0].x, pts[0].y));
            for p in &pts[1..] {
                data = data.line_to((p.x, p.y));
            }
            let path = Path::new()
                .set("fill", "blue")
                .set("opacity", 0.2)
                .set("stroke", "none")
                .set("d", data.close());
            document = document.add(path);
        }

        for e in self.edges().filter(|e| e.0 % 2 == 0) {
            let (p, q) = (self.origin(e), self.dest(e));
            let in_chain = self.edge_chain(e).is_some() || self.edge_chain(e.sym()).is_some();
            let data = Data::new().move_to((p.x, p.y)).line_to((q.x, q.y));
            let path = Path::new()
                .set("fill", "none")
                .set("stroke", if in_chain { "red" } else { "gray" })
                .set("stroke-width", stroke_width)
                .set("stroke-linecap", "round")
                .set("d", data);
            document = document.add(path);
        }

        document
    }
}
