//! Building up a mesh edge by edge, and keeping track of chains and faces.
//!
//! Whenever edges are added, some `lnext` links change. Every run of inner
//! half-edges that isn't yet part of a chain gets "stitched": it's attached to
//! the chains (if any) that end just before it and start just after it, and a
//! chain that closes up becomes a face.

use arrayvec::ArrayVec;

use super::{Chain, ChainIdx, EdgeIdx, FaceIdx, Label, Mesh};
use crate::{
    geom::{signed_area, Point, Segment},
    Error,
};

impl<E: Clone> Mesh<E> {
    /// Adds an edge from `a` to `b`.
    ///
    /// `left` is the data of the region on the left of the new edge (i.e.
    /// the data of the half-edge from `a` to `b`), and `right` is the data of
    /// the region on its right. The edge is inserted in angular order into the
    /// fans at both of its endpoints, which are created if necessary.
    ///
    /// The new edge must not cross any existing edge. Returns the half-edge
    /// from `a` to `b`, or `None` if `a == b`.
    pub fn add_segment(
        &mut self,
        a: Point,
        b: Point,
        left: Option<E>,
        right: Option<E>,
        curve: Option<Segment>,
    ) -> Option<EdgeIdx> {
        if a == b {
            tracing::warn!(?a, "ignoring a zero-length edge");
            return None;
        }
        let e = self.make_edge(a, b);
        let s = e.sym();
        self.edges[e].data = left;
        self.edges[s].data = right;
        self.edges[e].curve = curve;
        self.edges[s].curve = curve.map(|c| c.reversed());

        let mut broken = ArrayVec::<(EdgeIdx, EdgeIdx), 2>::new();
        broken.extend(self.insert_into_fan(e));
        broken.extend(self.insert_into_fan(s));
        self.relink(&broken, &[e, s]);

        self.assert_invariants();
        Some(e)
    }

    // Splices a new half-edge into the fan at its origin. If that breaks an
    // existing link `p -> x`, returns it.
    fn insert_into_fan(&mut self, e: EdgeIdx) -> Option<(EdgeIdx, EdgeIdx)> {
        let o = self.origin(e);
        match self.find_vertex(o) {
            None => {
                self.vertices.insert(o, e);
                None
            }
            Some(fan) => {
                let x = self.find_connecting_edge(fan, self.dest(e));
                let p = self.onext(x).sym();
                self.splice(x, e);
                Some((p, x))
            }
        }
    }

    // Repairs the chains and faces after some links changed.
    //
    // `broken` are the links `p -> x` that no longer exist, and `new` are the
    // newly added half-edges. If `p` was the tail of a chain, that's fine:
    // the chain just continues somewhere else now. But if `p` was in the
    // middle of a chain or a face (which happens at pinch points), the whole
    // chain or face is dissolved and rebuilt.
    pub(crate) fn relink(&mut self, broken: &[(EdgeIdx, EdgeIdx)], new: &[EdgeIdx]) {
        let mut dirty_faces: Vec<FaceIdx> = Vec::new();
        let mut dirty_chains: Vec<ChainIdx> = Vec::new();
        for &(p, _) in broken {
            if !self.is_inner(p) {
                continue;
            }
            match self.label(p) {
                Label::Face(f) => dirty_faces.push(f),
                Label::Chain(c) if self.chains[c].is_some_and(|ch| ch.tail != p) => {
                    dirty_chains.push(c)
                }
                _ => {}
            }
        }

        let mut seeds: Vec<EdgeIdx> = new.to_vec();
        seeds.extend(self.dissolve(&dirty_faces, &dirty_chains));
        for seed in seeds {
            if self.edges[seed].live && self.is_inner(seed) && self.label(seed) == Label::Free {
                self.stitch(seed);
            }
        }
    }

    // Unlabels every half-edge of the given faces and chains, and returns them.
    pub(crate) fn dissolve(&mut self, faces: &[FaceIdx], chains: &[ChainIdx]) -> Vec<EdgeIdx> {
        if faces.is_empty() && chains.is_empty() {
            return Vec::new();
        }
        tracing::trace!(?faces, ?chains, "dissolving");
        let mut freed = Vec::new();
        for (e, h) in self.edges.iter_mut() {
            if !h.live {
                continue;
            }
            let hit = h.face.is_some_and(|f| faces.contains(&f))
                || h.chain.is_some_and(|c| chains.contains(&c));
            if hit {
                h.face = None;
                h.chain = None;
                freed.push(e);
            }
        }
        for &f in faces {
            self.free_face(f);
        }
        for &c in chains {
            self.free_chain(c);
        }
        freed
    }

    // Finds the maximal run of unlabelled inner half-edges containing `seed`,
    // and attaches it to its neighboring chains.
    pub(super) fn stitch(&mut self, seed: EdgeIdx) {
        let mut start = seed;
        let mut before = None;
        let mut closed = false;
        loop {
            let p = self.lprev(start);
            if !self.is_inner(p) {
                break;
            }
            match self.label(p) {
                Label::Free if p == seed => {
                    closed = true;
                    start = seed;
                    break;
                }
                Label::Free => start = p,
                Label::Chain(c) if self.chains[c].is_some_and(|ch| ch.tail == p) => {
                    before = Some(c);
                    break;
                }
                label => {
                    tracing::error!(edge = ?p, ?label, "inner half-edge links into the middle of a run");
                    break;
                }
            }
        }

        let mut run = vec![start];
        let mut after = None;
        let mut cur = start;
        loop {
            let n = self.lnext(cur);
            if n == start || !self.is_inner(n) {
                break;
            }
            match self.label(n) {
                Label::Free => {
                    run.push(n);
                    cur = n;
                }
                Label::Chain(c) if self.chains[c].is_some_and(|ch| ch.head == n) => {
                    after = Some(c);
                    break;
                }
                label => {
                    tracing::error!(edge = ?n, ?label, "run links into the middle of a chain");
                    break;
                }
            }
        }

        if closed {
            let c = self.new_chain(&run);
            self.close_chain(c);
            return;
        }

        match (before, after) {
            (Some(b), Some(a)) if a == b => {
                self.extend_tail(b, &run);
                self.close_chain(b);
            }
            (Some(b), Some(a)) => {
                let (b_len, a_len) = (self.chain_len(b), self.chain_len(a));
                if b_len >= a_len {
                    self.extend_tail(b, &run);
                    self.absorb_after(b, a);
                } else {
                    self.extend_head(a, &run);
                    self.absorb_before(a, b);
                }
            }
            (Some(b), None) => self.extend_tail(b, &run),
            (None, Some(a)) => self.extend_head(a, &run),
            (None, None) => {
                self.new_chain(&run);
            }
        }
    }

    fn chain_len(&self, c: ChainIdx) -> usize {
        self.chains[c].map_or(0, |ch| ch.len)
    }

    fn new_chain(&mut self, run: &[EdgeIdx]) -> ChainIdx {
        let c = self.alloc_chain(Chain {
            head: run[0],
            tail: run[run.len() - 1],
            len: run.len(),
        });
        for &e in run {
            self.set_label(e, Label::Chain(c));
        }
        c
    }

    fn extend_tail(&mut self, c: ChainIdx, run: &[EdgeIdx]) {
        for &e in run {
            self.set_label(e, Label::Chain(c));
        }
        if let (Some(ch), Some(&last)) = (self.chains[c].as_mut(), run.last()) {
            ch.tail = last;
            ch.len += run.len();
        }
    }

    fn extend_head(&mut self, c: ChainIdx, run: &[EdgeIdx]) {
        for &e in run {
            self.set_label(e, Label::Chain(c));
        }
        if let (Some(ch), Some(&first)) = (self.chains[c].as_mut(), run.first()) {
            ch.head = first;
            ch.len += run.len();
        }
    }

    // `other` comes right after the tail of `c`; move it into `c`.
    fn absorb_after(&mut self, c: ChainIdx, other: ChainIdx) {
        let edges = self.chain_edges(other);
        let Some(o) = self.chains[other] else { return };
        for &e in &edges {
            self.set_label(e, Label::Chain(c));
        }
        if let Some(ch) = self.chains[c].as_mut() {
            ch.tail = o.tail;
            ch.len += o.len;
        }
        self.free_chain(other);
    }

    // `other` comes right before the head of `c`; move it into `c`.
    fn absorb_before(&mut self, c: ChainIdx, other: ChainIdx) {
        let edges = self.chain_edges(other);
        let Some(o) = self.chains[other] else { return };
        for &e in &edges {
            self.set_label(e, Label::Chain(c));
        }
        if let Some(ch) = self.chains[c].as_mut() {
            ch.head = o.head;
            ch.len += o.len;
        }
        self.free_chain(other);
    }

    fn close_chain(&mut self, c: ChainIdx) {
        if let Err(e) = self.finalize_chain(c) {
            tracing::error!(chain = ?c, error = %e, "failed to close a chain");
        }
    }

    /// Turns a closed chain into a face.
    ///
    /// The new face starts at the chain's head, and takes its data from there.
    /// Chains are closed automatically as they're built, so this is mostly
    /// useful for meshes that were put together with the lower-level
    /// primitives.
    pub fn finalize_chain(&mut self, c: ChainIdx) -> Result<FaceIdx, Error> {
        let Some(Some(chain)) = self.chains.get(c).copied() else {
            return Err(Error::Invariant(format!("{c:?} doesn't exist")));
        };
        if self.lnext(chain.tail) != chain.head {
            return Err(Error::ChainNotClosed);
        }
        let Some(data) = self.edges[chain.head].data.clone() else {
            return Err(Error::Invariant(format!("{c:?} starts with an outer half-edge")));
        };
        let edges = self.chain_edges(c);
        let f = self.alloc_face(chain.head, data);
        for e in edges {
            self.set_label(e, Label::Face(f));
        }
        self.free_chain(c);
        tracing::trace!(chain = ?c, face = ?f, len = chain.len, "closed a face");
        Ok(f)
    }

    // Points without consecutive duplicates, and without a repeated endpoint
    // if `closed`.
    fn clean_points(points: impl IntoIterator<Item = Point>, closed: bool) -> Vec<Point> {
        let mut pts: Vec<Point> = points.into_iter().collect();
        pts.dedup();
        if closed && pts.len() > 1 && pts.first() == pts.last() {
            pts.pop();
        }
        pts
    }

    // Makes a path of new edges through `pts`, all isolated from the rest of
    // the mesh. The left sides get `data`.
    fn isolated_path(&mut self, pts: &[Point], data: &E, closed: bool) -> Vec<EdgeIdx> {
        let n = pts.len();
        let count = if closed { n } else { n - 1 };
        let edges: Vec<EdgeIdx> = (0..count)
            .map(|i| {
                let (a, b) = (pts[i], pts[(i + 1) % n]);
                let e = self.make_edge(a, b);
                self.edges[e].data = Some(data.clone());
                self.edges[e].curve = Some(Segment::new(a, b));
                self.edges[e.sym()].curve = Some(Segment::new(b, a));
                e
            })
            .collect();
        for w in edges.windows(2) {
            self.join(w[0], w[1]);
        }
        if closed {
            self.join(edges[count - 1], edges[0]);
        }
        for &e in &edges {
            self.vertices.insert(self.origin(e), e);
        }
        if !closed {
            let last = edges[count - 1].sym();
            self.vertices.insert(self.origin(last), last);
        }
        edges
    }

    fn is_fresh(&self, pts: &[Point]) -> bool {
        let mut sorted = pts.to_vec();
        sorted.sort();
        sorted.dedup();
        sorted.len() == pts.len() && pts.iter().all(|p| self.vertex_edge(*p).is_none())
    }

    /// Adds a closed polygon, with `data` on its inside.
    ///
    /// The orientation of `points` doesn't matter. Returns the new face, if
    /// one was created.
    pub fn add_polygon(&mut self, points: impl IntoIterator<Item = Point>, data: E) -> Option<FaceIdx> {
        let mut pts = Self::clean_points(points, true);
        if pts.len() < 3 {
            tracing::warn!(len = pts.len(), "ignoring a degenerate polygon");
            return None;
        }
        if signed_area(&pts) < 0.0 {
            pts.reverse();
        }

        let first = if self.is_fresh(&pts) {
            let edges = self.isolated_path(&pts, &data, true);
            let c = self.new_chain(&edges);
            self.close_chain(c);
            edges[0]
        } else {
            let mut first = None;
            for i in 0..pts.len() {
                let (a, b) = (pts[i], pts[(i + 1) % pts.len()]);
                let e = self.add_segment(a, b, Some(data.clone()), None, Some(Segment::new(a, b)));
                first = first.or(e);
            }
            first?
        };
        self.assert_invariants();
        self.edge_face(first)
    }

    /// Adds an open polyline, with `data` on its left.
    ///
    /// Returns the chain containing the new edges, if they didn't end up
    /// closing a face.
    pub fn add_polyline(&mut self, points: impl IntoIterator<Item = Point>, data: E) -> Option<ChainIdx> {
        let pts = Self::clean_points(points, false);
        if pts.len() < 2 {
            tracing::warn!(len = pts.len(), "ignoring a degenerate polyline");
            return None;
        }

        let first = if self.is_fresh(&pts) {
            let edges = self.isolated_path(&pts, &data, false);
            self.new_chain(&edges);
            edges[0]
        } else {
            let mut first = None;
            for w in pts.windows(2) {
                let e = self.add_segment(w[0], w[1], Some(data.clone()), None, Some(Segment::new(w[0], w[1])));
                first = first.or(e);
            }
            first?
        };
        self.assert_invariants();
        self.edge_chain(first)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    fn square(mesh: &mut Mesh<u32>, data: u32, order: &[usize]) {
        let pts = [p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0), p(0.0, 1.0)];
        for &i in order {
            let (a, b) = (pts[i], pts[(i + 1) % 4]);
            mesh.add_segment(a, b, Some(data), None, None);
            mesh.check_invariants().unwrap();
        }
    }

    #[test]
    fn chains_close_in_any_order() {
        for order in [[0, 1, 2, 3], [0, 2, 1, 3], [3, 1, 0, 2], [2, 0, 3, 1]] {
            let mut mesh = Mesh::new();
            square(&mut mesh, 7, &order);
            assert_eq!(mesh.num_faces(), 1);
            assert_eq!(mesh.chains().count(), 0);
            let f = mesh.faces().next().unwrap();
            assert_eq!(mesh.face_data(f), Some(&7));
            assert_eq!(mesh.face_area(f), 1.0);
            assert_eq!(mesh.face_edges(f).len(), 4);
        }
    }

    #[test]
    fn partial_chains() {
        let mut mesh = Mesh::new();
        square(&mut mesh, 1, &[0, 2]);
        assert_eq!(mesh.chains().count(), 2);
        square(&mut mesh, 1, &[1]);
        // The longer chain survives the merge.
        assert_eq!(mesh.chains().count(), 1);
        let c = mesh.chains().next().unwrap();
        assert_eq!(
            mesh.chain_points(c),
            vec![p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0), p(0.0, 1.0)]
        );
        assert_eq!(mesh.finalize_chain(c), Err(Error::ChainNotClosed));
    }

    #[test]
    fn two_faces_sharing_an_edge() {
        let mut mesh = Mesh::new();
        // Two unit squares, side by side. The shared edge is added once, with
        // data on both sides.
        let pts = [
            p(0.0, 0.0),
            p(1.0, 0.0),
            p(2.0, 0.0),
            p(2.0, 1.0),
            p(1.0, 1.0),
            p(0.0, 1.0),
        ];
        let left = [(0, 1), (4, 5), (5, 0)];
        let right = [(1, 2), (2, 3), (3, 4)];
        for (i, j) in left {
            mesh.add_segment(pts[i], pts[j], Some(1), None, None);
        }
        mesh.add_segment(pts[1], pts[4], Some(1), Some(2), None);
        for (i, j) in right {
            mesh.add_segment(pts[i], pts[j], Some(2), None, None);
        }
        mesh.check_invariants().unwrap();
        assert_eq!(mesh.num_faces(), 2);
        let mut areas: Vec<_> = mesh
            .faces()
            .map(|f| (*mesh.face_data(f).unwrap(), mesh.face_area(f)))
            .collect();
        areas.sort_by(|a, b| a.0.cmp(&b.0));
        assert_eq!(areas, vec![(1, 1.0), (2, 1.0)]);
    }

    #[test]
    fn pinched_faces() {
        // Two triangles touching at a vertex: the second one's edges go
        // through the first one's fan.
        let mut mesh = Mesh::new();
        let o = p(0.0, 0.0);
        mesh.add_polygon([o, p(1.0, 0.0), p(1.0, 1.0)], 1);
        mesh.add_polygon([o, p(-1.0, 0.0), p(-1.0, -1.0)], 2);
        mesh.check_invariants().unwrap();
        assert_eq!(mesh.num_faces(), 2);
        for f in mesh.faces() {
            assert_eq!(mesh.face_edges(f).len(), 3);
            assert_eq!(mesh.face_area(f), 0.5);
        }
        assert_eq!(mesh.fan(mesh.vertex_edge(o).unwrap()).len(), 4);
    }

    #[test]
    fn polygons_and_polylines() {
        let mut mesh = Mesh::new();
        // Clockwise input gets flipped.
        let f = mesh
            .add_polygon([p(0.0, 0.0), p(0.0, 2.0), p(2.0, 2.0), p(2.0, 0.0), p(0.0, 0.0)], "sq")
            .unwrap();
        assert_eq!(mesh.face_area(f), 4.0);
        assert!(mesh.add_polygon([p(5.0, 5.0), p(6.0, 6.0)], "line").is_none());

        let c = mesh
            .add_polyline([p(3.0, 0.0), p(4.0, 0.0), p(4.0, 0.0), p(4.0, 1.0)], "path")
            .unwrap();
        assert_eq!(mesh.chain_edges(c).len(), 2);
        mesh.check_invariants().unwrap();
        assert_eq!(mesh.num_edges(), 6);
    }
}
