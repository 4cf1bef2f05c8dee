//! Triangulation: monotone decomposition, monotone triangulation, Delaunay
//! refinement, and point insertion.

use std::cmp::Ordering;

use super::{EdgeIdx, FaceIdx, Label, Mesh};
use crate::{
    geom::{incircle, orient, Point, Segment},
    Error,
};

/// Options for [`Mesh::triangulate_with`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TriangulateOptions {
    /// Flip diagonals until the triangulation is (constrained) Delaunay.
    pub optimize: bool,
    /// The maximum number of passes over the diagonals when optimizing.
    ///
    /// Every pass that flips something is followed by another one, so this
    /// only matters for pathological inputs.
    pub max_flip_passes: usize,
}

impl Default for TriangulateOptions {
    fn default() -> Self {
        TriangulateOptions {
            optimize: false,
            max_flip_passes: 100,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CornerKind {
    Start,
    Split,
    End,
    Merge,
    // On a lower boundary, with the interior above.
    Lower,
    // On an upper boundary, with the interior below.
    Upper,
}

#[derive(Clone, Copy, Debug)]
struct Corner {
    // The boundary half-edge leaving the corner.
    edge: EdgeIdx,
    // The boundary half-edge arriving at the corner.
    prev: EdgeIdx,
    point: Point,
    kind: CornerKind,
}

fn classify(prev: Point, v: Point, next: Point) -> CornerKind {
    let convex = orient(prev, v, next) != Ordering::Less;
    match (prev > v, next > v) {
        (true, true) if convex => CornerKind::Start,
        (true, true) => CornerKind::Split,
        (false, false) if convex => CornerKind::End,
        (false, false) => CornerKind::Merge,
        (false, true) => CornerKind::Lower,
        (true, false) => CornerKind::Upper,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Side {
    Lower,
    Upper,
    Both,
}

// The lower boundaries that the decomposition sweep is currently crossing,
// from bottom to top, each with the index of its helper corner.
#[derive(Default)]
struct SweepStatus {
    entries: Vec<(EdgeIdx, usize)>,
}

impl<E: Clone> Mesh<E> {
    /// Triangulates every face of the mesh, optionally refining the result
    /// towards a Delaunay triangulation.
    pub fn triangulate(&mut self, optimize: bool) -> Result<(), Error> {
        self.triangulate_with(&TriangulateOptions {
            optimize,
            ..TriangulateOptions::default()
        })
    }

    /// Triangulates every face of the mesh.
    ///
    /// Faces are first cut into x-monotone pieces, and then each piece is
    /// triangulated. All the new edges are diagonals, carrying the data of
    /// the face they were added to. Holes (i.e. faces bounded by clockwise
    /// cycles) are joined to the faces around them along the way.
    pub fn triangulate_with(&mut self, options: &TriangulateOptions) -> Result<(), Error> {
        self.make_monotone()?;
        let faces: Vec<FaceIdx> = self.faces().collect();
        for f in faces {
            self.triangulate_monotone(f)?;
        }
        if let Some(f) = self.faces().find(|f| self.face_edges(*f).len() != 3) {
            tracing::warn!(face = ?f, len = self.face_edges(f).len(), "face isn't a triangle");
            return Err(Error::NotTriangulable);
        }
        if options.optimize {
            self.optimize(options.max_flip_passes);
        }
        tracing::debug!(faces = self.num_faces(), edges = self.num_edges(), "triangulated");
        Ok(())
    }

    fn corners(&self) -> Vec<Corner> {
        let mut corners = Vec::new();
        for f in self.faces() {
            for e in self.face_edges(f) {
                let prev = self.lprev(e);
                let v = self.origin(e);
                corners.push(Corner {
                    edge: e,
                    prev,
                    point: v,
                    kind: classify(self.origin(prev), v, self.dest(e)),
                });
            }
        }
        corners.sort_by(|a, b| a.point.cmp(&b.point).then(a.edge.cmp(&b.edge)));
        corners
    }

    // Is the (rightward) boundary `g` below the rightward boundary `h`?
    // `g` must have started no later than `h`.
    fn boundary_below(&self, g: EdgeIdx, h: EdgeIdx) -> bool {
        let (g0, g1) = (self.origin(g), self.dest(g));
        let (h0, h1) = (self.origin(h), self.dest(h));
        if g0 == h0 {
            return orient(g0, g1, h1) == Ordering::Greater;
        }
        match orient(g0, g1, h0) {
            Ordering::Greater => true,
            Ordering::Less => false,
            Ordering::Equal => orient(g0, g1, h1) == Ordering::Greater,
        }
    }

    fn status_insert(&self, status: &mut SweepStatus, e: EdgeIdx, helper: usize) {
        let pos = status
            .entries
            .partition_point(|(g, _)| self.boundary_below(*g, e));
        status.entries.insert(pos, (e, helper));
    }

    // The position of the boundary strictly below `p`.
    fn status_below(&self, status: &SweepStatus, p: Point) -> Option<usize> {
        status
            .entries
            .partition_point(|(g, _)| orient(self.origin(*g), self.dest(*g), p) == Ordering::Greater)
            .checked_sub(1)
    }

    // Connects corner `v` to the helper of `e` if that helper is a merge
    // corner, and removes `e` from the status.
    fn finish_boundary(
        &mut self,
        status: &mut SweepStatus,
        corners: &[Corner],
        v: usize,
        e: EdgeIdx,
    ) -> Result<(), Error> {
        let Some(pos) = status.entries.iter().position(|(g, _)| *g == e) else {
            tracing::error!(edge = ?e, "boundary is missing from the decomposition sweep");
            return Ok(());
        };
        let (_, helper) = status.entries.remove(pos);
        if corners[helper].kind == CornerKind::Merge {
            self.connect(corners[v].edge, corners[helper].edge)?;
        }
        Ok(())
    }

    // Connects corner `v` to the helper of the boundary below it (if that's
    // needed) and makes `v` the new helper.
    fn update_below(
        &mut self,
        status: &mut SweepStatus,
        corners: &[Corner],
        v: usize,
        always_connect: bool,
    ) -> Result<(), Error> {
        let Some(pos) = self.status_below(status, corners[v].point) else {
            tracing::error!(point = ?corners[v].point, "nothing below a corner that needs it");
            return Ok(());
        };
        let helper = status.entries[pos].1;
        if always_connect || corners[helper].kind == CornerKind::Merge {
            self.connect(corners[v].edge, corners[helper].edge)?;
        }
        status.entries[pos].1 = v;
        Ok(())
    }

    // Adds diagonals until every face is x-monotone.
    fn make_monotone(&mut self) -> Result<(), Error> {
        let corners = self.corners();
        let mut status = SweepStatus::default();
        for (v, corner) in corners.iter().enumerate() {
            tracing::trace!(?corner, "decomposition corner");
            match corner.kind {
                CornerKind::Start => self.status_insert(&mut status, corner.edge, v),
                CornerKind::End => self.finish_boundary(&mut status, &corners, v, corner.prev)?,
                CornerKind::Split => {
                    self.update_below(&mut status, &corners, v, true)?;
                    self.status_insert(&mut status, corner.edge, v);
                }
                CornerKind::Merge => {
                    self.finish_boundary(&mut status, &corners, v, corner.prev)?;
                    self.update_below(&mut status, &corners, v, false)?;
                }
                CornerKind::Lower => {
                    self.finish_boundary(&mut status, &corners, v, corner.prev)?;
                    self.status_insert(&mut status, corner.edge, v);
                }
                CornerKind::Upper => self.update_below(&mut status, &corners, v, false)?,
            }
        }
        Ok(())
    }

    // Triangulates an x-monotone face.
    fn triangulate_monotone(&mut self, f: FaceIdx) -> Result<(), Error> {
        let cycle = self.face_edges(f);
        let n = cycle.len();
        if n <= 3 {
            return Ok(());
        }
        let pts: Vec<Point> = cycle.iter().map(|e| self.origin(*e)).collect();
        let (Some(i_min), Some(i_max)) = (
            (0..n).min_by_key(|&i| pts[i]),
            (0..n).max_by_key(|&i| pts[i]),
        ) else {
            return Ok(());
        };

        // Going forwards from the leftmost vertex follows the lower chain.
        let mut side = vec![Side::Both; n];
        let mut i = (i_min + 1) % n;
        while i != i_max {
            side[i] = Side::Lower;
            i = (i + 1) % n;
        }
        i = (i_max + 1) % n;
        while i != i_min {
            side[i] = Side::Upper;
            i = (i + 1) % n;
        }

        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by_key(|&i| pts[i]);

        let mut stack = vec![order[0], order[1]];
        for &u in &order[2..n - 1] {
            let top = stack[stack.len() - 1];
            if side[u] != side[top] {
                while stack.len() > 1 {
                    if let Some(w) = stack.pop() {
                        self.connect(cycle[u], cycle[w])?;
                    }
                }
                stack.clear();
                stack.push(top);
                stack.push(u);
            } else {
                let mut last = top;
                stack.pop();
                while let Some(&w) = stack.last() {
                    let turn = orient(pts[w], pts[last], pts[u]);
                    let visible = match side[u] {
                        Side::Lower => turn == Ordering::Greater,
                        _ => turn == Ordering::Less,
                    };
                    if !visible {
                        break;
                    }
                    self.connect(cycle[u], cycle[w])?;
                    last = w;
                    stack.pop();
                }
                stack.push(last);
                stack.push(u);
            }
        }

        let u = order[n - 1];
        stack.pop();
        while stack.len() > 1 {
            if let Some(w) = stack.pop() {
                self.connect(cycle[u], cycle[w])?;
            }
        }
        Ok(())
    }

    // Flips diagonals that violate the Delaunay condition.
    fn optimize(&mut self, max_passes: usize) {
        for pass in 0..max_passes {
            let mut flips = 0;
            let diagonals: Vec<EdgeIdx> = self
                .edges()
                .filter(|e| e.0 % 2 == 0 && self.is_diagonal(*e))
                .collect();
            for e in diagonals {
                if self.should_flip(e) && self.swap(e).is_ok() {
                    flips += 1;
                }
            }
            tracing::trace!(pass, flips, "delaunay pass");
            if flips == 0 {
                return;
            }
        }
        tracing::warn!(max_passes, "delaunay refinement didn't converge");
    }

    fn should_flip(&self, e: EdgeIdx) -> bool {
        let s = e.sym();
        let (Some(fl), Some(fr)) = (self.edge_face(e), self.edge_face(s)) else {
            return false;
        };
        if fl == fr || self.cycle(e).len() != 3 || self.cycle(s).len() != 3 {
            return false;
        }
        let a = self.origin(e);
        let c = self.dest(e);
        let d = self.dest(self.lnext(e));
        let b = self.dest(self.lnext(s));
        incircle(a, c, d, b) == Ordering::Greater
            && orient(d, a, b) == Ordering::Greater
            && orient(b, c, d) == Ordering::Greater
    }

    /// Inserts a point into a triangulated mesh.
    ///
    /// The triangle containing `p` is split into three. The point must be
    /// strictly inside some triangle; if it's on an edge or a vertex, this
    /// fails with [`Error::PointOnBoundary`], and if it isn't in any
    /// triangle, with [`Error::PointOutside`].
    ///
    /// Returns a half-edge leaving the new vertex.
    pub fn add_point(&mut self, p: Point) -> Result<EdgeIdx, Error> {
        let mut on_boundary = false;
        let mut found = None;
        for f in self.faces() {
            let edges = self.face_edges(f);
            if edges.len() != 3 {
                continue;
            }
            let signs: Vec<Ordering> = edges
                .iter()
                .map(|e| orient(self.origin(*e), self.dest(*e), p))
                .collect();
            if signs.iter().all(|o| *o == Ordering::Greater) {
                found = Some((f, edges));
                break;
            }
            if !signs.contains(&Ordering::Less) {
                on_boundary = true;
            }
        }
        let Some((f, edges)) = found else {
            return Err(if on_boundary {
                Error::PointOnBoundary
            } else {
                Error::PointOutside
            });
        };

        let (e0, e1, e2) = (edges[0], edges[1], edges[2]);
        let a = self.origin(e0);
        let data = self.faces[f].as_ref().map(|face| face.data.clone());
        let d = self.make_edge(a, p);
        for (h, seg) in [(d, Segment::new(a, p)), (d.sym(), Segment::new(p, a))] {
            let half = &mut self.edges[h];
            half.data = data.clone();
            half.curve = Some(seg);
            half.diagonal = true;
        }
        // The triangle's interior at `a` is between `e0` and `onext(e0)`.
        self.splice(e0, d);
        self.vertices.insert(p, d.sym());
        self.set_label(d, Label::Face(f));
        self.set_label(d.sym(), Label::Face(f));

        self.connect(d.sym(), e1)?;
        self.connect(d.sym(), e2)?;
        tracing::trace!(?p, face = ?f, "inserted a point");
        self.assert_invariants();
        Ok(d.sym())
    }
}
