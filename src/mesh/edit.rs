//! Editing operations on an existing mesh.

use super::{EdgeIdx, FaceIdx, Label, Mesh};
use crate::{geom::Segment, Error};

impl<E: Clone> Mesh<E> {
    fn relabel_cycle(&mut self, start: EdgeIdx, f: FaceIdx) {
        for e in self.cycle(start) {
            self.set_label(e, Label::Face(f));
        }
    }

    fn cycle_contains(&self, start: EdgeIdx, needle: EdgeIdx) -> bool {
        self.cycle(start).contains(&needle)
    }

    /// Adds a diagonal from the origin of `a` to the origin of `b`.
    ///
    /// The new edge takes the data of the region it's added to, on both sides.
    /// If `a` and `b` are on the boundary of the same face, that face is split
    /// in two (and the half that contains the face's start keeps its index).
    /// If they're on the boundaries of two different faces (like a hole and
    /// the face around it), the two faces are merged.
    ///
    /// Returns the new half-edge from `a`'s origin to `b`'s.
    pub fn connect(&mut self, a: EdgeIdx, b: EdgeIdx) -> Result<EdgeIdx, Error> {
        let (oa, ob) = (self.origin(a), self.origin(b));
        if oa == ob {
            return Err(Error::Invariant(format!(
                "can't connect {a:?} and {b:?}, they start at the same point"
            )));
        }
        let x1 = self.find_connecting_edge(a, ob);
        let x2 = self.find_connecting_edge(b, oa);
        let (fa, fb) = (self.edge_face(x1), self.edge_face(x2));
        let data = self.edges[x1].data.clone();

        let d = self.make_edge(oa, ob);
        let s = d.sym();
        for (h, seg) in [(d, Segment::new(oa, ob)), (s, Segment::new(ob, oa))] {
            let half = &mut self.edges[h];
            half.data = data.clone();
            half.curve = Some(seg);
            half.diagonal = true;
        }

        let p1 = self.onext(x1).sym();
        let p2 = self.onext(x2).sym();
        self.splice(x1, d);
        self.splice(x2, s);

        match (fa, fb) {
            (Some(fa), Some(fb)) if fa == fb => {
                let start = self.face_start(fa).unwrap_or(d);
                let (keep, other) = if self.cycle_contains(d, start) {
                    (d, s)
                } else {
                    (s, d)
                };
                self.relabel_cycle(keep, fa);
                let face_data = self.faces[fa].as_ref().map(|face| face.data.clone());
                match face_data {
                    Some(face_data) => {
                        let nf = self.alloc_face(other, face_data);
                        self.relabel_cycle(other, nf);
                        tracing::trace!(face = ?fa, new = ?nf, "split a face");
                    }
                    None => self.relink(&[], &[other]),
                }
            }
            (Some(fa), Some(fb)) => {
                self.relabel_cycle(d, fa);
                self.free_face(fb);
                tracing::trace!(face = ?fa, merged = ?fb, "merged two faces");
            }
            _ => self.relink(&[(p1, x1), (p2, x2)], &[d, s]),
        }

        self.assert_invariants();
        Ok(d)
    }

    /// Removes an edge from the mesh.
    ///
    /// The faces and chains on both sides of the edge are rebuilt from what
    /// remains.
    pub fn delete_edge(&mut self, e: EdgeIdx) -> Result<(), Error> {
        let s = e.sym();
        if !self.edges[e].live {
            return Err(Error::Invariant(format!("{e:?} was already deleted")));
        }

        let neighbors = [
            e,
            s,
            self.lprev(e),
            self.lnext(e),
            self.lprev(s),
            self.lnext(s),
        ];
        let mut faces = Vec::new();
        let mut chains = Vec::new();
        for h in neighbors {
            match self.label(h) {
                Label::Face(f) if !faces.contains(&f) => faces.push(f),
                Label::Chain(c) if !chains.contains(&c) => chains.push(c),
                _ => {}
            }
        }
        let mut seeds = self.dissolve(&faces, &chains);
        seeds.extend(neighbors);

        for h in [e, s] {
            let origin = self.origin(h);
            let next = self.onext(h);
            if next != h {
                self.vertices.insert(origin, next);
                let prev = self.oprev(h);
                self.splice(h, prev);
            } else {
                self.vertices.remove(&origin);
            }
        }
        self.destroy_edge(e)?;

        for seed in seeds {
            if self.edges[seed].live && self.is_inner(seed) && self.label(seed) == Label::Free {
                self.stitch(seed);
            }
        }
        self.assert_invariants();
        Ok(())
    }

    /// Flips the diagonal of the quadrilateral formed by the two triangles on
    /// either side of `e`.
    ///
    /// If `e` goes from `a` to `c` with the triangle `a, c, d` on its left and
    /// `c, a, b` on its right, then afterwards it goes from `b` to `d`. The two
    /// faces keep their indices and their data; the one on the left of `e`
    /// stays on its left.
    pub fn swap(&mut self, e: EdgeIdx) -> Result<(), Error> {
        let s = e.sym();
        let (Some(fl), Some(fr)) = (self.edge_face(e), self.edge_face(s)) else {
            return Err(Error::NotTriangulable);
        };
        if fl == fr || self.cycle(e).len() != 3 || self.cycle(s).len() != 3 {
            return Err(Error::NotTriangulable);
        }

        let (old_a, old_c) = (self.origin(e), self.origin(s));
        let a = self.oprev(e);
        let b = self.oprev(s);

        self.splice(e, a);
        self.splice(s, b);
        let a_next = self.lnext(a);
        let b_next = self.lnext(b);
        self.splice(e, a_next);
        self.splice(s, b_next);
        self.edges[e].origin = self.dest(a);
        self.edges[s].origin = self.dest(b);

        // The old endpoints may have been found through `e` or `s`.
        self.vertices.insert(old_a, a);
        self.vertices.insert(old_c, b);
        let (p, q) = (self.origin(e), self.origin(s));
        self.edges[e].curve = Some(Segment::new(p, q));
        self.edges[s].curve = Some(Segment::new(q, p));

        self.relabel_cycle(e, fl);
        self.relabel_cycle(s, fr);
        for (f, start) in [(fl, e), (fr, s)] {
            if let Some(face) = self.faces[f].as_mut() {
                face.start = start;
            }
        }
        self.assert_invariants();
        Ok(())
    }
}
