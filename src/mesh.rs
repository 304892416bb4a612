//! Mesh Builder: turns an [`Outline`] into a refined constrained
//! Delaunay triangulation (spec §4.2).
//!
//! The triangulator itself is an external collaborator (spec §6); this
//! module defines the [`MeshRefiner`] trait that any such collaborator
//! must satisfy and ships [`SpadeRefiner`], a default implementation on
//! top of the `spade` crate's constrained Delaunay triangulation.

use crate::geometry::Rect;
use crate::outline::Outline;
use spade::{ConstrainedDelaunayTriangulation, Point2, Triangulation};
use std::collections::HashMap;

/// Stable identity for a mesh vertex, usable as a hash key. Indexes
/// into [`Mesh::vertices`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexId(pub u32);

#[derive(Debug, Clone, Copy)]
pub struct MeshVertex {
    pub x: f64,
    pub y: f64,
    /// Whether this vertex lies on the (inset) outline polygon, as
    /// opposed to being a Steiner point added during refinement.
    pub on_boundary: bool,
    /// Index of the originating outline point, for boundary vertices.
    pub outline_index: Option<usize>,
}

#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    pub vertices: [VertexId; 3],
}

/// A constrained Delaunay triangulation of an outline, refined until
/// every triangle's minimum angle meets a quality bound (spec §3 "Mesh").
#[derive(Debug, Clone)]
pub struct Mesh {
    pub vertices: Vec<MeshVertex>,
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn vertex(&self, id: VertexId) -> &MeshVertex {
        &self.vertices[id.0 as usize]
    }

    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId> + '_ {
        (0..self.vertices.len() as u32).map(VertexId)
    }

    /// Smallest angle, in radians, of any triangle in the mesh.
    pub fn min_angle(&self) -> f64 {
        self.triangles
            .iter()
            .map(|t| triangle_min_angle(self, t))
            .fold(f64::INFINITY, f64::min)
    }

    /// Locate the triangle containing `(x, y)` and its barycentric
    /// coordinates `(u, v)` relative to `vertices[0]`/`vertices[1]`.
    /// Returns `None` if the point is outside every triangle (spec §4.5:
    /// the tile renderer treats this as a pass-through pixel).
    pub fn locate(&self, x: f64, y: f64) -> Option<(usize, f64, f64)> {
        for (idx, tri) in self.triangles.iter().enumerate() {
            let a = self.vertex(tri.vertices[0]);
            let b = self.vertex(tri.vertices[1]);
            let c = self.vertex(tri.vertices[2]);
            if let Some((u, v)) = barycentric(a, b, c, x, y) {
                return Some((idx, u, v));
            }
        }
        None
    }
}

fn barycentric(a: &MeshVertex, b: &MeshVertex, c: &MeshVertex, px: f64, py: f64) -> Option<(f64, f64)> {
    let (ax, ay) = (a.x, a.y);
    let (bx, by) = (b.x - ax, b.y - ay);
    let (cx, cy) = (c.x - ax, c.y - ay);
    let (px, py) = (px - ax, py - ay);

    let denom = bx * cy - cx * by;
    if denom.abs() < 1e-12 {
        return None;
    }
    let u = (px * cy - cx * py) / denom;
    let v = (bx * py - px * by) / denom;
    const EPS: f64 = 1e-9;
    if u >= -EPS && v >= -EPS && u + v <= 1.0 + EPS {
        Some((u, v))
    } else {
        None
    }
}

fn angle_at(p: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
    let v1 = (a.0 - p.0, a.1 - p.1);
    let v2 = (b.0 - p.0, b.1 - p.1);
    let n1 = (v1.0 * v1.0 + v1.1 * v1.1).sqrt();
    let n2 = (v2.0 * v2.0 + v2.1 * v2.1).sqrt();
    if n1 == 0.0 || n2 == 0.0 {
        return 0.0;
    }
    let cos = ((v1.0 * v2.0 + v1.1 * v2.1) / (n1 * n2)).clamp(-1.0, 1.0);
    cos.acos()
}

fn triangle_min_angle(mesh: &Mesh, tri: &Triangle) -> f64 {
    let a = mesh.vertex(tri.vertices[0]);
    let b = mesh.vertex(tri.vertices[1]);
    let c = mesh.vertex(tri.vertices[2]);
    let (a, b, c) = ((a.x, a.y), (b.x, b.y), (c.x, c.y));
    let ang_a = angle_at(a, b, c);
    let ang_b = angle_at(b, a, c);
    let ang_c = angle_at(c, a, b);
    ang_a.min(ang_b).min(ang_c)
}

fn circumcenter(a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> Option<(f64, f64)> {
    let d = 2.0 * (a.0 * (b.1 - c.1) + b.0 * (c.1 - a.1) + c.0 * (a.1 - b.1));
    if d.abs() < 1e-12 {
        return None;
    }
    let a2 = a.0 * a.0 + a.1 * a.1;
    let b2 = b.0 * b.0 + b.1 * b.1;
    let c2 = c.0 * c.0 + c.1 * c.1;
    let ux = (a2 * (b.1 - c.1) + b2 * (c.1 - a.1) + c2 * (a.1 - b.1)) / d;
    let uy = (a2 * (c.0 - b.0) + b2 * (a.0 - c.0) + c2 * (b.0 - a.0)) / d;
    Some((ux, uy))
}

/// Collaborator contract for a constrained Delaunay refiner (spec §6):
/// given a closed polygon edge chain and a quality target, produce a
/// mesh preserving the constraint edges and the Delaunay property,
/// adding only interior (Steiner) vertices.
pub trait MeshRefiner {
    fn refine(&self, boundary: &[(f64, f64)], min_angle: f64, max_refine_steps: usize) -> Mesh;
}

/// Default [`MeshRefiner`] built on `spade`'s constrained Delaunay
/// triangulation plus a Ruppert-style Steiner insertion loop bounded by
/// `max_refine_steps`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SpadeRefiner;

type Cdt = ConstrainedDelaunayTriangulation<Point2<f64>>;

impl MeshRefiner for SpadeRefiner {
    fn refine(&self, boundary: &[(f64, f64)], min_angle: f64, max_refine_steps: usize) -> Mesh {
        let mut cdt = Cdt::new();
        let mut handles = Vec::with_capacity(boundary.len());
        for &(x, y) in boundary {
            match cdt.insert(Point2::new(x, y)) {
                Ok(h) => handles.push(Some(h)),
                Err(_) => handles.push(None),
            }
        }
        for i in 0..handles.len() {
            let j = (i + 1) % handles.len();
            if let (Some(hi), Some(hj)) = (handles[i], handles[j]) {
                if hi != hj {
                    let _ = cdt.add_constraint(hi, hj);
                }
            }
        }

        let boundary_handles: std::collections::HashSet<_> =
            handles.iter().filter_map(|h| *h).collect();

        let mut steps_left = max_refine_steps;
        while steps_left > 0 {
            let worst = worst_triangle(&cdt, min_angle);
            let Some((a, b, c)) = worst else { break };
            let pa = (a.0, a.1);
            let pb = (b.0, b.1);
            let pc = (c.0, c.1);
            let Some(center) = circumcenter(pa, pb, pc) else {
                break;
            };
            if cdt.insert(Point2::new(center.0, center.1)).is_err() {
                break;
            }
            steps_left -= 1;
        }

        build_mesh_from_cdt(&cdt, &handles, &boundary_handles)
    }
}

fn worst_triangle(cdt: &Cdt, min_angle: f64) -> Option<((f64, f64), (f64, f64), (f64, f64))> {
    let mut worst: Option<(f64, [(f64, f64); 3])> = None;
    for face in cdt.inner_faces() {
        let verts = face.vertices();
        let pts: Vec<(f64, f64)> = verts.iter().map(|v| (v.position().x, v.position().y)).collect();
        let (pa, pb, pc) = (pts[0], pts[1], pts[2]);
        let ang = angle_at(pa, pb, pc).min(angle_at(pb, pa, pc)).min(angle_at(pc, pa, pb));
        if ang < min_angle {
            match worst {
                Some((w, _)) if w <= ang => {}
                _ => worst = Some((ang, [pa, pb, pc])),
            }
        }
    }
    worst.map(|(_, pts)| (pts[0], pts[1], pts[2]))
}

fn build_mesh_from_cdt(
    cdt: &Cdt,
    original_handles: &[Option<spade::handles::FixedVertexHandle>],
    boundary_handles: &std::collections::HashSet<spade::handles::FixedVertexHandle>,
) -> Mesh {
    let mut index_of: HashMap<spade::handles::FixedVertexHandle, u32> = HashMap::new();
    let mut vertices = Vec::new();

    for v in cdt.vertices() {
        let handle = v.fix();
        let id = vertices.len() as u32;
        index_of.insert(handle, id);
        let outline_index = original_handles.iter().position(|h| *h == Some(handle));
        vertices.push(MeshVertex {
            x: v.position().x,
            y: v.position().y,
            on_boundary: boundary_handles.contains(&handle),
            outline_index,
        });
    }

    let mut triangles = Vec::new();
    for face in cdt.inner_faces() {
        let verts = face.vertices();
        let ids = [
            VertexId(index_of[&verts[0].fix()]),
            VertexId(index_of[&verts[1].fix()]),
            VertexId(index_of[&verts[2].fix()]),
        ];
        triangles.push(Triangle { vertices: ids });
    }

    Mesh { vertices, triangles }
}

/// Build the mesh from an outline: inset each point a quarter pixel
/// along its outward normal (spec §4.2.1), triangulate and refine.
/// Returns the mesh plus its bounding box (spec §3 "mesh_bounds").
pub fn build_mesh(outline: &Outline, max_refine_steps: usize) -> (Mesh, Rect) {
    build_mesh_with(&SpadeRefiner, outline, max_refine_steps)
}

pub fn build_mesh_with<R: MeshRefiner>(
    refiner: &R,
    outline: &Outline,
    max_refine_steps: usize,
) -> (Mesh, Rect) {
    const INSET: f64 = 0.25;
    let boundary: Vec<(f64, f64)> = outline
        .points
        .iter()
        .map(|p| {
            let (dx, dy) = p.outward_normal.offset();
            (p.x as f64 + INSET * dx as f64, p.y as f64 + INSET * dy as f64)
        })
        .collect();

    let mut min_x = f64::INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for &(x, y) in &boundary {
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x);
        max_y = max_y.max(y);
    }

    // Truncate toward zero, matching the original's `gint` assignment
    // of the inset float coordinates (sc-context.c), not `floor`/`ceil`.
    let bx = min_x as i64;
    let by = min_y as i64;
    let bounds = Rect::new(
        bx,
        by,
        (max_x as i64 + 1) - bx,
        (max_y as i64 + 1) - by,
    );

    let mesh = refiner.refine(&boundary, std::f64::consts::FRAC_PI_6, max_refine_steps);
    (mesh, bounds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Dir8;
    use crate::outline::OutlinePoint;

    fn square_outline(size: i64) -> Outline {
        let mut points = Vec::new();
        for x in 0..size {
            points.push(OutlinePoint { x, y: 0, outward_normal: Dir8::N });
        }
        for y in 0..size {
            points.push(OutlinePoint { x: size - 1, y, outward_normal: Dir8::E });
        }
        for x in (0..size).rev() {
            points.push(OutlinePoint { x, y: size - 1, outward_normal: Dir8::S });
        }
        for y in (0..size).rev() {
            points.push(OutlinePoint { x: 0, y, outward_normal: Dir8::W });
        }
        Outline { points, ignored_islands: false }
    }

    #[test]
    fn mesh_bounds_cover_outline() {
        let outline = square_outline(10);
        let (mesh, bounds) = build_mesh(&outline, 200);
        for p in &outline.points {
            assert!(bounds.contains_point(p.x, p.y));
        }
        assert!(!mesh.vertices.is_empty());
    }

    #[test]
    fn refined_triangles_meet_quality_bound() {
        let outline = square_outline(10);
        let (mesh, _) = build_mesh(&outline, 5 * outline.points.len());
        for tri in &mesh.triangles {
            assert!(triangle_min_angle(&mesh, tri) >= std::f64::consts::FRAC_PI_6 - 1e-6);
        }
    }
}
