//! Sample-List Planner (spec §4.3): for every interior mesh vertex,
//! selects a weighted subset of outline points approximating
//! mean-value-coordinate interpolation of the boundary.

use crate::mesh::{Mesh, VertexId};
use crate::outline::Outline;
use std::collections::HashMap;

const BASE_POINT_COUNT: usize = 16;

/// Per-vertex boundary sample (spec §3 "SampleList"). `points` are
/// non-owning indices into the owning [`Outline`] (spec §9: sample
/// lists must not own outline points).
#[derive(Debug, Clone)]
pub enum SampleList {
    /// The vertex lies on the outline; sample it directly.
    Direct,
    Weighted {
        points: Vec<usize>,
        weights: Vec<f64>,
        /// Legacy field: excludes the first weight's contribution
        /// (spec §9). Downstream normalization uses the sum of
        /// *successfully sampled* weights, not this field.
        total_weight: f64,
    },
}

/// Mapping from mesh vertex to [`SampleList`] (spec §3 "MeshSampling").
pub type MeshSampling = HashMap<VertexId, SampleList>;

pub fn compute_sampling(outline: &Outline, mesh: &Mesh) -> MeshSampling {
    let mut sampling = HashMap::with_capacity(mesh.vertices.len());
    for id in mesh.vertex_ids() {
        let v = mesh.vertex(id);
        let sl = if v.on_boundary {
            SampleList::Direct
        } else {
            sample_list_compute(outline, v.x, v.y)
        };
        sampling.insert(id, sl);
    }
    sampling
}

/// Spec §4.3.1: collect a weighted subset of outline points for the
/// interior point `(px, py)`.
pub fn sample_list_compute(outline: &Outline, px: f64, py: f64) -> SampleList {
    let n = outline.len();
    let mut indices = Vec::new();

    if n <= BASE_POINT_COUNT {
        indices.extend(0..n);
    } else {
        for i in 0..BASE_POINT_COUNT {
            let i1 = (i * n) / BASE_POINT_COUNT;
            let i2 = ((i + 1) * n) / BASE_POINT_COUNT;
            part(outline, i1 as i64, i2 as i64, px, py, 0, &mut indices);
        }
    }

    compute_weights(outline, px, py, indices)
}

/// Recursive subdivider (spec §4.3.1). Appends the point at `i1` and
/// recurses; the caller is responsible for eventually visiting `i2`
/// via the next arc (or the wrap-around for the final arc).
fn part(outline: &Outline, i1: i64, i2: i64, px: f64, py: f64, k: u32, out: &mut Vec<usize>) {
    let n = outline.len();
    let pt1 = outline.points[(i1 as usize) % n];
    let pt2 = outline.points[(i2 as usize) % n];

    let (dx1, dy1) = (px - pt1.x as f64, py - pt1.y as f64);
    let (dx2, dy2) = (px - pt2.x as f64, py - pt2.y as f64);
    let n1 = (dx1 * dx1 + dy1 * dy1).sqrt();
    let n2 = (dx2 * dx2 + dy2 * dy2).sqrt();

    let theta = if n1 == 0.0 || n2 == 0.0 {
        0.0
    } else {
        let cos = ((dx1 * dx2 + dy1 * dy2) / (n1 * n2)).clamp(-1.0, 1.0);
        cos.acos()
    };

    let edist_k = n as f64 / (BASE_POINT_COUNT as f64 * 2.5f64.powi(k as i32));
    let eang_k = 0.75 * 0.8f64.powi(k as i32);

    if (n1 > edist_k && n2 > edist_k && theta < eang_k) || (i2 - i1 <= 1) {
        out.push((i1 as usize) % n);
        return;
    }

    let mid = (i1 + i2) / 2;
    part(outline, i1, mid, px, py, k + 1, out);
    part(outline, mid, i2, px, py, k + 1, out);
}

/// Mean-value-like weight computation (spec §4.3.2).
fn compute_weights(outline: &Outline, px: f64, py: f64, indices: Vec<usize>) -> SampleList {
    let n = indices.len();
    if n == 0 {
        return SampleList::Weighted { points: Vec::new(), weights: Vec::new(), total_weight: 0.0 };
    }

    let mut tan_half = vec![0.0f64; n];
    let mut norms = vec![0.0f64; n];

    for i in 0..n {
        let pt1 = outline.points[indices[i]];
        let pt2 = outline.points[indices[(i + 1) % n]];

        let (dx1, dy1) = (px - pt1.x as f64, py - pt1.y as f64);
        let (dx2, dy2) = (px - pt2.x as f64, py - pt2.y as f64);
        let norm1 = (dx1 * dx1 + dy1 * dy1).sqrt();
        let norm2 = (dx2 * dx2 + dy2 * dy2).sqrt();

        norms[i] = norm1;

        if norm1 == 0.0 {
            // Degenerate: collapse to a single direct sample (spec §4.3.2 edge case).
            return SampleList::Weighted {
                points: vec![indices[i]],
                weights: vec![1.0],
                total_weight: 1.0,
            };
        }

        let cos = (dx1 * dx2 + dy1 * dy2) / (norm1 * norm2);
        let angle = if (-1.0..=1.0).contains(&cos) { cos.acos() } else { 0.0 };
        tan_half[i] = (angle / 2.0).tan().abs();
    }

    let mut weights = vec![0.0f64; n];
    weights[0] = (tan_half[0] + tan_half[n - 1]) / norms[0];

    let mut total_weight = 0.0;
    for i in 1..n {
        let w = (tan_half[i - 1] + tan_half[i % n]) / (norms[i % n] * norms[i % n]);
        weights[i] = w;
        total_weight += w;
    }

    SampleList::Weighted { points: indices, weights, total_weight }
}
