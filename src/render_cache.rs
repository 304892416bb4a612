//! Render Cache (spec §4.4): precomputes, for the current foreground,
//! background and offset, each mesh vertex's color correction and
//! (optionally) a per-pixel triangle/barycentric lookup over the
//! foreground bounding box.

use crate::buffer::{PixelBuffer, Rgba};
use crate::error::{RenderError, RenderResult};
use crate::geometry::Rect;
use crate::mesh::{Mesh, VertexId};
use crate::outline::Outline;
use crate::sampling::{MeshSampling, SampleList};
use std::collections::HashMap;

/// Per-render parameters (spec §3 "RenderInfo"). Buffers are borrowed
/// for the duration of the call (spec §5) — the context never retains
/// pointers into them.
pub struct RenderInfo<'a> {
    pub bg: &'a dyn PixelBuffer,
    pub bg_rect: Rect,
    pub fg: &'a dyn PixelBuffer,
    pub fg_rect: Rect,
    pub xoff: i64,
    pub yoff: i64,
}

fn nearest(buf: &dyn PixelBuffer, x: f64, y: f64) -> Rgba {
    buf.get(x.round() as i64, y.round() as i64)
}

/// Background-minus-foreground RGB at foreground coordinate `(x, y)`
/// (spec §4.4.1 `sample_diff`). `None` if the translated background
/// coordinate falls outside `info.bg_rect`.
fn sample_diff(info: &RenderInfo, x: f64, y: f64) -> Option<[f32; 3]> {
    let bgx = x + info.xoff as f64;
    let bgy = y + info.yoff as f64;
    if !info.bg_rect.contains_point(bgx.round() as i64, bgy.round() as i64) {
        return None;
    }
    let bg = nearest(info.bg, bgx, bgy);
    let fg = nearest(info.fg, x, y);
    Some([bg[0] - fg[0], bg[1] - fg[1], bg[2] - fg[2]])
}

/// A per-pixel `(triangle index, u, v)` lookup over the foreground
/// bounding box (spec §3 "RenderCache" part (b)).
#[derive(Debug, Clone)]
pub struct UvtCache {
    pub rect: Rect,
    entries: Vec<Option<(usize, f32, f32)>>,
}

impl UvtCache {
    pub fn get(&self, x: i64, y: i64) -> Option<(usize, f32, f32)> {
        if !self.rect.contains_point(x, y) {
            return None;
        }
        let idx = (y - self.rect.top()) * self.rect.width + (x - self.rect.left());
        self.entries[idx as usize]
    }
}

/// Precomputed per-vertex correction colors, plus an optional UV
/// cache (spec §3 "RenderCache").
#[derive(Debug, Clone)]
pub struct RenderCache {
    pub vertex_colors: HashMap<VertexId, Rgba>,
    pub uvt: Option<UvtCache>,
}

/// Compute a single vertex's corrected color (spec §4.4.1).
fn vertex_color(
    outline: &Outline,
    mesh: &Mesh,
    id: VertexId,
    sl: &SampleList,
    info: &RenderInfo,
) -> RenderResult<Rgba> {
    let v = mesh.vertex(id);
    match sl {
        SampleList::Direct => {
            let diff = sample_diff(info, v.x, v.y).ok_or(RenderError::NoValidSample(id))?;
            Ok([diff[0], diff[1], diff[2], 1.0])
        }
        SampleList::Weighted { points, weights, .. } => {
            let mut dest = [0.0f32; 3];
            let mut effective_weight = 0.0f64;
            for (&idx, &w) in points.iter().zip(weights.iter()) {
                let p = outline.points[idx];
                if let Some(diff) = sample_diff(info, p.x as f64, p.y as f64) {
                    dest[0] += (w * diff[0] as f64) as f32;
                    dest[1] += (w * diff[1] as f64) as f32;
                    dest[2] += (w * diff[2] as f64) as f32;
                    effective_weight += w;
                }
            }
            if effective_weight == 0.0 {
                return Err(RenderError::NoValidSample(id));
            }
            let inv = (1.0 / effective_weight) as f32;
            Ok([dest[0] * inv, dest[1] * inv, dest[2] * inv, 1.0])
        }
    }
}

/// Build a fresh render cache from the current sampling (spec §4.4
/// steps 2–5). `cache_uvt` gates whether the per-pixel lookup (step 4)
/// is computed; when disabled the UV path of the renderer must never
/// be read (spec §9).
pub fn build(
    outline: &Outline,
    mesh: &Mesh,
    sampling: &MeshSampling,
    info: &RenderInfo,
    cache_uvt: bool,
) -> RenderResult<RenderCache> {
    let mut vertex_colors = HashMap::with_capacity(sampling.len());
    for (&id, sl) in sampling.iter() {
        let color = vertex_color(outline, mesh, id, sl, info)?;
        vertex_colors.insert(id, color);
    }

    let uvt = if cache_uvt {
        Some(build_uvt_cache(mesh, info.fg_rect))
    } else {
        None
    };

    Ok(RenderCache { vertex_colors, uvt })
}

fn build_uvt_cache(mesh: &Mesh, fg_rect: Rect) -> UvtCache {
    let mut entries = Vec::with_capacity((fg_rect.width * fg_rect.height).max(0) as usize);
    for y in fg_rect.top()..fg_rect.bottom() {
        for x in fg_rect.left()..fg_rect.right() {
            let hit = mesh
                .locate(x as f64 + 0.5, y as f64 + 0.5)
                .map(|(tri, u, v)| (tri, u as f32, v as f32));
            entries.push(hit);
        }
    }
    UvtCache { rect: fg_rect, entries }
}
