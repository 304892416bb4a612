//! Tile Renderer (spec §4.5): rasterizes the mesh interpolation of
//! vertex corrections for a requested output rectangle and adds it to
//! the foreground.

use crate::buffer::PixelBuffer;
use crate::error::{RenderError, RenderResult};
use crate::geometry::Rect;
use crate::mesh::Mesh;
use crate::render_cache::{RenderCache, RenderInfo};

/// Rasterize `part_rect` (in background/output coordinates) into
/// `out_buf`. Pure reads from `cache`, `mesh` and the two buffers in
/// `info`; never mutates any long-lived state (spec §4.5, §5).
pub fn render(
    mesh: &Mesh,
    mesh_bounds: Rect,
    cache: &RenderCache,
    info: &RenderInfo,
    part_rect: Rect,
    out_buf: &mut dyn PixelBuffer,
) -> RenderResult<()> {
    if mesh_bounds.is_empty() {
        return Ok(());
    }
    if !info.fg_rect.contains(&mesh_bounds) {
        return Err(RenderError::MeshOutsideForeground);
    }

    let fg_area = mesh_bounds.translate(info.xoff, info.yoff);
    let to_render = part_rect.intersect(&fg_area);
    if to_render.is_empty() {
        return Ok(());
    }

    const BLOCK_ROWS: i64 = 32;
    let mut y = to_render.top();
    while y < to_render.bottom() {
        let block_h = BLOCK_ROWS.min(to_render.bottom() - y);
        for by in y..y + block_h {
            for x in to_render.left()..to_render.right() {
                render_pixel(mesh, cache, info, x, by, out_buf);
            }
        }
        y += block_h;
    }

    Ok(())
}

fn render_pixel(
    mesh: &Mesh,
    cache: &RenderCache,
    info: &RenderInfo,
    x: i64,
    y: i64,
    out_buf: &mut dyn PixelBuffer,
) {
    let xf = x - info.xoff;
    let yf = y - info.yoff;
    let fg = info.fg.get(xf, yf);

    let hit = match &cache.uvt {
        Some(uvt) => uvt.get(xf, yf),
        None => mesh
            .locate(xf as f64 + 0.5, yf as f64 + 0.5)
            .map(|(tri, u, v)| (tri, u as f32, v as f32)),
    };

    let Some((tri_idx, u, v)) = hit else {
        out_buf.put(x, y, fg);
        return;
    };

    let tri = &mesh.triangles[tri_idx];
    let w0 = 1.0 - u - v;
    let mut correction = [0.0f32; 3];
    for (weight, vid) in [(w0, tri.vertices[0]), (u, tri.vertices[1]), (v, tri.vertices[2])] {
        if let Some(color) = cache.vertex_colors.get(&vid) {
            correction[0] += weight * color[0];
            correction[1] += weight * color[1];
            correction[2] += weight * color[2];
        }
    }

    out_buf.put(
        x,
        y,
        [fg[0] + correction[0], fg[1] + correction[1], fg[2] + correction[2], fg[3]],
    );
}
