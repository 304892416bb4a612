//! Context (spec §4.6): owns the outline, mesh, sampling and render
//! cache for one foreground region, and sequences updates across them.

use crate::buffer::PixelBuffer;
use crate::error::{CreationError, CreationResult, RenderError, RenderResult};
use crate::geometry::Rect;
use crate::mesh::{self, Mesh};
use crate::outline::{self, Outline};
use crate::render_cache::{self, RenderCache, RenderInfo};
use crate::sampling::{self, MeshSampling};
use crate::tile;
use log::{debug, warn};

/// Steiner-point budget passed to the mesh refiner, scaled by outline
/// length (spec §8 property 4 calls out `5·outline_length` as
/// sufficient for the quality bound to be reached).
const REFINE_BUDGET_FACTOR: usize = 5;

/// Owns the full per-region pipeline state: outline, mesh, sampling
/// and render cache (spec §3 "Context").
///
/// Field order matches the drop order mandated by spec §4.6 `free`
/// (render cache, sampling, mesh, outline) — Rust drops struct fields
/// in declaration order, so no custom `Drop` impl is needed to honor it.
pub struct Context {
    render_cache: Option<RenderCache>,
    sampling: Option<MeshSampling>,
    mesh: Option<Mesh>,
    outline: Option<Outline>,
    mesh_bounds: Rect,
    cache_uvt: bool,
}

impl Context {
    /// Build a context from the opaque region of `fg` within `roi`
    /// (spec §4.6 `new`).
    pub fn new(fg: &dyn PixelBuffer, roi: Rect, threshold: f32) -> CreationResult<Context> {
        let outline = outline::find_outline(fg, roi, threshold)?;
        let (mesh, mesh_bounds) = build_mesh_for(&outline);
        let sampling = sampling::compute_sampling(&outline, &mesh);

        Ok(Context {
            render_cache: None,
            sampling: Some(sampling),
            mesh: Some(mesh),
            outline: Some(outline),
            mesh_bounds,
            cache_uvt: false,
        })
    }

    /// Re-extract the outline from `fg`; rebuild mesh/sampling only if
    /// it actually changed (spec §4.6 `update`). Returns whether the
    /// geometry changed.
    pub fn update(&mut self, fg: &dyn PixelBuffer, roi: Rect, threshold: f32) -> CreationResult<bool> {
        let new_outline = outline::find_outline(fg, roi, threshold)?;

        if let Some(existing) = &self.outline {
            if existing.geometrically_equal(&new_outline) {
                debug!("outline unchanged on update; reusing mesh");
                return Ok(false);
            }
        }

        self.render_cache = None;
        self.sampling = None;
        self.mesh = None;
        self.outline = None;

        let (mesh, mesh_bounds) = build_mesh_for(&new_outline);
        let sampling = sampling::compute_sampling(&new_outline, &mesh);

        self.mesh_bounds = mesh_bounds;
        self.mesh = Some(mesh);
        self.sampling = Some(sampling);
        self.outline = Some(new_outline);
        Ok(true)
    }

    /// Enable or disable the per-pixel UV cache (spec §4.6
    /// `set_uvt_cache`). Takes effect at the next `prepare_render`;
    /// if disabling, an existing UV buffer is dropped immediately.
    pub fn set_uvt_cache(&mut self, enabled: bool) {
        self.cache_uvt = enabled;
        if !enabled {
            if let Some(cache) = &mut self.render_cache {
                cache.uvt = None;
            }
        }
    }

    pub fn mesh_bounds(&self) -> Rect {
        self.mesh_bounds
    }

    pub fn outline(&self) -> Option<&Outline> {
        self.outline.as_ref()
    }

    pub fn mesh(&self) -> Option<&Mesh> {
        self.mesh.as_ref()
    }

    /// Recompute the render cache for `info` (spec §4.4
    /// `prepare_render`). Invalidates any existing cache first; on
    /// failure the context is left with no valid cache.
    pub fn prepare_render(&mut self, info: &RenderInfo) -> RenderResult<()> {
        self.render_cache = None;

        let translated_fg = info.fg_rect.translate(info.xoff, info.yoff);
        if translated_fg.intersect(&info.bg_rect).is_empty() {
            warn!("prepare_render: foreground does not overlap background");
            return Err(RenderError::NoOverlap);
        }

        let outline = self.outline.as_ref().ok_or(RenderError::CacheInvalid)?;
        let mesh = self.mesh.as_ref().ok_or(RenderError::CacheInvalid)?;
        let sampling = self.sampling.as_ref().ok_or(RenderError::CacheInvalid)?;

        let cache = render_cache::build(outline, mesh, sampling, info, self.cache_uvt)?;
        self.render_cache = Some(cache);
        Ok(())
    }

    /// Rasterize `part_rect` into `out_buf` (spec §4.5 `render`).
    /// Read-only with respect to the context; safe to call from
    /// multiple threads for the same context once the cache is valid,
    /// provided no concurrent `prepare_render`/`update` is in flight
    /// (spec §5).
    pub fn render(
        &self,
        info: &RenderInfo,
        part_rect: Rect,
        out_buf: &mut dyn PixelBuffer,
    ) -> RenderResult<()> {
        let cache = self.render_cache.as_ref().ok_or_else(|| {
            warn!("render: no valid render cache; call prepare_render first");
            RenderError::CacheInvalid
        })?;
        let mesh = self.mesh.as_ref().ok_or(RenderError::CacheInvalid)?;

        tile::render(mesh, self.mesh_bounds, cache, info, part_rect, out_buf)
    }

    /// Consume the context, dropping its owned state in the order
    /// mandated by spec §4.6 (render cache, sampling, mesh, outline).
    pub fn free(self) {
        debug!("freeing seamless-clone context");
        drop(self);
    }
}

fn build_mesh_for(outline: &Outline) -> (Mesh, Rect) {
    let budget = outline.len() * REFINE_BUDGET_FACTOR;
    mesh::build_mesh(outline, budget)
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("outline_len", &self.outline.as_ref().map(Outline::len))
            .field("mesh_bounds", &self.mesh_bounds)
            .field("cache_uvt", &self.cache_uvt)
            .field("has_render_cache", &self.render_cache.is_some())
            .finish()
    }
}
