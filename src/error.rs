use thiserror::Error;

/// Structural problems with the foreground that prevent a [`crate::Context`]
/// from being built at all (spec §7.1).
#[derive(Error, Debug, PartialEq, Eq, Clone, Copy)]
pub enum CreationError {
    #[error("no opaque pixel found in the region of interest")]
    Empty,

    #[error("opaque region is too small to outline (length < 3 or islands only)")]
    TooSmall,

    #[error("opaque region has holes or more than one connected component")]
    HoledOrSplit,
}

/// Failures surfaced from [`crate::Context::prepare_render`] and
/// [`crate::Context::render`] (spec §7.2/§7.3). These never panic; the
/// context warns through `log` and returns `false`/`Err` instead.
#[derive(Error, Debug, PartialEq, Clone, Copy)]
pub enum RenderError {
    #[error("foreground does not overlap background for the requested offset")]
    NoOverlap,

    #[error("render cache is missing or invalid; call prepare_render first")]
    CacheInvalid,

    #[error("mesh bounds are not contained in the foreground rectangle")]
    MeshOutsideForeground,

    #[error("vertex {0:?} has no valid boundary sample for this render")]
    NoValidSample(crate::mesh::VertexId),
}

pub type CreationResult<T> = std::result::Result<T, CreationError>;
pub type RenderResult<T> = std::result::Result<T, RenderError>;
