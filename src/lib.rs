//! Seamless-clone compositor core.
//!
//! Pastes an opaque foreground region onto a background so the seam
//! is invisible, via a gradient-domain blend: extract the foreground's
//! outline, build a refined triangular mesh over it, plan a weighted
//! boundary sample list per interior mesh vertex, and at render time
//! add the interpolated foreground/background color difference back
//! into the foreground.
//!
//! The pipeline, leaves-first: [`outline`] → [`mesh`] → [`sampling`] →
//! [`render_cache`] → [`tile`], sequenced by [`Context`].

pub mod buffer;
pub mod context;
pub mod error;
pub mod geometry;
pub mod mesh;
pub mod outline;
pub mod render_cache;
pub mod sampling;
pub mod tile;

pub use buffer::{PixelBuffer, PixelSampler, Rgba, RgbaBuffer};
pub use context::Context;
pub use error::{CreationError, CreationResult, RenderError, RenderResult};
pub use geometry::{Dir8, Rect};
pub use mesh::{Mesh, MeshRefiner, MeshVertex, SpadeRefiner, Triangle, VertexId};
pub use outline::{Outline, OutlinePoint};
pub use render_cache::{RenderCache, RenderInfo, UvtCache};
pub use sampling::{MeshSampling, SampleList};
