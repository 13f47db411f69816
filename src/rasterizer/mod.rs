//! CPU triangle rasterizer
//!
//! Features:
//! - Perspective and orthographic projection
//! - Backface culling and whole-triangle frustum rejection
//! - Scanline fill with a shared depth buffer
//! - Wireframe, unlit, flat and Phong shading, each with a textured form
//! - Perspective-correct texture coordinates

mod depth;
mod math;
mod project;
mod raster;
mod render;
mod sort;
mod types;

pub use depth::*;
pub use math::*;
pub use project::*;
pub use raster::*;
pub use render::*;
pub use sort::*;
pub use types::*;

/// Default window resolution
pub const DEFAULT_WIDTH: usize = 800;
pub const DEFAULT_HEIGHT: usize = 600;
