//! softrender: a CPU-only 3D triangle renderer
//!
//! - [`rasterizer`]: math, projection, visibility, scanline fill and shading
//! - [`world`]: models, OBJ loading and RON scene files

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod rasterizer;
pub mod world;
