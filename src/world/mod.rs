//! World module: what gets drawn and where it comes from
//!
//! - Models with a transform and a render mode dispatch
//! - Wavefront OBJ meshes
//! - RON scene files

mod model;
mod obj;
mod scene;

pub use model::*;
pub use obj::*;
pub use scene::*;
