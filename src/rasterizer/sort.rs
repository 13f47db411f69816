//! Vertex ordering for scanline traversal

use super::math::{Vec2, Vec3};

/// One triangle corner: its screen position (x, y, depth metric) plus any
/// per-vertex attributes the active shading mode interpolates
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VertexBundle {
    pub screen: Vec3,
    /// View-space position
    pub view: Option<Vec3>,
    /// View-space normal
    pub normal: Option<Vec3>,
    pub uv: Option<Vec2>,
}

impl VertexBundle {
    pub fn new(screen: Vec3) -> Self {
        Self { screen, ..Default::default() }
    }

    pub fn with_view(mut self, view: Vec3) -> Self {
        self.view = Some(view);
        self
    }

    pub fn with_normal(mut self, normal: Vec3) -> Self {
        self.normal = Some(normal);
        self
    }

    pub fn with_uv(mut self, uv: Vec2) -> Self {
        self.uv = Some(uv);
        self
    }
}

/// Sort three bundles by ascending screen Y (top first). Stable, so bundles
/// on the same row keep their relative order.
pub fn sort_by_y(bundles: &mut [VertexBundle; 3]) {
    for i in 1..bundles.len() {
        let mut j = i;
        while j > 0 && bundles[j - 1].screen.y > bundles[j].screen.y {
            bundles.swap(j - 1, j);
            j -= 1;
        }
    }
}
