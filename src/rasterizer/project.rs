//! Projection to screen space and per-triangle visibility tests

use serde::{Deserialize, Serialize};

use super::math::{Mat4, Vec3};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectionKind {
    #[default]
    Perspective,
    Orthographic,
}

/// Projection matrix tagged with how it was built
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub matrix: Mat4,
    pub kind: ProjectionKind,
}

impl Projection {
    pub fn perspective(fov: f32, width: usize, height: usize, near: f32, far: f32) -> Self {
        Self {
            matrix: Mat4::perspective(fov, width, height, near, far),
            kind: ProjectionKind::Perspective,
        }
    }

    pub fn orthographic(width: usize, height: usize, near: f32, far: f32) -> Self {
        Self {
            matrix: Mat4::orthographic(width, height, near, far),
            kind: ProjectionKind::Orthographic,
        }
    }

    /// Map a view-space vertex to (screen_x, screen_y, depth metric).
    ///
    /// The depth metric is `1 / clip.w` for perspective (larger is nearer)
    /// and `-clip.z` for orthographic.
    pub fn project(&self, v: Vec3, width: usize, height: usize) -> Vec3 {
        let clip = self.matrix * v.extend(1.0);
        let inv_w = 1.0 / clip.w;

        let ndc_x = clip.x * inv_w;
        let ndc_y = clip.y * inv_w;

        let screen_x = (ndc_x * 0.5 + 0.5) * width as f32;
        let screen_y = (-ndc_y * 0.5 + 0.5) * height as f32;

        match self.kind {
            ProjectionKind::Perspective => Vec3::new(screen_x, screen_y, inv_w),
            ProjectionKind::Orthographic => Vec3::new(screen_x, screen_y, -clip.z),
        }
    }

    /// Depth-test key from an interpolated depth metric: smaller is nearer for
    /// both projection kinds
    pub fn depth_key(kind: ProjectionKind, metric: f32) -> f32 {
        match kind {
            ProjectionKind::Perspective => 1.0 / metric,
            ProjectionKind::Orthographic => -metric,
        }
    }
}

/// Unit normal of triangle (v1, v2, v3) by its winding
pub fn face_normal(v1: Vec3, v2: Vec3, v3: Vec3) -> Vec3 {
    (v2 - v1).cross(v3 - v1).normalize()
}

/// Direction used by the backface tests: from the eye toward `v1` under
/// perspective, the fixed view axis under orthographic
pub fn camera_ray(kind: ProjectionKind, v1: Vec3) -> Vec3 {
    match kind {
        ProjectionKind::Perspective => v1.normalize(),
        ProjectionKind::Orthographic => Vec3::FORWARD,
    }
}

/// Backface test; tangent faces count as back faces
pub fn is_back_face(kind: ProjectionKind, v1: Vec3, v2: Vec3, v3: Vec3) -> bool {
    face_normal(v1, v2, v3).dot(camera_ray(kind, v1)) >= 0.0
}

/// The cull check the flat paths run on their already computed face
/// normal; tangent faces are kept
pub fn faces_away(kind: ProjectionKind, normal: Vec3, v1: Vec3) -> bool {
    normal.dot(camera_ray(kind, v1)) > 0.0
}

/// Reject a projected triangle whose depth leaves `[-1, 1]` at any vertex
/// or whose screen bounds miss the viewport entirely
pub fn is_outside_frustum(p1: Vec3, p2: Vec3, p3: Vec3, width: usize, height: usize) -> bool {
    // `!contains` also rejects NaN depths
    if [p1.z, p2.z, p3.z].iter().any(|z| !(-1.0..=1.0).contains(z)) {
        return true;
    }

    let min_x = p1.x.min(p2.x).min(p3.x);
    let max_x = p1.x.max(p2.x).max(p3.x);
    let min_y = p1.y.min(p2.y).min(p3.y);
    let max_y = p1.y.max(p2.y).max(p3.y);

    max_x < 0.0 || min_x > width as f32 || max_y < 0.0 || min_y > height as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_perspective_center_projection() {
        let proj = Projection::perspective(60.0, 800, 600, 0.1, 100.0);
        let p = proj.project(Vec3::new(0.0, 0.0, -5.0), 800, 600);
        assert_abs_diff_eq!(p, Vec3::new(400.0, 300.0, 0.2), epsilon = 1e-4);
    }

    #[test]
    fn test_screen_y_points_down() {
        let proj = Projection::perspective(60.0, 800, 600, 0.1, 100.0);
        let up = proj.project(Vec3::new(0.0, 1.0, -5.0), 800, 600);
        let right = proj.project(Vec3::new(1.0, 0.0, -5.0), 800, 600);
        assert!(up.y < 300.0);
        assert!(right.x > 400.0);
    }

    #[test]
    fn test_orthographic_depth_metric() {
        let proj = Projection::orthographic(800, 600, 0.1, 100.0);
        let near = proj.project(Vec3::new(0.0, 0.0, -0.1), 800, 600);
        let far = proj.project(Vec3::new(0.0, 0.0, -100.0), 800, 600);
        assert_abs_diff_eq!(near.z, 1.0, epsilon = 1e-5);
        assert_abs_diff_eq!(far.z, -1.0, epsilon = 1e-5);
        // Nearer gets the smaller key
        let near_key = Projection::depth_key(ProjectionKind::Orthographic, near.z);
        let far_key = Projection::depth_key(ProjectionKind::Orthographic, far.z);
        assert!(near_key < far_key);
    }

    #[test]
    fn test_perspective_depth_key_is_distance() {
        assert_abs_diff_eq!(Projection::depth_key(ProjectionKind::Perspective, 0.2), 5.0, epsilon = 1e-5);
    }

    #[test]
    fn test_winding_flips_backface() {
        let a = Vec3::new(-1.0, -1.0, -5.0);
        let b = Vec3::new(1.0, -1.0, -5.0);
        let c = Vec3::new(0.0, 1.0, -5.0);
        for kind in [ProjectionKind::Perspective, ProjectionKind::Orthographic] {
            assert!(!is_back_face(kind, a, b, c));
            assert!(is_back_face(kind, a, c, b));
        }
    }

    #[test]
    fn test_tangent_face_thresholds() {
        // Edge-on to the viewer: normal is perpendicular to the ray through v1
        let a = Vec3::new(0.0, -1.0, -5.0);
        let b = Vec3::new(0.0, 1.0, -5.0);
        let c = Vec3::new(0.0, 0.0, -8.0);
        let kind = ProjectionKind::Orthographic;
        let n = face_normal(a, b, c);
        assert_abs_diff_eq!(n.dot(Vec3::FORWARD), 0.0);
        assert!(is_back_face(kind, a, b, c));
        assert!(!faces_away(kind, n, a));
    }

    #[test]
    fn test_frustum_rejects_depth_outside_range() {
        let p = |x: f32, y: f32, z: f32| Vec3::new(x, y, z);
        assert!(is_outside_frustum(p(10.0, 10.0, 1.5), p(20.0, 10.0, 1.2), p(10.0, 20.0, 3.0), 100, 100));
        assert!(is_outside_frustum(p(10.0, 10.0, 0.5), p(20.0, 10.0, -1.5), p(10.0, 20.0, 0.5), 100, 100));
        assert!(!is_outside_frustum(p(10.0, 10.0, 0.5), p(20.0, 10.0, 0.5), p(10.0, 20.0, 0.5), 100, 100));
    }

    #[test]
    fn test_frustum_rejects_offscreen_bounds() {
        let p = |x: f32, y: f32| Vec3::new(x, y, 0.5);
        assert!(is_outside_frustum(p(-30.0, 10.0), p(-20.0, 10.0), p(-25.0, 20.0), 100, 100));
        assert!(is_outside_frustum(p(10.0, 110.0), p(20.0, 120.0), p(15.0, 130.0), 100, 100));
        // Straddling the edge is kept whole
        assert!(!is_outside_frustum(p(-30.0, 10.0), p(20.0, 10.0), p(-25.0, 20.0), 100, 100));
    }

    #[test]
    fn test_vertex_too_close_is_rejected() {
        let proj = Projection::perspective(60.0, 800, 600, 0.1, 100.0);
        let p1 = proj.project(Vec3::new(0.0, 0.0, -0.5), 800, 600);
        let p2 = proj.project(Vec3::new(0.1, 0.0, -0.5), 800, 600);
        let p3 = proj.project(Vec3::new(0.0, 0.1, -0.5), 800, 600);
        assert!(p1.z > 1.0);
        assert!(is_outside_frustum(p1, p2, p3, 800, 600));
    }
}
