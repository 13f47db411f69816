//! Draw entry points: wireframe, unlit, flat, Phong and their textured forms
//!
//! Every fill mode runs the same per-triangle pipeline (backface cull,
//! projection, frustum rejection, scanline fill) and differs only in the
//! color handed back for each fragment.

use std::ops::AddAssign;

use super::depth::RenderContext;
use super::math::Vec3;
use super::project::{face_normal, faces_away, is_back_face, is_outside_frustum, Projection};
use super::raster::{draw_line, fill_triangle, Fragment, PixelSink};
use super::sort::VertexBundle;
use super::types::{Color, Light, Lighting, Mesh, Texture, Triangle};

/// Framebuffer for software rendering
pub struct Framebuffer {
    pub pixels: Vec<u8>, // RGBA, 4 bytes per pixel
    pub width: usize,
    pub height: usize,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            pixels: vec![0; width * height * 4],
            width,
            height,
        }
    }

    pub fn clear(&mut self, color: Color) {
        let bytes = color.to_bytes();
        for px in self.pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&bytes);
        }
    }

    /// Packed `0x00RRGGBB` color at (x, y)
    pub fn pixel(&self, x: usize, y: usize) -> Option<u32> {
        if x < self.width && y < self.height {
            let idx = (y * self.width + x) * 4;
            let p = &self.pixels[idx..idx + 4];
            Some(Color::new(p[0], p[1], p[2]).to_packed())
        } else {
            None
        }
    }
}

impl PixelSink for Framebuffer {
    fn set_pixel(&mut self, x: usize, y: usize, color: u32) {
        if x < self.width && y < self.height {
            let idx = (y * self.width + x) * 4;
            self.pixels[idx..idx + 4].copy_from_slice(&Color::from_packed(color).to_bytes());
        }
    }
}

/// Per-draw counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawStats {
    pub triangles: usize,
    pub back_faces: usize,
    pub outside_frustum: usize,
    pub rasterized: usize,
    pub pixels: usize,
}

impl AddAssign for DrawStats {
    fn add_assign(&mut self, other: DrawStats) {
        self.triangles += other.triangles;
        self.back_faces += other.back_faces;
        self.outside_frustum += other.outside_frustum;
        self.rasterized += other.rasterized;
        self.pixels += other.pixels;
    }
}

/// Which backface check a draw path applies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cull {
    None,
    /// `is_back_face`: tangent faces are culled
    BackFace,
    /// Inline check on the face normal: tangent faces are kept
    FacingAway,
}

/// A triangle that survived culling and projection
struct VisibleFace {
    view: [Vec3; 3],
    screen: [Vec3; 3],
    normal: Vec3,
}

fn visible_face(
    ctx: &RenderContext,
    mesh: &Mesh,
    tri: &Triangle,
    projection: &Projection,
    cull: Cull,
    stats: &mut DrawStats,
) -> Option<VisibleFace> {
    stats.triangles += 1;

    let view = tri.v.map(|i| mesh.transformed_positions[i]);
    let normal = face_normal(view[0], view[1], view[2]);

    let culled = match cull {
        Cull::None => false,
        Cull::BackFace => is_back_face(projection.kind, view[0], view[1], view[2]),
        Cull::FacingAway => faces_away(projection.kind, normal, view[0]),
    };
    if culled {
        stats.back_faces += 1;
        return None;
    }

    let screen = view.map(|v| projection.project(v, ctx.width, ctx.height));
    if is_outside_frustum(screen[0], screen[1], screen[2], ctx.width, ctx.height) {
        stats.outside_frustum += 1;
        return None;
    }

    stats.rasterized += 1;
    Some(VisibleFace { view, screen, normal })
}

/// Flat intensity: ambient plus one light's clamped diffuse term
pub fn flat_intensity(normal: Vec3, light: &Light, ambient: Vec3) -> Vec3 {
    let diffuse = normal.dot(light.direction).clamp(0.0, 1.0);
    (ambient + light.intensity * diffuse).clamp(0.0, 1.0)
}

/// Phong intensity at view-space point `p`: ambient plus the diffuse term of
/// every light, toward each light's position
pub fn phong_intensity(lighting: &Lighting, p: Vec3, normal: Vec3) -> Vec3 {
    let total = lighting.lights.iter().fold(lighting.ambient, |acc, light| {
        let to_light = (light.position - p).normalize();
        let diffuse = normal.dot(to_light).clamp(0.0, 1.0);
        acc + light.intensity * diffuse
    });
    total.clamp(0.0, 1.0)
}

fn sample(texture: &Texture, fragment: &Fragment) -> Color {
    let uv = fragment.uv.unwrap_or_default();
    Color::from_packed(texture.sample(uv.x, uv.y))
}

fn phong_at(lighting: &Lighting, fragment: &Fragment) -> Vec3 {
    phong_intensity(
        lighting,
        fragment.view.unwrap_or_default(),
        fragment.normal.unwrap_or_default(),
    )
}

/// Draw triangle edges only. No depth test.
pub fn draw_wireframe<S: PixelSink + ?Sized>(
    ctx: &mut RenderContext,
    sink: &mut S,
    mesh: &Mesh,
    projection: &Projection,
    color: Color,
    cull_back_face: bool,
) -> DrawStats {
    let mut stats = DrawStats::default();
    let cull = if cull_back_face { Cull::BackFace } else { Cull::None };
    let packed = color.to_packed();

    for tri in &mesh.triangles {
        let Some(face) = visible_face(ctx, mesh, tri, projection, cull, &mut stats) else {
            continue;
        };
        let [p1, p2, p3] = face.screen.map(|p| p.xy());
        stats.pixels += draw_line(ctx, sink, p1, p2, packed);
        stats.pixels += draw_line(ctx, sink, p2, p3, packed);
        stats.pixels += draw_line(ctx, sink, p3, p1, packed);
    }

    log::trace!("wireframe: {:?}", stats);
    stats
}

/// Solid constant color with depth testing
pub fn draw_unlit<S: PixelSink + ?Sized>(
    ctx: &mut RenderContext,
    sink: &mut S,
    mesh: &Mesh,
    projection: &Projection,
    color: Color,
) -> DrawStats {
    let mut stats = DrawStats::default();
    let packed = color.to_packed();

    for tri in &mesh.triangles {
        let Some(face) = visible_face(ctx, mesh, tri, projection, Cull::BackFace, &mut stats) else {
            continue;
        };
        let corners = face.screen.map(VertexBundle::new);
        stats.pixels += fill_triangle(ctx, sink, &corners, projection.kind, |_| packed);
    }

    log::trace!("unlit: {:?}", stats);
    stats
}

/// One lighting computation per triangle from its face normal
pub fn draw_flat<S: PixelSink + ?Sized>(
    ctx: &mut RenderContext,
    sink: &mut S,
    mesh: &Mesh,
    projection: &Projection,
    color: Color,
    light: &Light,
    ambient: Vec3,
) -> DrawStats {
    let mut stats = DrawStats::default();

    for tri in &mesh.triangles {
        let Some(face) = visible_face(ctx, mesh, tri, projection, Cull::FacingAway, &mut stats) else {
            continue;
        };
        let shaded = color.modulate(flat_intensity(face.normal, light, ambient)).to_packed();
        let corners = face.screen.map(VertexBundle::new);
        stats.pixels += fill_triangle(ctx, sink, &corners, projection.kind, |_| shaded);
    }

    log::trace!("flat: {:?}", stats);
    stats
}

/// Per-pixel lighting from interpolated view position and vertex normals
pub fn draw_phong<S: PixelSink + ?Sized>(
    ctx: &mut RenderContext,
    sink: &mut S,
    mesh: &Mesh,
    projection: &Projection,
    color: Color,
    lighting: &Lighting,
) -> DrawStats {
    let mut stats = DrawStats::default();

    for tri in &mesh.triangles {
        let Some(face) = visible_face(ctx, mesh, tri, projection, Cull::BackFace, &mut stats) else {
            continue;
        };
        let corners = phong_corners(mesh, tri, &face);
        stats.pixels += fill_triangle(ctx, sink, &corners, projection.kind, |f| {
            color.modulate(phong_at(lighting, f)).to_packed()
        });
    }

    log::trace!("phong: {:?}", stats);
    stats
}

/// Texture color, no lighting
pub fn draw_textured_unlit<S: PixelSink + ?Sized>(
    ctx: &mut RenderContext,
    sink: &mut S,
    mesh: &Mesh,
    projection: &Projection,
    texture: &Texture,
) -> DrawStats {
    let mut stats = DrawStats::default();

    for tri in &mesh.triangles {
        let Some(face) = visible_face(ctx, mesh, tri, projection, Cull::BackFace, &mut stats) else {
            continue;
        };
        let corners = textured_corners(mesh, tri, &face);
        stats.pixels += fill_triangle(ctx, sink, &corners, projection.kind, |f| {
            sample(texture, f).to_packed()
        });
    }

    log::trace!("textured unlit: {:?}", stats);
    stats
}

/// Texture color scaled by one per-triangle lighting computation
pub fn draw_textured_flat<S: PixelSink + ?Sized>(
    ctx: &mut RenderContext,
    sink: &mut S,
    mesh: &Mesh,
    projection: &Projection,
    texture: &Texture,
    light: &Light,
    ambient: Vec3,
) -> DrawStats {
    let mut stats = DrawStats::default();

    for tri in &mesh.triangles {
        let Some(face) = visible_face(ctx, mesh, tri, projection, Cull::FacingAway, &mut stats) else {
            continue;
        };
        let intensity = flat_intensity(face.normal, light, ambient);
        let corners = textured_corners(mesh, tri, &face);
        stats.pixels += fill_triangle(ctx, sink, &corners, projection.kind, |f| {
            sample(texture, f).modulate(intensity).to_packed()
        });
    }

    log::trace!("textured flat: {:?}", stats);
    stats
}

/// Texture color scaled by per-pixel lighting
pub fn draw_textured_phong<S: PixelSink + ?Sized>(
    ctx: &mut RenderContext,
    sink: &mut S,
    mesh: &Mesh,
    projection: &Projection,
    texture: &Texture,
    lighting: &Lighting,
) -> DrawStats {
    let mut stats = DrawStats::default();

    for tri in &mesh.triangles {
        let Some(face) = visible_face(ctx, mesh, tri, projection, Cull::BackFace, &mut stats) else {
            continue;
        };
        let corners = phong_corners(mesh, tri, &face);
        let corners = textured_uvs(mesh, tri, corners);
        stats.pixels += fill_triangle(ctx, sink, &corners, projection.kind, |f| {
            sample(texture, f).modulate(phong_at(lighting, f)).to_packed()
        });
    }

    log::trace!("textured phong: {:?}", stats);
    stats
}

fn phong_corners(mesh: &Mesh, tri: &Triangle, face: &VisibleFace) -> [VertexBundle; 3] {
    let mut corners = face.screen.map(VertexBundle::new);
    for (i, corner) in corners.iter_mut().enumerate() {
        *corner = corner
            .with_view(face.view[i])
            .with_normal(mesh.transformed_normals[tri.n[i]]);
    }
    corners
}

fn textured_corners(mesh: &Mesh, tri: &Triangle, face: &VisibleFace) -> [VertexBundle; 3] {
    textured_uvs(mesh, tri, face.screen.map(VertexBundle::new))
}

fn textured_uvs(mesh: &Mesh, tri: &Triangle, mut corners: [VertexBundle; 3]) -> [VertexBundle; 3] {
    for (i, corner) in corners.iter_mut().enumerate() {
        *corner = corner.with_uv(mesh.uvs[tri.uv[i]]);
    }
    corners
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rasterizer::math::Vec2;
    use crate::rasterizer::project::ProjectionKind;

    const W: usize = 64;
    const H: usize = 48;

    /// One triangle facing the camera at z = -5, large enough to cover the
    /// screen center
    fn facing_triangle(z: f32) -> Mesh {
        let positions = vec![Vec3::new(-2.0, -2.0, z), Vec3::new(2.0, -2.0, z), Vec3::new(0.0, 2.0, z)];
        let normals = vec![Vec3::new(0.0, 0.0, 1.0)];
        let uvs = vec![Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(0.5, 1.0)];
        Mesh::new(positions, normals, uvs, vec![Triangle::new([0, 1, 2], [0, 1, 2], [0, 0, 0])])
    }

    fn reversed(mut mesh: Mesh) -> Mesh {
        for tri in &mut mesh.triangles {
            tri.v.swap(1, 2);
            tri.uv.swap(1, 2);
        }
        mesh
    }

    fn setup() -> (RenderContext, Framebuffer, Projection) {
        (
            RenderContext::new(W, H),
            Framebuffer::new(W, H),
            Projection::perspective(60.0, W, H, 0.1, 100.0),
        )
    }

    fn center(fb: &Framebuffer) -> u32 {
        fb.pixel(W / 2, H / 2).unwrap()
    }

    #[test]
    fn test_framebuffer_roundtrips_packed_color() {
        let mut fb = Framebuffer::new(2, 2);
        fb.clear(Color::new(1, 2, 3));
        fb.set_pixel(1, 0, 0x00AB_CDEF);
        assert_eq!(fb.pixel(1, 0), Some(0x00AB_CDEF));
        assert_eq!(fb.pixel(0, 1), Some(0x0001_0203));
        assert_eq!(fb.pixel(2, 0), None);
        fb.set_pixel(5, 5, 0);
    }

    #[test]
    fn test_unlit_fills_center() {
        let (mut ctx, mut fb, proj) = setup();
        let stats = draw_unlit(&mut ctx, &mut fb, &facing_triangle(-5.0), &proj, Color::RED);
        assert_eq!(stats.rasterized, 1);
        assert!(stats.pixels > 0);
        assert_eq!(center(&fb), Color::RED.to_packed());
        assert!(ctx.depth.get(W / 2, H / 2).unwrap() < f32::MAX);
    }

    #[test]
    fn test_unlit_culls_reversed_winding() {
        let (mut ctx, mut fb, proj) = setup();
        let stats = draw_unlit(&mut ctx, &mut fb, &reversed(facing_triangle(-5.0)), &proj, Color::RED);
        assert_eq!(stats.back_faces, 1);
        assert_eq!(stats.pixels, 0);
        assert_eq!(center(&fb), 0);
    }

    #[test]
    fn test_triangle_behind_near_plane_rejected() {
        let (mut ctx, mut fb, proj) = setup();
        let stats = draw_unlit(&mut ctx, &mut fb, &facing_triangle(-0.5), &proj, Color::RED);
        assert_eq!(stats.outside_frustum, 1);
        assert_eq!(stats.pixels, 0);
    }

    fn single_triangle(positions: [Vec3; 3]) -> Mesh {
        let triangles = vec![Triangle::new([0, 1, 2], [0, 0, 0], [0, 0, 0])];
        Mesh::new(positions.to_vec(), vec![Vec3::new(0.0, 0.0, 1.0)], Vec::new(), triangles)
    }

    #[test]
    fn test_unlit_huge_triangle_stays_in_viewport() {
        let (mut ctx, mut fb, proj) = setup();
        let mesh = single_triangle([
            Vec3::new(0.0, 1e10, -2.0),
            Vec3::new(-1.0, -1e10, -2.0),
            Vec3::new(1.0, -1e10, -2.0),
        ]);
        let stats = draw_unlit(&mut ctx, &mut fb, &mesh, &proj, Color::RED);
        assert_eq!(stats.back_faces + stats.outside_frustum, 0);
        assert!(stats.pixels <= W * H);
    }

    #[test]
    fn test_unlit_wide_triangle_near_camera_fills_viewport_rows() {
        let (mut ctx, mut fb, proj) = setup();
        let mesh = single_triangle([
            Vec3::new(-2000.0, -1.0, -1.05),
            Vec3::new(2000.0, -1.0, -1.05),
            Vec3::new(0.0, 1.0, -1.05),
        ]);
        let stats = draw_unlit(&mut ctx, &mut fb, &mesh, &proj, Color::RED);
        assert_eq!(stats.rasterized, 1);
        assert!(stats.pixels > 0 && stats.pixels <= W * H);
        assert_eq!(center(&fb), Color::RED.to_packed());
    }

    #[test]
    fn test_nearer_mesh_occludes_regardless_of_order() {
        let near = facing_triangle(-4.0);
        let far = facing_triangle(-6.0);

        let (mut ctx, mut fb, proj) = setup();
        draw_unlit(&mut ctx, &mut fb, &near, &proj, Color::GREEN);
        draw_unlit(&mut ctx, &mut fb, &far, &proj, Color::BLUE);
        assert_eq!(center(&fb), Color::GREEN.to_packed());

        let (mut ctx, mut fb, proj) = setup();
        draw_unlit(&mut ctx, &mut fb, &far, &proj, Color::BLUE);
        draw_unlit(&mut ctx, &mut fb, &near, &proj, Color::GREEN);
        assert_eq!(center(&fb), Color::GREEN.to_packed());
    }

    #[test]
    fn test_orthographic_depth_order_matches_perspective() {
        let near = facing_triangle(-4.0);
        let far = facing_triangle(-6.0);
        let mut ctx = RenderContext::new(W, H);
        let mut fb = Framebuffer::new(W, H);
        let proj = Projection::orthographic(W, H, 0.1, 100.0);
        assert_eq!(proj.kind, ProjectionKind::Orthographic);

        draw_unlit(&mut ctx, &mut fb, &far, &proj, Color::BLUE);
        draw_unlit(&mut ctx, &mut fb, &near, &proj, Color::GREEN);
        draw_unlit(&mut ctx, &mut fb, &far, &proj, Color::BLUE);
        assert_eq!(center(&fb), Color::GREEN.to_packed());
    }

    #[test]
    fn test_flat_intensity_formula() {
        let light = Light::new(Vec3::ZERO, Vec3::new(0.0, 0.0, 1.0), 0.5);
        let lit = flat_intensity(Vec3::new(0.0, 0.0, 1.0), &light, Vec3::splat(0.2));
        assert_eq!(lit, Vec3::splat(0.7));
        let unlit = flat_intensity(Vec3::new(0.0, 0.0, -1.0), &light, Vec3::splat(0.2));
        assert_eq!(unlit, Vec3::splat(0.2));
        let strong = Light::new(Vec3::ZERO, Vec3::new(0.0, 0.0, 1.0), 4.0);
        assert_eq!(flat_intensity(Vec3::new(0.0, 0.0, 1.0), &strong, Vec3::ZERO), Vec3::ONE);
    }

    #[test]
    fn test_flat_scales_color() {
        let (mut ctx, mut fb, proj) = setup();
        let light = Light::new(Vec3::ZERO, Vec3::new(0.0, 0.0, 1.0), 0.5);
        draw_flat(&mut ctx, &mut fb, &facing_triangle(-5.0), &proj, Color::WHITE, &light, Vec3::ZERO);
        assert_eq!(center(&fb), Color::new(127, 127, 127).to_packed());
    }

    #[test]
    fn test_phong_brighter_toward_light() {
        let (mut ctx, mut fb, proj) = setup();
        // Light just in front of the left part of the triangle
        let lighting = Lighting::new(Vec3::ZERO).with_light(Light::new(Vec3::new(-1.5, -1.0, -4.0), Vec3::FORWARD, 1.0));
        let mesh = facing_triangle(-5.0);
        let stats = draw_phong(&mut ctx, &mut fb, &mesh, &proj, Color::WHITE, &lighting);
        assert!(stats.pixels > 0);

        let near_light = proj.project(Vec3::new(-1.0, -1.0, -5.0), W, H);
        let far_side = proj.project(Vec3::new(1.5, -1.5, -5.0), W, H);
        let bright = Color::from_packed(fb.pixel(near_light.x as usize, near_light.y as usize).unwrap());
        let dim = Color::from_packed(fb.pixel(far_side.x as usize, far_side.y as usize).unwrap());
        assert!(bright.r > dim.r, "{bright:?} vs {dim:?}");
    }

    #[test]
    fn test_phong_sums_lights_and_clamps() {
        let p = Vec3::new(0.0, 0.0, -5.0);
        let n = Vec3::new(0.0, 0.0, 1.0);
        let front = Light::new(Vec3::new(0.0, 0.0, 0.0), Vec3::FORWARD, 0.4);
        let one = Lighting::new(Vec3::splat(0.1)).with_light(front);
        assert!((phong_intensity(&one, p, n).x - 0.5).abs() < 1e-6);
        let many = one.clone().with_light(front).with_light(front);
        assert_eq!(phong_intensity(&many, p, n), Vec3::ONE);
        let behind = Lighting::new(Vec3::splat(0.1)).with_light(Light::new(Vec3::new(0.0, 0.0, -10.0), Vec3::FORWARD, 1.0));
        assert_eq!(phong_intensity(&behind, p, n), Vec3::splat(0.1));
    }

    #[test]
    fn test_textured_unlit_uses_texels() {
        let (mut ctx, mut fb, proj) = setup();
        let texture = Texture::checkerboard(8, 8, Color::RED, Color::BLUE).unwrap();
        let stats = draw_textured_unlit(&mut ctx, &mut fb, &facing_triangle(-5.0), &proj, &texture);
        assert!(stats.pixels > 0);
        let mut seen = std::collections::HashSet::new();
        for y in 0..H {
            for x in 0..W {
                let c = fb.pixel(x, y).unwrap();
                if c != 0 {
                    seen.insert(c);
                }
            }
        }
        assert!(seen.contains(&Color::RED.to_packed()));
        assert!(seen.contains(&Color::BLUE.to_packed()));
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn test_textured_flat_and_phong_modulate() {
        let texture = Texture::from_pixels(1, 1, vec![Color::WHITE.to_packed()]).unwrap();
        let light = Light::new(Vec3::ZERO, Vec3::new(0.0, 0.0, 1.0), 0.5);

        let (mut ctx, mut fb, proj) = setup();
        draw_textured_flat(&mut ctx, &mut fb, &facing_triangle(-5.0), &proj, &texture, &light, Vec3::ZERO);
        assert_eq!(center(&fb), Color::new(127, 127, 127).to_packed());

        let (mut ctx, mut fb, proj) = setup();
        let lighting = Lighting::new(Vec3::splat(0.25));
        draw_textured_phong(&mut ctx, &mut fb, &facing_triangle(-5.0), &proj, &texture, &lighting);
        assert_eq!(center(&fb), Color::new(63, 63, 63).to_packed());
    }

    #[test]
    fn test_wireframe_ignores_depth() {
        let (mut ctx, mut fb, proj) = setup();
        let mesh = facing_triangle(-5.0);
        draw_unlit(&mut ctx, &mut fb, &facing_triangle(-2.0), &proj, Color::BLUE);
        let before = ctx.depth.clone();
        let stats = draw_wireframe(&mut ctx, &mut fb, &mesh, &proj, Color::GREEN, true);
        assert!(stats.pixels > 0);
        assert_eq!(ctx.depth.as_slice(), before.as_slice());

        // Edges are drawn over the nearer fill
        let corner = proj.project(Vec3::new(-2.0, -2.0, -5.0), W, H);
        assert_eq!(fb.pixel(corner.x as usize, corner.y as usize), Some(Color::GREEN.to_packed()));
    }

    #[test]
    fn test_wireframe_cull_flag() {
        let (mut ctx, mut fb, proj) = setup();
        let mesh = reversed(facing_triangle(-5.0));
        assert_eq!(draw_wireframe(&mut ctx, &mut fb, &mesh, &proj, Color::GREEN, true).pixels, 0);
        assert!(draw_wireframe(&mut ctx, &mut fb, &mesh, &proj, Color::GREEN, false).pixels > 0);
    }

    #[test]
    fn test_stats_accumulate() {
        let mut total = DrawStats::default();
        total += DrawStats { triangles: 2, back_faces: 1, outside_frustum: 0, rasterized: 1, pixels: 10 };
        total += DrawStats { triangles: 1, back_faces: 0, outside_frustum: 1, rasterized: 0, pixels: 0 };
        assert_eq!(total, DrawStats { triangles: 3, back_faces: 1, outside_frustum: 1, rasterized: 1, pixels: 10 });
    }
}
