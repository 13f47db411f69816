//! A drawable model: mesh, optional texture, colors and a transform

use crate::rasterizer::{
    draw_flat, draw_phong, draw_textured_flat, draw_textured_phong, draw_textured_unlit, draw_unlit,
    draw_wireframe, Camera, Color, DrawStats, Light, Lighting, Mat4, Mesh, PixelSink, Projection,
    RenderContext, RenderMode, Texture, Vec3,
};

#[derive(Debug, Clone)]
pub struct Model {
    pub mesh: Mesh,
    pub texture: Option<Texture>,
    pub color: Color,
    pub wire_color: Color,
    pub translation: Vec3,
    /// Pitch, yaw, roll in degrees
    pub rotation: Vec3,
    pub scale: f32,
    /// Whether wireframe mode skips back faces
    pub cull_wireframe: bool,
}

impl Model {
    pub fn new(mesh: Mesh, color: Color, wire_color: Color) -> Self {
        Self {
            mesh,
            texture: None,
            color,
            wire_color,
            translation: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: 1.0,
            cull_wireframe: true,
        }
    }

    pub fn with_texture(mut self, texture: Texture) -> Self {
        self.texture = Some(texture);
        self
    }

    /// Object-to-world matrix: scale, then rotate, then translate
    pub fn model_matrix(&self) -> Mat4 {
        let t = Mat4::translation(self.translation.x, self.translation.y, self.translation.z);
        let r = Mat4::rotation(self.rotation.x, self.rotation.y, self.rotation.z);
        let s = Mat4::scale(self.scale, self.scale, self.scale);
        t * (r * s)
    }

    /// Refresh the mesh's view-space caches for this frame
    pub fn apply_transform(&mut self, camera: &Camera) {
        let model_view = camera.view_matrix() * self.model_matrix();
        self.mesh.transform(&model_view);
    }

    /// Draw in `mode`. Textured modes without a texture draw untextured, and
    /// the flat modes light with the first light only.
    pub fn draw<S: PixelSink + ?Sized>(
        &self,
        mode: RenderMode,
        ctx: &mut RenderContext,
        sink: &mut S,
        projection: &Projection,
        lighting: &Lighting,
    ) -> DrawStats {
        let mesh = &self.mesh;
        // No lights: flat shading falls back to ambient only
        let key_light = lighting
            .lights
            .first()
            .copied()
            .unwrap_or_else(|| Light::new(Vec3::ZERO, Vec3::FORWARD, 0.0));
        let ambient = lighting.ambient;

        match (mode, self.texture.as_ref()) {
            (RenderMode::Wireframe, _) => {
                draw_wireframe(ctx, sink, mesh, projection, self.wire_color, self.cull_wireframe)
            }
            (RenderMode::Unlit, _) | (RenderMode::TexturedUnlit, None) => {
                draw_unlit(ctx, sink, mesh, projection, self.color)
            }
            (RenderMode::Flat, _) | (RenderMode::TexturedFlat, None) => {
                draw_flat(ctx, sink, mesh, projection, self.color, &key_light, ambient)
            }
            (RenderMode::Phong, _) | (RenderMode::TexturedPhong, None) => {
                draw_phong(ctx, sink, mesh, projection, self.color, lighting)
            }
            (RenderMode::TexturedUnlit, Some(tex)) => draw_textured_unlit(ctx, sink, mesh, projection, tex),
            (RenderMode::TexturedFlat, Some(tex)) => {
                draw_textured_flat(ctx, sink, mesh, projection, tex, &key_light, ambient)
            }
            (RenderMode::TexturedPhong, Some(tex)) => {
                draw_textured_phong(ctx, sink, mesh, projection, tex, lighting)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rasterizer::Framebuffer;
    use approx::assert_abs_diff_eq;

    fn cube_at(z: f32) -> Model {
        let mut model = Model::new(Mesh::cube(), Color::WHITE, Color::GREEN);
        model.translation = Vec3::new(0.0, 0.0, z);
        model
    }

    #[test]
    fn test_transform_moves_positions_not_normals() {
        let mut model = cube_at(-5.0);
        model.apply_transform(&Camera::default());
        let first = model.mesh.transformed_positions[0];
        assert_abs_diff_eq!(first, Vec3::new(-1.0, -1.0, -6.0), epsilon = 1e-5);
        assert_eq!(model.mesh.transformed_normals.len(), model.mesh.normals.len());
        for (t, n) in model.mesh.transformed_normals.iter().zip(&model.mesh.normals) {
            assert_abs_diff_eq!(*t, *n, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_scale_applies_before_translation() {
        let mut model = cube_at(-5.0);
        model.scale = 2.0;
        model.apply_transform(&Camera::default());
        assert_abs_diff_eq!(model.mesh.transformed_positions[0], Vec3::new(-2.0, -2.0, -7.0), epsilon = 1e-5);
        // Normals stay unit length under scale
        for n in &model.mesh.transformed_normals {
            assert_abs_diff_eq!(n.len(), 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_rotated_normals_stay_unit() {
        let mut model = cube_at(-5.0);
        model.rotation = Vec3::new(30.0, 45.0, 10.0);
        model.apply_transform(&Camera::looking_at(Vec3::new(1.0, 2.0, 3.0), Vec3::new(0.0, 0.0, -5.0)));
        for n in &model.mesh.transformed_normals {
            assert_abs_diff_eq!(n.len(), 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_cube_draws_in_every_mode() {
        let projection = Projection::perspective(60.0, 160, 120, 0.1, 100.0);
        let lighting = Lighting::new(Vec3::splat(0.2)).with_light(Light::new(Vec3::ZERO, Vec3::new(0.0, 0.0, 1.0), 0.8));
        let mut model = cube_at(-5.0);
        model.rotation = Vec3::new(20.0, 30.0, 0.0);
        model.apply_transform(&Camera::default());

        for mode in RenderMode::ALL {
            let mut ctx = RenderContext::new(160, 120);
            let mut fb = Framebuffer::new(160, 120);
            let stats = model.draw(mode, &mut ctx, &mut fb, &projection, &lighting);
            assert_eq!(stats.triangles, 12, "{mode:?}");
            assert!(stats.back_faces >= 4, "{mode:?}: {stats:?}");
            assert!(stats.pixels > 0, "{mode:?}");
            if mode != RenderMode::Wireframe {
                assert!(fb.pixel(80, 60).unwrap() != 0, "{mode:?}");
            }
        }
    }

    #[test]
    fn test_textured_mode_without_texture_falls_back() {
        let projection = Projection::perspective(60.0, 64, 48, 0.1, 100.0);
        let lighting = Lighting::new(Vec3::ONE);
        let mut model = cube_at(-5.0);
        model.apply_transform(&Camera::default());

        let mut ctx = RenderContext::new(64, 48);
        let mut fb = Framebuffer::new(64, 48);
        model.draw(RenderMode::TexturedPhong, &mut ctx, &mut fb, &projection, &lighting);
        assert_eq!(fb.pixel(32, 24), Some(Color::WHITE.to_packed()));

        let mut ctx = RenderContext::new(64, 48);
        let mut fb = Framebuffer::new(64, 48);
        let textured = model.clone().with_texture(Texture::checkerboard(8, 8, Color::RED, Color::RED).unwrap());
        textured.draw(RenderMode::TexturedPhong, &mut ctx, &mut fb, &projection, &lighting);
        assert_eq!(fb.pixel(32, 24), Some(Color::RED.to_packed()));
    }

    #[test]
    fn test_flat_without_lights_is_ambient() {
        let projection = Projection::perspective(60.0, 64, 48, 0.1, 100.0);
        let mut model = cube_at(-5.0);
        model.apply_transform(&Camera::default());
        let mut ctx = RenderContext::new(64, 48);
        let mut fb = Framebuffer::new(64, 48);
        model.draw(RenderMode::Flat, &mut ctx, &mut fb, &projection, &Lighting::new(Vec3::splat(0.5)));
        assert_eq!(fb.pixel(32, 24), Some(Color::new(127, 127, 127).to_packed()));
    }
}
