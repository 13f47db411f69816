//! softrender: interactive viewer for the CPU rasterizer
//!
//! Keys:
//! - W/S, A/D, E/Q: move the model along z, x, y
//! - J/L, O/U, K/I: pitch, yaw, roll
//! - +/-: scale
//! - Left/Right: cycle render mode
//! - 0/1: perspective / orthographic
//! - Shift: fine steps
//!
//! Usage: `softrender [scene.ron]` (defaults to `assets/scene.ron`)

use std::path::PathBuf;

use macroquad::prelude::*;
use softrender::rasterizer::{
    Color as Rgb, DrawStats, Framebuffer, Mesh, ProjectionKind, RenderContext, RenderMode, DEFAULT_HEIGHT,
    DEFAULT_WIDTH,
};
use softrender::world::{load_scene, Model, SceneConfig};
use softrender::VERSION;

const DEFAULT_SCENE: &str = "assets/scene.ron";

/// Model units per second
const MOVE_SPEED: f32 = 2.0;
/// Degrees per second
const TURN_SPEED: f32 = 60.0;
/// Multiplier while Shift is held
const FINE_FACTOR: f32 = 0.25;

fn window_conf() -> Conf {
    Conf {
        window_title: format!("softrender v{}", VERSION),
        window_width: DEFAULT_WIDTH as i32,
        window_height: DEFAULT_HEIGHT as i32,
        window_resizable: true,
        ..Default::default()
    }
}

fn startup_scene() -> SceneConfig {
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SCENE));

    match load_scene(&path) {
        Ok(scene) => scene,
        Err(e) => {
            log::warn!("could not load {}: {}; using the default scene", path.display(), e);
            SceneConfig::default()
        }
    }
}

fn startup_model(scene: &SceneConfig) -> Model {
    match scene.build_model() {
        Ok(model) => model,
        Err(e) => {
            log::warn!("could not build model: {}; using the built-in cube", e);
            let mut model = Model::new(Mesh::cube(), scene.model.color, scene.model.wire_color);
            model.translation = scene.model.translation;
            model.rotation = scene.model.rotation;
            model.scale = scene.model.scale;
            model.cull_wireframe = scene.cull_wireframe;
            model
        }
    }
}

/// Apply held keys to the model transform and pressed keys to the modes
fn handle_input(model: &mut Model, mode: &mut RenderMode, kind: &mut ProjectionKind, dt: f32) {
    let fine = is_key_down(KeyCode::LeftShift) || is_key_down(KeyCode::RightShift);
    let factor = if fine { FINE_FACTOR } else { 1.0 };
    let step = MOVE_SPEED * factor * dt;
    let turn = TURN_SPEED * factor * dt;

    let axis = |pos: KeyCode, neg: KeyCode| -> f32 {
        let mut v = 0.0;
        if is_key_down(pos) {
            v += 1.0;
        }
        if is_key_down(neg) {
            v -= 1.0;
        }
        v
    };

    model.translation.z += axis(KeyCode::W, KeyCode::S) * step;
    model.translation.x += axis(KeyCode::A, KeyCode::D) * step;
    model.translation.y += axis(KeyCode::E, KeyCode::Q) * step;

    model.rotation.x += axis(KeyCode::J, KeyCode::L) * turn;
    model.rotation.y += axis(KeyCode::O, KeyCode::U) * turn;
    model.rotation.z += axis(KeyCode::K, KeyCode::I) * turn;

    let grow = is_key_down(KeyCode::KpAdd) || is_key_down(KeyCode::Equal);
    let shrink = is_key_down(KeyCode::KpSubtract) || is_key_down(KeyCode::Minus);
    if grow {
        model.scale += step;
    }
    if shrink {
        model.scale = (model.scale - step).max(0.01);
    }

    if is_key_pressed(KeyCode::Left) {
        *mode = mode.prev();
    }
    if is_key_pressed(KeyCode::Right) {
        *mode = mode.next();
    }
    if is_key_pressed(KeyCode::Key0) || is_key_pressed(KeyCode::Kp0) {
        *kind = ProjectionKind::Perspective;
    }
    if is_key_pressed(KeyCode::Key1) || is_key_pressed(KeyCode::Kp1) {
        *kind = ProjectionKind::Orthographic;
    }
}

fn hud_line(mode: RenderMode, kind: ProjectionKind, stats: &DrawStats) -> String {
    let projection = match kind {
        ProjectionKind::Perspective => "perspective",
        ProjectionKind::Orthographic => "orthographic",
    };
    format!(
        "{} | {} | tris {} culled {} clipped {} drawn {} | px {} | {} fps",
        mode.name(),
        projection,
        stats.triangles,
        stats.back_faces,
        stats.outside_frustum,
        stats.rasterized,
        stats.pixels,
        get_fps()
    )
}

#[macroquad::main(window_conf)]
async fn main() {
    env_logger::init();

    let scene = startup_scene();
    let camera = scene.build_camera();
    let lighting = scene.build_lighting();
    let mut model = startup_model(&scene);
    let mut mode = scene.render_mode;
    let mut kind = scene.projection.kind;

    let mut fb = Framebuffer::new(scene.width, scene.height);
    let mut ctx = RenderContext::new(scene.width, scene.height);

    log::info!(
        "softrender v{}: {}x{}, {} triangles",
        VERSION,
        scene.width,
        scene.height,
        model.mesh.triangles.len()
    );

    loop {
        if is_key_pressed(KeyCode::Escape) {
            break;
        }

        handle_input(&mut model, &mut mode, &mut kind, get_frame_time());

        let projection = scene.build_projection(kind);
        model.apply_transform(&camera);

        fb.clear(Rgb::BLACK);
        ctx.clear_depth();
        let stats = model.draw(mode, &mut ctx, &mut fb, &projection, &lighting);

        // Scale the framebuffer to the window, keeping its aspect ratio
        let texture = Texture2D::from_rgba8(fb.width as u16, fb.height as u16, &fb.pixels);
        texture.set_filter(FilterMode::Nearest);

        let (screen_w, screen_h) = (screen_width(), screen_height());
        let scale = (screen_w / fb.width as f32).min(screen_h / fb.height as f32);
        let (draw_w, draw_h) = (fb.width as f32 * scale, fb.height as f32 * scale);

        clear_background(BLACK);
        draw_texture_ex(
            &texture,
            (screen_w - draw_w) * 0.5,
            (screen_h - draw_h) * 0.5,
            WHITE,
            DrawTextureParams {
                dest_size: Some(vec2(draw_w, draw_h)),
                ..Default::default()
            },
        );
        draw_text(&hud_line(mode, kind, &stats), 10.0, 20.0, 20.0, WHITE);

        next_frame().await;
    }
}
