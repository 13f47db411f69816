//! Scene loading and saving
//!
//! Uses RON (Rusty Object Notation) for human-readable scene files. A scene
//! names the resolution, projection, camera, lights and the one model to draw.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::model::Model;
use super::obj::{load_obj, ObjError};
use crate::rasterizer::{
    Camera, Color, Light, Lighting, Mesh, Projection, ProjectionKind, RenderMode, Texture, TextureError, Vec3,
    DEFAULT_HEIGHT, DEFAULT_WIDTH,
};

/// Error type for scene loading
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("Serialize error: {0}")]
    Serialize(#[from] ron::Error),
    #[error("mesh: {0}")]
    Obj(#[from] ObjError),
    #[error("texture: {0}")]
    Texture(#[from] TextureError),
    #[error("invalid resolution {width}x{height}")]
    InvalidResolution { width: usize, height: usize },
    #[error("invalid clip planes: near {near}, far {far}")]
    InvalidClipPlanes { near: f32, far: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    pub kind: ProjectionKind,
    /// Vertical field of view in degrees
    pub fov: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            kind: ProjectionKind::Perspective,
            fov: 60.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: Vec3,
    pub target: Vec3,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            target: Vec3::FORWARD,
        }
    }
}

/// A light given either a scalar strength or a color. The color wins when
/// both are present; neither means full white.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightConfig {
    pub position: Vec3,
    pub direction: Vec3,
    #[serde(default)]
    pub strength: Option<f32>,
    #[serde(default)]
    pub color: Option<Color>,
}

impl LightConfig {
    pub fn build(&self) -> Light {
        match (self.color, self.strength) {
            (Some(color), _) => Light::colored(self.position, self.direction, color),
            (None, strength) => Light::new(self.position, self.direction, strength.unwrap_or(1.0)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum MeshSource {
    #[default]
    Cube,
    Obj(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub mesh: MeshSource,
    pub texture: Option<PathBuf>,
    pub color: Color,
    pub wire_color: Color,
    pub translation: Vec3,
    /// Pitch, yaw, roll in degrees
    pub rotation: Vec3,
    pub scale: f32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            mesh: MeshSource::Cube,
            texture: None,
            color: Color::new(200, 200, 200),
            wire_color: Color::GREEN,
            translation: Vec3::new(0.0, 0.0, -5.0),
            rotation: Vec3::ZERO,
            scale: 1.0,
        }
    }
}

/// Everything needed to set up a frame loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub width: usize,
    pub height: usize,
    pub projection: ProjectionConfig,
    pub camera: CameraConfig,
    /// Ambient RGB intensity, 0.0-1.0 per channel
    pub ambient: Vec3,
    pub lights: Vec<LightConfig>,
    pub model: ModelConfig,
    pub render_mode: RenderMode,
    pub cull_wireframe: bool,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            projection: ProjectionConfig::default(),
            camera: CameraConfig::default(),
            ambient: Vec3::splat(0.1),
            lights: vec![LightConfig {
                position: Vec3::ZERO,
                direction: Vec3::new(0.0, 0.0, 1.0),
                strength: Some(0.9),
                color: None,
            }],
            model: ModelConfig::default(),
            render_mode: RenderMode::default(),
            cull_wireframe: true,
        }
    }
}

impl SceneConfig {
    pub fn validate(&self) -> Result<(), SceneError> {
        if self.width == 0 || self.height == 0 {
            return Err(SceneError::InvalidResolution {
                width: self.width,
                height: self.height,
            });
        }
        let ProjectionConfig { near, far, .. } = self.projection;
        if !(near > 0.0 && far > near) {
            return Err(SceneError::InvalidClipPlanes { near, far });
        }
        Ok(())
    }

    /// Projection of the given kind with this scene's parameters
    pub fn build_projection(&self, kind: ProjectionKind) -> Projection {
        let p = &self.projection;
        match kind {
            ProjectionKind::Perspective => Projection::perspective(p.fov, self.width, self.height, p.near, p.far),
            ProjectionKind::Orthographic => Projection::orthographic(self.width, self.height, p.near, p.far),
        }
    }

    pub fn build_camera(&self) -> Camera {
        Camera::looking_at(self.camera.position, self.camera.target)
    }

    pub fn build_lighting(&self) -> Lighting {
        self.lights
            .iter()
            .fold(Lighting::new(self.ambient), |lighting, light| lighting.with_light(light.build()))
    }

    /// Load the mesh and texture and place the model
    pub fn build_model(&self) -> Result<Model, SceneError> {
        let cfg = &self.model;
        let mesh = match &cfg.mesh {
            MeshSource::Cube => Mesh::cube(),
            MeshSource::Obj(path) => load_obj(path)?,
        };

        let mut model = Model::new(mesh, cfg.color, cfg.wire_color);
        if let Some(path) = &cfg.texture {
            model = model.with_texture(Texture::from_file(path)?);
        }
        model.translation = cfg.translation;
        model.rotation = cfg.rotation;
        model.scale = cfg.scale;
        model.cull_wireframe = self.cull_wireframe;
        Ok(model)
    }

    /// Make relative asset paths relative to `dir`
    fn resolve_paths(&mut self, dir: &Path) {
        if let MeshSource::Obj(path) = &mut self.model.mesh {
            if path.is_relative() {
                *path = dir.join(&*path);
            }
        }
        if let Some(path) = &mut self.model.texture {
            if path.is_relative() {
                *path = dir.join(&*path);
            }
        }
    }
}

/// Load a scene from a RON file. Asset paths inside it are taken relative to
/// the file's directory.
pub fn load_scene<P: AsRef<Path>>(path: P) -> Result<SceneConfig, SceneError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    let mut scene = load_scene_from_str(&contents)?;

    if let Some(dir) = path.parent() {
        scene.resolve_paths(dir);
    }

    log::info!("loaded scene {}", path.display());
    Ok(scene)
}

/// Save a scene to a RON file
pub fn save_scene<P: AsRef<Path>>(scene: &SceneConfig, path: P) -> Result<(), SceneError> {
    let config = ron::ser::PrettyConfig::new()
        .depth_limit(4)
        .indentor("  ".to_string());

    let contents = ron::ser::to_string_pretty(scene, config)?;
    fs::write(path, contents)?;
    Ok(())
}

/// Load a scene from a RON string (for embedded scenes or testing)
pub fn load_scene_from_str(s: &str) -> Result<SceneConfig, SceneError> {
    let scene: SceneConfig = ron::from_str(s)?;
    scene.validate()?;
    Ok(scene)
}
