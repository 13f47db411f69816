//! Core types for the rasterizer

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::math::{Mat4, Vec2, Vec3};

/// RGB color (0-255 per channel). Packs to `0x00RRGGBB`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0 };
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255 };
    pub const RED: Color = Color { r: 255, g: 0, b: 0 };
    pub const GREEN: Color = Color { r: 0, g: 255, b: 0 };
    pub const BLUE: Color = Color { r: 0, g: 0, b: 255 };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn from_packed(packed: u32) -> Self {
        Self {
            r: ((packed >> 16) & 0xFF) as u8,
            g: ((packed >> 8) & 0xFF) as u8,
            b: (packed & 0xFF) as u8,
        }
    }

    pub const fn to_packed(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | (self.b as u32)
    }

    /// Apply shading (multiply by intensity 0.0-1.0)
    pub fn shade(self, intensity: f32) -> Self {
        self.modulate(Vec3::splat(intensity))
    }

    /// Per-channel shading by an RGB intensity in 0.0-1.0
    pub fn modulate(self, intensity: Vec3) -> Self {
        let i = intensity.clamp(0.0, 1.0);
        Self {
            r: (self.r as f32 * i.x) as u8,
            g: (self.g as f32 * i.y) as u8,
            b: (self.b as f32 * i.z) as u8,
        }
    }

    /// Channels as 0.0-1.0 floats
    pub fn to_unit(self) -> Vec3 {
        Vec3::new(self.r as f32, self.g as f32, self.b as f32).scale(1.0 / 255.0)
    }

    /// Convert to [u8; 4] RGBA with opaque alpha
    pub fn to_bytes(self) -> [u8; 4] {
        [self.r, self.g, self.b, 255]
    }
}

/// Texture loading failures
#[derive(Debug, Error)]
pub enum TextureError {
    #[error("failed to decode image: {0}")]
    Image(#[from] image::ImageError),
    #[error("texture size {width}x{height} is not a power of two")]
    NotPowerOfTwo { width: usize, height: usize },
    #[error("expected {expected} pixels, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },
}

/// Texture with power-of-two dimensions, packed `0x00RRGGBB` texels
#[derive(Debug, Clone)]
pub struct Texture {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<u32>,
}

impl Texture {
    /// Build from raw packed pixels, validating size and power-of-two dimensions
    pub fn from_pixels(width: usize, height: usize, pixels: Vec<u32>) -> Result<Self, TextureError> {
        if !width.is_power_of_two() || !height.is_power_of_two() {
            return Err(TextureError::NotPowerOfTwo { width, height });
        }
        if pixels.len() != width * height {
            return Err(TextureError::SizeMismatch {
                expected: width * height,
                actual: pixels.len(),
            });
        }
        Ok(Self { width, height, pixels })
    }

    /// Load texture from an image file
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, TextureError> {
        let path = path.as_ref();
        let img = image::open(path)?;
        let texture = Self::from_image(img)?;
        log::debug!("loaded texture {} ({}x{})", path.display(), texture.width, texture.height);
        Ok(texture)
    }

    /// Load texture from encoded image bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TextureError> {
        let img = image::load_from_memory(bytes)?;
        Self::from_image(img)
    }

    fn from_image(img: image::DynamicImage) -> Result<Self, TextureError> {
        let rgb = img.to_rgb8();
        let (width, height) = rgb.dimensions();

        let pixels: Vec<u32> = rgb
            .pixels()
            .map(|p| Color::new(p[0], p[1], p[2]).to_packed())
            .collect();

        Self::from_pixels(width as usize, height as usize, pixels)
    }

    /// Create a checkerboard test texture with 4x4 texel cells
    pub fn checkerboard(width: usize, height: usize, color1: Color, color2: Color) -> Result<Self, TextureError> {
        let mut pixels = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                let checker = ((x / 4) + (y / 4)) % 2 == 0;
                pixels.push(if checker { color1 } else { color2 }.to_packed());
            }
        }
        Self::from_pixels(width, height, pixels)
    }

    /// Sample at UV coordinates, nearest texel, wrapping with a power-of-two mask
    pub fn sample(&self, u: f32, v: f32) -> u32 {
        let tx = ((u * self.width as f32) as i32 & (self.width as i32 - 1)) as usize;
        let ty = ((v * self.height as f32) as i32 & (self.height as i32 - 1)) as usize;
        self.pixels[ty * self.width + tx]
    }
}

/// A triangle: index triples into a mesh's positions, UVs and normals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Triangle {
    pub v: [usize; 3],
    pub uv: [usize; 3],
    pub n: [usize; 3],
}

impl Triangle {
    pub const fn new(v: [usize; 3], uv: [usize; 3], n: [usize; 3]) -> Self {
        Self { v, uv, n }
    }
}

/// Mesh with parallel attribute arrays and per-frame transformed caches.
///
/// Indices in `triangles` must be in range; loaders guarantee this and the
/// draw path does not re-check.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub triangles: Vec<Triangle>,
    /// View-space positions, rewritten by the transform stage each frame
    pub transformed_positions: Vec<Vec3>,
    /// View-space normals, rewritten by the transform stage each frame
    pub transformed_normals: Vec<Vec3>,
}

impl Mesh {
    /// Build a mesh; the transformed caches start as copies of the sources
    pub fn new(positions: Vec<Vec3>, normals: Vec<Vec3>, uvs: Vec<Vec2>, triangles: Vec<Triangle>) -> Self {
        Self {
            transformed_positions: positions.clone(),
            transformed_normals: normals.clone(),
            positions,
            normals,
            uvs,
            triangles,
        }
    }

    /// Rewrite the transformed caches with `mat` applied (positions as points,
    /// normals as directions)
    pub fn transform(&mut self, mat: &Mat4) {
        self.transformed_positions.clear();
        self.transformed_positions
            .extend(self.positions.iter().map(|&p| mat.transform_point(p)));

        self.transformed_normals.clear();
        self.transformed_normals
            .extend(self.normals.iter().map(|&n| mat.transform_vector(n).normalize()));
    }

    /// Unit cube centered on the origin, one normal per face
    pub fn cube() -> Self {
        let positions = vec![
            Vec3::new(-1.0, -1.0, -1.0),
            Vec3::new(-1.0, 1.0, -1.0),
            Vec3::new(1.0, 1.0, -1.0),
            Vec3::new(1.0, -1.0, -1.0),
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(1.0, -1.0, 1.0),
            Vec3::new(-1.0, 1.0, 1.0),
            Vec3::new(-1.0, -1.0, 1.0),
        ];

        let normals = vec![
            Vec3::new(0.0, 0.0, -1.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(-1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, -1.0, 0.0),
        ];

        let uvs = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(0.0, 1.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(1.0, 0.0),
        ];

        // Two triangles per face, both winding the same way
        let faces = [[0, 1, 2, 3], [3, 2, 4, 5], [5, 4, 6, 7], [7, 6, 1, 0], [1, 6, 4, 2], [5, 7, 0, 3]];
        let mut triangles = Vec::with_capacity(12);
        for (n, q) in faces.iter().enumerate() {
            triangles.push(Triangle::new([q[0], q[1], q[2]], [0, 1, 2], [n; 3]));
            triangles.push(Triangle::new([q[0], q[2], q[3]], [0, 2, 3], [n; 3]));
        }

        Self::new(positions, normals, uvs, triangles)
    }
}

/// Light source. The direction is normalized on construction; the RGB
/// intensity folds together strength and color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub position: Vec3,
    pub direction: Vec3,
    pub intensity: Vec3,
}

impl Light {
    /// White light with a scalar strength
    pub fn new(position: Vec3, direction: Vec3, strength: f32) -> Self {
        Self {
            position,
            direction: direction.normalize(),
            intensity: Vec3::splat(strength),
        }
    }

    /// Colored light; each channel's intensity is the channel value / 255
    pub fn colored(position: Vec3, direction: Vec3, color: Color) -> Self {
        Self {
            position,
            direction: direction.normalize(),
            intensity: color.to_unit(),
        }
    }
}

/// Ambient term plus a list of lights
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Lighting {
    pub ambient: Vec3,
    pub lights: Vec<Light>,
}

impl Lighting {
    pub fn new(ambient: Vec3) -> Self {
        Self { ambient, lights: Vec::new() }
    }

    pub fn with_light(mut self, light: Light) -> Self {
        self.lights.push(light);
        self
    }
}

/// Camera state: a position and a look target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
}

impl Camera {
    /// Camera at `position` looking down -Z
    pub fn new(position: Vec3) -> Self {
        Self { position, target: Vec3::FORWARD }
    }

    pub fn looking_at(position: Vec3, target: Vec3) -> Self {
        Self { position, target }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at(self.position, self.target)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::ZERO)
    }
}

/// Draw mode for a model
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenderMode {
    Wireframe,
    Unlit,
    #[default]
    Flat,
    Phong,
    TexturedUnlit,
    TexturedFlat,
    TexturedPhong,
}

impl RenderMode {
    pub const ALL: [RenderMode; 7] = [
        RenderMode::Wireframe,
        RenderMode::Unlit,
        RenderMode::Flat,
        RenderMode::Phong,
        RenderMode::TexturedUnlit,
        RenderMode::TexturedFlat,
        RenderMode::TexturedPhong,
    ];

    fn index(self) -> usize {
        Self::ALL.iter().position(|&m| m == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    pub fn name(self) -> &'static str {
        match self {
            RenderMode::Wireframe => "wireframe",
            RenderMode::Unlit => "unlit",
            RenderMode::Flat => "flat",
            RenderMode::Phong => "phong",
            RenderMode::TexturedUnlit => "textured unlit",
            RenderMode::TexturedFlat => "textured flat",
            RenderMode::TexturedPhong => "textured phong",
        }
    }
}
