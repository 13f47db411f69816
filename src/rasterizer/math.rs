//! Vector and matrix math for the pipeline
//!
//! Matrices are row-major (`m[row][col]`) and multiply column vectors on the
//! right: `clip = P * (x, y, z, 1)`.

use std::ops::{Add, Mul, Sub};

use approx::AbsDiffEq;
use serde::{Deserialize, Serialize};

/// Degrees to radians
pub const DEG_TO_RAD: f32 = std::f32::consts::PI / 180.0;

/// 3D Vector
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };
    pub const ONE: Vec3 = Vec3 { x: 1.0, y: 1.0, z: 1.0 };
    pub const UP: Vec3 = Vec3 { x: 0.0, y: 1.0, z: 0.0 };
    /// Direction the camera looks along in view space
    pub const FORWARD: Vec3 = Vec3 { x: 0.0, y: 0.0, z: -1.0 };

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Same value in all three components
    pub const fn splat(v: f32) -> Self {
        Self { x: v, y: v, z: v }
    }

    pub fn dot(self, other: Vec3) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(self, other: Vec3) -> Vec3 {
        Vec3 {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    pub fn len(self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Unit vector in the same direction. Zero-length input yields `Vec3::ZERO`.
    pub fn normalize(self) -> Vec3 {
        let len_sq = self.dot(self);
        if len_sq == 0.0 {
            return Vec3::ZERO;
        }
        self.scale(1.0 / len_sq.sqrt())
    }

    pub fn scale(self, s: f32) -> Vec3 {
        Vec3 {
            x: self.x * s,
            y: self.y * s,
            z: self.z * s,
        }
    }


    /// Clamp each component to `[min, max]`
    pub fn clamp(self, min: f32, max: f32) -> Vec3 {
        Vec3 {
            x: self.x.clamp(min, max),
            y: self.y.clamp(min, max),
            z: self.z.clamp(min, max),
        }
    }

    /// Drop the z component
    pub fn xy(self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Floor x and y to whole pixels, leaving z untouched
    pub fn floor_xy(self) -> Vec3 {
        Vec3::new(self.x.floor(), self.y.floor(), self.z)
    }

    pub fn extend(self, w: f32) -> Vec4 {
        Vec4::new(self.x, self.y, self.z, w)
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    fn add(self, other: Vec3) -> Vec3 {
        Vec3 {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    fn sub(self, other: Vec3) -> Vec3 {
        Vec3 {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;
    fn mul(self, s: f32) -> Vec3 {
        self.scale(s)
    }
}

/// 2D Vector (screen positions and texture coordinates)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn scale(self, s: f32) -> Vec2 {
        Vec2::new(self.x * s, self.y * s)
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x - other.x, self.y - other.y)
    }
}

/// 4D Vector (homogeneous clip-space coordinates)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec4 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Vec4 {
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    pub fn xyz(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }
}

impl AbsDiffEq for Vec2 {
    type Epsilon = f32;

    fn default_epsilon() -> f32 {
        f32::EPSILON
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: f32) -> bool {
        self.x.abs_diff_eq(&other.x, epsilon) && self.y.abs_diff_eq(&other.y, epsilon)
    }
}

impl AbsDiffEq for Vec3 {
    type Epsilon = f32;

    fn default_epsilon() -> f32 {
        f32::EPSILON
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: f32) -> bool {
        self.x.abs_diff_eq(&other.x, epsilon)
            && self.y.abs_diff_eq(&other.y, epsilon)
            && self.z.abs_diff_eq(&other.z, epsilon)
    }
}

impl AbsDiffEq for Vec4 {
    type Epsilon = f32;

    fn default_epsilon() -> f32 {
        f32::EPSILON
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: f32) -> bool {
        self.xyz().abs_diff_eq(&other.xyz(), epsilon) && self.w.abs_diff_eq(&other.w, epsilon)
    }
}

/// 4x4 matrix, row-major
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mat4 {
    pub m: [[f32; 4]; 4],
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mat4 {
    pub const IDENTITY: Mat4 = Mat4 {
        m: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    pub const fn from_rows(m: [[f32; 4]; 4]) -> Self {
        Self { m }
    }

    pub fn translation(x: f32, y: f32, z: f32) -> Self {
        Self::from_rows([
            [1.0, 0.0, 0.0, x],
            [0.0, 1.0, 0.0, y],
            [0.0, 0.0, 1.0, z],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    pub fn scale(sx: f32, sy: f32, sz: f32) -> Self {
        Self::from_rows([
            [sx, 0.0, 0.0, 0.0],
            [0.0, sy, 0.0, 0.0],
            [0.0, 0.0, sz, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Euler rotation from pitch/yaw/roll given in degrees
    pub fn rotation(pitch: f32, yaw: f32, roll: f32) -> Self {
        let (sa, ca) = (yaw * DEG_TO_RAD).sin_cos();
        let (sb, cb) = (pitch * DEG_TO_RAD).sin_cos();
        let (sg, cg) = (roll * DEG_TO_RAD).sin_cos();

        Self::from_rows([
            [ca * cb, ca * sb * sg - sa * cg, ca * sb * cg + sa * sg, 0.0],
            [sa * cb, sa * sb * sg + ca * cg, sa * sb * cg - ca * sg, 0.0],
            [-sb, cb * sg, cb * cg, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Look-at view matrix. The camera ends up at the origin looking down -Z.
    pub fn look_at(eye: Vec3, target: Vec3) -> Self {
        let forward = (eye - target).normalize();
        let right = Vec3::UP.cross(forward).normalize();
        let up = forward.cross(right);

        Self::from_rows([
            [right.x, right.y, right.z, -right.dot(eye)],
            [up.x, up.y, up.z, -up.dot(eye)],
            [forward.x, forward.y, forward.z, -forward.dot(eye)],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Perspective projection; `fov` is the vertical field of view in degrees.
    /// `clip.w` equals the view-space distance `-z`.
    pub fn perspective(fov: f32, width: usize, height: usize, near: f32, far: f32) -> Self {
        let f = 1.0 / (fov * 0.5 * DEG_TO_RAD).tan();
        let aspect = width as f32 / height as f32;

        Self::from_rows([
            [f / aspect, 0.0, 0.0, 0.0],
            [0.0, f, 0.0, 0.0],
            [0.0, 0.0, -far / (far - near), -far * near / (far - near)],
            [0.0, 0.0, -1.0, 0.0],
        ])
    }

    /// Symmetric orthographic projection spanning `[-aspect, aspect] x [-1, 1]`
    pub fn orthographic(width: usize, height: usize, near: f32, far: f32) -> Self {
        let aspect = width as f32 / height as f32;
        let (left, right) = (-aspect, aspect);
        let (bottom, top) = (-1.0, 1.0);

        Self::from_rows([
            [2.0 / (right - left), 0.0, 0.0, -(right + left) / (right - left)],
            [0.0, 2.0 / (top - bottom), 0.0, -(top + bottom) / (top - bottom)],
            [0.0, 0.0, -2.0 / (far - near), -(far + near) / (far - near)],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Transform a point (implicit w = 1)
    pub fn transform_point(&self, v: Vec3) -> Vec3 {
        (*self * v.extend(1.0)).xyz()
    }

    /// Transform a direction (implicit w = 0), ignoring translation
    pub fn transform_vector(&self, v: Vec3) -> Vec3 {
        (*self * v.extend(0.0)).xyz()
    }
}

impl Mul for Mat4 {
    type Output = Mat4;
    fn mul(self, other: Mat4) -> Mat4 {
        let mut m = [[0.0; 4]; 4];
        for (i, row) in m.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = (0..4).map(|k| self.m[i][k] * other.m[k][j]).sum();
            }
        }
        Mat4 { m }
    }
}

impl Mul<Vec4> for Mat4 {
    type Output = Vec4;
    fn mul(self, v: Vec4) -> Vec4 {
        let row = |r: [f32; 4]| r[0] * v.x + r[1] * v.y + r[2] * v.z + r[3] * v.w;
        Vec4::new(row(self.m[0]), row(self.m[1]), row(self.m[2]), row(self.m[3]))
    }
}

/// Twice the signed area of screen triangle (a, b, c), positive when the
/// triangle is clockwise on a Y-down screen (front-facing after projection)
pub fn signed_area(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    (c.x - a.x) * (b.y - a.y) - (c.y - a.y) * (b.x - a.x)
}

/// Barycentric weights of `p` with respect to triangle (a, b, c).
///
/// Returns `Vec3::ZERO` when the signed area is zero or negative; such
/// weights contribute nothing and callers treat the point as a no-op.
pub fn barycentric(p: Vec2, a: Vec2, b: Vec2, c: Vec2) -> Vec3 {
    let area = signed_area(a, b, c);
    if area <= 0.0 {
        return Vec3::ZERO;
    }

    let alpha = ((c.x - p.x) * (b.y - p.y) - (c.y - p.y) * (b.x - p.x)) / area;
    let beta = ((c.x - a.x) * (p.y - a.y) - (c.y - a.y) * (p.x - a.x)) / area;
    let gamma = 1.0 - alpha - beta;

    Vec3::new(alpha, beta, gamma)
}
