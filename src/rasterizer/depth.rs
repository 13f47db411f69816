//! Depth buffer and per-frame render context

/// Per-pixel depth, row-major. Smaller values are nearer the camera.
#[derive(Debug, Clone)]
pub struct DepthBuffer {
    values: Vec<f32>,
    width: usize,
    height: usize,
}

impl DepthBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            values: vec![f32::MAX; width * height],
            width,
            height,
        }
    }

    /// Reset every entry to "infinitely far"
    pub fn clear(&mut self) {
        self.values.fill(f32::MAX);
    }

    pub fn get(&self, x: usize, y: usize) -> Option<f32> {
        if x < self.width && y < self.height {
            Some(self.values[y * self.width + x])
        } else {
            None
        }
    }

    /// Store `depth` at (x, y) if it is no farther than the current entry.
    /// Returns whether the write happened; out-of-range coordinates never pass.
    pub fn test_and_set(&mut self, x: usize, y: usize, depth: f32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let slot = &mut self.values[y * self.width + x];
        if depth <= *slot {
            *slot = depth;
            true
        } else {
            false
        }
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }
}

/// Resolution and depth buffer shared by every draw call in a frame.
/// Owned by the frame driver.
#[derive(Debug, Clone)]
pub struct RenderContext {
    pub width: usize,
    pub height: usize,
    pub depth: DepthBuffer,
}

impl RenderContext {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            depth: DepthBuffer::new(width, height),
        }
    }

    /// Start a new frame
    pub fn clear_depth(&mut self) {
        self.depth.clear();
    }

    /// Whether integer pixel (x, y) lies inside the viewport
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }
}
