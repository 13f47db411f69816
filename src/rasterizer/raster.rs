//! Scanline triangle fill and line drawing
//!
//! Triangles are split at the middle vertex into a flat-bottom and a
//! flat-top half and swept one row at a time. Coverage comes from the sweep;
//! barycentric weights against the original corners drive depth and
//! attribute interpolation.

use super::depth::RenderContext;
use super::math::{barycentric, signed_area, Vec2, Vec3};
use super::project::{Projection, ProjectionKind};
use super::sort::{sort_by_y, VertexBundle};

/// Destination for accepted pixels. Coordinates are always inside the
/// render context's viewport.
pub trait PixelSink {
    fn set_pixel(&mut self, x: usize, y: usize, color: u32);
}

/// A pixel that passed the depth test, with its interpolated attributes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fragment {
    pub x: usize,
    pub y: usize,
    /// Depth key (smaller is nearer)
    pub depth: f32,
    /// Screen-space barycentric weights
    pub weights: Vec3,
    /// Perspective-corrected view-space position
    pub view: Option<Vec3>,
    /// Linearly blended, renormalized normal
    pub normal: Option<Vec3>,
    /// Perspective-corrected texture coordinate
    pub uv: Option<Vec2>,
}

/// Walk every pixel covered by a triangle whose bundles are already sorted
/// by ascending Y, limited to a `width` x `height` viewport. Vertex positions
/// are floored to whole pixels and spans include both endpoints.
///
/// Edge slopes come from the unclipped vertices; only the row range and each
/// span are clamped, so the cost is bounded by the viewport area.
pub fn scan_triangle<F: FnMut(i32, i32)>(sorted: &[VertexBundle; 3], width: usize, height: usize, mut visit: F) {
    if width == 0 || height == 0 {
        return;
    }
    if sorted.iter().any(|v| !v.screen.x.is_finite() || !v.screen.y.is_finite()) {
        return;
    }

    let top = sorted[0].screen.floor_xy();
    let mid = sorted[1].screen.floor_xy();
    let bottom = sorted[2].screen.floor_xy();

    let (x0, y0) = (top.x, top.y);
    let (x1, y1) = (mid.x, mid.y);
    let (x2, y2) = (bottom.x, bottom.y);

    let max_x = (width - 1) as f32;
    let max_y = (height - 1) as f32;

    let mut span = |y: i32, a: f32, b: f32| {
        if !a.is_finite() || !b.is_finite() {
            return;
        }
        let (start, end) = if a > b { (b, a) } else { (a, b) };
        let start = start.floor().max(0.0);
        let end = end.floor().min(max_x);
        if start > end {
            return;
        }
        for x in start as i32..=end as i32 {
            visit(x, y);
        }
    };

    // Whole rows in [first, last] that fall inside the viewport
    let rows = |first: f32, last: f32| (first.max(0.0) as i32)..=(last.min(max_y) as i32);

    // Flat-bottom half. The middle row belongs to the flat-top half when
    // there is one, so it is not swept twice.
    if y1 != y0 {
        let slope_short = (x1 - x0) / (y1 - y0);
        let slope_long = (x2 - x0) / (y2 - y0);
        let last = if y2 != y1 { y1 - 1.0 } else { y1 };
        for y in rows(y0, last) {
            let dy = y as f32 - y0;
            span(y, x0 + dy * slope_short, x0 + dy * slope_long);
        }
    }

    // Flat-top half
    if y2 != y1 {
        let slope_short = (x2 - x1) / (y2 - y1);
        let slope_long = (x2 - x0) / (y2 - y0);
        for y in rows(y1, y2) {
            let row = y as f32;
            span(y, x1 + (row - y1) * slope_short, x0 + (row - y0) * slope_long);
        }
    }
}

/// Rasterize one triangle with depth testing. `shade` is called for each
/// pixel that wins the depth test and returns its packed color.
///
/// Corners are in their original winding order; triangles with zero or
/// negative screen area produce nothing. Returns the number of pixels written.
pub fn fill_triangle<S, F>(
    ctx: &mut RenderContext,
    sink: &mut S,
    corners: &[VertexBundle; 3],
    kind: ProjectionKind,
    mut shade: F,
) -> usize
where
    S: PixelSink + ?Sized,
    F: FnMut(&Fragment) -> u32,
{
    let [a, b, c] = corners.map(|v| v.screen.xy());
    if signed_area(a, b, c) <= 0.0 {
        return 0;
    }

    let mut sorted = *corners;
    sort_by_y(&mut sorted);

    // Perspective correction factor per corner: 1/w, or 1 when affine is exact
    let q = corners.map(|v| match kind {
        ProjectionKind::Perspective => v.screen.z,
        ProjectionKind::Orthographic => 1.0,
    });

    let mut written = 0;
    let (width, height) = (ctx.width, ctx.height);
    scan_triangle(&sorted, width, height, |x, y| {
        if !ctx.contains(x, y) {
            return;
        }

        let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
        let w = barycentric(p, a, b, c);
        if w == Vec3::ZERO {
            return;
        }

        let metric = w.x * corners[0].screen.z + w.y * corners[1].screen.z + w.z * corners[2].screen.z;
        // Extrapolated edge pixels of sliver triangles can push 1/w to zero or below
        if kind == ProjectionKind::Perspective && metric <= 0.0 {
            return;
        }
        let depth = Projection::depth_key(kind, metric);

        let (x, y) = (x as usize, y as usize);
        if !ctx.depth.test_and_set(x, y, depth) {
            return;
        }

        let qw = Vec3::new(w.x * q[0], w.y * q[1], w.z * q[2]);
        let pw = qw.scale(1.0 / (qw.x + qw.y + qw.z));

        let fragment = Fragment {
            x,
            y,
            depth,
            weights: w,
            view: blend3(corners.map(|v| v.view), pw),
            normal: blend3(corners.map(|v| v.normal), w).map(Vec3::normalize),
            uv: blend2(corners.map(|v| v.uv), pw),
        };

        sink.set_pixel(x, y, shade(&fragment));
        written += 1;
    });

    written
}

fn blend3(values: [Option<Vec3>; 3], w: Vec3) -> Option<Vec3> {
    match values {
        [Some(a), Some(b), Some(c)] => Some(a * w.x + b * w.y + c * w.z),
        _ => None,
    }
}

fn blend2(values: [Option<Vec2>; 3], w: Vec3) -> Option<Vec2> {
    match values {
        [Some(a), Some(b), Some(c)] => Some(a.scale(w.x) + b.scale(w.y) + c.scale(w.z)),
        _ => None,
    }
}

/// Draw a line by stepping one unit along the longer axis. No depth test.
/// Returns the number of pixels that landed inside the viewport.
pub fn draw_line<S: PixelSink + ?Sized>(ctx: &RenderContext, sink: &mut S, a: Vec2, b: Vec2, color: u32) -> usize {
    let mut plot = |x: f32, y: f32| {
        let (px, py) = (x.floor() as i32, y.floor() as i32);
        if ctx.contains(px, py) {
            sink.set_pixel(px as usize, py as usize, color);
            1
        } else {
            0
        }
    };

    let d = b - a;
    let longer = d.x.abs().max(d.y.abs());
    if longer == 0.0 {
        return plot(a.x, a.y);
    }

    if !longer.is_finite() {
        return 0;
    }

    let step = d.scale(1.0 / longer);
    let steps = longer as i64;
    let (first, last) = match (
        step_range(a.x, step.x, ctx.width as f32, steps),
        step_range(a.y, step.y, ctx.height as f32, steps),
    ) {
        (Some((x0, x1)), Some((y0, y1))) => (x0.max(y0), x1.min(y1)),
        _ => return 0,
    };

    let mut written = 0;
    for i in first..=last {
        let p = a + step.scale(i as f32);
        written += plot(p.x, p.y);
    }
    written
}

/// Steps `i` in `[0, steps]` for which `start + i * step` can land in `[0, size)`
fn step_range(start: f32, step: f32, size: f32, steps: i64) -> Option<(i64, i64)> {
    if step == 0.0 {
        return (0.0..size).contains(&start).then_some((0, steps));
    }
    let (t0, t1) = ((0.0 - start) / step, (size - start) / step);
    let (lo, hi) = if t0 < t1 { (t0, t1) } else { (t1, t0) };
    let first = (lo.floor() as i64).max(0);
    let last = (hi.ceil() as i64).min(steps);
    (first <= last).then_some((first, last))
}
