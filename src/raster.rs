//! Scan conversion of triangles and lines into a [`Framebuffer`].
//!
//! Triangles are filled with edge functions evaluated at pixel centers
//! `(x + 0.5, y + 0.5)`. Ties on an edge are broken with the top-left rule,
//! so two triangles sharing an edge cover every pixel along it exactly once.
//!
//! Depth is interpolated linearly in screen space, which is correct for NDC
//! z. Colors, UVs and normals use perspective-correct interpolation through
//! each vertex's `1 / w`.

use glam::{Vec2, Vec3, Vec4};

use crate::color::Color;
use crate::framebuffer::{DepthTest, Framebuffer};

/// Triangles with a smaller screen-space area (in pixels², doubled) are
/// treated as degenerate.
const DEGENERATE_AREA: f32 = 1e-6;

/// A vertex after the perspective divide and viewport transform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RasterVertex {
    /// Screen x and y in pixels (y down), NDC depth in z.
    pub position: Vec3,
    /// Reciprocal of the clip-space w.
    pub inv_w: f32,
    pub color: Vec4,
    pub uv: Vec2,
    pub normal: Vec3,
}

impl RasterVertex {
    fn is_finite(&self) -> bool {
        self.position.is_finite() && self.inv_w.is_finite()
    }
}

/// Divides a clip-space point by its w and maps NDC onto a `size.x × size.y`
/// pixel grid. Returns the screen position (NDC depth in z) and `1 / w`.
pub fn project_point(clip: Vec4, size: Vec2) -> (Vec3, f32) {
    let inv_w = 1.0 / clip.w;
    let ndc = clip.truncate() * inv_w;
    let screen = Vec3::new(
        (ndc.x + 1.0) * 0.5 * size.x,
        (1.0 - ndc.y) * 0.5 * size.y,
        ndc.z,
    );
    (screen, inv_w)
}

/// A vertex in homogeneous clip space, before the divide.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClipVertex {
    pub position: Vec4,
    pub color: Vec4,
    pub uv: Vec2,
    pub normal: Vec3,
}

impl ClipVertex {
    /// Perspective divide plus viewport transform for a `size.x × size.y`
    /// target. NDC y points up, screen y points down.
    pub fn project(&self, size: Vec2) -> RasterVertex {
        let (position, inv_w) = project_point(self.position, size);
        RasterVertex {
            position,
            inv_w,
            color: self.color,
            uv: self.uv,
            normal: self.normal,
        }
    }

    fn lerp(&self, other: &ClipVertex, t: f32) -> ClipVertex {
        ClipVertex {
            position: self.position.lerp(other.position, t),
            color: self.color.lerp(other.color, t),
            uv: self.uv.lerp(other.uv, t),
            normal: self.normal.lerp(other.normal, t),
        }
    }
}

/// The result of clipping a triangle against one plane: at most 4 vertices.
#[derive(Clone, Copy, Debug)]
pub struct ClippedPolygon {
    vertices: [ClipVertex; 4],
    len: usize,
}

impl ClippedPolygon {
    fn empty(fill: ClipVertex) -> Self {
        Self {
            vertices: [fill; 4],
            len: 0,
        }
    }

    fn push(&mut self, v: ClipVertex) {
        if self.len < self.vertices.len() {
            self.vertices[self.len] = v;
            self.len += 1;
        }
    }

    pub fn vertices(&self) -> &[ClipVertex] {
        &self.vertices[..self.len]
    }

    pub fn is_empty(&self) -> bool {
        self.len < 3
    }

    /// Fan triangulation: `(0, i, i + 1)`.
    pub fn triangles(&self) -> impl Iterator<Item = [ClipVertex; 3]> + '_ {
        let v = self.vertices();
        (1..v.len().saturating_sub(1)).map(move |i| [v[0], v[i], v[i + 1]])
    }
}

/// Sutherland–Hodgman clip of a clip-space triangle against the near plane
/// `z >= 0`. Attributes are interpolated linearly along the cut edges.
pub fn clip_near(triangle: &[ClipVertex; 3]) -> ClippedPolygon {
    let mut out = ClippedPolygon::empty(triangle[0]);
    for i in 0..3 {
        let a = &triangle[i];
        let b = &triangle[(i + 1) % 3];
        let (da, db) = (a.position.z, b.position.z);
        let (a_in, b_in) = (da >= 0.0, db >= 0.0);
        if a_in {
            out.push(*a);
        }
        if a_in != b_in {
            out.push(a.lerp(b, da / (da - db)));
        }
    }
    out
}

/// What the shading callback sees for one covered pixel.
#[derive(Clone, Copy, Debug)]
pub struct Fragment {
    pub x: u32,
    pub y: u32,
    /// NDC depth in `[0, 1]`.
    pub depth: f32,
    pub color: Vec4,
    pub uv: Vec2,
    pub normal: Vec3,
    /// Perspective-corrected barycentric weights.
    pub barycentric: Vec3,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RasterStats {
    /// Pixels inside the triangle with depth in range.
    pub covered: u32,
    /// Fragments the framebuffer accepted.
    pub written: u32,
    /// Zero-area or non-finite input; nothing was drawn.
    pub degenerate: bool,
}

fn edge(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

// With y down and positive area, top edges run left to right and left edges
// run upwards.
fn is_top_left(a: Vec2, b: Vec2) -> bool {
    (a.y == b.y && b.x > a.x) || b.y < a.y
}

fn covers(w: f32, top_left: bool) -> bool {
    w > 0.0 || (w == 0.0 && top_left)
}

/// Fills one triangle, handing every covered pixel to `shade` and the
/// result to [`Framebuffer::write_fragment`].
///
/// Winding does not matter. Fragments whose depth falls outside `[0, 1]` are
/// dropped before shading.
pub fn rasterize_triangle<F>(
    fb: &mut Framebuffer,
    triangle: &[RasterVertex; 3],
    depth_test: DepthTest,
    mut shade: F,
) -> RasterStats
where
    F: FnMut(&Fragment) -> Color,
{
    let mut stats = RasterStats::default();
    let [v0, mut v1, mut v2] = *triangle;
    if !(v0.is_finite() && v1.is_finite() && v2.is_finite()) {
        stats.degenerate = true;
        return stats;
    }

    let mut area = edge(v0.position.truncate(), v1.position.truncate(), v2.position.truncate());
    if !area.is_finite() || area.abs() < DEGENERATE_AREA {
        stats.degenerate = true;
        return stats;
    }
    if area < 0.0 {
        std::mem::swap(&mut v1, &mut v2);
        area = -area;
    }
    let (p0, p1, p2) = (
        v0.position.truncate(),
        v1.position.truncate(),
        v2.position.truncate(),
    );

    // Clamp in float space so far-off vertices never overflow the cast.
    let lo = p0.min(p1).min(p2).floor().max(Vec2::ZERO);
    let hi = p0
        .max(p1)
        .max(p2)
        .ceil()
        .min(Vec2::new(fb.width() as f32, fb.height() as f32));
    if lo.x >= hi.x || lo.y >= hi.y {
        return stats;
    }
    let (x_min, x_max) = (lo.x as u32, hi.x as u32);
    let (y_min, y_max) = (lo.y as u32, hi.y as u32);

    let tl0 = is_top_left(p1, p2);
    let tl1 = is_top_left(p2, p0);
    let tl2 = is_top_left(p0, p1);
    let inv_area = 1.0 / area;

    for y in y_min..y_max {
        for x in x_min..x_max {
            let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
            let w0 = edge(p1, p2, p);
            let w1 = edge(p2, p0, p);
            let w2 = edge(p0, p1, p);
            if !(covers(w0, tl0) && covers(w1, tl1) && covers(w2, tl2)) {
                continue;
            }

            let b = Vec3::new(w0, w1, w2) * inv_area;
            let depth = b.x * v0.position.z + b.y * v1.position.z + b.z * v2.position.z;
            if !(0.0..=1.0).contains(&depth) {
                continue;
            }

            let inv_w = b.x * v0.inv_w + b.y * v1.inv_w + b.z * v2.inv_w;
            let pc = Vec3::new(b.x * v0.inv_w, b.y * v1.inv_w, b.z * v2.inv_w) / inv_w;
            let fragment = Fragment {
                x,
                y,
                depth,
                color: v0.color * pc.x + v1.color * pc.y + v2.color * pc.z,
                uv: v0.uv * pc.x + v1.uv * pc.y + v2.uv * pc.z,
                normal: v0.normal * pc.x + v1.normal * pc.y + v2.normal * pc.z,
                barycentric: pc,
            };
            stats.covered += 1;
            let color = shade(&fragment);
            if fb.write_fragment(x, y, depth, color, depth_test) {
                stats.written += 1;
            }
        }
    }
    stats
}

/// Liang–Barsky: the parameter range of `a + t (b - a)` inside
/// `[0, max.x] × [0, max.y]`, or `None` when the segment misses it.
fn clip_segment(a: Vec2, b: Vec2, max: Vec2) -> Option<(f32, f32)> {
    let d = b - a;
    let (mut t0, mut t1) = (0.0f32, 1.0f32);
    for (p, q) in [
        (-d.x, a.x),
        (d.x, max.x - a.x),
        (-d.y, a.y),
        (d.y, max.y - a.y),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }
    Some((t0, t1))
}

/// Draws a screen-space segment with colors interpolated along it.
///
/// The segment is clipped to the framebuffer first, so the number of steps
/// is bounded by the framebuffer size no matter where the endpoints are.
/// Lines ignore and never write depth. Returns the number of pixels written.
pub fn draw_line(fb: &mut Framebuffer, a: Vec2, b: Vec2, color_a: Color, color_b: Color) -> u32 {
    if !(a.is_finite() && b.is_finite()) {
        return 0;
    }
    let size = Vec2::new(fb.width() as f32, fb.height() as f32);
    let Some((t0, t1)) = clip_segment(a, b, size) else {
        return 0;
    };
    let start = a.lerp(b, t0);
    let end = a.lerp(b, t1);
    let delta = end - start;
    let steps = delta.x.abs().max(delta.y.abs()).ceil().max(1.0) as u32;

    let (ca, cb) = (color_a.to_vec4(), color_b.to_vec4());
    let mut written = 0;
    for i in 0..=steps {
        let s = i as f32 / steps as f32;
        let p = start + delta * s;
        let t = t0 + (t1 - t0) * s;
        let color = Color::from_vec4(ca.lerp(cb, t));
        if fb.write_fragment(p.x as u32, p.y as u32, 0.0, color, DepthTest::Disabled) {
            written += 1;
        }
    }
    written
}
