use glam::Vec4;

/// A straight (non-premultiplied) RGBA color with `f32` channels in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl Color {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);
    pub const RED: Color = Color::rgb(1.0, 0.0, 0.0);
    pub const GREEN: Color = Color::rgb(0.0, 1.0, 0.0);
    pub const BLUE: Color = Color::rgb(0.0, 0.0, 1.0);
    pub const MAGENTA: Color = Color::rgb(1.0, 0.0, 1.0);

    pub fn from_vec4(v: Vec4) -> Self {
        Self::rgba(v.x, v.y, v.z, v.w)
    }

    pub fn to_vec4(self) -> Vec4 {
        Vec4::new(self.r, self.g, self.b, self.a)
    }

    /// Same color with a different alpha.
    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    /// Packs into `0xAARRGGBB`, clamping each channel first.
    pub fn to_argb(self) -> u32 {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u32;
        (q(self.a) << 24) | (q(self.r) << 16) | (q(self.g) << 8) | q(self.b)
    }

    /// Inverse of [`to_argb`](Self::to_argb), up to 8-bit quantization.
    pub fn from_argb(argb: u32) -> Self {
        let c = |shift: u32| ((argb >> shift) & 0xFF) as f32 / 255.0;
        Self::rgba(c(16), c(8), c(0), c(24))
    }

    /// Component-wise product, used to tint texture samples by vertex color.
    pub fn modulate(self, other: Color) -> Self {
        Self::rgba(
            self.r * other.r,
            self.g * other.g,
            self.b * other.b,
            self.a * other.a,
        )
    }

    /// Scales the color channels, leaving alpha alone.
    pub fn scale_rgb(self, k: f32) -> Self {
        Self::rgba(self.r * k, self.g * k, self.b * k, self.a)
    }

    /// Straight alpha "over": `src * a + dst * (1 - a)`.
    pub fn blend_over(self, dst: Color) -> Self {
        let a = self.a.clamp(0.0, 1.0);
        let inv = 1.0 - a;
        Self::rgba(
            self.r * a + dst.r * inv,
            self.g * a + dst.g * inv,
            self.b * a + dst.b * inv,
            a + dst.a * inv,
        )
    }
}

impl From<[f32; 4]> for Color {
    fn from(c: [f32; 4]) -> Self {
        Self::rgba(c[0], c[1], c[2], c[3])
    }
}

impl From<Color> for [f32; 4] {
    fn from(c: Color) -> Self {
        [c.r, c.g, c.b, c.a]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn argb_packing_layout() {
        assert_eq!(Color::rgba(1.0, 0.0, 0.0, 1.0).to_argb(), 0xFFFF0000);
        assert_eq!(Color::rgba(0.0, 0.0, 1.0, 0.0).to_argb(), 0x000000FF);
        assert_eq!(Color::rgb(2.0, -1.0, 0.5).to_argb(), 0xFFFF0080);
    }

    #[test]
    fn unpack_matches_pack() {
        let c = Color::from_argb(0x80FF4000);
        assert_abs_diff_eq!(c.r, 1.0);
        assert_abs_diff_eq!(c.g, 64.0 / 255.0);
        assert_abs_diff_eq!(c.b, 0.0);
        assert_abs_diff_eq!(c.a, 128.0 / 255.0);
    }

    #[test]
    fn blend_over_extremes() {
        let dst = Color::BLUE;
        assert_eq!(Color::RED.with_alpha(1.0).blend_over(dst), Color::RED);
        let none = Color::RED.with_alpha(0.0).blend_over(dst);
        assert_abs_diff_eq!(none.b, 1.0);
        assert_abs_diff_eq!(none.r, 0.0);

        let tenth = Color::RED.with_alpha(0.1).blend_over(dst);
        assert_abs_diff_eq!(tenth.r, 0.1, epsilon = 1e-6);
        assert_abs_diff_eq!(tenth.b, 0.9, epsilon = 1e-6);
    }
}
