//! The CPU render target: packed ARGB pixels plus a depth buffer.
//!
//! All pixel writes from the rasterizer go through
//! [`Framebuffer::write_fragment`], which owns the depth and blend policy.

use crate::color::Color;

/// Depth value of a cleared pixel. Anything finite is nearer.
pub const FAR_DEPTH: f32 = f32::INFINITY;

/// Whether a write consults and updates the depth buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DepthTest {
    Enabled,
    Disabled,
}

/// A `width × height` grid of `0xAARRGGBB` pixels, row-major, top row first.
#[derive(Clone, Debug)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
    depth: Vec<f32>,
    background: Color,
}

impl Framebuffer {
    pub fn new(width: u32, height: u32, background: Color) -> Self {
        let count = width as usize * height as usize;
        Self {
            width,
            height,
            pixels: vec![background.to_argb(); count],
            depth: vec![FAR_DEPTH; count],
            background,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn background(&self) -> Color {
        self.background
    }

    /// Takes effect on the next [`clear`](Self::clear).
    pub fn set_background(&mut self, background: Color) {
        self.background = background;
    }

    /// Fills every pixel with the background and resets depth to [`FAR_DEPTH`].
    pub fn clear(&mut self) {
        self.pixels.fill(self.background.to_argb());
        self.depth.fill(FAR_DEPTH);
    }

    /// The finished frame, ready for display.
    pub fn present(&self) -> &[u32] {
        &self.pixels
    }

    /// The frame as raw bytes. On little-endian targets each pixel is laid
    /// out B, G, R, A.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height).then(|| (y * self.width + x) as usize)
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    pub fn color_at(&self, x: u32, y: u32) -> Option<Color> {
        self.pixel(x, y).map(Color::from_argb)
    }

    pub fn depth_at(&self, x: u32, y: u32) -> Option<f32> {
        self.index(x, y).map(|i| self.depth[i])
    }

    /// Writes one shaded fragment. Returns whether the pixel changed.
    ///
    /// With depth testing enabled a fragment only survives if it is strictly
    /// nearer than what is stored. After that:
    ///
    /// Alpha is judged at the 8-bit precision the pixel stores, so
    /// interpolation noise such as `0.9999999` still counts as opaque:
    ///
    /// - alpha that packs to 0 leaves color and depth untouched;
    /// - alpha that packs to 255 replaces the color and records the depth;
    /// - anything in between is blended over the stored color and leaves the
    ///   depth alone, so geometry behind a translucent surface still draws.
    pub fn write_fragment(
        &mut self,
        x: u32,
        y: u32,
        depth: f32,
        color: Color,
        test: DepthTest,
    ) -> bool {
        let Some(i) = self.index(x, y) else {
            return false;
        };
        let nearer = depth < self.depth[i];
        if test == DepthTest::Enabled && !nearer {
            return false;
        }
        let alpha = quantize_alpha(color.a);
        if alpha == 0 {
            return false;
        }
        if alpha == u8::MAX {
            self.pixels[i] = color.with_alpha(1.0).to_argb();
            if test == DepthTest::Enabled {
                self.depth[i] = depth;
            }
        } else {
            let dst = Color::from_argb(self.pixels[i]);
            self.pixels[i] = color.blend_over(dst).to_argb();
        }
        true
    }
}

/// Alpha as it would be stored in a packed pixel. NaN counts as 0.
fn quantize_alpha(a: f32) -> u8 {
    if a.is_nan() {
        return 0;
    }
    (a.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn fb() -> Framebuffer {
        Framebuffer::new(4, 3, Color::BLACK)
    }

    #[test]
    fn clear_resets_color_and_depth() {
        let mut fb = fb();
        fb.write_fragment(1, 1, 0.5, Color::RED, DepthTest::Enabled);
        fb.set_background(Color::BLUE);
        fb.clear();
        assert!(fb.present().iter().all(|&p| p == 0xFF0000FF));
        assert_eq!(fb.depth_at(1, 1), Some(FAR_DEPTH));
    }

    #[test]
    fn out_of_range_writes_are_ignored() {
        let mut fb = fb();
        assert!(!fb.write_fragment(4, 0, 0.1, Color::RED, DepthTest::Enabled));
        assert!(!fb.write_fragment(0, 3, 0.1, Color::RED, DepthTest::Disabled));
        assert!(fb.present().iter().all(|&p| p == Color::BLACK.to_argb()));
        assert_eq!(fb.pixel(9, 9), None);
    }

    #[test]
    fn depth_test_is_strict() {
        let mut fb = fb();
        assert!(fb.write_fragment(0, 0, 0.5, Color::RED, DepthTest::Enabled));
        assert!(!fb.write_fragment(0, 0, 0.5, Color::GREEN, DepthTest::Enabled));
        assert!(!fb.write_fragment(0, 0, 0.7, Color::GREEN, DepthTest::Enabled));
        assert!(fb.write_fragment(0, 0, 0.2, Color::BLUE, DepthTest::Enabled));
        assert_eq!(fb.color_at(0, 0), Some(Color::BLUE));
        assert_eq!(fb.depth_at(0, 0), Some(0.2));
    }

    #[test]
    fn zero_alpha_changes_nothing() {
        let mut fb = fb();
        fb.write_fragment(2, 2, 0.5, Color::BLUE, DepthTest::Enabled);
        let before = (fb.pixel(2, 2), fb.depth_at(2, 2));
        assert!(!fb.write_fragment(2, 2, 0.1, Color::RED.with_alpha(0.0), DepthTest::Enabled));
        assert_eq!((fb.pixel(2, 2), fb.depth_at(2, 2)), before);
    }

    #[test]
    fn opaque_replaces_and_writes_depth() {
        let mut fb = fb();
        fb.write_fragment(2, 2, 0.5, Color::BLUE, DepthTest::Enabled);
        assert!(fb.write_fragment(2, 2, 0.1, Color::RED, DepthTest::Enabled));
        assert_eq!(fb.pixel(2, 2), Some(0xFFFF0000));
        assert_eq!(fb.depth_at(2, 2), Some(0.1));
    }

    #[test]
    fn nearly_opaque_counts_as_opaque() {
        let mut fb = fb();
        fb.write_fragment(3, 1, 0.5, Color::BLUE, DepthTest::Enabled);
        let almost = Color::RED.with_alpha(0.999_999_9);
        assert!(fb.write_fragment(3, 1, 0.2, almost, DepthTest::Enabled));
        assert_eq!(fb.pixel(3, 1), Some(0xFFFF0000));
        assert_eq!(fb.depth_at(3, 1), Some(0.2));
    }

    #[test]
    fn nearly_transparent_counts_as_transparent() {
        let mut fb = fb();
        fb.write_fragment(3, 2, 0.5, Color::BLUE, DepthTest::Enabled);
        let before = (fb.pixel(3, 2), fb.depth_at(3, 2));
        let faint = Color::RED.with_alpha(1.0e-4);
        assert!(!fb.write_fragment(3, 2, 0.2, faint, DepthTest::Enabled));
        let nan = Color::RED.with_alpha(f32::NAN);
        assert!(!fb.write_fragment(3, 2, 0.2, nan, DepthTest::Enabled));
        assert_eq!((fb.pixel(3, 2), fb.depth_at(3, 2)), before);
    }

    #[test]
    fn translucent_blends_without_depth_write() {
        let mut fb = fb();
        fb.write_fragment(1, 0, 0.5, Color::BLUE, DepthTest::Enabled);
        assert!(fb.write_fragment(1, 0, 0.2, Color::RED.with_alpha(0.25), DepthTest::Enabled));
        let c = fb.color_at(1, 0).unwrap();
        assert_abs_diff_eq!(c.r, 0.25, epsilon = 1.0 / 255.0);
        assert_abs_diff_eq!(c.b, 0.75, epsilon = 1.0 / 255.0);
        assert_eq!(fb.depth_at(1, 0), Some(0.5));
    }

    #[test]
    fn disabled_depth_test_never_records_depth() {
        let mut fb = fb();
        assert!(fb.write_fragment(0, 1, 5.0, Color::GREEN, DepthTest::Disabled));
        assert_eq!(fb.depth_at(0, 1), Some(FAR_DEPTH));
    }

    #[test]
    fn bytes_are_bgra_on_little_endian() {
        let mut fb = Framebuffer::new(1, 1, Color::BLACK);
        fb.write_fragment(0, 0, 0.0, Color::rgb(1.0, 0.5, 0.0), DepthTest::Enabled);
        if cfg!(target_endian = "little") {
            assert_eq!(fb.as_bytes(), &[0x00, 0x80, 0xFF, 0xFF]);
        }
    }
}
