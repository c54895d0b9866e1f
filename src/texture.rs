//! CPU-resident textures and the sampling seam used by the rasterizer.
//!
//! Decoding goes through the `image` crate; once loaded, a [`Texture`] is a
//! plain RGBA8 grid. The rasterizer never owns textures. It asks a
//! [`TextureSampler`] for a color at a UV coordinate, which keeps texture
//! management outside the core.

use std::path::Path;

use glam::Vec2;

use crate::color::Color;

/// Returned for any handle the sampler does not know about.
pub const FALLBACK_COLOR: Color = Color::MAGENTA;

/// Type-safe handle to a texture stored in a [`TextureCache`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub(crate) u32);

/// Anything that can turn a handle and a UV coordinate into a color.
///
/// Implementations must be deterministic and must not fail: an unknown
/// handle yields a fallback color.
pub trait TextureSampler {
    fn sample(&self, handle: TextureHandle, uv: Vec2) -> Color;
}

/// A decoded RGBA8 image.
#[derive(Clone, Debug)]
pub struct Texture {
    texels: Vec<[u8; 4]>,
    pub width: u32,
    pub height: u32,
}

impl Texture {
    /// Create a texture from tightly packed RGBA bytes.
    ///
    /// Missing trailing bytes are treated as transparent black.
    pub fn from_rgba(data: &[u8], width: u32, height: u32) -> Self {
        let count = (width as usize) * (height as usize);
        let mut texels: Vec<[u8; 4]> = data
            .chunks_exact(4)
            .take(count)
            .map(|c| [c[0], c[1], c[2], c[3]])
            .collect();
        texels.resize(count, [0; 4]);
        Self {
            texels,
            width,
            height,
        }
    }

    /// Load a texture from an image file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, image::ImageError> {
        let img = image::open(path)?.to_rgba8();
        let (width, height) = img.dimensions();
        Ok(Self::from_rgba(&img, width, height))
    }

    /// Load a texture from embedded bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, image::ImageError> {
        let img = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = img.dimensions();
        Ok(Self::from_rgba(&img, width, height))
    }

    /// A `size`×`size` checkerboard with `cells` squares per side.
    pub fn checkerboard(size: u32, cells: u32, a: Color, b: Color) -> Self {
        let cell = (size / cells.max(1)).max(1);
        let (a, b) = (rgba8(a), rgba8(b));
        let mut data = Vec::with_capacity((size * size * 4) as usize);
        for y in 0..size {
            for x in 0..size {
                let texel = if (x / cell + y / cell) % 2 == 0 { a } else { b };
                data.extend_from_slice(&texel);
            }
        }
        Self::from_rgba(&data, size, size)
    }

    /// Nearest-neighbour lookup with repeat wrapping. `v = 0` is the top row.
    pub fn sample(&self, uv: Vec2) -> Color {
        if self.texels.is_empty() || !uv.is_finite() {
            return FALLBACK_COLOR;
        }
        let u = uv.x - uv.x.floor();
        let v = uv.y - uv.y.floor();
        let x = ((u * self.width as f32) as u32).min(self.width - 1);
        let y = ((v * self.height as f32) as u32).min(self.height - 1);
        let [r, g, b, a] = self.texels[(y * self.width + x) as usize];
        Color::rgba(
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            a as f32 / 255.0,
        )
    }
}

fn rgba8(c: Color) -> [u8; 4] {
    let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    [q(c.r), q(c.g), q(c.b), q(c.a)]
}

/// Owns decoded textures and hands out handles to them.
#[derive(Debug, Default)]
pub struct TextureCache {
    textures: Vec<Texture>,
}

impl TextureCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, texture: Texture) -> TextureHandle {
        self.textures.push(texture);
        TextureHandle((self.textures.len() - 1) as u32)
    }

    /// Decodes an image file and stores it.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<TextureHandle, image::ImageError> {
        let path = path.as_ref();
        let texture = Texture::from_file(path)?;
        log::info!(
            "loaded texture {} ({}x{})",
            path.display(),
            texture.width,
            texture.height
        );
        Ok(self.insert(texture))
    }

    pub fn get(&self, handle: TextureHandle) -> Option<&Texture> {
        self.textures.get(handle.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}

impl TextureSampler for TextureCache {
    fn sample(&self, handle: TextureHandle, uv: Vec2) -> Color {
        self.get(handle)
            .map_or(FALLBACK_COLOR, |texture| texture.sample(uv))
    }
}

/// A sampler with no textures; every lookup yields [`FALLBACK_COLOR`].
#[derive(Clone, Copy, Debug, Default)]
pub struct NoTextures;

impl TextureSampler for NoTextures {
    fn sample(&self, _handle: TextureHandle, _uv: Vec2) -> Color {
        FALLBACK_COLOR
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearest_sampling_picks_quadrants() {
        let tex = Texture::checkerboard(4, 2, Color::WHITE, Color::BLACK);
        assert_eq!(tex.sample(Vec2::new(0.1, 0.1)), Color::WHITE);
        assert_eq!(tex.sample(Vec2::new(0.9, 0.1)), Color::BLACK);
        assert_eq!(tex.sample(Vec2::new(0.9, 0.9)), Color::WHITE);
    }

    #[test]
    fn sampling_wraps() {
        let tex = Texture::checkerboard(4, 2, Color::WHITE, Color::BLACK);
        assert_eq!(tex.sample(Vec2::new(1.1, 0.1)), tex.sample(Vec2::new(0.1, 0.1)));
        assert_eq!(tex.sample(Vec2::new(-0.1, 0.1)), tex.sample(Vec2::new(0.9, 0.1)));
        assert_eq!(tex.sample(Vec2::new(1.0, 1.0)), tex.sample(Vec2::ZERO));
    }

    #[test]
    fn unknown_handle_falls_back() {
        let mut cache = TextureCache::new();
        let known = cache.insert(Texture::checkerboard(2, 1, Color::GREEN, Color::GREEN));
        assert_eq!(cache.sample(known, Vec2::ZERO), Color::GREEN);
        assert_eq!(cache.sample(TextureHandle(7), Vec2::ZERO), FALLBACK_COLOR);
        assert_eq!(NoTextures.sample(known, Vec2::ZERO), FALLBACK_COLOR);
    }

    fn encode_png(texture: &Texture) -> Vec<u8> {
        let data: Vec<u8> = texture.texels.iter().flatten().copied().collect();
        let img = image::RgbaImage::from_raw(texture.width, texture.height, data).unwrap();
        let mut bytes = std::io::Cursor::new(Vec::new());
        img.write_to(&mut bytes, image::ImageFormat::Png).unwrap();
        bytes.into_inner()
    }

    #[test]
    fn decodes_embedded_png() {
        let source = Texture::checkerboard(4, 2, Color::RED, Color::BLUE);
        let tex = Texture::from_bytes(&encode_png(&source)).unwrap();
        assert_eq!((tex.width, tex.height), (4, 4));
        assert_eq!(tex.sample(Vec2::new(0.1, 0.1)), Color::RED);
        assert_eq!(tex.sample(Vec2::new(0.9, 0.1)), Color::BLUE);
        assert!(Texture::from_bytes(b"not an image").is_err());
    }

    #[test]
    fn cache_loads_files() {
        let path = std::env::temp_dir().join(format!("tessera-cache-{}.png", std::process::id()));
        let source = Texture::checkerboard(2, 2, Color::GREEN, Color::WHITE);
        std::fs::write(&path, encode_png(&source)).unwrap();

        let mut cache = TextureCache::new();
        let handle = cache.load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.sample(handle, Vec2::new(0.25, 0.25)), Color::GREEN);
        assert!(cache.load(path.with_extension("missing.png")).is_err());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn short_data_is_padded() {
        let tex = Texture::from_rgba(&[255, 0, 0, 255], 2, 1);
        assert_eq!(tex.sample(Vec2::new(0.25, 0.0)), Color::RED);
        assert_eq!(tex.sample(Vec2::new(0.75, 0.0)), Color::TRANSPARENT);
    }
}
