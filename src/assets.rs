//! Resolves object names to [`SceneObject`]s.
//!
//! A name is first matched against the built-in [`primitives`](crate::primitives);
//! anything else is looked up as `<root>/<name>.stl`. Names that already carry
//! an extension are loaded as-is and dispatched on that extension.
//!
//! ```no_run
//! use tessera::AssetLoader;
//!
//! let loader = AssetLoader::new("assets").centered().normalized();
//! let teapot = loader.load_object("teapot")?;
//! let cube = loader.load_object("cube")?;
//! # Ok::<(), tessera::GeometryError>(())
//! ```

use std::io::{Read, Seek};
use std::path::{Path, PathBuf};

use glam::{Quat, Vec2, Vec3};

use crate::batch::VertexBatch;
use crate::color::Color;
use crate::error::GeometryError;
use crate::primitives;
use crate::scene::{Primitive, SceneObject};

/// Loads geometry from disk or from the built-in primitives.
#[derive(Clone, Debug)]
pub struct AssetLoader {
    root: PathBuf,
    center: bool,
    normalize: bool,
    rotation: Option<Quat>,
}

impl AssetLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            center: false,
            normalize: false,
            rotation: None,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Move loaded files so their bounding box is centred on the origin.
    pub fn centered(mut self) -> Self {
        self.center = true;
        self
    }

    /// Scale loaded files so their largest dimension is 1.
    pub fn normalized(mut self) -> Self {
        self.normalize = true;
        self
    }

    /// Convert Z-up files (common for STL exports) to Y-up.
    pub fn upright(mut self) -> Self {
        self.rotation = Some(Quat::from_rotation_x(-std::f32::consts::FRAC_PI_2));
        self
    }

    /// Built-in primitive or `<root>/<name>.stl`.
    pub fn load_object(&self, name: &str) -> Result<SceneObject, GeometryError> {
        let object = match name {
            "triangle" => primitives::triangle(),
            "quad" => primitives::quad(Vec3::ZERO, Vec2::ONE, Color::WHITE),
            "cube" => primitives::cube(),
            "plane" => primitives::plane(1.0),
            "sphere" => primitives::sphere(32, 16),
            _ => {
                let path = self.root.join(name);
                let path = if path.extension().is_some() {
                    path
                } else {
                    path.with_extension("stl")
                };
                self.load_file(&path)
            }
        }?;
        log::info!(
            "loaded '{}' ({} vertices, {} triangles)",
            name,
            object.vertex_count(),
            object.triangle_count()
        );
        Ok(object)
    }

    /// Loads a file, choosing the parser by extension.
    pub fn load_file(&self, path: &Path) -> Result<SceneObject, GeometryError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_lowercase())
            .unwrap_or_default();
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unnamed");

        match ext.as_str() {
            "stl" => {
                let file = std::fs::File::open(path)?;
                let mut reader = std::io::BufReader::new(file);
                self.parse_stl(name, &mut reader)
            }
            _ => Err(GeometryError::UnknownFormat(ext)),
        }
    }

    /// Parses an STL file already in memory, ASCII or binary.
    pub fn load_stl_bytes(&self, name: &str, bytes: &[u8]) -> Result<SceneObject, GeometryError> {
        self.parse_stl(name, &mut std::io::Cursor::new(bytes))
    }

    fn parse_stl<R: Read + Seek>(
        &self,
        name: &str,
        reader: &mut R,
    ) -> Result<SceneObject, GeometryError> {
        let stl = stl_io::read_stl(reader)
            .map_err(|e| GeometryError::Parse(format!("STL: {e}")))?;

        // STL normals are per face, so each face gets its own three vertices.
        let mut points = Vec::with_capacity(stl.faces.len() * 3);
        let mut normals = Vec::with_capacity(stl.faces.len() * 3);
        for face in &stl.faces {
            let normal = Vec3::from(<[f32; 3]>::from(face.normal));
            for &index in &face.vertices {
                let vertex = stl.vertices.get(index).ok_or_else(|| {
                    GeometryError::Parse(format!("STL face references missing vertex {index}"))
                })?;
                points.push(Vec3::from(<[f32; 3]>::from(*vertex)));
                normals.push(normal);
            }
        }

        // Some exporters write zero normals and rely on the winding.
        let normals = if normals.iter().all(|n| *n == Vec3::ZERO) {
            Vec::new()
        } else {
            normals
        };

        let mut batch = VertexBatch::new(points, normals, Vec::new(), Vec::new())?;
        self.apply_transforms(&mut batch);
        let indices: Vec<u32> = (0..batch.len() as u32).collect();
        SceneObject::new(name, batch, Primitive::triangles(&indices))
    }

    fn apply_transforms(&self, batch: &mut VertexBatch) {
        if batch.is_empty() {
            return;
        }
        if self.center {
            let (min, max) = bounds(batch);
            batch.translate(-(min + max) * 0.5);
        }
        if let Some(rotation) = self.rotation {
            for p in &mut batch.positions {
                *p = (rotation * p.truncate()).extend(p.w);
            }
            for n in &mut batch.normals {
                *n = (rotation * n.truncate()).extend(0.0);
            }
        }
        if self.normalize {
            let (min, max) = bounds(batch);
            let size = (max - min).max_element();
            if size > 0.0 {
                batch.scale(1.0 / size);
            }
        }
    }
}

fn bounds(batch: &VertexBatch) -> (Vec3, Vec3) {
    batch.positions().iter().map(|p| p.truncate()).fold(
        (Vec3::splat(f32::INFINITY), Vec3::splat(f32::NEG_INFINITY)),
        |(min, max), p| (min.min(p), max.max(p)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use glam::Vec4;

    const TETRA: &str = "solid tetra
facet normal 0 0 -1
  outer loop
    vertex 0 0 0
    vertex 0 2 0
    vertex 2 0 0
  endloop
endfacet
facet normal 0 -1 0
  outer loop
    vertex 0 0 0
    vertex 2 0 0
    vertex 0 0 2
  endloop
endfacet
endsolid tetra
";

    #[test]
    fn builtins_resolve_without_files() {
        let loader = AssetLoader::new("/nonexistent");
        for name in ["triangle", "quad", "cube", "plane", "sphere"] {
            let obj = loader.load_object(name).unwrap();
            assert!(obj.triangle_count() > 0, "{name}");
        }
    }

    #[test]
    fn parses_ascii_stl() {
        let obj = AssetLoader::new(".").load_stl_bytes("tetra", TETRA.as_bytes()).unwrap();
        assert_eq!(obj.name(), "tetra");
        assert_eq!(obj.vertex_count(), 6);
        assert_eq!(obj.triangle_count(), 2);
        assert!(!obj.batch().has_uvs());
        assert_eq!(obj.batch().face_normals()[0], Vec4::new(0.0, 0.0, -1.0, 0.0));
    }

    #[test]
    fn centered_and_normalized() {
        let loader = AssetLoader::new(".").centered().normalized();
        let obj = loader.load_stl_bytes("tetra", TETRA.as_bytes()).unwrap();
        let (min, max) = bounds(obj.batch());
        assert_abs_diff_eq!((max - min).max_element(), 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!((min + max).length(), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let result = AssetLoader::new(".").load_stl_bytes("junk", b"not an stl file");
        assert!(result.is_err());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = AssetLoader::new("/definitely/not/here").load_object("teapot").unwrap_err();
        assert!(matches!(err, GeometryError::Io(_)));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = AssetLoader::new(".").load_object("model.obj").unwrap_err();
        assert!(matches!(err, GeometryError::UnknownFormat(ext) if ext == "obj"));
    }
}
