//! Renderable objects: a vertex batch plus the triangles that index it.

use glam::Vec3;

use crate::batch::VertexBatch;
use crate::color::Color;
use crate::error::GeometryError;
use crate::texture::TextureHandle;

/// One triangle of a [`SceneObject`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Primitive {
    /// Vertex indices into the owning object's batch, counter-clockwise.
    pub indices: [u32; 3],
    /// Flat color that replaces the interpolated vertex colors.
    pub color: Option<Color>,
    /// Texture sampled across this triangle. Not owned.
    pub texture: Option<TextureHandle>,
}

impl Primitive {
    pub fn new(a: u32, b: u32, c: u32) -> Self {
        Self {
            indices: [a, b, c],
            color: None,
            texture: None,
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_texture(mut self, texture: TextureHandle) -> Self {
        self.texture = Some(texture);
        self
    }

    /// Builds primitives from a flat index list, three indices per triangle.
    ///
    /// Trailing indices that do not form a full triangle are ignored.
    pub fn triangles(indices: &[u32]) -> Vec<Self> {
        indices
            .chunks_exact(3)
            .map(|t| Self::new(t[0], t[1], t[2]))
            .collect()
    }
}

/// One renderable unit: geometry, its triangles and their face normals.
///
/// A `SceneObject` can only be built through [`SceneObject::new`], which
/// checks every index against the batch. The rasterizer relies on that and
/// does no bounds checking of its own.
#[derive(Clone, Debug)]
pub struct SceneObject {
    name: String,
    batch: VertexBatch,
    primitives: Vec<Primitive>,
}

impl SceneObject {
    /// Validates the geometry and computes one face normal per primitive.
    ///
    /// Face normals average the vertex normals when the batch has them and
    /// fall back to the triangle's geometric normal otherwise.
    pub fn new(
        name: impl Into<String>,
        mut batch: VertexBatch,
        primitives: Vec<Primitive>,
    ) -> Result<Self, GeometryError> {
        batch.validate()?;
        let vertex_count = batch.len();
        for (primitive, p) in primitives.iter().enumerate() {
            if let Some(&index) = p.indices.iter().find(|&&i| i as usize >= vertex_count) {
                return Err(GeometryError::IndexOutOfRange {
                    primitive,
                    index,
                    vertex_count,
                });
            }
        }

        batch.set_face_normal_count(primitives.len());
        for (slot, p) in primitives.iter().enumerate() {
            let [a, b, c] = p.indices.map(|i| i as usize);
            if batch.has_normals() {
                batch.compute_face_normal(a, b, c, slot);
            } else {
                batch.compute_geometric_face_normal(a, b, c, slot);
            }
        }
        batch.normalize_face_normals();

        Ok(Self {
            name: name.into(),
            batch,
            primitives,
        })
    }

    /// Binds `texture` to every primitive that has none yet.
    pub fn with_texture(mut self, texture: TextureHandle) -> Self {
        for p in self.primitives.iter_mut().filter(|p| p.texture.is_none()) {
            p.texture = Some(texture);
        }
        self
    }

    /// Gives every primitive the same flat color.
    pub fn with_color(mut self, color: Color) -> Self {
        for p in &mut self.primitives {
            p.color = Some(color);
        }
        self
    }

    /// Moves every vertex by `offset`. Normals are unaffected.
    pub fn translated(mut self, offset: Vec3) -> Self {
        self.batch.translate(offset);
        self
    }

    /// Merges `other` into this object.
    ///
    /// The batches are combined column by column and `other`'s indices are
    /// re-based past this object's vertices.
    pub fn append(&mut self, other: &SceneObject) -> Result<(), GeometryError> {
        let base = self.batch.len() as u32;
        self.batch.combine(&other.batch)?;
        self.primitives
            .extend(other.primitives.iter().map(|p| Primitive {
                indices: p.indices.map(|i| i + base),
                ..*p
            }));
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn batch(&self) -> &VertexBatch {
        &self.batch
    }

    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    /// Sets or clears the flat color of one primitive. Returns `false` if
    /// there is no such primitive.
    pub fn set_primitive_color(&mut self, primitive: usize, color: Option<Color>) -> bool {
        match self.primitives.get_mut(primitive) {
            Some(p) => {
                p.color = color;
                true
            }
            None => false,
        }
    }

    pub fn set_primitive_texture(
        &mut self,
        primitive: usize,
        texture: Option<TextureHandle>,
    ) -> bool {
        match self.primitives.get_mut(primitive) {
            Some(p) => {
                p.texture = texture;
                true
            }
            None => false,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.batch.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.primitives.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    fn square() -> VertexBatch {
        VertexBatch::from_positions(vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ])
    }

    #[test]
    fn rejects_out_of_range_indices() {
        let err = SceneObject::new("bad", square(), Primitive::triangles(&[0, 1, 2, 2, 3, 4]))
            .unwrap_err();
        assert!(matches!(
            err,
            GeometryError::IndexOutOfRange { primitive: 1, index: 4, vertex_count: 4 }
        ));
    }

    #[test]
    fn rejects_malformed_batch() {
        let mut batch = square();
        batch.colors = vec![Vec4::ONE; 2];
        assert!(SceneObject::new("bad", batch, vec![]).is_err());
    }

    #[test]
    fn computes_face_normals_per_primitive() {
        let obj = SceneObject::new("square", square(), Primitive::triangles(&[0, 1, 2, 2, 3, 0]))
            .unwrap();
        assert_eq!(obj.batch().face_normals().len(), 2);
        for n in obj.batch().face_normals() {
            assert_eq!(*n, Vec4::new(0.0, 0.0, 1.0, 0.0));
        }
    }

    #[test]
    fn append_rebases_indices() {
        let mut a = SceneObject::new("a", square(), Primitive::triangles(&[0, 1, 2])).unwrap();
        let b = SceneObject::new("b", square(), Primitive::triangles(&[1, 2, 3])).unwrap();
        a.append(&b).unwrap();
        assert_eq!(a.vertex_count(), 8);
        assert_eq!(a.primitives()[1].indices, [5, 6, 7]);
        assert_eq!(a.batch().face_normals().len(), a.triangle_count());
    }

    #[test]
    fn translation_keeps_face_normals() {
        let obj = SceneObject::new("square", square(), Primitive::triangles(&[0, 1, 2]))
            .unwrap()
            .translated(Vec3::new(0.0, 0.0, -2.0));
        assert_eq!(obj.batch().positions()[1], Vec4::new(1.0, 0.0, -2.0, 1.0));
        assert_eq!(obj.batch().face_normals()[0], Vec4::new(0.0, 0.0, 1.0, 0.0));
    }

    #[test]
    fn texture_only_fills_gaps() {
        let prims = vec![
            Primitive::new(0, 1, 2).with_texture(TextureHandle(3)),
            Primitive::new(2, 3, 0),
        ];
        let obj = SceneObject::new("t", square(), prims)
            .unwrap()
            .with_texture(TextureHandle(9));
        assert_eq!(obj.primitives()[0].texture, Some(TextureHandle(3)));
        assert_eq!(obj.primitives()[1].texture, Some(TextureHandle(9)));
    }

    #[test]
    fn overrides_only_touch_existing_primitives() {
        let mut obj = SceneObject::new("o", square(), Primitive::triangles(&[0, 1, 2])).unwrap();
        assert!(obj.set_primitive_color(0, Some(Color::RED)));
        assert!(!obj.set_primitive_color(1, Some(Color::RED)));
        assert!(!obj.set_primitive_texture(5, None));
        assert_eq!(obj.primitives()[0].color, Some(Color::RED));
    }
}
