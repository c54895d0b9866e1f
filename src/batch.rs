//! Column-oriented vertex storage.
//!
//! A [`VertexBatch`] keeps every vertex attribute in its own contiguous
//! column instead of an array of per-vertex structs. Transforms walk one
//! column at a time, which keeps the hot loops cache friendly.
//!
//! # Column Invariant
//!
//! `positions` defines the vertex count. Each optional column (`normals`,
//! `uvs`, `colors`) is either empty, meaning "not provided", or has exactly
//! one entry per position. Every operation in this module preserves that, and
//! fails before mutating anything when it cannot.
//!
//! `face_normals` is sized by the owning object's primitive count and is
//! independent of the vertex count.
//!
//! | Column         | Type   | Notes                              |
//! |----------------|--------|------------------------------------|
//! | `positions`    | `Vec4` | homogeneous, `w = 1`               |
//! | `normals`      | `Vec4` | unit xyz, `w = 0`                  |
//! | `uvs`          | `Vec2` | texture coordinates                |
//! | `colors`       | `Vec4` | straight RGBA in `[0, 1]`          |
//! | `face_normals` | `Vec4` | one per primitive, unit xyz, `w=0` |

use glam::{Vec2, Vec3, Vec4};

use crate::error::GeometryError;

/// A single vertex gathered from every column of a [`VertexBatch`].
///
/// Absent columns come back as neutral values: a zero normal, a zero UV and
/// opaque white.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vertex {
    pub position: Vec4,
    pub normal: Vec4,
    pub uv: Vec2,
    pub color: Vec4,
}

/// Structure-of-arrays storage for a group of vertices.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VertexBatch {
    pub(crate) positions: Vec<Vec4>,
    pub(crate) normals: Vec<Vec4>,
    pub(crate) uvs: Vec<Vec2>,
    pub(crate) colors: Vec<Vec4>,
    pub(crate) face_normals: Vec<Vec4>,
}

impl VertexBatch {
    /// Builds a batch from per-attribute columns.
    ///
    /// Points are stored with `w = 1`. Normals are stored with `w = 0` and
    /// normalized. Any optional column may be empty; a populated one must
    /// match the number of points.
    pub fn new(
        points: Vec<Vec3>,
        normals: Vec<Vec3>,
        uvs: Vec<Vec2>,
        colors: Vec<Vec4>,
    ) -> Result<Self, GeometryError> {
        let count = points.len();
        check_column("normals", count, normals.len())?;
        check_column("uvs", count, uvs.len())?;
        check_column("colors", count, colors.len())?;

        let mut batch = Self {
            positions: points.into_iter().map(|p| p.extend(1.0)).collect(),
            normals: normals.into_iter().map(|n| n.extend(0.0)).collect(),
            uvs,
            colors,
            face_normals: Vec::new(),
        };
        batch.normalize_normals();
        Ok(batch)
    }

    /// A batch with positions only.
    pub fn from_positions(points: Vec<Vec3>) -> Self {
        Self {
            positions: points.into_iter().map(|p| p.extend(1.0)).collect(),
            ..Default::default()
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn has_normals(&self) -> bool {
        !self.normals.is_empty()
    }

    pub fn has_uvs(&self) -> bool {
        !self.uvs.is_empty()
    }

    pub fn has_colors(&self) -> bool {
        !self.colors.is_empty()
    }

    pub fn positions(&self) -> &[Vec4] {
        &self.positions
    }

    pub fn normals(&self) -> &[Vec4] {
        &self.normals
    }

    pub fn uvs(&self) -> &[Vec2] {
        &self.uvs
    }

    pub fn colors(&self) -> &[Vec4] {
        &self.colors
    }

    pub fn face_normals(&self) -> &[Vec4] {
        &self.face_normals
    }

    /// Re-checks the column invariant.
    pub fn validate(&self) -> Result<(), GeometryError> {
        let count = self.len();
        check_column("normals", count, self.normals.len())?;
        check_column("uvs", count, self.uvs.len())?;
        check_column("colors", count, self.colors.len())
    }

    /// Appends `other` column by column.
    ///
    /// Every column, face normals included, is concatenated into its own
    /// destination. When one batch provides an optional column and the other
    /// does not, the result would break the column invariant, so the call
    /// fails and `self` is left untouched.
    pub fn combine(&mut self, other: &VertexBatch) -> Result<(), GeometryError> {
        let total = self.len() + other.len();
        check_column("normals", total, self.normals.len() + other.normals.len())?;
        check_column("uvs", total, self.uvs.len() + other.uvs.len())?;
        check_column("colors", total, self.colors.len() + other.colors.len())?;

        self.positions.extend_from_slice(&other.positions);
        self.normals.extend_from_slice(&other.normals);
        self.uvs.extend_from_slice(&other.uvs);
        self.colors.extend_from_slice(&other.colors);
        self.face_normals.extend_from_slice(&other.face_normals);
        Ok(())
    }

    /// Truncates or extends every populated column to `new_len`.
    ///
    /// Existing entries keep their indices. New positions are `(0, 0, 0, 1)`,
    /// new normals, UVs and colors are zero. Empty optional columns stay empty.
    pub fn resize(&mut self, new_len: usize) {
        self.positions.resize(new_len, Vec4::W);
        if self.has_normals() {
            self.normals.resize(new_len, Vec4::ZERO);
        }
        if self.has_uvs() {
            self.uvs.resize(new_len, Vec2::ZERO);
        }
        if self.has_colors() {
            self.colors.resize(new_len, Vec4::ZERO);
        }
    }

    /// Forces `w = 0` on every vertex normal and renormalizes its xyz.
    ///
    /// Zero-length normals stay zero.
    pub fn normalize_normals(&mut self) {
        normalize_directions(&mut self.normals);
    }

    /// Same as [`normalize_normals`](Self::normalize_normals) for face normals.
    pub fn normalize_face_normals(&mut self) {
        normalize_directions(&mut self.face_normals);
    }

    /// Sizes the face normal column, zero-filling new slots.
    pub fn set_face_normal_count(&mut self, count: usize) {
        self.face_normals.resize(count, Vec4::ZERO);
    }

    /// Averages three vertex normals into `face_normals[slot]`.
    ///
    /// Indices must be in range and the batch must carry normals; the
    /// owning [`SceneObject`](crate::SceneObject) checks both at load time.
    pub fn compute_face_normal(&mut self, a: usize, b: usize, c: usize, slot: usize) {
        let sum =
            self.normals[a].truncate() + self.normals[b].truncate() + self.normals[c].truncate();
        self.face_normals[slot] = sum.normalize_or_zero().extend(0.0);
    }

    /// Face normal from the triangle's winding, for batches without normals.
    ///
    /// Counter-clockwise triangles get a normal pointing towards the viewer.
    pub fn compute_geometric_face_normal(&mut self, a: usize, b: usize, c: usize, slot: usize) {
        let pa = self.positions[a].truncate();
        let pb = self.positions[b].truncate();
        let pc = self.positions[c].truncate();
        let n = (pb - pa).cross(pc - pa);
        self.face_normals[slot] = n.normalize_or_zero().extend(0.0);
    }

    /// Gathers vertex `i` across all columns.
    pub fn vertex(&self, i: usize) -> Vertex {
        Vertex {
            position: self.positions[i],
            normal: self.normals.get(i).copied().unwrap_or(Vec4::ZERO),
            uv: self.uvs.get(i).copied().unwrap_or(Vec2::ZERO),
            color: self.colors.get(i).copied().unwrap_or(Vec4::ONE),
        }
    }

    /// Moves every position by `offset`.
    pub fn translate(&mut self, offset: Vec3) {
        for p in &mut self.positions {
            *p += offset.extend(0.0);
        }
    }

    /// Scales every position uniformly around the origin.
    pub fn scale(&mut self, factor: f32) {
        for p in &mut self.positions {
            *p = (p.truncate() * factor).extend(p.w);
        }
    }
}

fn check_column(column: &'static str, expected: usize, found: usize) -> Result<(), GeometryError> {
    if found == 0 || found == expected {
        Ok(())
    } else {
        Err(GeometryError::ColumnLength {
            column,
            expected,
            found,
        })
    }
}

fn normalize_directions(column: &mut [Vec4]) {
    for n in column {
        *n = n.truncate().normalize_or_zero().extend(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn tri(offset: f32) -> VertexBatch {
        VertexBatch::new(
            vec![
                Vec3::new(offset, 0.0, 0.0),
                Vec3::new(offset + 1.0, 0.0, 0.0),
                Vec3::new(offset, 1.0, 0.0),
            ],
            vec![Vec3::Z * 3.0, Vec3::new(1.0, 1.0, 0.0), Vec3::X],
            vec![Vec2::ZERO, Vec2::X, Vec2::Y],
            vec![Vec4::new(offset, 0.0, 0.0, 1.0); 3],
        )
        .unwrap()
    }

    #[test]
    fn new_rejects_mismatched_columns() {
        let err = VertexBatch::new(
            vec![Vec3::ZERO, Vec3::X],
            vec![Vec3::Z],
            vec![],
            vec![],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            GeometryError::ColumnLength { column: "normals", expected: 2, found: 1 }
        ));
    }

    #[test]
    fn new_allows_empty_optional_columns() {
        let batch = VertexBatch::new(vec![Vec3::ZERO; 4], vec![], vec![], vec![]).unwrap();
        assert_eq!(batch.len(), 4);
        assert!(!batch.has_normals() && !batch.has_uvs() && !batch.has_colors());
        assert_eq!(batch.positions()[0].w, 1.0);
    }

    #[test]
    fn normalized_normals_are_unit_with_zero_w() {
        let mut batch = tri(0.0);
        batch.normals[1] = Vec4::new(5.0, -2.0, 7.0, 1.0);
        batch.normalize_normals();
        for n in batch.normals() {
            assert_abs_diff_eq!(n.truncate().length(), 1.0, epsilon = 1e-5);
            assert_eq!(n.w, 0.0);
        }
    }

    #[test]
    fn zero_normal_stays_zero() {
        let mut batch = tri(0.0);
        batch.normals[0] = Vec4::new(0.0, 0.0, 0.0, 1.0);
        batch.normalize_normals();
        assert_eq!(batch.normals()[0], Vec4::ZERO);
    }

    #[test]
    fn normalized_face_normals_are_unit_with_zero_w() {
        let mut batch = tri(0.0);
        batch.set_face_normal_count(3);
        batch.face_normals[0] = Vec4::new(0.0, 3.0, 4.0, 2.0);
        batch.face_normals[1] = Vec4::new(-0.1, 0.0, 0.0, -1.0);
        batch.face_normals[2] = Vec4::new(0.0, 0.0, 0.0, 5.0);
        batch.normalize_face_normals();

        let [a, b, c] = [0, 1, 2].map(|i| batch.face_normals()[i]);
        assert_abs_diff_eq!(a.truncate().length(), 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(a.y, 0.6, epsilon = 1e-6);
        assert_abs_diff_eq!(b.x, -1.0, epsilon = 1e-6);
        assert_eq!(c, Vec4::ZERO);
        assert!(batch.face_normals().iter().all(|n| n.w == 0.0));
    }

    #[test]
    fn combine_concatenates_every_column() {
        let mut a = tri(0.0);
        a.set_face_normal_count(1);
        a.compute_face_normal(0, 1, 2, 0);
        let mut b = tri(10.0);
        b.resize(5);
        b.set_face_normal_count(2);
        b.compute_face_normal(0, 1, 2, 0);
        b.compute_face_normal(2, 3, 4, 1);

        let (first, second) = (a.clone(), b.clone());
        a.combine(&b).unwrap();

        assert_eq!(a.len(), 8);
        assert_eq!(&a.positions()[..3], first.positions());
        assert_eq!(&a.positions()[3..], second.positions());
        assert_eq!(&a.normals()[..3], first.normals());
        assert_eq!(&a.normals()[3..], second.normals());
        assert_eq!(&a.uvs()[..3], first.uvs());
        assert_eq!(&a.uvs()[3..], second.uvs());
        assert_eq!(&a.colors()[..3], first.colors());
        assert_eq!(&a.colors()[3..], second.colors());
        assert_eq!(a.face_normals().len(), 3);
        assert_eq!(&a.face_normals()[1..], second.face_normals());
        a.validate().unwrap();
    }

    #[test]
    fn combine_refuses_to_break_columns() {
        let mut a = tri(0.0);
        let b = VertexBatch::from_positions(vec![Vec3::ONE; 2]);
        let before = a.clone();
        assert!(a.combine(&b).is_err());
        assert_eq!(a, before);
    }

    #[test]
    fn combine_keeps_absent_columns_absent() {
        let mut a = VertexBatch::from_positions(vec![Vec3::ZERO; 2]);
        let b = VertexBatch::from_positions(vec![Vec3::ONE; 3]);
        a.combine(&b).unwrap();
        assert_eq!(a.len(), 5);
        assert!(!a.has_colors());
    }

    #[test]
    fn resize_truncates_and_extends_populated_columns() {
        let mut batch = tri(0.0);
        let original = batch.clone();

        batch.resize(2);
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.normals().len(), 2);
        assert_eq!(batch.positions(), &original.positions()[..2]);

        batch.resize(4);
        assert_eq!(batch.uvs().len(), 4);
        assert_eq!(batch.colors()[3], Vec4::ZERO);
        assert_eq!(batch.positions()[3], Vec4::W);
        batch.validate().unwrap();

        let mut bare = VertexBatch::from_positions(vec![Vec3::ZERO]);
        bare.resize(3);
        assert!(!bare.has_normals());
    }

    #[test]
    fn face_normal_is_normalized_average() {
        let mut batch = tri(0.0);
        batch.set_face_normal_count(1);
        batch.compute_face_normal(0, 1, 2, 0);
        let n = batch.face_normals()[0];
        let expected = (Vec3::Z + Vec3::new(1.0, 1.0, 0.0).normalize() + Vec3::X).normalize();
        assert_abs_diff_eq!(n.x, expected.x, epsilon = 1e-6);
        assert_abs_diff_eq!(n.y, expected.y, epsilon = 1e-6);
        assert_abs_diff_eq!(n.z, expected.z, epsilon = 1e-6);
        assert_eq!(n.w, 0.0);
    }

    #[test]
    fn geometric_face_normal_follows_winding() {
        let mut batch = VertexBatch::from_positions(vec![Vec3::ZERO, Vec3::X, Vec3::Y]);
        batch.set_face_normal_count(1);
        batch.compute_geometric_face_normal(0, 1, 2, 0);
        assert_eq!(batch.face_normals()[0], Vec4::new(0.0, 0.0, 1.0, 0.0));
    }

    #[test]
    fn vertex_gather_uses_neutral_defaults() {
        let batch = VertexBatch::from_positions(vec![Vec3::new(1.0, 2.0, 3.0)]);
        let v = batch.vertex(0);
        assert_eq!(v.position, Vec4::new(1.0, 2.0, 3.0, 1.0));
        assert_eq!(v.color, Vec4::ONE);
        assert_eq!(v.normal, Vec4::ZERO);
    }
}
