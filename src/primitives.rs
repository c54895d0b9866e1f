//! Built-in geometry.
//!
//! Every builder returns a ready [`SceneObject`] centred on the origin unless
//! stated otherwise. All primitives use counter-clockwise winding for front
//! faces and carry normals and UVs.

use glam::{Vec2, Vec3, Vec4};

use crate::batch::VertexBatch;
use crate::color::Color;
use crate::error::GeometryError;
use crate::scene::{Primitive, SceneObject};

/// A single triangle in the XY plane facing +Z, one primary color per corner.
pub fn triangle() -> Result<SceneObject, GeometryError> {
    let batch = VertexBatch::new(
        vec![
            Vec3::new(-0.5, -0.5, 0.0),
            Vec3::new(0.5, -0.5, 0.0),
            Vec3::new(0.0, 0.5, 0.0),
        ],
        vec![Vec3::Z; 3],
        vec![Vec2::new(0.0, 1.0), Vec2::new(1.0, 1.0), Vec2::new(0.5, 0.0)],
        vec![
            Color::RED.to_vec4(),
            Color::GREEN.to_vec4(),
            Color::BLUE.to_vec4(),
        ],
    )?;
    SceneObject::new("triangle", batch, Primitive::triangles(&[0, 1, 2]))
}

/// An axis-aligned rectangle parallel to the XY plane, facing +Z.
///
/// Every vertex gets `color`, alpha included, which makes this the usual
/// building block for transparency setups.
pub fn quad(center: Vec3, size: Vec2, color: Color) -> Result<SceneObject, GeometryError> {
    let h = size * 0.5;
    let batch = VertexBatch::new(
        vec![
            center + Vec3::new(-h.x, -h.y, 0.0),
            center + Vec3::new(h.x, -h.y, 0.0),
            center + Vec3::new(h.x, h.y, 0.0),
            center + Vec3::new(-h.x, h.y, 0.0),
        ],
        vec![Vec3::Z; 4],
        vec![
            Vec2::new(0.0, 1.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(0.0, 0.0),
        ],
        vec![color.to_vec4(); 4],
    )?;
    SceneObject::new("quad", batch, Primitive::triangles(&[0, 1, 2, 2, 3, 0]))
}

/// A unit cube with a different vertex color on each face.
pub fn cube() -> Result<SceneObject, GeometryError> {
    // (normal, u axis, v axis, color); corners are normal/2 ± u/2 ± v/2.
    let faces = [
        (Vec3::Z, Vec3::X, Vec3::Y, Color::rgb(0.9, 0.3, 0.3)),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y, Color::rgb(0.3, 0.9, 0.3)),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z, Color::rgb(0.3, 0.3, 0.9)),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z, Color::rgb(0.9, 0.9, 0.3)),
        (Vec3::X, Vec3::NEG_Z, Vec3::Y, Color::rgb(0.3, 0.9, 0.9)),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y, Color::rgb(0.9, 0.3, 0.9)),
    ];

    let mut points = Vec::with_capacity(24);
    let mut normals = Vec::with_capacity(24);
    let mut uvs = Vec::with_capacity(24);
    let mut colors = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);

    for (normal, u, v, color) in faces {
        let base = points.len() as u32;
        for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            points.push((normal + u * su + v * sv) * 0.5);
            normals.push(normal);
            uvs.push(Vec2::new((su + 1.0) * 0.5, (1.0 - sv) * 0.5));
            colors.push(color.to_vec4());
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }

    let batch = VertexBatch::new(points, normals, uvs, colors)?;
    SceneObject::new("cube", batch, Primitive::triangles(&indices))
}

/// A `size × size` floor on the XZ plane facing +Y.
pub fn plane(size: f32) -> Result<SceneObject, GeometryError> {
    let half = size * 0.5;
    let batch = VertexBatch::new(
        vec![
            Vec3::new(-half, 0.0, -half),
            Vec3::new(half, 0.0, -half),
            Vec3::new(half, 0.0, half),
            Vec3::new(-half, 0.0, half),
        ],
        vec![Vec3::Y; 4],
        vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ],
        Vec::new(),
    )?;
    SceneObject::new("plane", batch, Primitive::triangles(&[0, 2, 1, 0, 3, 2]))
}

/// A UV sphere of diameter 1.
///
/// `segments` runs around the equator and `rings` from pole to pole. Both
/// are raised to usable minimums.
pub fn sphere(segments: u32, rings: u32) -> Result<SceneObject, GeometryError> {
    let segments = segments.max(3);
    let rings = rings.max(2);
    let mut points = Vec::new();
    let mut normals = Vec::new();
    let mut uvs = Vec::new();

    for ring in 0..=rings {
        let phi = std::f32::consts::PI * ring as f32 / rings as f32;
        let y = phi.cos();
        let ring_radius = phi.sin();

        for seg in 0..=segments {
            let theta = 2.0 * std::f32::consts::PI * seg as f32 / segments as f32;
            let normal = Vec3::new(ring_radius * theta.cos(), y, ring_radius * theta.sin());
            points.push(normal * 0.5);
            normals.push(normal);
            uvs.push(Vec2::new(
                seg as f32 / segments as f32,
                ring as f32 / rings as f32,
            ));
        }
    }

    let mut indices = Vec::new();
    for ring in 0..rings {
        for seg in 0..segments {
            let current = ring * (segments + 1) + seg;
            let next = current + segments + 1;
            indices.extend_from_slice(&[current, current + 1, next]);
            indices.extend_from_slice(&[current + 1, next + 1, next]);
        }
    }

    let colors = vec![Vec4::ONE; points.len()];
    let batch = VertexBatch::new(points, normals, uvs, colors)?;
    SceneObject::new("sphere", batch, Primitive::triangles(&indices))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn geometric_normal(obj: &SceneObject, i: usize) -> Vec3 {
        let [a, b, c] = obj.primitives()[i]
            .indices
            .map(|i| obj.batch().positions()[i as usize].truncate());
        (b - a).cross(c - a).normalize()
    }

    #[test]
    fn cube_winding_matches_normals() {
        let cube = cube().unwrap();
        assert_eq!(cube.vertex_count(), 24);
        assert_eq!(cube.triangle_count(), 12);
        for (i, face) in cube.batch().face_normals().iter().enumerate() {
            let g = geometric_normal(&cube, i);
            assert_abs_diff_eq!(g.dot(face.truncate()), 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn cube_corners_are_half_unit() {
        let cube = cube().unwrap();
        for p in cube.batch().positions() {
            assert_abs_diff_eq!(p.x.abs(), 0.5, epsilon = 1e-6);
            assert_abs_diff_eq!(p.y.abs(), 0.5, epsilon = 1e-6);
            assert_abs_diff_eq!(p.z.abs(), 0.5, epsilon = 1e-6);
        }
    }

    #[test]
    fn plane_faces_up() {
        let plane = plane(4.0).unwrap();
        for i in 0..plane.triangle_count() {
            assert_abs_diff_eq!(geometric_normal(&plane, i).y, 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn quad_carries_alpha() {
        let quad = quad(
            Vec3::new(1.0, 0.0, -2.0),
            Vec2::new(2.0, 1.0),
            Color::RED.with_alpha(0.1),
        )
        .unwrap();
        assert!(quad.batch().colors().iter().all(|c| c.w == 0.1));
        assert_eq!(quad.batch().positions()[0], Vec4::new(0.0, -0.5, -2.0, 1.0));
    }

    #[test]
    fn sphere_is_closed_and_outward() {
        let sphere = sphere(12, 6).unwrap();
        assert_eq!(sphere.vertex_count(), 13 * 7);
        assert_eq!(sphere.triangle_count(), 12 * 6 * 2);
        for n in sphere.batch().normals() {
            assert_abs_diff_eq!(n.truncate().length(), 1.0, epsilon = 1e-5);
        }

        let positions = sphere.batch().positions();
        let normals = sphere.batch().normals();
        let mut checked = 0;
        for p in sphere.primitives() {
            let [a, b, c] = p.indices.map(|i| positions[i as usize].truncate());
            let cross = (b - a).cross(c - a);
            // Pole triangles collapse to a line.
            if cross.length() < 1e-6 {
                continue;
            }
            let outward: Vec3 = p.indices.iter().map(|&i| normals[i as usize].truncate()).sum();
            assert!(cross.dot(outward) > 0.0, "{:?} winds inward", p.indices);
            assert!(cross.dot(a + b + c) > 0.0);
            checked += 1;
        }
        assert!(checked >= 12 * 4 * 2);
    }
}
