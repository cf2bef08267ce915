// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Helper shapes the pipeline draws with: the full-screen rectangle, the
//! skybox cube and the light-volume proxies.

use super::mesh::{MeshData, Vertex};
use crate::math::{Vec2, Vec3};

/// A `[-1, 1]` square in the XY plane facing `+Z`, for full-screen passes.
pub fn rectangle() -> MeshData {
    let vertices = vec![
        Vertex::new(Vec3::new(-1.0, -1.0, 0.0), Vec2::new(0.0, 0.0)),
        Vertex::new(Vec3::new(1.0, -1.0, 0.0), Vec2::new(1.0, 0.0)),
        Vertex::new(Vec3::new(1.0, 1.0, 0.0), Vec2::new(1.0, 1.0)),
        Vertex::new(Vec3::new(-1.0, 1.0, 0.0), Vec2::new(0.0, 1.0)),
    ];
    let mut mesh = MeshData::new(vertices, vec![0, 1, 2, 0, 2, 3]);
    mesh.regenerate_normals();
    mesh
}

/// A `[-1, 1]` cube with inward-facing triangles, for the skybox.
pub fn cube() -> MeshData {
    let vertices = (0..8)
        .map(|i| {
            let corner = Vec3::new(
                if i & 1 == 0 { -1.0 } else { 1.0 },
                if i & 2 == 0 { -1.0 } else { 1.0 },
                if i & 4 == 0 { -1.0 } else { 1.0 },
            );
            Vertex::new(corner, Vec2::ZERO)
        })
        .collect();
    #[rustfmt::skip]
    let indices = vec![
        0, 1, 3, 0, 3, 2, // -Z
        4, 6, 7, 4, 7, 5, // +Z
        0, 2, 6, 0, 6, 4, // -X
        1, 5, 7, 1, 7, 3, // +X
        0, 4, 5, 0, 5, 1, // -Y
        2, 3, 7, 2, 7, 6, // +Y
    ];
    MeshData::new(vertices, indices)
}

/// A square pyramid with its apex at the origin and base at `z = -1`.
pub fn pyramid() -> MeshData {
    let vertices = vec![
        Vertex::new(Vec3::ZERO, Vec2::new(0.5, 0.5)),
        Vertex::new(Vec3::new(-1.0, -1.0, -1.0), Vec2::new(0.0, 0.0)),
        Vertex::new(Vec3::new(1.0, -1.0, -1.0), Vec2::new(1.0, 0.0)),
        Vertex::new(Vec3::new(1.0, 1.0, -1.0), Vec2::new(1.0, 1.0)),
        Vertex::new(Vec3::new(-1.0, 1.0, -1.0), Vec2::new(0.0, 1.0)),
    ];
    #[rustfmt::skip]
    let indices = vec![
        0, 1, 2,
        0, 2, 3,
        0, 3, 4,
        0, 4, 1,
        1, 3, 2,
        1, 4, 3,
    ];
    let mut mesh = MeshData::new(vertices, indices);
    mesh.regenerate_normals();
    mesh
}

/// A unit UV sphere with `rings` latitude bands and `sectors` longitude bands.
pub fn uv_sphere(rings: u32, sectors: u32) -> MeshData {
    let rings = rings.max(2);
    let sectors = sectors.max(3);
    let mut vertices = Vec::with_capacity(((rings + 1) * (sectors + 1)) as usize);
    for r in 0..=rings {
        let v = r as f32 / rings as f32;
        let theta = v * std::f32::consts::PI;
        for s in 0..=sectors {
            let u = s as f32 / sectors as f32;
            let phi = u * std::f32::consts::TAU;
            let (sin_theta, cos_theta) = theta.sin_cos();
            let (sin_phi, cos_phi) = phi.sin_cos();
            let position = Vec3::new(sin_theta * cos_phi, cos_theta, sin_theta * sin_phi);
            // Analytic frame: the poles collapse every sector onto one point.
            vertices.push(Vertex {
                normal: position,
                tangent: Vec3::new(-sin_phi, 0.0, cos_phi),
                bitangent: Vec3::new(cos_theta * cos_phi, -sin_theta, cos_theta * sin_phi),
                ..Vertex::new(position, Vec2::new(u, v))
            });
        }
    }

    let stride = sectors + 1;
    let mut indices = Vec::with_capacity((rings * sectors * 6) as usize);
    for r in 0..rings {
        for s in 0..sectors {
            let a = r * stride + s;
            let b = a + stride;
            indices.extend_from_slice(&[a, a + 1, b, a + 1, b + 1, b]);
        }
    }

    MeshData::new(vertices, indices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Aabb;

    #[test]
    fn test_helper_shapes_fit_unit_bounds() {
        let unit = Aabb::from_min_max(Vec3::splat(-1.0), Vec3::ONE);
        for mesh in [rectangle(), cube(), pyramid(), uv_sphere(8, 12)] {
            let bb = mesh.bounding_box();
            assert!(unit.contains_point(bb.min) && unit.contains_point(bb.max));
            assert_eq!(mesh.indices().len() % 3, 0);
            assert!(mesh.indices().iter().all(|&i| (i as usize) < mesh.vertices().len()));
        }
    }

    #[test]
    fn test_rectangle_faces_viewer() {
        let mesh = rectangle();
        assert!(mesh.vertices().iter().all(|v| v.normal.abs_diff_eq(Vec3::Z, 1e-5)));
    }

    #[test]
    fn test_sphere_normals_point_outward() {
        let mesh = uv_sphere(16, 16);
        for v in mesh.vertices() {
            assert!(v.normal.abs_diff_eq(v.position, 1e-5));
            assert!(v.normal.dot(v.position) > 0.0);
            assert!((v.normal.length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_sphere_poles_have_unit_normals() {
        let mesh = uv_sphere(4, 6);
        let stride = 7;
        let first = mesh.vertices()[0];
        let last = mesh.vertices()[4 * stride];
        assert!(first.normal.abs_diff_eq(Vec3::Y, 1e-5));
        assert!(last.normal.abs_diff_eq(Vec3::NEG_Y, 1e-5));
        assert!(last.tangent.length() > 0.99);
    }
}
