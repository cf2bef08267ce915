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

//! CPU-side mesh data and its upload to the GPU.
//!
//! [`MeshData`] owns interleaved vertices and triangle indices, keeps a local
//! bounding box in sync, can rebuild tangent-space normals, and turns itself
//! into a [`GeometryHandle`] the pipeline can draw.

use std::mem::offset_of;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};

use super::transform::Transform;
use crate::math::{Aabb, Vec2, Vec3};
use crate::renderer::{
    BufferId, BufferUsage, GeometryHandle, GpuMesh, GraphicsDevice, ResourceError, VertexElement,
};

/// One interleaved vertex: position, texture coordinate and tangent frame.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Vertex {
    /// Object-space position.
    pub position: Vec3,
    /// Texture coordinate.
    pub texcoord: Vec2,
    /// Surface normal.
    pub normal: Vec3,
    /// Tangent, aligned with increasing `u`.
    pub tangent: Vec3,
    /// Bitangent, aligned with increasing `v`.
    pub bitangent: Vec3,
}

impl Vertex {
    /// Attribute layout of [`Vertex`] at locations 0 to 4.
    pub const LAYOUT: [VertexElement; 5] = [
        VertexElement {
            location: 0,
            components: 3,
            offset: offset_of!(Vertex, position) as u32,
        },
        VertexElement {
            location: 1,
            components: 2,
            offset: offset_of!(Vertex, texcoord) as u32,
        },
        VertexElement {
            location: 2,
            components: 3,
            offset: offset_of!(Vertex, normal) as u32,
        },
        VertexElement {
            location: 3,
            components: 3,
            offset: offset_of!(Vertex, tangent) as u32,
        },
        VertexElement {
            location: 4,
            components: 3,
            offset: offset_of!(Vertex, bitangent) as u32,
        },
    ];

    /// A vertex with only position and texture coordinate set.
    pub fn new(position: Vec3, texcoord: Vec2) -> Self {
        Self {
            position,
            texcoord,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct GpuBuffer {
    id: BufferId,
    capacity: usize,
}

/// Vertices and indices of one mesh, plus their GPU copies once buffered.
#[derive(Debug, Default)]
pub struct MeshData {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    bounding_box: Aabb,
    vertex_buffer: Option<GpuBuffer>,
    index_buffer: Option<GpuBuffer>,
    geometry: Option<GeometryHandle>,
}

impl MeshData {
    /// Creates mesh data from triangle-list indices and computes its bounding box.
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        let mut mesh = Self {
            vertices,
            indices,
            ..Default::default()
        };
        mesh.update_bounding_box();
        mesh
    }

    /// Vertex data.
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Mutable vertex data. Call [`Self::update_bounding_box`] and
    /// [`Self::buffer_vertices`] after editing positions.
    pub fn vertices_mut(&mut self) -> &mut Vec<Vertex> {
        &mut self.vertices
    }

    /// Triangle-list indices.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Mutable index data. Call [`Self::buffer_indices`] after editing.
    pub fn indices_mut(&mut self) -> &mut Vec<u32> {
        &mut self.indices
    }

    /// Object-space bounding box, as of the last [`Self::update_bounding_box`].
    pub fn bounding_box(&self) -> Aabb {
        self.bounding_box
    }

    /// Drawable geometry, once both vertices and indices are buffered.
    pub fn geometry(&self) -> Option<&GeometryHandle> {
        self.geometry.as_ref()
    }

    /// Recomputes the bounding box from vertex positions.
    ///
    /// A mesh without vertices gets [`Aabb::ZERO`].
    pub fn update_bounding_box(&mut self) {
        self.bounding_box =
            Aabb::from_points(self.vertices.iter().map(|v| v.position)).unwrap_or(Aabb::ZERO);
    }

    /// Rebuilds normals, tangents and bitangents from triangle geometry.
    ///
    /// Face vectors are accumulated on every vertex of the face (weighted by
    /// triangle area) and normalized at the end. Triangles with out-of-range
    /// indices are skipped; degenerate texture mappings contribute a normal
    /// but no tangent frame.
    pub fn regenerate_normals(&mut self) {
        for v in &mut self.vertices {
            v.normal = Vec3::ZERO;
            v.tangent = Vec3::ZERO;
            v.bitangent = Vec3::ZERO;
        }

        for tri in self.indices.chunks_exact(3) {
            let [i0, i1, i2] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let (Some(v0), Some(v1), Some(v2)) = (
                self.vertices.get(i0),
                self.vertices.get(i1),
                self.vertices.get(i2),
            ) else {
                continue;
            };

            let e1 = v1.position - v0.position;
            let e2 = v2.position - v0.position;
            let d1 = v1.texcoord - v0.texcoord;
            let d2 = v2.texcoord - v0.texcoord;

            let normal = e1.cross(e2);
            let det = d1.x * d2.y - d2.x * d1.y;
            let (tangent, bitangent) = if det.abs() > f32::EPSILON {
                let r = 1.0 / det;
                ((e1 * d2.y - e2 * d1.y) * r, (e2 * d1.x - e1 * d2.x) * r)
            } else {
                (Vec3::ZERO, Vec3::ZERO)
            };

            for i in [i0, i1, i2] {
                let v = &mut self.vertices[i];
                v.normal += normal;
                v.tangent += tangent;
                v.bitangent += bitangent;
            }
        }

        for v in &mut self.vertices {
            v.normal = v.normal.normalize_or_zero();
            v.tangent = v.tangent.normalize_or_zero();
            v.bitangent = v.bitangent.normalize_or_zero();
        }
    }

    /// Uploads the vertices, growing the GPU buffer if they no longer fit.
    ///
    /// On failure the cached geometry is released, so a stale handle is never
    /// drawn.
    pub fn buffer_vertices<D: GraphicsDevice + ?Sized>(
        &mut self,
        device: &D,
        usage: BufferUsage,
    ) -> Result<(), ResourceError> {
        let bytes: &[u8] = bytemuck::cast_slice(&self.vertices);
        match upload(device, self.vertex_buffer, usage, bytes) {
            Ok(buffer) => self.vertex_buffer = Some(buffer),
            Err(e) => {
                self.release_geometry(device);
                return Err(e);
            }
        }
        self.refresh_geometry(device)
    }

    /// Uploads the indices, growing the GPU buffer if they no longer fit.
    pub fn buffer_indices<D: GraphicsDevice + ?Sized>(&mut self, device: &D) -> Result<(), ResourceError> {
        let bytes: &[u8] = bytemuck::cast_slice(&self.indices);
        match upload(device, self.index_buffer, BufferUsage::Static, bytes) {
            Ok(buffer) => self.index_buffer = Some(buffer),
            Err(e) => {
                self.release_geometry(device);
                return Err(e);
            }
        }
        self.refresh_geometry(device)
    }

    /// Buffers both vertices and indices.
    pub fn buffer<D: GraphicsDevice + ?Sized>(
        &mut self,
        device: &D,
        usage: BufferUsage,
    ) -> Result<GeometryHandle, ResourceError> {
        self.buffer_vertices(device, usage)?;
        self.buffer_indices(device)?;
        self.geometry.clone().ok_or(ResourceError::NotFound)
    }

    fn refresh_geometry<D: GraphicsDevice + ?Sized>(&mut self, device: &D) -> Result<(), ResourceError> {
        let (Some(vb), Some(ib)) = (self.vertex_buffer, self.index_buffer) else {
            return Ok(());
        };
        let index_count = self.indices.len() as u32;

        // Same buffers: the vertex array still points at them.
        let reusable = self
            .geometry
            .as_ref()
            .filter(|g| g.vertex_buffer == vb.id && g.index_buffer == ib.id)
            .map(|g| g.vertex_array);
        let vertex_array = match reusable {
            Some(vertex_array) => vertex_array,
            None => match device.create_vertex_array(vb.id, Some(ib.id), &Vertex::LAYOUT) {
                Ok(vertex_array) => {
                    self.release_geometry(device);
                    vertex_array
                }
                Err(e) => {
                    self.release_geometry(device);
                    return Err(e);
                }
            },
        };

        self.geometry = Some(Arc::new(GpuMesh {
            vertex_array,
            vertex_buffer: vb.id,
            index_buffer: ib.id,
            index_count,
        }));
        Ok(())
    }

    fn release_geometry<D: GraphicsDevice + ?Sized>(&mut self, device: &D) {
        if let Some(geometry) = self.geometry.take() {
            device.destroy_vertex_array(geometry.vertex_array);
        }
    }
}

/// Writes `bytes` into `existing` when they fit, otherwise into a new buffer.
/// The old buffer is destroyed only once its replacement holds the data.
fn upload<D: GraphicsDevice + ?Sized>(
    device: &D,
    existing: Option<GpuBuffer>,
    usage: BufferUsage,
    bytes: &[u8],
) -> Result<GpuBuffer, ResourceError> {
    if let Some(buffer) = existing.filter(|b| b.capacity >= bytes.len()) {
        device.write_buffer(buffer.id, 0, bytes)?;
        return Ok(buffer);
    }

    let buffer = GpuBuffer {
        id: device.create_buffer(usage, bytes.len())?,
        capacity: bytes.len(),
    };
    if let Err(e) = device.write_buffer(buffer.id, 0, bytes) {
        device.destroy_buffer(buffer.id);
        return Err(e);
    }
    if let Some(old) = existing {
        device.destroy_buffer(old.id);
    }
    Ok(buffer)
}

/// A buffered mesh placed inside its parent object.
///
/// Construction uploads the mesh, so every sub-mesh carries drawable geometry.
#[derive(Debug, Clone)]
pub struct SubMesh {
    data: Arc<MeshData>,
    geometry: GeometryHandle,
    /// Placement relative to the parent object.
    pub transform: Transform,
}

impl SubMesh {
    /// Buffers `data` on `device` and places it at the parent's origin.
    pub fn new<D: GraphicsDevice + ?Sized>(
        device: &D,
        mut data: MeshData,
        usage: BufferUsage,
    ) -> Result<Self, ResourceError> {
        let geometry = data.buffer(device, usage)?;
        Ok(Self {
            data: Arc::new(data),
            geometry,
            transform: Transform::IDENTITY,
        })
    }

    /// Wraps mesh data that is already buffered.
    ///
    /// ## Returns
    /// [`ResourceError::InvalidHandle`] if `data` has no geometry yet.
    pub fn from_buffered(data: Arc<MeshData>) -> Result<Self, ResourceError> {
        let geometry = data.geometry().cloned().ok_or(ResourceError::InvalidHandle)?;
        Ok(Self {
            data,
            geometry,
            transform: Transform::IDENTITY,
        })
    }

    /// Replaces the placement.
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// The CPU-side mesh.
    pub fn data(&self) -> &MeshData {
        &self.data
    }

    /// The uploaded geometry this sub-mesh draws.
    pub fn geometry(&self) -> &GeometryHandle {
        &self.geometry
    }
}
