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

//! Opaque, shared-ownership handles to GPU resources.
//!
//! A handle is a small descriptor wrapped in an [`Arc`]. Cloning a handle is
//! cheap and every clone refers to the same GPU object. The pipeline copies
//! handles into its per-frame units, so a resource stays alive at least until
//! the frame that references it has been reset.

use std::sync::Arc;

macro_rules! resource_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u64);
    };
}

resource_id!(
    /// Backend identifier of a texture.
    TextureId
);
resource_id!(
    /// Backend identifier of a framebuffer object.
    FrameBufferId
);
resource_id!(
    /// Backend identifier of a linked shader program.
    ShaderId
);
resource_id!(
    /// Backend identifier of a vertex, index or instance buffer.
    BufferId
);
resource_id!(
    /// Backend identifier of a vertex array (buffer bindings plus layout).
    VertexArrayId
);

/// The shape and sampling class of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureKind {
    /// A regular 2D color texture.
    Color2d,
    /// A 2D depth texture, used for G-buffer depth and directional/spot shadow maps.
    Depth2d,
    /// A six-faced color cube map, used for skyboxes.
    CubeMap,
    /// A six-faced depth cube map, used for point-light shadow maps.
    DepthCubeMap,
}

impl TextureKind {
    /// Returns `true` for the two cube-map kinds.
    pub fn is_cube(self) -> bool {
        matches!(self, TextureKind::CubeMap | TextureKind::DepthCubeMap)
    }
}

/// A texture resident on the GPU.
#[derive(Debug, PartialEq, Eq)]
pub struct Texture {
    /// Backend identifier.
    pub id: TextureId,
    /// Shape of the texture.
    pub kind: TextureKind,
    /// Width in texels (per face for cube maps).
    pub width: u32,
    /// Height in texels (per face for cube maps).
    pub height: u32,
    /// Optional debug label.
    pub label: Option<String>,
}

impl Texture {
    /// Width and height of the texture's top mip level.
    #[inline]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Shared handle to a [`Texture`].
pub type TextureHandle = Arc<Texture>;

/// A framebuffer object that textures can be attached to.
#[derive(Debug, PartialEq, Eq)]
pub struct FrameBuffer {
    /// Backend identifier.
    pub id: FrameBufferId,
    /// Optional debug label.
    pub label: Option<String>,
}

/// Shared handle to a [`FrameBuffer`].
pub type FrameBufferHandle = Arc<FrameBuffer>;

/// A compiled and linked shader program.
#[derive(Debug, PartialEq, Eq)]
pub struct Shader {
    /// Backend identifier.
    pub id: ShaderId,
    /// Name of the program, used in logs and recordings.
    pub label: String,
}

/// Shared handle to a [`Shader`].
pub type ShaderHandle = Arc<Shader>;

/// Indexed geometry resident on the GPU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpuMesh {
    /// Vertex array binding the buffers below to a vertex layout.
    pub vertex_array: VertexArrayId,
    /// Buffer holding interleaved vertex data.
    pub vertex_buffer: BufferId,
    /// Buffer holding `u32` indices.
    pub index_buffer: BufferId,
    /// Number of indices to draw.
    pub index_count: u32,
}

/// Shared handle to a [`GpuMesh`].
pub type GeometryHandle = Arc<GpuMesh>;
