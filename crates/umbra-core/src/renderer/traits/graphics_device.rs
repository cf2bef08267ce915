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

//! Defines the `GraphicsDevice` trait, the resource-creation half of a backend.

use crate::renderer::{
    error::ResourceError,
    handles::{BufferId, FrameBufferHandle, ShaderHandle, TextureHandle, TextureKind, VertexArrayId},
    state::{BufferUsage, VertexElement},
};

/// Creates and writes GPU resources.
///
/// Every method is fallible: a backend may run out of memory, lose its device
/// or be handed a stale id. Callers propagate the [`ResourceError`] with `?`.
pub trait GraphicsDevice {
    /// Creates a texture.
    ///
    /// ## Arguments
    /// * `kind` - The texture shape (2D, depth, cube...).
    /// * `width`, `height` - Size of the top mip level in texels.
    /// * `label` - Optional debug name.
    ///
    /// ## Returns
    /// A shared handle to the new texture.
    fn create_texture(
        &self,
        kind: TextureKind,
        width: u32,
        height: u32,
        label: Option<&str>,
    ) -> Result<TextureHandle, ResourceError>;

    /// Creates an empty framebuffer object.
    fn create_framebuffer(&self, label: Option<&str>) -> Result<FrameBufferHandle, ResourceError>;

    /// Returns a handle to a shader program that was compiled elsewhere.
    ///
    /// ## Arguments
    /// * `name` - Name of the program in the backend's shader library.
    fn load_shader(&self, name: &str) -> Result<ShaderHandle, ResourceError>;

    /// Allocates a buffer of `size` bytes.
    fn create_buffer(&self, usage: BufferUsage, size: usize) -> Result<BufferId, ResourceError>;

    /// Writes `data` into `buffer` starting at byte `offset`.
    ///
    /// ## Returns
    /// [`ResourceError::OutOfBounds`] if the write runs past the end of the buffer,
    /// [`ResourceError::NotFound`] if the buffer does not exist.
    fn write_buffer(&self, buffer: BufferId, offset: usize, data: &[u8])
        -> Result<(), ResourceError>;

    /// Releases a buffer. Unknown ids are ignored.
    fn destroy_buffer(&self, buffer: BufferId);

    /// Binds a vertex buffer and an optional index buffer under `layout`.
    fn create_vertex_array(
        &self,
        vertex_buffer: BufferId,
        index_buffer: Option<BufferId>,
        layout: &[VertexElement],
    ) -> Result<VertexArrayId, ResourceError>;

    /// Releases a vertex array. Unknown ids are ignored.
    fn destroy_vertex_array(&self, vertex_array: VertexArrayId);
}
