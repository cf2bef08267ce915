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

//! Defines the `RenderBackend` trait, the stateful command half of a backend.

use super::GraphicsDevice;
use crate::renderer::{
    handles::{BufferId, FrameBuffer, GpuMesh, Shader, Texture, VertexArrayId},
    state::{Attachment, BlendState, CullMode, UniformValue, VertexAttribute},
};

/// A stateful, immediate-mode graphics context.
///
/// State set through this trait (bound framebuffer, blending, culling, depth
/// and color masks) persists until changed. Draw calls are fire-and-forget;
/// failures surface through the backend's own diagnostics, not through return
/// values. Implementations must preserve call order.
pub trait RenderBackend: GraphicsDevice {
    // --- Render targets ---

    /// Binds `framebuffer` as the current draw target.
    fn bind_framebuffer(&mut self, framebuffer: &FrameBuffer);

    /// Binds the window's default framebuffer as the current draw target.
    fn bind_default_framebuffer(&mut self);

    /// Attaches `texture` to `framebuffer` at `attachment`, replacing any
    /// previous texture there. Cube maps are attached as layered targets.
    fn attach_texture(&mut self, framebuffer: &FrameBuffer, texture: &Texture, attachment: Attachment);

    /// Removes whatever is attached to `framebuffer` at `attachment`.
    fn detach(&mut self, framebuffer: &FrameBuffer, attachment: Attachment);

    /// Sets the viewport rectangle in pixels.
    fn set_viewport(&mut self, x: i32, y: i32, width: u32, height: u32);

    /// Clears color and depth of the bound target.
    fn clear(&mut self);

    /// Flushes all queued commands.
    fn finish(&mut self);

    // --- Fixed-function state ---

    /// Enables or disables color writes.
    fn set_color_mask(&mut self, enabled: bool);

    /// Switches between standard and reversed depth comparison.
    fn set_reversed_depth(&mut self, enabled: bool);

    /// Chooses which faces are culled.
    fn set_culling(&mut self, mode: CullMode);

    /// Enables blending with the given factors, or disables it with `None`.
    fn set_blending(&mut self, blend: Option<BlendState>);

    /// Enables or disables the depth test.
    fn set_depth_test(&mut self, enabled: bool);

    /// Enables or disables depth writes.
    fn set_depth_mask(&mut self, enabled: bool);

    /// Sets the anisotropic filtering level for all samplers.
    fn set_anisotropic_filtering(&mut self, level: f32);

    // --- Resource binding ---

    /// Writes a uniform of `shader`.
    fn set_uniform(&mut self, shader: &Shader, name: &str, value: UniformValue);

    /// Binds `texture` to texture unit `slot`.
    fn bind_texture(&mut self, texture: &Texture, slot: u32);

    /// Binds `buffer` as a shader storage buffer at `binding`.
    fn bind_buffer(&mut self, buffer: BufferId, binding: u32);

    /// Regenerates the mip chain of `texture` from its top level.
    fn generate_mipmaps(&mut self, texture: &Texture);

    /// Sets a constant vertex attribute for subsequent draws.
    fn set_vertex_attribute(&mut self, location: u32, value: VertexAttribute);

    // --- Draws ---

    /// Draws indexed triangles of `mesh` with `shader`.
    ///
    /// `instance_count == 0` issues a single non-instanced draw; any other value
    /// issues an instanced draw of that many instances.
    fn draw_indexed(&mut self, mesh: &GpuMesh, shader: &Shader, instance_count: u32);

    /// Draws `vertex_count` vertices of `vertex_array` as a line list.
    fn draw_lines(&mut self, vertex_array: VertexArrayId, vertex_count: u32, shader: &Shader);
}
