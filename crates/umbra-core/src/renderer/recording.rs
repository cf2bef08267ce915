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

//! A headless backend that records every call instead of talking to a GPU.
//!
//! [`RecordingBackend`] implements both [`GraphicsDevice`] and
//! [`RenderBackend`]. Each call appends a [`RenderCommand`] to an ordered log
//! that tests and tools can inspect afterwards. It is also what the demo binary
//! renders against.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use super::{
    error::ResourceError,
    handles::{
        BufferId, FrameBuffer, FrameBufferHandle, FrameBufferId, GpuMesh, Shader, ShaderHandle,
        ShaderId, Texture, TextureHandle, TextureId, TextureKind, VertexArrayId,
    },
    state::{
        Attachment, BlendState, BufferUsage, CullMode, UniformValue, VertexAttribute,
        VertexElement,
    },
    traits::{GraphicsDevice, RenderBackend},
};

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    /// A texture was created.
    CreateTexture {
        /// New texture id.
        texture: TextureId,
        /// Shape of the texture.
        kind: TextureKind,
    },
    /// A buffer was created.
    CreateBuffer {
        /// New buffer id.
        buffer: BufferId,
        /// Size in bytes.
        size: usize,
    },
    /// Bytes were written into a buffer.
    WriteBuffer {
        /// Target buffer.
        buffer: BufferId,
        /// Byte offset of the write.
        offset: usize,
        /// Number of bytes written.
        len: usize,
    },
    /// A framebuffer was bound.
    BindFrameBuffer(FrameBufferId),
    /// The default framebuffer was bound.
    BindDefaultFrameBuffer,
    /// A texture was attached to a framebuffer.
    AttachTexture {
        /// Target framebuffer.
        framebuffer: FrameBufferId,
        /// Attached texture.
        texture: TextureId,
        /// Attachment point.
        attachment: Attachment,
    },
    /// An attachment was removed from a framebuffer.
    Detach {
        /// Target framebuffer.
        framebuffer: FrameBufferId,
        /// Attachment point.
        attachment: Attachment,
    },
    /// The viewport changed.
    Viewport {
        /// Left edge.
        x: i32,
        /// Bottom edge.
        y: i32,
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
    },
    /// The bound target was cleared.
    Clear,
    /// Queued work was flushed.
    Finish,
    /// Color writes toggled.
    ColorMask(bool),
    /// Reversed depth toggled.
    ReversedDepth(bool),
    /// Culling mode changed.
    Culling(CullMode),
    /// Blending changed.
    Blending(Option<BlendState>),
    /// Depth test toggled.
    DepthTest(bool),
    /// Depth writes toggled.
    DepthMask(bool),
    /// Anisotropic filtering level changed.
    AnisotropicFiltering(f32),
    /// A uniform was written.
    Uniform {
        /// Program owning the uniform.
        shader: ShaderId,
        /// Uniform name.
        name: String,
        /// Written value.
        value: UniformValue,
    },
    /// A texture was bound to a unit.
    BindTexture {
        /// Bound texture.
        texture: TextureId,
        /// Texture unit.
        slot: u32,
    },
    /// A storage buffer was bound.
    BindBuffer {
        /// Bound buffer.
        buffer: BufferId,
        /// Binding point.
        binding: u32,
    },
    /// A mip chain was regenerated.
    GenerateMipmaps(TextureId),
    /// A constant vertex attribute was set.
    VertexAttribute {
        /// Attribute location.
        location: u32,
        /// Attribute value.
        value: VertexAttribute,
    },
    /// Indexed triangles were drawn.
    DrawIndexed {
        /// Drawn geometry.
        vertex_array: VertexArrayId,
        /// Program used.
        shader: ShaderId,
        /// Number of indices.
        index_count: u32,
        /// Instances, `0` for a plain draw.
        instance_count: u32,
    },
    /// Lines were drawn.
    DrawLines {
        /// Drawn geometry.
        vertex_array: VertexArrayId,
        /// Program used.
        shader: ShaderId,
        /// Number of vertices.
        vertex_count: u32,
    },
}

impl RenderCommand {
    /// Returns `true` for draw commands.
    pub fn is_draw(&self) -> bool {
        matches!(
            self,
            RenderCommand::DrawIndexed { .. } | RenderCommand::DrawLines { .. }
        )
    }
}

/// A [`RenderBackend`] that records calls instead of executing them.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    next_id: AtomicU64,
    buffers: Mutex<HashMap<BufferId, usize>>,
    vertex_arrays: Mutex<HashSet<VertexArrayId>>,
    commands: Mutex<Vec<RenderCommand>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // A panic while recording leaves the log usable; keep going.
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl RecordingBackend {
    /// Creates a backend with an empty command log.
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn record(&self, command: RenderCommand) {
        log::trace!("RecordingBackend: {command:?}");
        lock(&self.commands).push(command);
    }

    /// Number of buffers created and not yet destroyed.
    pub fn live_buffers(&self) -> usize {
        lock(&self.buffers).len()
    }

    /// Number of vertex arrays created and not yet destroyed.
    pub fn live_vertex_arrays(&self) -> usize {
        lock(&self.vertex_arrays).len()
    }

    /// Returns a copy of every command recorded so far, in call order.
    pub fn commands(&self) -> Vec<RenderCommand> {
        lock(&self.commands).clone()
    }

    /// Drains the command log.
    pub fn take_commands(&mut self) -> Vec<RenderCommand> {
        std::mem::take(&mut *lock(&self.commands))
    }

    /// Number of draw calls recorded so far.
    pub fn draw_count(&self) -> usize {
        lock(&self.commands).iter().filter(|c| c.is_draw()).count()
    }

    /// All values written to uniforms called `name`, in call order.
    pub fn uniform_values(&self, name: &str) -> Vec<UniformValue> {
        lock(&self.commands)
            .iter()
            .filter_map(|c| match c {
                RenderCommand::Uniform { name: n, value, .. } if n == name => Some(*value),
                _ => None,
            })
            .collect()
    }
}

impl GraphicsDevice for RecordingBackend {
    fn create_texture(
        &self,
        kind: TextureKind,
        width: u32,
        height: u32,
        label: Option<&str>,
    ) -> Result<TextureHandle, ResourceError> {
        if width == 0 || height == 0 {
            return Err(ResourceError::ZeroSized);
        }
        let texture = TextureId(self.allocate_id());
        self.record(RenderCommand::CreateTexture { texture, kind });
        Ok(Arc::new(Texture {
            id: texture,
            kind,
            width,
            height,
            label: label.map(str::to_owned),
        }))
    }

    fn create_framebuffer(&self, label: Option<&str>) -> Result<FrameBufferHandle, ResourceError> {
        Ok(Arc::new(FrameBuffer {
            id: FrameBufferId(self.allocate_id()),
            label: label.map(str::to_owned),
        }))
    }

    fn load_shader(&self, name: &str) -> Result<ShaderHandle, ResourceError> {
        if name.is_empty() {
            return Err(ResourceError::NotFound);
        }
        Ok(Arc::new(Shader {
            id: ShaderId(self.allocate_id()),
            label: name.to_owned(),
        }))
    }

    fn create_buffer(&self, _usage: BufferUsage, size: usize) -> Result<BufferId, ResourceError> {
        if size == 0 {
            return Err(ResourceError::ZeroSized);
        }
        let buffer = BufferId(self.allocate_id());
        lock(&self.buffers).insert(buffer, size);
        self.record(RenderCommand::CreateBuffer { buffer, size });
        Ok(buffer)
    }

    fn write_buffer(
        &self,
        buffer: BufferId,
        offset: usize,
        data: &[u8],
    ) -> Result<(), ResourceError> {
        let size = *lock(&self.buffers)
            .get(&buffer)
            .ok_or(ResourceError::NotFound)?;
        let end = offset + data.len();
        if end > size {
            return Err(ResourceError::OutOfBounds { end, size });
        }
        self.record(RenderCommand::WriteBuffer {
            buffer,
            offset,
            len: data.len(),
        });
        Ok(())
    }

    fn destroy_buffer(&self, buffer: BufferId) {
        lock(&self.buffers).remove(&buffer);
    }

    fn create_vertex_array(
        &self,
        vertex_buffer: BufferId,
        index_buffer: Option<BufferId>,
        _layout: &[VertexElement],
    ) -> Result<VertexArrayId, ResourceError> {
        let buffers = lock(&self.buffers);
        let known = buffers.contains_key(&vertex_buffer)
            && index_buffer.map_or(true, |b| buffers.contains_key(&b));
        if !known {
            return Err(ResourceError::InvalidHandle);
        }
        drop(buffers);
        let vertex_array = VertexArrayId(self.allocate_id());
        lock(&self.vertex_arrays).insert(vertex_array);
        Ok(vertex_array)
    }

    fn destroy_vertex_array(&self, vertex_array: VertexArrayId) {
        lock(&self.vertex_arrays).remove(&vertex_array);
    }
}

impl RenderBackend for RecordingBackend {
    fn bind_framebuffer(&mut self, framebuffer: &FrameBuffer) {
        self.record(RenderCommand::BindFrameBuffer(framebuffer.id));
    }

    fn bind_default_framebuffer(&mut self) {
        self.record(RenderCommand::BindDefaultFrameBuffer);
    }

    fn attach_texture(&mut self, framebuffer: &FrameBuffer, texture: &Texture, attachment: Attachment) {
        self.record(RenderCommand::AttachTexture {
            framebuffer: framebuffer.id,
            texture: texture.id,
            attachment,
        });
    }

    fn detach(&mut self, framebuffer: &FrameBuffer, attachment: Attachment) {
        self.record(RenderCommand::Detach {
            framebuffer: framebuffer.id,
            attachment,
        });
    }

    fn set_viewport(&mut self, x: i32, y: i32, width: u32, height: u32) {
        self.record(RenderCommand::Viewport { x, y, width, height });
    }

    fn clear(&mut self) {
        self.record(RenderCommand::Clear);
    }

    fn finish(&mut self) {
        self.record(RenderCommand::Finish);
    }

    fn set_color_mask(&mut self, enabled: bool) {
        self.record(RenderCommand::ColorMask(enabled));
    }

    fn set_reversed_depth(&mut self, enabled: bool) {
        self.record(RenderCommand::ReversedDepth(enabled));
    }

    fn set_culling(&mut self, mode: CullMode) {
        self.record(RenderCommand::Culling(mode));
    }

    fn set_blending(&mut self, blend: Option<BlendState>) {
        self.record(RenderCommand::Blending(blend));
    }

    fn set_depth_test(&mut self, enabled: bool) {
        self.record(RenderCommand::DepthTest(enabled));
    }

    fn set_depth_mask(&mut self, enabled: bool) {
        self.record(RenderCommand::DepthMask(enabled));
    }

    fn set_anisotropic_filtering(&mut self, level: f32) {
        self.record(RenderCommand::AnisotropicFiltering(level));
    }

    fn set_uniform(&mut self, shader: &Shader, name: &str, value: UniformValue) {
        self.record(RenderCommand::Uniform {
            shader: shader.id,
            name: name.to_owned(),
            value,
        });
    }

    fn bind_texture(&mut self, texture: &Texture, slot: u32) {
        self.record(RenderCommand::BindTexture {
            texture: texture.id,
            slot,
        });
    }

    fn bind_buffer(&mut self, buffer: BufferId, binding: u32) {
        self.record(RenderCommand::BindBuffer { buffer, binding });
    }

    fn generate_mipmaps(&mut self, texture: &Texture) {
        self.record(RenderCommand::GenerateMipmaps(texture.id));
    }

    fn set_vertex_attribute(&mut self, location: u32, value: VertexAttribute) {
        self.record(RenderCommand::VertexAttribute { location, value });
    }

    fn draw_indexed(&mut self, mesh: &GpuMesh, shader: &Shader, instance_count: u32) {
        self.record(RenderCommand::DrawIndexed {
            vertex_array: mesh.vertex_array,
            shader: shader.id,
            index_count: mesh.index_count,
            instance_count,
        });
    }

    fn draw_lines(&mut self, vertex_array: VertexArrayId, vertex_count: u32, shader: &Shader) {
        self.record(RenderCommand::DrawLines {
            vertex_array,
            shader: shader.id,
            vertex_count,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let backend = RecordingBackend::new();
        let a = backend.create_texture(TextureKind::Color2d, 4, 4, None).unwrap();
        let b = backend.create_texture(TextureKind::Depth2d, 4, 4, Some("depth")).unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(b.label.as_deref(), Some("depth"));
    }

    #[test]
    fn test_zero_sized_resources_are_rejected() {
        let backend = RecordingBackend::new();
        assert_eq!(
            backend.create_texture(TextureKind::Color2d, 0, 4, None),
            Err(ResourceError::ZeroSized)
        );
        assert_eq!(
            backend.create_buffer(BufferUsage::Static, 0),
            Err(ResourceError::ZeroSized)
        );
    }

    #[test]
    fn test_write_buffer_bounds() {
        let backend = RecordingBackend::new();
        let buffer = backend.create_buffer(BufferUsage::Dynamic, 16).unwrap();
        assert!(backend.write_buffer(buffer, 8, &[0u8; 8]).is_ok());
        assert_eq!(
            backend.write_buffer(buffer, 8, &[0u8; 9]),
            Err(ResourceError::OutOfBounds { end: 17, size: 16 })
        );
        backend.destroy_buffer(buffer);
        assert_eq!(
            backend.write_buffer(buffer, 0, &[0u8; 1]),
            Err(ResourceError::NotFound)
        );
    }

    #[test]
    fn test_vertex_array_requires_known_buffers() {
        let backend = RecordingBackend::new();
        let vb = backend.create_buffer(BufferUsage::Static, 64).unwrap();
        assert!(backend.create_vertex_array(vb, None, &[]).is_ok());
        assert_eq!(
            backend.create_vertex_array(vb, Some(BufferId(999)), &[]),
            Err(ResourceError::InvalidHandle)
        );
    }

    #[test]
    fn test_commands_are_recorded_in_order() {
        let mut backend = RecordingBackend::new();
        let shader = backend.load_shader("quad").unwrap();
        backend.clear();
        backend.set_uniform(&shader, "exposure", UniformValue::Float(1.5));
        backend.finish();

        assert_eq!(backend.uniform_values("exposure"), vec![UniformValue::Float(1.5)]);
        let commands = backend.take_commands();
        assert_eq!(commands.first(), Some(&RenderCommand::Clear));
        assert_eq!(commands.last(), Some(&RenderCommand::Finish));
        assert!(backend.commands().is_empty());
    }
}
