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

//! Defines the process-wide `Environment` the pipeline renders with.
//!
//! The environment holds everything that outlives a frame: shader programs,
//! fallback textures, the shared render targets and the helper geometry used
//! by full-screen and light-volume passes. It is created once and handed to
//! every lane by reference.

use std::mem::size_of;

use umbra_core::{
    math::Vec3,
    renderer::{
        Attachment, BufferId, BufferUsage, FrameBufferHandle, GeometryHandle, GraphicsDevice,
        PipelineSettings, RenderBackend, ResourceError, ShaderHandle, TextureHandle, TextureKind,
        VertexArrayId, VertexElement,
    },
    scene::primitives,
};

use super::PointLightInstance;

/// Every shader program the pipeline uses.
#[derive(Debug, Clone)]
pub struct ShaderSet {
    /// Depth-only pass for 2D shadow maps.
    pub shadow_depth: ShaderHandle,
    /// Depth-only pass for cube shadow maps.
    pub shadow_depth_cube: ShaderHandle,
    /// Fills the G-buffer.
    pub gbuffer: ShaderHandle,
    /// Full-screen ambient and directional lighting.
    pub global_illumination: ShaderHandle,
    /// Spot light volumes.
    pub spot_light: ShaderHandle,
    /// Shadow-casting point light volumes.
    pub point_light: ShaderHandle,
    /// Instanced shadowless point light volumes.
    pub instanced_point_light: ShaderHandle,
    /// Skybox cube.
    pub skybox: ShaderHandle,
    /// Debug line overlay.
    pub debug_lines: ShaderHandle,
    /// Separable bloom blur.
    pub bloom: ShaderHandle,
    /// Tone mapping.
    pub hdr_to_ldr: ShaderHandle,
    /// Copies a texture to the bound target.
    pub image_blit: ShaderHandle,
}

impl ShaderSet {
    /// Looks every program up by its conventional name.
    pub fn load<D: GraphicsDevice + ?Sized>(device: &D) -> Result<Self, ResourceError> {
        Ok(Self {
            shadow_depth: device.load_shader("shadow_depth")?,
            shadow_depth_cube: device.load_shader("shadow_depth_cube")?,
            gbuffer: device.load_shader("gbuffer")?,
            global_illumination: device.load_shader("global_illumination")?,
            spot_light: device.load_shader("spot_light")?,
            point_light: device.load_shader("point_light")?,
            instanced_point_light: device.load_shader("instanced_point_light")?,
            skybox: device.load_shader("skybox")?,
            debug_lines: device.load_shader("debug_lines")?,
            bloom: device.load_shader("bloom")?,
            hdr_to_ldr: device.load_shader("hdr_to_ldr")?,
            image_blit: device.load_shader("image_blit")?,
        })
    }
}

/// Textures substituted for missing inputs.
#[derive(Debug, Clone)]
pub struct DefaultTextures {
    /// 1x1 black texture.
    pub black_map: TextureHandle,
    /// 1x1 black cube map.
    pub black_cube_map: TextureHandle,
    /// 1x1 white texture for missing material maps.
    pub material_map: TextureHandle,
    /// 1x1 flat normal for missing normal maps.
    pub normal_map: TextureHandle,
}

impl DefaultTextures {
    fn create<D: GraphicsDevice + ?Sized>(device: &D) -> Result<Self, ResourceError> {
        Ok(Self {
            black_map: device.create_texture(TextureKind::Color2d, 1, 1, Some("default_black"))?,
            black_cube_map: device.create_texture(
                TextureKind::CubeMap,
                1,
                1,
                Some("default_black_cube"),
            )?,
            material_map: device.create_texture(
                TextureKind::Color2d,
                1,
                1,
                Some("default_material"),
            )?,
            normal_map: device.create_texture(TextureKind::Color2d, 1, 1, Some("default_normal"))?,
        })
    }
}

/// One half of the bloom ping-pong pair.
#[derive(Debug, Clone)]
pub struct BloomBuffer {
    /// Framebuffer the blur renders into.
    pub framebuffer: FrameBufferHandle,
    /// Texture attached to `framebuffer` at color 0.
    pub texture: Option<TextureHandle>,
}

/// A dynamic buffer of debug line vertices.
#[derive(Debug, Clone)]
pub struct DebugLines {
    /// Vertex buffer holding line-list positions.
    pub buffer: BufferId,
    /// Vertex array over `buffer`.
    pub vertex_array: VertexArrayId,
    /// Maximum number of vertices the buffer holds.
    pub capacity: usize,
    /// Number of vertices to draw this frame.
    pub vertex_count: u32,
}

impl DebugLines {
    const LAYOUT: [VertexElement; 1] = [VertexElement {
        location: 0,
        components: 3,
        offset: 0,
    }];

    fn create<D: GraphicsDevice + ?Sized>(device: &D, capacity: usize) -> Result<Self, ResourceError> {
        let buffer = device.create_buffer(BufferUsage::Dynamic, capacity * size_of::<Vec3>())?;
        let vertex_array = device.create_vertex_array(buffer, None, &Self::LAYOUT)?;
        Ok(Self {
            buffer,
            vertex_array,
            capacity,
            vertex_count: 0,
        })
    }

    /// Replaces the line list with `points`, two per segment.
    ///
    /// Points beyond the buffer capacity are dropped, as is a trailing point
    /// without a partner.
    pub fn upload<D: GraphicsDevice + ?Sized>(
        &mut self,
        device: &D,
        points: &[Vec3],
    ) -> Result<(), ResourceError> {
        let count = points.len().min(self.capacity) & !1;
        if count < points.len() {
            log::warn!(
                "DebugLines: dropping {} of {} vertices",
                points.len() - count,
                points.len()
            );
        }
        if count > 0 {
            device.write_buffer(self.buffer, 0, bytemuck::cast_slice(&points[..count]))?;
        }
        self.vertex_count = count as u32;
        Ok(())
    }

    /// Forgets all lines.
    pub fn clear(&mut self) {
        self.vertex_count = 0;
    }
}

/// Geometry used by full-screen and light-volume passes.
#[derive(Debug, Clone)]
pub struct HelperGeometry {
    /// `[-1, 1]` full-screen rectangle.
    pub rectangle: GeometryHandle,
    /// Skybox cube.
    pub skybox_cube: GeometryHandle,
    /// Unit sphere, the point light volume.
    pub sphere: GeometryHandle,
    /// Unit pyramid, the spot light volume.
    pub pyramid: GeometryHandle,
    /// Instance data of shadowless point lights.
    pub instance_buffer: BufferId,
    /// Number of [`PointLightInstance`]s `instance_buffer` holds. Grows on
    /// demand through [`HelperGeometry::reserve_point_light_instances`].
    pub instance_capacity: usize,
    /// Debug line overlay.
    pub debug_lines: DebugLines,
}

/// Debug line vertices allocated up front.
const DEBUG_LINE_CAPACITY: usize = 65536;

impl HelperGeometry {
    fn create<D: GraphicsDevice + ?Sized>(device: &D, instance_capacity: usize) -> Result<Self, ResourceError> {
        let instance_capacity = instance_capacity.max(1);
        Ok(Self {
            rectangle: primitives::rectangle().buffer(device, BufferUsage::Static)?,
            skybox_cube: primitives::cube().buffer(device, BufferUsage::Static)?,
            sphere: primitives::uv_sphere(16, 24).buffer(device, BufferUsage::Static)?,
            pyramid: primitives::pyramid().buffer(device, BufferUsage::Static)?,
            instance_buffer: device.create_buffer(
                BufferUsage::Dynamic,
                instance_capacity * size_of::<PointLightInstance>(),
            )?,
            instance_capacity,
            debug_lines: DebugLines::create(device, DEBUG_LINE_CAPACITY)?,
        })
    }

    /// Makes room for `count` point light instances.
    ///
    /// The buffer grows to the next power of two and its contents are not
    /// kept. On failure the previous buffer stays in place.
    pub fn reserve_point_light_instances<D: GraphicsDevice + ?Sized>(
        &mut self,
        device: &D,
        count: usize,
    ) -> Result<(), ResourceError> {
        if count <= self.instance_capacity {
            return Ok(());
        }
        let capacity = count.next_power_of_two();
        let buffer = device.create_buffer(BufferUsage::Dynamic, capacity * size_of::<PointLightInstance>())?;
        device.destroy_buffer(self.instance_buffer);
        log::debug!(
            "HelperGeometry: point light instance buffer grown from {} to {capacity}",
            self.instance_capacity
        );
        self.instance_buffer = buffer;
        self.instance_capacity = capacity;
        Ok(())
    }
}

/// The light type a shadow map is created for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadowMapKind {
    /// Square depth texture of `directional_shadow_size`.
    Directional,
    /// Square depth texture of `spot_shadow_size`.
    Spot,
    /// Depth cube map with `point_shadow_size` faces.
    Point,
}

/// Frame-independent resources shared by every lane.
#[derive(Debug, Clone)]
pub struct Environment {
    /// Shader programs.
    pub shaders: ShaderSet,
    /// Fallback textures.
    pub defaults: DefaultTextures,
    /// Framebuffer shadow maps are attached to.
    pub depth_framebuffer: FrameBufferHandle,
    /// Framebuffer full-screen passes render through.
    pub post_process_framebuffer: FrameBufferHandle,
    /// Bloom ping-pong pair.
    pub bloom_buffers: [BloomBuffer; 2],
    /// Helper geometry.
    pub geometry: HelperGeometry,
    /// Frame-wide settings.
    pub settings: PipelineSettings,
}

impl Environment {
    /// Creates every shared resource.
    ///
    /// Bloom buffers are allocated at half the viewport size.
    pub fn create(
        backend: &mut dyn RenderBackend,
        settings: PipelineSettings,
    ) -> Result<Self, ResourceError> {
        let shaders = ShaderSet::load(&*backend)?;
        let defaults = DefaultTextures::create(&*backend)?;
        let depth_framebuffer = backend.create_framebuffer(Some("shadow_depth"))?;
        let post_process_framebuffer = backend.create_framebuffer(Some("post_process"))?;

        let bloom_width = (settings.viewport_width / 2).max(1);
        let bloom_height = (settings.viewport_height / 2).max(1);
        let mut bloom = |label: &str| -> Result<BloomBuffer, ResourceError> {
            let framebuffer = backend.create_framebuffer(Some(label))?;
            let texture =
                backend.create_texture(TextureKind::Color2d, bloom_width, bloom_height, Some(label))?;
            backend.attach_texture(&framebuffer, &texture, Attachment::Color(0));
            Ok(BloomBuffer {
                framebuffer,
                texture: Some(texture),
            })
        };
        let bloom_buffers = [bloom("bloom_ping")?, bloom("bloom_pong")?];

        let geometry = HelperGeometry::create(&*backend, settings.point_light_instance_capacity)?;

        log::info!(
            "Environment: created shared resources for a {}x{} viewport",
            settings.viewport_width,
            settings.viewport_height
        );
        Ok(Self {
            shaders,
            defaults,
            depth_framebuffer,
            post_process_framebuffer,
            bloom_buffers,
            geometry,
            settings,
        })
    }

    /// Creates a depth texture sized by the settings for `kind`.
    pub fn create_shadow_map<D: GraphicsDevice + ?Sized>(
        &self,
        device: &D,
        kind: ShadowMapKind,
    ) -> Result<TextureHandle, ResourceError> {
        let settings = &self.settings;
        let (texture_kind, size, label) = match kind {
            ShadowMapKind::Directional => {
                (TextureKind::Depth2d, settings.directional_shadow_size, "directional_shadow")
            }
            ShadowMapKind::Spot => (TextureKind::Depth2d, settings.spot_shadow_size, "spot_shadow"),
            ShadowMapKind::Point => (TextureKind::DepthCubeMap, settings.point_shadow_size, "point_shadow"),
        };
        device.create_texture(texture_kind, size, size, Some(label))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use umbra_core::renderer::RecordingBackend;

    #[test]
    fn test_create_environment() {
        let mut backend = RecordingBackend::new();
        let env = Environment::create(&mut backend, PipelineSettings::default()).unwrap();
        assert_eq!(env.defaults.black_cube_map.kind, TextureKind::CubeMap);
        assert!(env.bloom_buffers.iter().all(|b| b.texture.is_some()));
        assert_ne!(
            env.bloom_buffers[0].framebuffer.id,
            env.bloom_buffers[1].framebuffer.id
        );
        assert_eq!(env.geometry.rectangle.index_count, 6);
        assert_eq!(env.shaders.bloom.label, "bloom");
    }

    #[test]
    fn test_debug_lines_upload_clamps_to_pairs() {
        let backend = RecordingBackend::new();
        let mut lines = DebugLines::create(&backend, 4).unwrap();
        lines.upload(&backend, &[Vec3::ZERO; 3]).unwrap();
        assert_eq!(lines.vertex_count, 2);
        lines.upload(&backend, &[Vec3::ONE; 10]).unwrap();
        assert_eq!(lines.vertex_count, 4);
        lines.clear();
        assert_eq!(lines.vertex_count, 0);
    }

    #[test]
    fn test_instance_buffer_grows_to_fit() {
        let mut backend = RecordingBackend::new();
        let settings = PipelineSettings {
            point_light_instance_capacity: 2,
            ..Default::default()
        };
        let mut env = Environment::create(&mut backend, settings).unwrap();
        let old = env.geometry.instance_buffer;

        env.geometry.reserve_point_light_instances(&backend, 2).unwrap();
        assert_eq!(env.geometry.instance_buffer, old);

        env.geometry.reserve_point_light_instances(&backend, 5).unwrap();
        assert_eq!(env.geometry.instance_capacity, 8);
        assert_ne!(env.geometry.instance_buffer, old);
        assert!(backend.write_buffer(old, 0, &[0; 4]).is_err());
        let bytes = vec![0u8; 8 * size_of::<PointLightInstance>()];
        assert!(backend
            .write_buffer(env.geometry.instance_buffer, 0, &bytes)
            .is_ok());
    }

    #[test]
    fn test_shadow_maps_follow_settings() {
        let mut backend = RecordingBackend::new();
        let settings = PipelineSettings {
            directional_shadow_size: 2048,
            spot_shadow_size: 256,
            point_shadow_size: 128,
            ..Default::default()
        };
        let env = Environment::create(&mut backend, settings).unwrap();

        let sun = env.create_shadow_map(&backend, ShadowMapKind::Directional).unwrap();
        assert_eq!((sun.kind, sun.width, sun.height), (TextureKind::Depth2d, 2048, 2048));
        let spot = env.create_shadow_map(&backend, ShadowMapKind::Spot).unwrap();
        assert_eq!((spot.kind, spot.width), (TextureKind::Depth2d, 256));
        let point = env.create_shadow_map(&backend, ShadowMapKind::Point).unwrap();
        assert_eq!((point.kind, point.width), (TextureKind::DepthCubeMap, 128));
    }
}
