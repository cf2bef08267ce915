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

//! The per-frame context lanes render through, and frame statistics.

use std::fmt::{self, Display, Formatter};

use umbra_core::renderer::{
    Attachment, FrameBuffer, GpuMesh, RenderBackend, Shader, Texture, UniformValue,
};

use super::{Environment, Pipeline};

/// Draw-call counters, accumulated per frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderPassStatistics {
    /// Draw calls issued.
    pub draw_calls: usize,
    /// Triangles submitted, counting every instance.
    pub triangles_rendered: usize,
}

impl Display for RenderPassStatistics {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Draw Calls: {}\n\
            Triangles Rendered: {}",
            self.draw_calls, self.triangles_rendered
        )
    }
}

impl std::ops::AddAssign for RenderPassStatistics {
    fn add_assign(&mut self, rhs: Self) {
        self.draw_calls += rhs.draw_calls;
        self.triangles_rendered += rhs.triangles_rendered;
    }
}

/// What one frame did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Shadow maps rendered.
    pub shadow_maps: usize,
    /// Cameras that went through the full pipeline.
    pub cameras_rendered: usize,
    /// Render units rejected by frustum culling.
    pub units_culled: usize,
    /// Bloom blur passes.
    pub bloom_passes: usize,
    /// Whether an image reached the default framebuffer.
    pub presented: bool,
    /// Draw counters.
    pub geometry: RenderPassStatistics,
}

impl Display for FrameStats {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Shadow Maps: {}\n\
            Cameras Rendered: {}\n\
            Units Culled: {}\n\
            Bloom Passes: {}\n\
            Presented: {}\n\
            {}",
            self.shadow_maps,
            self.cameras_rendered,
            self.units_culled,
            self.bloom_passes,
            self.presented,
            self.geometry
        )
    }
}

/// Everything a lane needs to record one stage of a frame.
pub struct FrameContext<'a> {
    /// The graphics backend.
    pub backend: &'a mut dyn RenderBackend,
    /// This frame's submissions.
    pub pipeline: &'a Pipeline,
    /// Shared resources.
    pub env: &'a Environment,
    /// Counters for this frame.
    pub stats: &'a mut FrameStats,
}

impl<'a> FrameContext<'a> {
    /// Bundles the parts of a frame.
    pub fn new(
        backend: &'a mut dyn RenderBackend,
        pipeline: &'a Pipeline,
        env: &'a Environment,
        stats: &'a mut FrameStats,
    ) -> Self {
        Self {
            backend,
            pipeline,
            env,
            stats,
        }
    }

    /// Shared resources, borrowed for the whole frame rather than from `self`.
    #[inline]
    pub fn env(&self) -> &'a Environment {
        self.env
    }

    /// This frame's submissions, borrowed for the whole frame.
    #[inline]
    pub fn pipeline(&self) -> &'a Pipeline {
        self.pipeline
    }

    /// Binds `framebuffer`, sets the viewport to `size` and clears it.
    pub fn attach_framebuffer(&mut self, framebuffer: &FrameBuffer, size: (u32, u32)) {
        self.backend.bind_framebuffer(framebuffer);
        self.backend.set_viewport(0, 0, size.0, size.1);
        self.backend.clear();
    }

    /// Attaches a shadow map to the shared depth framebuffer and makes it the target.
    pub fn attach_depth_map(&mut self, depth_map: &Texture) {
        let framebuffer = &self.env().depth_framebuffer;
        self.backend
            .attach_texture(framebuffer, depth_map, Attachment::Depth);
        self.attach_framebuffer(framebuffer, depth_map.size());
    }

    /// Binds the window framebuffer with the configured viewport and clears it.
    pub fn attach_default_framebuffer(&mut self) {
        let settings = &self.env().settings;
        self.backend.bind_default_framebuffer();
        self.backend
            .set_viewport(0, 0, settings.viewport_width, settings.viewport_height);
        self.backend.clear();
    }

    /// Attaches `framebuffer` and draws the full-screen rectangle with `shader`.
    pub fn render_to_framebuffer(&mut self, framebuffer: &FrameBuffer, size: (u32, u32), shader: &Shader) {
        self.attach_framebuffer(framebuffer, size);
        let rectangle = &self.env().geometry.rectangle;
        self.draw(rectangle, shader, 0);
    }

    /// Renders a full-screen pass of `shader` into `texture`, through the
    /// shared post-process framebuffer.
    pub fn render_to_texture(&mut self, texture: &Texture, shader: &Shader) {
        let framebuffer = &self.env().post_process_framebuffer;
        self.backend
            .attach_texture(framebuffer, texture, Attachment::Color(0));
        self.render_to_framebuffer(framebuffer, texture.size(), shader);
    }

    /// Switches depth-only rendering on (color writes off) or off.
    pub fn toggle_depth_only_mode(&mut self, depth_only: bool) {
        self.backend.set_color_mask(!depth_only);
    }

    /// Writes a uniform.
    pub fn uniform(&mut self, shader: &Shader, name: &str, value: impl Into<UniformValue>) {
        self.backend.set_uniform(shader, name, value.into());
    }

    /// Binds `texture` at `slot` and points sampler uniform `name` at it.
    pub fn bind_sampler(&mut self, shader: &Shader, name: &str, texture: &Texture, slot: u32) {
        self.backend.bind_texture(texture, slot);
        self.backend
            .set_uniform(shader, name, UniformValue::Int(slot as i32));
    }

    /// Draws `mesh` and counts the call.
    pub fn draw(&mut self, mesh: &GpuMesh, shader: &Shader, instance_count: u32) {
        self.backend.draw_indexed(mesh, shader, instance_count);
        self.stats.geometry += RenderPassStatistics {
            draw_calls: 1,
            triangles_rendered: (mesh.index_count / 3) as usize * instance_count.max(1) as usize,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statistics_accumulate() {
        let mut stats = RenderPassStatistics::default();
        stats += RenderPassStatistics {
            draw_calls: 2,
            triangles_rendered: 10,
        };
        stats += RenderPassStatistics {
            draw_calls: 1,
            triangles_rendered: 4,
        };
        assert_eq!(stats.draw_calls, 3);
        assert_eq!(stats.triangles_rendered, 14);
    }

    #[test]
    fn test_frame_stats_display() {
        let stats = FrameStats {
            shadow_maps: 3,
            presented: true,
            ..Default::default()
        };
        let text = stats.to_string();
        assert!(text.contains("Shadow Maps: 3"));
        assert!(text.contains("Presented: true"));
        assert!(text.contains("Draw Calls: 0"));
    }
}
