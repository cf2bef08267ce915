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

//! Post-process lane - skybox, debug overlay, bloom, tone mapping and
//! presentation of the final image.

use umbra_core::{
    lane::{Lane, LaneKind},
    renderer::{Attachment, TextureHandle},
};

use super::{CameraUnit, FrameContext, RenderLane};

/// Composites the HDR image into each camera's output texture.
#[derive(Debug, Default)]
pub struct PostProcessLane;

impl PostProcessLane {
    /// Creates a new `PostProcessLane`.
    pub fn new() -> Self {
        Self
    }

    /// Blurs `input` back and forth between the two bloom buffers.
    ///
    /// Pass `i` renders into buffer `i & 1` and samples the other buffer,
    /// except for the first pass which samples `input`. `horizontalKernel`
    /// alternates with the parity, so pairs of passes form a full separable
    /// blur. With zero iterations the default black texture is returned and
    /// nothing is recorded.
    ///
    /// `iterations` must be even, and both bloom buffers must have a texture.
    pub fn perform_bloom_iterations(
        &self,
        frame: &mut FrameContext<'_>,
        input: &TextureHandle,
        iterations: u32,
    ) -> TextureHandle {
        let env = frame.env();
        if iterations == 0 {
            return env.defaults.black_map.clone();
        }
        debug_assert!(iterations % 2 == 0, "bloom iteration count must be even");

        let buffers = &env.bloom_buffers;
        debug_assert!(
            buffers.iter().all(|b| b.texture.is_some()),
            "bloom buffers must have textures attached"
        );
        let (Some(first), Some(second)) = (&buffers[0].texture, &buffers[1].texture) else {
            log::error!("PostProcessLane: bloom buffers have no texture, skipping bloom");
            return env.defaults.black_map.clone();
        };
        let textures = [first, second];

        let shader = &env.shaders.bloom;
        frame.uniform(shader, "BloomTexture", 0);
        for i in 0..iterations as usize {
            let parity = i & 1;
            let target = &buffers[parity];
            let source = if i == 0 { input } else { textures[1 - parity] };

            frame.uniform(shader, "horizontalKernel", parity as i32);
            frame.backend.bind_texture(source, 0);
            frame.render_to_framebuffer(&target.framebuffer, textures[parity].size(), shader);
            frame.stats.bloom_passes += 1;
        }

        let result = textures[1];
        frame.backend.generate_mipmaps(result);
        result.clone()
    }

    /// Draws the skybox and the debug overlay into the HDR texture, depth
    /// tested against the G-buffer but without writing depth.
    pub fn draw_environment(&self, frame: &mut FrameContext<'_>, camera: &CameraUnit) {
        let env = frame.env();
        let framebuffer = &env.post_process_framebuffer;
        let targets = &camera.targets;

        frame
            .backend
            .attach_texture(framebuffer, &targets.hdr, Attachment::Color(0));
        frame
            .backend
            .attach_texture(framebuffer, &targets.depth, Attachment::Depth);
        frame.backend.bind_framebuffer(framebuffer);
        let (width, height) = targets.hdr.size();
        frame.backend.set_viewport(0, 0, width, height);

        frame.backend.set_depth_mask(false);
        self.draw_skybox(frame, camera);
        self.draw_debug_lines(frame, camera);
        frame.backend.set_depth_mask(true);

        frame.backend.detach(framebuffer, Attachment::Depth);
    }

    fn draw_skybox(&self, frame: &mut FrameContext<'_>, camera: &CameraUnit) {
        let env = frame.env();
        let shader = &env.shaders.skybox;
        frame.uniform(
            shader,
            "StaticViewProjection",
            camera.projection_matrix * camera.static_view_matrix,
        );
        frame.uniform(shader, "Rotation", camera.inverse_skybox_rotation.transpose());
        frame.uniform(shader, "fog.color", env.settings.fog_color);
        frame.uniform(shader, "fog.density", env.settings.fog_density);
        frame.uniform(shader, "fog.distance", env.settings.fog_distance);
        frame.bind_sampler(shader, "skybox", &camera.skybox_texture, 0);
        frame.draw(&env.geometry.skybox_cube, shader, 0);
    }

    fn draw_debug_lines(&self, frame: &mut FrameContext<'_>, camera: &CameraUnit) {
        let env = frame.env();
        let lines = &env.geometry.debug_lines;
        if lines.vertex_count == 0 {
            return;
        }
        let shader = &env.shaders.debug_lines;
        frame.backend.set_depth_test(!env.settings.overlay_debug_draws);
        frame.uniform(shader, "ViewProjMatrix", camera.view_projection);
        frame
            .backend
            .draw_lines(lines.vertex_array, lines.vertex_count, shader);
        frame.stats.geometry.draw_calls += 1;
        frame.backend.set_depth_test(true);
    }

    /// Tone maps the HDR texture plus bloom into the camera's output texture.
    pub fn tone_map(&self, frame: &mut FrameContext<'_>, camera: &CameraUnit, bloom: &TextureHandle) {
        let env = frame.env();
        let shader = &env.shaders.hdr_to_ldr;
        let targets = &camera.targets;

        frame.bind_sampler(shader, "HDRTex", &targets.hdr, 0);
        frame.bind_sampler(shader, "bloomTex", bloom, 1);
        frame.uniform(shader, "exposure", camera.exposure);
        frame.uniform(shader, "bloomWeight", camera.bloom_weight);
        frame.render_to_texture(&targets.output, shader);
        frame.backend.generate_mipmaps(&targets.output);
    }

    /// Draws `image` over the whole bound target.
    pub fn present(&self, frame: &mut FrameContext<'_>, image: &TextureHandle) {
        let env = frame.env();
        let shader = &env.shaders.image_blit;
        frame.uniform(shader, "tex", 0);
        frame.backend.bind_texture(image, 0);
        frame.draw(&env.geometry.rectangle, shader, 0);
        frame.stats.presented = true;
    }
}

impl Lane for PostProcessLane {
    fn strategy_name(&self) -> &'static str {
        "BloomToneMap"
    }

    fn lane_kind(&self) -> LaneKind {
        LaneKind::PostProcess
    }
}

impl RenderLane for PostProcessLane {
    fn render(&self, frame: &mut FrameContext<'_>, camera: &CameraUnit) {
        self.draw_environment(frame, camera);
        let bloom = self.perform_bloom_iterations(frame, &camera.targets.hdr, camera.bloom_iterations);
        self.tone_map(frame, camera, &bloom);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render_lane::{Environment, FrameStats, Pipeline};
    use umbra_core::{
        math::Vec3,
        renderer::{PipelineSettings, RecordingBackend, RenderCommand, UniformValue},
        scene::{Camera, CameraTargets, Projection, Skybox, Transform},
    };

    fn scene(settings: PipelineSettings) -> (RecordingBackend, Environment, Pipeline) {
        let mut backend = RecordingBackend::new();
        let env = Environment::create(&mut backend, settings).unwrap();
        let targets = CameraTargets::create(&mut backend, 64, 64).unwrap();
        let mut camera = Camera::new(
            Projection::Perspective {
                fov_y: 1.0,
                aspect: 1.0,
                near: 0.1,
                far: 50.0,
            },
            targets,
        );
        camera.bloom_iterations = 2;
        camera.exposure = 0.5;

        let mut pipeline = Pipeline::new();
        pipeline.submit_camera(&env, &camera, &Transform::IDENTITY, &Skybox::default());
        (backend, env, pipeline)
    }

    #[test]
    fn test_render_order() {
        let (mut backend, env, pipeline) = scene(PipelineSettings::default());
        backend.take_commands();

        let mut stats = FrameStats::default();
        let mut frame = FrameContext::new(&mut backend, &pipeline, &env, &mut stats);
        PostProcessLane::new().render(&mut frame, &pipeline.cameras[0]);

        let draws: Vec<_> = backend
            .commands()
            .into_iter()
            .filter_map(|c| match c {
                RenderCommand::DrawIndexed { shader, .. } => Some(shader),
                _ => None,
            })
            .collect();
        assert_eq!(
            draws,
            vec![
                env.shaders.skybox.id,
                env.shaders.bloom.id,
                env.shaders.bloom.id,
                env.shaders.hdr_to_ldr.id,
            ]
        );
        assert_eq!(backend.uniform_values("exposure"), vec![UniformValue::Float(0.5)]);
        assert_eq!(stats.bloom_passes, 2);
        assert_eq!(
            backend.commands().last(),
            Some(&RenderCommand::GenerateMipmaps(
                pipeline.cameras[0].targets.output.id
            ))
        );
    }

    #[test]
    fn test_skybox_does_not_write_depth() {
        let (mut backend, env, pipeline) = scene(PipelineSettings::default());
        backend.take_commands();

        let mut stats = FrameStats::default();
        let mut frame = FrameContext::new(&mut backend, &pipeline, &env, &mut stats);
        PostProcessLane::new().draw_environment(&mut frame, &pipeline.cameras[0]);

        let commands = backend.commands();
        let mask_off = commands
            .iter()
            .position(|c| *c == RenderCommand::DepthMask(false))
            .unwrap();
        let draw = commands.iter().position(RenderCommand::is_draw).unwrap();
        let mask_on = commands
            .iter()
            .position(|c| *c == RenderCommand::DepthMask(true))
            .unwrap();
        assert!(mask_off < draw && draw < mask_on);
        assert!(!commands.iter().any(|c| matches!(c, RenderCommand::Clear)));
        assert!(matches!(
            commands.last(),
            Some(RenderCommand::Detach {
                attachment: Attachment::Depth,
                ..
            })
        ));
    }

    #[test]
    fn test_overlay_debug_lines_ignore_depth() {
        let (mut backend, mut env, pipeline) = scene(PipelineSettings {
            overlay_debug_draws: true,
            ..Default::default()
        });
        env.geometry
            .debug_lines
            .upload(&backend, &[Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::Z])
            .unwrap();
        backend.take_commands();

        let mut stats = FrameStats::default();
        let mut frame = FrameContext::new(&mut backend, &pipeline, &env, &mut stats);
        PostProcessLane::new().draw_environment(&mut frame, &pipeline.cameras[0]);

        let commands = backend.commands();
        let lines = commands
            .iter()
            .position(|c| matches!(c, RenderCommand::DrawLines { vertex_count: 4, .. }))
            .unwrap();
        assert_eq!(commands[lines - 2], RenderCommand::DepthTest(false));
        assert_eq!(commands[lines + 1], RenderCommand::DepthTest(true));
        assert_eq!(stats.geometry.draw_calls, 2);
    }

    #[test]
    fn test_present_draws_image() {
        let (mut backend, env, pipeline) = scene(PipelineSettings::default());
        backend.take_commands();

        let mut stats = FrameStats::default();
        let image = &pipeline.cameras[0].targets.output;
        let mut frame = FrameContext::new(&mut backend, &pipeline, &env, &mut stats);
        PostProcessLane::new().present(&mut frame, image);

        assert!(stats.presented);
        assert_eq!(
            backend.commands()[1],
            RenderCommand::BindTexture {
                texture: image.id,
                slot: 0
            }
        );
        assert_eq!(backend.draw_count(), 1);
    }
}
