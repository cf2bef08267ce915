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

//! Lighting pass lane - accumulates every light into the camera's HDR target.
//!
//! The pass runs in three steps:
//! 1. A full-screen global illumination pass for ambient, skybox reflection,
//!    fog and up to [`MAX_DIRECTIONAL_LIGHTS`] directional lights.
//! 2. Light-volume passes for spot lights (pyramids) and shadow-casting point
//!    lights (spheres), blended additively on top.
//! 3. One instanced sphere draw for every shadowless point light.

use umbra_core::{
    lane::{Lane, LaneKind},
    math::Vec2,
    renderer::{BlendState, CullMode, Shader},
};

use super::{CameraUnit, FrameContext, PointLightInstance, RenderLane};

/// Directional lights the global illumination shader can take.
pub const MAX_DIRECTIONAL_LIGHTS: usize = 2;

/// Texture slot shared by the light-volume passes for the light's shadow map.
const LIGHT_DEPTH_SLOT: u32 = 4;

/// Storage buffer binding of the point-light instance array.
const INSTANCE_BINDING: u32 = 0;

/// Deferred light accumulation.
///
/// Light volumes blend additively into the HDR target. Once they are drawn
/// blending is switched off rather than left on, so the post-process passes
/// that follow overwrite their targets instead of mixing with them.
#[derive(Debug, Default)]
pub struct LightingPassLane;

impl LightingPassLane {
    /// Creates a new `LightingPassLane`.
    pub fn new() -> Self {
        Self
    }

    fn bind_gbuffer(&self, frame: &mut FrameContext<'_>, shader: &Shader, camera: &CameraUnit) {
        let targets = &camera.targets;
        frame.bind_sampler(shader, "albedoTex", &targets.albedo, 0);
        frame.bind_sampler(shader, "normalTex", &targets.normal, 1);
        frame.bind_sampler(shader, "materialTex", &targets.material, 2);
        frame.bind_sampler(shader, "depthTex", &targets.depth, 3);
    }

    fn bind_camera(&self, frame: &mut FrameContext<'_>, shader: &Shader, camera: &CameraUnit) {
        frame.uniform(shader, "viewPosition", camera.position);
        frame.uniform(shader, "invProjMatrix", camera.inverse_projection);
        frame.uniform(shader, "invViewMatrix", camera.inverse_view);
    }

    fn viewport_size(camera: &CameraUnit) -> Vec2 {
        let (width, height) = camera.targets.output.size();
        Vec2::new(width as f32, height as f32)
    }

    /// Ambient, fog and directional lighting into the HDR texture.
    pub fn global_illumination(&self, frame: &mut FrameContext<'_>, camera: &CameraUnit) {
        let env = frame.env();
        let shader = &env.shaders.global_illumination;
        let targets = &camera.targets;

        for texture in [&targets.albedo, &targets.normal, &targets.material, &targets.depth] {
            frame.backend.generate_mipmaps(texture);
        }

        self.bind_gbuffer(frame, shader, camera);
        self.bind_camera(frame, shader, camera);
        frame.uniform(shader, "skyboxTransform", camera.inverse_skybox_rotation);
        frame.bind_sampler(shader, "skyboxTex", &camera.skybox_texture, 4);

        let settings = &env.settings;
        frame.uniform(shader, "fog.distance", settings.fog_distance);
        frame.uniform(shader, "fog.density", settings.fog_density);
        frame.uniform(shader, "fog.color", settings.fog_color);

        let lights = &frame.pipeline().lighting.directional;
        if lights.len() > MAX_DIRECTIONAL_LIGHTS {
            log::warn!(
                "LightingPassLane: {} directional lights submitted, shading the first {}",
                lights.len(),
                MAX_DIRECTIONAL_LIGHTS
            );
        }
        let count = lights.len().min(MAX_DIRECTIONAL_LIGHTS);
        frame.uniform(shader, "lightCount", count as i32);
        frame.uniform(shader, "pcfDistance", settings.shadow_blur_iterations);

        for i in 0..MAX_DIRECTIONAL_LIGHTS {
            let slot = 5 + i as u32;
            let sampler = format!("lightDepthMaps[{i}]");
            match lights.get(i) {
                Some(light) => {
                    frame.bind_sampler(shader, &sampler, &light.shadow_map, slot);
                    frame.uniform(shader, &format!("lights[{i}].transform"), light.biased_projection);
                    frame.uniform(shader, &format!("lights[{i}].ambient"), light.color.ambient);
                    frame.uniform(shader, &format!("lights[{i}].diffuse"), light.color.diffuse);
                    frame.uniform(shader, &format!("lights[{i}].specular"), light.color.specular);
                    frame.uniform(shader, &format!("lights[{i}].direction"), light.direction);
                }
                None => frame.bind_sampler(shader, &sampler, &env.defaults.black_map, slot),
            }
        }

        frame.render_to_texture(&targets.hdr, shader);
    }

    /// Spot light volumes, additively blended into the bound HDR target.
    pub fn spot_lights(&self, frame: &mut FrameContext<'_>, camera: &CameraUnit) {
        let lights = &frame.pipeline().lighting.spot;
        if lights.is_empty() {
            return;
        }
        let env = frame.env();
        let shader = &env.shaders.spot_light;

        self.bind_gbuffer(frame, shader, camera);
        self.bind_camera(frame, shader, camera);
        frame.uniform(shader, "viewportSize", Self::viewport_size(camera));
        frame.uniform(shader, "pcfDistance", env.settings.shadow_blur_iterations);

        for light in lights {
            frame.bind_sampler(shader, "lightDepthMap", &light.shadow_map, LIGHT_DEPTH_SLOT);
            frame.uniform(shader, "MVP", camera.view_projection * light.pyramid_transform);
            frame.uniform(shader, "spotLight.transform", light.biased_projection);
            frame.uniform(shader, "spotLight.innerAngle", light.inner_cos);
            frame.uniform(shader, "spotLight.outerAngle", light.outer_cos);
            frame.uniform(shader, "spotLight.direction", light.direction);
            frame.uniform(shader, "spotLight.position", light.position);
            frame.uniform(shader, "spotLight.ambient", light.color.ambient);
            frame.uniform(shader, "spotLight.diffuse", light.color.diffuse);
            frame.uniform(shader, "spotLight.specular", light.color.specular);
            frame.draw(&env.geometry.pyramid, shader, 0);
        }
    }

    /// Shadow-casting point light volumes.
    pub fn point_lights(&self, frame: &mut FrameContext<'_>, camera: &CameraUnit) {
        let lights = &frame.pipeline().lighting.point;
        if lights.is_empty() {
            return;
        }
        let env = frame.env();
        let shader = &env.shaders.point_light;

        self.bind_gbuffer(frame, shader, camera);
        self.bind_camera(frame, shader, camera);
        frame.uniform(shader, "viewportSize", Self::viewport_size(camera));

        for light in lights {
            frame.bind_sampler(shader, "lightDepthMap", &light.shadow_map, LIGHT_DEPTH_SLOT);
            frame.uniform(shader, "MVP", camera.view_projection * light.sphere_transform);
            frame.uniform(shader, "pointLight.position", light.position);
            frame.uniform(shader, "pointLight.radius", light.radius);
            frame.uniform(shader, "pointLight.zfar", light.far_distance);
            frame.uniform(shader, "pointLight.ambient", light.color.ambient);
            frame.uniform(shader, "pointLight.diffuse", light.color.diffuse);
            frame.uniform(shader, "pointLight.specular", light.color.specular);
            frame.draw(&env.geometry.sphere, shader, 0);
        }
    }

    /// Every shadowless point light in one instanced draw.
    ///
    /// The controller grows the instance buffer before the frame starts. If
    /// that growth failed, lights beyond the capacity are dropped with a
    /// warning. If the upload fails the pass is skipped for this frame.
    pub fn instanced_point_lights(&self, frame: &mut FrameContext<'_>, camera: &CameraUnit) {
        let instances = &frame.pipeline().lighting.point_instances;
        if instances.is_empty() {
            return;
        }
        let env = frame.env();
        let geometry = &env.geometry;

        let count = instances.len().min(geometry.instance_capacity);
        if count < instances.len() {
            log::warn!(
                "LightingPassLane: instance buffer holds {count} point lights, {} submitted",
                instances.len()
            );
        }
        let bytes: &[u8] = bytemuck::cast_slice::<PointLightInstance, u8>(&instances[..count]);
        if let Err(err) = frame.backend.write_buffer(geometry.instance_buffer, 0, bytes) {
            log::error!("LightingPassLane: failed to upload point light instances: {err}");
            return;
        }

        let shader = &env.shaders.instanced_point_light;
        frame.backend.bind_buffer(geometry.instance_buffer, INSTANCE_BINDING);
        self.bind_gbuffer(frame, shader, camera);
        self.bind_camera(frame, shader, camera);
        frame.uniform(shader, "viewportSize", Self::viewport_size(camera));
        frame.uniform(shader, "ViewProjMatrix", camera.view_projection);
        frame.draw(&geometry.sphere, shader, count as u32);
    }
}

impl Lane for LightingPassLane {
    fn strategy_name(&self) -> &'static str {
        "DeferredLightVolumes"
    }

    fn lane_kind(&self) -> LaneKind {
        LaneKind::Lighting
    }
}

impl RenderLane for LightingPassLane {
    fn render(&self, frame: &mut FrameContext<'_>, camera: &CameraUnit) {
        self.global_illumination(frame, camera);

        // Light volumes are drawn by their back faces so they still shade
        // when the camera stands inside them.
        frame.backend.set_culling(CullMode::Front);
        frame.backend.set_blending(Some(BlendState::LIGHT_ACCUMULATE));
        self.spot_lights(frame, camera);
        self.point_lights(frame, camera);
        self.instanced_point_lights(frame, camera);
        frame.backend.set_blending(None);
        frame.backend.set_culling(CullMode::Back);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render_lane::{Environment, FrameStats, Pipeline};
    use umbra_core::{
        math::Vec3,
        renderer::{
            GraphicsDevice, PipelineSettings, RecordingBackend, RenderCommand, TextureKind,
            UniformValue,
        },
        scene::{
            Camera, CameraTargets, DirectionalLight, LightColor, Projection, Skybox, Transform,
        },
    };

    fn scene(directional_lights: usize) -> (RecordingBackend, Environment, Pipeline) {
        let mut backend = RecordingBackend::new();
        let env = Environment::create(&mut backend, PipelineSettings::default()).unwrap();
        let targets = CameraTargets::create(&mut backend, 128, 64).unwrap();
        let camera = Camera::new(
            Projection::Perspective {
                fov_y: 1.0,
                aspect: 2.0,
                near: 0.1,
                far: 50.0,
            },
            targets,
        );

        let mut pipeline = Pipeline::new();
        pipeline.submit_camera(&env, &camera, &Transform::IDENTITY, &Skybox::default());
        for _ in 0..directional_lights {
            let light = DirectionalLight {
                color: LightColor::default(),
                direction: Vec3::NEG_Y,
                projection_size: 10.0,
                depth_map: backend
                    .create_texture(TextureKind::Depth2d, 256, 256, None)
                    .unwrap(),
            };
            pipeline.submit_directional_light(&light, &Transform::IDENTITY);
        }
        backend.take_commands();
        (backend, env, pipeline)
    }

    #[test]
    fn test_unused_directional_slots_get_black_map() {
        let (mut backend, env, pipeline) = scene(1);

        let mut stats = FrameStats::default();
        let mut frame = FrameContext::new(&mut backend, &pipeline, &env, &mut stats);
        LightingPassLane::new().global_illumination(&mut frame, &pipeline.cameras[0]);

        assert_eq!(backend.uniform_values("lightCount"), vec![UniformValue::Int(1)]);
        let commands = backend.commands();
        assert!(commands.contains(&RenderCommand::BindTexture {
            texture: pipeline.lighting.directional[0].shadow_map.id,
            slot: 5,
        }));
        assert!(commands.contains(&RenderCommand::BindTexture {
            texture: env.defaults.black_map.id,
            slot: 6,
        }));
        assert!(backend.uniform_values("lights[1].transform").is_empty());
        assert_eq!(stats.geometry.draw_calls, 1);
    }

    #[test]
    fn test_extra_directional_lights_are_ignored() {
        let (mut backend, env, pipeline) = scene(3);

        let mut stats = FrameStats::default();
        let mut frame = FrameContext::new(&mut backend, &pipeline, &env, &mut stats);
        LightingPassLane::new().global_illumination(&mut frame, &pipeline.cameras[0]);

        assert_eq!(
            backend.uniform_values("lightCount"),
            vec![UniformValue::Int(MAX_DIRECTIONAL_LIGHTS as i32)]
        );
        assert!(backend.uniform_values("lights[2].transform").is_empty());
    }

    #[test]
    fn test_light_volumes_restore_state() {
        let (mut backend, env, pipeline) = scene(0);

        let mut stats = FrameStats::default();
        let mut frame = FrameContext::new(&mut backend, &pipeline, &env, &mut stats);
        LightingPassLane::new().render(&mut frame, &pipeline.cameras[0]);

        let commands = backend.commands();
        let tail = &commands[commands.len() - 4..];
        assert_eq!(
            tail,
            &[
                RenderCommand::Culling(CullMode::Front),
                RenderCommand::Blending(Some(BlendState::LIGHT_ACCUMULATE)),
                RenderCommand::Blending(None),
                RenderCommand::Culling(CullMode::Back),
            ]
        );
        // Only the full-screen pass runs without lights.
        assert_eq!(backend.draw_count(), 1);
    }
}
