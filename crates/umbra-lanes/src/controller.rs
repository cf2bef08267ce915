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

//! The `RenderController` sequences the lanes into a frame.
//!
//! A frame is driven by the scene layer in four steps:
//!
//! ```text
//! reset_pipeline()  →  submit_*()*  →  start_pipeline()  →  end_pipeline()
//! ```
//!
//! `start_pipeline` renders shadow maps once, then runs every rendering camera
//! through geometry, lighting and post-processing. `end_pipeline` presents the
//! main camera's output on the default framebuffer.

use umbra_core::{
    lane::Lane,
    renderer::{BlendState, CullMode, PipelineSettings, RenderBackend, ResourceError, TextureHandle},
    scene::{Camera, LightType, Material, Skybox, SubMesh, Transform},
};

use crate::render_lane::{
    Environment, FrameContext, FrameStats, GeometryPassLane, LightingPassLane, Pipeline,
    PointLightInstance, PostProcessLane, RenderLane, ShadowLane, ShadowMapKind, ShadowPassLane,
};

/// Owns the backend, the per-frame pipeline, the environment and the lanes.
pub struct RenderController<B: RenderBackend> {
    backend: B,
    environment: Environment,
    pipeline: Pipeline,
    stats: FrameStats,
    shadow_lane: ShadowPassLane,
    geometry_lane: GeometryPassLane,
    lighting_lane: LightingPassLane,
    post_process_lane: PostProcessLane,
}

impl<B: RenderBackend> RenderController<B> {
    /// Creates the shared environment on `backend` and applies the initial
    /// render state: depth test on, back-face culling, alpha blending and
    /// the configured anisotropic filtering.
    pub fn new(mut backend: B, settings: PipelineSettings) -> Result<Self, ResourceError> {
        let environment = Environment::create(&mut backend, settings)?;
        Ok(Self::with_environment(backend, environment))
    }

    /// Uses an environment created elsewhere.
    pub fn with_environment(mut backend: B, environment: Environment) -> Self {
        backend.set_anisotropic_filtering(environment.settings.anisotropic_filtering);
        backend.set_depth_test(true);
        backend.set_culling(CullMode::Back);
        backend.set_blending(Some(BlendState::ALPHA));

        let controller = Self {
            backend,
            environment,
            pipeline: Pipeline::new(),
            stats: FrameStats::default(),
            shadow_lane: ShadowPassLane::new(),
            geometry_lane: GeometryPassLane::new(),
            lighting_lane: LightingPassLane::new(),
            post_process_lane: PostProcessLane::new(),
        };
        for lane in controller.lanes() {
            log::info!(
                "RenderController: {} lane '{}' ready",
                lane.lane_kind(),
                lane.strategy_name()
            );
        }
        controller
    }

    /// Every lane, in execution order.
    pub fn lanes(&self) -> [&dyn Lane; 4] {
        [
            &self.shadow_lane,
            &self.geometry_lane,
            &self.lighting_lane,
            &self.post_process_lane,
        ]
    }

    /// The graphics backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The graphics backend, mutably.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Shared resources.
    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Shared resources, mutably. Used to replace defaults or upload debug lines.
    pub fn environment_mut(&mut self) -> &mut Environment {
        &mut self.environment
    }

    /// This frame's submissions.
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Statistics of the frame in progress, or of the last one after `end_pipeline`.
    pub fn frame_statistics(&self) -> &FrameStats {
        &self.stats
    }

    // --- Submission ---

    /// Clears every per-frame collection and the frame statistics.
    pub fn reset_pipeline(&mut self) {
        self.pipeline.reset();
        self.stats = FrameStats::default();
    }

    /// Submits a light owned by an entity at `transform`.
    pub fn submit_light(&mut self, light: &LightType, transform: &Transform) {
        self.pipeline.submit_light(light, transform);
    }

    /// Submits a shadowless point light for the instanced pass.
    pub fn submit_point_light_instance(&mut self, instance: PointLightInstance) {
        self.pipeline.submit_point_light_instance(instance);
    }

    /// Creates a shadow map for a light of `kind`, sized by the settings.
    pub fn create_shadow_map(&self, kind: ShadowMapKind) -> Result<TextureHandle, ResourceError> {
        self.environment.create_shadow_map(&self.backend, kind)
    }

    /// Submits a camera placed at `transform`.
    pub fn submit_camera(&mut self, camera: &Camera, transform: &Transform, skybox: &Skybox) {
        self.pipeline
            .submit_camera(&self.environment, camera, transform, skybox);
    }

    /// Submits one sub-mesh of an object at `parent`.
    pub fn submit_primitive(
        &mut self,
        sub_mesh: &SubMesh,
        material: &Material,
        parent: &Transform,
        instance_count: u32,
    ) {
        self.pipeline
            .submit_primitive(&self.environment, sub_mesh, material, parent, instance_count);
    }

    // --- Frame ---

    /// Renders every submitted camera into its output texture.
    ///
    /// Without cameras nothing is rendered; the default framebuffer is bound
    /// and cleared if presentation is enabled. The point light instance buffer
    /// grows first if more instances were submitted than it holds.
    pub fn start_pipeline(&mut self) {
        if !self.pipeline.cameras.is_empty() {
            let wanted = self.pipeline.lighting.point_instances.len();
            if let Err(err) = self
                .environment
                .geometry
                .reserve_point_light_instances(&self.backend, wanted)
            {
                log::error!("RenderController: cannot grow the point light instance buffer: {err}");
            }
        }

        let Self {
            backend,
            environment,
            pipeline,
            stats,
            shadow_lane,
            geometry_lane,
            lighting_lane,
            post_process_lane,
        } = self;
        let (pipeline, environment) = (&*pipeline, &*environment);
        let mut frame = FrameContext::new(backend, pipeline, environment, stats);

        if pipeline.cameras.is_empty() {
            if environment.settings.render_to_default_framebuffer {
                frame.attach_default_framebuffer();
            }
            log::trace!("RenderController: no cameras submitted");
            return;
        }

        shadow_lane.render_shadow_maps(&mut frame);

        let lanes: [&dyn RenderLane; 3] = [&*geometry_lane, &*lighting_lane, &*post_process_lane];
        for camera in pipeline.cameras.iter().filter(|c| c.render_to_texture) {
            for lane in lanes {
                lane.render(&mut frame, camera);
            }
            frame.stats.cameras_rendered += 1;
        }
        log::debug!(
            "RenderController: rendered {} of {} cameras",
            frame.stats.cameras_rendered,
            pipeline.cameras.len()
        );
    }

    /// Binds the default framebuffer and presents the main camera's output.
    ///
    /// Does nothing beyond the bind when presentation is disabled or the main
    /// camera index is out of range.
    pub fn end_pipeline(&mut self) {
        let mut frame = FrameContext::new(
            &mut self.backend,
            &self.pipeline,
            &self.environment,
            &mut self.stats,
        );
        frame.attach_default_framebuffer();

        let settings = &self.environment.settings;
        if !settings.render_to_default_framebuffer {
            return;
        }
        match self.pipeline.cameras.get(settings.main_camera_index) {
            Some(camera) => {
                self.post_process_lane
                    .present(&mut frame, &camera.targets.output);
            }
            None => log::debug!(
                "RenderController: main camera {} not submitted, nothing to present",
                settings.main_camera_index
            ),
        }
    }

    /// Flushes queued GPU work.
    pub fn render(&mut self) {
        self.backend.finish();
    }

    /// Clears the bound render target.
    pub fn clear(&mut self) {
        self.backend.clear();
    }

    // --- State ---

    /// Resizes the default framebuffer viewport.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        let settings = &mut self.environment.settings;
        settings.viewport_width = width;
        settings.viewport_height = height;
        self.backend.set_viewport(0, 0, width, height);
    }

    /// Selects which faces are culled.
    pub fn toggle_face_culling(&mut self, mode: CullMode) {
        self.backend.set_culling(mode);
    }

    /// Switches reversed depth on or off.
    pub fn toggle_reversed_depth(&mut self, enabled: bool) {
        self.backend.set_reversed_depth(enabled);
    }

    /// Switches depth-only rendering (color writes off) on or off.
    pub fn toggle_depth_only_mode(&mut self, depth_only: bool) {
        self.backend.set_color_mask(!depth_only);
    }

    /// Sets the anisotropic filtering level and remembers it in the settings.
    pub fn set_anisotropic_filtering(&mut self, level: f32) {
        self.environment.settings.anisotropic_filtering = level;
        self.backend.set_anisotropic_filtering(level);
    }

    /// Replaces the settings, applying the parts that map to backend state.
    ///
    /// Bloom buffers keep their size; recreate the environment to resize them.
    pub fn apply_settings(&mut self, settings: PipelineSettings) {
        self.backend.set_anisotropic_filtering(settings.anisotropic_filtering);
        self.backend
            .set_viewport(0, 0, settings.viewport_width, settings.viewport_height);
        self.environment.settings = settings;
    }

    /// Runs the bloom blur on `input` outside of a frame.
    pub fn perform_bloom_iterations(&mut self, input: &TextureHandle, iterations: u32) -> TextureHandle {
        let mut frame = FrameContext::new(
            &mut self.backend,
            &self.pipeline,
            &self.environment,
            &mut self.stats,
        );
        self.post_process_lane
            .perform_bloom_iterations(&mut frame, input, iterations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use umbra_core::{
        lane::LaneKind,
        renderer::{BlendState, RecordingBackend, RenderCommand},
    };

    fn controller(settings: PipelineSettings) -> RenderController<RecordingBackend> {
        RenderController::new(RecordingBackend::new(), settings).unwrap()
    }

    #[test]
    fn test_new_applies_initial_state() {
        let ctrl = controller(PipelineSettings::default());
        let commands = ctrl.backend().commands();
        assert!(commands.contains(&RenderCommand::AnisotropicFiltering(4.0)));
        assert!(commands.contains(&RenderCommand::DepthTest(true)));
        assert!(commands.contains(&RenderCommand::Culling(CullMode::Back)));
        assert!(commands.contains(&RenderCommand::Blending(Some(BlendState::ALPHA))));
        assert!(ctrl.pipeline().is_empty());
    }

    #[test]
    fn test_lanes_run_in_frame_order() {
        let ctrl = controller(PipelineSettings::default());
        let kinds: Vec<LaneKind> = ctrl.lanes().iter().map(|l| l.lane_kind()).collect();
        assert_eq!(
            kinds,
            vec![
                LaneKind::Shadow,
                LaneKind::Geometry,
                LaneKind::Lighting,
                LaneKind::PostProcess
            ]
        );
    }

    #[test]
    fn test_empty_frame_binds_default_framebuffer() {
        let mut ctrl = controller(PipelineSettings::default());
        ctrl.backend_mut().take_commands();

        ctrl.reset_pipeline();
        ctrl.start_pipeline();

        let commands = ctrl.backend_mut().take_commands();
        assert_eq!(
            commands,
            vec![
                RenderCommand::BindDefaultFrameBuffer,
                RenderCommand::Viewport {
                    x: 0,
                    y: 0,
                    width: 1280,
                    height: 720
                },
                RenderCommand::Clear,
            ]
        );
        assert_eq!(ctrl.frame_statistics().shadow_maps, 0);
    }

    #[test]
    fn test_empty_frame_without_presentation_does_nothing() {
        let mut ctrl = controller(PipelineSettings {
            render_to_default_framebuffer: false,
            ..Default::default()
        });
        ctrl.backend_mut().take_commands();

        ctrl.start_pipeline();

        assert!(ctrl.backend().commands().is_empty());
    }

    #[test]
    fn test_set_viewport_updates_settings() {
        let mut ctrl = controller(PipelineSettings::default());
        ctrl.set_viewport(640, 480);
        assert_eq!(ctrl.environment().settings.viewport_width, 640);
        assert_eq!(ctrl.environment().settings.viewport_height, 480);
        assert_eq!(
            ctrl.backend().commands().last(),
            Some(&RenderCommand::Viewport {
                x: 0,
                y: 0,
                width: 640,
                height: 480
            })
        );
    }

    #[test]
    fn test_apply_settings_replaces_settings() {
        let mut ctrl = controller(PipelineSettings::default());
        ctrl.apply_settings(PipelineSettings {
            anisotropic_filtering: 16.0,
            main_camera_index: 2,
            ..Default::default()
        });
        assert_eq!(ctrl.environment().settings.main_camera_index, 2);
        assert!(ctrl
            .backend()
            .commands()
            .contains(&RenderCommand::AnisotropicFiltering(16.0)));
    }

    #[test]
    fn test_toggles_forward_to_backend() {
        let mut ctrl = controller(PipelineSettings::default());
        ctrl.backend_mut().take_commands();
        ctrl.toggle_face_culling(CullMode::None);
        ctrl.toggle_reversed_depth(true);
        ctrl.toggle_depth_only_mode(true);
        ctrl.render();
        assert_eq!(
            ctrl.backend().commands(),
            vec![
                RenderCommand::Culling(CullMode::None),
                RenderCommand::ReversedDepth(true),
                RenderCommand::ColorMask(false),
                RenderCommand::Finish,
            ]
        );
    }
}
