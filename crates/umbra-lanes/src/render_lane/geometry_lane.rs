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

//! Geometry pass lane - fills each camera's G-buffer with the opaque units.

use umbra_core::{
    lane::{Lane, LaneKind},
    renderer::{Shader, VertexAttribute},
};

use super::{
    shadow_lane::{MODEL_MATRIX_LOCATION, NORMAL_MATRIX_LOCATION},
    CameraUnit, FrameContext, MaterialUnit, RenderLane, RenderUnit,
};

/// Attribute location of the per-draw base color.
const BASE_COLOR_LOCATION: u32 = 12;

/// Renders opaque units into the G-buffer, skipping those outside the frustum.
#[derive(Debug, Default)]
pub struct GeometryPassLane;

impl GeometryPassLane {
    /// Creates a new `GeometryPassLane`.
    pub fn new() -> Self {
        Self
    }

    /// Draws every unit of `units` that the camera can see.
    ///
    /// Instanced units are always drawn: their bounding box only covers the
    /// first instance.
    pub fn draw_objects(&self, frame: &mut FrameContext<'_>, camera: &CameraUnit, units: &[RenderUnit]) {
        if units.is_empty() {
            return;
        }
        let shader = &frame.env().shaders.gbuffer;
        frame.uniform(shader, "ViewProjMatrix", camera.view_projection);

        let pipeline = frame.pipeline();
        for unit in units {
            let visible = unit.instance_count > 0
                || camera.culler.is_aabb_visible(unit.aabb.min, unit.aabb.max);
            if !visible {
                frame.stats.units_culled += 1;
                continue;
            }
            match pipeline.material_of(unit) {
                Some(material) => self.draw_object(frame, shader, unit, material),
                None => debug_assert!(false, "render unit without a material"),
            }
        }
    }

    fn draw_object(
        &self,
        frame: &mut FrameContext<'_>,
        shader: &Shader,
        unit: &RenderUnit,
        material: &MaterialUnit,
    ) {
        let maps = [
            ("map_albedo", &material.albedo_map),
            ("map_specular", &material.specular_map),
            ("map_emissive", &material.emissive_map),
            ("map_normal", &material.normal_map),
            ("map_height", &material.height_map),
            ("map_transparency", &material.transparency_map),
        ];
        for (slot, (name, texture)) in maps.into_iter().enumerate() {
            frame.bind_sampler(shader, name, texture, slot as u32);
        }

        frame.uniform(shader, "material.specularFactor", material.specular_factor);
        frame.uniform(shader, "material.specularIntensity", material.specular_intensity);
        frame.uniform(shader, "material.emission", material.emission);
        frame.uniform(shader, "material.reflection", material.reflection);
        frame.uniform(shader, "displacement", material.displacement);

        let backend = &mut *frame.backend;
        backend.set_vertex_attribute(MODEL_MATRIX_LOCATION, VertexAttribute::Mat4(unit.model_matrix));
        backend.set_vertex_attribute(NORMAL_MATRIX_LOCATION, VertexAttribute::Mat3(unit.normal_matrix));
        backend.set_vertex_attribute(BASE_COLOR_LOCATION, VertexAttribute::Vec4(material.base_color));

        frame.draw(&unit.geometry, shader, unit.instance_count);
    }
}

impl Lane for GeometryPassLane {
    fn strategy_name(&self) -> &'static str {
        "DeferredGBuffer"
    }

    fn lane_kind(&self) -> LaneKind {
        LaneKind::Geometry
    }
}

impl RenderLane for GeometryPassLane {
    fn render(&self, frame: &mut FrameContext<'_>, camera: &CameraUnit) {
        frame.backend.set_blending(None);
        frame.backend.set_reversed_depth(camera.is_perspective);
        frame.attach_framebuffer(&camera.targets.gbuffer, camera.targets.size());

        let opaque = &frame.pipeline().opaque;
        log::trace!("GeometryPassLane: {} opaque units", opaque.len());
        self.draw_objects(frame, camera, opaque);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render_lane::{Environment, FrameStats, Pipeline};
    use umbra_core::{
        math::{Vec3, Vec4},
        renderer::{BufferUsage, PipelineSettings, RecordingBackend, RenderCommand, UniformValue},
        scene::{
            primitives, Camera, CameraTargets, Material, Projection, Skybox, SubMesh, Transform,
        },
    };

    fn scene(projection: Projection) -> (RecordingBackend, Environment, Pipeline, SubMesh) {
        let mut backend = RecordingBackend::new();
        let env = Environment::create(&mut backend, PipelineSettings::default()).unwrap();
        let mesh = SubMesh::new(&backend, primitives::cube(), BufferUsage::Static).unwrap();
        let targets = CameraTargets::create(&mut backend, 64, 64).unwrap();

        let mut pipeline = Pipeline::new();
        let camera = Camera::new(projection, targets);
        pipeline.submit_camera(&env, &camera, &Transform::IDENTITY, &Skybox::default());
        (backend, env, pipeline, mesh)
    }

    fn perspective() -> Projection {
        Projection::Perspective {
            fov_y: 1.0,
            aspect: 1.0,
            near: 0.1,
            far: 50.0,
        }
    }

    #[test]
    fn test_gbuffer_pass_binds_material() {
        let (mut backend, env, mut pipeline, mesh) = scene(perspective());
        let material = Material {
            base_color: Vec4::new(1.0, 0.0, 0.0, 1.0),
            specular_factor: 32.0,
            ..Default::default()
        };
        let transform = Transform::from_position(Vec3::new(0.0, 0.0, -4.0));
        pipeline.submit_primitive(&env, &mesh, &material, &transform, 0);
        backend.take_commands();

        let mut stats = FrameStats::default();
        let mut frame = FrameContext::new(&mut backend, &pipeline, &env, &mut stats);
        GeometryPassLane::new().render(&mut frame, &pipeline.cameras[0]);

        let commands = backend.commands();
        assert_eq!(commands[0], RenderCommand::Blending(None));
        assert_eq!(commands[1], RenderCommand::ReversedDepth(true));
        assert_eq!(
            commands[2],
            RenderCommand::BindFrameBuffer(pipeline.cameras[0].targets.gbuffer.id)
        );

        assert_eq!(backend.uniform_values("map_albedo"), vec![UniformValue::Int(0)]);
        assert_eq!(
            backend.uniform_values("map_transparency"),
            vec![UniformValue::Int(5)]
        );
        assert_eq!(
            backend.uniform_values("material.specularFactor"),
            vec![UniformValue::Float(32.0)]
        );
        assert!(commands.contains(&RenderCommand::VertexAttribute {
            location: MODEL_MATRIX_LOCATION,
            value: VertexAttribute::Mat4(transform.matrix()),
        }));
        assert!(commands.contains(&RenderCommand::VertexAttribute {
            location: BASE_COLOR_LOCATION,
            value: VertexAttribute::Vec4(material.base_color),
        }));
        assert_eq!(stats.geometry.draw_calls, 1);
        assert_eq!(stats.geometry.triangles_rendered, 12);
    }

    #[test]
    fn test_orthographic_camera_keeps_standard_depth() {
        let (mut backend, env, pipeline, _) = scene(Projection::Orthographic {
            size: 10.0,
            aspect: 1.0,
            near: 0.1,
            far: 50.0,
        });
        backend.take_commands();

        let mut stats = FrameStats::default();
        let mut frame = FrameContext::new(&mut backend, &pipeline, &env, &mut stats);
        GeometryPassLane::new().render(&mut frame, &pipeline.cameras[0]);

        assert_eq!(backend.commands()[1], RenderCommand::ReversedDepth(false));
        assert_eq!(backend.draw_count(), 0);
    }
}
