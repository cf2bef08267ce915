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

//! Shadow pass lane implementation - renders depth from every light.

use umbra_core::{
    lane::{Lane, LaneKind},
    math::Mat4,
    renderer::{Shader, Texture, VertexAttribute},
};

use super::{FrameContext, LightUnit, ShadowLane};

/// Attribute location of the per-draw model matrix.
pub(crate) const MODEL_MATRIX_LOCATION: u32 = 5;
/// Attribute location of the per-draw normal matrix.
pub(crate) const NORMAL_MATRIX_LOCATION: u32 = 9;

/// A lane that fills one shadow map per light.
///
/// Directional and spot lights render into 2D depth textures with a single
/// light matrix. Point lights render all six faces of a depth cube map in one
/// layered pass, selecting the face matrix in the shader.
#[derive(Debug, Default)]
pub struct ShadowPassLane;

impl ShadowPassLane {
    /// Creates a new `ShadowPassLane`.
    pub fn new() -> Self {
        Self
    }

    fn render_2d(&self, frame: &mut FrameContext<'_>, depth_map: &Texture, projection: Mat4) {
        let shader = &frame.env().shaders.shadow_depth;
        frame.attach_depth_map(depth_map);
        frame.uniform(shader, "LightProjMatrix", projection);
        self.draw_casters(frame, shader, true);
    }

    fn draw_casters(&self, frame: &mut FrameContext<'_>, shader: &Shader, with_normals: bool) {
        let pipeline = frame.pipeline();
        for unit in &pipeline.shadow_casters {
            let Some(material) = pipeline.material_of(unit) else {
                debug_assert!(false, "shadow caster without a material");
                continue;
            };
            frame.uniform(shader, "displacement", material.displacement);
            frame.bind_sampler(shader, "map_height", &material.height_map, 0);
            frame
                .backend
                .set_vertex_attribute(MODEL_MATRIX_LOCATION, VertexAttribute::Mat4(unit.model_matrix));
            if with_normals {
                frame.backend.set_vertex_attribute(
                    NORMAL_MATRIX_LOCATION,
                    VertexAttribute::Mat3(unit.normal_matrix),
                );
            }
            frame.draw(&unit.geometry, shader, unit.instance_count);
        }
    }
}

impl Lane for ShadowPassLane {
    fn strategy_name(&self) -> &'static str {
        "ShadowPass"
    }

    fn lane_kind(&self) -> LaneKind {
        LaneKind::Shadow
    }
}

impl ShadowLane for ShadowPassLane {
    fn render_shadow_maps(&self, frame: &mut FrameContext<'_>) {
        let lighting = &frame.pipeline().lighting;
        log::debug!(
            "ShadowPassLane: {} shadow maps, {} casters",
            lighting.shadow_map_count(),
            frame.pipeline().shadow_casters.len()
        );

        frame.backend.set_reversed_depth(false);
        frame.toggle_depth_only_mode(true);

        for light in lighting.shadow_order() {
            match light {
                LightUnit::Directional(light) => {
                    self.render_2d(frame, &light.shadow_map, light.projection);
                }
                LightUnit::Spot(light) => {
                    self.render_2d(frame, &light.shadow_map, light.projection);
                }
                LightUnit::Point(light) => {
                    let shader = &frame.env().shaders.shadow_depth_cube;
                    frame.attach_depth_map(&light.shadow_map);
                    for (face, matrix) in light.projection_matrices.iter().enumerate() {
                        frame.uniform(shader, &format!("LightProjMatrix[{face}]"), *matrix);
                    }
                    frame.uniform(shader, "zFar", light.far_distance);
                    frame.uniform(shader, "lightPos", light.position);
                    self.draw_casters(frame, shader, false);
                }
            }
            frame.stats.shadow_maps += 1;
        }

        frame.toggle_depth_only_mode(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render_lane::{Environment, FrameStats, Pipeline};
    use umbra_core::{
        math::Vec3,
        renderer::{
            BufferUsage, GraphicsDevice, PipelineSettings, RecordingBackend, RenderCommand,
            TextureKind, UniformValue,
        },
        scene::{primitives, LightColor, Material, PointLight, SubMesh, Transform},
    };

    #[test]
    fn test_point_light_binds_six_face_matrices() {
        let mut backend = RecordingBackend::new();
        let env = Environment::create(&mut backend, PipelineSettings::default()).unwrap();
        let mesh = SubMesh::new(&backend, primitives::cube(), BufferUsage::Static).unwrap();

        let mut pipeline = Pipeline::new();
        pipeline.submit_primitive(&env, &mesh, &Material::default(), &Transform::IDENTITY, 0);
        let light = PointLight {
            color: LightColor::default(),
            radius: 5.0,
            far_distance: 25.0,
            depth_map: backend
                .create_texture(TextureKind::DepthCubeMap, 128, 128, None)
                .unwrap(),
        };
        pipeline.submit_point_light(&light, &Transform::from_position(Vec3::Y));
        backend.take_commands();

        let mut stats = FrameStats::default();
        let mut frame = FrameContext::new(&mut backend, &pipeline, &env, &mut stats);
        ShadowPassLane::new().render_shadow_maps(&mut frame);

        for face in 0..6 {
            let name = format!("LightProjMatrix[{face}]");
            assert_eq!(
                backend.uniform_values(&name),
                vec![UniformValue::Mat4(pipeline.lighting.point[0].projection_matrices[face])]
            );
        }
        assert_eq!(backend.uniform_values("zFar"), vec![UniformValue::Float(25.0)]);
        assert_eq!(stats.shadow_maps, 1);

        let commands = backend.commands();
        // Cube passes only pass the model matrix.
        assert!(!commands.iter().any(|c| matches!(
            c,
            RenderCommand::VertexAttribute {
                location: NORMAL_MATRIX_LOCATION,
                ..
            }
        )));
        assert_eq!(commands.first(), Some(&RenderCommand::ReversedDepth(false)));
        assert_eq!(commands[1], RenderCommand::ColorMask(false));
        assert_eq!(commands.last(), Some(&RenderCommand::ColorMask(true)));
    }
}
