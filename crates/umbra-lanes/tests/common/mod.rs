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

//! Scene building helpers shared by the integration tests.

#![allow(dead_code)]

use umbra_core::{
    math::Vec3,
    renderer::{BufferUsage, PipelineSettings, RecordingBackend, RenderCommand, ShaderId},
    scene::{
        primitives, Camera, CameraTargets, DirectionalLight, LightColor, PointLight, Projection,
        SpotLight, SubMesh,
    },
};
use umbra_lanes::{RenderController, ShadowMapKind};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn controller(settings: PipelineSettings) -> RenderController<RecordingBackend> {
    init_logging();
    RenderController::new(RecordingBackend::new(), settings).unwrap()
}

pub fn cube(ctrl: &RenderController<RecordingBackend>) -> SubMesh {
    SubMesh::new(ctrl.backend(), primitives::cube(), BufferUsage::Static).unwrap()
}

/// A perspective camera looking down `-Z`.
pub fn camera(ctrl: &mut RenderController<RecordingBackend>) -> Camera {
    let targets = CameraTargets::create(ctrl.backend_mut(), 320, 180).unwrap();
    Camera::new(
        Projection::Perspective {
            fov_y: 60f32.to_radians(),
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 100.0,
        },
        targets,
    )
}

pub fn directional_light(ctrl: &RenderController<RecordingBackend>) -> DirectionalLight {
    DirectionalLight {
        color: LightColor::from_color(Vec3::ONE, 1.0, 0.1),
        direction: Vec3::new(-0.3, -1.0, -0.2),
        projection_size: 20.0,
        depth_map: ctrl.create_shadow_map(ShadowMapKind::Directional).unwrap(),
    }
}

pub fn spot_light(ctrl: &RenderController<RecordingBackend>) -> SpotLight {
    SpotLight {
        color: LightColor::from_color(Vec3::new(1.0, 0.9, 0.8), 2.0, 0.0),
        direction: Vec3::NEG_Y,
        inner_angle: 20f32.to_radians(),
        outer_angle: 30f32.to_radians(),
        max_distance: 15.0,
        depth_map: ctrl.create_shadow_map(ShadowMapKind::Spot).unwrap(),
    }
}

pub fn point_light(ctrl: &RenderController<RecordingBackend>) -> PointLight {
    PointLight {
        color: LightColor::from_color(Vec3::new(0.2, 0.4, 1.0), 1.0, 0.0),
        radius: 8.0,
        far_distance: 20.0,
        depth_map: ctrl.create_shadow_map(ShadowMapKind::Point).unwrap(),
    }
}

/// Indexed draws issued with `shader`.
pub fn draws_with(commands: &[RenderCommand], shader: ShaderId) -> Vec<RenderCommand> {
    commands
        .iter()
        .filter(|c| matches!(c, RenderCommand::DrawIndexed { shader: s, .. } if *s == shader))
        .cloned()
        .collect()
}
