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

//! Renders a few frames of a small scene on the recording backend and logs
//! what the pipeline did.
//!
//! Usage: `headless_frame [settings.ron]`

use std::env;

use anyhow::{Context, Result};
use glam::{Quat, Vec3};
use umbra_core::{
    renderer::{BufferUsage, PipelineSettings, RecordingBackend},
    scene::{
        primitives, Camera, CameraTargets, DirectionalLight, LightColor, Material, PointLight,
        Projection, Skybox, SpotLight, SubMesh, Transform,
    },
};
use umbra_lanes::{PointLightInstance, RenderController, ShadowMapKind};

const FRAMES: u32 = 3;

fn load_settings() -> Result<PipelineSettings> {
    match env::args().nth(1) {
        Some(path) => PipelineSettings::load(&path)
            .with_context(|| format!("failed to load pipeline settings from '{path}'")),
        None => Ok(PipelineSettings::default()),
    }
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();

    let settings = load_settings()?;
    let (width, height) = (settings.viewport_width, settings.viewport_height);
    let mut controller = RenderController::new(RecordingBackend::new(), settings)
        .context("failed to create render environment")?;

    let device = controller.backend();
    let ground = SubMesh::new(device, primitives::cube(), BufferUsage::Static)?;
    let sphere = SubMesh::new(device, primitives::uv_sphere(16, 32), BufferUsage::Static)?;

    let sun = DirectionalLight {
        color: LightColor::from_color(Vec3::new(1.0, 0.95, 0.9), 1.0, 0.15),
        direction: Vec3::new(-0.4, -1.0, -0.3),
        projection_size: 30.0,
        depth_map: controller.create_shadow_map(ShadowMapKind::Directional)?,
    };
    let mut spot = SpotLight {
        color: LightColor::from_color(Vec3::new(1.0, 0.8, 0.6), 3.0, 0.0),
        direction: Vec3::NEG_Y,
        inner_angle: 25f32.to_radians(),
        outer_angle: 35f32.to_radians(),
        max_distance: 12.0,
        depth_map: controller.create_shadow_map(ShadowMapKind::Spot)?,
    };
    let lamp = PointLight {
        color: LightColor::from_color(Vec3::new(0.3, 0.5, 1.0), 2.0, 0.0),
        radius: 6.0,
        far_distance: 15.0,
        depth_map: controller.create_shadow_map(ShadowMapKind::Point)?,
    };

    let targets = CameraTargets::create(controller.backend_mut(), width, height)?;
    let camera = Camera::new(
        Projection::Perspective {
            fov_y: 60f32.to_radians(),
            aspect: width as f32 / height as f32,
            near: 0.1,
            far: 200.0,
        },
        targets,
    );
    let camera_transform = Transform::from_position(Vec3::new(0.0, 2.0, 8.0));
    let skybox = Skybox::default();

    let floor = Transform::from_position(Vec3::new(0.0, -1.0, 0.0))
        .with_scale(Vec3::new(20.0, 0.1, 20.0));
    let ball_material = Material {
        specular_factor: 64.0,
        ..Default::default()
    };

    for frame in 0..FRAMES {
        let angle = frame as f32 * 0.3;
        spot.direction = Quat::from_rotation_z(angle) * Vec3::NEG_Y;

        controller.reset_pipeline();
        controller.submit_camera(&camera, &camera_transform, &skybox);
        controller.submit_light(&sun.clone().into(), &Transform::IDENTITY);
        controller.submit_light(
            &spot.clone().into(),
            &Transform::from_position(Vec3::new(0.0, 6.0, 0.0)),
        );
        controller.submit_light(
            &lamp.clone().into(),
            &Transform::from_position(Vec3::new(3.0, 1.0, 0.0)),
        );
        for i in 0..8 {
            let x = i as f32 * 2.0 - 7.0;
            controller.submit_point_light_instance(PointLightInstance::new(
                Vec3::new(x, 0.5, -4.0),
                2.5,
                Vec3::new(1.0, 0.4, 0.2),
                0.02,
            ));
        }
        controller.submit_primitive(&ground, &Material::default(), &floor, 0);
        controller.submit_primitive(&sphere, &ball_material, &Transform::IDENTITY, 0);
        controller.submit_primitive(
            &sphere,
            &ball_material,
            &Transform::from_position(Vec3::new(0.0, 0.0, 50.0)),
            0,
        );

        controller.start_pipeline();
        controller.end_pipeline();
        controller.render();

        let commands = controller.backend_mut().take_commands();
        log::info!(
            "frame {frame}: {} ({} commands recorded)",
            controller.frame_statistics(),
            commands.len()
        );
    }

    Ok(())
}
