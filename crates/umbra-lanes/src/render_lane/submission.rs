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

//! Scene-facing submissions into the per-frame [`Pipeline`].
//!
//! Every submission is infallible and amortized O(1): it snapshots the scene
//! object into a unit, substituting environment defaults for anything missing.

use umbra_core::{
    math::{average_scale, make_bias_matrix, FrustumCuller},
    renderer::TextureHandle,
    scene::{
        Camera, DirectionalLight, LightType, Material, PointLight, Skybox, SpotLight, SubMesh,
        Transform,
    },
};

use super::{
    CameraUnit, DirectionalLightUnit, Environment, MaterialUnit, Pipeline, PointLightInstance,
    PointLightUnit, RenderUnit, SpotLightUnit,
};

impl Pipeline {
    /// Submits a light of any kind owned by an entity at `transform`.
    pub fn submit_light(&mut self, light: &LightType, transform: &Transform) {
        match light {
            LightType::Directional(light) => self.submit_directional_light(light, transform),
            LightType::Point(light) => self.submit_point_light(light, transform),
            LightType::Spot(light) => self.submit_spot_light(light, transform),
        }
    }

    /// Submits a directional light; its shadow volume is centred on the entity.
    pub fn submit_directional_light(&mut self, light: &DirectionalLight, transform: &Transform) {
        let projection = light.projection_matrix(transform.position);
        self.lighting.directional.push(DirectionalLightUnit {
            color: light.color,
            direction: light.direction,
            shadow_map: light.depth_map.clone(),
            projection,
            biased_projection: make_bias_matrix() * projection,
        });
    }

    /// Submits a shadow-casting point light.
    pub fn submit_point_light(&mut self, light: &PointLight, transform: &Transform) {
        let position = transform.position;
        self.lighting.point.push(PointLightUnit {
            color: light.color,
            position,
            radius: light.radius,
            far_distance: light.far_distance,
            shadow_map: light.depth_map.clone(),
            sphere_transform: light.sphere_transform(position),
            projection_matrices: light.projection_matrices(position),
        });
    }

    /// Submits a spot light.
    pub fn submit_spot_light(&mut self, light: &SpotLight, transform: &Transform) {
        let position = transform.position;
        let projection = light.projection_matrix(position);
        self.lighting.spot.push(SpotLightUnit {
            color: light.color,
            position,
            direction: light.direction,
            projection,
            biased_projection: make_bias_matrix() * projection,
            pyramid_transform: light.pyramid_transform(position),
            inner_cos: light.inner_cos(),
            outer_cos: light.outer_cos(),
            shadow_map: light.depth_map.clone(),
        });
    }

    /// Submits a shadowless point light for the instanced light pass.
    pub fn submit_point_light_instance(&mut self, instance: PointLightInstance) {
        self.lighting.point_instances.push(instance);
    }

    /// Submits a camera placed at `transform`.
    ///
    /// A skybox without a texture is replaced by the environment's black cube
    /// map, and an odd bloom iteration count is rounded down to an even one.
    pub fn submit_camera(
        &mut self,
        env: &Environment,
        camera: &Camera,
        transform: &Transform,
        skybox: &Skybox,
    ) {
        let position = transform.position;
        let view_matrix = camera.view_matrix(position);
        let projection_matrix = camera.projection.matrix();
        let view_projection = projection_matrix * view_matrix;

        if camera.bloom_iterations % 2 != 0 {
            log::debug!(
                "Pipeline: rounding {} bloom iterations down to an even count",
                camera.bloom_iterations
            );
        }

        self.cameras.push(CameraUnit {
            position,
            view_matrix,
            static_view_matrix: camera.static_view_matrix(),
            projection_matrix,
            view_projection,
            inverse_view: view_matrix.inverse(),
            inverse_projection: projection_matrix.inverse(),
            culler: FrustumCuller::from_view_projection(&view_projection),
            is_perspective: camera.projection.is_perspective(),
            targets: camera.targets.clone(),
            skybox_texture: skybox
                .texture
                .clone()
                .unwrap_or_else(|| env.defaults.black_cube_map.clone()),
            inverse_skybox_rotation: skybox.inverse_rotation(transform.rotation),
            exposure: camera.exposure,
            bloom_iterations: camera.bloom_iterations & !1,
            bloom_weight: camera.bloom_weight,
            render_to_texture: camera.is_rendered,
        });
    }

    /// Submits one sub-mesh of an object at `parent` drawn with `material`.
    ///
    /// Transparent materials (`transparency < 1.0`) go to the transparent
    /// queue and never cast shadows. Opaque units are also copied into the
    /// shadow casters when the material casts shadows.
    pub fn submit_primitive(
        &mut self,
        env: &Environment,
        sub_mesh: &SubMesh,
        material: &Material,
        parent: &Transform,
        instance_count: u32,
    ) {
        let model_matrix = parent.matrix() * sub_mesh.transform.matrix();
        let normal_matrix = parent.normal_matrix() * sub_mesh.transform.normal_matrix();
        let scale = parent.scale * sub_mesh.transform.scale;

        let material_index = self.materials.len();
        self.materials.push(resolve_material(env, material, average_scale(scale)));

        let unit = RenderUnit {
            geometry: sub_mesh.geometry().clone(),
            material_index,
            model_matrix,
            normal_matrix,
            aabb: sub_mesh.data().bounding_box().transform(&model_matrix),
            instance_count,
        };

        if material.is_transparent() {
            self.transparent.push(unit);
        } else {
            if material.casts_shadow {
                self.shadow_casters.push(unit.clone());
            }
            self.opaque.push(unit);
        }
    }
}

fn resolve_material(env: &Environment, material: &Material, scale: f32) -> MaterialUnit {
    let defaults = &env.defaults;
    let or_material_map = |map: &Option<TextureHandle>| {
        map.clone()
            .unwrap_or_else(|| defaults.material_map.clone())
    };
    MaterialUnit {
        albedo_map: or_material_map(&material.albedo_map),
        specular_map: or_material_map(&material.specular_map),
        emissive_map: or_material_map(&material.emissive_map),
        transparency_map: or_material_map(&material.transparency_map),
        normal_map: material
            .normal_map
            .clone()
            .unwrap_or_else(|| defaults.normal_map.clone()),
        height_map: material
            .height_map
            .clone()
            .unwrap_or_else(|| defaults.black_map.clone()),
        specular_factor: material.specular_factor,
        specular_intensity: material.specular_intensity,
        emission: material.emission,
        reflection: material.reflection,
        displacement: material.displacement * scale,
        transparency: material.transparency,
        base_color: material.base_color,
    }
}
