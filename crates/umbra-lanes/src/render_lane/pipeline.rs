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

//! Defines the per-frame `Pipeline` and the units it accumulates.
//!
//! The `Pipeline` is rebuilt every frame: the scene layer calls
//! [`Pipeline::reset`], then submits lights, cameras and primitives, and the
//! lanes consume the result. Every unit is a snapshot, so editing a scene
//! object after submission never changes the frame in flight.

use bytemuck::{Pod, Zeroable};
use umbra_core::{
    math::{Aabb, FrustumCuller, Mat3, Mat4, Vec3, Vec4},
    renderer::{GeometryHandle, TextureHandle},
    scene::{CameraTargets, LightColor},
};

/// One drawable mesh instance.
#[derive(Debug, Clone)]
pub struct RenderUnit {
    /// Geometry to draw.
    pub geometry: GeometryHandle,
    /// Index into [`Pipeline::materials`].
    pub material_index: usize,
    /// Object-to-world transform.
    pub model_matrix: Mat4,
    /// Inverse-transpose of the model matrix's 3x3 block.
    pub normal_matrix: Mat3,
    /// World-space bounds used for frustum culling.
    pub aabb: Aabb,
    /// Instances to draw. Non-zero counts bypass frustum culling.
    pub instance_count: u32,
}

/// A material snapshot with every texture resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialUnit {
    /// Base color texture.
    pub albedo_map: TextureHandle,
    /// Specular mask texture.
    pub specular_map: TextureHandle,
    /// Emission mask texture.
    pub emissive_map: TextureHandle,
    /// Tangent-space normal map.
    pub normal_map: TextureHandle,
    /// Height map.
    pub height_map: TextureHandle,
    /// Opacity map.
    pub transparency_map: TextureHandle,
    /// Shininess exponent.
    pub specular_factor: f32,
    /// Strength of specular highlights.
    pub specular_intensity: f32,
    /// Emission strength.
    pub emission: f32,
    /// Environment reflection strength.
    pub reflection: f32,
    /// Displacement, already scaled by the object's average scale.
    pub displacement: f32,
    /// Opacity.
    pub transparency: f32,
    /// Color multiplied with the albedo map.
    pub base_color: Vec4,
}

/// A directional light snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionalLightUnit {
    /// Light colors.
    pub color: LightColor,
    /// Direction of the rays.
    pub direction: Vec3,
    /// Depth target of the shadow map.
    pub shadow_map: TextureHandle,
    /// Light-space `projection * view`.
    pub projection: Mat4,
    /// `bias * projection`, mapping straight into shadow-map texture space.
    pub biased_projection: Mat4,
}

/// A shadow-casting point light snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct PointLightUnit {
    /// Light colors.
    pub color: LightColor,
    /// World position.
    pub position: Vec3,
    /// Radius of influence.
    pub radius: f32,
    /// Far plane of the cube shadow map.
    pub far_distance: f32,
    /// Depth cube target of the shadow map.
    pub shadow_map: TextureHandle,
    /// Transform of the light-volume sphere.
    pub sphere_transform: Mat4,
    /// One `projection * view` per cube face, `+X, -X, +Y, -Y, +Z, -Z`.
    pub projection_matrices: [Mat4; 6],
}

/// A spot light snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct SpotLightUnit {
    /// Light colors.
    pub color: LightColor,
    /// World position.
    pub position: Vec3,
    /// Cone axis.
    pub direction: Vec3,
    /// Light-space `projection * view`.
    pub projection: Mat4,
    /// `bias * projection`.
    pub biased_projection: Mat4,
    /// Transform of the light-volume pyramid.
    pub pyramid_transform: Mat4,
    /// Cosine of the inner cone angle.
    pub inner_cos: f32,
    /// Cosine of the outer cone angle.
    pub outer_cos: f32,
    /// Depth target of the shadow map.
    pub shadow_map: TextureHandle,
}

/// A shadowless point light drawn in a single instanced call.
///
/// The layout matches the instance buffer read by the instanced light shader.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PointLightInstance {
    /// Transform of the light-volume sphere.
    pub transform: Mat4,
    /// World position.
    pub position: Vec3,
    /// Radius of influence.
    pub radius: f32,
    /// Light color multiplied by intensity.
    pub color: Vec3,
    /// Fraction of `color` applied as ambient light.
    pub ambient_intensity: f32,
}

impl PointLightInstance {
    /// Builds an instance and its sphere transform.
    pub fn new(position: Vec3, radius: f32, color: Vec3, ambient_intensity: f32) -> Self {
        Self {
            transform: Mat4::from_translation(position) * Mat4::from_scale(Vec3::splat(radius)),
            position,
            radius,
            color,
            ambient_intensity,
        }
    }
}

/// A borrowed light of any kind.
#[derive(Debug, Clone, Copy)]
pub enum LightUnit<'a> {
    /// A directional light.
    Directional(&'a DirectionalLightUnit),
    /// A spot light.
    Spot(&'a SpotLightUnit),
    /// A point light.
    Point(&'a PointLightUnit),
}

/// All lights submitted this frame.
#[derive(Debug, Default)]
pub struct Lighting {
    /// Directional lights.
    pub directional: Vec<DirectionalLightUnit>,
    /// Shadow-casting point lights.
    pub point: Vec<PointLightUnit>,
    /// Spot lights.
    pub spot: Vec<SpotLightUnit>,
    /// Shadowless point lights.
    pub point_instances: Vec<PointLightInstance>,
}

impl Lighting {
    /// Shadow-casting lights in shadow-pass order: directional, then spot, then point.
    pub fn shadow_order(&self) -> impl Iterator<Item = LightUnit<'_>> {
        self.directional
            .iter()
            .map(LightUnit::Directional)
            .chain(self.spot.iter().map(LightUnit::Spot))
            .chain(self.point.iter().map(LightUnit::Point))
    }

    /// Number of lights with a shadow map.
    pub fn shadow_map_count(&self) -> usize {
        self.directional.len() + self.spot.len() + self.point.len()
    }

    fn clear(&mut self) {
        self.directional.clear();
        self.point.clear();
        self.spot.clear();
        self.point_instances.clear();
    }
}

/// A camera snapshot with every matrix the lanes need precomputed.
#[derive(Debug, Clone)]
pub struct CameraUnit {
    /// World position.
    pub position: Vec3,
    /// World-to-view.
    pub view_matrix: Mat4,
    /// View rotation only, for the skybox.
    pub static_view_matrix: Mat4,
    /// View-to-clip.
    pub projection_matrix: Mat4,
    /// `projection * view`.
    pub view_projection: Mat4,
    /// Inverse of `view_matrix`.
    pub inverse_view: Mat4,
    /// Inverse of `projection_matrix`.
    pub inverse_projection: Mat4,
    /// Frustum built from `view_projection`.
    pub culler: FrustumCuller,
    /// Whether the projection is perspective. Perspective cameras use reversed depth.
    pub is_perspective: bool,
    /// Off-screen targets.
    pub targets: CameraTargets,
    /// Skybox cube map, never absent.
    pub skybox_texture: TextureHandle,
    /// Inverse of the camera rotation combined with the skybox rotation.
    pub inverse_skybox_rotation: Mat3,
    /// Tone-mapping exposure.
    pub exposure: f32,
    /// Even number of bloom blur passes.
    pub bloom_iterations: u32,
    /// Weight of the bloom texture when tone mapping.
    pub bloom_weight: f32,
    /// Whether the camera renders this frame.
    pub render_to_texture: bool,
}

/// The per-frame accumulator consumed by every lane.
#[derive(Debug, Default)]
pub struct Pipeline {
    /// Opaque units, drawn into the G-buffer.
    pub opaque: Vec<RenderUnit>,
    /// Transparent units. Collected but not drawn yet.
    pub transparent: Vec<RenderUnit>,
    /// Copies of the opaque units drawn into shadow maps.
    pub shadow_casters: Vec<RenderUnit>,
    /// Materials, indexed by [`RenderUnit::material_index`].
    pub materials: Vec<MaterialUnit>,
    /// Lights.
    pub lighting: Lighting,
    /// Cameras, in submission order.
    pub cameras: Vec<CameraUnit>,
}

impl Pipeline {
    /// Creates a new, empty `Pipeline`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears every collection, preparing the pipeline for the next frame.
    pub fn reset(&mut self) {
        self.opaque.clear();
        self.transparent.clear();
        self.shadow_casters.clear();
        self.materials.clear();
        self.lighting.clear();
        self.cameras.clear();
    }

    /// Returns `true` if nothing has been submitted since the last reset.
    pub fn is_empty(&self) -> bool {
        self.opaque.is_empty()
            && self.transparent.is_empty()
            && self.materials.is_empty()
            && self.lighting.shadow_map_count() == 0
            && self.lighting.point_instances.is_empty()
            && self.cameras.is_empty()
    }

    /// Material of `unit`, if its index is in range.
    pub fn material_of(&self, unit: &RenderUnit) -> Option<&MaterialUnit> {
        self.materials.get(unit.material_index)
    }
}
