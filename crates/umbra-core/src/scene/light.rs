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

//! Defines light sources for the rendering system.
//!
//! Each light owns the depth texture its shadow map is rendered into and knows
//! how to build its own light-space matrices from the owning entity's position.
//! Directions always point from the light towards the scene.

use crate::math::{stable_up, Mat4, Quat, Vec3};
use crate::renderer::TextureHandle;

/// Near plane used by perspective shadow projections.
pub const SHADOW_NEAR_PLANE: f32 = 0.1;

/// The three color channels of a Phong-style light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightColor {
    /// Color added everywhere the light reaches, regardless of orientation.
    pub ambient: Vec3,
    /// Color scaled by the surface's facing ratio.
    pub diffuse: Vec3,
    /// Color of specular highlights.
    pub specular: Vec3,
}

impl Default for LightColor {
    fn default() -> Self {
        Self::from_color(Vec3::ONE, 1.0, 0.1)
    }
}

impl LightColor {
    /// Derives all three channels from one color.
    ///
    /// # Examples
    ///
    /// ```
    /// use umbra_core::math::Vec3;
    /// use umbra_core::scene::LightColor;
    /// let c = LightColor::from_color(Vec3::new(1.0, 0.5, 0.0), 2.0, 0.25);
    /// assert_eq!(c.diffuse, Vec3::new(2.0, 1.0, 0.0));
    /// assert_eq!(c.ambient, Vec3::new(0.25, 0.125, 0.0));
    /// ```
    pub fn from_color(color: Vec3, intensity: f32, ambient_intensity: f32) -> Self {
        Self {
            ambient: color * ambient_intensity,
            diffuse: color * intensity,
            specular: color * intensity,
        }
    }
}

/// A light infinitely far away, casting parallel rays (the sun).
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionalLight {
    /// Light colors.
    pub color: LightColor,
    /// Direction of the rays.
    pub direction: Vec3,
    /// Half extent of the orthographic shadow volume around the owning entity.
    pub projection_size: f32,
    /// 2D depth texture receiving the shadow map.
    pub depth_map: TextureHandle,
}

impl DirectionalLight {
    /// Light-space `projection * view` matrix centred on `center`.
    pub fn projection_matrix(&self, center: Vec3) -> Mat4 {
        let size = self.projection_size;
        let direction = self.direction.normalize_or_zero();
        let projection = Mat4::orthographic_rh_gl(-size, size, -size, size, -size, size);
        projection * Mat4::look_to_rh(center, direction, stable_up(direction))
    }
}

/// A light radiating in every direction from a point.
#[derive(Debug, Clone, PartialEq)]
pub struct PointLight {
    /// Light colors.
    pub color: LightColor,
    /// Radius of influence. Also the scale of the light-volume sphere.
    pub radius: f32,
    /// Far plane of the cube shadow map.
    pub far_distance: f32,
    /// Depth cube map receiving the shadow map.
    pub depth_map: TextureHandle,
}

/// Look direction and up vector of each cube-map face, in `+X, -X, +Y, -Y, +Z, -Z` order.
const CUBE_FACES: [(Vec3, Vec3); 6] = [
    (Vec3::X, Vec3::NEG_Y),
    (Vec3::NEG_X, Vec3::NEG_Y),
    (Vec3::Y, Vec3::Z),
    (Vec3::NEG_Y, Vec3::NEG_Z),
    (Vec3::Z, Vec3::NEG_Y),
    (Vec3::NEG_Z, Vec3::NEG_Y),
];

impl PointLight {
    /// The six `projection * view` matrices of the cube shadow map faces.
    pub fn projection_matrices(&self, position: Vec3) -> [Mat4; 6] {
        let projection = Mat4::perspective_rh_gl(
            std::f32::consts::FRAC_PI_2,
            1.0,
            SHADOW_NEAR_PLANE,
            self.far_distance,
        );
        CUBE_FACES.map(|(dir, up)| projection * Mat4::look_to_rh(position, dir, up))
    }

    /// Transform of the unit light-volume sphere.
    pub fn sphere_transform(&self, position: Vec3) -> Mat4 {
        Mat4::from_scale_rotation_translation(Vec3::splat(self.radius), Quat::IDENTITY, position)
    }
}

/// A cone of light, like a flashlight.
#[derive(Debug, Clone, PartialEq)]
pub struct SpotLight {
    /// Light colors.
    pub color: LightColor,
    /// Axis of the cone.
    pub direction: Vec3,
    /// Angle in radians from the axis where falloff begins.
    pub inner_angle: f32,
    /// Angle in radians from the axis where the light reaches zero.
    pub outer_angle: f32,
    /// Reach of the light along its axis. Also the shadow far plane.
    pub max_distance: f32,
    /// 2D depth texture receiving the shadow map.
    pub depth_map: TextureHandle,
}

impl SpotLight {
    /// Light-space `projection * view` matrix from `position`.
    pub fn projection_matrix(&self, position: Vec3) -> Mat4 {
        let direction = self.direction.normalize_or_zero();
        let projection = Mat4::perspective_rh_gl(
            self.outer_angle * 2.0,
            1.0,
            SHADOW_NEAR_PLANE,
            self.max_distance,
        );
        projection * Mat4::look_to_rh(position, direction, stable_up(direction))
    }

    /// Transform of the unit light-volume pyramid.
    ///
    /// The helper pyramid has its apex at the origin and its square base at
    /// `z = -1` spanning `[-1, 1]`; it is stretched to enclose the outer cone.
    pub fn pyramid_transform(&self, position: Vec3) -> Mat4 {
        let direction = self.direction.normalize_or_zero();
        let half_base = self.max_distance * self.outer_angle.tan();
        let rotation = Quat::from_rotation_arc(Vec3::NEG_Z, direction);
        Mat4::from_scale_rotation_translation(
            Vec3::new(half_base, half_base, self.max_distance),
            rotation,
            position,
        )
    }

    /// Cosine of the inner cone angle.
    #[inline]
    pub fn inner_cos(&self) -> f32 {
        self.inner_angle.cos()
    }

    /// Cosine of the outer cone angle.
    #[inline]
    pub fn outer_cos(&self) -> f32 {
        self.outer_angle.cos()
    }
}

/// A light source of any supported kind.
#[derive(Debug, Clone, PartialEq)]
pub enum LightType {
    /// See [`DirectionalLight`].
    Directional(DirectionalLight),
    /// See [`PointLight`].
    Point(PointLight),
    /// See [`SpotLight`].
    Spot(SpotLight),
}

impl From<DirectionalLight> for LightType {
    fn from(light: DirectionalLight) -> Self {
        LightType::Directional(light)
    }
}

impl From<PointLight> for LightType {
    fn from(light: PointLight) -> Self {
        LightType::Point(light)
    }
}

impl From<SpotLight> for LightType {
    fn from(light: SpotLight) -> Self {
        LightType::Spot(light)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{Vec4, EPSILON};
    use crate::renderer::{GraphicsDevice, RecordingBackend, TextureKind};
    use approx::assert_relative_eq;

    fn depth_map(kind: TextureKind) -> TextureHandle {
        RecordingBackend::new()
            .create_texture(kind, 64, 64, None)
            .unwrap()
    }

    fn ndc(m: &Mat4, p: Vec3) -> Vec3 {
        let clip = *m * Vec4::new(p.x, p.y, p.z, 1.0);
        clip.truncate() / clip.w
    }

    #[test]
    fn test_directional_light_keeps_center_in_view() {
        let light = DirectionalLight {
            color: LightColor::default(),
            direction: Vec3::new(0.3, -1.0, 0.2),
            projection_size: 50.0,
            depth_map: depth_map(TextureKind::Depth2d),
        };
        let center = Vec3::new(10.0, 0.0, -4.0);
        let p = ndc(&light.projection_matrix(center), center);
        assert_relative_eq!(p.x, 0.0, epsilon = EPSILON);
        assert_relative_eq!(p.y, 0.0, epsilon = EPSILON);
    }

    #[test]
    fn test_point_light_faces_look_along_axes() {
        let light = PointLight {
            color: LightColor::default(),
            radius: 5.0,
            far_distance: 100.0,
            depth_map: depth_map(TextureKind::DepthCubeMap),
        };
        let origin = Vec3::new(1.0, 2.0, 3.0);
        let matrices = light.projection_matrices(origin);
        for (matrix, (dir, _)) in matrices.iter().zip(CUBE_FACES) {
            let p = ndc(matrix, origin + dir * 10.0);
            assert_relative_eq!(p.x, 0.0, epsilon = EPSILON);
            assert_relative_eq!(p.y, 0.0, epsilon = EPSILON);
            assert!(p.z > -1.0 && p.z < 1.0);
        }
    }

    #[test]
    fn test_point_light_sphere_transform() {
        let light = PointLight {
            color: LightColor::default(),
            radius: 3.0,
            far_distance: 100.0,
            depth_map: depth_map(TextureKind::DepthCubeMap),
        };
        let m = light.sphere_transform(Vec3::new(0.0, 1.0, 0.0));
        let p = m.transform_point3(Vec3::X);
        assert_relative_eq!(p.x, 3.0);
        assert_relative_eq!(p.y, 1.0);
    }

    #[test]
    fn test_spot_light_cone() {
        let light = SpotLight {
            color: LightColor::default(),
            direction: Vec3::NEG_Y,
            inner_angle: 20f32.to_radians(),
            outer_angle: 30f32.to_radians(),
            max_distance: 10.0,
            depth_map: depth_map(TextureKind::Depth2d),
        };
        assert!(light.inner_cos() > light.outer_cos());
        assert_relative_eq!(light.outer_cos(), 30f32.to_radians().cos());

        let position = Vec3::new(0.0, 5.0, 0.0);
        let p = ndc(&light.projection_matrix(position), position + Vec3::NEG_Y * 4.0);
        assert_relative_eq!(p.x, 0.0, epsilon = EPSILON);
        assert_relative_eq!(p.y, 0.0, epsilon = EPSILON);

        // The pyramid's base centre sits at the end of the cone axis.
        let base = light.pyramid_transform(position).transform_point3(Vec3::NEG_Z);
        assert_relative_eq!(base.y, -5.0, epsilon = 1e-4);
    }
}
