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

//! Math types and helpers used by the render pipeline.
//!
//! Vector, matrix and quaternion types come from `glam`; this module adds the
//! bounding volumes and projection helpers the pipeline needs on top of them.

pub mod frustum;
pub mod geometry;

pub use frustum::FrustumCuller;
pub use geometry::Aabb;
pub use glam::{Mat3, Mat4, Quat, Vec2, Vec3, Vec4};

/// Tolerance used for floating-point comparisons across the crate.
pub const EPSILON: f32 = 1e-5;

/// Returns the matrix mapping clip space `[-1, 1]` into texture space `[0, 1]`.
///
/// Pre-multiplying a light projection by this matrix produces the "biased"
/// transform shaders use to sample shadow maps directly.
///
/// # Examples
///
/// ```
/// use umbra_core::math::{make_bias_matrix, Vec3};
/// let bias = make_bias_matrix();
/// assert_eq!(bias.transform_point3(Vec3::splat(-1.0)), Vec3::ZERO);
/// assert_eq!(bias.transform_point3(Vec3::ONE), Vec3::ONE);
/// ```
pub fn make_bias_matrix() -> Mat4 {
    Mat4::from_translation(Vec3::splat(0.5)) * Mat4::from_scale(Vec3::splat(0.5))
}

/// Picks an up vector that is never parallel to `direction`.
#[inline]
pub fn stable_up(direction: Vec3) -> Vec3 {
    if direction.normalize_or_zero().y.abs() > 0.99 {
        Vec3::Z
    } else {
        Vec3::Y
    }
}

/// Average of the three components of a scale vector.
#[inline]
pub fn average_scale(scale: Vec3) -> f32 {
    scale.dot(Vec3::splat(1.0 / 3.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_bias_matrix_maps_clip_to_texture_space() {
        let bias = make_bias_matrix();
        let p = bias.transform_point3(Vec3::new(0.0, -1.0, 1.0));
        assert_relative_eq!(p.x, 0.5);
        assert_relative_eq!(p.y, 0.0);
        assert_relative_eq!(p.z, 1.0);
    }

    #[test]
    fn test_stable_up_avoids_parallel_direction() {
        assert_eq!(stable_up(Vec3::NEG_Y), Vec3::Z);
        assert_eq!(stable_up(Vec3::new(1.0, -1.0, 0.0)), Vec3::Y);
    }

    #[test]
    fn test_average_scale() {
        assert_relative_eq!(average_scale(Vec3::new(1.0, 2.0, 3.0)), 2.0, epsilon = EPSILON);
        assert_relative_eq!(average_scale(Vec3::ONE), 1.0, epsilon = EPSILON);
    }
}
