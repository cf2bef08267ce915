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

//! Surface description of a renderable object.

use crate::math::Vec4;
use crate::renderer::TextureHandle;

/// A material as authored on the scene side.
///
/// Every texture map is optional; the pipeline substitutes an engine default
/// for each missing map when the material is submitted.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Base color texture.
    pub albedo_map: Option<TextureHandle>,
    /// Specular mask texture.
    pub specular_map: Option<TextureHandle>,
    /// Emission mask texture.
    pub emissive_map: Option<TextureHandle>,
    /// Tangent-space normal map.
    pub normal_map: Option<TextureHandle>,
    /// Height map used for displacement.
    pub height_map: Option<TextureHandle>,
    /// Per-texel opacity.
    pub transparency_map: Option<TextureHandle>,

    /// Shininess exponent.
    pub specular_factor: f32,
    /// Strength of specular highlights.
    pub specular_intensity: f32,
    /// Emission strength.
    pub emission: f32,
    /// Environment reflection strength.
    pub reflection: f32,
    /// Height-map displacement amount, in object units.
    pub displacement: f32,
    /// Opacity in `[0, 1]`. Anything below `1.0` renders in the transparent queue.
    pub transparency: f32,
    /// Color multiplied with the albedo map.
    pub base_color: Vec4,
    /// Whether the object is drawn into shadow maps.
    pub casts_shadow: bool,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            albedo_map: None,
            specular_map: None,
            emissive_map: None,
            normal_map: None,
            height_map: None,
            transparency_map: None,
            specular_factor: 128.0,
            specular_intensity: 1.0,
            emission: 0.0,
            reflection: 0.0,
            displacement: 0.0,
            transparency: 1.0,
            base_color: Vec4::ONE,
            casts_shadow: true,
        }
    }
}

impl Material {
    /// Returns `true` if the material is not fully opaque.
    #[inline]
    pub fn is_transparent(&self) -> bool {
        self.transparency < 1.0
    }
}
