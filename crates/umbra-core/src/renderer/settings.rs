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

//! Serializable settings consumed by the deferred pipeline.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::math::Vec3;

/// Errors raised while loading or saving [`PipelineSettings`].
#[derive(thiserror::Error, Debug)]
pub enum SettingsError {
    /// The settings file could not be read or written.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The settings text is not valid RON for [`PipelineSettings`].
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// The settings could not be turned into RON.
    #[error("Serialization error: {0}")]
    Serialize(#[from] ron::Error),
}

/// Frame-wide configuration of the deferred pipeline.
///
/// Any field missing from a settings file takes its default value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Width of the window's default framebuffer in pixels.
    pub viewport_width: u32,
    /// Height of the window's default framebuffer in pixels.
    pub viewport_height: u32,
    /// Color that distant geometry and the skybox fade into.
    pub fog_color: Vec3,
    /// Distance at which fog starts to affect shading.
    pub fog_distance: f32,
    /// Fog density factor.
    pub fog_density: f32,
    /// Percentage-closer filtering radius, in texels, used when sampling shadow maps.
    pub shadow_blur_iterations: i32,
    /// Index of the camera presented to the default framebuffer.
    pub main_camera_index: usize,
    /// Whether the main camera's output is blitted to the default framebuffer.
    pub render_to_default_framebuffer: bool,
    /// Draw debug lines on top of everything instead of depth-testing them.
    pub overlay_debug_draws: bool,
    /// Anisotropic filtering level applied to all samplers.
    pub anisotropic_filtering: f32,
    /// Side length of directional-light shadow maps.
    pub directional_shadow_size: u32,
    /// Side length of spot-light shadow maps.
    pub spot_shadow_size: u32,
    /// Side length of each face of point-light shadow cube maps.
    pub point_shadow_size: u32,
    /// Initial number of shadowless point lights the instance buffer holds.
    /// The buffer grows when a frame submits more.
    pub point_light_instance_capacity: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            viewport_width: 1280,
            viewport_height: 720,
            fog_color: Vec3::new(0.5, 0.6, 0.7),
            fog_distance: 1.0,
            fog_density: 0.001,
            shadow_blur_iterations: 1,
            main_camera_index: 0,
            render_to_default_framebuffer: true,
            overlay_debug_draws: false,
            anisotropic_filtering: 4.0,
            directional_shadow_size: 4096,
            spot_shadow_size: 512,
            point_shadow_size: 512,
            point_light_instance_capacity: 1024,
        }
    }
}

impl PipelineSettings {
    /// Parses settings from RON text.
    pub fn from_ron_str(text: &str) -> Result<Self, SettingsError> {
        Ok(ron::from_str(text)?)
    }

    /// Reads settings from a RON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_ron_str(&text)
    }

    /// Serializes the settings as pretty-printed RON.
    pub fn to_ron_string(&self) -> Result<String, SettingsError> {
        let pretty = ron::ser::PrettyConfig::default().indentor("  ".to_string());
        Ok(ron::ser::to_string_pretty(self, pretty)?)
    }

    /// Writes the settings to a RON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        std::fs::write(path, self.to_ron_string()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_take_defaults() {
        let settings = PipelineSettings::from_ron_str(
            "(viewport_width: 640, main_camera_index: 2, render_to_default_framebuffer: false)",
        )
        .unwrap();
        assert_eq!(settings.viewport_width, 640);
        assert_eq!(settings.main_camera_index, 2);
        assert!(!settings.render_to_default_framebuffer);
        assert_eq!(settings.viewport_height, PipelineSettings::default().viewport_height);
        assert_eq!(settings.shadow_blur_iterations, 1);
    }

    #[test]
    fn test_round_trip_through_text() {
        let settings = PipelineSettings {
            fog_density: 0.25,
            overlay_debug_draws: true,
            ..Default::default()
        };
        let text = settings.to_ron_string().unwrap();
        assert_eq!(PipelineSettings::from_ron_str(&text).unwrap(), settings);
    }

    #[test]
    fn test_invalid_text_is_a_parse_error() {
        let err = PipelineSettings::from_ron_str("(viewport_width: \"wide\")").unwrap_err();
        assert!(matches!(err, SettingsError::Parse(_)));
        assert!(err.to_string().starts_with("Parse error"));
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let err = PipelineSettings::load("/nonexistent/umbra/settings.ron").unwrap_err();
        assert!(matches!(err, SettingsError::Io(_)));
    }
}
