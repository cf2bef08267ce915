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

//! Cameras, their off-screen render targets, and the skybox.

use crate::math::{Mat3, Mat4, Quat, Vec3};
use crate::renderer::{
    Attachment, FrameBufferHandle, RenderBackend, ResourceError, TextureHandle, TextureKind,
};

/// How a camera projects the scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    /// Perspective projection.
    Perspective {
        /// Vertical field of view in radians.
        fov_y: f32,
        /// Width over height.
        aspect: f32,
        /// Near plane distance.
        near: f32,
        /// Far plane distance.
        far: f32,
    },
    /// Orthographic projection.
    Orthographic {
        /// Half the visible height in world units.
        size: f32,
        /// Width over height.
        aspect: f32,
        /// Near plane distance.
        near: f32,
        /// Far plane distance.
        far: f32,
    },
}

impl Projection {
    /// The projection matrix, with OpenGL clip-space depth.
    pub fn matrix(&self) -> Mat4 {
        match *self {
            Projection::Perspective {
                fov_y,
                aspect,
                near,
                far,
            } => Mat4::perspective_rh_gl(fov_y, aspect, near, far),
            Projection::Orthographic {
                size,
                aspect,
                near,
                far,
            } => {
                let half_width = size * aspect;
                Mat4::orthographic_rh_gl(-half_width, half_width, -size, size, near, far)
            }
        }
    }

    /// Returns `true` for [`Projection::Perspective`].
    pub fn is_perspective(&self) -> bool {
        matches!(self, Projection::Perspective { .. })
    }
}

/// The off-screen targets a camera renders through.
///
/// The G-buffer framebuffer has albedo, normal and material on color
/// attachments 0 to 2 and depth on the depth attachment. The HDR texture
/// accumulates lighting and the output texture receives the tone-mapped image.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraTargets {
    /// Framebuffer with the four G-buffer channels attached.
    pub gbuffer: FrameBufferHandle,
    /// Albedo channel.
    pub albedo: TextureHandle,
    /// World-space normal channel.
    pub normal: TextureHandle,
    /// Material parameters channel.
    pub material: TextureHandle,
    /// Depth channel.
    pub depth: TextureHandle,
    /// High dynamic range lighting accumulation.
    pub hdr: TextureHandle,
    /// Final low dynamic range image.
    pub output: TextureHandle,
}

impl CameraTargets {
    /// Allocates every target at `width x height` and wires up the G-buffer.
    pub fn create(
        backend: &mut dyn RenderBackend,
        width: u32,
        height: u32,
    ) -> Result<Self, ResourceError> {
        let gbuffer = backend.create_framebuffer(Some("gbuffer"))?;
        let albedo = backend.create_texture(TextureKind::Color2d, width, height, Some("albedo"))?;
        let normal = backend.create_texture(TextureKind::Color2d, width, height, Some("normal"))?;
        let material =
            backend.create_texture(TextureKind::Color2d, width, height, Some("material"))?;
        let depth = backend.create_texture(TextureKind::Depth2d, width, height, Some("depth"))?;
        let hdr = backend.create_texture(TextureKind::Color2d, width, height, Some("hdr"))?;
        let output = backend.create_texture(TextureKind::Color2d, width, height, Some("output"))?;

        backend.attach_texture(&gbuffer, &albedo, Attachment::Color(0));
        backend.attach_texture(&gbuffer, &normal, Attachment::Color(1));
        backend.attach_texture(&gbuffer, &material, Attachment::Color(2));
        backend.attach_texture(&gbuffer, &depth, Attachment::Depth);

        Ok(Self {
            gbuffer,
            albedo,
            normal,
            material,
            depth,
            hdr,
            output,
        })
    }

    /// Size of the G-buffer in pixels.
    pub fn size(&self) -> (u32, u32) {
        self.albedo.size()
    }
}

/// A camera as authored on the scene side.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Projection parameters.
    pub projection: Projection,
    /// View direction.
    pub direction: Vec3,
    /// Up vector.
    pub up: Vec3,
    /// Off-screen targets.
    pub targets: CameraTargets,
    /// Number of bloom blur passes. Rounded down to an even count on submission.
    pub bloom_iterations: u32,
    /// Weight of the bloom texture when tone mapping.
    pub bloom_weight: f32,
    /// Exposure used when tone mapping.
    pub exposure: f32,
    /// Whether this camera renders this frame.
    pub is_rendered: bool,
}

impl Camera {
    /// Creates a rendering camera looking down `-Z` with default post-processing.
    pub fn new(projection: Projection, targets: CameraTargets) -> Self {
        Self {
            projection,
            direction: Vec3::NEG_Z,
            up: Vec3::Y,
            targets,
            bloom_iterations: 6,
            bloom_weight: 1.0,
            exposure: 1.0,
            is_rendered: true,
        }
    }

    /// World-to-view matrix for a camera placed at `position`.
    pub fn view_matrix(&self, position: Vec3) -> Mat4 {
        Mat4::look_to_rh(position, self.direction, self.up)
    }

    /// View matrix without translation, used to draw the skybox.
    pub fn static_view_matrix(&self) -> Mat4 {
        self.view_matrix(Vec3::ZERO)
    }
}

/// The environment cube drawn behind everything.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Skybox {
    /// Cube map. When absent the pipeline draws a black cube.
    pub texture: Option<TextureHandle>,
    /// Orientation of the cube.
    pub rotation: Quat,
}

impl Skybox {
    /// Inverse of the sky orientation seen by a camera rotated by
    /// `camera_rotation`. The cube's own rotation is applied on top of the
    /// camera's.
    pub fn inverse_rotation(&self, camera_rotation: Quat) -> Mat3 {
        Mat3::from_quat(camera_rotation * self.rotation).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::{RecordingBackend, RenderCommand};
    use approx::assert_relative_eq;

    #[test]
    fn test_targets_wire_gbuffer_attachments() {
        let mut backend = RecordingBackend::new();
        let targets = CameraTargets::create(&mut backend, 320, 200).unwrap();
        assert_eq!(targets.size(), (320, 200));
        assert_eq!(targets.depth.kind, TextureKind::Depth2d);

        let attachments: Vec<_> = backend
            .commands()
            .into_iter()
            .filter_map(|c| match c {
                RenderCommand::AttachTexture { attachment, .. } => Some(attachment),
                _ => None,
            })
            .collect();
        assert_eq!(
            attachments,
            vec![
                Attachment::Color(0),
                Attachment::Color(1),
                Attachment::Color(2),
                Attachment::Depth
            ]
        );
    }

    #[test]
    fn test_static_view_ignores_position() {
        let mut backend = RecordingBackend::new();
        let targets = CameraTargets::create(&mut backend, 8, 8).unwrap();
        let camera = Camera::new(
            Projection::Perspective {
                fov_y: 1.0,
                aspect: 1.0,
                near: 0.1,
                far: 100.0,
            },
            targets,
        );
        assert!(camera.projection.is_perspective());
        assert_eq!(camera.static_view_matrix(), camera.view_matrix(Vec3::ZERO));
        let moved = camera.view_matrix(Vec3::new(0.0, 0.0, 5.0));
        let p = moved.transform_point3(Vec3::ZERO);
        assert_relative_eq!(p.z, -5.0, epsilon = 1e-5);
    }

    #[test]
    fn test_skybox_inverse_rotation() {
        let skybox = Skybox {
            texture: None,
            rotation: Quat::from_rotation_y(0.7),
        };
        let product = skybox.inverse_rotation(Quat::IDENTITY) * Mat3::from_quat(skybox.rotation);
        assert!(product.abs_diff_eq(Mat3::IDENTITY, 1e-5));
    }

    #[test]
    fn test_skybox_inverse_rotation_follows_camera() {
        let roll = Quat::from_rotation_z(0.4);
        let inverse = Skybox::default().inverse_rotation(roll);
        assert!(inverse.abs_diff_eq(Mat3::from_quat(roll).transpose(), 1e-5));

        let tilted = Skybox {
            texture: None,
            rotation: Quat::from_rotation_y(1.1),
        };
        let orientation = Mat3::from_quat(roll) * Mat3::from_quat(tilted.rotation);
        let combined = tilted.inverse_rotation(roll) * orientation;
        assert!(combined.abs_diff_eq(Mat3::IDENTITY, 1e-5));
    }
}
