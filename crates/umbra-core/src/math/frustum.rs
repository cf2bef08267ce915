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

//! View-frustum culling against axis-aligned boxes.

use super::{Mat4, Vec3, Vec4};

/// Six clip planes extracted from a view-projection matrix.
///
/// Planes are stored as `(normal, distance)` packed in a [`Vec4`], with normals
/// pointing into the frustum. Clip space follows the OpenGL convention with
/// depth in `[-1, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrustumCuller {
    planes: [Vec4; 6],
}

impl Default for FrustumCuller {
    /// A culler that accepts everything.
    fn default() -> Self {
        Self {
            planes: [Vec4::new(0.0, 0.0, 0.0, 1.0); 6],
        }
    }
}

impl FrustumCuller {
    /// Builds the culler from a combined `projection * view` matrix.
    pub fn from_view_projection(view_projection: &Mat4) -> Self {
        let r0 = view_projection.row(0);
        let r1 = view_projection.row(1);
        let r2 = view_projection.row(2);
        let r3 = view_projection.row(3);

        let planes = [r3 + r0, r3 - r0, r3 + r1, r3 - r1, r3 + r2, r3 - r2].map(|p| {
            let len = p.truncate().length();
            if len > 0.0 {
                p / len
            } else {
                p
            }
        });
        Self { planes }
    }

    /// Returns the normalized clip planes: left, right, bottom, top, near, far.
    pub fn planes(&self) -> &[Vec4; 6] {
        &self.planes
    }

    /// Tests a world-space box against the frustum.
    ///
    /// Uses the positive-vertex test: a box is rejected only when its corner
    /// farthest along a plane normal is still behind that plane. This never
    /// culls a visible box but may keep a few boxes near frustum corners.
    pub fn is_aabb_visible(&self, min: Vec3, max: Vec3) -> bool {
        self.planes.iter().all(|plane| {
            let normal = plane.truncate();
            let positive = Vec3::select(normal.cmpge(Vec3::ZERO), max, min);
            normal.dot(positive) + plane.w >= 0.0
        })
    }
}
