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

//! Scene-side inputs handed to the render pipeline.
//!
//! These are the "raw" descriptions the scene layer owns: transforms,
//! materials, lights, cameras and mesh data. The pipeline snapshots them into
//! per-frame units on submission.

pub mod camera;
pub mod light;
pub mod material;
pub mod mesh;
pub mod primitives;
pub mod transform;

pub use camera::{Camera, CameraTargets, Projection, Skybox};
pub use light::{DirectionalLight, LightColor, LightType, PointLight, SpotLight};
pub use material::Material;
pub use mesh::{MeshData, SubMesh, Vertex};
pub use transform::Transform;
