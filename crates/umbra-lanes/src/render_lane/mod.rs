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

//! Rendering lanes - the deferred pipeline, one stage per lane.
//!
//! A frame flows through the lanes in a fixed order: the [`ShadowLane`] runs
//! once, then every rendering camera goes through geometry, lighting and
//! post-processing ([`RenderLane`]s). Each lane reads the frame's [`Pipeline`]
//! and the process-wide [`Environment`] through a [`FrameContext`] and talks
//! to the GPU only through the backend trait.

mod context;
mod environment;
mod geometry_lane;
mod lighting_lane;
mod pipeline;
mod post_process_lane;
mod shadow_lane;
mod submission;

pub use context::*;
pub use environment::*;
pub use geometry_lane::*;
pub use lighting_lane::*;
pub use pipeline::*;
pub use post_process_lane::*;
pub use shadow_lane::*;

use umbra_core::lane::Lane;

/// A lane that renders one camera's view.
///
/// Implementations record GPU commands through the [`FrameContext`]; they
/// never own the backend and keep no per-frame state of their own.
pub trait RenderLane: Lane {
    /// Encodes this stage for `camera`.
    ///
    /// # Arguments
    ///
    /// * `frame`: Backend, per-frame pipeline, environment and statistics.
    /// * `camera`: The camera being rendered. Only cameras with
    ///   `render_to_texture` set are passed in.
    fn render(&self, frame: &mut FrameContext<'_>, camera: &CameraUnit);
}

/// A lane that fills the shadow maps of every light in the frame.
pub trait ShadowLane: Lane {
    /// Renders all shadow casters into each light's depth target.
    fn render_shadow_maps(&self, frame: &mut FrameContext<'_>);
}
