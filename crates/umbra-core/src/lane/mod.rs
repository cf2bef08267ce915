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

//! # Lane Abstraction
//!
//! A **Lane** is a named, swappable strategy for one stage of a frame. The
//! deferred pipeline is built from four of them (shadow, geometry, lighting
//! and post-process), sequenced by the render controller.
//!
//! Every lane shares this identity trait; the stage-specific execution method
//! lives on the render-lane trait in `umbra-lanes`, which extends [`Lane`].

use std::fmt;

/// Classification of lane types, used for logging and statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LaneKind {
    /// Depth-only rendering from the point of view of lights.
    Shadow,
    /// Opaque geometry into the G-buffer.
    Geometry,
    /// Light accumulation into the HDR target.
    Lighting,
    /// Bloom, skybox, debug overlay and tone mapping.
    PostProcess,
}

impl fmt::Display for LaneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LaneKind::Shadow => write!(f, "Shadow"),
            LaneKind::Geometry => write!(f, "Geometry"),
            LaneKind::Lighting => write!(f, "Lighting"),
            LaneKind::PostProcess => write!(f, "PostProcess"),
        }
    }
}

/// The base trait every lane implements.
pub trait Lane: Send + Sync {
    /// Human-readable name identifying this lane's strategy.
    ///
    /// Should be unique within a lane kind (e.g., `"CubeShadowMaps"`).
    fn strategy_name(&self) -> &'static str;

    /// The kind of processing this lane performs.
    fn lane_kind(&self) -> LaneKind;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NamedLane;

    impl Lane for NamedLane {
        fn strategy_name(&self) -> &'static str {
            "Named"
        }

        fn lane_kind(&self) -> LaneKind {
            LaneKind::PostProcess
        }
    }

    #[test]
    fn test_lane_kind_display() {
        assert_eq!(LaneKind::Shadow.to_string(), "Shadow");
        assert_eq!(LaneKind::PostProcess.to_string(), "PostProcess");
    }

    #[test]
    fn test_lane_is_object_safe() {
        let lanes: Vec<Box<dyn Lane>> = vec![Box::new(NamedLane)];
        assert_eq!(lanes[0].strategy_name(), "Named");
        assert_eq!(lanes[0].lane_kind(), LaneKind::PostProcess);
    }
}
