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

//! Provides the public, backend-agnostic rendering contracts.
//!
//! This module defines the "common language" for every rendering operation:
//! opaque resource handles, the [`GraphicsDevice`] and [`RenderBackend`]
//! traits, the pipeline settings and the error types. A concrete graphics
//! backend implements the traits; the lanes only ever talk to them.

pub mod error;
pub mod handles;
pub mod recording;
pub mod settings;
pub mod state;
pub mod traits;

pub use self::error::ResourceError;
pub use self::handles::*;
pub use self::recording::{RecordingBackend, RenderCommand};
pub use self::settings::{PipelineSettings, SettingsError};
pub use self::state::*;
pub use self::traits::{GraphicsDevice, RenderBackend};
