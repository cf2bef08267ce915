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

//! Plain-data descriptors for backend state: attachments, blending, culling,
//! uniform values and vertex layouts.

use crate::math::{Mat3, Mat4, Vec2, Vec3, Vec4};

/// A framebuffer attachment point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attachment {
    /// Color attachment `n`.
    Color(u32),
    /// The depth attachment.
    Depth,
}

/// Which faces the rasterizer discards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CullMode {
    /// Culling disabled.
    None,
    /// Discard front faces. Light volumes use this so they still shade when
    /// the camera is inside them.
    Front,
    /// Discard back faces.
    #[default]
    Back,
}

/// A blend factor applied to the source or destination color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    /// `0`
    Zero,
    /// `1`
    One,
    /// Source alpha.
    SrcAlpha,
    /// `1 - source alpha`.
    OneMinusSrcAlpha,
}

/// Source and destination blend factors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlendState {
    /// Factor applied to the incoming fragment.
    pub src: BlendFactor,
    /// Factor applied to the value already in the target.
    pub dst: BlendFactor,
}

impl BlendState {
    /// Classic alpha blending.
    pub const ALPHA: Self = Self {
        src: BlendFactor::SrcAlpha,
        dst: BlendFactor::OneMinusSrcAlpha,
    };

    /// Additive blending weighted by the light pass output alpha.
    pub const LIGHT_ACCUMULATE: Self = Self {
        src: BlendFactor::SrcAlpha,
        dst: BlendFactor::SrcAlpha,
    };
}

/// A value written to a named shader uniform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    /// Integer, also used for sampler slots.
    Int(i32),
    /// Scalar float.
    Float(f32),
    /// Two-component vector.
    Vec2(Vec2),
    /// Three-component vector.
    Vec3(Vec3),
    /// Four-component vector.
    Vec4(Vec4),
    /// 3x3 matrix.
    Mat3(Mat3),
    /// 4x4 matrix.
    Mat4(Mat4),
}

macro_rules! uniform_from {
    ($ty:ty, $variant:ident) => {
        impl From<$ty> for UniformValue {
            fn from(value: $ty) -> Self {
                UniformValue::$variant(value)
            }
        }
    };
}

uniform_from!(i32, Int);
uniform_from!(f32, Float);
uniform_from!(Vec2, Vec2);
uniform_from!(Vec3, Vec3);
uniform_from!(Vec4, Vec4);
uniform_from!(Mat3, Mat3);
uniform_from!(Mat4, Mat4);

/// A constant value bound to a vertex attribute location for the next draws.
///
/// Per-draw data such as the model matrix is passed this way, so one draw
/// of `n` instances repeats the same value for each instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VertexAttribute {
    /// A four-component value.
    Vec4(Vec4),
    /// A 3x3 matrix, spanning three consecutive locations.
    Mat3(Mat3),
    /// A 4x4 matrix, spanning four consecutive locations.
    Mat4(Mat4),
}

/// One element of an interleaved vertex layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexElement {
    /// Shader attribute location.
    pub location: u32,
    /// Number of `f32` components.
    pub components: u32,
    /// Byte offset inside the vertex.
    pub offset: u32,
}

/// Intended use of a GPU buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    /// Written once, drawn many times.
    Static,
    /// Rewritten every frame.
    Dynamic,
}
