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

//! Defines the error types for graphics resource management.

use std::fmt;

/// An error related to the creation, use, or destruction of a GPU resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceError {
    /// A generic resource could not be found.
    NotFound,
    /// The handle or ID used to reference a resource is invalid.
    InvalidHandle,
    /// A buffer, texture or framebuffer was requested with a zero size.
    ZeroSized,
    /// An error originating from the specific graphics backend implementation.
    BackendError(String),
    /// An attempt was made to access a resource out of its bounds (e.g., in a buffer).
    OutOfBounds {
        /// Byte offset one past the end of the attempted write.
        end: usize,
        /// Size of the resource in bytes.
        size: usize,
    },
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::NotFound => write!(f, "Resource not found with ID."),
            ResourceError::InvalidHandle => write!(f, "Invalid resource handle or ID."),
            ResourceError::ZeroSized => write!(f, "Resource size must be non-zero."),
            ResourceError::BackendError(msg) => {
                write!(f, "Backend-specific resource error: {msg}")
            }
            ResourceError::OutOfBounds { end, size } => {
                write!(f, "Resource access out of bounds ({end} > {size} bytes).")
            }
        }
    }
}

impl std::error::Error for ResourceError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_error_display() {
        assert_eq!(
            ResourceError::NotFound.to_string(),
            "Resource not found with ID."
        );
        assert_eq!(
            ResourceError::BackendError("lost".into()).to_string(),
            "Backend-specific resource error: lost"
        );
        assert_eq!(
            ResourceError::OutOfBounds { end: 96, size: 64 }.to_string(),
            "Resource access out of bounds (96 > 64 bytes)."
        );
    }
}
