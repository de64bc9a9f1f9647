//! Error types for tree construction and rendering.

use thiserror::Error;

/// Errors that can occur while building a kd-tree or rendering with it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TraceError {
    /// Invalid tree or camera settings.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// A primitive reported a bounding box with NaN or infinite coordinates.
    #[error("primitive {index} has a non-finite bounding box")]
    NonFiniteBounds {
        /// Index of the offending primitive in the world.
        index: usize,
    },

    /// The world holds more primitives than 32-bit node indices can address.
    #[error("too many primitives for 32-bit indices: {0}")]
    TooManyPrimitives(usize),

    /// Render target has no pixels.
    #[error("image dimensions must be non-zero (got {width}x{height})")]
    EmptyImage {
        /// Requested width in pixels.
        width: u32,
        /// Derived height in pixels.
        height: u32,
    },
}

/// Result type for tracer operations.
pub type Result<T> = std::result::Result<T, TraceError>;
