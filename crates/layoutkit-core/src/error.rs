//! Error types for the transform engine.
//!
//! Every error here is recovered locally by the controller layer: the
//! manipulator simply does not move or resize in the frame that failed.

use crate::scene::ItemId;
use thiserror::Error;

/// Errors raised by transform operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformError {
    /// The source rectangle of a scale delta has zero width or height.
    #[error("Degenerate geometry: source rect is {width} x {height}")]
    DegenerateGeometry { width: f64, height: f64 },
    /// A transform has a (near) zero scale and cannot be decomposed.
    #[error("Undefined decomposition: scale is ({scale_x}, {scale_y})")]
    UndefinedDecomposition { scale_x: f64, scale_y: f64 },
    /// The resulting geometry would leave the bound rect.
    #[error("Geometry escapes the bound rect")]
    OutOfBounds,
    /// The scene has no item with this id.
    #[error("Unknown scene item: {0}")]
    UnknownItem(ItemId),
    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for transform operations.
pub type TransformResult<T> = Result<T, TransformError>;
