// Error types for the camera rig

use thiserror::Error;

/// Result type alias using [`RigError`] as the error type.
pub type Result<T> = std::result::Result<T, RigError>;

/// Errors raised by rotation parsing, transforms and cameras.
///
/// Every fallible mutation on [`crate::TransformTarget`] and [`crate::Camera`]
/// leaves the instance untouched when it returns one of these.
#[derive(Debug, Error)]
pub enum RigError {
    /// The target point would coincide with the translation.
    #[error("target point is equal to translation")]
    TargetEqualsTranslation,

    /// A rotation order string is not one of the six Tait-Bryan orders.
    #[error("unknown rotation order `{0}`")]
    UnknownRotationOrder(String),

    /// Array input did not carry enough components.
    #[error("array needs at least {expected} elements, got {actual}")]
    ArrayTooShort {
        /// Minimum number of components.
        expected: usize,
        /// Number of components supplied.
        actual: usize,
    },

    /// A named component was present but is not a number.
    #[error("component `{field}` is not a number: {value}")]
    InvalidComponent {
        /// Component name.
        field: &'static str,
        /// The rejected input, rendered as JSON.
        value: String,
    },

    /// A scale component is zero or not finite.
    #[error("scale {scale:?} has a zero or non-finite component")]
    DegenerateScale {
        /// The rejected scale.
        scale: [f64; 3],
    },

    /// An assigned world-to-object matrix cannot be inverted.
    #[error("world-to-object matrix is singular")]
    SingularMatrix,

    /// The up direction is parallel to the look direction.
    #[error("up direction is parallel to the look direction")]
    DegenerateUpVector,

    /// Aperture must be finite and non-zero.
    #[error("invalid aperture {0}")]
    InvalidAperture(f64),

    /// Clip planes cannot produce a projection.
    #[error("invalid clip range [{min}, {max}]")]
    InvalidClipRange {
        /// Near clip plane.
        min: f64,
        /// Far clip plane.
        max: f64,
    },

    /// Viewport aspect ratio must be finite and positive.
    #[error("invalid aspect ratio {0}")]
    InvalidAspectRatio(f64),

    /// A camera description could not be parsed.
    #[error("invalid camera description: {0}")]
    Json(#[from] serde_json::Error),
}
