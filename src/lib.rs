// IntSar-3D camera: a scene camera rig in Rust
//
// Rotation conversions, rigid transforms, a target-tracking frame and a
// camera with lens parameters and pixel projection.

pub mod camera;
pub mod change;
pub mod config;
pub mod error;
pub mod euler;
pub mod quaternion;
pub mod transform;
pub mod transform_target;
pub mod uniform;

pub use camera::{Camera, SceneUp};
pub use change::{ChangeObserver, ChangeSet, Property};
pub use config::{CameraData, CameraOptions, MatrixFields};
pub use error::{Result, RigError};
pub use euler::{Euler, RotationOrder};
pub use quaternion::Quaternion;
pub use transform::Transform;
pub use transform_target::TransformTarget;
pub use uniform::CameraUniform;

/// Default tolerance for approximate comparisons.
pub const ALMOST_ZERO: f64 = 1e-4;
