// Camera options and camera descriptions

use glam::DMat4;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::camera::SceneUp;
use crate::error::{Result, RigError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
/// Lens and scene parameters a fresh camera starts from.
pub struct CameraOptions {
    /// Film back width, in scene units.
    pub aperture: f64,
    /// Focal length, in the same units as the aperture.
    pub focal: f64,
    /// Parallel projection instead of perspective.
    pub orthographic: bool,
    /// Near clipping plane distance.
    pub clip_min: f64,
    /// Far clipping plane distance.
    pub clip_max: f64,
    /// World axis treated as up.
    pub scene_up_direction: SceneUp,
}

impl Default for CameraOptions {
    fn default() -> Self {
        Self {
            aperture: 100.0,
            focal: 50.0,
            orthographic: false,
            clip_min: 0.1,
            clip_max: 1000.0,
            scene_up_direction: SceneUp::YUp,
        }
    }
}

/// A partial camera description; absent fields leave the camera as it is.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CameraData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orthographic: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focal: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aperture: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clip_max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clip_min: Option<f64>,
    /// World-to-object matrix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<MatrixFields>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene_up_direction: Option<SceneUp>,
}

impl CameraData {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// A 4x4 matrix spelled out by named fields, row-vector convention.
///
/// Field `ab` is row `a`, column `b`, so `wx wy wz` hold the translation.
/// Missing fields take their identity value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MatrixFields {
    pub xx: f64,
    pub xy: f64,
    pub xz: f64,
    pub xw: f64,
    pub yx: f64,
    pub yy: f64,
    pub yz: f64,
    pub yw: f64,
    pub zx: f64,
    pub zy: f64,
    pub zz: f64,
    pub zw: f64,
    pub wx: f64,
    pub wy: f64,
    pub wz: f64,
    pub ww: f64,
}

impl Default for MatrixFields {
    fn default() -> Self {
        Self::from(DMat4::IDENTITY)
    }
}

impl From<DMat4> for MatrixFields {
    fn from(m: DMat4) -> Self {
        let [xx, xy, xz, xw, yx, yy, yz, yw, zx, zy, zz, zw, wx, wy, wz, ww] = m.to_cols_array();
        Self {
            xx,
            xy,
            xz,
            xw,
            yx,
            yy,
            yz,
            yw,
            zx,
            zy,
            zz,
            zw,
            wx,
            wy,
            wz,
            ww,
        }
    }
}

impl From<MatrixFields> for DMat4 {
    fn from(f: MatrixFields) -> Self {
        DMat4::from_cols_array(&[
            f.xx, f.xy, f.xz, f.xw, //
            f.yx, f.yy, f.yz, f.yw, //
            f.zx, f.zy, f.zz, f.zw, //
            f.wx, f.wy, f.wz, f.ww,
        ])
    }
}

/// Read a numeric component from a JSON object.
///
/// Returns `None` when the field is absent or null. Numeric strings are
/// accepted; anything else is an [`RigError::InvalidComponent`].
pub(crate) fn named_component(value: &Value, field: &'static str) -> Result<Option<f64>> {
    let invalid = |v: &Value| RigError::InvalidComponent {
        field,
        value: v.to_string(),
    };

    match value.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(v @ Value::Number(n)) => n.as_f64().map(Some).ok_or_else(|| invalid(v)),
        Some(v @ Value::String(s)) => s.trim().parse::<f64>().map(Some).map_err(|_| invalid(v)),
        Some(v) => Err(invalid(v)),
    }
}
