// Euler angles and rotation orders

use std::fmt;
use std::str::FromStr;

use glam::{DMat4, DVec4};
use serde_json::Value;

use crate::config::named_component;
use crate::error::{Result, RigError};
use crate::quaternion::Quaternion;
use crate::ALMOST_ZERO;

/// Entries at or beyond this magnitude put the extraction into gimbal lock.
const GIMBAL_LOCK_THRESHOLD: f64 = 0.9999999;

/// Sequence in which the three intrinsic rotations are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RotationOrder {
    Xyz,
    Yzx,
    Zxy,
    Xzy,
    Yxz,
    #[default]
    Zyx,
}

impl RotationOrder {
    /// Every supported order.
    pub const ALL: [RotationOrder; 6] = [
        RotationOrder::Xyz,
        RotationOrder::Yzx,
        RotationOrder::Zxy,
        RotationOrder::Xzy,
        RotationOrder::Yxz,
        RotationOrder::Zyx,
    ];

    /// Canonical upper-case spelling, e.g. `"ZYX"`.
    pub const fn as_str(self) -> &'static str {
        match self {
            RotationOrder::Xyz => "XYZ",
            RotationOrder::Yzx => "YZX",
            RotationOrder::Zxy => "ZXY",
            RotationOrder::Xzy => "XZY",
            RotationOrder::Yxz => "YXZ",
            RotationOrder::Zyx => "ZYX",
        }
    }
}

impl fmt::Display for RotationOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RotationOrder {
    type Err = RigError;

    fn from_str(s: &str) -> Result<Self> {
        RotationOrder::ALL
            .into_iter()
            .find(|order| order.as_str() == s)
            .ok_or_else(|| RigError::UnknownRotationOrder(s.to_owned()))
    }
}

/// Intrinsic Tait-Bryan rotation, angles in radians.
///
/// For order `XYZ` the rotation happens about local X first (which is still
/// world X), then the rotated local Y, then the rotated local Z.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Euler {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub order: RotationOrder,
}

impl Euler {
    /// Create an euler from its components.
    pub fn new(x: f64, y: f64, z: f64, order: RotationOrder) -> Self {
        Self { x, y, z, order }
    }

    /// Create an euler using the default `ZYX` order.
    pub fn from_components(x: f64, y: f64, z: f64) -> Self {
        Self::new(x, y, z, RotationOrder::default())
    }

    /// Create an euler from the first three values of `values`.
    pub fn from_array(values: &[f64], order: RotationOrder) -> Result<Self> {
        match values {
            [x, y, z, ..] => Ok(Self::new(*x, *y, *z, order)),
            _ => Err(RigError::ArrayTooShort {
                expected: 3,
                actual: values.len(),
            }),
        }
    }

    /// Create an euler from an object with `x`, `y`, `z` and optionally `order`.
    ///
    /// Missing angles are zero. An explicit `order` argument wins over the
    /// object's own `order` field.
    pub fn from_named_fields(value: &Value, order: Option<RotationOrder>) -> Result<Self> {
        let order = match (order, value.get("order").and_then(Value::as_str)) {
            (Some(order), _) => order,
            (None, Some(name)) => name.parse()?,
            (None, None) => RotationOrder::default(),
        };
        Ok(Self::new(
            named_component(value, "x")?.unwrap_or(0.0),
            named_component(value, "y")?.unwrap_or(0.0),
            named_component(value, "z")?.unwrap_or(0.0),
            order,
        ))
    }

    /// Extract the rotation of a forward (object to world) matrix.
    pub fn from_matrix(m: &DMat4, order: RotationOrder) -> Self {
        let mut euler = Self::default();
        euler.set_from_matrix(m, Some(order));
        euler
    }

    /// Convert a quaternion, going through its rotation matrix.
    pub fn from_quaternion(q: &Quaternion, order: RotationOrder) -> Self {
        Self::from_matrix(&q.to_matrix(), order)
    }

    /// Set from the unscaled upper 3x3 of `m`, keeping the current order if none is given.
    pub fn set_from_matrix(&mut self, m: &DMat4, order: Option<RotationOrder>) {
        let order = order.unwrap_or(self.order);

        let (m11, m12, m13) = (m.x_axis.x, m.y_axis.x, m.z_axis.x);
        let (m21, m22, m23) = (m.x_axis.y, m.y_axis.y, m.z_axis.y);
        let (m31, m32, m33) = (m.x_axis.z, m.y_axis.z, m.z_axis.z);

        match order {
            RotationOrder::Xyz => {
                self.y = m13.clamp(-1.0, 1.0).asin();
                if m13.abs() < GIMBAL_LOCK_THRESHOLD {
                    self.x = (-m23).atan2(m33);
                    self.z = (-m12).atan2(m11);
                } else {
                    self.x = m32.atan2(m22);
                    self.z = 0.0;
                }
            }
            RotationOrder::Yxz => {
                self.x = (-m23.clamp(-1.0, 1.0)).asin();
                if m23.abs() < GIMBAL_LOCK_THRESHOLD {
                    self.y = m13.atan2(m33);
                    self.z = m21.atan2(m22);
                } else {
                    self.y = (-m31).atan2(m11);
                    self.z = 0.0;
                }
            }
            RotationOrder::Zxy => {
                self.x = m32.clamp(-1.0, 1.0).asin();
                if m32.abs() < GIMBAL_LOCK_THRESHOLD {
                    self.y = (-m31).atan2(m33);
                    self.z = (-m12).atan2(m22);
                } else {
                    self.y = 0.0;
                    self.z = m21.atan2(m11);
                }
            }
            RotationOrder::Zyx => {
                self.y = (-m31.clamp(-1.0, 1.0)).asin();
                if m31.abs() < GIMBAL_LOCK_THRESHOLD {
                    self.x = m32.atan2(m33);
                    self.z = m21.atan2(m11);
                } else {
                    self.x = 0.0;
                    self.z = (-m12).atan2(m22);
                }
            }
            RotationOrder::Yzx => {
                self.z = m21.clamp(-1.0, 1.0).asin();
                if m21.abs() < GIMBAL_LOCK_THRESHOLD {
                    self.x = (-m23).atan2(m22);
                    self.y = (-m31).atan2(m11);
                } else {
                    self.x = 0.0;
                    self.y = m13.atan2(m33);
                }
            }
            RotationOrder::Xzy => {
                self.z = (-m12.clamp(-1.0, 1.0)).asin();
                if m12.abs() < GIMBAL_LOCK_THRESHOLD {
                    self.x = m32.atan2(m22);
                    self.y = m13.atan2(m11);
                } else {
                    self.x = (-m23).atan2(m33);
                    self.y = 0.0;
                }
            }
        }

        self.order = order;
    }

    /// Set from a quaternion through its rotation matrix.
    pub fn set_from_quaternion(&mut self, q: &Quaternion, order: Option<RotationOrder>) {
        self.set_from_matrix(&q.to_matrix(), order);
    }

    /// Re-express the same rotation in `new_order`.
    ///
    /// Revolutions beyond a half turn are lost.
    pub fn reorder(&mut self, new_order: RotationOrder) {
        let q = Quaternion::from_euler(self);
        self.set_from_quaternion(&q, Some(new_order));
    }

    /// Component-wise comparison within `tolerance`; orders must match exactly.
    pub fn equal_with_tolerance(&self, rhs: &Euler, tolerance: f64) -> bool {
        (self.x - rhs.x).abs() < tolerance
            && (self.y - rhs.y).abs() < tolerance
            && (self.z - rhs.z).abs() < tolerance
            && self.order == rhs.order
    }

    /// [`Self::equal_with_tolerance`] with [`ALMOST_ZERO`].
    pub fn approx_eq(&self, rhs: &Euler) -> bool {
        self.equal_with_tolerance(rhs, ALMOST_ZERO)
    }

    /// Forward (object to world) rotation matrix for this euler.
    ///
    /// `m.transform_vector3(v)` rotates `v` by this euler.
    pub fn to_matrix(&self) -> DMat4 {
        let (b, a) = self.x.sin_cos();
        let (d, c) = self.y.sin_cos();
        let (f, e) = self.z.sin_cos();

        match self.order {
            RotationOrder::Xyz => {
                let (ae, af, be, bf) = (a * e, a * f, b * e, b * f);
                rotation_from_rows(
                    [c * e, -c * f, d],
                    [af + be * d, ae - bf * d, -b * c],
                    [bf - ae * d, be + af * d, a * c],
                )
            }
            RotationOrder::Yxz => {
                let (ce, cf, de, df) = (c * e, c * f, d * e, d * f);
                rotation_from_rows(
                    [ce + df * b, de * b - cf, a * d],
                    [a * f, a * e, -b],
                    [cf * b - de, df + ce * b, a * c],
                )
            }
            RotationOrder::Zxy => {
                let (ce, cf, de, df) = (c * e, c * f, d * e, d * f);
                rotation_from_rows(
                    [ce - df * b, -a * f, de + cf * b],
                    [cf + de * b, a * e, df - ce * b],
                    [-a * d, b, a * c],
                )
            }
            RotationOrder::Zyx => {
                let (ae, af, be, bf) = (a * e, a * f, b * e, b * f);
                rotation_from_rows(
                    [c * e, be * d - af, ae * d + bf],
                    [c * f, bf * d + ae, af * d - be],
                    [-d, b * c, a * c],
                )
            }
            RotationOrder::Yzx => {
                let (ac, ad, bc, bd) = (a * c, a * d, b * c, b * d);
                rotation_from_rows(
                    [c * e, bd - ac * f, bc * f + ad],
                    [f, a * e, -b * e],
                    [-d * e, ad * f + bc, ac - bd * f],
                )
            }
            RotationOrder::Xzy => {
                let (ac, ad, bc, bd) = (a * c, a * d, b * c, b * d);
                rotation_from_rows(
                    [c * e, -f, d * e],
                    [ac * f + bd, a * e, ad * f - bc],
                    [bc * f - ad, b * e, bd * f + ac],
                )
            }
        }
    }

    /// Quaternion for this euler, using the direct half-angle expansion.
    pub fn to_quaternion(&self) -> Quaternion {
        Quaternion::from_euler(self)
    }
}

/// Build a rotation matrix from the rows of its 3x3 block (column-vector convention).
fn rotation_from_rows(r1: [f64; 3], r2: [f64; 3], r3: [f64; 3]) -> DMat4 {
    DMat4::from_cols(
        DVec4::new(r1[0], r2[0], r3[0], 0.0),
        DVec4::new(r1[1], r2[1], r3[1], 0.0),
        DVec4::new(r1[2], r2[2], r3[2], 0.0),
        DVec4::W,
    )
}
