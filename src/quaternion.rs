// Unit quaternion rotations

use std::ops::{Mul, Neg};

use glam::{DMat4, DQuat, DVec3, DVec4};
use serde_json::Value;

use crate::config::named_component;
use crate::error::{Result, RigError};
use crate::euler::{Euler, RotationOrder};
use crate::ALMOST_ZERO;

/// Quaternion with scalar part `w`.
///
/// Rotations use the unit form; [`Quaternion::normalize`] maps the zero
/// quaternion to the identity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quaternion {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quaternion {
    pub const IDENTITY: Quaternion = Quaternion::new(0.0, 0.0, 0.0, 1.0);

    pub const fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }

    /// Create a quaternion from the first four values of `values`.
    pub fn from_array(values: &[f64]) -> Result<Self> {
        match values {
            [x, y, z, w, ..] => Ok(Self::new(*x, *y, *z, *w)),
            _ => Err(RigError::ArrayTooShort {
                expected: 4,
                actual: values.len(),
            }),
        }
    }

    pub fn to_array(self) -> [f64; 4] {
        [self.x, self.y, self.z, self.w]
    }

    /// Create a quaternion from an object with `x`, `y`, `z`, `w` fields.
    ///
    /// Missing vector components are zero, a missing `w` is one.
    pub fn from_named_fields(value: &Value) -> Result<Self> {
        Ok(Self::new(
            named_component(value, "x")?.unwrap_or(0.0),
            named_component(value, "y")?.unwrap_or(0.0),
            named_component(value, "z")?.unwrap_or(0.0),
            named_component(value, "w")?.unwrap_or(1.0),
        ))
    }

    /// Rotation of `angle` radians about a normalized `axis`.
    pub fn from_axis_angle(axis: DVec3, angle: f64) -> Self {
        let (s, w) = (angle / 2.0).sin_cos();
        Self::new(axis.x * s, axis.y * s, axis.z * s, w)
    }

    /// Half-angle expansion of an euler rotation.
    pub fn from_euler(euler: &Euler) -> Self {
        let (s1, c1) = (euler.x / 2.0).sin_cos();
        let (s2, c2) = (euler.y / 2.0).sin_cos();
        let (s3, c3) = (euler.z / 2.0).sin_cos();

        // Sign applied to the second product of each component.
        let [sx, sy, sz, sw] = match euler.order {
            RotationOrder::Xyz => [1.0, -1.0, 1.0, -1.0],
            RotationOrder::Yxz => [1.0, -1.0, -1.0, 1.0],
            RotationOrder::Zxy => [-1.0, 1.0, 1.0, -1.0],
            RotationOrder::Zyx => [-1.0, 1.0, -1.0, 1.0],
            RotationOrder::Yzx => [1.0, 1.0, -1.0, -1.0],
            RotationOrder::Xzy => [-1.0, -1.0, 1.0, 1.0],
        };

        Self::new(
            s1 * c2 * c3 + sx * c1 * s2 * s3,
            c1 * s2 * c3 + sy * s1 * c2 * s3,
            c1 * c2 * s3 + sz * s1 * s2 * c3,
            c1 * c2 * c3 + sw * s1 * s2 * s3,
        )
    }

    /// Euler angles for this rotation in `order`.
    pub fn to_euler(&self, order: RotationOrder) -> Euler {
        Euler::from_quaternion(self, order)
    }

    /// Rotation held by the unscaled upper 3x3 of a forward matrix.
    pub fn from_matrix(m: &DMat4) -> Self {
        let (m11, m12, m13) = (m.x_axis.x, m.y_axis.x, m.z_axis.x);
        let (m21, m22, m23) = (m.x_axis.y, m.y_axis.y, m.z_axis.y);
        let (m31, m32, m33) = (m.x_axis.z, m.y_axis.z, m.z_axis.z);
        let trace = m11 + m22 + m33;

        if trace > 0.0 {
            let s = 0.5 / (trace + 1.0).sqrt();
            Self::new((m32 - m23) * s, (m13 - m31) * s, (m21 - m12) * s, 0.25 / s)
        } else if m11 > m22 && m11 > m33 {
            let s = 2.0 * (1.0 + m11 - m22 - m33).sqrt();
            Self::new(0.25 * s, (m12 + m21) / s, (m13 + m31) / s, (m32 - m23) / s)
        } else if m22 > m33 {
            let s = 2.0 * (1.0 + m22 - m11 - m33).sqrt();
            Self::new((m12 + m21) / s, 0.25 * s, (m23 + m32) / s, (m13 - m31) / s)
        } else {
            let s = 2.0 * (1.0 + m33 - m11 - m22).sqrt();
            Self::new((m13 + m31) / s, (m23 + m32) / s, 0.25 * s, (m21 - m12) / s)
        }
    }

    /// Forward rotation matrix; `to_matrix().transform_vector3(v) == rotate_vector(v)`.
    pub fn to_matrix(&self) -> DMat4 {
        let Self { x, y, z, w } = *self;
        let (x2, y2, z2) = (x + x, y + y, z + z);
        let (xx, xy, xz) = (x * x2, x * y2, x * z2);
        let (yy, yz, zz) = (y * y2, y * z2, z * z2);
        let (wx, wy, wz) = (w * x2, w * y2, w * z2);

        DMat4::from_cols(
            DVec4::new(1.0 - (yy + zz), xy + wz, xz - wy, 0.0),
            DVec4::new(xy - wz, 1.0 - (xx + zz), yz + wx, 0.0),
            DVec4::new(xz + wy, yz - wx, 1.0 - (xx + yy), 0.0),
            DVec4::W,
        )
    }

    /// Shortest rotation taking unit vector `from` onto unit vector `to`.
    pub fn from_unit_vectors(from: DVec3, to: DVec3) -> Self {
        const EPS: f64 = 1e-6;
        let r = from.dot(to) + 1.0;

        let q = if r < EPS {
            // Opposite vectors: any perpendicular axis works.
            if from.x.abs() > from.z.abs() {
                Self::new(-from.y, from.x, 0.0, 0.0)
            } else {
                Self::new(0.0, -from.z, from.y, 0.0)
            }
        } else {
            let c = from.cross(to);
            Self::new(c.x, c.y, c.z, r)
        };
        q.normalize()
    }

    pub fn dot(&self, rhs: &Quaternion) -> f64 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z + self.w * rhs.w
    }

    pub fn length_squared(&self) -> f64 {
        self.dot(self)
    }

    pub fn length(&self) -> f64 {
        self.length_squared().sqrt()
    }

    /// Unit quaternion in the same direction; zero becomes the identity.
    #[must_use]
    pub fn normalize(self) -> Self {
        let len = self.length();
        if len == 0.0 {
            Self::IDENTITY
        } else {
            let inv = 1.0 / len;
            Self::new(self.x * inv, self.y * inv, self.z * inv, self.w * inv)
        }
    }

    #[must_use]
    pub fn conjugate(self) -> Self {
        Self::new(-self.x, -self.y, -self.z, self.w)
    }

    /// Inverse of a unit quaternion.
    #[must_use]
    pub fn invert(self) -> Self {
        self.conjugate()
    }

    /// Hamilton product `self * rhs`.
    #[must_use]
    pub fn multiply(self, rhs: Quaternion) -> Self {
        let [x, y, z, w] = Self::multiply_flat(self.to_array(), rhs.to_array());
        Self::new(x, y, z, w)
    }

    /// Hamilton product `lhs * self`.
    #[must_use]
    pub fn premultiply(self, lhs: Quaternion) -> Self {
        lhs.multiply(self)
    }

    /// Rotate `v` by this unit quaternion.
    pub fn rotate_vector(&self, v: DVec3) -> DVec3 {
        let Self { x: qx, y: qy, z: qz, w: qw } = *self;

        let ix = qw * v.x + qy * v.z - qz * v.y;
        let iy = qw * v.y + qz * v.x - qx * v.z;
        let iz = qw * v.z + qx * v.y - qy * v.x;
        let iw = -qx * v.x - qy * v.y - qz * v.z;

        DVec3::new(
            ix * qw + iw * -qx + iy * -qz - iz * -qy,
            iy * qw + iw * -qy + iz * -qx - ix * -qz,
            iz * qw + iw * -qz + ix * -qy - iy * -qx,
        )
    }

    /// Angle in radians between two unit quaternions.
    pub fn angle_to(&self, rhs: &Quaternion) -> f64 {
        2.0 * self.dot(rhs).clamp(-1.0, 1.0).abs().acos()
    }

    /// Step toward `target` by at most `step` radians.
    #[must_use]
    pub fn rotate_towards(self, target: Quaternion, step: f64) -> Self {
        let angle = self.angle_to(&target);
        if angle == 0.0 {
            return self;
        }
        let t = (step / angle).min(1.0);
        self.slerp(target, t)
    }

    /// Spherical interpolation toward `end`, taking the short way round.
    #[must_use]
    pub fn slerp(self, end: Quaternion, t: f64) -> Self {
        if t == 0.0 {
            return self;
        }
        if t == 1.0 {
            return end;
        }

        let mut cos_half = self.dot(&end);
        let end = if cos_half < 0.0 {
            cos_half = -cos_half;
            -end
        } else {
            end
        };

        if cos_half >= 1.0 {
            return self;
        }

        let sqr_sin_half = 1.0 - cos_half * cos_half;
        if sqr_sin_half <= f64::EPSILON {
            let s = 1.0 - t;
            return Self::new(
                s * self.x + t * end.x,
                s * self.y + t * end.y,
                s * self.z + t * end.z,
                s * self.w + t * end.w,
            )
            .normalize();
        }

        let sin_half = sqr_sin_half.sqrt();
        let half = sin_half.atan2(cos_half);
        let ratio_a = ((1.0 - t) * half).sin() / sin_half;
        let ratio_b = (t * half).sin() / sin_half;

        Self::new(
            self.x * ratio_a + end.x * ratio_b,
            self.y * ratio_a + end.y * ratio_b,
            self.z * ratio_a + end.z * ratio_b,
            self.w * ratio_a + end.w * ratio_b,
        )
    }

    /// [`Self::slerp`] over packed `[x, y, z, w]` arrays.
    pub fn slerp_flat(src0: [f64; 4], src1: [f64; 4], t: f64) -> [f64; 4] {
        if src0 == src1 {
            return src0;
        }
        let [mut x0, mut y0, mut z0, mut w0] = src0;
        let [x1, y1, z1, w1] = src1;

        let mut s = 1.0 - t;
        let mut t = t;
        let cos = x0 * x1 + y0 * y1 + z0 * z1 + w0 * w1;
        let dir = if cos >= 0.0 { 1.0 } else { -1.0 };
        let sqr_sin = 1.0 - cos * cos;

        let lerped = sqr_sin <= f64::EPSILON;
        if !lerped {
            let sin = sqr_sin.sqrt();
            let len = sin.atan2(cos * dir);
            s = (s * len).sin() / sin;
            t = (t * len).sin() / sin;
        }

        let t_dir = t * dir;
        x0 = x0 * s + x1 * t_dir;
        y0 = y0 * s + y1 * t_dir;
        z0 = z0 * s + z1 * t_dir;
        w0 = w0 * s + w1 * t_dir;

        if lerped {
            let f = 1.0 / (x0 * x0 + y0 * y0 + z0 * z0 + w0 * w0).sqrt();
            x0 *= f;
            y0 *= f;
            z0 *= f;
            w0 *= f;
        }
        [x0, y0, z0, w0]
    }

    /// Hamilton product over packed `[x, y, z, w]` arrays.
    pub fn multiply_flat(a: [f64; 4], b: [f64; 4]) -> [f64; 4] {
        let [ax, ay, az, aw] = a;
        let [bx, by, bz, bw] = b;
        [
            ax * bw + aw * bx + ay * bz - az * by,
            ay * bw + aw * by + az * bx - ax * bz,
            az * bw + aw * bz + ax * by - ay * bx,
            aw * bw - ax * bx - ay * by - az * bz,
        ]
    }

    /// Component-wise comparison within `tolerance`.
    pub fn equal_with_tolerance(&self, rhs: &Quaternion, tolerance: f64) -> bool {
        (self.x - rhs.x).abs() < tolerance
            && (self.y - rhs.y).abs() < tolerance
            && (self.z - rhs.z).abs() < tolerance
            && (self.w - rhs.w).abs() < tolerance
    }

    /// [`Self::equal_with_tolerance`] with [`ALMOST_ZERO`].
    pub fn approx_eq(&self, rhs: &Quaternion) -> bool {
        self.equal_with_tolerance(rhs, ALMOST_ZERO)
    }
}

impl Neg for Quaternion {
    type Output = Quaternion;

    fn neg(self) -> Quaternion {
        Quaternion::new(-self.x, -self.y, -self.z, -self.w)
    }
}

impl Mul for Quaternion {
    type Output = Quaternion;

    fn mul(self, rhs: Quaternion) -> Quaternion {
        self.multiply(rhs)
    }
}

impl From<DQuat> for Quaternion {
    fn from(q: DQuat) -> Self {
        Self::new(q.x, q.y, q.z, q.w)
    }
}

impl From<Quaternion> for DQuat {
    fn from(q: Quaternion) -> Self {
        DQuat::from_xyzw(q.x, q.y, q.z, q.w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use serde_json::json;
    use std::f64::consts::{FRAC_1_SQRT_2, PI};

    const TOLERANCE: f64 = 1e-7;

    fn assert_quat(actual: Quaternion, expected: Quaternion, tolerance: f64) {
        assert!(
            actual.equal_with_tolerance(&expected, tolerance),
            "{actual:?} != {expected:?}"
        );
    }

    /// Quaternions q and -q describe the same rotation.
    fn same_rotation(a: Quaternion, b: Quaternion) -> bool {
        a.equal_with_tolerance(&b, TOLERANCE) || a.equal_with_tolerance(&-b, TOLERANCE)
    }

    #[test]
    fn construction_defaults() {
        assert_eq!(Quaternion::default(), Quaternion::new(0.0, 0.0, 0.0, 1.0));

        let q = Quaternion::from_named_fields(&json!({"x": 1, "y": 2, "z": 3})).unwrap();
        assert_eq!(q, Quaternion::new(1.0, 2.0, 3.0, 1.0));

        let q = Quaternion::from_named_fields(&json!({"x": "1", "y": 2, "z": "3", "w": "4"})).unwrap();
        assert_eq!(q, Quaternion::new(1.0, 2.0, 3.0, 4.0));

        let q = Quaternion::from_array(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert_eq!(q.to_array(), [1.0, 2.0, 3.0, 4.0]);

        assert!(matches!(
            Quaternion::from_array(&[1.0, 2.0, 3.0]),
            Err(RigError::ArrayTooShort { expected: 4, actual: 3 })
        ));
        assert!(Quaternion::from_named_fields(&json!({"w": [1]})).is_err());
    }

    #[test]
    fn axis_angle() {
        let zero = Quaternion::from_axis_angle(DVec3::X, 0.0);
        assert_eq!(zero, Quaternion::IDENTITY);

        let half = Quaternion::from_axis_angle(DVec3::X, PI);
        assert_abs_diff_eq!(half.x, 1.0, epsilon = TOLERANCE);
        assert_abs_diff_eq!(half.w, 0.0, epsilon = TOLERANCE);

        let axis = DVec3::new(0.5070926, 0.8451543, -0.1690309);
        let q = Quaternion::from_axis_angle(axis, 34f64.to_radians());
        assert_quat(q, Quaternion::new(0.1482595, 0.2470992, -0.0494198, 0.9563047), 1e-6);
    }

    #[test]
    fn euler_and_matrix_paths_agree() {
        let angles = [(0.1, 0.0, 0.0), (0.0, 0.1, 0.0), (0.0, 0.0, 0.1), (0.4, -1.2, 1.3)];
        for order in RotationOrder::ALL {
            for (x, y, z) in angles {
                let e = Euler::new(x, y, z, order);
                let direct = Quaternion::from_euler(&e);
                let via_matrix = Quaternion::from_matrix(&e.to_matrix());
                assert!(same_rotation(direct, via_matrix), "{order}: {direct:?} vs {via_matrix:?}");

                let back = direct.to_euler(order);
                assert!(back.equal_with_tolerance(&e, 1e-6));
            }
        }
    }

    #[test]
    fn matrix_round_trip() {
        let q = Quaternion::new(-9.0, -2.0, 3.0, -4.0).normalize();
        let back = Quaternion::from_matrix(&q.to_matrix());
        assert_quat(
            back,
            Quaternion::new(0.8581163303210332, 0.19069251784911848, -0.2860387767736777, 0.38138503569823695),
            1e-9,
        );

        let q = Quaternion::new(-1.0, -2.0, 1.0, -1.0).normalize();
        assert_quat(
            q,
            Quaternion::new(-0.37796447300922714, -0.7559289460184544, 0.37796447300922714, -0.37796447300922714),
            1e-12,
        );
        let back = Quaternion::from_matrix(&q.to_matrix());
        assert_quat(
            back,
            Quaternion::new(0.37796447300922714, 0.7559289460184544, -0.37796447300922714, 0.37796447300922714),
            1e-9,
        );
    }

    #[test]
    fn normalize_length_and_inverse() {
        let a = Quaternion::new(1.0, 2.0, 3.0, 4.0);
        assert_abs_diff_eq!(a.length_squared(), 30.0);
        assert_abs_diff_eq!(a.normalize().length(), 1.0, epsilon = 1e-12);
        assert_eq!(Quaternion::new(0.0, 0.0, 0.0, 0.0).normalize(), Quaternion::IDENTITY);

        let inv = a.invert();
        assert_eq!(inv, Quaternion::new(-1.0, -2.0, -3.0, 4.0));
        assert_eq!(a.conjugate(), inv);
    }

    #[test]
    fn dot_and_products() {
        let a = Quaternion::new(1.0, 2.0, 3.0, 1.0);
        let b = Quaternion::new(3.0, 2.0, 1.0, 1.0);
        assert_eq!(a.dot(&b), 11.0);

        let a = Quaternion::new(2.0, 3.0, 4.0, 5.0);
        let b = Quaternion::new(4.0, -3.0, -8.0, 5.0);
        assert_eq!(a.premultiply(b), Quaternion::new(42.0, -32.0, -2.0, 58.0));
        assert_eq!(b * a, a.premultiply(b));

        let flat = Quaternion::multiply_flat(b.to_array(), a.to_array());
        assert_eq!(flat, [42.0, -32.0, -2.0, 58.0]);
    }

    #[test]
    fn product_composes_rotations() {
        let about_x = Quaternion::from_axis_angle(DVec3::X, 0.3);
        let about_y = Quaternion::from_axis_angle(DVec3::Y, -1.1);
        let v = DVec3::new(0.2, -0.7, 1.5);

        let composed = (about_x * about_y).rotate_vector(v);
        let stepwise = about_x.rotate_vector(about_y.rotate_vector(v));
        assert_abs_diff_eq!(composed, stepwise, epsilon = 1e-12);
    }

    #[test]
    fn rotate_vector_matches_matrix_and_glam() {
        let q = Quaternion::from_euler(&Euler::new(0.3, -0.8, 1.9, RotationOrder::Xzy));
        let v = DVec3::new(1.0, -2.0, 0.5);

        let expected = q.to_matrix().transform_vector3(v);
        assert_abs_diff_eq!(q.rotate_vector(v), expected, epsilon = 1e-12);
        assert_abs_diff_eq!(DQuat::from(q) * v, expected, epsilon = 1e-12);
        assert_eq!(Quaternion::from(DQuat::from(q)), q);
    }

    #[test]
    fn slerp_midpoints() {
        let a = Quaternion::new(FRAC_1_SQRT_2, 0.0, 0.0, FRAC_1_SQRT_2);
        let b = Quaternion::new(-FRAC_1_SQRT_2, 0.0, 0.0, FRAC_1_SQRT_2);

        assert_eq!(a.slerp(b, 0.0), a);
        assert_eq!(a.slerp(b, 1.0), b);
        assert_quat(a.slerp(b, 0.5), Quaternion::IDENTITY, 1e-12);

        let e = Quaternion::new(1.0, 0.0, 0.0, 0.0);
        let f = Quaternion::new(0.0, 0.0, 1.0, 0.0);
        let mid = e.slerp(f, 0.5);
        assert_quat(mid, Quaternion::new(FRAC_1_SQRT_2, 0.0, FRAC_1_SQRT_2, 0.0), 1e-12);

        let g = Quaternion::new(0.0, FRAC_1_SQRT_2, 0.0, FRAC_1_SQRT_2);
        let h = Quaternion::new(0.0, -FRAC_1_SQRT_2, 0.0, FRAC_1_SQRT_2);
        assert_quat(g.slerp(h, 0.5), Quaternion::IDENTITY, 1e-12);
    }

    #[test]
    fn slerp_takes_short_path() {
        let a = Quaternion::new(2.0, 3.0, 4.0, 5.0).normalize();
        let b = -a;
        assert_eq!(a.slerp(b, 1.0), b);
        assert_quat(a.slerp(b, 0.5), a, 1e-12);
    }

    #[test]
    fn slerp_flat_matches_slerp() {
        let a = Quaternion::from_axis_angle(DVec3::Y, 0.4);
        let b = Quaternion::from_axis_angle(DVec3::new(0.0, 0.6, 0.8), 2.1);
        for t in [0.0, 0.25, 0.5, 0.9, 1.0] {
            let [x, y, z, w] = Quaternion::slerp_flat(a.to_array(), b.to_array(), t);
            assert_quat(Quaternion::new(x, y, z, w), a.slerp(b, t), 1e-10);
        }
        assert_eq!(Quaternion::slerp_flat(a.to_array(), a.to_array(), 0.3), a.to_array());
    }

    #[test]
    fn unit_vectors_and_angles() {
        let q = Quaternion::from_unit_vectors(DVec3::X, DVec3::Y);
        assert_quat(q, Quaternion::new(0.0, 0.0, FRAC_1_SQRT_2, FRAC_1_SQRT_2), 1e-12);
        assert_abs_diff_eq!(q.rotate_vector(DVec3::X), DVec3::Y, epsilon = 1e-12);

        let flip = Quaternion::from_unit_vectors(DVec3::Z, DVec3::NEG_Z);
        assert_abs_diff_eq!(flip.rotate_vector(DVec3::Z), DVec3::NEG_Z, epsilon = 1e-12);

        let a = Quaternion::IDENTITY;
        let b = Quaternion::from_euler(&Euler::new(0.0, PI, 0.0, RotationOrder::Zyx));
        let c = Quaternion::from_euler(&Euler::new(0.0, PI * 2.0, 0.0, RotationOrder::Zyx));
        assert_abs_diff_eq!(a.angle_to(&a), 0.0);
        assert_abs_diff_eq!(a.angle_to(&b), PI, epsilon = 1e-12);
        assert_abs_diff_eq!(a.angle_to(&c), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn rotate_towards_steps_and_clamps() {
        let a = Quaternion::IDENTITY;
        let b = Quaternion::from_euler(&Euler::new(0.0, PI, 0.0, RotationOrder::Zyx));

        assert_eq!(a.rotate_towards(a, 1.0), a);

        let half = a.rotate_towards(b, PI / 2.0);
        assert_abs_diff_eq!(a.angle_to(&half), PI / 2.0, epsilon = 1e-12);

        let past = a.rotate_towards(b, 2.0 * PI);
        assert!(same_rotation(past, b));
    }
}
