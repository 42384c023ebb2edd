// Rigid transforms with a lazily derived world-to-object matrix

use std::cell::Cell;

use glam::{DMat3, DMat4, DVec3, DVec4};

use crate::error::{Result, RigError};
use crate::quaternion::Quaternion;

/// Right-handed rotation of `angle` radians about `axis`.
pub(crate) fn axis_rotation(axis: DVec3, angle: f64) -> DMat3 {
    DMat3::from_axis_angle(axis.normalize(), angle)
}

/// Which of the frame axes a partial rotation carries along.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Axes {
    x: bool,
    y: bool,
    z: bool,
}

impl Axes {
    pub(crate) const ALL: Axes = Axes { x: true, y: true, z: true };
    /// Everything but the x axis: a rotation about x.
    pub(crate) const YZ: Axes = Axes { x: false, y: true, z: true };
    pub(crate) const XZ: Axes = Axes { x: true, y: false, z: true };
    pub(crate) const XY: Axes = Axes { x: true, y: true, z: false };
}

/// Placement of an object: translation, orthonormal frame and scale.
///
/// The frame axes and scale are the stored state; the world-to-object matrix
/// is derived from them on demand and memoised until the next mutation.
/// Assigning a matrix decomposes it and keeps the assigned value as the
/// memoised matrix.
#[derive(Debug, Clone)]
pub struct Transform {
    translation: DVec3,
    x_axis: DVec3,
    y_axis: DVec3,
    z_axis: DVec3,
    scale: DVec3,
    world_to_obj: Cell<Option<DMat4>>,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    /// Create an identity transform
    pub fn identity() -> Self {
        Self {
            translation: DVec3::ZERO,
            x_axis: DVec3::X,
            y_axis: DVec3::Y,
            z_axis: DVec3::Z,
            scale: DVec3::ONE,
            world_to_obj: Cell::new(Some(DMat4::IDENTITY)),
        }
    }

    /// Create a transform from an assigned world-to-object matrix.
    pub fn from_world_to_obj(m: DMat4) -> Result<Self> {
        let mut transform = Self::identity();
        transform.set_world_to_obj(m)?;
        Ok(transform)
    }

    pub fn translation(&self) -> DVec3 {
        self.translation
    }

    pub fn set_translation(&mut self, translation: DVec3) {
        self.translation = translation;
        self.invalidate();
    }

    pub fn x_axis(&self) -> DVec3 {
        self.x_axis
    }

    pub fn y_axis(&self) -> DVec3 {
        self.y_axis
    }

    pub fn z_axis(&self) -> DVec3 {
        self.z_axis
    }

    pub fn scale(&self) -> DVec3 {
        self.scale
    }

    /// Replace the scale. Every component must be finite and non-zero.
    pub fn set_scale(&mut self, scale: DVec3) -> Result<()> {
        check_scale(scale)?;
        self.scale = scale;
        self.invalidate();
        Ok(())
    }

    /// Multiply the current scale component-wise.
    pub fn multiply_scale(&mut self, scale: DVec3) -> Result<()> {
        self.set_scale(self.scale * scale)
    }

    /// The frame as a quaternion.
    pub fn rotation(&self) -> Quaternion {
        Quaternion::from_matrix(&DMat4::from_cols(
            self.x_axis.extend(0.0),
            self.y_axis.extend(0.0),
            self.z_axis.extend(0.0),
            DVec4::W,
        ))
    }

    /// Rebuild the frame by rotating the canonical basis with `q`.
    pub fn set_rotation_quaternion(&mut self, q: &Quaternion) {
        self.x_axis = q.rotate_vector(DVec3::X);
        self.y_axis = q.rotate_vector(DVec3::Y);
        self.z_axis = q.rotate_vector(DVec3::Z);
        self.invalidate();
    }

    /// The cached world-to-object matrix, rebuilt if stale.
    pub fn world_to_obj(&self) -> DMat4 {
        match self.world_to_obj.get() {
            Some(m) => m,
            None => {
                let m = self.derive_world_to_obj();
                self.world_to_obj.set(Some(m));
                m
            }
        }
    }

    /// Assign the world-to-object matrix and decompose it into translation, frame and scale.
    pub fn set_world_to_obj(&mut self, m: DMat4) -> Result<()> {
        let det = m.determinant();
        if det == 0.0 || !det.is_finite() {
            log::debug!("rejecting singular world_to_obj {m:?}");
            return Err(RigError::SingularMatrix);
        }

        let inv = m.inverse();
        let x = inv.transform_vector3(DVec3::X);
        let y = inv.transform_vector3(DVec3::Y);
        let z = inv.transform_vector3(DVec3::Z);
        let scale = DVec3::new(x.length(), y.length(), z.length());
        check_scale(scale)?;

        self.translation = inv.transform_point3(DVec3::ZERO);
        self.x_axis = x / scale.x;
        self.y_axis = y / scale.y;
        self.z_axis = z / scale.z;
        self.scale = scale;
        self.world_to_obj.set(Some(m));
        Ok(())
    }

    /// Inverse of [`Self::world_to_obj`].
    pub fn obj_to_world(&self) -> DMat4 {
        self.world_to_obj().inverse()
    }

    /// Move by `(dx, dy, dz)`, along the frame axes when `in_object_space`.
    pub fn translate(&mut self, dx: f64, dy: f64, dz: f64, in_object_space: bool) {
        self.translation += self.offset(dx, dy, dz, in_object_space);
        self.invalidate();
    }

    /// Incremental rotation: roll `dz` about z, then `dy` about the updated y,
    /// then `dx` about the updated x.
    pub fn rotate(&mut self, dx: f64, dy: f64, dz: f64) {
        self.rotate_axes(self.z_axis, dz, Axes::XY, &mut []);
        self.rotate_axes(self.y_axis, dy, Axes::XZ, &mut []);
        self.rotate_axes(self.x_axis, dx, Axes::YZ, &mut []);
    }

    /// Reset to the canonical basis, then [`Self::rotate`].
    pub fn set_rotation(&mut self, dx: f64, dy: f64, dz: f64) {
        self.reset_axes();
        self.rotate(dx, dy, dz);
    }

    /// Rotate the frame about `axis`, given in world or object space.
    pub fn rotate_around_axis(&mut self, axis: DVec3, angle: f64, in_object_space: bool) {
        let axis = if in_object_space {
            self.world_to_obj().transpose().transform_vector3(axis)
        } else {
            axis
        };
        self.rotate_axes(axis, angle, Axes::ALL, &mut []);
    }

    /// Reset to the canonical basis, then rotate about a world axis.
    pub fn set_rotation_around_axis(&mut self, axis: DVec3, angle: f64) {
        self.reset_axes();
        self.rotate_around_axis(axis, angle, false);
    }

    /// Like [`Self::rotate`], with the translation orbiting `point`.
    pub fn rotate_around_point(&mut self, point: DVec3, dx: f64, dy: f64, dz: f64) {
        let mut to_point = [self.translation - point];
        self.rotate_axes(self.z_axis, dz, Axes::XY, &mut []);
        self.rotate_axes(self.y_axis, dy, Axes::XZ, &mut to_point);
        self.rotate_axes(self.x_axis, dx, Axes::YZ, &mut to_point);
        self.set_translation(point + to_point[0]);
    }

    /// World-space displacement for a move of `(dx, dy, dz)`.
    pub(crate) fn offset(&self, dx: f64, dy: f64, dz: f64, in_object_space: bool) -> DVec3 {
        if in_object_space {
            self.x_axis * dx + self.y_axis * dy + self.z_axis * dz
        } else {
            DVec3::new(dx, dy, dz)
        }
    }

    /// Rotate the selected frame axes, and every vector in `extra`, about `axis`.
    pub(crate) fn rotate_axes(&mut self, axis: DVec3, angle: f64, axes: Axes, extra: &mut [DVec3]) {
        let r = axis_rotation(axis, angle);
        if axes.x {
            self.x_axis = r * self.x_axis;
        }
        if axes.y {
            self.y_axis = r * self.y_axis;
        }
        if axes.z {
            self.z_axis = r * self.z_axis;
        }
        for v in extra.iter_mut() {
            *v = r * *v;
        }
        self.invalidate();
    }

    pub(crate) fn set_axes(&mut self, x_axis: DVec3, y_axis: DVec3, z_axis: DVec3) {
        self.x_axis = x_axis;
        self.y_axis = y_axis;
        self.z_axis = z_axis;
        self.invalidate();
    }

    pub(crate) fn reset_axes(&mut self) {
        self.set_axes(DVec3::X, DVec3::Y, DVec3::Z);
    }

    fn invalidate(&mut self) {
        self.world_to_obj.set(None);
    }

    /// Axes become the rows of the upper 3x3 (a change of basis into the
    /// frame); each row and its translation term is divided by its scale.
    fn derive_world_to_obj(&self) -> DMat4 {
        let rx = self.x_axis / self.scale.x;
        let ry = self.y_axis / self.scale.y;
        let rz = self.z_axis / self.scale.z;
        let t = self.translation;

        DMat4::from_cols(
            DVec4::new(rx.x, ry.x, rz.x, 0.0),
            DVec4::new(rx.y, ry.y, rz.y, 0.0),
            DVec4::new(rx.z, ry.z, rz.z, 0.0),
            DVec4::new(-t.dot(rx), -t.dot(ry), -t.dot(rz), 1.0),
        )
    }
}

fn check_scale(scale: DVec3) -> Result<()> {
    if scale.is_finite() && scale.cmpne(DVec3::ZERO).all() {
        Ok(())
    } else {
        log::debug!("rejecting scale {scale:?}");
        Err(RigError::DegenerateScale { scale: scale.to_array() })
    }
}
