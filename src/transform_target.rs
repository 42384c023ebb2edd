// Transforms that track a target point

use glam::{DMat4, DVec3};

use crate::error::{Result, RigError};
use crate::quaternion::Quaternion;
use crate::transform::{Axes, Transform};
use crate::ALMOST_ZERO;

/// Below this squared length, `up x z` is treated as parallel.
const PARALLEL_EPSILON: f64 = 1e-12;

/// A [`Transform`] with a target point and a nominal up direction.
///
/// While following, the local `-z` axis points from the translation toward
/// the target point after every mutation, and the frame is determined by
/// translation, target, up direction and roll. The target point never
/// coincides with the translation.
///
/// Fallible mutations are transactional: on error nothing changes.
#[derive(Debug, Clone)]
pub struct TransformTarget {
    transform: Transform,
    target_point: DVec3,
    up_direction: DVec3,
    follow_target_point: bool,
}

impl Default for TransformTarget {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformTarget {
    /// Identity frame looking down `-z` at `(0, 0, -1)`, `+y` up, following.
    pub fn new() -> Self {
        Self {
            transform: Transform::identity(),
            target_point: DVec3::NEG_Z,
            up_direction: DVec3::Y,
            follow_target_point: true,
        }
    }

    /// A frame at the origin for a scene whose up axis is `up`.
    ///
    /// The target starts one unit ahead: `-z`, or `+y` when `up` is mostly along z.
    pub fn with_up_direction(up: DVec3) -> Result<Self> {
        let mut target = Self::new();
        target.up_direction = up;
        if up.normalize().z.abs() > std::f64::consts::FRAC_1_SQRT_2 {
            target.target_point = DVec3::Y;
        }
        target.look_at_target_point(true)?;
        Ok(target)
    }

    /// The `+z` up frame: looking along `+y` with `+x` to the right.
    pub fn z_up() -> Self {
        let mut target = Self::new();
        target.up_direction = DVec3::Z;
        target.target_point = DVec3::Y;
        target.transform.set_axes(DVec3::X, DVec3::Z, DVec3::NEG_Y);
        target
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn translation(&self) -> DVec3 {
        self.transform.translation()
    }

    pub fn x_axis(&self) -> DVec3 {
        self.transform.x_axis()
    }

    pub fn y_axis(&self) -> DVec3 {
        self.transform.y_axis()
    }

    pub fn z_axis(&self) -> DVec3 {
        self.transform.z_axis()
    }

    pub fn scale(&self) -> DVec3 {
        self.transform.scale()
    }

    pub fn set_scale(&mut self, scale: DVec3) -> Result<()> {
        self.transform.set_scale(scale)
    }

    pub fn multiply_scale(&mut self, scale: DVec3) -> Result<()> {
        self.transform.multiply_scale(scale)
    }

    pub fn rotation(&self) -> Quaternion {
        self.transform.rotation()
    }

    pub fn world_to_obj(&self) -> DMat4 {
        self.transform.world_to_obj()
    }

    pub fn obj_to_world(&self) -> DMat4 {
        self.transform.obj_to_world()
    }

    pub fn target_point(&self) -> DVec3 {
        self.target_point
    }

    pub fn up_direction(&self) -> DVec3 {
        self.up_direction
    }

    pub fn follow_target_point(&self) -> bool {
        self.follow_target_point
    }

    /// Assign the matrix; the target keeps its distance along the new view direction.
    pub fn set_world_to_obj(&mut self, m: DMat4) -> Result<()> {
        let distance = self.target_distance();
        self.transform.set_world_to_obj(m)?;
        self.update_target_point(Some(distance));
        Ok(())
    }

    /// Change the nominal up direction, keeping the current roll.
    pub fn set_up_direction(&mut self, up: DVec3) -> Result<()> {
        self.transact(|t| {
            let roll = t.roll_angle();
            t.up_direction = up;
            let look_at = if t.follow_target_point {
                t.target_point
            } else {
                t.translation() - t.z_axis()
            };
            t.look_at_point(look_at, up, None)?;
            if roll != 0.0 {
                t.rotate(0.0, 0.0, roll, false);
            }
            Ok(())
        })
    }

    /// Start or stop following; switching on looks at the target, keeping roll.
    pub fn set_follow_target_point(&mut self, follow: bool) -> Result<()> {
        self.transact(|t| {
            t.follow_target_point = follow;
            if follow {
                t.look_at_target_point(false)?;
            }
            Ok(())
        })
    }

    /// Move the target point.
    ///
    /// Returns `Ok(false)` without touching anything when `point` is already
    /// the target (within [`ALMOST_ZERO`]). While following, the frame looks
    /// at the new target, dropping the roll when `reset_roll` is set.
    pub fn set_target_point(&mut self, point: DVec3, reset_roll: bool) -> Result<bool> {
        if point == self.translation() {
            log::warn!("target point {point} is equal to translation");
            return Err(RigError::TargetEqualsTranslation);
        }
        if point.abs_diff_eq(self.target_point, ALMOST_ZERO) {
            return Ok(false);
        }
        self.transact(|t| {
            t.target_point = point;
            if t.follow_target_point {
                t.look_at_target_point(reset_roll)?;
            }
            Ok(true)
        })
    }

    /// Move the target point by `(dx, dy, dz)`, along the frame axes when `in_object_space`.
    pub fn translate_target_point(&mut self, dx: f64, dy: f64, dz: f64, in_object_space: bool) -> Result<()> {
        self.transact(|t| {
            t.target_point += t.transform.offset(dx, dy, dz, in_object_space);
            t.ensure_target_clear()?;
            if t.follow_target_point {
                t.look_at_target_point(false)?;
            }
            Ok(())
        })
    }

    /// Move the translation, and the target with it when `translate_target`.
    pub fn translate(
        &mut self,
        dx: f64,
        dy: f64,
        dz: f64,
        in_object_space: bool,
        translate_target: bool,
    ) -> Result<()> {
        self.transact(|t| {
            t.transform.translate(dx, dy, dz, in_object_space);
            if translate_target {
                t.translate_target_point(dx, dy, dz, in_object_space)
            } else {
                t.ensure_target_clear()?;
                if t.follow_target_point {
                    t.look_at_target_point(false)?;
                }
                Ok(())
            }
        })
    }

    /// Place the translation, dragging the target along when `translate_target`.
    pub fn set_translation(&mut self, translation: DVec3, translate_target: bool) -> Result<()> {
        self.transact(|t| {
            let delta = translation - t.translation();
            t.transform.set_translation(translation);
            if translate_target {
                t.translate_target_point(delta.x, delta.y, delta.z, false)
            } else {
                t.ensure_target_clear()?;
                if t.follow_target_point {
                    t.look_at_target_point(false)?;
                }
                Ok(())
            }
        })
    }

    /// Incremental rotation.
    ///
    /// Roll `dz` is always applied (with the sign opposite to
    /// [`Transform::rotate`]). Yaw `dy` about the up direction and pitch `dx`
    /// about local x are applied when `rotate_target_point` is set or the frame
    /// is not following; a following frame without it only rolls. With
    /// `rotate_target_point` the target is placed along the new view direction
    /// at its previous distance.
    pub fn rotate(&mut self, dx: f64, dy: f64, dz: f64, rotate_target_point: bool) {
        self.transform.rotate_axes(self.z_axis(), -dz, Axes::XY, &mut []);
        if rotate_target_point || !self.follow_target_point {
            self.transform.rotate_axes(self.up_direction, dy, Axes::ALL, &mut []);
            self.transform.rotate_axes(self.x_axis(), dx, Axes::YZ, &mut []);
        }
        if rotate_target_point {
            self.update_target_point(None);
        }
    }

    /// Absolute rotation from the canonical basis.
    ///
    /// A following frame that keeps its target cannot change where it looks;
    /// it only takes the roll `dz` relative to the no-roll frame.
    pub fn set_rotation(&mut self, dx: f64, dy: f64, dz: f64, rotate_target_point: bool) -> Result<()> {
        self.transact(|t| {
            if rotate_target_point || !t.follow_target_point {
                t.transform.reset_axes();
                t.rotate(dx, dy, dz, rotate_target_point);
            } else {
                t.look_at_target_point(true)?;
                t.rotate(0.0, 0.0, dz, false);
            }
            Ok(())
        })
    }

    /// Rotate about `axis`, given in world or object space.
    pub fn rotate_around_axis(
        &mut self,
        axis: DVec3,
        angle: f64,
        in_object_space: bool,
        rotate_target_point: bool,
    ) -> Result<()> {
        self.transact(|t| {
            t.transform.rotate_around_axis(axis, angle, in_object_space);
            t.after_free_rotation(rotate_target_point)
        })
    }

    /// Reset to the canonical basis, then rotate about a world axis.
    pub fn set_rotation_around_axis(&mut self, axis: DVec3, angle: f64, rotate_target_point: bool) -> Result<()> {
        self.transact(|t| {
            t.transform.set_rotation_around_axis(axis, angle);
            t.after_free_rotation(rotate_target_point)
        })
    }

    /// Rotate about a world point, optionally dragging the target along.
    ///
    /// With `maintain_up` the yaw turns about the nominal up direction, which
    /// keeps the horizon level; otherwise about the current local y. A
    /// `point` on the target never drags the target.
    pub fn rotate_around_point(
        &mut self,
        point: DVec3,
        dx: f64,
        dy: f64,
        dz: f64,
        rotate_target_point: bool,
        maintain_up: bool,
    ) -> Result<()> {
        self.transact(|t| {
            let rotate_target_point =
                rotate_target_point && !point.abs_diff_eq(t.target_point, ALMOST_ZERO);

            let mut carried = [t.translation() - point, t.target_point - point];
            let carried = if rotate_target_point {
                &mut carried[..]
            } else {
                &mut carried[..1]
            };

            t.transform.rotate_axes(t.z_axis(), -dz, Axes::XY, &mut []);
            let yaw_axis = if maintain_up { t.up_direction } else { t.y_axis() };
            t.transform.rotate_axes(yaw_axis, dy, Axes::ALL, carried);
            t.transform.rotate_axes(t.x_axis(), dx, Axes::YZ, carried);

            t.transform.set_translation(point + carried[0]);
            if rotate_target_point {
                t.target_point = point + carried[1];
            } else {
                t.ensure_target_clear()?;
                if t.follow_target_point {
                    t.look_at_target_point(false)?;
                }
            }
            Ok(())
        })
    }

    /// Orbit the target point, leaving it in place.
    pub fn orbit_around_target_point(&mut self, dx: f64, dy: f64, dz: f64, maintain_up: bool) -> Result<()> {
        self.rotate_around_point(self.target_point, dx, dy, dz, false, maintain_up)
    }

    /// Look at the target point, keeping the current roll unless `reset_roll`.
    pub fn look_at_target_point(&mut self, reset_roll: bool) -> Result<()> {
        self.transact(|t| {
            if reset_roll {
                return t.look_at_point(t.target_point, t.up_direction, None);
            }
            let roll = t.roll_angle();
            t.look_at_point(t.target_point, t.up_direction, None)?;
            if roll != 0.0 {
                t.rotate(0.0, 0.0, roll, false);
            }
            Ok(())
        })
    }

    /// Put the target on the view axis at `distance`, or at its current
    /// distance when `None` or zero.
    pub fn update_target_point(&mut self, distance: Option<f64>) {
        let distance = match distance {
            Some(d) if d != 0.0 => d,
            _ => self.target_distance(),
        };
        self.target_point = self.translation() + self.z_axis() * -distance;
    }

    /// Signed angle between local x and the no-roll x axis `up x z`.
    ///
    /// Degenerate frames report zero.
    pub fn roll_angle(&self) -> f64 {
        let x_axis = self.x_axis();
        let no_roll_right = self.up_direction.cross(self.z_axis()).normalize();
        let mut roll = x_axis.dot(no_roll_right).clamp(-1.0, 1.0).acos();
        if self.up_direction.dot(x_axis) > 0.0 {
            roll = -roll;
        }
        if roll.is_nan() {
            0.0
        } else {
            roll
        }
    }

    /// Build the frame looking from the translation (or `location`) at `point`.
    fn look_at_point(&mut self, point: DVec3, up: DVec3, location: Option<DVec3>) -> Result<()> {
        if let Some(location) = location {
            self.transform.set_translation(location);
        }
        let y_axis = up.normalize();
        let z_axis = (self.translation() - point).normalize();
        let x_axis = y_axis.cross(z_axis);
        // NaN fails this comparison as well.
        if !(x_axis.length_squared() > PARALLEL_EPSILON) {
            log::debug!("up {up} is parallel to the look direction toward {point}");
            return Err(RigError::DegenerateUpVector);
        }
        let x_axis = x_axis.normalize();
        let y_axis = z_axis.cross(x_axis).normalize();
        self.transform.set_axes(x_axis, y_axis, z_axis);
        Ok(())
    }

    fn after_free_rotation(&mut self, rotate_target_point: bool) -> Result<()> {
        if rotate_target_point {
            self.update_target_point(None);
            Ok(())
        } else if self.follow_target_point {
            self.look_at_target_point(false)
        } else {
            Ok(())
        }
    }

    fn target_distance(&self) -> f64 {
        self.translation().distance(self.target_point)
    }

    fn ensure_target_clear(&self) -> Result<()> {
        if self.target_point == self.translation() {
            log::warn!("target point {} is equal to translation", self.target_point);
            Err(RigError::TargetEqualsTranslation)
        } else {
            Ok(())
        }
    }

    fn transact<R>(&mut self, op: impl FnOnce(&mut Self) -> Result<R>) -> Result<R> {
        let mut next = self.clone();
        let out = op(&mut next)?;
        *self = next;
        Ok(out)
    }
}
