// Camera built on a target-tracking transform

use glam::{DMat4, DVec2, DVec3};
use serde::{Deserialize, Serialize};

use crate::change::{ChangeSet, Property};
use crate::config::{CameraData, CameraOptions};
use crate::error::{Result, RigError};
use crate::transform_target::TransformTarget;
use crate::ALMOST_ZERO;

/// World axis that points up in the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneUp {
    #[default]
    YUp,
    ZUp,
}

impl SceneUp {
    pub fn axis(self) -> DVec3 {
        match self {
            SceneUp::YUp => DVec3::Y,
            SceneUp::ZUp => DVec3::Z,
        }
    }
}

/// A camera: a [`TransformTarget`] plus lens parameters.
///
/// Camera space looks down `-z` with `+y` up. Mutators return the
/// [`ChangeSet`] of properties they touched; fallible ones change nothing
/// when they fail.
#[derive(Debug, Clone)]
pub struct Camera {
    transform: TransformTarget,
    orthographic: bool,
    aperture: f64,
    focal: f64,
    clip_min: f64,
    clip_max: f64,
    scene_up_direction: SceneUp,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

impl Camera {
    /// Perspective camera at the origin looking down `-z`, `+y` up.
    pub fn new() -> Self {
        Self::with_scene_up(SceneUp::YUp)
    }

    /// Default lens, framed for the given scene up axis.
    pub fn with_scene_up(scene_up: SceneUp) -> Self {
        let defaults = CameraOptions::default();
        let transform = match scene_up {
            SceneUp::YUp => TransformTarget::new(),
            SceneUp::ZUp => TransformTarget::z_up(),
        };
        Self {
            transform,
            orthographic: defaults.orthographic,
            aperture: defaults.aperture,
            focal: defaults.focal,
            clip_min: defaults.clip_min,
            clip_max: defaults.clip_max,
            scene_up_direction: scene_up,
        }
    }

    pub fn from_options(options: &CameraOptions) -> Result<Self> {
        let mut camera = Self::with_scene_up(options.scene_up_direction);
        camera.set_aperture(options.aperture)?;
        camera.focal = options.focal;
        camera.orthographic = options.orthographic;
        camera.clip_min = options.clip_min;
        camera.clip_max = options.clip_max;
        Ok(camera)
    }

    /// Copy every property of `other`.
    pub fn set_from_camera(&mut self, other: &Camera) -> ChangeSet {
        let changes = ChangeSet::new()
            .with(Property::TargetPoint)
            .with(Property::Transform)
            .with_if(self.aperture != other.aperture, Property::Aperture)
            .with_if(self.focal != other.focal, Property::Focal)
            .with_if(self.orthographic != other.orthographic, Property::Orthographic)
            .with_if(self.clip_max != other.clip_max, Property::ClipMax)
            .with_if(self.clip_min != other.clip_min, Property::ClipMin)
            .with_if(self.scene_up_direction != other.scene_up_direction, Property::UpDirection);
        *self = other.clone();
        changes
    }

    /// Apply the fields present in `data`.
    pub fn set_from_data(&mut self, data: &CameraData) -> Result<ChangeSet> {
        self.transact(|camera| {
            let mut changes = ChangeSet::new();
            if let Some(orthographic) = data.orthographic {
                changes.merge(camera.set_orthographic(orthographic));
            }
            if let Some(focal) = data.focal {
                changes.merge(camera.set_focal(focal));
            }
            if let Some(aperture) = data.aperture {
                changes.merge(camera.set_aperture(aperture)?);
            }
            if let Some(clip_max) = data.clip_max {
                changes.merge(camera.set_clip_max(clip_max));
            }
            if let Some(clip_min) = data.clip_min {
                changes.merge(camera.set_clip_min(clip_min));
            }
            if let Some(matrix) = data.transform {
                changes.merge(camera.set_matrix(matrix.into())?);
            }
            if let Some(scene_up) = data.scene_up_direction {
                changes.merge(camera.set_scene_up_direction(scene_up)?);
            }
            Ok(changes)
        })
    }

    /// The world-to-camera matrix.
    pub fn matrix(&self) -> DMat4 {
        self.transform.world_to_obj()
    }

    pub fn set_matrix(&mut self, matrix: DMat4) -> Result<ChangeSet> {
        self.transform.set_world_to_obj(matrix)?;
        Ok(ChangeSet::new().with(Property::Transform))
    }

    pub fn transform(&self) -> &TransformTarget {
        &self.transform
    }

    pub fn set_transform(&mut self, transform: TransformTarget) -> ChangeSet {
        self.transform = transform;
        ChangeSet::new().with(Property::TargetPoint).with(Property::Transform)
    }

    /// Move along the right and up vectors.
    pub fn pan(&mut self, horizontal: f64, vertical: f64, shift_target_point: bool) -> Result<ChangeSet> {
        self.transform.translate(horizontal, vertical, 0.0, true, shift_target_point)?;
        Ok(moved(shift_target_point))
    }

    /// Move along the view axis; positive `depth` backs away.
    ///
    /// An orthographic camera widens or narrows its aperture instead, and
    /// ignores a dolly that would leave the aperture at or below zero.
    pub fn dolly(&mut self, depth: f64, shift_target_point: bool) -> Result<ChangeSet> {
        if self.orthographic {
            if self.aperture + depth > 0.0 {
                return self.set_aperture(self.aperture + depth);
            }
            log::debug!("ignoring dolly of {depth} with aperture {}", self.aperture);
            return Ok(ChangeSet::new());
        }
        self.transform.translate(0.0, 0.0, depth, true, shift_target_point)?;
        Ok(moved(shift_target_point))
    }

    /// Move along the up vector, target included.
    pub fn elevate(&mut self, vertical: f64) -> Result<ChangeSet> {
        self.transform.translate(0.0, vertical, 0.0, true, true)?;
        Ok(moved(true))
    }

    /// Orbit the target point about the scene up (`vertical`) and the right
    /// vector (`horizontal`), retargeting to `orbit_point` first if given.
    pub fn orbit(&mut self, vertical: f64, horizontal: f64, orbit_point: Option<DVec3>) -> Result<ChangeSet> {
        self.transact(|camera| {
            if let Some(point) = orbit_point {
                camera.transform.set_target_point(point, false)?;
            }
            camera.transform.orbit_around_target_point(horizontal, vertical, 0.0, true)?;
            Ok(moved(orbit_point.is_some()))
        })
    }

    /// Orbit an arbitrary point; the target moves only with `shift_target_point`.
    pub fn orbit_around_point(
        &mut self,
        point: DVec3,
        vertical: f64,
        horizontal: f64,
        shift_target_point: bool,
    ) -> Result<ChangeSet> {
        self.transform
            .rotate_around_point(point, horizontal, vertical, 0.0, shift_target_point, true)?;
        Ok(moved(shift_target_point))
    }

    /// Rotate about the up (`vertical`), right (`horizontal`) and view (`direction`) vectors.
    pub fn rotate(&mut self, vertical: f64, horizontal: f64, direction: f64, shift_target_point: bool) -> ChangeSet {
        let direction = if direction.is_nan() { 0.0 } else { direction };
        self.transform.rotate(horizontal, vertical, direction, shift_target_point);
        moved(shift_target_point)
    }

    /// Rotate about the right vector.
    pub fn tilt(&mut self, horizontal: f64, shift_target_point: bool) -> ChangeSet {
        self.transform.rotate(horizontal, 0.0, 0.0, shift_target_point);
        moved(shift_target_point)
    }

    /// Rotate about the up vector.
    pub fn spin(&mut self, vertical: f64, shift_target_point: bool) -> ChangeSet {
        self.transform.rotate(0.0, vertical, 0.0, shift_target_point);
        moved(shift_target_point)
    }

    pub fn rotate_around_axis(
        &mut self,
        axis: DVec3,
        angle: f64,
        in_camera_space: bool,
        shift_target_point: bool,
    ) -> Result<ChangeSet> {
        self.transform
            .rotate_around_axis(axis, angle, in_camera_space, shift_target_point)?;
        Ok(moved(shift_target_point))
    }

    pub fn set_location(&mut self, location: DVec3, shift_target_point: bool) -> Result<ChangeSet> {
        self.transform.set_translation(location, shift_target_point)?;
        Ok(moved(shift_target_point))
    }

    /// Move by a world-space vector.
    pub fn translate(&mut self, offset: DVec3, shift_target_point: bool) -> Result<ChangeSet> {
        self.transform
            .translate(offset.x, offset.y, offset.z, false, shift_target_point)?;
        Ok(moved(shift_target_point))
    }

    /// Pitch the view back to the horizon of the scene.
    pub fn level_camera(&mut self) -> ChangeSet {
        let up = self.scene_up_direction.axis();
        let angle = self.direction().dot(up).clamp(-1.0, 1.0).asin();
        self.transform.rotate(-angle, 0.0, 0.0, true);
        moved(true)
    }

    /// World point into camera space.
    pub fn transform_point(&self, point: DVec3) -> DVec3 {
        self.matrix().transform_point3(point)
    }

    /// World direction into camera space.
    pub fn transform_direction(&self, direction: DVec3) -> DVec3 {
        self.matrix().transform_vector3(direction)
    }

    /// Camera-space direction into world space.
    pub fn transform_direction_to_world(&self, direction: DVec3) -> DVec3 {
        self.transform.obj_to_world().transform_vector3(direction)
    }

    /// World point onto the image plane.
    ///
    /// Perspective cameras divide x and y by `-z / focal`; z stays the
    /// camera-space depth.
    pub fn project_point(&self, point: DVec3) -> DVec3 {
        let mut p = self.transform_point(point);
        if !self.orthographic {
            let scale = -p.z / self.focal;
            p.x /= scale;
            p.y /= scale;
        }
        p
    }

    /// World point into pixels, origin at the bottom left, z the camera-space depth.
    ///
    /// The aperture spans the image width. `pixel_aspect_ratio` defaults to 1.
    pub fn project_point_to_pixel(
        &self,
        point: DVec3,
        resolution: DVec2,
        pixel_aspect_ratio: Option<f64>,
    ) -> DVec3 {
        let p = self.project_point(point);
        let image_aspect = resolution.x * pixel_aspect_ratio.unwrap_or(1.0) / resolution.y;
        let width = self.aperture;
        let height = self.aperture / image_aspect;
        DVec3::new(
            (p.x / width + 0.5) * resolution.x,
            (p.y / height + 0.5) * resolution.y,
            p.z,
        )
    }

    /// Right-handed clip-space projection for a viewport of `aspect` (width / height).
    pub fn projection_matrix(&self, aspect: f64) -> Result<DMat4> {
        if !(aspect.is_finite() && aspect > 0.0) {
            return Err(RigError::InvalidAspectRatio(aspect));
        }
        let (near, far) = (self.clip_min, self.clip_max);
        let invalid = || RigError::InvalidClipRange { min: near, max: far };
        if !(near.is_finite() && far.is_finite() && near < far) {
            return Err(invalid());
        }

        if self.orthographic {
            let half_width = self.aperture / 2.0;
            let half_height = half_width / aspect;
            Ok(DMat4::orthographic_rh(
                -half_width,
                half_width,
                -half_height,
                half_height,
                near,
                far,
            ))
        } else {
            if near <= 0.0 {
                return Err(invalid());
            }
            let fov_y = 2.0 * (self.aperture / (2.0 * self.focal * aspect)).atan();
            Ok(DMat4::perspective_rh(fov_y, aspect, near, far))
        }
    }

    /// Same lens and, within [`ALMOST_ZERO`], the same matrix.
    pub fn equal(&self, rhs: &Camera) -> bool {
        self.aperture == rhs.aperture
            && self.focal == rhs.focal
            && self.field_of_view() == rhs.field_of_view()
            && self.matrix().abs_diff_eq(rhs.matrix(), ALMOST_ZERO)
    }

    pub fn orthographic(&self) -> bool {
        self.orthographic
    }

    pub fn set_orthographic(&mut self, orthographic: bool) -> ChangeSet {
        let changed = self.orthographic != orthographic;
        self.orthographic = orthographic;
        ChangeSet::new().with_if(changed, Property::Orthographic)
    }

    /// Half the horizontal view angle, or -1 for an orthographic camera.
    pub fn field_of_view(&self) -> f64 {
        if self.orthographic {
            -1.0
        } else {
            (self.aperture / 2.0).atan2(self.focal)
        }
    }

    /// Set the aperture from a half view angle; ignored when orthographic.
    pub fn set_field_of_view(&mut self, field_of_view: f64) -> Result<ChangeSet> {
        if self.orthographic {
            return Ok(ChangeSet::new());
        }
        self.set_aperture(self.focal * field_of_view.tan() * 2.0)
    }

    pub fn aperture(&self) -> f64 {
        self.aperture
    }

    /// Set the aperture; the sign is dropped, zero and non-finite values are rejected.
    pub fn set_aperture(&mut self, aperture: f64) -> Result<ChangeSet> {
        let aperture = aperture.abs();
        if aperture == 0.0 || !aperture.is_finite() {
            log::debug!("rejecting aperture {aperture}");
            return Err(RigError::InvalidAperture(aperture));
        }
        let changed = self.aperture != aperture;
        self.aperture = aperture;
        Ok(ChangeSet::new().with_if(changed, Property::Aperture))
    }

    pub fn focal(&self) -> f64 {
        self.focal
    }

    pub fn set_focal(&mut self, focal: f64) -> ChangeSet {
        let changed = self.focal != focal;
        self.focal = focal;
        ChangeSet::new().with_if(changed, Property::Focal)
    }

    pub fn clip_min(&self) -> f64 {
        self.clip_min
    }

    pub fn set_clip_min(&mut self, clip_min: f64) -> ChangeSet {
        let changed = self.clip_min != clip_min;
        self.clip_min = clip_min;
        ChangeSet::new().with_if(changed, Property::ClipMin)
    }

    pub fn clip_max(&self) -> f64 {
        self.clip_max
    }

    pub fn set_clip_max(&mut self, clip_max: f64) -> ChangeSet {
        let changed = self.clip_max != clip_max;
        self.clip_max = clip_max;
        ChangeSet::new().with_if(changed, Property::ClipMax)
    }

    pub fn target_point(&self) -> DVec3 {
        self.transform.target_point()
    }

    /// Retarget; `reset_up_vector` drops any roll.
    pub fn set_target_point(&mut self, target_point: DVec3, reset_up_vector: bool) -> Result<ChangeSet> {
        let moved_target = self.transform.set_target_point(target_point, reset_up_vector)?;
        Ok(if moved_target { moved(true) } else { ChangeSet::new() })
    }

    /// View direction, `-z` of the camera frame.
    pub fn direction(&self) -> DVec3 {
        -self.transform.z_axis()
    }

    pub fn up(&self) -> DVec3 {
        self.transform.y_axis()
    }

    pub fn right(&self) -> DVec3 {
        self.transform.x_axis()
    }

    pub fn location(&self) -> DVec3 {
        self.transform.translation()
    }

    pub fn scene_up_direction(&self) -> SceneUp {
        self.scene_up_direction
    }

    /// Switch the scene up axis, re-levelling the frame and keeping its roll.
    ///
    /// Fails with [`RigError::DegenerateUpVector`] while the view is parallel
    /// to the new axis, as it is for [`Camera::new`] switching to Z up. Build
    /// such a camera with [`Camera::with_scene_up`] instead.
    pub fn set_scene_up_direction(&mut self, scene_up: SceneUp) -> Result<ChangeSet> {
        if self.scene_up_direction == scene_up {
            return Ok(ChangeSet::new());
        }
        self.transform.set_up_direction(scene_up.axis())?;
        self.scene_up_direction = scene_up;
        Ok(ChangeSet::new().with(Property::UpDirection).with(Property::Transform))
    }

    pub fn follow_target_point(&self) -> bool {
        self.transform.follow_target_point()
    }

    pub fn set_follow_target_point(&mut self, follow: bool) -> Result<ChangeSet> {
        if self.follow_target_point() == follow {
            return Ok(ChangeSet::new());
        }
        self.transform.set_follow_target_point(follow)?;
        Ok(ChangeSet::new().with_if(follow, Property::Transform))
    }

    fn transact<R>(&mut self, op: impl FnOnce(&mut Self) -> Result<R>) -> Result<R> {
        let mut next = self.clone();
        let out = op(&mut next)?;
        *self = next;
        Ok(out)
    }
}

/// Changes for a move of the frame, with the target when it moved too.
fn moved(target_point: bool) -> ChangeSet {
    ChangeSet::new()
        .with_if(target_point, Property::TargetPoint)
        .with(Property::Transform)
}
