// GPU-ready camera block

use glam::{Mat4, Vec3};

use crate::camera::Camera;
use crate::error::Result;

/// Camera state laid out for a uniform buffer.
///
/// Matrices are column-major. The vec3 fields are each followed by a scalar so
/// the block packs without padding under std140.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub location: [f32; 3],
    pub aperture: f32,
    pub direction: [f32; 3],
    pub focal: f32,
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraUniform {
    pub fn new() -> Self {
        Self {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            view: Mat4::IDENTITY.to_cols_array_2d(),
            location: Vec3::ZERO.to_array(),
            aperture: 0.0,
            direction: Vec3::NEG_Z.to_array(),
            focal: 0.0,
        }
    }

    pub fn from_camera(camera: &Camera, aspect: f64) -> Result<Self> {
        let mut uniform = Self::new();
        uniform.update(camera, aspect)?;
        Ok(uniform)
    }

    /// Refresh from `camera` for a viewport of `aspect`; untouched on error.
    pub fn update(&mut self, camera: &Camera, aspect: f64) -> Result<()> {
        let proj = camera.projection_matrix(aspect)?;
        let view = camera.matrix();
        self.view_proj = (proj * view).as_mat4().to_cols_array_2d();
        self.view = view.as_mat4().to_cols_array_2d();
        self.location = camera.location().as_vec3().to_array();
        self.aperture = camera.aperture() as f32;
        self.direction = camera.direction().as_vec3().to_array();
        self.focal = camera.focal() as f32;
        Ok(())
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RigError;
    use approx::assert_abs_diff_eq;
    use glam::{DVec3, Vec4};

    #[test]
    fn packs_without_padding() {
        assert_eq!(std::mem::size_of::<CameraUniform>(), 160);
        let blocks = [CameraUniform::new(); 2];
        let bytes: &[u8] = bytemuck::cast_slice(&blocks);
        assert_eq!(bytes.len(), 320);
        assert_eq!(CameraUniform::new().as_bytes().len(), 160);
    }

    #[test]
    fn starts_at_identity() {
        let uniform = CameraUniform::default();
        assert_eq!(uniform.view_proj, Mat4::IDENTITY.to_cols_array_2d());
        assert_eq!(uniform.direction, [0.0, 0.0, -1.0]);
    }

    #[test]
    fn follows_the_camera() {
        let mut camera = Camera::new();
        camera.set_location(DVec3::new(0.0, 0.0, 10.0), false).unwrap();
        camera.set_target_point(DVec3::ZERO, true).unwrap();

        let uniform = CameraUniform::from_camera(&camera, 2.0).unwrap();
        assert_eq!(uniform.location, [0.0, 0.0, 10.0]);
        assert_eq!(uniform.aperture, 100.0);
        assert_eq!(uniform.focal, 50.0);
        assert_abs_diff_eq!(Vec3::from(uniform.direction), Vec3::NEG_Z, epsilon = 1e-6);

        // The aperture edge on the target plane maps to the right clip edge.
        let clip = Mat4::from_cols_array_2d(&uniform.view_proj) * Vec4::new(10.0, 0.0, 0.0, 1.0);
        assert_abs_diff_eq!(clip.x / clip.w, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn bad_aspect_leaves_block_untouched() {
        let camera = Camera::new();
        let mut uniform = CameraUniform::new();
        let err = uniform.update(&camera, -1.0).unwrap_err();
        assert!(matches!(err, RigError::InvalidAspectRatio(_)));
        assert_eq!(uniform, CameraUniform::new());
    }
}
