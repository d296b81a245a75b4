/// Camera modes and projection utilities
use nalgebra::{Matrix4, Point3, Vector3};

use crate::config::CameraConfig;
use crate::transform::{look_at, multiply, perspective};

/// How the view matrix is derived each frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraMode {
    /// Looking straight down at the table before the shot
    Fixed,
    /// Trailing the cue ball while it rolls
    Follow,
    /// Straight down again once a ball is pocketed
    Overhead,
}

/// Camera configuration for 3D rendering
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub mode: CameraMode,
    pub eye: Point3<f32>,
    pub center: Point3<f32>,
    pub up: Vector3<f32>,
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub follow_distance: f32,
    pub follow_height: f32,
}

impl Camera {
    pub fn new(config: &CameraConfig) -> Self {
        Self {
            mode: CameraMode::Fixed,
            eye: Point3::from(config.overhead_eye),
            center: Point3::origin(),
            up: Vector3::new(0.0, 0.0, 1.0),
            fov: config.fovy,
            near: config.near,
            far: config.far,
            follow_distance: config.follow_distance,
            follow_height: config.follow_height,
        }
    }

    /// Eye position for the current mode; `target` is the tracked ball.
    pub fn eye_position(&self, target: &Point3<f32>) -> Point3<f32> {
        match self.mode {
            CameraMode::Fixed | CameraMode::Overhead => self.eye,
            CameraMode::Follow => Point3::new(
                target.x + self.follow_distance * (target.x * 0.2).sin(),
                self.follow_height,
                target.z - self.follow_distance,
            ),
        }
    }

    /// Create the view matrix (camera transformation)
    pub fn view_matrix(&self, target: &Point3<f32>) -> Matrix4<f32> {
        match self.mode {
            CameraMode::Fixed | CameraMode::Overhead => look_at(&self.eye, &self.center, &self.up),
            CameraMode::Follow => look_at(
                &self.eye_position(target),
                target,
                &Vector3::new(0.0, 1.0, 0.0),
            ),
        }
    }

    /// Create the projection matrix for a viewport of `width` x `height` pixels.
    ///
    /// A zero-height viewport (minimised window) falls back to a square aspect.
    pub fn projection_matrix(&self, width: u32, height: u32) -> Matrix4<f32> {
        let aspect = if width == 0 || height == 0 {
            1.0
        } else {
            width as f32 / height as f32
        };
        perspective(self.fov, aspect, self.near, self.far)
    }

    pub fn view_projection(&self, target: &Point3<f32>, width: u32, height: u32) -> Matrix4<f32> {
        multiply(&self.projection_matrix(width, height), &self.view_matrix(target))
    }
}

/// Project a world-space point through a view-projection matrix to screen space.
///
/// Returns `(x, y, depth)` with `depth` in NDC, or `None` if the point is behind the
/// camera or outside the view volume.
pub fn project_to_screen(
    point: &Point3<f32>,
    view_projection: &Matrix4<f32>,
    width: u32,
    height: u32,
) -> Option<(f32, f32, f32)> {
    let clip = view_projection * point.to_homogeneous();

    // Prevent division by near-zero or negative w (behind the eye)
    if clip.w < 1e-6 {
        return None;
    }

    let ndc_x = clip.x / clip.w;
    let ndc_y = clip.y / clip.w;
    let depth = clip.z / clip.w;

    // Clip test
    if !(-1.0..=1.0).contains(&depth) {
        return None;
    }

    // Convert to screen space
    let screen_x = (ndc_x + 1.0) * 0.5 * width as f32;
    let screen_y = (1.0 - ndc_y) * 0.5 * height as f32;

    Some((screen_x, screen_y, depth))
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(&CameraConfig::default())
    }
}
