use std::f32::consts::{PI, TAU};

use glam::{Mat4, Vec2, Vec3};

/// Camera parameters consumed by the renderer's uniform buffer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraParams {
    pub view_proj: Mat4,
    pub position: Vec3,
}

/// Orbit camera around the origin: drag rotates, the wheel zooms, no pan.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub target: Vec3,
    pub fov_y_degrees: f32,
    radius: f32,
    azimuth: f32,
    polar: f32,
    drag_origin: Option<Vec2>,
}

impl Default for OrbitControls {
    /// Starts at `(0, 0, 6)` looking at the origin with a 45 degree field of
    /// view.
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            fov_y_degrees: 45.0,
            radius: 6.0,
            azimuth: 0.0,
            polar: PI / 2.0,
            drag_origin: None,
        }
    }
}

impl OrbitControls {
    pub const MIN_RADIUS: f32 = 2.0;
    pub const MAX_RADIUS: f32 = 40.0;
    /// Distance factor per wheel step.
    pub const ZOOM_STEP: f32 = 0.95;
    const POLAR_EPSILON: f32 = 1e-3;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> Vec3 {
        let sin_polar = self.polar.sin();
        self.target
            + self.radius
                * Vec3::new(
                    sin_polar * self.azimuth.sin(),
                    self.polar.cos(),
                    sin_polar * self.azimuth.cos(),
                )
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn begin_drag(&mut self, cursor: Vec2) {
        self.drag_origin = Some(cursor);
    }

    pub fn end_drag(&mut self) {
        self.drag_origin = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_origin.is_some()
    }

    /// Rotates by the cursor movement since the last call while dragging.
    /// A drag across the full viewport height is one full turn.
    pub fn drag_to(&mut self, cursor: Vec2, viewport_height: f32) {
        let Some(origin) = self.drag_origin else {
            return;
        };
        let delta = (cursor - origin) / viewport_height.max(1.0);
        self.azimuth -= TAU * delta.x;
        self.polar = (self.polar - TAU * delta.y)
            .clamp(Self::POLAR_EPSILON, PI - Self::POLAR_EPSILON);
        self.drag_origin = Some(cursor);
    }

    /// Positive steps move the camera closer.
    pub fn zoom(&mut self, steps: f32) {
        self.radius = (self.radius * Self::ZOOM_STEP.powf(steps))
            .clamp(Self::MIN_RADIUS, Self::MAX_RADIUS);
    }

    pub fn camera(&self, aspect: f32) -> CameraParams {
        let position = self.position();
        let view = Mat4::look_at_rh(position, self.target, Vec3::Y);
        let projection =
            Mat4::perspective_rh(self.fov_y_degrees.to_radians(), aspect.max(0.01), 0.1, 100.0);
        CameraParams {
            view_proj: projection * view,
            position,
        }
    }
}
