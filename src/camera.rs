use std::f32::consts::{PI, TAU};

use glam::{Mat4, Quat, Vec2, Vec3};

use crate::render::CameraParams;

pub const FOV_Y_DEGREES: f32 = 75.0;
pub const NEAR: f32 = 0.1;
pub const FAR: f32 = 1000.0;
pub const START_POSITION: Vec3 = Vec3::new(0.0, 0.0, 10.0);

/// Perspective camera. The aspect ratio is captured once at construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub rotation: Quat,
    fov_y_degrees: f32,
    aspect: f32,
    near: f32,
    far: f32,
}

impl Camera {
    pub fn new(aspect: f32) -> Self {
        let mut camera = Self {
            position: START_POSITION,
            rotation: Quat::IDENTITY,
            fov_y_degrees: FOV_Y_DEGREES,
            aspect: if aspect.is_finite() && aspect > 0.0 {
                aspect
            } else {
                1.0
            },
            near: NEAR,
            far: FAR,
        };
        camera.look_at(Vec3::ZERO);
        camera
    }

    /// Builds the camera for a viewport of `width` x `height` pixels.
    pub fn for_viewport(width: u32, height: u32) -> Self {
        Self::new(width.max(1) as f32 / height.max(1) as f32)
    }

    /// Turns the camera towards `target`, keeping +Y as up.
    pub fn look_at(&mut self, target: Vec3) {
        let forward = target - self.position;
        if forward.length_squared() <= f32::EPSILON {
            return;
        }
        let world = Mat4::look_at_rh(self.position, target, Vec3::Y).inverse();
        let (_, rotation, _) = world.to_scale_rotation_translation();
        self.rotation = rotation.normalize();
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    pub fn fov_y_degrees(&self) -> f32 {
        self.fov_y_degrees
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.position).inverse()
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fov_y_degrees.to_radians(),
            self.aspect,
            self.near,
            self.far,
        )
    }

    pub fn params(&self) -> CameraParams {
        CameraParams {
            view: self.view_matrix(),
            projection: self.projection_matrix(),
            position: self.position,
        }
    }
}

/// What a pointer drag does to the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragMode {
    /// Left button: orbit around the target.
    Rotate,
    /// Right button: slide camera and target across the view plane.
    Pan,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Drag {
    mode: DragMode,
    anchor: Vec2,
}

/// Mouse orbiting around a target.
///
/// Every update starts from the camera's current position, so a position
/// written elsewhere (the keyboard nudges) is picked up by the next drag or
/// wheel step instead of being overwritten.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitControls {
    pub target: Vec3,
    pub rotate_speed: f32,
    pub pan_speed: f32,
    pub zoom_scale: f32,
    drag: Option<Drag>,
}

/// Keeps the polar angle off the poles where `look_at` degenerates.
const POLAR_EPSILON: f32 = 1e-4;
const MIN_DISTANCE: f32 = 1e-3;

impl Default for OrbitControls {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            rotate_speed: 1.0,
            pan_speed: 1.0,
            zoom_scale: 0.95,
            drag: None,
        }
    }
}

impl OrbitControls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_drag(&mut self, pointer: Vec2, mode: DragMode) {
        self.drag = Some(Drag {
            mode,
            anchor: pointer,
        });
    }

    pub fn end_drag(&mut self) {
        self.drag = None;
    }

    /// Rotates or pans by the pointer movement since the last call. Ignored
    /// unless a drag is in progress.
    pub fn drag_to(&mut self, pointer: Vec2, viewport_height: f32, camera: &mut Camera) {
        let Some(drag) = self.drag.as_mut() else {
            return;
        };
        let (mode, delta) = (drag.mode, pointer - drag.anchor);
        drag.anchor = pointer;
        match mode {
            DragMode::Rotate => self.rotate(delta, viewport_height, camera),
            DragMode::Pan => self.pan(delta, viewport_height, camera),
        }
    }

    /// A drag of the full viewport height turns the camera once around.
    pub fn rotate(&self, delta: Vec2, viewport_height: f32, camera: &mut Camera) {
        let height = viewport_height.max(1.0);
        let azimuth = -TAU * delta.x / height * self.rotate_speed;
        let polar = -TAU * delta.y / height * self.rotate_speed;
        self.apply(camera, azimuth, polar, 1.0);
    }

    /// Moves camera and target together so the point under the cursor follows
    /// it at the target's depth.
    pub fn pan(&mut self, delta: Vec2, viewport_height: f32, camera: &mut Camera) {
        let height = viewport_height.max(1.0);
        let distance = (camera.position - self.target).length()
            * (camera.fov_y_degrees().to_radians() / 2.0).tan();
        let right = camera.rotation * Vec3::X;
        let up = camera.rotation * Vec3::Y;
        let scale = 2.0 * distance / height * self.pan_speed;
        let shift = -right * (delta.x * scale) + up * (delta.y * scale);
        camera.position += shift;
        self.target += shift;
    }

    /// One wheel step; negative `delta` moves towards the target.
    pub fn zoom(&self, delta: f32, camera: &mut Camera) {
        let scale = if delta < 0.0 {
            self.zoom_scale
        } else if delta > 0.0 {
            1.0 / self.zoom_scale
        } else {
            return;
        };
        self.apply(camera, 0.0, 0.0, scale);
    }

    fn apply(&self, camera: &mut Camera, azimuth: f32, polar: f32, scale: f32) {
        let offset = camera.position - self.target;
        let radius = offset.length();
        if radius <= f32::EPSILON {
            return;
        }
        let theta = offset.x.atan2(offset.z) + azimuth;
        let phi = ((offset.y / radius).clamp(-1.0, 1.0).acos() + polar)
            .clamp(POLAR_EPSILON, PI - POLAR_EPSILON);
        let radius = (radius * scale).max(MIN_DISTANCE);

        let sin_phi = phi.sin();
        camera.position = self.target
            + radius * Vec3::new(sin_phi * theta.sin(), phi.cos(), sin_phi * theta.cos());
        camera.look_at(self.target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Vec3, b: Vec3) {
        assert!((a - b).length() < 1e-3, "{a:?} != {b:?}");
    }

    #[test]
    fn starts_ten_units_back_looking_at_the_origin() {
        let camera = Camera::for_viewport(1280, 720);
        assert_eq!(camera.position, Vec3::new(0.0, 0.0, 10.0));
        assert_close(camera.forward(), Vec3::NEG_Z);
        assert!((camera.aspect() - 1280.0 / 720.0).abs() < 1e-6);
        assert_eq!(camera.fov_y_degrees(), 75.0);

        let origin = camera.view_matrix().transform_point3(Vec3::ZERO);
        assert_close(origin, Vec3::new(0.0, 0.0, -10.0));
    }

    #[test]
    fn projection_maps_near_and_far_planes() {
        let camera = Camera::new(1.0);
        let projection = camera.projection_matrix();
        let near = projection.project_point3(Vec3::new(0.0, 0.0, -NEAR));
        let far = projection.project_point3(Vec3::new(0.0, 0.0, -FAR));
        assert!(near.z.abs() < 1e-4);
        assert!((far.z - 1.0).abs() < 1e-4);
    }

    #[test]
    fn quarter_height_drag_orbits_a_quarter_turn() {
        let mut camera = Camera::new(1.0);
        let mut controls = OrbitControls::new();
        controls.begin_drag(Vec2::new(100.0, 100.0), DragMode::Rotate);
        controls.drag_to(Vec2::new(300.0, 100.0), 800.0, &mut camera);
        assert_close(camera.position, Vec3::new(-10.0, 0.0, 0.0));
        assert_close(camera.forward(), Vec3::X);

        controls.end_drag();
        let before = camera.position;
        controls.drag_to(Vec2::new(900.0, 900.0), 800.0, &mut camera);
        assert_eq!(camera.position, before);
    }

    #[test]
    fn polar_angle_stays_off_the_poles() {
        let mut camera = Camera::new(1.0);
        let controls = OrbitControls::new();
        controls.rotate(Vec2::new(0.0, 10_000.0), 100.0, &mut camera);
        assert!(camera.position.is_finite() && camera.forward().is_finite());
        assert!(camera.position.y > 9.99);
        assert!(camera.position.z > 0.0);
        assert!((camera.position.length() - 10.0).abs() < 1e-3);
    }

    #[test]
    fn wheel_steps_dolly_by_the_zoom_scale() {
        let mut camera = Camera::new(1.0);
        let controls = OrbitControls::new();
        controls.zoom(-3.0, &mut camera);
        assert_close(camera.position, Vec3::new(0.0, 0.0, 9.5));
        controls.zoom(1.0, &mut camera);
        assert_close(camera.position, Vec3::new(0.0, 0.0, 10.0));
        controls.zoom(0.0, &mut camera);
        assert_close(camera.position, Vec3::new(0.0, 0.0, 10.0));
    }

    #[test]
    fn orbit_starts_from_a_keyboard_nudged_position() {
        let mut camera = Camera::new(1.0);
        camera.position.x -= 0.1;
        let controls = OrbitControls::new();
        controls.rotate(Vec2::ZERO, 600.0, &mut camera);
        assert_close(camera.position, Vec3::new(-0.1, 0.0, 10.0));
        // Now aimed back at the target rather than straight down -Z.
        assert_close(camera.forward(), (-camera.position).normalize());
    }

    #[test]
    fn right_drag_pans_camera_and_target_together() {
        let mut camera = Camera::new(1.0);
        let mut controls = OrbitControls::new();
        controls.begin_drag(Vec2::ZERO, DragMode::Pan);
        controls.drag_to(Vec2::new(10.0, 10.0), 100.0, &mut camera);
        controls.end_drag();

        // 2 * 10 * 10 * tan(37.5 deg) / 100
        let step = 0.2 * 10.0 * 37.5_f32.to_radians().tan();
        assert_close(camera.position, Vec3::new(-step, step, 10.0));
        assert_close(controls.target, Vec3::new(-step, step, 0.0));
        assert_close(camera.forward(), Vec3::NEG_Z);

        // Later orbits turn around the moved target.
        controls.rotate(Vec2::new(25.0, 0.0), 100.0, &mut camera);
        assert!(((camera.position - controls.target).length() - 10.0).abs() < 1e-3);
        assert_close(camera.position, controls.target + Vec3::new(-10.0, 0.0, 0.0));
    }
}
