use glam::{Mat4, Vec3};

const FOVY: f32 = std::f32::consts::FRAC_PI_3;
const NEAR: f32 = 1.0;
const FAR: f32 = 100.0;

const MIN_PITCH: f32 = -std::f32::consts::FRAC_PI_2 + 0.01;
const MAX_PITCH: f32 = std::f32::consts::FRAC_PI_2 - 0.01;
const MIN_DISTANCE: f32 = 2.0;
const MAX_DISTANCE: f32 = 80.0;

// Reset view: eye 17 units from the origin along (0, 1, 2).
const DEFAULT_DISTANCE: f32 = 17.0;
const DEFAULT_YAW: f32 = 0.0;
// asin(1 / sqrt(5)) for the (0, 1, 2) viewpoint direction.
const DEFAULT_PITCH: f32 = 0.463_647_6;

/// Interactive orbit camera: accumulated drag/wheel input, decoupled from
/// the animation clock so the view stays responsive while paused.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitCamera {
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
    pub target: Vec3,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            yaw: DEFAULT_YAW,
            pitch: DEFAULT_PITCH,
            distance: DEFAULT_DISTANCE,
            target: Vec3::ZERO,
        }
    }
}

impl OrbitCamera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Orbits around the target from a mouse drag in surface pixels.
    pub fn drag(&mut self, dx: f32, dy: f32) {
        const ROTATE_SPEED: f32 = 0.01;
        self.yaw -= dx * ROTATE_SPEED;
        self.pitch = (self.pitch + dy * ROTATE_SPEED).clamp(MIN_PITCH, MAX_PITCH);
    }

    /// Zooms by a wheel delta; positive moves the eye closer.
    pub fn zoom(&mut self, delta: f32) {
        self.distance = (self.distance - delta).clamp(MIN_DISTANCE, MAX_DISTANCE);
    }

    /// Restores the named default view.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn eye(&self) -> Vec3 {
        let direction = Vec3::new(
            self.pitch.cos() * self.yaw.sin(),
            self.pitch.sin(),
            self.pitch.cos() * self.yaw.cos(),
        );
        self.target + direction * self.distance
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), self.target, Vec3::Y)
    }

    /// Perspective projection with the demo's fixed frustum.
    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(FOVY, aspect.max(0.01), NEAR, FAR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn default_eye_sits_on_the_default_viewpoint() {
        let camera = OrbitCamera::new();
        let eye = camera.eye();
        let expected = Vec3::new(0.0, 1.0, 2.0).normalize() * 17.0;
        assert!(eye.abs_diff_eq(expected, 1e-3));
    }

    #[test]
    fn reset_restores_defaults_after_interaction() {
        let mut camera = OrbitCamera::new();
        camera.drag(250.0, -120.0);
        camera.zoom(6.0);
        assert_ne!(camera, OrbitCamera::default());
        camera.reset();
        assert_eq!(camera, OrbitCamera::default());
    }

    #[test]
    fn pitch_and_distance_are_clamped() {
        let mut camera = OrbitCamera::new();
        camera.drag(0.0, 10_000.0);
        assert!(camera.pitch <= MAX_PITCH);
        camera.zoom(1_000.0);
        assert_abs_diff_eq!(camera.distance, MIN_DISTANCE);
        camera.zoom(-10_000.0);
        assert_abs_diff_eq!(camera.distance, MAX_DISTANCE);
    }

    #[test]
    fn view_matrix_maps_the_eye_to_the_view_origin() {
        let mut camera = OrbitCamera::new();
        camera.drag(40.0, 25.0);
        let in_view = camera.view_matrix().transform_point3(camera.eye());
        assert!(in_view.abs_diff_eq(Vec3::ZERO, 1e-4));
    }
}
