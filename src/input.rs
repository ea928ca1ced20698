#[cfg(target_arch = "wasm32")]
pub mod wasm;

use crate::camera::Camera;
use crate::scene::Scene;

/// Distance moved per key press.
pub const MOVE_STEP: f32 = 0.1;

/// What a recognized key press does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    RaiseLight,
    LowerLight,
    CameraLeft,
    CameraRight,
}

impl Action {
    /// Maps a logical key value. Matching is case-sensitive.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "w" => Some(Self::RaiseLight),
            "s" => Some(Self::LowerLight),
            "a" => Some(Self::CameraLeft),
            "d" => Some(Self::CameraRight),
            _ => None,
        }
    }

    pub fn apply(self, scene: &mut Scene, camera: &mut Camera) {
        match self {
            Self::RaiseLight => scene.light_source.position.y += MOVE_STEP,
            Self::LowerLight => scene.light_source.position.y -= MOVE_STEP,
            Self::CameraLeft => camera.position.x -= MOVE_STEP,
            Self::CameraRight => camera.position.x += MOVE_STEP,
        }
    }
}

/// Handles one key-down event. The point light is re-synced afterwards even
/// when the key is not bound to anything.
pub fn handle_key(key: &str, scene: &mut Scene, camera: &mut Camera) -> Option<Action> {
    let action = Action::from_key(key);
    if let Some(action) = action {
        action.apply(scene, camera);
    }
    scene.sync_point_light();
    action
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;

    fn setup() -> (Scene, Camera) {
        (Scene::new(), Camera::new(16.0 / 9.0))
    }

    #[test]
    fn maps_lowercase_wasd_only() {
        assert_eq!(Action::from_key("w"), Some(Action::RaiseLight));
        assert_eq!(Action::from_key("s"), Some(Action::LowerLight));
        assert_eq!(Action::from_key("a"), Some(Action::CameraLeft));
        assert_eq!(Action::from_key("d"), Some(Action::CameraRight));
        assert_eq!(Action::from_key("W"), None);
        assert_eq!(Action::from_key("ArrowUp"), None);
        assert_eq!(Action::from_key(""), None);
    }

    #[test]
    fn opposite_keys_cancel_out() {
        let (mut scene, mut camera) = setup();
        handle_key("w", &mut scene, &mut camera);
        handle_key("s", &mut scene, &mut camera);
        assert!(scene.light_source.position.y.abs() < 1e-6);

        handle_key("a", &mut scene, &mut camera);
        handle_key("d", &mut scene, &mut camera);
        assert!(camera.position.x.abs() < 1e-6);
    }

    #[test]
    fn point_light_follows_every_press() {
        let (mut scene, mut camera) = setup();
        let start = camera.position;
        for key in ["w", "w", "a"] {
            handle_key(key, &mut scene, &mut camera);
            assert_eq!(scene.point_light.position, scene.light_source.position);
        }
        assert!((scene.light_source.position - Vec3::new(0.0, 0.2, 0.0)).length() < 1e-6);
        assert!((camera.position.x - (start.x - 0.1)).abs() < 1e-6);
        assert_eq!((camera.position.y, camera.position.z), (start.y, start.z));
    }

    #[test]
    fn unknown_keys_only_resync() {
        let (mut scene, mut camera) = setup();
        scene.light_source.position = Vec3::new(0.0, 1.0, 0.0);
        let before = camera;
        assert_eq!(handle_key("q", &mut scene, &mut camera), None);
        assert_eq!(camera, before);
        assert_eq!(scene.light_source.position, Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(scene.point_light.position, scene.light_source.position);
    }
}
