use glam::Vec3;
use crate::model::Camera;

/// Keeps the camera trailing the avatar
pub struct CameraController {
    /// Eye position relative to the avatar
    pub follow_offset: Vec3,
}

impl CameraController {
    pub fn new() -> Self {
        Self {
            follow_offset: Vec3::new(0.0, 3.6, 6.0),
        }
    }

    /// Look at the avatar from `follow_offset`, world up
    pub fn follow(&self, camera: &mut Camera, avatar_pos: Vec3) {
        camera.eye = avatar_pos + self.follow_offset;
        camera.target = avatar_pos;
        camera.up = Vec3::Y;
    }
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_follow_places_eye_behind_and_above() {
        let controller = CameraController::new();
        let mut camera = Camera::new(800, 600);
        controller.follow(&mut camera, Vec3::new(2.0, 0.0, -4.0));
        assert_eq!(camera.eye, Vec3::new(2.0, 3.6, 2.0));
        assert_eq!(camera.target, Vec3::new(2.0, 0.0, -4.0));
        assert_eq!(camera.up, Vec3::Y);
    }
}
