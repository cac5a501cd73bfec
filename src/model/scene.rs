use glam::Vec3;

use super::avatar::Avatar;
use super::light::{Light, MAX_LIGHTS};
use super::material::Materials;
use super::platform::PlatformGrid;

pub const AVATAR_START: Vec3 = Vec3::new(0.0, 7.0, 0.0);
pub const AVATAR_RADIUS: f32 = 0.5;

/// All state owned by one running scene.
pub struct Scene {
    pub avatar: Avatar,
    pub platforms: PlatformGrid,
    pub lights: Vec<Light>,
    pub materials: Materials,
}

impl Scene {
    pub fn new(platforms: PlatformGrid, materials: Materials) -> Self {
        tracing::info!(
            platforms = platforms.len(),
            box_size = platforms.box_size(),
            "building scene"
        );
        Self {
            avatar: Avatar::new(AVATAR_START, AVATAR_RADIUS),
            platforms,
            lights: vec![Light::default()],
            materials,
        }
    }

    /// Lights as uploaded to the shader; extras beyond `MAX_LIGHTS` are dropped
    pub fn active_lights(&self) -> &[Light] {
        &self.lights[..self.lights.len().min(MAX_LIGHTS)]
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(PlatformGrid::default(), Materials::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scene_starts_airborne_above_grid() {
        let scene = Scene::default();
        assert_eq!(scene.avatar.position, AVATAR_START);
        assert!(!scene.avatar.grounded);
        assert_eq!(scene.platforms.len(), 64);
        assert_eq!(scene.active_lights().len(), 1);
    }

    #[test]
    fn test_active_lights_truncated_to_max() {
        let mut scene = Scene::default();
        scene.lights = vec![Light::default(); MAX_LIGHTS + 3];
        assert_eq!(scene.active_lights().len(), MAX_LIGHTS);
    }
}
